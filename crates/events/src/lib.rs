//! Outbound notification events and their delivery.
//!
//! - [`DeliveryEvent`]: the `{event_type, data}` envelope sent to the
//!   external notification endpoint.
//! - [`EventDelivery`]: the seam through which events leave the process.
//! - [`WebhookDelivery`]: single-attempt HTTP POST delivery.
//! - [`DeliveryOutcome`]: how a delivery attempt ended.

pub mod delivery;
pub mod event;

pub use delivery::webhook::WebhookDelivery;
pub use delivery::{DeliveryOutcome, EventDelivery};
pub use event::DeliveryEvent;

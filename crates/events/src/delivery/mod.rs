//! External delivery of notification events.
//!
//! [`EventDelivery`] is the seam the correlation layer hands finished
//! events to. The production implementation is
//! [`WebhookDelivery`](webhook::WebhookDelivery).

pub mod webhook;

use std::fmt;

use crate::event::DeliveryEvent;

/// How a single delivery attempt ended.
///
/// Every variant is a normal return value: delivery is best effort and a
/// failed notification must never fault the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint answered with a 2xx status.
    Delivered { status: u16, body: String },

    /// The endpoint answered with a non-2xx status.
    RejectedByServer { status: u16, body: String },

    /// No usable response (connection refused, DNS, timeout, truncated body).
    TransportFailure(String),
}

impl DeliveryOutcome {
    /// `true` only for [`DeliveryOutcome::Delivered`].
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// HTTP status code, when the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Delivered { status, .. } | Self::RejectedByServer { status, .. } => Some(*status),
            Self::TransportFailure(_) => None,
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered { status, .. } => write!(f, "delivered (HTTP {status})"),
            Self::RejectedByServer { status, .. } => write!(f, "rejected by server (HTTP {status})"),
            Self::TransportFailure(reason) => write!(f, "transport failure: {reason}"),
        }
    }
}

/// Something that can push a [`DeliveryEvent`] out of the process.
#[async_trait::async_trait]
pub trait EventDelivery: Send + Sync {
    /// Make exactly one delivery attempt and report how it went.
    async fn deliver(&self, event: &DeliveryEvent) -> DeliveryOutcome;
}

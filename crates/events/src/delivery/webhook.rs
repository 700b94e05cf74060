//! Single-attempt webhook delivery.
//!
//! [`WebhookDelivery`] sends a JSON-encoded [`DeliveryEvent`] to one
//! configured URL via HTTP POST. There is no retry and no timeout beyond
//! the HTTP client's own default; the result is classified into a
//! [`DeliveryOutcome`] and returned, never raised.

use crate::delivery::{DeliveryOutcome, EventDelivery};
use crate::event::DeliveryEvent;

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers events to a single external webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    /// Create a delivery service for `url` with a fresh HTTP client.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Create a delivery service reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The endpoint events are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute the POST and classify the response.
    async fn post(&self, event: &DeliveryEvent) -> DeliveryOutcome {
        let url = self.url.as_str();

        let response = match self.client.post(url).json(event).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url, error = %e, "Exception occurred while reporting event");
                return DeliveryOutcome::TransportFailure(e.to_string());
            }
        };

        let status = response.status();
        tracing::info!(url, status = status.as_u16(), "Event request sent");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(url, error = %e, "Failed to read webhook response body");
                return DeliveryOutcome::TransportFailure(e.to_string());
            }
        };

        if status.is_success() {
            tracing::info!(status = status.as_u16(), "Event reported successfully");
            log_response_body(&body);
            DeliveryOutcome::Delivered {
                status: status.as_u16(),
                body,
            }
        } else {
            tracing::error!(
                url,
                status = status.as_u16(),
                body = %body,
                "Failed to report event",
            );
            DeliveryOutcome::RejectedByServer {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[async_trait::async_trait]
impl EventDelivery for WebhookDelivery {
    async fn deliver(&self, event: &DeliveryEvent) -> DeliveryOutcome {
        tracing::info!(event_type = %event.event_type, "Attempting to report event");
        tracing::debug!(payload = %event.to_pretty_json(), "Event payload");
        self.post(event).await
    }
}

/// Log a successful response body, pretty-printed when it is JSON.
fn log_response_body(body: &str) {
    if body.is_empty() {
        return;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string());
            tracing::info!(response = %pretty, "Webhook response content");
        }
        Err(_) => {
            tracing::warn!(response = %body, "Webhook response is not JSON");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

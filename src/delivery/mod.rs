//! Outbound delivery of the rendered daily document
//!
//! # Architecture
//!
//! ```text
//!  DailyDocument ──► tracker::pending ──► render (per locale) ──┐
//!                                                              ▼
//!                                             ┌────────────────────────────┐
//!                                             │ broadcast (join_all)       │
//!                                             │  DeliveryChannel::deliver  │
//!                                             └────────────────────────────┘
//!                                                              │
//!  DailyDocument ◄── tracker::mark_delivered(successes) ◄──────┘
//! ```
//!
//! - [`tracker`] - which destinations still need today's document
//! - [`render`] - localized message text
//! - [`http`] - chat platform channel over HTTP

pub mod http;
pub mod render;
pub mod tracker;

use async_trait::async_trait;
use futures::future::join_all;

use crate::i18n::Translator;
use crate::models::{DailyDocument, Destination, DestinationId};
use crate::utils::error::DeliveryError;

pub use http::HttpChannel;
pub use render::render;
pub use tracker::{mark_delivered, pending};

/// Result type for channel operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Sends one rendered message with its image to one destination
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Deliver `text` with `image` attached to `destination`
    async fn deliver(
        &self,
        destination: DestinationId,
        text: &str,
        image: &[u8],
    ) -> DeliveryResult<()>;
}

/// Outcome of one broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Destinations that accepted the message, in input order
    pub delivered: Vec<DestinationId>,
    /// Destinations that failed, with the reason
    pub failed: Vec<(DestinationId, DeliveryError)>,
}

impl BroadcastReport {
    /// Number of destinations attempted
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Send `document` to every destination concurrently
///
/// Each destination gets the document rendered in its own locale. Failures
/// are collected per destination and never abort the other sends.
pub async fn broadcast(
    channel: &dyn DeliveryChannel,
    translator: &dyn Translator,
    document: &DailyDocument,
    destinations: &[Destination],
) -> BroadcastReport {
    let image = document.companion_image.as_deref().unwrap_or_default();

    let sends = destinations.iter().map(|destination| {
        let text = render(document, &destination.locale, translator);
        async move {
            let outcome = channel.deliver(destination.id, &text, image).await;
            (destination.id, outcome)
        }
    });

    let mut report = BroadcastReport::default();
    for (id, outcome) in join_all(sends).await {
        match outcome {
            Ok(()) => {
                tracing::debug!(destination = id, "Delivered");
                report.delivered.push(id);
            }
            Err(e) => {
                tracing::warn!(destination = id, error = %e, "Delivery failed");
                report.failed.push((id, e));
            }
        }
    }

    report
}

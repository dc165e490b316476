//! rdo-dailies - Red Dead Online daily challenge announcer
//!
//! Fetches the daily challenge set and the companion location once per day,
//! normalizes them into a [`models::DailyDocument`], and sends a localized
//! rendering to every registered chat channel exactly once.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`scheduler`] - Publish window arithmetic and the injectable clock
//! - [`source`] - Upstream HTTP fetching
//! - [`parser`] - Payload normalization and companion image resolution
//! - [`storage`] - Cached document and destination registry
//! - [`delivery`] - Delivery bookkeeping, rendering and the HTTP channel
//! - [`cycle`] - The fetch, deliver, persist loop
//! - [`i18n`] - Localized catalogs
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rdo_dailies::config::Config;
//! use rdo_dailies::cycle::PublishCycle;
//! use rdo_dailies::delivery::HttpChannel;
//! use rdo_dailies::i18n::available_locales;
//! use rdo_dailies::storage::DestinationRegistry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let registry =
//!         DestinationRegistry::load(&config.storage.registry_path, available_locales()).await?;
//!     let channel = HttpChannel::new(&config.delivery)?;
//!     let mut cycle = PublishCycle::from_config(&config, Arc::new(registry), Arc::new(channel))?;
//!     cycle.run().await;
//!     Ok(())
//! }
//! ```

// Initialize rust-i18n at crate root level
rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod cycle;
pub mod delivery;
pub mod error;
pub mod i18n;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod source;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::cycle::{CycleReport, CycleState, PublishCycle};
    pub use crate::delivery::{DeliveryChannel, HttpChannel};
    pub use crate::error::{DailiesErrorTrait, Error, ErrorCategory, Result};
    pub use crate::i18n::{CatalogTranslator, Translator};
    pub use crate::models::{Category, Challenge, DailyDocument, Destination, DestinationId};
    pub use crate::scheduler::{Clock, PublishWindow, SystemClock};
    pub use crate::source::{HttpGet, SourceFetcher};
    pub use crate::storage::{CacheStore, DestinationRegistry, DestinationSource};
}

// Direct re-exports for convenience
pub use models::{Category, Challenge, DailyDocument, Destination};

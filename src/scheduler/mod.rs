//! Publish timing
//!
//! # Overview
//!
//! Upstream publishes a new challenge set once per day at a fixed UTC time.
//! This module answers two questions for the publish cycle:
//!
//! - how long to wait until the next publish window
//! - whether "now" is still inside yesterday's grace window
//!
//! ```text
//!   00:00 UTC            06:00:30 UTC                       24:00 UTC
//!     |---- grace window ----|------ today's content is due ------|
//!     yesterday's document     fetch, poll until upstream rolls over
//!     still current
//! ```
//!
//! # Modules
//!
//! - [`window`] - pure publish-window arithmetic
//! - [`clock`] - injectable time source used for every wait

pub mod clock;
pub mod error;
pub mod window;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::{SchedulerError, SchedulerResult};
pub use window::{PublishWindow, DEFAULT_PUBLISH_TIME};

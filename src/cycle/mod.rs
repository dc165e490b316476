//! The daily publish cycle
//!
//! ```text
//!  ┌──────────────────┐   ┌──────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐
//!  │ WaitingForWindow │──►│ FetchingData │──►│ Delivering │──►│ Persisting │──►│ Sleeping │──┐
//!  └──────────────────┘   └──────────────┘   └────────────┘   └────────────┘   └──────────┘  │
//!           ▲                  │    ▲                                                        │
//!           │                  └────┘ not yet published / fetch or parse error:              │
//!           │                         sleep min(poll interval, next window), retry           │
//!           └────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `WaitingForWindow` is skipped on the first iteration so a restart inside
//! the day delivers to anyone still pending right away. A fully formed
//! document is persisted before delivery starts and again after successful
//! deliveries, so a crash in between costs at most a duplicate message.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::Config;
use crate::delivery::{broadcast, mark_delivered, pending, DeliveryChannel};
use crate::error::{DailiesErrorTrait, Error, ErrorCategory, Result};
use crate::i18n::{CatalogTranslator, Translator};
use crate::models::{DailyDocument, DestinationId};
use crate::parser::{self, CompanionResolver};
use crate::scheduler::{Clock, PublishWindow, SystemClock};
use crate::source::{ReqwestHttp, SourceFetcher};
use crate::storage::{CacheStore, DestinationSource};
use crate::utils::format_wait;

/// Where the cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    WaitingForWindow,
    FetchingData,
    Delivering,
    Persisting,
    Sleeping,
}

impl CycleState {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForWindow => "waiting_for_window",
            Self::FetchingData => "fetching_data",
            Self::Delivering => "delivering",
            Self::Persisting => "persisting",
            Self::Sleeping => "sleeping",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one pass through the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Date of the document that was published
    pub date: NaiveDate,
    /// Whether the cached document was used without fetching
    pub reused_cache: bool,
    /// Upstream fetch attempts it took to get a fresh document
    pub fetch_attempts: u32,
    /// Destinations sent the document in this pass
    pub delivered: Vec<DestinationId>,
    /// Destinations that failed and stay pending
    pub failed: Vec<DestinationId>,
}

/// Drives fetch, delivery and persistence once per publish day
pub struct PublishCycle {
    window: PublishWindow,
    poll_interval: Duration,
    fetcher: SourceFetcher,
    resolver: CompanionResolver,
    cache: CacheStore,
    destinations: Arc<dyn DestinationSource>,
    channel: Arc<dyn DeliveryChannel>,
    translator: Arc<dyn Translator>,
    clock: Arc<dyn Clock>,
    state: CycleState,
}

impl PublishCycle {
    /// Create a cycle on the system clock with the compiled catalogs
    pub fn new(
        window: PublishWindow,
        poll_interval: Duration,
        fetcher: SourceFetcher,
        resolver: CompanionResolver,
        cache: CacheStore,
        destinations: Arc<dyn DestinationSource>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            window,
            poll_interval,
            fetcher,
            resolver,
            cache,
            destinations,
            channel,
            translator: Arc::new(CatalogTranslator),
            clock: Arc::new(SystemClock),
            state: CycleState::WaitingForWindow,
        }
    }

    /// Build a cycle from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Scheduler` if the publish time is invalid, or
    /// `Error::Other` if the HTTP client cannot be built
    pub fn from_config(
        config: &Config,
        destinations: Arc<dyn DestinationSource>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Result<Self> {
        let window = config.publish_window()?;
        let http = ReqwestHttp::new(config.request_timeout(), &config.source.user_agent)
            .map_err(|e| Error::with_source("Failed to create HTTP client", e))?;

        Ok(Self::new(
            window,
            config.poll_interval(),
            SourceFetcher::from_config(Arc::new(http), &config.source),
            CompanionResolver::new(config.source.location_images.clone()),
            CacheStore::new(&config.storage.cache_path),
            destinations,
            channel,
        ))
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different translator
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// Current state
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Run forever
    pub async fn run(&mut self) {
        tracing::info!(
            publish_time = %self.window.publish_time(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "Publish cycle started"
        );

        let mut first = true;
        loop {
            if !first {
                self.wait_for_window().await;
            }
            first = false;

            let report = self.run_cycle().await;
            tracing::info!(
                date = %report.date,
                reused_cache = report.reused_cache,
                fetch_attempts = report.fetch_attempts,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "Publish cycle completed"
            );
        }
    }

    /// One pass from fetching to persisting, without the window wait
    ///
    /// Returns once a fresh document was delivered to everyone reachable and
    /// the outcome is on disk.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.transition(CycleState::FetchingData);
        let acquired = self.acquire().await;

        self.transition(CycleState::Delivering);
        let destinations = self.destinations.snapshot().await;
        let targets = pending(&acquired.document, &destinations);
        tracing::info!(
            date = %acquired.document.date,
            registered = destinations.len(),
            pending = targets.len(),
            "Delivering daily document"
        );

        let report = broadcast(
            self.channel.as_ref(),
            self.translator.as_ref(),
            &acquired.document,
            &targets,
        )
        .await;

        self.transition(CycleState::Persisting);
        if !report.delivered.is_empty() {
            let updated = mark_delivered(&acquired.document, report.delivered.iter().copied());
            self.persist_with_retry(&updated).await;
        }

        self.transition(CycleState::Sleeping);

        CycleReport {
            date: acquired.document.date,
            reused_cache: acquired.reused_cache,
            fetch_attempts: acquired.fetch_attempts,
            delivered: report.delivered,
            failed: report.failed.into_iter().map(|(id, _)| id).collect(),
        }
    }

    async fn wait_for_window(&mut self) {
        self.transition(CycleState::WaitingForWindow);
        let wait = Duration::from_secs(self.window.seconds_until_next_publish(self.clock.now()));
        tracing::info!(wait = %format_wait(wait), "Waiting for next publish window");
        self.clock.sleep(wait).await;
    }

    /// Produce a complete document that is fresh enough to publish
    async fn acquire(&self) -> Acquired {
        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, "Cached document unreadable, refetching");
                None
            }
        };

        if let Some(document) = &cached {
            if document.is_complete() && self.window.is_fresh(document.date, self.clock.now()) {
                tracing::info!(date = %document.date, "Using cached document");
                return Acquired {
                    document: document.clone(),
                    reused_cache: true,
                    fetch_attempts: 0,
                };
            }
        }

        let mut fetch_attempts = 0;
        loop {
            fetch_attempts += 1;

            match self.fetch_fresh().await {
                Ok(Some(mut document)) => {
                    // Same day as the cache: keep who already got it
                    if let Some(previous) = cached.as_ref().filter(|c| c.date == document.date) {
                        document.delivered_to = previous.delivered_to.clone();
                    }
                    self.persist_with_retry(&document).await;
                    tracing::info!(
                        date = %document.date,
                        challenges = document.challenge_count(),
                        attempts = fetch_attempts,
                        "Fetched daily document"
                    );
                    return Acquired {
                        document,
                        reused_cache: false,
                        fetch_attempts,
                    };
                }
                Ok(None) => {}
                Err(e) => log_failure(&e),
            }

            let delay = self.poll_delay();
            tracing::debug!(wait = %format_wait(delay), "Polling upstream again");
            self.clock.sleep(delay).await;
        }
    }

    /// Fetch and parse; `None` while upstream still serves a stale day
    async fn fetch_fresh(&self) -> Result<Option<DailyDocument>> {
        let raw = self.fetcher.fetch_challenge_set().await?;
        let document = parser::parse(&raw)?;

        let now = self.clock.now();
        if !self.window.is_fresh(document.date, now) {
            tracing::info!(
                date = %document.date,
                expected = %self.window.target_date(now),
                "Upstream not yet published"
            );
            return Ok(None);
        }

        let pointer = self.fetcher.fetch_companion_pointer().await?;
        let fetcher = &self.fetcher;
        let image = self
            .resolver
            .resolve_companion_image(&pointer, |url| async move {
                fetcher.fetch_image(&url).await
            })
            .await?;

        Ok(Some(document.with_companion_image(image.to_vec())))
    }

    /// Save until it sticks; the cycle never moves on with unsaved state
    async fn persist_with_retry(&self, document: &DailyDocument) {
        loop {
            match self.cache.save(document).await {
                Ok(()) => return,
                Err(e) => {
                    log_failure(&Error::from(e));
                    self.clock.sleep(self.poll_interval).await;
                }
            }
        }
    }

    fn poll_delay(&self) -> Duration {
        let until_window =
            Duration::from_secs(self.window.seconds_until_next_publish(self.clock.now()));
        self.poll_interval
            .min(until_window)
            .max(Duration::from_secs(1))
    }

    fn transition(&mut self, next: CycleState) {
        tracing::debug!(from = %self.state, to = %next, "Cycle state");
        self.state = next;
    }
}

struct Acquired {
    document: DailyDocument,
    reused_cache: bool,
    fetch_attempts: u32,
}

fn log_failure(error: &Error) {
    if let Error::Fetch(e) = error {
        tracing::warn!(
            resource = %e.resource,
            url = %e.url,
            transient = e.is_transient(),
            error = %e.cause,
            "Fetch attempt failed"
        );
        return;
    }

    match error.category() {
        ErrorCategory::SchemaDrift => {
            tracing::error!(error = %error, category = %error.category(), "Upstream schema drift")
        }
        ErrorCategory::Storage => {
            tracing::error!(error = %error, category = %error.category(), "Persisting failed, retrying")
        }
        category => tracing::warn!(
            error = %error,
            category = %category,
            recoverable = error.is_recoverable(),
            "Acquiring daily document failed"
        ),
    }
}

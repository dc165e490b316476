//! Daily publish window
//!
//! Upstream rolls its challenge set over once a day at a fixed UTC time of day.
//! Everything here is a pure function of the `now` passed in, so tests drive it
//! with fixed instants instead of the wall clock.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};

/// Default publish time (UTC)
pub const DEFAULT_PUBLISH_TIME: &str = "06:00:30";

/// The fixed daily time of day after which new content is expected upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishWindow {
    publish_time: NaiveTime,
}

impl PublishWindow {
    /// Create a window at the given UTC time of day
    pub fn new(publish_time: NaiveTime) -> Self {
        Self { publish_time }
    }

    /// Parse a window from `HH:MM:SS` or `HH:MM`
    pub fn parse(value: &str) -> SchedulerResult<Self> {
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .map(Self::new)
            .map_err(|_| SchedulerError::invalid_publish_time(value))
    }

    /// Configured time of day
    pub fn publish_time(&self) -> NaiveTime {
        self.publish_time
    }

    /// Time until the next occurrence strictly after `now`
    ///
    /// Exactly at the publish time this is a full day, not zero.
    pub fn until_next_publish(&self, now: DateTime<Utc>) -> Duration {
        let today = now.date_naive().and_time(self.publish_time).and_utc();
        let target = if now < today {
            today
        } else {
            today + Duration::days(1)
        };
        target - now
    }

    /// Whole seconds until the next publish, partial seconds rounded up
    pub fn seconds_until_next_publish(&self, now: DateTime<Utc>) -> u64 {
        let millis = self.until_next_publish(now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }

    /// Whether `now` is before today's publish time, i.e. yesterday's content
    /// is still the current one
    pub fn is_within_grace_window(&self, now: DateTime<Utc>) -> bool {
        now.time() < self.publish_time
    }

    /// The publish day content is expected for at `now`
    pub fn target_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.date_naive()
    }

    /// Whether a document dated `date` may be published at `now`
    ///
    /// Today's document always qualifies; yesterday's only while the grace
    /// window is still open.
    pub fn is_fresh(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        let target = self.target_date(now);
        date == target
            || (self.is_within_grace_window(now) && target.pred_opt() == Some(date))
    }
}

impl Default for PublishWindow {
    fn default() -> Self {
        Self::new(NaiveTime::from_hms_opt(6, 0, 30).unwrap_or(NaiveTime::MIN))
    }
}

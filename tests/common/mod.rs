//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdo_dailies::cycle::PublishCycle;
use rdo_dailies::delivery::{DeliveryChannel, DeliveryResult};
use rdo_dailies::models::{Destination, DestinationId};
use rdo_dailies::parser::CompanionResolver;
use rdo_dailies::scheduler::{ManualClock, PublishWindow};
use rdo_dailies::source::{HttpGet, HttpResponse, SourceFetcher};
use rdo_dailies::storage::{CacheStore, DestinationSource};
use rdo_dailies::utils::error::{DeliveryError, FetchCause};

pub const CHALLENGES_URL: &str = "http://upstream.test/challenges";
pub const COMPANION_URL: &str = "http://upstream.test/nazar";
pub const IMAGE_URL: &str = "http://img.test/nazar.png";

/// 2024-05-01T06:00:30Z
pub const MAY_1_PUBLISH: i64 = 1_714_543_230;
/// 2024-04-30T06:00:30Z
pub const APRIL_30_PUBLISH: i64 = MAY_1_PUBLISH - 86_400;

pub const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nnazar";

/// Instant on 2024-05-01
pub fn may_1(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, min, sec).unwrap()
}

/// Challenge set with the categories starting at `start_time`
pub fn challenge_set(start_time: i64) -> Value {
    json!({
        "challengeSets": [
            {
                "role": "TRADER",
                "startTime": start_time,
                "challenges": [
                    { "description": { "localizedFull": "Trader/$500 Sell 3 items" } }
                ]
            },
            {
                "role": "GENERAL",
                "startTime": start_time,
                "challenges": [
                    { "description": { "localizedFull": "General/3 Complete a bounty" } },
                    { "description": { "localizedFull": "General/Skin a deer" } }
                ]
            }
        ]
    })
}

/// Companion pointer naming the image directly
pub fn companion_pointer() -> Value {
    json!({ "data": { "location": { "id": "cholla_springs" }, "image": IMAGE_URL } })
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Image(Vec<u8>),
    Status(u16),
}

/// Fake upstream; each URL replays its queue and repeats the last reply
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upstream serving one fresh day and its companion image
    pub fn serving(start_time: i64) -> Self {
        let http = Self::new();
        http.script(CHALLENGES_URL, vec![Reply::Json(challenge_set(start_time))]);
        http.script(COMPANION_URL, vec![Reply::Json(companion_pointer())]);
        http.script(IMAGE_URL, vec![Reply::Image(IMAGE.to_vec())]);
        http
    }

    pub fn script(&self, url: &str, replies: Vec<Reply>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpGet for ScriptedHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchCause> {
        self.calls.lock().unwrap().push(url.to_string());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes.get_mut(url).ok_or(FetchCause::Status(404))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match reply {
            Some(Reply::Json(value)) => Ok(HttpResponse::new(
                "application/json",
                serde_json::to_vec(&value).unwrap(),
            )),
            Some(Reply::Image(bytes)) => Ok(HttpResponse::new("image/png", bytes)),
            Some(Reply::Status(code)) => Err(FetchCause::Status(code)),
            None => Err(FetchCause::Status(404)),
        }
    }
}

/// Channel that records deliveries and fails for chosen destinations
#[derive(Default)]
pub struct RecordingChannel {
    failing: Mutex<BTreeSet<DestinationId>>,
    sent: Mutex<Vec<(DestinationId, String)>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, ids: &[DestinationId]) {
        *self.failing.lock().unwrap() = ids.iter().copied().collect();
    }

    pub fn sent_to(&self) -> Vec<DestinationId> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }

    pub fn messages(&self) -> Vec<(DestinationId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn deliver(
        &self,
        destination: DestinationId,
        text: &str,
        image: &[u8],
    ) -> DeliveryResult<()> {
        assert_eq!(image, IMAGE, "companion image must be attached");

        if self.failing.lock().unwrap().contains(&destination) {
            return Err(DeliveryError::Unavailable("scripted failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination, text.to_string()));
        Ok(())
    }
}

/// Fixed destination list
pub struct StaticDestinations(pub Vec<Destination>);

#[async_trait]
impl DestinationSource for StaticDestinations {
    async fn snapshot(&self) -> Vec<Destination> {
        self.0.clone()
    }
}

/// Everything a cycle test needs to inspect afterwards
pub struct Harness {
    pub http: Arc<ScriptedHttp>,
    pub channel: Arc<RecordingChannel>,
    pub clock: Arc<ManualClock>,
    pub cache: CacheStore,
}

impl Harness {
    pub fn new(http: ScriptedHttp, start: DateTime<Utc>, cache_path: &Path) -> Self {
        Self {
            http: Arc::new(http),
            channel: Arc::new(RecordingChannel::new()),
            clock: Arc::new(ManualClock::new(start)),
            cache: CacheStore::new(cache_path),
        }
    }

    pub fn cycle(&self, destinations: Arc<dyn DestinationSource>) -> PublishCycle {
        PublishCycle::new(
            PublishWindow::default(),
            Duration::from_secs(300),
            SourceFetcher::new(self.http.clone(), CHALLENGES_URL, COMPANION_URL),
            CompanionResolver::default(),
            self.cache.clone(),
            destinations,
            self.channel.clone(),
        )
        .with_clock(self.clock.clone())
    }
}

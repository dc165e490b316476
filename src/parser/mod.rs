//! Challenge set normalization
//!
//! All knowledge of the upstream JSON schema lives here. The parser is pure:
//! no network access, same payload in, equal [`DailyDocument`] out.
//!
//! # Payload shape
//!
//! ```json
//! {
//!   "challengeSets": [
//!     {
//!       "role": "BOUNTY_HUNTER",
//!       "startTime": 1714543230,
//!       "challenges": [
//!         { "description": { "localizedFull": "Bounty Hunter/2 Capture bounties alive" } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `data` is accepted in place of `challengeSets`.

pub mod companion;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::models::{Category, Challenge, DailyDocument};
use crate::source::RawPayload;
use crate::utils::error::ParseError;

pub use companion::CompanionResolver;

#[derive(Debug, Deserialize)]
struct ChallengeSetPayload {
    #[serde(rename = "challengeSets", alias = "data")]
    sets: Vec<CategoryPayload>,
}

#[derive(Debug, Deserialize)]
struct CategoryPayload {
    role: String,
    #[serde(rename = "startTime", default)]
    start_time: Option<serde_json::Value>,
    #[serde(default)]
    challenges: Vec<ChallengePayload>,
}

#[derive(Debug, Deserialize)]
struct ChallengePayload {
    description: DescriptionPayload,
}

#[derive(Debug, Deserialize)]
struct DescriptionPayload {
    #[serde(rename = "localizedFull")]
    localized_full: String,
}

/// Parse a raw challenge set into a document without companion image
///
/// # Errors
///
/// - `ParseError::UnexpectedPayload` if the payload is not JSON
/// - `ParseError::Json` if the JSON does not match the expected shape
/// - `ParseError::UnknownRole` if a category role has no mapping
/// - `ParseError::EmptyChallengeSet` if there are no categories
/// - `ParseError::MissingField` / `InvalidTimestamp` if no usable `startTime` exists
pub fn parse(raw: &RawPayload) -> Result<DailyDocument, ParseError> {
    let payload = ChallengeSetPayload::deserialize(raw.as_json()?)?;

    if payload.sets.is_empty() {
        return Err(ParseError::EmptyChallengeSet);
    }

    let mut earliest: Option<i64> = None;
    let mut categories = std::collections::BTreeMap::new();

    for set in &payload.sets {
        let category = Category::from_role(&set.role)
            .ok_or_else(|| ParseError::UnknownRole(set.role.clone()))?;

        if let Some(start) = set.start_time.as_ref().map(epoch_seconds).transpose()? {
            earliest = Some(earliest.map_or(start, |e| e.min(start)));
        }

        let challenges: &mut Vec<Challenge> = categories.entry(category).or_default();
        challenges.extend(
            set.challenges
                .iter()
                .map(|c| split_description(&c.description.localized_full)),
        );
    }

    let start = earliest.ok_or_else(|| ParseError::MissingField("startTime".to_string()))?;

    let mut document = DailyDocument::new(date_from_epoch(start)?);
    document.categories = categories;
    Ok(document)
}

/// Turn a localized description into a challenge
///
/// Upstream prefixes descriptions with a label followed by `/`; only the part
/// after the first slash describes the challenge.
pub fn split_description(description: &str) -> Challenge {
    let body = match description.split_once('/') {
        Some((_, after)) if !after.trim().is_empty() => after,
        _ => description,
    };
    Challenge::from_description(body)
}

/// Calendar date (UTC) of an epoch timestamp in seconds
pub fn date_from_epoch(seconds: i64) -> Result<NaiveDate, ParseError> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.date_naive())
        .ok_or(ParseError::InvalidTimestamp(seconds))
}

fn epoch_seconds(value: &serde_json::Value) -> Result<i64, ParseError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseError::MissingField("startTime".to_string()))
}

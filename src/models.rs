// Core data structures for the daily announcer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Platform channel identifier of a destination
pub type DestinationId = u64;

/// Challenge category
///
/// Variant order is the canonical rendering order; `Ord` follows it so a
/// `BTreeMap<Category, _>` iterates in that order regardless of how upstream
/// listed the categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    BountyHunter,
    Trader,
    Collector,
    Moonshiner,
    Naturalist,
}

impl Category {
    /// Stable key used in persisted records and catalog lookups
    pub fn key(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::BountyHunter => "bounty_hunter",
            Self::Trader => "trader",
            Self::Collector => "collector",
            Self::Moonshiner => "moonshiner",
            Self::Naturalist => "naturalist",
        }
    }

    /// Map an upstream role name to a category
    ///
    /// Case-insensitive; `-` and spaces are treated as `_`.
    pub fn from_role(role: &str) -> Option<Self> {
        let normalized = role.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "GENERAL" => Some(Self::General),
            "BOUNTY_HUNTER" => Some(Self::BountyHunter),
            "TRADER" => Some(Self::Trader),
            "COLLECTOR" => Some(Self::Collector),
            "MOONSHINER" => Some(Self::Moonshiner),
            "NATURALIST" => Some(Self::Naturalist),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordinal used when a description carries no leading count or amount
pub const DEFAULT_ORDINAL: &str = "1";

/// A single daily challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Count or currency label, e.g. `"3"` or `"$500"`
    pub ordinal: String,
    /// Human-readable description
    pub text: String,
}

impl Challenge {
    /// Create a challenge from its parts
    pub fn new(ordinal: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ordinal: ordinal.into(),
            text: text.into(),
        }
    }

    /// Split a description into its leading ordinal token and the remaining text
    ///
    /// `"3 Complete a bounty"` gives `("3", "Complete a bounty")` and
    /// `"$500 Sell 3 items"` gives `("$500", "Sell 3 items")`. Anything else keeps
    /// the whole string as text with [`DEFAULT_ORDINAL`].
    pub fn from_description(description: &str) -> Self {
        let trimmed = description.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();

        if !rest.is_empty() && is_ordinal_token(head) {
            Self::new(head, rest)
        } else {
            Self::new(DEFAULT_ORDINAL, trimmed)
        }
    }
}

fn is_ordinal_token(token: &str) -> bool {
    if let Some(amount) = token.strip_prefix('$') {
        return !amount.is_empty();
    }
    !token.is_empty() && token.chars().all(|c| c.is_numeric())
}

/// A delivery target with its rendering locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Platform channel identifier
    pub id: DestinationId,
    /// Language tag used to render for this destination
    pub locale: String,
}

impl Destination {
    /// Create a destination
    pub fn new(id: DestinationId, locale: impl Into<String>) -> Self {
        Self {
            id,
            locale: locale.into(),
        }
    }
}

/// Canonical content for one publish day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDocument {
    /// Publish day this document belongs to
    pub date: NaiveDate,

    /// Challenges per category, in canonical category order
    pub categories: BTreeMap<Category, Vec<Challenge>>,

    /// Companion location image; `None` while the document is partial
    #[serde(default, with = "image_base64", skip_serializing_if = "Option::is_none")]
    pub companion_image: Option<Vec<u8>>,

    /// Destinations already sent a rendering of this document
    #[serde(default)]
    pub delivered_to: BTreeSet<DestinationId>,
}

impl DailyDocument {
    /// Create an empty document for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            categories: BTreeMap::new(),
            companion_image: None,
            delivered_to: BTreeSet::new(),
        }
    }

    /// Attach the companion image, completing the document
    pub fn with_companion_image(mut self, image: impl Into<Vec<u8>>) -> Self {
        self.companion_image = Some(image.into());
        self
    }

    /// Whether the document has everything needed to be delivered and persisted
    pub fn is_complete(&self) -> bool {
        self.companion_image.is_some()
    }

    /// Challenges of one category
    pub fn challenges(&self, category: Category) -> &[Challenge] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of challenges across categories
    pub fn challenge_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

mod image_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

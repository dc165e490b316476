//! Destination registry
//!
//! Maps a guild to the channel that receives the daily announcement and the
//! locale to render it in. The publish cycle only ever reads a snapshot; the
//! command-handling side owns the write API (`register`, `remove_guild`,
//! `remove_destination`). Readers and writers go through a `RwLock`, and every
//! write is persisted before the lock is released.
//!
//! The file is the source of truth: writers may live in another process, so
//! snapshots and writes re-read it first. An unreadable file falls back to the
//! last good in-memory copy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{read_record, write_record};
use crate::models::{Destination, DestinationId};
use crate::utils::error::PersistenceError;

/// Guild identifier on the chat platform
pub type GuildId = u64;

/// Read-only view of the current destinations
#[async_trait]
pub trait DestinationSource: Send + Sync {
    /// Destinations registered right now
    async fn snapshot(&self) -> Vec<Destination>;
}

/// One registered guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Channel receiving the announcement
    pub channel_id: DestinationId,
    /// Rendering locale
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}

/// File-backed guild → destination registry
#[derive(Debug)]
pub struct DestinationRegistry {
    path: PathBuf,
    allowed_locales: Vec<String>,
    entries: RwLock<BTreeMap<GuildId, RegistryEntry>>,
}

impl DestinationRegistry {
    /// Load the registry from `path`; a missing or empty file is an empty registry
    ///
    /// `allowed_locales` restricts what `register` accepts.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file exists but cannot be read or decoded
    pub async fn load(
        path: impl Into<PathBuf>,
        allowed_locales: Vec<String>,
    ) -> Result<Self, PersistenceError> {
        let path = path.into();
        let entries: BTreeMap<GuildId, RegistryEntry> =
            read_record(&path).await?.unwrap_or_default();

        tracing::info!(
            path = %path.display(),
            destinations = entries.len(),
            "Destination registry loaded"
        );

        Ok(Self {
            path,
            allowed_locales,
            entries: RwLock::new(entries),
        })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locales `register` accepts
    pub fn allowed_locales(&self) -> &[String] {
        &self.allowed_locales
    }

    /// Register (or replace) the destination of a guild
    ///
    /// # Errors
    ///
    /// - `PersistenceError::InvalidEntry` if the locale is not available
    /// - `PersistenceError::Io` if the registry cannot be written; the
    ///   in-memory registry is left unchanged
    pub async fn register(
        &self,
        guild_id: GuildId,
        channel_id: DestinationId,
        locale: &str,
    ) -> Result<(), PersistenceError> {
        if !self.allowed_locales.iter().any(|l| l == locale) {
            return Err(PersistenceError::InvalidEntry(format!(
                "locale '{locale}' is not available (available: {})",
                self.allowed_locales.join(", ")
            )));
        }

        let mut entries = self.entries.write().await;
        self.refresh(&mut entries).await;
        let mut updated = entries.clone();
        updated.insert(
            guild_id,
            RegistryEntry {
                channel_id,
                locale: locale.to_string(),
            },
        );
        write_record(&self.path, &updated).await?;
        *entries = updated;

        tracing::info!(guild = guild_id, channel = channel_id, locale = %locale, "Destination registered");
        Ok(())
    }

    /// Remove a guild's destination (e.g. the guild removed the bot)
    ///
    /// Returns whether anything was removed; removing an absent guild is a no-op.
    pub async fn remove_guild(&self, guild_id: GuildId) -> Result<bool, PersistenceError> {
        self.remove_where(|guild, _| *guild == guild_id).await
    }

    /// Remove every registration pointing at a channel
    ///
    /// Returns whether anything was removed.
    pub async fn remove_destination(
        &self,
        channel_id: DestinationId,
    ) -> Result<bool, PersistenceError> {
        self.remove_where(|_, entry| entry.channel_id == channel_id)
            .await
    }

    async fn remove_where<P>(&self, predicate: P) -> Result<bool, PersistenceError>
    where
        P: Fn(&GuildId, &RegistryEntry) -> bool,
    {
        let mut entries = self.entries.write().await;
        self.refresh(&mut entries).await;
        let mut updated = entries.clone();
        updated.retain(|guild, entry| !predicate(guild, entry));

        if updated.len() == entries.len() {
            return Ok(false);
        }

        write_record(&self.path, &updated).await?;
        let removed = entries.len() - updated.len();
        *entries = updated;

        tracing::info!(removed = removed, "Destinations removed");
        Ok(true)
    }

    /// Replace `entries` with the file contents; keep them if the file is unreadable
    async fn refresh(&self, entries: &mut BTreeMap<GuildId, RegistryEntry>) {
        match read_record::<BTreeMap<GuildId, RegistryEntry>>(&self.path).await {
            Ok(current) => *entries = current.unwrap_or_default(),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Destination registry unreadable, using last loaded copy"
            ),
        }
    }

    /// Number of registered guilds
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no guild is registered
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DestinationSource for DestinationRegistry {
    async fn snapshot(&self) -> Vec<Destination> {
        let mut entries = self.entries.write().await;
        self.refresh(&mut entries).await;
        entries
            .values()
            .map(|entry| Destination::new(entry.channel_id, entry.locale.clone()))
            .collect()
    }
}

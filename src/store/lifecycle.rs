//! Guild provisioning and teardown
//!
//! A guild's record tree is built when the guild is joined and torn down
//! when it is left. Provisioning is also re-run at startup for any guild
//! whose root directory has gone missing, so a wiped data directory heals
//! itself on the next run.

use std::sync::Arc;

use tracing::{info, warn};

use super::{RecordStore, EMPTY_ARRAY};
use crate::cache::MessageCache;
use crate::error::{Result, StoreError};
use crate::gateway::ChannelHistory;
use crate::types::{GuildConfig, GuildId, LogKind};

/// Creates and deletes per-guild record trees, and owns config access
pub struct GuildLifecycle {
    store: Arc<RecordStore>,
}

impl GuildLifecycle {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Create the guild's directory skeleton, default config and empty logs
    ///
    /// Idempotent: directories and files already present are left alone, so
    /// re-running over a partially wiped tree restores only what is missing.
    pub fn provision(&self, guild: &GuildId) -> Result<()> {
        let paths = self.store.paths();
        self.store.create_dir(&paths.guild_root(guild))?;
        self.store.create_dir(&paths.guild_logs_dir(guild))?;
        self.store.create_dir(&paths.troll_attachments_dir(guild))?;
        self.store.create_dir(&paths.messages_dir(guild))?;
        self.store.create_dir(&paths.message_attachments_dir(guild))?;

        if !paths.guild_config(guild).exists() {
            self.store_config(guild, &GuildConfig::default())?;
        }
        for kind in LogKind::all() {
            self.store
                .ensure_file(&paths.guild_log(guild, kind), EMPTY_ARRAY)?;
        }

        info!(guild = %guild, "provisioned guild record tree");
        Ok(())
    }

    /// Guild-join path: provision the tree, then take the initial history
    /// snapshot so messages sent before the join stay resolvable
    ///
    /// The snapshot honors the caching flag and is best effort: a gateway
    /// failure is logged and the join still succeeds, and the startup
    /// backfill catches the guild up on the next run.
    pub async fn join(
        &self,
        guild: &GuildId,
        cache: &MessageCache,
        gateway: &dyn ChannelHistory,
    ) -> Result<()> {
        self.provision(guild)?;
        if !cache.enabled() {
            info!(guild = %guild, "message caching disabled, skipping initial snapshot");
            return Ok(());
        }
        if let Err(e) = cache.cache_all(gateway, guild).await {
            warn!(guild = %guild, error = %e, "initial history snapshot failed");
        }
        Ok(())
    }

    /// Delete the guild's entire record tree
    ///
    /// Backed by the store's retrying tree delete; a tree that cannot be
    /// removed is logged and abandoned, never surfaced.
    pub async fn deprovision(&self, guild: &GuildId) {
        let root = self.store.paths().guild_root(guild);
        info!(guild = %guild, "deprovisioning guild record tree");
        self.store.delete_tree(&root).await;
    }

    /// The guild's config document, falling back to defaults
    ///
    /// A missing document is written out with defaults; a corrupt one loads
    /// as defaults but is left on disk untouched.
    pub fn load_config(&self, guild: &GuildId) -> GuildConfig {
        let path = self.store.paths().guild_config(guild);
        if !path.exists() {
            warn!(guild = %guild, "guild config missing, writing defaults");
            let defaults = GuildConfig::default();
            if let Err(e) = self.store_config(guild, &defaults) {
                warn!(guild = %guild, error = %e, "failed to write default guild config");
            }
            return defaults;
        }

        let contents = self.store.read_raw(&path);
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(guild = %guild, error = %e, "corrupted guild config, using defaults");
                GuildConfig::default()
            }
        }
    }

    /// Atomically replace the guild's config document
    ///
    /// The overwrite runs under the config file's lock.
    pub fn store_config(&self, guild: &GuildId, config: &GuildConfig) -> Result<()> {
        let path = self.store.paths().guild_config(guild);
        let contents =
            serde_json::to_string_pretty(config).map_err(|e| StoreError::json(&path, e))?;
        self.store.overwrite(&path, &contents)
    }
}

//! Startup bootstrap
//!
//! One pass over the data root when the process comes up: make sure the
//! top-level directories exist, trim old process logs, re-provision any
//! guild whose record tree has gone missing, and bring each guild's
//! message cache in line with the caching flag (backfill when enabled,
//! delete the blob subtree when disabled).
//!
//! The guild list comes from the embedding process, which knows which
//! guilds the bot is in when its ready event fires.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::cache::MessageCache;
use crate::config::Config;
use crate::error::Result;
use crate::gateway::ChannelHistory;
use crate::store::{GuildLifecycle, LogRetention, RecordStore};
use crate::types::GuildId;

/// What the bootstrap pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Guilds re-provisioned because their root directory was missing
    pub provisioned: usize,
    /// Stale process log files removed by retention
    pub logs_deleted: usize,
    /// Guilds whose history was snapshotted (caching enabled)
    pub caches_built: usize,
    /// Guilds whose blob cache subtree was deleted (caching disabled)
    pub caches_dropped: usize,
}

/// Prepare the data root for a new run
///
/// Store-side failures surface as errors; per-guild gateway failures
/// during cache backfill are logged and skipped so one unreachable guild
/// cannot stall startup.
pub async fn bootstrap(
    config: &Config,
    store: Arc<RecordStore>,
    gateway: &dyn ChannelHistory,
    guilds: &[GuildId],
) -> Result<BootstrapSummary> {
    let mut summary = BootstrapSummary::default();

    store.create_dir(&store.paths().guilds_dir())?;
    store.create_dir(&store.paths().process_logs_dir())?;

    summary.logs_deleted =
        LogRetention::new(config.max_log_files).apply(&store.paths().process_logs_dir())?;

    let lifecycle = GuildLifecycle::new(Arc::clone(&store));
    for guild in guilds {
        if store.paths().guild_root(guild).exists() {
            continue;
        }
        warn!(guild = %guild, "guild record tree missing, re-provisioning");
        lifecycle.provision(guild)?;
        summary.provisioned += 1;
    }

    let cache = MessageCache::new(Arc::clone(&store), config);
    if cache.enabled() {
        let cache = &cache;
        let results = join_all(
            guilds
                .iter()
                .map(|guild| async move { (guild, cache.cache_all(gateway, guild).await) }),
        )
        .await;
        for (guild, result) in results {
            match result {
                Ok(_) => summary.caches_built += 1,
                Err(e) => {
                    warn!(guild = %guild, error = %e, "history snapshot failed, skipping guild");
                }
            }
        }
    } else {
        let mut drops = Vec::new();
        for guild in guilds {
            if store.paths().blob_cache_dir(guild).exists() {
                drops.push(cache.drop_cache(guild));
                summary.caches_dropped += 1;
            }
        }
        join_all(drops).await;
    }

    info!(
        provisioned = summary.provisioned,
        logs_deleted = summary.logs_deleted,
        caches_built = summary.caches_built,
        caches_dropped = summary.caches_dropped,
        "bootstrap complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MemoryGateway;
    use crate::gateway::{ChannelInfo, GatewayMessage};
    use crate::types::{ChannelId, LogTimestamp, MessageId, UserId, UserRef};
    use std::fs;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path, caching: bool) -> Config {
        let mut config = Config::with_data_dir(root);
        config.message_caching = caching;
        config
    }

    fn guild(id: &str) -> GuildId {
        GuildId::new(id).unwrap()
    }

    fn seeded_gateway(g: &GuildId) -> MemoryGateway {
        let gateway = MemoryGateway::new();
        let channel = ChannelId::new("c1").unwrap();
        gateway.add_channel(
            g,
            ChannelInfo {
                id: channel.clone(),
                name: "general".to_string(),
            },
        );
        gateway.add_message(
            g,
            GatewayMessage {
                id: MessageId::new("m1").unwrap(),
                channel_id: channel,
                author: UserRef::new("alice", UserId::new("u1").unwrap()),
                contents: "hello".to_string(),
                attachments: Vec::new(),
                sent_at: LogTimestamp::from_parts(2024, 1, 1, 0, 0, 0),
            },
        );
        gateway
    }

    #[tokio::test]
    async fn test_bootstrap_provisions_missing_guilds_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), true);
        let store = Arc::new(RecordStore::with_root(temp_dir.path()));
        let gateway = MemoryGateway::new();

        let g1 = guild("g1");
        let g2 = guild("g2");
        GuildLifecycle::new(Arc::clone(&store)).provision(&g1).unwrap();

        let summary = bootstrap(&config, Arc::clone(&store), &gateway, &[g1.clone(), g2.clone()])
            .await
            .unwrap();

        assert_eq!(summary.provisioned, 1);
        assert!(store.paths().guild_root(&g2).is_dir());
        assert!(store.paths().guilds_dir().is_dir());
        assert!(store.paths().process_logs_dir().is_dir());
    }

    #[tokio::test]
    async fn test_bootstrap_applies_retention() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), true);
        let store = Arc::new(RecordStore::with_root(temp_dir.path()));
        let gateway = MemoryGateway::new();

        let logs_dir = store.paths().process_logs_dir();
        fs::create_dir_all(&logs_dir).unwrap();
        for i in 0..20 {
            fs::write(logs_dir.join(format!("2024-01-{:02} 00-00-00.txt", i + 1)), "x").unwrap();
        }

        let summary = bootstrap(&config, store, &gateway, &[]).await.unwrap();
        assert_eq!(summary.logs_deleted, 6);
    }

    #[tokio::test]
    async fn test_bootstrap_builds_caches_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), true);
        let store = Arc::new(RecordStore::with_root(temp_dir.path()));

        let g = guild("g1");
        let gateway = seeded_gateway(&g);

        let summary = bootstrap(&config, Arc::clone(&store), &gateway, &[g.clone()])
            .await
            .unwrap();

        assert_eq!(summary.caches_built, 1);
        let cache = MessageCache::new(store, &config);
        assert!(cache
            .lookup(&g, &MessageId::new("m1").unwrap())
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_drops_caches_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::with_root(temp_dir.path()));
        let g = guild("g1");

        // Build a cache first, then boot with the flag off
        let caching_on = test_config(temp_dir.path(), true);
        let gateway = seeded_gateway(&g);
        bootstrap(&caching_on, Arc::clone(&store), &gateway, &[g.clone()])
            .await
            .unwrap();
        assert!(store.paths().blob_cache_dir(&g).exists());

        let caching_off = test_config(temp_dir.path(), false);
        let summary = bootstrap(&caching_off, Arc::clone(&store), &gateway, &[g.clone()])
            .await
            .unwrap();

        assert_eq!(summary.caches_dropped, 1);
        assert!(!store.paths().blob_cache_dir(&g).exists());
    }
}

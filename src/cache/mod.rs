//! Message snapshot cache
//!
//! Keeps a per-channel JSON array of [`MessageSnapshot`]s plus copies of
//! message attachments under the guild's blob cache subtree. The cache is
//! what lets a deleted-message query answer "what did that message say"
//! after the platform has forgotten it.
//!
//! Snapshotting is either a full-history backfill ([`MessageCache::cache_all`],
//! run on guild join and at startup) or an incremental single-message append
//! as messages arrive. Both paths deduplicate by message id, so re-running a
//! backfill over an already-populated cache adds nothing.

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::gateway::{ChannelHistory, GatewayMessage};
use crate::store::RecordStore;
use crate::types::{sanitize_filename, GuildId, MessageId, MessageSnapshot};

/// Platform page limit for history requests
const PAGE_SIZE: usize = 100;

/// Per-guild message snapshot store
pub struct MessageCache {
    store: Arc<RecordStore>,
    enabled: bool,
}

impl MessageCache {
    pub fn new(store: Arc<RecordStore>, config: &Config) -> Self {
        Self {
            store,
            enabled: config.message_caching,
        }
    }

    /// Whether snapshotting is enabled by configuration
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot the full history of every message-capable channel
    ///
    /// History is fetched in pages of 100 until a short page signals the end.
    /// Messages already cached are skipped, so invoking this repeatedly never
    /// duplicates entries. Returns the number of newly cached messages.
    pub async fn cache_all(
        &self,
        gateway: &dyn ChannelHistory,
        guild: &GuildId,
    ) -> Result<usize> {
        let mut cached = 0;
        for channel in gateway.channels(guild).await? {
            let mut history: Vec<GatewayMessage> = Vec::new();
            let mut before: Option<MessageId> = None;
            loop {
                let page = gateway
                    .messages_before(guild, &channel.id, before.as_ref(), PAGE_SIZE)
                    .await?;
                let exhausted = page.len() < PAGE_SIZE;
                before = page.last().map(|m| m.id.clone());
                history.extend(page);
                if exhausted {
                    break;
                }
            }
            if history.is_empty() {
                continue;
            }

            // Merge under the file lock; the lock is never held across an await
            let path = self.store.paths().channel_messages(guild, &channel.id);
            let fresh: Vec<GatewayMessage> = {
                let lock = self.store.file_lock(&path);
                let _guard = lock.lock();

                let mut snapshots = self.load_snapshots_at(&path)?;
                let mut known: HashSet<String> = snapshots
                    .iter()
                    .map(|s| s.message_id.as_str().to_string())
                    .collect();
                let fresh: Vec<GatewayMessage> = history
                    .into_iter()
                    .filter(|m| known.insert(m.id.as_str().to_string()))
                    .collect();

                if fresh.is_empty() {
                    Vec::new()
                } else {
                    snapshots.extend(fresh.iter().map(snapshot_of));
                    if self.write_snapshots_at(&path, &snapshots) {
                        cached += fresh.len();
                        fresh
                    } else {
                        Vec::new()
                    }
                }
            };

            for message in &fresh {
                self.copy_attachments(gateway, guild, message).await;
            }
        }

        if cached > 0 {
            info!(guild = %guild, cached, "snapshotted channel history");
        }
        Ok(cached)
    }

    /// Snapshot a single incoming message
    ///
    /// No-op when caching is disabled. A guild whose snapshot directory has
    /// gone missing gets a full backfill instead, which picks this message
    /// up along with the rest of history.
    pub async fn record_one(
        &self,
        gateway: &dyn ChannelHistory,
        guild: &GuildId,
        message: &GatewayMessage,
    ) -> Result<usize> {
        if !self.enabled {
            return Ok(0);
        }
        if !self.store.paths().messages_dir(guild).exists() {
            return self.cache_all(gateway, guild).await;
        }

        let path = self
            .store
            .paths()
            .channel_messages(guild, &message.channel_id);
        {
            let lock = self.store.file_lock(&path);
            let _guard = lock.lock();

            let mut snapshots = self.load_snapshots_at(&path)?;
            if snapshots.iter().any(|s| s.message_id == message.id) {
                return Ok(0);
            }
            snapshots.push(snapshot_of(message));
            if !self.write_snapshots_at(&path, &snapshots) {
                return Ok(0);
            }
        }

        self.copy_attachments(gateway, guild, message).await;
        Ok(1)
    }

    /// Find a cached snapshot by message id, scanning every channel array
    pub fn lookup(&self, guild: &GuildId, message: &MessageId) -> Result<Option<MessageSnapshot>> {
        let dir = self.store.paths().messages_dir(guild);
        if !dir.is_dir() {
            return Ok(None);
        }
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let lock = self.store.file_lock(&path);
            let _guard = lock.lock();
            let found = self
                .load_snapshots_at(&path)?
                .into_iter()
                .find(|s| &s.message_id == message);
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Record a message id in the guild's deleted-message index
    ///
    /// No-op when caching is disabled; without snapshots the index would
    /// point at nothing.
    pub fn record_deleted(&self, guild: &GuildId, message: &MessageId) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.store.append_deleted_id(guild, message)
    }

    /// Delete the guild's blob cache subtree to reclaim disk
    pub async fn drop_cache(&self, guild: &GuildId) {
        let dir = self.store.paths().blob_cache_dir(guild);
        self.store.delete_tree(&dir).await;
    }

    /// Load one channel's snapshot array, skipping corrupt elements
    ///
    /// Callers hold the file's lock.
    fn load_snapshots_at(&self, path: &std::path::Path) -> Result<Vec<MessageSnapshot>> {
        let values = self.store.load_array_unlocked(path)?;
        let mut snapshots = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<MessageSnapshot>(value) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    self.store.note_skipped_entry();
                    warn!(path = %path.display(), error = %e, "corrupted snapshot, skipping");
                }
            }
        }
        Ok(snapshots)
    }

    /// Rewrite one channel's snapshot array; a failed write is dropped
    ///
    /// Callers hold the file's lock.
    fn write_snapshots_at(&self, path: &std::path::Path, snapshots: &[MessageSnapshot]) -> bool {
        let contents = match serde_json::to_string_pretty(snapshots) {
            Ok(contents) => contents,
            Err(e) => {
                self.store.note_dropped_write();
                warn!(path = %path.display(), error = %e, "snapshot serialization failed, dropped");
                return false;
            }
        };
        match self.store.overwrite_unlocked(path, &contents) {
            Ok(()) => true,
            Err(e) => {
                self.store.note_dropped_write();
                warn!(path = %path.display(), error = %e, "snapshot write failed, dropped");
                false
            }
        }
    }

    /// Copy a message's attachments into its blob cache directory
    ///
    /// Fetch and write failures skip the attachment with a WARN; the
    /// snapshot itself still records the attachment names.
    async fn copy_attachments(
        &self,
        gateway: &dyn ChannelHistory,
        guild: &GuildId,
        message: &GatewayMessage,
    ) {
        if message.attachments.is_empty() {
            return;
        }
        let dir = self.store.paths().attachments_for_message(guild, &message.id);
        if let Err(e) = self.store.create_dir(&dir) {
            warn!(message = %message.id, error = %e, "cannot create attachment directory, skipping");
            return;
        }
        for attachment in &message.attachments {
            let Some(name) = sanitize_filename(&attachment.name) else {
                warn!(message = %message.id, name = %attachment.name, "unusable attachment name, skipping");
                continue;
            };
            match gateway.fetch_attachment(&attachment.url).await {
                Ok(bytes) => {
                    if let Err(e) = fs::write(dir.join(&name), bytes) {
                        warn!(message = %message.id, name = %name, error = %e, "attachment write failed, skipping");
                    }
                }
                Err(e) => {
                    warn!(message = %message.id, name = %name, error = %e, "attachment fetch failed, skipping");
                }
            }
        }
    }
}

fn snapshot_of(message: &GatewayMessage) -> MessageSnapshot {
    MessageSnapshot {
        message_id: message.id.clone(),
        author_id: message.author.id.clone(),
        author_name: message.author.name.clone(),
        channel_id: message.channel_id.clone(),
        contents: message.contents.clone(),
        attachment_names: message.attachments.iter().map(|a| a.name.clone()).collect(),
        timestamp: message.sent_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MemoryGateway;
    use crate::gateway::{ChannelInfo, GatewayAttachment};
    use crate::types::{ChannelId, LogTimestamp, UserId, UserRef};
    use tempfile::TempDir;

    fn test_config(caching: bool) -> Config {
        let mut config = Config::with_data_dir("unused");
        config.message_caching = caching;
        config
    }

    fn create_test_cache(caching: bool) -> (MessageCache, Arc<RecordStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::with_root(temp_dir.path()));
        let cache = MessageCache::new(Arc::clone(&store), &test_config(caching));
        (cache, store, temp_dir)
    }

    fn guild() -> GuildId {
        GuildId::new("g1").unwrap()
    }

    fn channel() -> ChannelId {
        ChannelId::new("c1").unwrap()
    }

    fn message(id: &str) -> GatewayMessage {
        GatewayMessage {
            id: MessageId::new(id).unwrap(),
            channel_id: channel(),
            author: UserRef::new("alice", UserId::new("u1").unwrap()),
            contents: format!("contents of {id}"),
            attachments: Vec::new(),
            sent_at: LogTimestamp::from_parts(2024, 3, 4, 5, 6, 7),
        }
    }

    fn seeded_gateway(guild: &GuildId, count: usize) -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.add_channel(
            guild,
            ChannelInfo {
                id: channel(),
                name: "general".to_string(),
            },
        );
        for i in 0..count {
            gateway.add_message(guild, message(&format!("m{i}")));
        }
        gateway
    }

    #[tokio::test]
    async fn test_cache_all_pages_full_history() {
        let (cache, _store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 250);

        let cached = cache.cache_all(&gateway, &g).await.unwrap();
        assert_eq!(cached, 250);

        let snap = cache
            .lookup(&g, &MessageId::new("m0").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(snap.contents, "contents of m0");
    }

    #[tokio::test]
    async fn test_cache_all_is_idempotent() {
        let (cache, _store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 7);

        assert_eq!(cache.cache_all(&gateway, &g).await.unwrap(), 7);
        assert_eq!(cache.cache_all(&gateway, &g).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_all_copies_attachments() {
        let (cache, store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 0);

        let mut with_file = message("m1");
        with_file.attachments.push(GatewayAttachment {
            name: "evidence.png".to_string(),
            url: "https://cdn.example/evidence.png".to_string(),
        });
        gateway.add_message(&g, with_file);
        gateway.put_attachment("https://cdn.example/evidence.png", vec![1, 2, 3]);

        cache.cache_all(&gateway, &g).await.unwrap();

        let copied = store
            .paths()
            .attachments_for_message(&g, &MessageId::new("m1").unwrap())
            .join("evidence.png");
        assert_eq!(fs::read(copied).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_record_one_appends_and_dedupes() {
        let (cache, store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 0);
        store.create_dir(&store.paths().messages_dir(&g)).unwrap();

        let msg = message("m1");
        assert_eq!(cache.record_one(&gateway, &g, &msg).await.unwrap(), 1);
        assert_eq!(cache.record_one(&gateway, &g, &msg).await.unwrap(), 0);

        assert!(cache.lookup(&g, &msg.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_record_one_disabled_is_a_no_op() {
        let (cache, _store, _temp_dir) = create_test_cache(false);
        let g = guild();
        let gateway = seeded_gateway(&g, 0);

        let msg = message("m1");
        assert_eq!(cache.record_one(&gateway, &g, &msg).await.unwrap(), 0);
        assert!(cache.lookup(&g, &msg.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_one_backfills_missing_cache() {
        let (cache, _store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 3);

        // Snapshot dir was never created; the single-message path must fall
        // back to a full backfill that includes prior history
        let latest = message("m2");
        assert_eq!(cache.record_one(&gateway, &g, &latest).await.unwrap(), 3);
        assert!(cache
            .lookup(&g, &MessageId::new("m0").unwrap())
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_record_deleted_respects_flag() {
        let (cache, store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let id = MessageId::new("m1").unwrap();

        cache.record_deleted(&g, &id).unwrap();
        assert_eq!(store.load_deleted_ids(&g).unwrap(), vec!["m1".to_string()]);

        let (disabled, store2, _temp_dir2) = create_test_cache(false);
        disabled.record_deleted(&g, &id).unwrap();
        assert!(store2.load_deleted_ids(&g).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_cache_removes_blob_subtree_only() {
        let (cache, store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 2);

        cache.cache_all(&gateway, &g).await.unwrap();
        store
            .append_deleted_id(&g, &MessageId::new("m0").unwrap())
            .unwrap();

        cache.drop_cache(&g).await;

        assert!(!store.paths().blob_cache_dir(&g).exists());
        assert_eq!(store.load_deleted_ids(&g).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_skipped() {
        let (cache, store, _temp_dir) = create_test_cache(true);
        let g = guild();
        let gateway = seeded_gateway(&g, 2);

        cache.cache_all(&gateway, &g).await.unwrap();

        let path = store.paths().channel_messages(&g, &channel());
        let mut array: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        array.insert(0, serde_json::json!({"not": "a snapshot"}));
        fs::write(&path, serde_json::to_string(&array).unwrap()).unwrap();

        assert!(cache
            .lookup(&g, &MessageId::new("m1").unwrap())
            .unwrap()
            .is_some());
        assert_eq!(store.skipped_entries(), 1);
    }
}

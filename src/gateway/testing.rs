//! In-memory gateway for tests
//!
//! Implements both gateway traits over data seeded up front, without
//! requiring a platform connection. Channels, messages and audit entries
//! are added in chronological order; history and audit reads come back
//! newest first, the way the platform delivers them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AuditEntry, AuditTrail, ChannelHistory, ChannelInfo, GatewayMessage};
use crate::error::{Result, StoreError};
use crate::types::{ChannelId, GuildId, MessageId};

/// Gateway backed by in-memory maps
#[derive(Default)]
pub struct MemoryGateway {
    channels: Mutex<HashMap<GuildId, Vec<ChannelInfo>>>,
    messages: Mutex<HashMap<(GuildId, ChannelId), Vec<GatewayMessage>>>,
    audit: Mutex<HashMap<GuildId, Vec<AuditEntry>>>,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
    fail_audit: AtomicBool,
    fail_history: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&self, guild: &GuildId, channel: ChannelInfo) {
        self.channels
            .lock()
            .entry(guild.clone())
            .or_default()
            .push(channel);
    }

    /// Add a message; call in the order messages were sent
    pub fn add_message(&self, guild: &GuildId, message: GatewayMessage) {
        self.messages
            .lock()
            .entry((guild.clone(), message.channel_id.clone()))
            .or_default()
            .insert(0, message);
    }

    /// Add an audit entry; call in the order actions happened
    pub fn push_audit_entry(&self, guild: &GuildId, entry: AuditEntry) {
        self.audit
            .lock()
            .entry(guild.clone())
            .or_default()
            .insert(0, entry);
    }

    pub fn put_attachment(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.attachments.lock().insert(url.into(), bytes);
    }

    /// Make every audit query fail with a gateway error
    pub fn set_audit_failure(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::Relaxed);
    }

    /// Make every channel listing fail with a gateway error
    pub fn set_history_failure(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ChannelHistory for MemoryGateway {
    async fn channels(&self, guild: &GuildId) -> Result<Vec<ChannelInfo>> {
        if self.fail_history.load(Ordering::Relaxed) {
            return Err(StoreError::Gateway("channel listing unavailable".to_string()));
        }
        Ok(self.channels.lock().get(guild).cloned().unwrap_or_default())
    }

    async fn messages_before(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        before: Option<&MessageId>,
        limit: usize,
    ) -> Result<Vec<GatewayMessage>> {
        let messages = self.messages.lock();
        let Some(history) = messages.get(&(guild.clone(), channel.clone())) else {
            return Ok(Vec::new());
        };
        let start = match before {
            Some(id) => match history.iter().position(|m| &m.id == id) {
                Some(pos) => pos + 1,
                None => return Ok(Vec::new()),
            },
            None => 0,
        };
        Ok(history.iter().skip(start).take(limit).cloned().collect())
    }

    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        self.attachments
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| StoreError::Gateway(format!("no such attachment: {url}")))
    }
}

#[async_trait]
impl AuditTrail for MemoryGateway {
    async fn member_updates(&self, guild: &GuildId, limit: usize) -> Result<Vec<AuditEntry>> {
        if self.fail_audit.load(Ordering::Relaxed) {
            return Err(StoreError::Gateway("audit trail unavailable".to_string()));
        }
        Ok(self
            .audit
            .lock()
            .get(guild)
            .map(|entries| entries.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogTimestamp, UserId, UserRef};

    fn message(id: &str, channel: &ChannelId) -> GatewayMessage {
        GatewayMessage {
            id: MessageId::new(id).unwrap(),
            channel_id: channel.clone(),
            author: UserRef::new("author", UserId::new("u1").unwrap()),
            contents: format!("message {id}"),
            attachments: Vec::new(),
            sent_at: LogTimestamp::from_parts(2024, 1, 1, 0, 0, 0),
        }
    }

    #[tokio::test]
    async fn test_history_pages_newest_first() {
        let gateway = MemoryGateway::new();
        let guild = GuildId::new("g1").unwrap();
        let channel = ChannelId::new("c1").unwrap();

        for i in 1..=5 {
            gateway.add_message(&guild, message(&format!("m{i}"), &channel));
        }

        let page = gateway
            .messages_before(&guild, &channel, None, 2)
            .await
            .unwrap();
        assert_eq!(page[0].id.as_str(), "m5");
        assert_eq!(page[1].id.as_str(), "m4");

        let next = gateway
            .messages_before(&guild, &channel, Some(&page[1].id), 10)
            .await
            .unwrap();
        assert_eq!(next.len(), 3);
        assert_eq!(next[0].id.as_str(), "m3");
    }

    #[tokio::test]
    async fn test_audit_failure_toggle() {
        let gateway = MemoryGateway::new();
        let guild = GuildId::new("g1").unwrap();

        assert!(gateway.member_updates(&guild, 25).await.unwrap().is_empty());

        gateway.set_audit_failure(true);
        assert!(gateway.member_updates(&guild, 25).await.is_err());
    }
}

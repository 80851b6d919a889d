//! Gateway boundary
//!
//! The store never talks to the chat platform directly. Two narrow traits
//! describe what it needs from the platform client: channel history feeds
//! the message cache, and the audit trail feeds mute/deafen correlation.
//! The embedding bot implements them over its platform connection; tests
//! use the in-memory [`testing`] gateway.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChannelId, GuildId, LogTimestamp, MessageId, UserId, UserRef};

pub mod testing;

/// A message-capable channel as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

/// An attachment reference carried on a gateway message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAttachment {
    pub name: String,
    pub url: String,
}

/// A message as delivered by the platform, before snapshotting
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: UserRef,
    pub contents: String,
    pub attachments: Vec<GatewayAttachment>,
    pub sent_at: LogTimestamp,
}

/// One attribute change inside an audit entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditChange {
    /// Platform attribute key, e.g. `mute` or `deaf`
    pub key: String,
    pub new_value: bool,
}

/// One member-update entry from the platform audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// The member the update was applied to
    pub target: UserId,
    /// The moderator who performed it
    pub actor: UserRef,
    pub changes: Vec<AuditChange>,
}

/// Read access to a guild's channels and message history
#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// Message-capable channels in the guild
    async fn channels(&self, guild: &GuildId) -> Result<Vec<ChannelInfo>>;

    /// Up to `limit` messages strictly older than `before`, newest first
    ///
    /// `None` starts from the channel's latest message. A page shorter than
    /// `limit` means history is exhausted.
    async fn messages_before(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        before: Option<&MessageId>,
        limit: usize,
    ) -> Result<Vec<GatewayMessage>>;

    /// Raw bytes of an attachment by URL
    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>>;
}

/// Read access to the platform audit trail
///
/// The trail is written by the platform on its own schedule and is not
/// guaranteed to already contain the entry for an event that just fired.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// The newest member-update entries, most recent first
    async fn member_updates(&self, guild: &GuildId, limit: usize) -> Result<Vec<AuditEntry>>;
}

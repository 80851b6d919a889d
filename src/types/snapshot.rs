//! Cached message snapshots
//!
//! A snapshot is the persisted copy of a message at receipt time, kept in the
//! guild's blob cache so the content of later-deleted messages can still be
//! looked up by id.

use serde::{Deserialize, Serialize};

use super::id::{ChannelId, MessageId, UserId};
use super::timestamp::LogTimestamp;

/// One cached message, stored in the per-channel snapshot array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSnapshot {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub channel_id: ChannelId,
    pub contents: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachment_names: Vec<String>,
    pub timestamp: LogTimestamp,
}

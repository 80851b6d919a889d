//! Log entry types
//!
//! Each guild keeps one JSON array per log kind. Entries carry an explicit
//! `kind` tag on disk so readers can check the shape of every element instead
//! of guessing from the fields present; an element with the wrong tag for its
//! file is treated as corrupt and skipped.
//!
//! The deleted-message index is the exception: it is a plain array of message
//! id strings and has no entry struct here.

use serde::{Deserialize, Serialize};

use super::id::{ChannelId, UserId};
use super::timestamp::LogTimestamp;

/// The four per-guild log files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Anonymous-DM (troll) sends
    Troll,
    /// Voice channel joins and leaves
    Voice,
    /// Server mute / deafen actions
    VoiceAction,
    /// Index of deleted message ids
    DeletedMessage,
}

impl LogKind {
    /// File name of this log inside the guild's `logs/` folder
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Troll => "troll.json",
            LogKind::Voice => "voice.json",
            LogKind::VoiceAction => "voice-action.json",
            LogKind::DeletedMessage => "deleted-message.json",
        }
    }

    /// All kinds, in provisioning order
    pub fn all() -> [LogKind; 4] {
        [
            LogKind::Troll,
            LogKind::Voice,
            LogKind::VoiceAction,
            LogKind::DeletedMessage,
        ]
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogKind::Troll => write!(f, "troll"),
            LogKind::Voice => write!(f, "voice"),
            LogKind::VoiceAction => write!(f, "voice-action"),
            LogKind::DeletedMessage => write!(f, "deleted-message"),
        }
    }
}

/// A user reference as stored in log entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub name: String,
    pub id: UserId,
}

impl UserRef {
    pub fn new(name: impl Into<String>, id: UserId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// The placeholder recorded when the audit trail names no actor
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            id: UserId::from_static("unknown"),
        }
    }
}

/// A channel reference as stored in log entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub name: String,
    pub id: ChannelId,
}

impl ChannelRef {
    pub fn new(name: impl Into<String>, id: ChannelId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Attachment metadata recorded with a troll entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub url: String,
}

/// The two moderator actions the audit correlator records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoiceActionKind {
    Mute,
    Deafen,
}

impl VoiceActionKind {
    /// Attribute key the platform audit trail uses for this action
    pub fn audit_key(&self) -> &'static str {
        match self {
            VoiceActionKind::Mute => "mute",
            VoiceActionKind::Deafen => "deaf",
        }
    }

    /// Report wording for the action's new value
    pub fn describe(&self, value: bool) -> &'static str {
        match (self, value) {
            (VoiceActionKind::Mute, true) => "MUTED",
            (VoiceActionKind::Mute, false) => "UNMUTED",
            (VoiceActionKind::Deafen, true) => "DEAFENED",
            (VoiceActionKind::Deafen, false) => "UNDEAFENED",
        }
    }
}

impl std::fmt::Display for VoiceActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceActionKind::Mute => write!(f, "MUTE"),
            VoiceActionKind::Deafen => write!(f, "DEAFEN"),
        }
    }
}

/// One anonymous-DM send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrollEntry {
    pub author: UserRef,
    pub receiver: UserRef,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
    pub timestamp: LogTimestamp,
}

/// One voice channel join/leave
///
/// A pure join has no `channel_left`; a pure leave has no `channel_joined`;
/// a move carries both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUpdateEntry {
    pub member: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_joined: Option<ChannelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_left: Option<ChannelRef>,
    pub timestamp: LogTimestamp,
}

/// One server mute/deafen, with the actor resolved by the audit correlator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceActionEntry {
    pub action_type: VoiceActionKind,
    pub action_value: bool,
    pub affected: UserRef,
    pub inflicter: UserRef,
    pub channel: ChannelRef,
    pub timestamp: LogTimestamp,
}

/// A tagged log entry, one variant per structured log kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LogEntry {
    Troll(TrollEntry),
    VoiceUpdate(VoiceUpdateEntry),
    VoiceAction(VoiceActionEntry),
}

impl LogEntry {
    /// The log file this entry belongs to
    pub fn kind(&self) -> LogKind {
        match self {
            LogEntry::Troll(_) => LogKind::Troll,
            LogEntry::VoiceUpdate(_) => LogKind::Voice,
            LogEntry::VoiceAction(_) => LogKind::VoiceAction,
        }
    }

    /// Timestamp of the entry, for ordering
    pub fn timestamp(&self) -> &LogTimestamp {
        match self {
            LogEntry::Troll(e) => &e.timestamp,
            LogEntry::VoiceUpdate(e) => &e.timestamp,
            LogEntry::VoiceAction(e) => &e.timestamp,
        }
    }
}

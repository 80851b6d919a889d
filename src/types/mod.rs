//! Data types for the guild ledger
//!
//! This module contains the validated identifiers, log entry variants,
//! message snapshots and config documents stored on disk.

mod entry;
mod guild;
mod id;
mod snapshot;
mod timestamp;

pub use entry::{
    AttachmentRef, ChannelRef, LogEntry, LogKind, TrollEntry, UserRef, VoiceActionEntry,
    VoiceActionKind, VoiceUpdateEntry,
};
pub use guild::GuildConfig;
pub use id::{sanitize_filename, ChannelId, GuildId, MessageId, UserId};
pub use snapshot::MessageSnapshot;
pub use timestamp::LogTimestamp;

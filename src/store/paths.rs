//! Canonical paths within the record tree
//!
//! Pure path arithmetic, no I/O. Every location under the application data
//! root is computed here so the layout lives in exactly one place:
//!
//! ```text
//! <root>/guilds/<guildId>/
//!   config.json
//!   logs/{troll,voice,voice-action,deleted-message}.json
//!   trollattachments/<filename>
//!   blobcache/messages/<channelId>.json
//!   blobcache/messages/attachments/<messageId>/<filename>
//! <root>/logs/<timestamped>.txt
//! ```
//!
//! Identifiers are validated newtypes, so joining them cannot escape the
//! root.

use std::path::{Path, PathBuf};

use crate::types::{ChannelId, GuildId, LogKind, MessageId};

const GUILDS_DIR_NAME: &str = "guilds";
const LOGS_DIR_NAME: &str = "logs";
const CONFIG_FILE_NAME: &str = "config.json";
const TROLL_ATTACHMENTS_DIR_NAME: &str = "trollattachments";
const BLOB_CACHE_DIR_NAME: &str = "blobcache";
const MESSAGES_DIR_NAME: &str = "messages";
const ATTACHMENTS_DIR_NAME: &str = "attachments";

/// Computes every path in the per-guild record tree
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The application data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding one subtree per guild
    pub fn guilds_dir(&self) -> PathBuf {
        self.root.join(GUILDS_DIR_NAME)
    }

    /// Folder of rotated per-run process log files
    pub fn process_logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    /// Root of one guild's subtree
    pub fn guild_root(&self, guild: &GuildId) -> PathBuf {
        self.guilds_dir().join(guild.as_str())
    }

    /// The guild's `config.json`
    pub fn guild_config(&self, guild: &GuildId) -> PathBuf {
        self.guild_root(guild).join(CONFIG_FILE_NAME)
    }

    /// The guild's `logs/` folder
    pub fn guild_logs_dir(&self, guild: &GuildId) -> PathBuf {
        self.guild_root(guild).join(LOGS_DIR_NAME)
    }

    /// One of the guild's four log files
    pub fn guild_log(&self, guild: &GuildId, kind: LogKind) -> PathBuf {
        self.guild_logs_dir(guild).join(kind.file_name())
    }

    /// Folder of attachments saved alongside troll entries
    pub fn troll_attachments_dir(&self, guild: &GuildId) -> PathBuf {
        self.guild_root(guild).join(TROLL_ATTACHMENTS_DIR_NAME)
    }

    /// Root of the guild's blob cache
    pub fn blob_cache_dir(&self, guild: &GuildId) -> PathBuf {
        self.guild_root(guild).join(BLOB_CACHE_DIR_NAME)
    }

    /// Folder of per-channel snapshot arrays
    pub fn messages_dir(&self, guild: &GuildId) -> PathBuf {
        self.blob_cache_dir(guild).join(MESSAGES_DIR_NAME)
    }

    /// The snapshot array for one channel
    pub fn channel_messages(&self, guild: &GuildId, channel: &ChannelId) -> PathBuf {
        self.messages_dir(guild)
            .join(format!("{}.json", channel.as_str()))
    }

    /// Folder of cached attachment copies
    pub fn message_attachments_dir(&self, guild: &GuildId) -> PathBuf {
        self.messages_dir(guild).join(ATTACHMENTS_DIR_NAME)
    }

    /// Folder of one message's cached attachments
    pub fn attachments_for_message(&self, guild: &GuildId, message: &MessageId) -> PathBuf {
        self.message_attachments_dir(guild).join(message.as_str())
    }
}

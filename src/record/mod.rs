//! Event recording operations
//!
//! The write side for troll sends and voice channel joins/leaves. Mute and
//! deafen changes go through the audit correlator instead, since their
//! entries need an audit-trail query first.

use std::fs;
use std::sync::Arc;

use tracing::{error, warn};

use crate::error::Result;
use crate::gateway::{ChannelHistory, GatewayAttachment};
use crate::store::RecordStore;
use crate::types::{
    sanitize_filename, AttachmentRef, ChannelRef, GuildId, LogEntry, LogTimestamp, TrollEntry,
    UserRef, VoiceUpdateEntry,
};

/// Appends troll and voice join/leave entries
pub struct EventRecorder {
    store: Arc<RecordStore>,
}

impl EventRecorder {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Record an anonymous-DM send, keeping a copy of its attachment
    ///
    /// The entry always records what was sent. The attachment copy into the
    /// guild's `trollattachments` folder is best effort; a failed fetch or
    /// write is logged and the entry keeps the attachment reference.
    pub async fn record_troll(
        &self,
        gateway: &dyn ChannelHistory,
        guild: &GuildId,
        author: UserRef,
        receiver: UserRef,
        message: String,
        attachment: Option<GatewayAttachment>,
    ) -> Result<()> {
        let attachment_ref = match attachment {
            Some(attachment) => {
                self.copy_troll_attachment(gateway, guild, &attachment).await;
                Some(AttachmentRef {
                    name: attachment.name,
                    url: attachment.url,
                })
            }
            None => None,
        };

        let entry = LogEntry::Troll(TrollEntry {
            author,
            receiver,
            message,
            attachment: attachment_ref,
            timestamp: LogTimestamp::now(),
        });
        self.store.append_log(guild, entry)
    }

    /// Record a member joining and/or leaving a voice channel
    ///
    /// A pure join has no `left` side and a pure leave no `joined` side; a
    /// move between channels carries both.
    pub fn record_voice_update(
        &self,
        guild: &GuildId,
        member: UserRef,
        joined: Option<ChannelRef>,
        left: Option<ChannelRef>,
    ) -> Result<()> {
        let entry = LogEntry::VoiceUpdate(VoiceUpdateEntry {
            member,
            channel_joined: joined,
            channel_left: left,
            timestamp: LogTimestamp::now(),
        });
        self.store.append_log(guild, entry)
    }

    async fn copy_troll_attachment(
        &self,
        gateway: &dyn ChannelHistory,
        guild: &GuildId,
        attachment: &GatewayAttachment,
    ) {
        let Some(name) = sanitize_filename(&attachment.name) else {
            warn!(guild = %guild, name = %attachment.name, "unusable troll attachment name, not copying");
            return;
        };
        let dir = self.store.paths().troll_attachments_dir(guild);
        if let Err(e) = self.store.create_dir(&dir) {
            error!(guild = %guild, error = %e, "cannot create troll attachment directory");
            return;
        }
        match gateway.fetch_attachment(&attachment.url).await {
            Ok(bytes) => {
                if let Err(e) = fs::write(dir.join(&name), bytes) {
                    error!(guild = %guild, name = %name, error = %e, "troll attachment copy failed");
                }
            }
            Err(e) => {
                error!(guild = %guild, name = %name, error = %e, "troll attachment fetch failed");
            }
        }
    }
}

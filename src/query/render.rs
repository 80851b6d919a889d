//! Plain-text report blocks
//!
//! Each entry renders as one block of uppercase bracket labels between
//! dashed rule lines, concatenated in log order into a single artifact.
//! The block shapes are load-bearing: moderators archive these reports,
//! so label text and fallback strings stay stable.

use crate::types::{
    LogEntry, MessageSnapshot, TrollEntry, UserRef, VoiceActionEntry, VoiceUpdateEntry,
};

const RULE: &str = "-------------------------------------------------------------\n";

const NO_ATTACHMENT: &str = "One wasn't sent";
const NO_CHANNEL_JOINED: &str = "No voice channel joined";
const NO_CHANNEL_LEFT: &str = "No voice channel left";
const NO_ATTACHMENTS_SENT: &str = "None were sent";

/// Render log entries into one report artifact
pub(crate) fn render_entries(entries: &[LogEntry]) -> String {
    entries.iter().map(render_entry).collect()
}

fn render_entry(entry: &LogEntry) -> String {
    match entry {
        LogEntry::Troll(e) => render_troll(e),
        LogEntry::VoiceUpdate(e) => render_voice_update(e),
        LogEntry::VoiceAction(e) => render_voice_action(e),
    }
}

fn render_troll(entry: &TrollEntry) -> String {
    let mut out = String::from(RULE);
    out.push_str(&format!("[AUTHOR] {}\n", user_field(&entry.author)));
    out.push_str(&format!("[RECEIVER] {}\n", user_field(&entry.receiver)));
    out.push_str(&format!("[MESSAGE SENT] {}\n", entry.message));
    match &entry.attachment {
        Some(attachment) => {
            out.push_str(&format!("[ATTACHMENT NAME] \"{}\"\n", attachment.name));
            out.push_str(&format!("[ATTACHMENT URL] {}\n", attachment.url));
        }
        None => {
            out.push_str(&format!("[ATTACHMENT NAME] {NO_ATTACHMENT}\n"));
            out.push_str(&format!("[ATTACHMENT URL] {NO_ATTACHMENT}\n"));
        }
    }
    out.push_str(&format!("[DATE SENT] {}\n", entry.timestamp.date_string()));
    out.push_str(&format!("[TIME SENT] {}\n", entry.timestamp.time_string()));
    out.push_str(&format!("[TIMEZONE] {}\n", entry.timestamp.tz));
    out.push_str(RULE);
    out
}

fn render_voice_update(entry: &VoiceUpdateEntry) -> String {
    let joined = entry
        .channel_joined
        .as_ref()
        .map(|c| format!("{} (ID = {})", c.name, c.id))
        .unwrap_or_else(|| NO_CHANNEL_JOINED.to_string());
    let left = entry
        .channel_left
        .as_ref()
        .map(|c| format!("{} (ID = {})", c.name, c.id))
        .unwrap_or_else(|| NO_CHANNEL_LEFT.to_string());

    let mut out = String::from(RULE);
    out.push_str(&format!("[MEMBER] {}\n", user_field(&entry.member)));
    out.push_str(&format!("[JOINED] {joined}\n"));
    out.push_str(&format!("[LEFT] {left}\n"));
    out.push_str(&format!("[DATE] {}\n", entry.timestamp.date_string()));
    out.push_str(&format!("[TIME] {}\n", entry.timestamp.time_string()));
    out.push_str(&format!("[TIMEZONE] {}\n", entry.timestamp.tz));
    out.push_str(RULE);
    out
}

fn render_voice_action(entry: &VoiceActionEntry) -> String {
    let mut out = String::from(RULE);
    out.push_str(&format!("[AFFECTED USER] {}\n", user_field(&entry.affected)));
    out.push_str(&format!(
        "[INFLICTING USER] {}\n",
        user_field(&entry.inflicter)
    ));
    out.push_str(&format!("[ACTION TYPE] {}\n", entry.action_type));
    out.push_str(&format!(
        "[ACTION VALUE] {}\n",
        entry.action_type.describe(entry.action_value)
    ));
    out.push_str(&format!(
        "[CHANNEL] {} (ID = {})\n",
        entry.channel.name, entry.channel.id
    ));
    out.push_str(&format!(
        "[DATE INFLICTED] {}\n",
        entry.timestamp.date_string()
    ));
    out.push_str(&format!(
        "[TIME INFLICTED] {}\n",
        entry.timestamp.time_string()
    ));
    out.push_str(&format!("[TIMEZONE] {}\n", entry.timestamp.tz));
    out.push_str(RULE);
    out
}

/// Render deleted-message snapshots; `channel_name` resolves the display
/// name for a snapshot's channel id, falling back to "Unknown"
pub(crate) fn render_snapshots(
    snapshots: &[MessageSnapshot],
    channel_name: impl Fn(&MessageSnapshot) -> Option<String>,
) -> String {
    snapshots
        .iter()
        .map(|snapshot| render_snapshot(snapshot, channel_name(snapshot)))
        .collect()
}

fn render_snapshot(snapshot: &MessageSnapshot, channel_name: Option<String>) -> String {
    let attachments = if snapshot.attachment_names.is_empty() {
        NO_ATTACHMENTS_SENT.to_string()
    } else {
        snapshot
            .attachment_names
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut out = String::from(RULE);
    out.push_str(&format!(
        "[AUTHOR] {} (ID = {})\n",
        snapshot.author_name, snapshot.author_id
    ));
    out.push_str(&format!(
        "[MESSAGE] \"{}\" (ID = {})\n",
        snapshot.contents, snapshot.message_id
    ));
    out.push_str(&format!("[ATTACHMENTS] {attachments}\n"));
    out.push_str(&format!(
        "[CHANNEL] {} (ID = {})\n",
        channel_name.unwrap_or_else(|| "Unknown".to_string()),
        snapshot.channel_id
    ));
    out.push_str(&format!(
        "[DATE SENT] {}\n",
        snapshot.timestamp.date_string()
    ));
    out.push_str(&format!(
        "[TIME SENT] {}\n",
        snapshot.timestamp.time_string()
    ));
    out.push_str(RULE);
    out
}

fn user_field(user: &UserRef) -> String {
    format!("{} (ID = {})", user.name, user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AttachmentRef, ChannelId, ChannelRef, LogTimestamp, MessageId, UserId, VoiceActionKind,
    };

    fn user(name: &str, id: &str) -> UserRef {
        UserRef::new(name, UserId::new(id).unwrap())
    }

    fn channel(name: &str, id: &str) -> ChannelRef {
        ChannelRef {
            name: name.to_string(),
            id: ChannelId::new(id).unwrap(),
        }
    }

    #[test]
    fn test_troll_block_with_attachment() {
        let entry = TrollEntry {
            author: user("alice", "a1"),
            receiver: user("bob", "b2"),
            message: "gotcha".to_string(),
            attachment: Some(AttachmentRef {
                name: "prank.png".to_string(),
                url: "https://cdn.example/prank.png".to_string(),
            }),
            timestamp: LogTimestamp::from_parts(2024, 7, 4, 16, 20, 0),
        };

        let expected = "\
-------------------------------------------------------------
[AUTHOR] alice (ID = a1)
[RECEIVER] bob (ID = b2)
[MESSAGE SENT] gotcha
[ATTACHMENT NAME] \"prank.png\"
[ATTACHMENT URL] https://cdn.example/prank.png
[DATE SENT] 7/4/2024
[TIME SENT] 16:20:0
[TIMEZONE] +00:00
-------------------------------------------------------------
";
        assert_eq!(render_entries(&[LogEntry::Troll(entry)]), expected);
    }

    #[test]
    fn test_troll_block_without_attachment() {
        let entry = TrollEntry {
            author: user("alice", "a1"),
            receiver: user("bob", "b2"),
            message: "hi".to_string(),
            attachment: None,
            timestamp: LogTimestamp::from_parts(2024, 1, 2, 3, 4, 5),
        };

        let block = render_entries(&[LogEntry::Troll(entry)]);
        assert!(block.contains("[ATTACHMENT NAME] One wasn't sent\n"));
        assert!(block.contains("[ATTACHMENT URL] One wasn't sent\n"));
    }

    #[test]
    fn test_voice_action_value_wording() {
        let mut entry = VoiceActionEntry {
            action_type: VoiceActionKind::Mute,
            action_value: true,
            affected: user("victim", "v1"),
            inflicter: user("mod", "m1"),
            channel: channel("voice-chat", "c7"),
            timestamp: LogTimestamp::from_parts(2024, 2, 2, 2, 2, 2),
        };

        let block = render_entries(&[LogEntry::VoiceAction(entry.clone())]);
        assert!(block.contains("[ACTION TYPE] MUTE\n"));
        assert!(block.contains("[ACTION VALUE] MUTED\n"));
        assert!(block.contains("[CHANNEL] voice-chat (ID = c7)\n"));

        entry.action_value = false;
        let block = render_entries(&[LogEntry::VoiceAction(entry.clone())]);
        assert!(block.contains("[ACTION VALUE] UNMUTED\n"));

        entry.action_type = VoiceActionKind::Deafen;
        entry.action_value = true;
        let block = render_entries(&[LogEntry::VoiceAction(entry)]);
        assert!(block.contains("[ACTION VALUE] DEAFENED\n"));
    }

    #[test]
    fn test_voice_update_missing_sides() {
        let entry = VoiceUpdateEntry {
            member: user("carol", "c1"),
            channel_joined: Some(channel("lounge", "ch1")),
            channel_left: None,
            timestamp: LogTimestamp::from_parts(2024, 3, 3, 3, 3, 3),
        };

        let block = render_entries(&[LogEntry::VoiceUpdate(entry)]);
        assert!(block.contains("[JOINED] lounge (ID = ch1)\n"));
        assert!(block.contains("[LEFT] No voice channel left\n"));
    }

    #[test]
    fn test_blocks_concatenate_with_adjacent_rules() {
        let entry = VoiceUpdateEntry {
            member: user("carol", "c1"),
            channel_joined: None,
            channel_left: Some(channel("lounge", "ch1")),
            timestamp: LogTimestamp::from_parts(2024, 3, 3, 3, 3, 3),
        };
        let entries = vec![
            LogEntry::VoiceUpdate(entry.clone()),
            LogEntry::VoiceUpdate(entry),
        ];

        let report = render_entries(&entries);
        // Each block carries its own rules, so consecutive blocks abut
        let doubled = format!("{RULE}{RULE}");
        assert!(report.contains(&doubled));
        assert_eq!(report.matches("[MEMBER]").count(), 2);
    }

    #[test]
    fn test_snapshot_block() {
        let snapshot = MessageSnapshot {
            message_id: MessageId::new("m9").unwrap(),
            author_id: UserId::new("a1").unwrap(),
            author_name: "dave".to_string(),
            channel_id: ChannelId::new("c2").unwrap(),
            contents: "now you see me".to_string(),
            attachment_names: vec!["a.png".to_string(), "b.gif".to_string()],
            timestamp: LogTimestamp::from_parts(2024, 12, 31, 23, 59, 58),
        };

        let report = render_snapshots(&[snapshot], |_| Some("general".to_string()));
        assert!(report.contains("[AUTHOR] dave (ID = a1)\n"));
        assert!(report.contains("[MESSAGE] \"now you see me\" (ID = m9)\n"));
        assert!(report.contains("[ATTACHMENTS] \"a.png\",\"b.gif\"\n"));
        assert!(report.contains("[CHANNEL] general (ID = c2)\n"));
        assert!(report.contains("[DATE SENT] 12/31/2024\n"));
        assert!(report.contains("[TIME SENT] 23:59:58\n"));
        assert!(!report.contains("[TIMEZONE]"));
    }

    #[test]
    fn test_snapshot_block_fallbacks() {
        let snapshot = MessageSnapshot {
            message_id: MessageId::new("m1").unwrap(),
            author_id: UserId::new("a1").unwrap(),
            author_name: "eve".to_string(),
            channel_id: ChannelId::new("c1").unwrap(),
            contents: String::new(),
            attachment_names: Vec::new(),
            timestamp: LogTimestamp::from_parts(2024, 1, 1, 0, 0, 0),
        };

        let report = render_snapshots(&[snapshot], |_| None);
        assert!(report.contains("[ATTACHMENTS] None were sent\n"));
        assert!(report.contains("[CHANNEL] Unknown (ID = c1)\n"));
    }
}

//! Filtered log queries and report generation
//!
//! Queries load a guild's log, apply the supplied criteria and render the
//! survivors into one plain-text report. Zero matches is a first-class
//! outcome distinct from an unreadable store: callers show "nothing found"
//! for the former and an error for the latter, never an empty file.

use std::sync::Arc;

use tracing::debug;

use crate::cache::MessageCache;
use crate::error::Result;
use crate::gateway::ChannelInfo;
use crate::store::RecordStore;
use crate::types::{ChannelId, GuildId, LogEntry, LogKind, MessageId, UserId};

mod render;

/// Optional equality criteria, combined with AND
///
/// A criterion the entry's kind has no field for fails the entry: filtering
/// trolls by channel matches nothing rather than everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Originating user: troll author, voice-action inflicter, voice member
    pub from_user: Option<UserId>,
    /// Target user: troll receiver, voice-action affected member
    pub affected_user: Option<UserId>,
    /// Involved channel: voice-action channel, either side of a join/leave
    pub channel: Option<ChannelId>,
}

impl LogFilter {
    /// Filter that passes every entry
    pub fn none() -> Self {
        Self::default()
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        match entry {
            LogEntry::Troll(e) => {
                user_matches(&self.from_user, Some(&e.author.id))
                    && user_matches(&self.affected_user, Some(&e.receiver.id))
                    && self.channel.is_none()
            }
            LogEntry::VoiceUpdate(e) => {
                user_matches(&self.from_user, Some(&e.member.id))
                    && self.affected_user.is_none()
                    && channel_matches(
                        &self.channel,
                        [
                            e.channel_joined.as_ref().map(|c| &c.id),
                            e.channel_left.as_ref().map(|c| &c.id),
                        ],
                    )
            }
            LogEntry::VoiceAction(e) => {
                user_matches(&self.from_user, Some(&e.inflicter.id))
                    && user_matches(&self.affected_user, Some(&e.affected.id))
                    && channel_matches(&self.channel, [Some(&e.channel.id), None])
            }
        }
    }
}

fn user_matches(criterion: &Option<UserId>, field: Option<&UserId>) -> bool {
    match (criterion, field) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(want), Some(have)) => want == have,
    }
}

fn channel_matches(criterion: &Option<ChannelId>, candidates: [Option<&ChannelId>; 2]) -> bool {
    match criterion {
        None => true,
        Some(want) => candidates
            .iter()
            .any(|candidate| candidate.is_some_and(|have| have == want)),
    }
}

/// What a query produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Rendered report artifact
    Report(String),
    /// The filter passed zero entries (including an empty log)
    NoMatches,
}

/// Read side of the record store: filter and render guild logs
pub struct RecordQuery {
    store: Arc<RecordStore>,
}

impl RecordQuery {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Load one structured log, filter it and render the report
    ///
    /// Corrupt elements were already skipped by the load; an unreadable log
    /// file surfaces as an error, not `NoMatches`.
    pub fn obtain(
        &self,
        guild: &GuildId,
        kind: LogKind,
        filter: &LogFilter,
    ) -> Result<QueryOutcome> {
        debug_assert!(kind != LogKind::DeletedMessage);
        let entries: Vec<LogEntry> = self
            .store
            .load_log(guild, kind)?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect();

        if entries.is_empty() {
            return Ok(QueryOutcome::NoMatches);
        }
        Ok(QueryOutcome::Report(render::render_entries(&entries)))
    }

    /// Join the deleted-message index against cached snapshots and render
    ///
    /// Takes the oldest `limit` index entries (all of them by default),
    /// resolves each id through the snapshot cache, and drops ids with no
    /// surviving snapshot. `channel` restricts the join to one channel and
    /// supplies its display name for the report.
    pub fn deleted_messages(
        &self,
        guild: &GuildId,
        cache: &MessageCache,
        channel: Option<&ChannelInfo>,
        limit: Option<usize>,
    ) -> Result<QueryOutcome> {
        let ids = self.store.load_deleted_ids(guild)?;
        let take = limit.unwrap_or(ids.len());

        let mut snapshots = Vec::new();
        for id in ids.into_iter().take(take) {
            let Ok(message_id) = MessageId::new(&id) else {
                debug!(guild = %guild, id = %id, "unusable deleted-message id, skipping");
                continue;
            };
            match cache.lookup(guild, &message_id)? {
                Some(snapshot) => {
                    if channel.is_none_or(|c| c.id == snapshot.channel_id) {
                        snapshots.push(snapshot);
                    }
                }
                None => {
                    debug!(guild = %guild, id = %id, "no snapshot for deleted message, skipping");
                }
            }
        }

        if snapshots.is_empty() {
            return Ok(QueryOutcome::NoMatches);
        }
        let report = render::render_snapshots(&snapshots, |snapshot| {
            channel
                .filter(|c| c.id == snapshot.channel_id)
                .map(|c| c.name.clone())
        });
        Ok(QueryOutcome::Report(report))
    }
}

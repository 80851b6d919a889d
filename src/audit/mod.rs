//! Audit-trail correlation for mute/deafen events
//!
//! The platform reports a voice-state change with the affected member but
//! not which moderator caused it. The moderator only shows up later in the
//! guild's audit trail. The correlator bridges the two: each change spawns
//! a task that queries the newest member-update audit entries, takes the
//! first one targeting the affected member, and appends a voice-action log
//! entry with the extracted actor.
//!
//! The trail is not guaranteed to contain the entry yet, and the query can
//! fail outright. Both cases record the entry anyway with an "unknown"
//! actor and the pre-existing `false` state, so the log never silently
//! drops an observed event.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::gateway::{AuditEntry, AuditTrail};
use crate::store::RecordStore;
use crate::types::{
    ChannelRef, GuildId, LogEntry, LogTimestamp, UserRef, VoiceActionEntry, VoiceActionKind,
};

/// A mute or deafen transition observed on the voice gateway
#[derive(Debug, Clone)]
pub struct VoiceStateChange {
    pub action: VoiceActionKind,
    pub affected: UserRef,
    pub channel: ChannelRef,
}

/// Actor and state extracted from the audit trail
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub inflicter: UserRef,
    pub value: bool,
}

impl MatchOutcome {
    fn unmatched() -> Self {
        Self {
            inflicter: UserRef::unknown(),
            value: false,
        }
    }
}

/// Spawns audit queries and records their outcome as voice-action entries
pub struct AuditCorrelator {
    store: Arc<RecordStore>,
    scan_limit: usize,
}

impl AuditCorrelator {
    pub fn new(store: Arc<RecordStore>, config: &Config) -> Self {
        Self {
            store,
            scan_limit: config.audit_scan_limit,
        }
    }

    /// Handle one voice-state change
    ///
    /// Returns immediately; the audit query and the log append run on the
    /// returned task. An entry is appended whether or not a moderator is
    /// found, and a failed query is logged, never surfaced.
    pub fn correlate(
        &self,
        trail: Arc<dyn AuditTrail>,
        guild: GuildId,
        change: VoiceStateChange,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let scan_limit = self.scan_limit;
        tokio::spawn(async move {
            debug!(guild = %guild, action = %change.action, affected = %change.affected.id, "querying audit trail");
            let outcome = match trail.member_updates(&guild, scan_limit).await {
                Ok(entries) => match_actor(&entries, &change),
                Err(e) => {
                    warn!(guild = %guild, error = %e, "audit trail query failed, recording unknown actor");
                    MatchOutcome::unmatched()
                }
            };

            let entry = LogEntry::VoiceAction(VoiceActionEntry {
                action_type: change.action,
                action_value: outcome.value,
                affected: change.affected,
                inflicter: outcome.inflicter,
                channel: change.channel,
                timestamp: LogTimestamp::now(),
            });
            if let Err(e) = store.append_log(&guild, entry) {
                error!(guild = %guild, error = %e, "failed to record voice action");
            }
        })
    }
}

/// First entry targeting the affected member wins; later entries are not
/// consulted even if they also match
fn match_actor(entries: &[AuditEntry], change: &VoiceStateChange) -> MatchOutcome {
    for entry in entries {
        if entry.target != change.affected.id {
            continue;
        }
        let value = entry
            .changes
            .iter()
            .find(|c| c.key == change.action.audit_key())
            .map(|c| c.new_value)
            .unwrap_or(false);
        return MatchOutcome {
            inflicter: entry.actor.clone(),
            value,
        };
    }
    MatchOutcome::unmatched()
}

//! Per-guild configuration document

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The `config.json` document at the root of each guild's record tree
///
/// Unknown or missing fields fall back to defaults so a hand-edited or
/// partially written document still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GuildConfig {
    /// When set, the anonymous-DM feature is refused guild-wide
    pub disable_trolls_globally: bool,
    /// Users who may not be sent anonymous DMs
    pub blocked_troll_users: Vec<UserId>,
}

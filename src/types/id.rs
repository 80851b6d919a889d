//! Validated identifier newtypes
//!
//! Guild, channel, user and message identifiers arrive from the platform and
//! from command input, and several of them end up as path segments on disk.
//! Each newtype validates its token on construction (and on deserialization)
//! so a crafted id can never escape the guild tree.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Maximum accepted identifier length (platform snowflakes are 17-20 digits)
const MAX_ID_LEN: usize = 64;

/// Check an identifier token against the allow-list
///
/// Accepted: non-empty, at most [`MAX_ID_LEN`] bytes, ASCII alphanumerics
/// plus `-` and `_`. Everything else (separators, dots, spaces, unicode)
/// is rejected.
fn validate_token(token: &str, what: &str) -> Result<()> {
    if token.is_empty() {
        return Err(StoreError::InvalidId(format!("empty {}", what)));
    }
    if token.len() > MAX_ID_LEN {
        return Err(StoreError::InvalidId(format!(
            "{} longer than {} bytes: {:?}",
            what, MAX_ID_LEN, token
        )));
    }
    if !token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(StoreError::InvalidId(format!(
            "{} contains characters outside [A-Za-z0-9_-]: {:?}",
            what, token
        )));
    }
    Ok(())
}

/// Identifier of a guild (server)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuildId(String);

impl GuildId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_token(&id, "guild id")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuildId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<GuildId> for String {
    fn from(id: GuildId) -> Self {
        id.0
    }
}

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a channel within a guild
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_token(&id, "channel id")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_token(&id, "user id")?;
        Ok(Self(id))
    }

    /// Constructor for static tokens known to pass validation
    pub(crate) fn from_static(id: &'static str) -> Self {
        debug_assert!(validate_token(id, "user id").is_ok());
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_token(&id, "message id")?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reduce an attachment filename to a safe final path component
///
/// Strips any directory part, then rejects empty and dot-only names.
/// Returns `None` when nothing safe remains; callers skip the file and log.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if base.is_empty() || base.chars().all(|c| c == '.') || base.contains('\0') {
        return None;
    }
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_snowflakes_and_tokens() {
        assert!(GuildId::new("123456789012345678").is_ok());
        assert!(UserId::new("U42").is_ok());
        assert!(ChannelId::new("C7").is_ok());
        assert!(MessageId::new("msg_001-a").is_ok());
    }

    #[test]
    fn test_rejects_traversal_sequences() {
        assert!(GuildId::new("../../etc").is_err());
        assert!(GuildId::new("..").is_err());
        assert!(ChannelId::new("a/b").is_err());
        assert!(MessageId::new("a\\b").is_err());
        assert!(UserId::new("").is_err());
        assert!(GuildId::new("with space").is_err());
    }

    #[test]
    fn test_rejects_overlong_ids() {
        let long = "a".repeat(65);
        assert!(GuildId::new(long).is_err());
        assert!(GuildId::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn test_id_round_trips_as_plain_string() {
        let id = GuildId::new("987654321").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"987654321\"");

        let parsed: GuildId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_deserialize_rejects_bad_id() {
        let result: std::result::Result<GuildId, _> = serde_json::from_str("\"../up\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("cat.png"), Some("cat.png".to_string()));
        assert_eq!(
            sanitize_filename("dir/sub/cat.png"),
            Some("cat.png".to_string())
        );
        assert_eq!(
            sanitize_filename("..\\..\\cat.png"),
            Some("cat.png".to_string())
        );
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("dir/"), None);
    }
}

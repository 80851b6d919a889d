//! Guild Ledger
//!
//! A per-guild record store and audit correlation engine for chat platform
//! moderation, keeping human-readable JSON logs on local disk.
//!
//! # Features
//!
//! - **Per-Guild Trees**: Directory of JSON log files provisioned with defaults
//! - **Corruption Tolerant**: Damaged entries are skipped and counted, never fatal
//! - **Audit Correlation**: Mute/deafen events matched to the inflicting moderator
//! - **Message Snapshots**: Optional local cache of channel history and attachments
//! - **Filtered Reports**: Troll, voice and deleted-message records rendered as text
//!
//! # Modules
//!
//! - `types`: Validated identifiers, log entry variants, snapshots, guild config
//! - `store`: On-disk record store, path layout, guild lifecycle and retention
//! - `gateway`: Chat platform boundary traits and an in-memory test double
//! - `cache`: Message snapshot cache and deleted-message index
//! - `audit`: Audit-trail correlation for voice moderation actions
//! - `record`: Recording entry points for event listeners
//! - `query`: Filtered log queries rendered as reports
//! - `bootstrap`: Startup routine wiring retention, provisioning and caching
//! - `config`: Environment-driven configuration
//! - `logging`: Console and per-run file tracing setup
//! - `error`: Store error type and result alias
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use guild_ledger::types::{GuildId, LogKind};
//! use guild_ledger::{Config, GuildLifecycle, LogFilter, QueryOutcome, RecordQuery, RecordStore};
//!
//! fn main() -> guild_ledger::Result<()> {
//!     let config = Config::from_env();
//!     guild_ledger::logging::init(&config)?;
//!
//!     let store = Arc::new(RecordStore::new(&config));
//!     let guild = GuildId::new("181206076553625600")?;
//!     GuildLifecycle::new(Arc::clone(&store)).provision(&guild)?;
//!
//!     let query = RecordQuery::new(Arc::clone(&store));
//!     match query.obtain(&guild, LogKind::Troll, &LogFilter::none())? {
//!         QueryOutcome::Report(report) => println!("{report}"),
//!         QueryOutcome::NoMatches => println!("no troll records yet"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod query;
pub mod record;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use audit::{AuditCorrelator, VoiceStateChange};
pub use bootstrap::{bootstrap, BootstrapSummary};
pub use cache::MessageCache;
pub use config::Config;
pub use error::{Result, StoreError};
pub use gateway::{AuditTrail, ChannelHistory};
pub use query::{LogFilter, QueryOutcome, RecordQuery};
pub use record::EventRecorder;
pub use store::{GuildLifecycle, LogRetention, PathResolver, RecordStore};
pub use types::{
    ChannelId, GuildConfig, GuildId, LogEntry, LogKind, LogTimestamp, MessageId, MessageSnapshot,
    UserId, UserRef,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

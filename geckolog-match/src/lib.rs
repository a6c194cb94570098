//! # geckolog-match
//!
//! Match logging on top of [`geckolog_client`].
//!
//! This crate provides:
//! - The game's memory layout and decoders for player records and stats
//! - A [`Session`] that reconnects and retries whole units of work
//! - A stats watcher that polls until the results appear or the match ends
//! - Match log rendering and writing, in one-shot and automatic modes

pub mod capture;
pub mod config;
pub mod driver;
pub mod error;
pub mod layout;
pub mod logger;
pub mod names;
pub mod record;
pub mod report;
pub mod session;
pub mod stats;
pub mod watch;

#[cfg(test)]
mod testing;

pub use capture::{Bases, MatchHeader, MatchSnapshot, Player, SceneTracker};
pub use config::{AutoMode, Config, ConfigError, VariantSetting};
pub use driver::{DriverOptions, MatchLogger};
pub use error::MatchError;
pub use layout::MatchLayout;
pub use logger::MatchLog;
pub use names::{NameKind, NameTable};
pub use record::PlayerRecord;
pub use report::{console_footer, console_line, LogLevel, Report};
pub use session::{Connector, Session, TcpConnector, Work};
pub use stats::{MatchStats, PlayerStats};
pub use watch::{Liveness, Shutdown, WatchConfig, WatchOutcome, Watcher};

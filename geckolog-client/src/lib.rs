//! # geckolog-client
//!
//! Client library for the TCPGecko debugging stub.
//!
//! This crate provides:
//! - The [`MemoryLink`] capability trait shared by both wire variants
//! - [`ClassicLink`] (binary opcodes) and [`TextLink`] (Aroma text commands)
//! - Connection setup with timeouts, selecting the variant once via [`connect`]
//! - A bounded retry state machine for driver-level recovery

pub mod classic;
pub mod connection;
pub mod error;
pub mod link;
pub mod retry;
pub mod text;

pub use classic::ClassicLink;
pub use connection::{connect, AnyLink, ConnectionConfig};
pub use error::ClientError;
pub use link::{MemoryLink, Variant};
pub use retry::{Retry, RetryPolicy, RetryState, Sleeper};
pub use text::TextLink;

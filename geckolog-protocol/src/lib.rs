//! # geckolog-protocol
//!
//! Wire protocol implementation for the TCPGecko debugging stub.
//!
//! This crate provides:
//! - The console address-space table and read/write permission checks
//! - The classic binary opcode codec (chunked memory reads)
//! - The text-command codec used by the Aroma plugin build
//! - Big-endian value decoding helpers and sign extension
//!
//! Nothing in here performs I/O; the client crate owns the socket.

pub mod address;
pub mod classic;
pub mod error;
pub mod text;
pub mod value;

pub use address::{check, find_range, is_permitted, is_valid, Access, AddressRange, ADDRESS_SPACE};
pub use classic::{ReadRequest, Status, CMD_READ_MEMORY, MAX_CHUNK};
pub use error::ProtocolError;
pub use text::PeekType;

/// Default port of the classic TCPGecko stub.
pub const CLASSIC_PORT: u16 = 7331;

/// Default port of the Aroma text-command plugin.
pub const TEXT_PORT: u16 = 7332;

/// Width in bytes of the slot the stub always answers in.
pub const WORD_SIZE: u32 = 4;

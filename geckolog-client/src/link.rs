//! The capability set shared by both wire variants.

use crate::error::ClientError;
use bytes::Bytes;
use geckolog_protocol::value;
use std::fmt;

/// Wire variant spoken by the remote stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Binary opcode protocol of the classic TCPGecko stub.
    #[default]
    Classic,
    /// Text-command protocol of the Aroma plugin.
    Text,
}

impl Variant {
    /// Port the stub listens on by default.
    pub fn default_port(&self) -> u16 {
        match self {
            Variant::Classic => geckolog_protocol::CLASSIC_PORT,
            Variant::Text => geckolog_protocol::TEXT_PORT,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Classic => write!(f, "classic"),
            Variant::Text => write!(f, "text"),
        }
    }
}

/// Read access to remote memory.
///
/// Every method performs complete request/response exchanges before
/// returning; `&mut self` keeps a second request from being issued while one
/// is in flight. Reads have no side effects, so re-reading a range and
/// comparing the result is how callers detect changes.
#[allow(async_fn_in_trait)]
pub trait MemoryLink {
    /// Returns the wire variant of this link.
    fn variant(&self) -> Variant;

    /// Reads exactly `length` bytes starting at `address`.
    async fn read_bytes(&mut self, address: u32, length: u32) -> Result<Bytes, ClientError>;

    /// Reads the 8-bit value in the last byte of the slot at `address`.
    async fn peek8(&mut self, address: u32) -> Result<u8, ClientError>;

    /// Reads the 16-bit value in the last two bytes of the slot at `address`.
    async fn peek16(&mut self, address: u32) -> Result<u16, ClientError>;

    /// Reads the 32-bit value at `address`.
    async fn peek32(&mut self, address: u32) -> Result<u32, ClientError>;

    /// Reads the IEEE-754 single at `address`.
    async fn peek_float(&mut self, address: u32) -> Result<f32, ClientError>;

    async fn peek8_signed(&mut self, address: u32) -> Result<i8, ClientError> {
        let raw = self.peek8(address).await?;
        Ok(value::sign_extend(raw as u32, 8) as i8)
    }

    async fn peek16_signed(&mut self, address: u32) -> Result<i16, ClientError> {
        let raw = self.peek16(address).await?;
        Ok(value::sign_extend(raw as u32, 16) as i16)
    }

    async fn peek32_signed(&mut self, address: u32) -> Result<i32, ClientError> {
        let raw = self.peek32(address).await?;
        Ok(value::to_signed32(raw))
    }

    /// Reads `strlen` bytes and decodes them as text.
    ///
    /// NUL termination is left to the caller. Bytes after the terminator may
    /// be stale, so invalid sequences are replaced instead of rejected.
    async fn read_string(&mut self, address: u32, strlen: u32) -> Result<String, ClientError> {
        let bytes = self.read_bytes(address, strlen).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

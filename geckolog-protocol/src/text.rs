//! Text-command codec of the Aroma TCPGecko plugin.
//!
//! Requests are plain ASCII commands such as `peek -t u32 -a 0x10700000`.
//! The plugin answers with the decoded value rendered as a decimal string,
//! so there is no raw byte payload and no status byte.

use crate::error::ProtocolError;

/// Value type of an elementary peek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeekType {
    U8,
    U16,
    U32,
    F32,
}

impl PeekType {
    /// Type name used in the command.
    pub fn name(&self) -> &'static str {
        match self {
            PeekType::U8 => "u8",
            PeekType::U16 => "u16",
            PeekType::U32 => "u32",
            PeekType::F32 => "f32",
        }
    }

    /// Size of the receive buffer for the reply.
    pub fn reply_capacity(&self) -> usize {
        match self {
            PeekType::U8 => 8,
            PeekType::U16 => 16,
            PeekType::U32 | PeekType::F32 => 32,
        }
    }

    /// Offset of the value inside its 4-byte aligned slot.
    pub fn slot_offset(&self) -> u32 {
        match self {
            PeekType::U8 => 3,
            PeekType::U16 => 2,
            PeekType::U32 | PeekType::F32 => 0,
        }
    }

    /// Width of the value in bytes.
    pub fn width(&self) -> u32 {
        match self {
            PeekType::U8 => 1,
            PeekType::U16 => 2,
            PeekType::U32 | PeekType::F32 => 4,
        }
    }

    /// Largest integer the reply may hold for this width.
    fn max_value(&self) -> u64 {
        match self {
            PeekType::U8 => u8::MAX as u64,
            PeekType::U16 => u16::MAX as u64,
            PeekType::U32 | PeekType::F32 => u32::MAX as u64,
        }
    }
}

/// Formats a peek command for the given (already slot-adjusted) address.
pub fn command(peek: PeekType, address: u32) -> String {
    format!("peek -t {} -a 0x{:X}", peek.name(), address)
}

fn reply_text(reply: &[u8]) -> Result<&str, ProtocolError> {
    let text = std::str::from_utf8(reply).map_err(|_| ProtocolError::InvalidUtf8)?;
    Ok(text.trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace()))
}

/// Parses an integer reply and checks it fits the peek width.
pub fn parse_integer(peek: PeekType, reply: &[u8]) -> Result<u32, ProtocolError> {
    let text = reply_text(reply)?;
    let value: u64 = text
        .parse()
        .map_err(|_| ProtocolError::MalformedReply(text.to_string()))?;

    if value > peek.max_value() {
        return Err(ProtocolError::MalformedReply(text.to_string()));
    }

    Ok(value as u32)
}

/// Parses a decimal float reply.
pub fn parse_float(reply: &[u8]) -> Result<f32, ProtocolError> {
    let text = reply_text(reply)?;
    text.parse()
        .map_err(|_| ProtocolError::MalformedReply(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_format() {
        assert_eq!(command(PeekType::U32, 0x1070_0000), "peek -t u32 -a 0x10700000");
        assert_eq!(command(PeekType::U8, 0x106E_0333), "peek -t u8 -a 0x106E0333");
        assert_eq!(command(PeekType::F32, 0xABC), "peek -t f32 -a 0xABC");
    }

    #[test]
    fn test_reply_capacity_matches_width_name() {
        assert_eq!(PeekType::U8.reply_capacity(), 8);
        assert_eq!(PeekType::U16.reply_capacity(), 16);
        assert_eq!(PeekType::U32.reply_capacity(), 32);
        assert_eq!(PeekType::F32.reply_capacity(), 32);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(PeekType::U32, b"4294967295").unwrap(), u32::MAX);
        assert_eq!(parse_integer(PeekType::U8, b"255\0\0").unwrap(), 255);
        assert_eq!(parse_integer(PeekType::U16, b" 1234\n").unwrap(), 1234);
    }

    #[test]
    fn test_parse_integer_rejects_garbage() {
        assert!(matches!(
            parse_integer(PeekType::U32, b"nope"),
            Err(ProtocolError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_integer(PeekType::U32, b""),
            Err(ProtocolError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_integer(PeekType::U32, b"-1"),
            Err(ProtocolError::MalformedReply(_))
        ));
        assert_eq!(
            parse_integer(PeekType::U32, &[0xFF, 0xFE]),
            Err(ProtocolError::InvalidUtf8)
        );
    }

    #[test]
    fn test_parse_integer_checks_width() {
        assert!(parse_integer(PeekType::U8, b"256").is_err());
        assert!(parse_integer(PeekType::U16, b"65536").is_err());
        assert!(parse_integer(PeekType::U32, b"4294967296").is_err());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(b"1.5").unwrap(), 1.5);
        assert_eq!(parse_float(b"-0.25\0").unwrap(), -0.25);
        assert!(parse_float(b"one").is_err());
    }
}

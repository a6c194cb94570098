//! Decoding of big-endian values returned by reads.
//!
//! The stub hands back raw memory; these helpers re-interpret slices of it.
//! Out-of-bounds field accesses yield `None` rather than panicking so that
//! callers decoding partially understood structures can degrade gracefully.

/// Sign-extends the low `bits` bits of `raw`.
///
/// Subtracts `2^bits` when the top bit of the `bits`-wide value is set.
pub fn sign_extend(raw: u32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    let value = raw as i64 & ((1i64 << bits) - 1);
    if value >= 1i64 << (bits - 1) {
        (value - (1i64 << bits)) as i32
    } else {
        value as i32
    }
}

/// Interprets a 32-bit unsigned value as two's complement.
pub fn to_signed32(raw: u32) -> i32 {
    sign_extend(raw, 32)
}

pub fn be_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

pub fn be_i8(bytes: &[u8], offset: usize) -> Option<i8> {
    be_u8(bytes, offset).map(|b| b as i8)
}

pub fn be_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let raw = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([raw[0], raw[1]]))
}

/// Reads a 24-bit big-endian value.
pub fn be_u24(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 3)?;
    Some(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
}

pub fn be_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

pub fn be_f32(bytes: &[u8], offset: usize) -> Option<f32> {
    be_u32(bytes, offset).map(f32::from_bits)
}

/// Decodes a UTF-16BE string, stopping at the first NUL.
pub fn utf16_be_until_nul(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Truncates text at the first NUL character.
pub fn until_nul(text: &str) -> &str {
    text.split('\0').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed32_boundaries() {
        assert_eq!(to_signed32(0xFFFF_FFFF), -1);
        assert_eq!(to_signed32(0x8000_0000), -2_147_483_648);
        assert_eq!(to_signed32(0x7FFF_FFFF), 2_147_483_647);
        assert_eq!(to_signed32(0), 0);
    }

    #[test]
    fn test_sign_extend_narrow_widths() {
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x80, 8), -128);
        assert_eq!(sign_extend(0x7F, 8), 127);
        assert_eq!(sign_extend(0xFFFE, 16), -2);
        assert_eq!(sign_extend(0x7FFF, 16), 32767);
    }

    #[test]
    fn test_big_endian_fields() {
        let bytes = [0x12, 0x34, 0x56, 0x78, 0x3F, 0x80, 0x00, 0x00];
        assert_eq!(be_u8(&bytes, 0), Some(0x12));
        assert_eq!(be_u16(&bytes, 1), Some(0x3456));
        assert_eq!(be_u24(&bytes, 1), Some(0x34_5678));
        assert_eq!(be_u32(&bytes, 0), Some(0x1234_5678));
        assert_eq!(be_f32(&bytes, 4), Some(1.0));
        assert_eq!(be_i8(&[0xFE], 0), Some(-2));
    }

    #[test]
    fn test_out_of_bounds_fields() {
        let bytes = [0u8; 4];
        assert_eq!(be_u32(&bytes, 1), None);
        assert_eq!(be_u16(&bytes, 3), None);
        assert_eq!(be_u8(&bytes, 4), None);
    }

    #[test]
    fn test_utf16_be_until_nul() {
        let bytes = [0x00, b'H', 0x00, b'i', 0x00, 0x00, 0x00, b'X'];
        assert_eq!(utf16_be_until_nul(&bytes), "Hi");
        assert_eq!(utf16_be_until_nul(&[]), "");
    }

    #[test]
    fn test_until_nul() {
        assert_eq!(until_nul("Fld_Plaza00\0\0\0"), "Fld_Plaza00");
        assert_eq!(until_nul("plain"), "plain");
    }
}

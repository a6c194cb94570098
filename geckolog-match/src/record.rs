//! Player record decoding.

use crate::error::MatchError;
use geckolog_protocol::value;

/// Size of one player record in bytes.
pub const RECORD_SIZE: usize = 0xD4;

const NAME: std::ops::Range<usize> = 0x06..0x26;
const REGION: usize = 0x2C;
const TEAM: usize = 0x33;
const GENDER: usize = 0x37;
const SKIN_TONE: usize = 0x3B;
const EYE_COLOR: usize = 0x3F;
const WEAPON: usize = 0x46;
const SUB_WEAPON: usize = 0x4A;
const SPECIAL_WEAPON: usize = 0x4D;
const SHOES: usize = 0x54;
const CLOTHES: usize = 0x70;
const HEADGEAR: usize = 0x8C;
const LEVEL: usize = 0xAF;
const RANK: usize = 0xB3;
const PID: usize = 0xD0;

/// A decoded player record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Network account id. Zero marks an empty slot.
    pub pid: u32,
    pub name: String,
    pub region: u32,
    pub team: u8,
    pub gender: u8,
    pub skin_tone: u8,
    pub eye_color: u8,
    pub weapon: u16,
    pub sub_weapon: u16,
    pub special_weapon: u32,
    pub shoes: u32,
    pub clothes: u32,
    pub headgear: u32,
    /// Displayed level (stored zero-based).
    pub level: i16,
    pub rank: i8,
}

impl PlayerRecord {
    /// Decodes a record from its raw bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, MatchError> {
        if bytes.len() < RECORD_SIZE {
            return Err(MatchError::ShortRecord(bytes.len()));
        }

        // Length checked above; every field lies inside the record.
        let u8_at = |offset| value::be_u8(bytes, offset).unwrap_or_default();
        let u16_at = |offset| value::be_u16(bytes, offset).unwrap_or_default();
        let u32_at = |offset| value::be_u32(bytes, offset).unwrap_or_default();

        let name = value::utf16_be_until_nul(&bytes[NAME])
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .collect();

        Ok(Self {
            pid: u32_at(PID),
            name,
            region: u32_at(REGION),
            team: u8_at(TEAM),
            gender: u8_at(GENDER),
            skin_tone: u8_at(SKIN_TONE),
            eye_color: u8_at(EYE_COLOR),
            weapon: u16_at(WEAPON),
            sub_weapon: u16_at(SUB_WEAPON),
            special_weapon: value::be_u24(bytes, SPECIAL_WEAPON).unwrap_or_default(),
            shoes: u32_at(SHOES),
            clothes: u32_at(CLOTHES),
            headgear: u32_at(HEADGEAR),
            level: i16::from(value::be_i8(bytes, LEVEL).unwrap_or_default()) + 1,
            rank: value::be_i8(bytes, RANK).unwrap_or_default(),
        })
    }

    /// Returns true for a slot with no player in it.
    pub fn is_empty(&self) -> bool {
        self.pid == 0
    }
}

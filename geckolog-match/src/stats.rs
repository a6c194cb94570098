//! End-of-match statistics.

use bytes::Bytes;
use geckolog_protocol::value;

/// Bytes between consecutive players in the stats block.
pub const PLAYER_STRIDE: usize = 0x20;

/// Turf war winners receive this bonus on the results screen.
pub const WIN_BONUS: u32 = 1000;

/// Versus rule id of turf war.
pub const RULE_TURF_WAR: u8 = 0;

const POINTS: usize = 0x3A;
const KILLS: usize = 0x3E;
const DEATHS: usize = 0x42;

/// One player's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStats {
    pub points: u16,
    pub kills: u16,
    pub deaths: u16,
}

/// Final results of a match: the raw stats block and the winning team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStats {
    pub winning_team: u8,
    pub block: Bytes,
}

impl MatchStats {
    pub fn new(winning_team: u8, block: Bytes) -> Self {
        Self {
            winning_team,
            block,
        }
    }

    /// Results of the player in slot `index`, if the block covers it.
    pub fn player(&self, index: usize) -> Option<PlayerStats> {
        let base = index * PLAYER_STRIDE;
        Some(PlayerStats {
            points: value::be_u16(&self.block, base + POINTS)?,
            kills: value::be_u16(&self.block, base + KILLS)?,
            deaths: value::be_u16(&self.block, base + DEATHS)?,
        })
    }

    pub fn is_winner(&self, team: u8) -> bool {
        team == self.winning_team
    }
}

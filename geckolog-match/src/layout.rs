//! Memory layout of the running game.
//!
//! Every address the driver touches is either a fixed pointer slot or an
//! offset from a pointer read at runtime. The defaults match the current
//! game release; all of them can be overridden in the `layout` section of
//! the configuration file.

use geckolog_client::Variant;
use serde::{Deserialize, Serialize};

/// Pointer table and structure offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchLayout {
    /// Slot holding the static memory base.
    pub static_mem_ptr: u32,
    /// Slot holding the online session object.
    pub session_ptr: u32,
    /// Slot holding the scene manager.
    pub scene_mgr_ptr: u32,
    /// Slot holding the main manager.
    pub main_mgr_ptr: u32,

    /// Offset of the player-info pointer array from static memory.
    pub player_info_array: u32,
    /// Offsets of the match header words from static memory.
    pub match_hour: u32,
    pub versus_mode: u32,
    pub versus_rule: u32,
    pub stage: u32,
    pub stage_len: u32,

    /// Offset of the raw session index byte from the session object.
    pub session_id_index: u32,
    /// Offset of the session id table from the session object.
    pub session_id: u32,

    /// Offset of the player manager from the main manager.
    pub player_mgr: u32,
    /// Offset of the player count word from the player manager.
    pub player_count: u32,

    /// Offset of the scene id from the scene manager.
    pub scene_id: u32,
    /// Scene id of a running versus match.
    pub versus_scene: u16,

    /// Stats block as seen by the classic stub.
    pub stats: u32,
    pub stats_len: u32,
    /// Raw byte holding the winning team.
    pub winning_team: u32,
    /// The text plugin sees the stats area this much lower.
    pub text_stats_shift: u32,

    pub max_players: u32,
    pub player_record_len: u32,
}

impl Default for MatchLayout {
    fn default() -> Self {
        Self {
            static_mem_ptr: 0x106E_0330,
            session_ptr: 0x106E_B980,
            scene_mgr_ptr: 0x106E_9770,
            main_mgr_ptr: 0x106E_5814,
            player_info_array: 0x10,
            match_hour: 0x234,
            versus_mode: 0x238,
            versus_rule: 0x23C,
            stage: 0x28,
            stage_len: 32,
            session_id_index: 0xBD,
            session_id: 0xCC,
            player_mgr: 0x268,
            player_count: 0x320,
            scene_id: 0x160,
            versus_scene: 7,
            stats: 0x107A_F944,
            stats_len: 0x124,
            winning_team: 0x107A_F917,
            text_stats_shift: 0x30,
            max_players: 8,
            player_record_len: 0xD4,
        }
    }
}

impl MatchLayout {
    /// Address of the stats block for the given wire variant.
    pub fn stats_address(&self, variant: Variant) -> u32 {
        match variant {
            Variant::Classic => self.stats,
            Variant::Text => self.stats.wrapping_sub(self.text_stats_shift),
        }
    }

    /// Address of the winning team byte for the given wire variant.
    pub fn winning_team_address(&self, variant: Variant) -> u32 {
        match variant {
            Variant::Classic => self.winning_team,
            Variant::Text => self.winning_team.wrapping_sub(self.text_stats_shift),
        }
    }

    /// Address of the session id word for a raw index byte.
    pub fn session_id_address(&self, session: u32, index: u8) -> u32 {
        session
            .wrapping_add(u32::from(index) * 4)
            .wrapping_add(self.session_id)
    }

    /// Address of the pointer to player `index`'s record.
    pub fn player_info_slot(&self, array: u32, index: u32) -> u32 {
        array.wrapping_add(index * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_shift_for_text_variant() {
        let layout = MatchLayout::default();
        assert_eq!(layout.stats_address(Variant::Classic), 0x107A_F944);
        assert_eq!(layout.stats_address(Variant::Text), 0x107A_F914);
        assert_eq!(layout.winning_team_address(Variant::Text), 0x107A_F8E7);
    }

    #[test]
    fn test_derived_addresses() {
        let layout = MatchLayout::default();
        assert_eq!(layout.session_id_address(0x1000_0000, 2), 0x1000_00D4);
        assert_eq!(layout.player_info_slot(0x1100_0000, 7), 0x1100_001C);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let layout: MatchLayout = serde_yaml::from_str("versus_scene: 9\nstats: 0x107AF000\n").unwrap();
        assert_eq!(layout.versus_scene, 9);
        assert_eq!(layout.stats, 0x107A_F000);
        assert_eq!(layout.session_ptr, 0x106E_B980);
    }
}

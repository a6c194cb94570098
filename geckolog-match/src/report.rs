//! Text rendering of captured matches.

use crate::capture::{MatchSnapshot, Player};
use crate::names::{NameKind, NameTable};
use crate::stats::{MatchStats, RULE_TURF_WAR, WIN_BONUS};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// How much of each match goes into the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No log file.
    #[default]
    None,
    /// Match header and player identity.
    Basic,
    /// Adds appearance, gear and weapons.
    Full,
    /// Adds end-of-match results; waits for them to appear.
    Stats,
}

impl LogLevel {
    pub fn writes_file(&self) -> bool {
        *self > LogLevel::None
    }

    pub fn wants_stats(&self) -> bool {
        *self >= LogLevel::Stats
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::None => "none",
            LogLevel::Basic => "basic",
            LogLevel::Full => "full",
            LogLevel::Stats => "stats",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(LogLevel::None),
            "basic" => Ok(LogLevel::Basic),
            "full" => Ok(LogLevel::Full),
            "stats" => Ok(LogLevel::Stats),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Renders matches with a fixed name table and indentation.
pub struct Report<'a> {
    names: &'a NameTable,
    level: LogLevel,
    /// Indentation of match-level lines; player lines get two more.
    align: usize,
}

impl<'a> Report<'a> {
    /// `auto` selects the indented layout used when several matches share
    /// one file.
    pub fn new(names: &'a NameTable, level: LogLevel, auto: bool) -> Self {
        Self {
            names,
            level,
            align: if auto { 2 } else { 0 },
        }
    }

    /// Renders the whole match. `number` is the match counter in auto mode.
    pub fn render(&self, snapshot: &MatchSnapshot, number: Option<u32>) -> String {
        let mut out = String::new();
        if !self.level.writes_file() {
            return out;
        }

        self.write_header(&mut out, snapshot, number);
        for player in &snapshot.players {
            self.write_player(&mut out, player, snapshot);
        }
        out
    }

    fn write_header(&self, out: &mut String, snapshot: &MatchSnapshot, number: Option<u32>) {
        let pad = " ".repeat(self.align);
        let header = &snapshot.header;

        match number {
            Some(n) => {
                let _ = writeln!(out, "\n[Match {}]", n);
                let _ = writeln!(out, "{}Time: {}", pad, snapshot.captured_at.format("%H:%M:%S"));
            }
            None => out.push('\n'),
        }
        let _ = writeln!(
            out,
            "{}Session ID: {:X} ({})",
            pad, snapshot.session_id, snapshot.session_id
        );
        let _ = writeln!(
            out,
            "{}Versus mode: {}",
            pad,
            self.names.get(NameKind::VersusMode, header.versus_mode)
        );
        let _ = writeln!(
            out,
            "{}Versus rule: {}",
            pad,
            self.names.get(NameKind::VersusRule, header.versus_rule)
        );
        let _ = writeln!(
            out,
            "{}Stage: {}",
            pad,
            self.names.get(NameKind::Stage, &header.stage)
        );
        let _ = writeln!(
            out,
            "{}Day/Night: {}",
            pad,
            self.names.get(NameKind::MatchHour, header.match_hour)
        );
    }

    fn write_player(&self, out: &mut String, player: &Player, snapshot: &MatchSnapshot) {
        let names = self.names;
        let record = &player.record;
        let pad = " ".repeat(self.align + 2);

        let _ = writeln!(out, "\n{}[Player {}]", " ".repeat(self.align), player.index + 1);
        let _ = writeln!(out, "{}Name: {}", pad, record.name);
        let _ = writeln!(out, "{}PID: {:X} ({})", pad, record.pid, record.pid);
        let _ = writeln!(out, "{}Region: {}", pad, record.region);
        let _ = writeln!(
            out,
            "{}Team: {} ({})",
            pad,
            names.get(NameKind::Team, record.team),
            record.team
        );
        let _ = writeln!(out, "{}Level: {}", pad, record.level);
        let _ = writeln!(
            out,
            "{}Rank: {} ({})",
            pad,
            names.get(NameKind::Rank, record.rank),
            record.rank
        );

        if self.level >= LogLevel::Full {
            let _ = writeln!(
                out,
                "{}Appearance: Gender: {} ({}), Skin tone: {}, Eye color: {} ({})",
                pad,
                names.get(NameKind::Gender, record.gender),
                record.gender,
                record.skin_tone,
                names.get(NameKind::EyeColor, record.eye_color),
                record.eye_color
            );
            let _ = writeln!(
                out,
                "{}Gear: Headgear: {} ({}), Clothes: {} ({}), Shoes: {} ({})",
                pad,
                names.get(NameKind::Headgear, record.headgear),
                record.headgear,
                names.get(NameKind::Clothes, record.clothes),
                record.clothes,
                names.get(NameKind::Shoes, record.shoes),
                record.shoes
            );
            let _ = writeln!(
                out,
                "{}Weapons: Main: {} ({}), Sub: {} ({}), Special: {} ({})",
                pad,
                names.get(NameKind::Weapon, record.weapon),
                record.weapon,
                names.get(NameKind::SubWeapon, record.sub_weapon),
                record.sub_weapon,
                names.get(NameKind::SpecialWeapon, record.special_weapon),
                record.special_weapon
            );
        }

        if self.level.wants_stats() {
            if let Some(stats) = &snapshot.stats {
                self.write_stats(out, player, stats, snapshot.header.versus_rule, &pad);
            }
        }
    }

    fn write_stats(&self, out: &mut String, player: &Player, stats: &MatchStats, rule: u8, pad: &str) {
        let Some(results) = stats.player(player.index) else {
            return;
        };
        let won = stats.is_winner(player.record.team);

        // Ranked modes give every player the same points.
        if rule == RULE_TURF_WAR {
            if won {
                let _ = writeln!(
                    out,
                    "{}Points: {}p ({}p w/o win bonus)",
                    pad,
                    u32::from(results.points) + WIN_BONUS,
                    results.points
                );
            } else {
                let _ = writeln!(out, "{}Points: {}p", pad, results.points);
            }
        }
        let _ = writeln!(out, "{}Kills: {}", pad, results.kills);
        let _ = writeln!(out, "{}Deaths: {}", pad, results.deaths);
        let _ = writeln!(out, "{}Result: {}", pad, if won { "Win" } else { "Lose" });
    }
}

/// One-line console summary of a player.
pub fn console_line(player: &Player) -> String {
    format!(
        "Player {} | PID: {:X} ({}) | Name: {}",
        player.index + 1,
        player.record.pid,
        player.record.pid,
        player.record.name
    )
}

/// Session and fetch time, printed after the player list.
pub fn console_footer(snapshot: &MatchSnapshot) -> String {
    let session = match snapshot.session_id {
        0 => "None".to_string(),
        id => format!("{:X} ({})", id, id),
    };
    format!(
        "\nSession ID: {}\n\nFetched at: {}",
        session,
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MatchHeader;
    use crate::record::tests::raw_record;
    use crate::record::PlayerRecord;
    use crate::stats::tests::raw_block;
    use bytes::Bytes;
    use chrono::{Local, TimeZone};

    fn player(index: usize, name: &str, pid: u32, team: u8) -> Player {
        Player {
            index,
            record: PlayerRecord::decode(&raw_record(name, pid, team)).unwrap(),
        }
    }

    fn snapshot(rule: u8, stats: Option<MatchStats>) -> MatchSnapshot {
        MatchSnapshot {
            captured_at: Local.with_ymd_and_hms(2025, 3, 14, 21, 5, 9).unwrap(),
            session_id: 0xABCDEF,
            in_match: true,
            header: MatchHeader {
                match_hour: 1,
                versus_mode: 0,
                versus_rule: rule,
                stage: "Fld_Plaza00_Vss".to_string(),
            },
            players: vec![player(0, "Callie", 0x1F, 0), player(1, "Marie", 0x20, 1)],
            stats,
        }
    }

    fn names() -> NameTable {
        NameTable::from_json(
            r#"{"versus_mode": {"0": "Regular"}, "versus_rule": {"0": "Turf War"},
                "stage": {"Fld_Plaza00_Vss": "Urchin Underpass"}, "match_hour": {"1": "Night"},
                "team": {"0": "Alpha", "1": "Bravo"}, "weapon": {"40": "Splattershot"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_level_ordering_and_parsing() {
        assert!(!LogLevel::None.writes_file());
        assert!(LogLevel::Basic.writes_file());
        assert!(LogLevel::Stats.wants_stats());
        assert!(!LogLevel::Full.wants_stats());
        assert_eq!("FULL".parse::<LogLevel>().unwrap(), LogLevel::Full);
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Stats.to_string(), "stats");
    }

    #[test]
    fn test_basic_single_match_layout() {
        let names = names();
        let text = Report::new(&names, LogLevel::Basic, false).render(&snapshot(0, None), None);

        assert!(text.starts_with("\nSession ID: ABCDEF (11259375)\nVersus mode: Regular\n"));
        assert!(text.contains("Stage: Urchin Underpass\nDay/Night: Night\n"));
        assert!(text.contains("\n[Player 1]\n  Name: Callie\n  PID: 1F (31)\n"));
        assert!(text.contains("  Team: Bravo (1)\n"));
        assert!(text.contains("  Rank: Unknown (-1)\n"));
        assert!(!text.contains("Weapons:"));
    }

    #[test]
    fn test_auto_layout_is_indented() {
        let names = names();
        let text = Report::new(&names, LogLevel::Full, true).render(&snapshot(0, None), Some(3));

        assert!(text.starts_with("\n[Match 3]\n  Time: 21:05:09\n  Session ID: ABCDEF"));
        assert!(text.contains("\n  [Player 2]\n    Name: Marie\n"));
        assert!(text.contains("    Weapons: Main: Splattershot (40), Sub: Unknown (3), Special: Unknown (7)\n"));
    }

    #[test]
    fn test_turf_war_win_bonus() {
        let names = names();
        let block = raw_block(0x124, &[(1100, 5, 2), (400, 1, 6)]);
        let stats = MatchStats::new(0, Bytes::from(block));
        let text = Report::new(&names, LogLevel::Stats, false).render(&snapshot(0, Some(stats)), None);

        assert!(text.contains("  Points: 2100p (1100p w/o win bonus)\n  Kills: 5\n  Deaths: 2\n  Result: Win\n"));
        assert!(text.contains("  Points: 400p\n  Kills: 1\n  Deaths: 6\n  Result: Lose\n"));
    }

    #[test]
    fn test_ranked_omits_points() {
        let names = names();
        let block = raw_block(0x124, &[(1100, 5, 2), (1100, 1, 6)]);
        let stats = MatchStats::new(1, Bytes::from(block));
        let text = Report::new(&names, LogLevel::Stats, false).render(&snapshot(2, Some(stats)), None);

        assert!(!text.contains("Points"));
        assert!(text.contains("  Kills: 1\n  Deaths: 6\n  Result: Win\n"));
    }

    #[test]
    fn test_level_none_renders_nothing() {
        let names = names();
        let text = Report::new(&names, LogLevel::None, true).render(&snapshot(0, None), Some(1));
        assert!(text.is_empty());
    }

    #[test]
    fn test_console_line() {
        assert_eq!(
            console_line(&player(4, "Pearl", 0x2A, 0)),
            "Player 5 | PID: 2A (42) | Name: Pearl"
        );
    }

    #[test]
    fn test_console_footer() {
        let mut snapshot = snapshot(0, None);
        assert_eq!(
            console_footer(&snapshot),
            "\nSession ID: ABCDEF (11259375)\n\nFetched at: 2025-03-14 21:05:09"
        );

        snapshot.session_id = 0;
        assert!(console_footer(&snapshot).starts_with("\nSession ID: None\n"));
    }
}

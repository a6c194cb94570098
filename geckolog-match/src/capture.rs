//! Reading match state from the console.
//!
//! Each step is a [`Work`] unit so the session can repeat it on a fresh
//! connection after a failure.

use crate::error::MatchError;
use crate::layout::MatchLayout;
use crate::record::PlayerRecord;
use crate::session::Work;
use crate::stats::MatchStats;
use crate::watch::{Liveness, WatchOutcome, Watcher};
use chrono::{DateTime, Local};
use geckolog_client::{MemoryLink, Sleeper};
use geckolog_protocol::value;

/// Base addresses resolved once per connection to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bases {
    pub static_mem: u32,
    pub player_info_array: u32,
    pub scene_mgr: u32,
}

impl Bases {
    /// Probe reporting whether a versus match is on screen.
    pub fn versus_liveness(&self, layout: &MatchLayout) -> Liveness {
        Liveness::Scene {
            address: self.scene_mgr.wrapping_add(layout.scene_id),
            scene: layout.versus_scene,
        }
    }
}

/// Resolves [`Bases`] through the pointer table.
pub struct ResolveBases<'a> {
    pub layout: &'a MatchLayout,
}

impl<L: MemoryLink> Work<L> for ResolveBases<'_> {
    type Output = Bases;

    async fn run(&mut self, link: &mut L) -> Result<Bases, MatchError> {
        let static_mem = link.peek32(self.layout.static_mem_ptr).await?;
        let player_info_array = link
            .peek32(static_mem.wrapping_add(self.layout.player_info_array))
            .await?;
        let scene_mgr = link.peek32(self.layout.scene_mgr_ptr).await?;

        tracing::debug!(
            "Static memory at {:#010X}, player info at {:#010X}, scene manager at {:#010X}",
            static_mem,
            player_info_array,
            scene_mgr
        );

        Ok(Bases {
            static_mem,
            player_info_array,
            scene_mgr,
        })
    }
}

/// Checks whether the versus scene is active.
pub struct SceneProbe<'a> {
    pub layout: &'a MatchLayout,
    pub bases: &'a Bases,
}

impl<L: MemoryLink> Work<L> for SceneProbe<'_> {
    type Output = bool;

    async fn run(&mut self, link: &mut L) -> Result<bool, MatchError> {
        Ok(self.bases.versus_liveness(self.layout).is_alive(link).await?)
    }
}

/// Day/night, mode, rule and stage of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchHeader {
    pub match_hour: u8,
    pub versus_mode: u8,
    pub versus_rule: u8,
    /// Internal stage code.
    pub stage: String,
}

/// A player slot with its decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Zero-based slot index.
    pub index: usize,
    pub record: PlayerRecord,
}

/// Everything captured about one match.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub captured_at: DateTime<Local>,
    pub session_id: u32,
    /// False when the data is left over from a previous match.
    pub in_match: bool,
    pub header: MatchHeader,
    pub players: Vec<Player>,
    /// Final results, when they were requested and became available.
    pub stats: Option<MatchStats>,
}

/// Captures a [`MatchSnapshot`], optionally waiting for the results.
pub struct CaptureMatch<'a, S> {
    layout: &'a MatchLayout,
    bases: &'a Bases,
    watcher: Watcher<'a, S>,
    with_stats: bool,
}

impl<'a, S: Sleeper> CaptureMatch<'a, S> {
    pub fn new(layout: &'a MatchLayout, bases: &'a Bases, watcher: Watcher<'a, S>) -> Self {
        Self {
            layout,
            bases,
            watcher,
            with_stats: false,
        }
    }

    pub fn with_stats(mut self, with_stats: bool) -> Self {
        self.with_stats = with_stats;
        self
    }

    async fn header<L: MemoryLink>(&self, link: &mut L) -> Result<MatchHeader, MatchError> {
        let base = self.bases.static_mem;
        let stage = link
            .read_string(base.wrapping_add(self.layout.stage), self.layout.stage_len)
            .await?;

        Ok(MatchHeader {
            match_hour: link.peek8(base.wrapping_add(self.layout.match_hour)).await?,
            versus_mode: link.peek8(base.wrapping_add(self.layout.versus_mode)).await?,
            versus_rule: link.peek8(base.wrapping_add(self.layout.versus_rule)).await?,
            stage: value::until_nul(&stage).to_string(),
        })
    }

    async fn session_id<L: MemoryLink>(&self, link: &mut L) -> Result<u32, MatchError> {
        let session = link.peek32(self.layout.session_ptr).await?;
        if session == 0 {
            return Ok(0);
        }

        let index = link
            .read_bytes(session.wrapping_add(self.layout.session_id_index), 1)
            .await?[0];
        Ok(link
            .peek32(self.layout.session_id_address(session, index))
            .await?)
    }

    /// Returns whether a versus match is running and how many slots to read.
    async fn player_count<L: MemoryLink>(&self, link: &mut L) -> Result<(bool, u32), MatchError> {
        let main_mgr = link.peek32(self.layout.main_mgr_ptr).await?;
        let in_versus = self.bases.versus_liveness(self.layout).is_alive(link).await?;
        if main_mgr == 0 || !in_versus {
            return Ok((false, self.layout.max_players));
        }

        let player_mgr = link
            .peek32(main_mgr.wrapping_add(self.layout.player_mgr))
            .await?;
        // Null while the match is still loading.
        if player_mgr == 0 {
            return Ok((true, self.layout.max_players));
        }
        let count = link
            .peek8(player_mgr.wrapping_add(self.layout.player_count))
            .await?;
        Ok((true, u32::from(count).min(self.layout.max_players)))
    }

    async fn players<L: MemoryLink>(&self, link: &mut L, count: u32) -> Result<Vec<Player>, MatchError> {
        let mut players = Vec::new();
        for index in 0..count {
            let slot = self
                .layout
                .player_info_slot(self.bases.player_info_array, index);
            let record_address = link.peek32(slot).await?;
            if record_address == 0 {
                continue;
            }

            let raw = link
                .read_bytes(record_address, self.layout.player_record_len)
                .await?;
            let record = PlayerRecord::decode(&raw)?;
            if record.is_empty() {
                continue;
            }
            players.push(Player {
                index: index as usize,
                record,
            });
        }
        Ok(players)
    }

    /// Waits for the stats block to change, then reads the results.
    async fn stats<L: MemoryLink>(&self, link: &mut L) -> Result<Option<MatchStats>, MatchError> {
        let variant = link.variant();
        let address = self.layout.stats_address(variant);
        let length = self.layout.stats_len;
        let baseline = link.read_bytes(address, length).await?;

        let liveness = self.bases.versus_liveness(self.layout);
        let outcome = self
            .watcher
            .wait_for_change(link, address, length, &baseline, &liveness)
            .await?;

        match outcome {
            WatchOutcome::Changed(block) => {
                let winning_team = link
                    .read_bytes(self.layout.winning_team_address(variant), 1)
                    .await?[0];
                Ok(Some(MatchStats::new(winning_team, block)))
            }
            WatchOutcome::Disconnected | WatchOutcome::TimedOut => Ok(None),
            WatchOutcome::Cancelled => Err(MatchError::Cancelled),
        }
    }
}

impl<L: MemoryLink, S: Sleeper> Work<L> for CaptureMatch<'_, S> {
    type Output = MatchSnapshot;

    async fn run(&mut self, link: &mut L) -> Result<MatchSnapshot, MatchError> {
        let session_id = self.session_id(link).await?;
        let header = self.header(link).await?;
        let (in_match, count) = self.player_count(link).await?;
        let players = self.players(link, count).await?;

        tracing::info!(
            "Captured {} players (session {:X}, in match: {})",
            players.len(),
            session_id,
            in_match
        );

        let stats = if self.with_stats && !players.is_empty() {
            self.stats(link).await?
        } else {
            None
        };

        Ok(MatchSnapshot {
            captured_at: Local::now(),
            session_id,
            in_match,
            header,
            players,
            stats,
        })
    }
}

/// Edge detector for the auto-logging loop.
#[derive(Debug, Clone, Default)]
pub struct SceneTracker {
    in_progress: bool,
    matches: u32,
}

impl SceneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one scene observation. Returns the number of the match that
    /// just started, if this observation entered the versus scene.
    pub fn observe(&mut self, in_versus: bool) -> Option<u32> {
        if !in_versus {
            self.in_progress = false;
            return None;
        }
        if self.in_progress {
            return None;
        }
        self.in_progress = true;
        self.matches += 1;
        Some(self.matches)
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }
}

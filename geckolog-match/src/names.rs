//! Display names for game ids.
//!
//! The table is plain data loaded from a JSON file of the form
//! `{"weapon": {"40": "Splattershot"}, "stage": {"Fld_Plaza00_Vss": "..."}}`.
//! Keys are the decimal id, or the raw string for stages.

use crate::error::MatchError;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Rendered for ids missing from the table.
pub const UNKNOWN: &str = "Unknown";

/// Categories of named ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    VersusMode,
    VersusRule,
    MatchHour,
    Stage,
    Team,
    Gender,
    EyeColor,
    Rank,
    Headgear,
    Clothes,
    Shoes,
    Weapon,
    SubWeapon,
    SpecialWeapon,
}

impl NameKind {
    /// Key of the category in the JSON file.
    pub fn as_str(&self) -> &'static str {
        match self {
            NameKind::VersusMode => "versus_mode",
            NameKind::VersusRule => "versus_rule",
            NameKind::MatchHour => "match_hour",
            NameKind::Stage => "stage",
            NameKind::Team => "team",
            NameKind::Gender => "gender",
            NameKind::EyeColor => "eye_color",
            NameKind::Rank => "rank",
            NameKind::Headgear => "headgear",
            NameKind::Clothes => "clothes",
            NameKind::Shoes => "shoes",
            NameKind::Weapon => "weapon",
            NameKind::SubWeapon => "sub_weapon",
            NameKind::SpecialWeapon => "special_weapon",
        }
    }
}

/// Immutable id to name mapping.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    categories: HashMap<String, HashMap<String, String>>,
}

impl NameTable {
    /// A table with no entries; everything renders as [`UNKNOWN`].
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let categories = serde_json::from_str(json)?;
        Ok(Self { categories })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Looks up the display name of `id`.
    pub fn get(&self, kind: NameKind, id: impl fmt::Display) -> &str {
        self.categories
            .get(kind.as_str())
            .and_then(|names| names.get(&id.to_string()))
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

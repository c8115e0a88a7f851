// Player identity and static attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::role::RoleCategory;

/// Credits assigned to a player missing from every squad file.
pub const DEFAULT_CREDITS: f64 = 7.0;

/// Placeholder for an unresolved role or origin team.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// Canonical name key
// ---------------------------------------------------------------------------

/// Canonical join key for a player name.
///
/// Lineups, squad files and the stats caches all spell names slightly
/// differently (stray whitespace, casing). Every name is folded into a
/// `PlayerKey` once at ingestion and the core joins on nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerKey(String);

impl PlayerKey {
    /// Trim, collapse internal whitespace runs to a single space, lowercase.
    pub fn new(name: &str) -> Self {
        let folded = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        PlayerKey(folded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Match side
// ---------------------------------------------------------------------------

/// Which of the two playing elevens a player was listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player eligible for selection in the current match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Display name as written in the lineup.
    pub name: String,
    pub key: PlayerKey,
    /// Free-text role, "Unknown" when neither lineup nor squad supplied one.
    pub role_text: String,
    /// Resolved role; always set once the registry is built.
    pub role: RoleCategory,
    pub credits: f64,
    pub is_foreign: bool,
    /// Real-world franchise the player is contracted to.
    pub origin_team: String,
    pub side: Side,
}

impl Player {
    pub fn has_known_origin(&self) -> bool {
        self.origin_team != UNKNOWN
    }
}

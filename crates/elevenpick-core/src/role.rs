// Role classification: free-text role descriptions to fantasy role categories.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerKey;

/// Fantasy position classes used for selection quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleCategory {
    Wicketkeeper,
    Batter,
    AllRounder,
    Bowler,
}

impl RoleCategory {
    /// All categories in display and coverage order.
    pub const ALL: [RoleCategory; 4] = [
        RoleCategory::Wicketkeeper,
        RoleCategory::Batter,
        RoleCategory::AllRounder,
        RoleCategory::Bowler,
    ];

    /// Dense index for fixed-size per-role counters.
    pub fn index(self) -> usize {
        match self {
            RoleCategory::Wicketkeeper => 0,
            RoleCategory::Batter => 1,
            RoleCategory::AllRounder => 2,
            RoleCategory::Bowler => 3,
        }
    }

    /// Short code used in constraint reports ("WK", "BAT", "ALL", "BOWL").
    pub fn short_code(self) -> &'static str {
        match self {
            RoleCategory::Wicketkeeper => "WK",
            RoleCategory::Batter => "BAT",
            RoleCategory::AllRounder => "ALL",
            RoleCategory::Bowler => "BOWL",
        }
    }

    /// Label written to the exported team file.
    pub fn display_str(self) -> &'static str {
        match self {
            RoleCategory::Wicketkeeper => "Wicketkeeper",
            RoleCategory::Batter => "Batsman",
            RoleCategory::AllRounder => "All-Rounder",
            RoleCategory::Bowler => "Bowler",
        }
    }

    /// Primary classifier: case-insensitive token match in priority order.
    ///
    /// Returns `None` (the UNKNOWN tag) when no token matches, including for
    /// "Unknown" and the empty string.
    pub fn from_role_text(role_text: &str) -> Option<Self> {
        let lower = role_text.to_lowercase();
        if lower.contains("wk") {
            return Some(RoleCategory::Wicketkeeper);
        }
        if lower.contains("bowler") {
            return Some(RoleCategory::Bowler);
        }
        let squashed: String = lower
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .collect();
        if squashed.contains("allrounder") {
            return Some(RoleCategory::AllRounder);
        }
        if lower.contains("batter") || lower.contains("batsman") {
            return Some(RoleCategory::Batter);
        }
        None
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_code())
    }
}

// ---------------------------------------------------------------------------
// Fallback heuristic
// ---------------------------------------------------------------------------

/// Keepers whose squad metadata is known to be missing. The stats caches
/// carry only batting history for them, so the history rule alone would file
/// them as batters.
pub const DEFAULT_WICKETKEEPER_EXCEPTIONS: &[&str] = &[
    "MS Dhoni",
    "Rishabh Pant",
    "KL Rahul",
    "Sanju Samson",
    "Ishan Kishan",
    "Nicholas Pooran",
    "Josh Inglis",
    "Prabhsimran Singh",
];

/// Content-based inference for players whose role text is unrecognised.
#[derive(Debug, Clone)]
pub struct RoleFallback {
    wicketkeepers: HashSet<PlayerKey>,
}

impl RoleFallback {
    pub fn new<I, S>(wicketkeeper_exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RoleFallback {
            wicketkeepers: wicketkeeper_exceptions
                .into_iter()
                .map(|n| PlayerKey::new(n.as_ref()))
                .collect(),
        }
    }

    /// Infer a role from which history caches mention the player.
    ///
    /// - batting only: Batter, or Wicketkeeper for a listed exception
    /// - bowling only: Bowler
    /// - both: AllRounder
    /// - neither: Batter
    pub fn infer(&self, key: &PlayerKey, has_batting: bool, has_bowling: bool) -> RoleCategory {
        match (has_batting, has_bowling) {
            (true, false) if self.wicketkeepers.contains(key) => RoleCategory::Wicketkeeper,
            (true, false) => RoleCategory::Batter,
            (false, true) => RoleCategory::Bowler,
            (true, true) => RoleCategory::AllRounder,
            (false, false) => RoleCategory::Batter,
        }
    }
}

impl Default for RoleFallback {
    fn default() -> Self {
        RoleFallback::new(DEFAULT_WICKETKEEPER_EXCEPTIONS.iter().copied())
    }
}

/// Resolve a player's role: the text classifier first, the history fallback
/// only when the text is unrecognised. Total over all inputs.
pub fn classify(
    role_text: &str,
    key: &PlayerKey,
    has_batting: bool,
    has_bowling: bool,
    fallback: &RoleFallback,
) -> RoleCategory {
    RoleCategory::from_role_text(role_text)
        .unwrap_or_else(|| fallback.infer(key, has_batting, has_bowling))
}

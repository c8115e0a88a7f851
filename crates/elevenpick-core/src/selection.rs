// Constrained team selection.
//
// A single greedy pass over the score-ranked players. Each candidate is
// checked against the budget, the foreign cap, the per-origin-team cap and the
// per-origin-team role caps; a rejected candidate is skipped, never revisited.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RulesConfig;
use crate::player::{Player, PlayerKey, Side};
use crate::registry::PlayerRegistry;
use crate::role::RoleCategory;
use crate::scoring::{RankedPlayer, ScoreBreakdown};

/// Slack for accumulated float error when comparing against the budget.
const CREDIT_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A selected player with everything the reports need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub key: PlayerKey,
    pub name: String,
    pub role: RoleCategory,
    pub credits: f64,
    pub is_foreign: bool,
    pub origin_team: String,
    /// Match side the player was listed on.
    pub side: Side,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Position in the ranked list (0 = best score).
    pub rank: usize,
}

/// The selected team, best score first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub picks: Vec<Pick>,
    pub total_credits: f64,
    pub foreign_count: usize,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn total_score(&self) -> f64 {
        self.picks.iter().map(|p| p.score).sum()
    }

    /// Number of selected players per role, in `RoleCategory::ALL` order.
    pub fn role_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for pick in &self.picks {
            counts[pick.role.index()] += 1;
        }
        counts
    }
}

/// Why a candidate was not taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AlreadySelected,
    TeamFull,
    OriginTeamFull,
    OriginRoleFull(RoleCategory),
    OverBudget,
    ForeignCapReached,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::AlreadySelected => write!(f, "already selected"),
            Rejection::TeamFull => write!(f, "team is full"),
            Rejection::OriginTeamFull => write!(f, "origin team at its cap"),
            Rejection::OriginRoleFull(role) => write!(f, "origin team has enough {role}"),
            Rejection::OverBudget => write!(f, "over budget"),
            Rejection::ForeignCapReached => write!(f, "foreign cap reached"),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

/// Running counters for one selection run.
#[derive(Debug)]
pub struct SelectionState<'a> {
    rules: &'a RulesConfig,
    picks: Vec<Pick>,
    taken: HashSet<PlayerKey>,
    total_credits: f64,
    foreign_count: usize,
    per_origin: HashMap<String, usize>,
    per_origin_role: HashMap<String, [usize; 4]>,
}

impl<'a> SelectionState<'a> {
    pub fn new(rules: &'a RulesConfig) -> Self {
        SelectionState {
            rules,
            picks: Vec::with_capacity(rules.team_size),
            taken: HashSet::new(),
            total_credits: 0.0,
            foreign_count: 0,
            per_origin: HashMap::new(),
            per_origin_role: HashMap::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.picks.len() >= self.rules.team_size
    }

    /// Test every constraint without changing any counter.
    pub fn check(&self, player: &Player) -> Result<(), Rejection> {
        if self.taken.contains(&player.key) {
            return Err(Rejection::AlreadySelected);
        }
        if self.is_full() {
            return Err(Rejection::TeamFull);
        }
        let origin = &player.origin_team;
        if self.per_origin.get(origin).copied().unwrap_or(0) >= self.rules.max_per_origin_team {
            return Err(Rejection::OriginTeamFull);
        }
        let role_count = self
            .per_origin_role
            .get(origin)
            .map_or(0, |counts| counts[player.role.index()]);
        if role_count >= self.rules.role_caps.cap(player.role) {
            return Err(Rejection::OriginRoleFull(player.role));
        }
        if self.total_credits + player.credits > self.rules.budget + CREDIT_EPSILON {
            return Err(Rejection::OverBudget);
        }
        if player.is_foreign && self.foreign_count >= self.rules.max_foreign {
            return Err(Rejection::ForeignCapReached);
        }
        Ok(())
    }

    /// Add the candidate if every constraint holds.
    pub fn try_add(
        &mut self,
        player: &Player,
        ranked: &RankedPlayer,
        rank: usize,
    ) -> Result<(), Rejection> {
        self.check(player)?;

        self.total_credits += player.credits;
        if player.is_foreign {
            self.foreign_count += 1;
        }
        *self.per_origin.entry(player.origin_team.clone()).or_insert(0) += 1;
        self.per_origin_role
            .entry(player.origin_team.clone())
            .or_insert([0; 4])[player.role.index()] += 1;
        self.taken.insert(player.key.clone());

        self.picks.push(Pick {
            key: player.key.clone(),
            name: player.name.clone(),
            role: player.role,
            credits: player.credits,
            is_foreign: player.is_foreign,
            origin_team: player.origin_team.clone(),
            side: player.side,
            score: ranked.score,
            breakdown: ranked.breakdown,
            rank,
        });
        Ok(())
    }

    /// Finish the run; picks are ordered by rank so the best scorer leads.
    pub fn finish(mut self) -> Selection {
        self.picks.sort_by_key(|p| p.rank);
        Selection {
            picks: self.picks,
            total_credits: self.total_credits,
            foreign_count: self.foreign_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Greedy selector
// ---------------------------------------------------------------------------

/// Build a team from `ranked` (already sorted best first).
///
/// With `ensure_role_coverage` set, the best eligible player of each role is
/// reserved first, then the general pass fills the remaining slots. A short
/// team is returned as is when the candidates run out.
pub fn select_team(
    ranked: &[RankedPlayer],
    registry: &PlayerRegistry,
    rules: &RulesConfig,
) -> Selection {
    let candidates: Vec<(usize, &RankedPlayer, &Player)> = ranked
        .iter()
        .enumerate()
        .filter_map(|(rank, r)| match registry.get(&r.key) {
            Some(player) => Some((rank, r, player)),
            None => {
                warn!("ranked player '{}' missing from registry, skipping", r.name);
                None
            }
        })
        .collect();

    let mut state = SelectionState::new(rules);

    if rules.ensure_role_coverage {
        for role in RoleCategory::ALL {
            if state.is_full() {
                break;
            }
            let reserved = candidates
                .iter()
                .filter(|(_, _, p)| p.role == role)
                .find(|(_, _, p)| state.check(p).is_ok());
            match reserved {
                Some(&(rank, r, p)) => {
                    if state.try_add(p, r, rank).is_ok() {
                        debug!("reserved {} as first {}", p.name, role.display_str());
                    }
                }
                None => debug!("no eligible {} to reserve", role.display_str()),
            }
        }
    }

    for &(rank, r, p) in &candidates {
        if state.is_full() {
            break;
        }
        match state.try_add(p, r, rank) {
            Ok(()) => debug!("selected {} ({:.2}, {} cr)", p.name, r.score, p.credits),
            Err(Rejection::AlreadySelected) => {}
            Err(reason) => debug!("rejected {}: {reason}", p.name),
        }
    }

    let selection = state.finish();
    if selection.len() < rules.team_size {
        warn!(
            "only {} of {} players satisfy the selection constraints",
            selection.len(),
            rules.team_size
        );
    }
    selection
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

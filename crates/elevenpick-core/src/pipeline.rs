// Prediction pipeline: registry -> scores -> selection -> captains.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::captain::{assign_captains, CaptainPair};
use crate::config::{Config, DataPaths};
use crate::lineup::MatchInput;
use crate::registry::PlayerRegistry;
use crate::roster::{RosterBook, RosterError};
use crate::scoring::{RankedPlayer, ScoreAggregator};
use crate::selection::{select_team, Selection};
use crate::stats::{StatsBook, StatsError};

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Stats caches and squad files, loaded once and reusable across matches.
#[derive(Debug, Clone, Default)]
pub struct MatchData {
    pub stats: StatsBook,
    pub roster: RosterBook,
}

impl MatchData {
    pub fn new(stats: StatsBook, roster: RosterBook) -> Self {
        MatchData { stats, roster }
    }

    /// Load everything named in `[data_paths]`, relative to `base_dir`.
    pub fn load(base_dir: &Path, paths: &DataPaths) -> Result<Self, DataError> {
        let stats = StatsBook::load(
            &base_dir.join(&paths.batter_stats),
            &base_dir.join(&paths.bowler_stats),
        )?;
        let roster = RosterBook::load_dir(&base_dir.join(&paths.squads_dir))?;
        info!(
            "loaded {} batting and {} bowling histories, {} squad players",
            stats.batting.len(),
            stats.bowling.len(),
            roster.len()
        );
        Ok(MatchData { stats, roster })
    }
}

/// Everything produced for one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub title: String,
    pub team1: String,
    pub team2: String,
    pub venue: String,
    /// Every player, best score first.
    pub ranked: Vec<RankedPlayer>,
    pub selection: Selection,
    pub captains: CaptainPair,
    /// Lineup names found in no squad file.
    pub unresolved: Vec<String>,
}

impl Prediction {
    /// Whether the selector filled every slot.
    pub fn is_complete(&self, team_size: usize) -> bool {
        self.selection.len() >= team_size
    }
}

/// Runs the full prediction for a match against loaded data.
pub struct Predictor<'a> {
    config: &'a Config,
    data: &'a MatchData,
}

impl<'a> Predictor<'a> {
    pub fn new(config: &'a Config, data: &'a MatchData) -> Self {
        Predictor { config, data }
    }

    pub fn predict(&self, input: &MatchInput) -> Prediction {
        let fallback = self.config.roles.fallback();
        let registry = PlayerRegistry::build(
            &input.home_lineup(),
            &input.away_lineup(),
            &self.data.roster,
            &self.data.stats,
            &fallback,
            self.config.rules.default_credits,
        );

        let unresolved: Vec<String> = registry
            .iter()
            .filter(|p| !p.has_known_origin())
            .map(|p| p.name.clone())
            .collect();
        if !unresolved.is_empty() {
            warn!(
                "{} players not found in any squad: {}",
                unresolved.len(),
                unresolved.join(", ")
            );
        }

        let aggregator = ScoreAggregator::new(&self.data.stats, &self.config.scoring);
        let ranked = aggregator.rank(&registry, &input.venue);
        let selection = select_team(&ranked, &registry, &self.config.rules);
        let captains = assign_captains(&selection.picks);

        info!(
            "{}: selected {}/{} players, {:.1} credits, {} foreign",
            input.title(),
            selection.len(),
            self.config.rules.team_size,
            selection.total_credits,
            selection.foreign_count
        );

        Prediction {
            title: input.title(),
            team1: input.team1.clone(),
            team2: input.team2.clone(),
            venue: input.venue.clone(),
            ranked,
            selection,
            captains,
            unresolved,
        }
    }
}

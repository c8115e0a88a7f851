// JSON export of the predicted team for the web front end.

use std::path::Path;

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use elevenpick_core::pipeline::Prediction;
use elevenpick_core::player::Side;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize team: {0}")]
    Json(#[from] serde_json::Error),
}

/// Franchise keywords and their short codes, checked in order.
const FRANCHISE_CODES: &[(&[&str], &str)] = &[
    (&["Sunrisers"], "SRH"),
    (&["Delhi"], "DC"),
    (&["Chennai"], "CSK"),
    (&["Mumbai"], "MI"),
    (&["Kolkata"], "KKR"),
    (&["Punjab"], "PBKS"),
    (&["Rajasthan"], "RR"),
    (&["Bangalore", "Bengaluru"], "RCB"),
    (&["Gujarat"], "GT"),
    (&["Lucknow"], "LSG"),
];

/// Short code for a match team label; unknown labels use their first two characters.
pub fn team_abbreviation(label: &str) -> String {
    FRANCHISE_CODES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| label.contains(k)))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| label.chars().take(2).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedPlayer {
    pub name: String,
    pub team: String,
    pub role: String,
    pub credit: f64,
    pub score: f64,
}

/// The `fantasy_team.json` document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamExport {
    pub players: Vec<ExportedPlayer>,
    pub total_credits: f64,
    #[serde(rename = "match")]
    pub match_title: String,
    pub venue: String,
    pub captain: Option<String>,
    pub vice_captain: Option<String>,
    pub generated_at: String,
}

impl TeamExport {
    pub fn from_prediction<Tz>(prediction: &Prediction, generated_at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let home = team_abbreviation(&prediction.team1);
        let away = team_abbreviation(&prediction.team2);
        let players = prediction
            .selection
            .picks
            .iter()
            .map(|pick| ExportedPlayer {
                name: pick.name.clone(),
                team: match pick.side {
                    Side::Home => home.clone(),
                    Side::Away => away.clone(),
                },
                role: pick.role.display_str().to_string(),
                credit: pick.credits,
                score: (pick.score * 100.0).round() / 100.0,
            })
            .collect();

        TeamExport {
            players,
            total_credits: prediction.selection.total_credits,
            match_title: prediction.title.clone(),
            venue: prediction.venue.clone(),
            captain: prediction.captains.captain.clone(),
            vice_captain: prediction.captains.vice_captain.clone(),
            generated_at: generated_at.to_rfc3339(),
        }
    }
}

/// Write the document as pretty JSON, creating parent directories.
pub fn write(path: &Path, document: &TeamExport) -> Result<(), ExportError> {
    let io_err = |e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json).map_err(io_err)?;
    info!("exported {} players to {}", document.players.len(), path.display());
    Ok(())
}

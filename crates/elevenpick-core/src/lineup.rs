// Match input: the two playing elevens, team labels and venue.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::player::PlayerKey;

#[derive(Debug, Error)]
pub enum MatchInputError {
    #[error("match file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse match file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid match input: {0}")]
    Validation(String),
}

/// A lineup entry, written as "Name(Role)" or just "Name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineupEntry {
    pub name: String,
    /// Role given inline, `None` for a bare name or empty parentheses.
    pub role: Option<String>,
}

impl LineupEntry {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once('(') {
            Some((name, rest)) => {
                let role = rest.trim().trim_end_matches(')').trim();
                LineupEntry {
                    name: name.trim().to_string(),
                    role: (!role.is_empty()).then(|| role.to_string()),
                }
            }
            None => LineupEntry {
                name: raw.to_string(),
                role: None,
            },
        }
    }

    pub fn key(&self) -> PlayerKey {
        PlayerKey::new(&self.name)
    }
}

/// Everything needed to predict one match.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchInput {
    pub team1: String,
    pub team2: String,
    pub venue: String,
    pub team1_playing11: Vec<String>,
    pub team2_playing11: Vec<String>,
}

impl MatchInput {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, MatchInputError> {
        let input: MatchInput = toml::from_str(text).map_err(|e| MatchInputError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        input.validate()?;
        Ok(input)
    }

    pub fn load(path: &Path) -> Result<Self, MatchInputError> {
        let text = std::fs::read_to_string(path).map_err(|_| MatchInputError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn home_lineup(&self) -> Vec<LineupEntry> {
        self.team1_playing11.iter().map(|s| LineupEntry::parse(s)).collect()
    }

    pub fn away_lineup(&self) -> Vec<LineupEntry> {
        self.team2_playing11.iter().map(|s| LineupEntry::parse(s)).collect()
    }

    /// "Team A vs Team B".
    pub fn title(&self) -> String {
        format!("{} vs {}", self.team1, self.team2)
    }

    /// Names must be non-blank and unique across both lineups.
    pub fn validate(&self) -> Result<(), MatchInputError> {
        if self.venue.trim().is_empty() {
            return Err(MatchInputError::Validation("venue must not be empty".into()));
        }
        if self.team1_playing11.is_empty() || self.team2_playing11.is_empty() {
            return Err(MatchInputError::Validation(
                "both playing lineups must list at least one player".into(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in self.home_lineup().iter().chain(self.away_lineup().iter()) {
            let key = entry.key();
            if key.is_empty() {
                return Err(MatchInputError::Validation("lineup contains a blank name".into()));
            }
            if !seen.insert(key) {
                return Err(MatchInputError::Validation(format!(
                    "player '{}' is listed more than once",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

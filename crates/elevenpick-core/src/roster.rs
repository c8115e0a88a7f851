// Franchise squad files: credits, foreign status and origin team per player.
//
// Each franchise has a `<team-slug>_squad.csv` with Name, Role, Credits and
// Foreign Player columns. The franchise name is derived from the file name.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::player::PlayerKey;

const SQUAD_SUFFIX: &str = "_squad.csv";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One player row from a squad file.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadEntry {
    pub name: String,
    pub role: String,
    pub credits: f64,
    pub is_foreign: bool,
    /// Franchise the squad file belongs to.
    pub team: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawSquadRow {
    Name: String,
    #[serde(default)]
    Role: String,
    Credits: f64,
    #[serde(rename = "Foreign Player", default, deserialize_with = "de_flag")]
    Foreign: bool,
}

/// Accept the spellings squad exports use for booleans.
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid Foreign Player flag '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// "mumbai-indians_squad.csv" -> "Mumbai Indians".
pub fn team_name_from_file(file_name: &str) -> Option<String> {
    let slug = file_name.strip_suffix(SQUAD_SUFFIX)?;
    let words: Vec<String> = slug
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn load_squad_from_reader<R: Read>(rdr: R, team: &str) -> Result<Vec<SquadEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawSquadRow>() {
        match result {
            Ok(raw) => {
                if !raw.Credits.is_finite() || raw.Credits <= 0.0 {
                    warn!("skipping '{}' in {team}: invalid credits {}", raw.Name, raw.Credits);
                    continue;
                }
                entries.push(SquadEntry {
                    name: raw.Name.trim().to_string(),
                    role: raw.Role.trim().to_string(),
                    credits: raw.Credits,
                    is_foreign: raw.Foreign,
                    team: team.to_string(),
                });
            }
            Err(e) => warn!("skipping malformed squad row in {team}: {e}"),
        }
    }
    Ok(entries)
}

/// Load one squad file; the franchise name comes from the file name.
pub fn load_squad(path: &Path) -> Result<Vec<SquadEntry>, RosterError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let team = team_name_from_file(file_name).unwrap_or_else(|| file_name.to_string());
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_squad_from_reader(file, &team).map_err(|e| RosterError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Roster book
// ---------------------------------------------------------------------------

/// All squads, searchable by canonical player name.
///
/// When a name appears in several squads the first squad loaded wins; squads
/// are loaded in file-name order so the outcome does not depend on the
/// directory listing order.
#[derive(Debug, Clone, Default)]
pub struct RosterBook {
    entries: Vec<SquadEntry>,
    index: HashMap<PlayerKey, usize>,
}

impl RosterBook {
    pub fn from_entries(entries: Vec<SquadEntry>) -> Self {
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            let key = PlayerKey::new(&entry.name);
            if index.contains_key(&key) {
                debug!("'{}' also listed by {}, keeping first squad", entry.name, entry.team);
                continue;
            }
            index.insert(key, i);
        }
        RosterBook { entries, index }
    }

    /// Load every `*_squad.csv` file in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, RosterError> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| RosterError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| RosterError::Io {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            let is_squad = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(SQUAD_SUFFIX));
            if path.is_file() && is_squad {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries = Vec::new();
        for path in &paths {
            let squad = load_squad(path)?;
            debug!("loaded {} players from {}", squad.len(), path.display());
            entries.extend(squad);
        }
        Ok(RosterBook::from_entries(entries))
    }

    pub fn lookup(&self, key: &PlayerKey) -> Option<&SquadEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Historical stats caches: head-to-head records, venue tables, recent form.
//
// Two JSON caches feed the scorer, one keyed by batter and one by bowler.
// Each entry carries head-to-head encounter records against named opponents
// plus whitespace-aligned text tables for venue splits and match-wise form.
// Everything is parsed once here; the scorer never touches raw text.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::player::PlayerKey;

/// Venue table key in a batter cache entry.
pub const VENUE_BATTING: &str = "Batting";
/// Venue table key in a bowler cache entry.
pub const VENUE_BOWLING: &str = "Bowling";
/// Recent-form label for the batting match-wise table.
pub const FORM_BATTING: &str = "Batting Match-wise";
/// Recent-form label for the bowling match-wise table.
pub const FORM_BOWLING: &str = "Bowling Match-wise";

/// Columns in the text tables are separated by two or more whitespace
/// characters or by a single tab.
static COLUMN_SEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s{2,}|\t").expect("column separator regex is valid")
});

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("failed to read stats file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in stats file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// A numeric field that was present but could not be read as a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("field `{field}` is not numeric: {value}")]
pub struct MalformedField {
    pub field: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Head-to-head records
// ---------------------------------------------------------------------------

/// One head-to-head encounter summary (keys such as "Strike Rate", "Econ").
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct EncounterRecord(Map<String, Value>);

impl EncounterRecord {
    /// Records carrying a `Message` field are "no data available" markers.
    pub fn is_no_data(&self) -> bool {
        self.0.contains_key("Message")
    }

    /// Read `field` as a number, `default` when the field is absent.
    ///
    /// Numeric strings are accepted; anything else is malformed.
    pub fn number(&self, field: &str, default: f64) -> Result<f64, MalformedField> {
        match self.0.get(field) {
            None => Ok(default),
            Some(value) => value_as_f64(value).ok_or_else(|| MalformedField {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

impl<const N: usize> From<[(&str, Value); N]> for EncounterRecord {
    fn from(fields: [(&str, Value); N]) -> Self {
        EncounterRecord(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Head-to-head data against one opponent: a single record or a list of
/// encounters. Only the first encounter of a list is ever used.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadToHead {
    Single(EncounterRecord),
    Encounters(Vec<EncounterRecord>),
}

impl HeadToHead {
    /// The record that counts for scoring, if any.
    pub fn primary(&self) -> Option<&EncounterRecord> {
        match self {
            HeadToHead::Single(record) => Some(record),
            HeadToHead::Encounters(list) => list.first(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(HeadToHead::Single(EncounterRecord(map))),
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(EncounterRecord(map)),
                        _ => None,
                    })
                    .collect();
                Some(HeadToHead::Encounters(records))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Text tables
// ---------------------------------------------------------------------------

/// A whitespace-aligned table as printed by the upstream scraper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Parse a header line followed by data lines.
    ///
    /// A row with exactly one more cell than the header carries a leading
    /// index column, which is dropped. Rows with any other cell count are
    /// skipped.
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let Some(header_line) = lines.next() else {
            return TextTable::default();
        };
        let headers: Vec<String> = split_cells(header_line);

        let mut rows = Vec::new();
        for line in lines {
            let mut cells = split_cells(line);
            if cells.len() == headers.len() + 1 {
                cells.remove(0);
            }
            if cells.len() != headers.len() {
                debug!(
                    "skipping table row with {} cells (expected {}): {}",
                    cells.len(),
                    headers.len(),
                    line
                );
                continue;
            }
            rows.push(cells);
        }
        TextTable { headers, rows }
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// First row whose `column` cell contains `needle` (case-insensitive).
    pub fn find_row(&self, column: &str, needle: &str) -> Option<&[String]> {
        let col = self.column(column)?;
        let needle = needle.to_lowercase();
        self.rows
            .iter()
            .find(|row| row[col].to_lowercase().contains(&needle))
            .map(Vec::as_slice)
    }

    /// Numeric value of `column` in `row`, `None` if absent or unparseable.
    pub fn number_in(&self, row: &[String], column: &str) -> Option<f64> {
        let col = self.column(column)?;
        row.get(col).and_then(|cell| parse_cell(cell))
    }

    /// Mean of the parseable cells of `column`.
    ///
    /// Cells that do not parse (e.g. "DNB", "-") are left out of the mean.
    /// Returns `None` when the column is missing or has no numeric cells.
    pub fn mean(&self, column: &str) -> Option<f64> {
        let col = self.column(column)?;
        let values: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|row| parse_cell(&row[col]))
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn split_cells(line: &str) -> Vec<String> {
    COLUMN_SEP
        .split(line)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Parse a table cell; a trailing `*` (not out) is ignored.
fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim()
        .trim_end_matches('*')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Per-player history
// ---------------------------------------------------------------------------

/// Everything one stats cache knows about one player.
#[derive(Debug, Clone, Default)]
pub struct PlayerHistory {
    pub head_to_head: HashMap<PlayerKey, HeadToHead>,
    /// Venue split tables keyed by discipline label ("Batting"/"Bowling").
    pub venue: HashMap<String, TextTable>,
    /// Recent-form tables keyed by label ("Batting Match-wise", ...).
    pub recent_form: Vec<(String, TextTable)>,
}

impl PlayerHistory {
    pub fn against(&self, opponent: &PlayerKey) -> Option<&HeadToHead> {
        self.head_to_head.get(opponent)
    }

    pub fn venue_table(&self, label: &str) -> Option<&TextTable> {
        self.venue.get(label)
    }

    /// Every recent-form table with the given label, in cache order.
    pub fn form_tables<'h>(&'h self, label: &'h str) -> impl Iterator<Item = &'h TextTable> + 'h {
        self.recent_form
            .iter()
            .filter(move |(l, _)| l == label)
            .map(|(_, t)| t)
    }
}

/// Raw cache entry (private). Fields stay loose so that one odd player does
/// not poison the whole file.
#[derive(Debug, Default, Deserialize)]
struct RawHistory {
    #[serde(default)]
    head_to_head: Option<Map<String, Value>>,
    #[serde(default)]
    venue: Option<Map<String, Value>>,
    #[serde(default)]
    recent_form: Option<Vec<Value>>,
}

impl RawHistory {
    fn into_history(self, player: &str) -> PlayerHistory {
        let mut history = PlayerHistory::default();

        for (opponent, value) in self.head_to_head.unwrap_or_default() {
            match HeadToHead::from_value(value) {
                Some(h2h) => {
                    history.head_to_head.insert(PlayerKey::new(&opponent), h2h);
                }
                None => debug!("ignoring non-record head-to-head entry {player} vs {opponent}"),
            }
        }

        for (label, value) in self.venue.unwrap_or_default() {
            match value {
                Value::String(text) => {
                    history.venue.insert(label, TextTable::parse(&text));
                }
                other => debug!("ignoring non-text venue table '{label}' for {player}: {other}"),
            }
        }

        for entry in self.recent_form.unwrap_or_default() {
            let Value::Array(parts) = entry else {
                debug!("ignoring malformed recent-form entry for {player}");
                continue;
            };
            match (parts.first(), parts.get(1)) {
                (Some(Value::String(label)), Some(Value::String(text))) => {
                    history
                        .recent_form
                        .push((label.clone(), TextTable::parse(text)));
                }
                _ => debug!("ignoring malformed recent-form entry for {player}"),
            }
        }

        history
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Parse one stats cache from any reader. Entries that are not objects are
/// skipped with a warning; a later duplicate name replaces an earlier one.
pub fn load_histories_from_reader<R: Read>(
    rdr: R,
) -> Result<HashMap<PlayerKey, PlayerHistory>, serde_json::Error> {
    let raw: Map<String, Value> = serde_json::from_reader(rdr)?;
    let mut out = HashMap::with_capacity(raw.len());
    for (name, value) in raw {
        let key = PlayerKey::new(&name);
        if key.is_empty() {
            warn!("skipping stats entry with a blank player name");
            continue;
        }
        match serde_json::from_value::<RawHistory>(value) {
            Ok(entry) => {
                if out.insert(key, entry.into_history(&name)).is_some() {
                    warn!("duplicate stats entry for '{}', using latest", name.trim());
                }
            }
            Err(e) => warn!("skipping malformed stats entry for '{}': {}", name.trim(), e),
        }
    }
    Ok(out)
}

/// Load one stats cache from disk.
pub fn load_histories(path: &Path) -> Result<HashMap<PlayerKey, PlayerHistory>, StatsError> {
    let file = std::fs::File::open(path).map_err(|e| StatsError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_histories_from_reader(std::io::BufReader::new(file)).map_err(|e| StatsError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Both stats caches, keyed by canonical player name.
#[derive(Debug, Clone, Default)]
pub struct StatsBook {
    pub batting: HashMap<PlayerKey, PlayerHistory>,
    pub bowling: HashMap<PlayerKey, PlayerHistory>,
}

impl StatsBook {
    pub fn load(batter_path: &Path, bowler_path: &Path) -> Result<Self, StatsError> {
        let batting = load_histories(batter_path)?;
        let bowling = load_histories(bowler_path)?;
        Ok(StatsBook { batting, bowling })
    }

    pub fn batting_history(&self, key: &PlayerKey) -> Option<&PlayerHistory> {
        self.batting.get(key)
    }

    pub fn bowling_history(&self, key: &PlayerKey) -> Option<&PlayerHistory> {
        self.bowling.get(key)
    }

    pub fn has_batting(&self, key: &PlayerKey) -> bool {
        self.batting.contains_key(key)
    }

    pub fn has_bowling(&self, key: &PlayerKey) -> bool {
        self.bowling.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

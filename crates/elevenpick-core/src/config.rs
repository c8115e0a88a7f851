// Configuration loading and parsing (rules.toml, strategy.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::player::DEFAULT_CREDITS;
use crate::role::{RoleCategory, RoleFallback, DEFAULT_WICKETKEEPER_EXCEPTIONS};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub rules: RulesConfig,
    pub scoring: ScoringWeights,
    pub roles: RolesConfig,
    pub data_paths: DataPaths,
    pub output: OutputPaths,
    pub points_table: PointsTableConfig,
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[rules]` table in rules.toml.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    rules: RulesConfig,
}

/// Contest rules the selector enforces.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Total credits a team may spend.
    pub budget: f64,
    pub team_size: usize,
    pub max_foreign: usize,
    /// Cap on players from one real-world franchise.
    pub max_per_origin_team: usize,
    /// Run the one-per-role pre-pass before the greedy fill.
    #[serde(default)]
    pub ensure_role_coverage: bool,
    /// Credits for players missing from every squad file.
    #[serde(default = "default_credits")]
    pub default_credits: f64,
    pub role_caps: RoleCaps,
}

fn default_credits() -> f64 {
    DEFAULT_CREDITS
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            budget: 100.0,
            team_size: 11,
            max_foreign: 4,
            max_per_origin_team: 6,
            ensure_role_coverage: false,
            default_credits: DEFAULT_CREDITS,
            role_caps: RoleCaps::default(),
        }
    }
}

/// Per-origin-team cap for each role category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RoleCaps {
    pub wicketkeeper: usize,
    pub batter: usize,
    pub all_rounder: usize,
    pub bowler: usize,
}

impl RoleCaps {
    pub fn cap(&self, role: RoleCategory) -> usize {
        match role {
            RoleCategory::Wicketkeeper => self.wicketkeeper,
            RoleCategory::Batter => self.batter,
            RoleCategory::AllRounder => self.all_rounder,
            RoleCategory::Bowler => self.bowler,
        }
    }

    pub fn total(&self) -> usize {
        self.wicketkeeper + self.batter + self.all_rounder + self.bowler
    }
}

impl Default for RoleCaps {
    fn default() -> Self {
        RoleCaps {
            wicketkeeper: 2,
            batter: 3,
            all_rounder: 3,
            bowler: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    head_to_head: HeadToHeadWeights,
    #[serde(default)]
    venue: VenueWeights,
    #[serde(default)]
    form: FormWeights,
    #[serde(default)]
    roles: RolesConfig,
    data_paths: DataPaths,
    output: OutputPaths,
    #[serde(default)]
    points_table: PointsTableConfig,
}

/// Scoring constants for the three analysis passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringWeights {
    pub head_to_head: HeadToHeadWeights,
    pub venue: VenueWeights,
    pub form: FormWeights,
}

/// batting = (SR/100)*sr_weight + avg/avg_divisor + boundary%/boundary_divisor
///           - dismissals*dismissal_penalty
/// bowling = dismissals*wicket_weight + (cap - min(econ, cap))
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeadToHeadWeights {
    pub strike_rate_weight: f64,
    pub average_divisor: f64,
    pub boundary_divisor: f64,
    pub dismissal_penalty: f64,
    pub wicket_weight: f64,
    /// Economy assumed when a bowling record has none.
    pub missing_economy: f64,
    pub economy_cap: f64,
}

impl Default for HeadToHeadWeights {
    fn default() -> Self {
        HeadToHeadWeights {
            strike_rate_weight: 2.0,
            average_divisor: 10.0,
            boundary_divisor: 10.0,
            dismissal_penalty: 2.0,
            wicket_weight: 5.0,
            missing_economy: 15.0,
            economy_cap: 10.0,
        }
    }
}

/// batting = avg/avg_divisor + SR/sr_divisor
/// bowling = wickets*wicket_weight + (cap - min(econ, cap))
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VenueWeights {
    pub average_divisor: f64,
    pub strike_rate_divisor: f64,
    pub wicket_weight: f64,
    pub economy_cap: f64,
}

impl Default for VenueWeights {
    fn default() -> Self {
        VenueWeights {
            average_divisor: 20.0,
            strike_rate_divisor: 100.0,
            wicket_weight: 3.0,
            economy_cap: 10.0,
        }
    }
}

/// batting = mean(runs)/runs_divisor + mean(SR)/sr_divisor
/// bowling = mean(wickets)*wicket_weight + (cap - min(mean(econ), cap))
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormWeights {
    pub runs_divisor: f64,
    pub strike_rate_divisor: f64,
    pub wicket_weight: f64,
    pub economy_cap: f64,
}

impl Default for FormWeights {
    fn default() -> Self {
        FormWeights {
            runs_divisor: 10.0,
            strike_rate_divisor: 100.0,
            wicket_weight: 5.0,
            economy_cap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Batting-only players treated as keepers when their role is unknown.
    pub wicketkeeper_exceptions: Vec<String>,
}

impl RolesConfig {
    pub fn fallback(&self) -> RoleFallback {
        RoleFallback::new(&self.wicketkeeper_exceptions)
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        RolesConfig {
            wicketkeeper_exceptions: DEFAULT_WICKETKEEPER_EXCEPTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPaths {
    pub batter_stats: String,
    pub bowler_stats: String,
    pub squads_dir: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputPaths {
    pub team_json: String,
    pub points_table_json: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PointsTableConfig {
    pub api_url: String,
    /// Proxy URL templates; `{url}` is replaced with `api_url`. The direct
    /// URL is always tried last.
    pub proxies: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for PointsTableConfig {
    fn default() -> Self {
        PointsTableConfig {
            api_url: "https://cf-gotham.sportskeeda.com/cricket/ipl/points-table".into(),
            proxies: vec![
                "https://corsproxy.io/?{url}".into(),
                "https://api.allorigins.win/raw?url={url}".into(),
                "https://cors-anywhere.herokuapp.com/{url}".into(),
            ],
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/rules.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This does not copy defaults; call `ensure_config_files` first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- rules.toml (required) ---
    let rules_path = config_dir.join("rules.toml");
    let rules_text = read_file(&rules_path)?;
    let rules_file: RulesFile =
        toml::from_str(&rules_text).map_err(|e| ConfigError::ParseError {
            path: rules_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        rules: rules_file.rules,
        scoring: ScoringWeights {
            head_to_head: strategy_file.head_to_head,
            venue: strategy_file.venue,
            form: strategy_file.form,
        },
        roles: strategy_file.roles,
        data_paths: strategy_file.data_paths,
        output: strategy_file.output,
        points_table: strategy_file.points_table,
    };

    validate(&config)?;

    Ok(config)
}

/// Copy every file in `defaults/` that is missing from `config/`.
///
/// Files ending in `.example` stay behind. Existing config files are never
/// overwritten. Returns the created paths in file-name order.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "no defaults/ or config/ directory under {}",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
    {
        let path = entry
            .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        let is_template = path.extension().is_some_and(|ext| ext == "example");
        if path.is_file() && !is_template {
            sources.push(path);
        }
    }
    sources.sort();

    let mut copied = Vec::new();
    for source in sources {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);
        let mut dest = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(copy_error(format!("cannot create {}: {e}", target.display()))),
        };
        let content = std::fs::read(&source)
            .map_err(|e| copy_error(format!("cannot read {}: {e}", source.display())))?;
        std::io::Write::write_all(&mut dest, &content)
            .map_err(|e| copy_error(format!("cannot write {}: {e}", target.display())))?;
        copied.push(target);
    }

    Ok(copied)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let rules = &config.rules;

    if !(rules.budget.is_finite() && rules.budget > 0.0) {
        return Err(invalid("rules.budget", format!("must be > 0, got {}", rules.budget)));
    }
    if rules.team_size == 0 {
        return Err(invalid("rules.team_size", "must be greater than 0"));
    }
    if rules.max_per_origin_team == 0 {
        return Err(invalid("rules.max_per_origin_team", "must be greater than 0"));
    }
    if !(rules.default_credits.is_finite() && rules.default_credits > 0.0) {
        return Err(invalid(
            "rules.default_credits",
            format!("must be > 0, got {}", rules.default_credits),
        ));
    }
    if rules.role_caps.total() < rules.team_size {
        return Err(invalid(
            "rules.role_caps",
            format!(
                "caps sum to {} per team, too few for a team of {}",
                rules.role_caps.total(),
                rules.team_size
            ),
        ));
    }

    let divisors: &[(&str, f64)] = &[
        ("head_to_head.average_divisor", config.scoring.head_to_head.average_divisor),
        ("head_to_head.boundary_divisor", config.scoring.head_to_head.boundary_divisor),
        ("venue.average_divisor", config.scoring.venue.average_divisor),
        ("venue.strike_rate_divisor", config.scoring.venue.strike_rate_divisor),
        ("form.runs_divisor", config.scoring.form.runs_divisor),
        ("form.strike_rate_divisor", config.scoring.form.strike_rate_divisor),
        ("head_to_head.economy_cap", config.scoring.head_to_head.economy_cap),
        ("venue.economy_cap", config.scoring.venue.economy_cap),
        ("form.economy_cap", config.scoring.form.economy_cap),
    ];
    for (name, val) in divisors {
        if !(val.is_finite() && *val > 0.0) {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }

    let paths: &[(&str, &str)] = &[
        ("data_paths.batter_stats", config.data_paths.batter_stats.as_str()),
        ("data_paths.bowler_stats", config.data_paths.bowler_stats.as_str()),
        ("data_paths.squads_dir", config.data_paths.squads_dir.as_str()),
    ];
    for (name, val) in paths {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

// League points table: fetch through CORS proxies, flatten, save and print.
//
// The upstream API nests the standings as `table[0].table`, where an entry is
// either a team row or a `group` of team rows. Proxies are tried in order and
// the direct URL last; the first source yielding at least one row wins.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use elevenpick_core::config::PointsTableConfig;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const SITE: &str = "https://www.sportskeeda.com";

#[derive(Debug, Error)]
pub enum PointsTableError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no points table data from any of {attempts} sources")]
    NoData { attempts: usize },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize points table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Proxy URLs with `{url}` filled in, followed by the direct URL.
pub fn candidate_urls(config: &PointsTableConfig) -> Vec<String> {
    config
        .proxies
        .iter()
        .map(|template| template.replace("{url}", &config.api_url))
        .chain(std::iter::once(config.api_url.clone()))
        .collect()
}

/// Flatten `table[0].table` into one row per team.
pub fn extract_rows(data: &Value) -> Vec<Value> {
    let Some(entries) = data
        .get("table")
        .and_then(|t| t.get(0))
        .and_then(|t| t.get("table"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for entry in entries {
        match entry.get("group").and_then(Value::as_array) {
            Some(group) => rows.extend(group.iter().cloned()),
            None => rows.push(entry.clone()),
        }
    }
    rows
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.sportskeeda.com/"));
    headers.insert(ORIGIN, HeaderValue::from_static(SITE));
    headers
}

async fn fetch_from(client: &reqwest::Client, url: &str) -> Result<Vec<Value>, reqwest::Error> {
    let data: Value = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(extract_rows(&data))
}

/// Try every source in order until one returns rows.
pub async fn fetch(config: &PointsTableConfig) -> Result<Vec<Value>, PointsTableError> {
    let client = reqwest::Client::builder()
        .default_headers(browser_headers())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let urls = candidate_urls(config);
    for url in &urls {
        debug!("fetching points table from {url}");
        match fetch_from(&client, url).await {
            Ok(rows) if !rows.is_empty() => {
                info!("fetched {} points table rows from {url}", rows.len());
                return Ok(rows);
            }
            Ok(_) => warn!("no points table rows in response from {url}"),
            Err(e) => warn!("points table source {url} failed: {e}"),
        }
    }
    Err(PointsTableError::NoData {
        attempts: urls.len(),
    })
}

/// Save as `{ "points": [...] }`, creating parent directories.
pub fn save(path: &Path, rows: &[Value]) -> Result<(), PointsTableError> {
    let io_err = |e| PointsTableError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(&json!({ "points": rows }))?;
    std::fs::write(path, json).map_err(io_err)?;
    Ok(())
}

fn cell(row: &Value, field: &str) -> String {
    match row.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Fixed-width standings table.
pub fn render(rows: &[Value]) -> String {
    let rule = "-".repeat(80);
    let mut out = String::new();
    let _ = writeln!(out, "\nPoints Table ({} teams):", rows.len());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<5}{:<20}{:<5}{:<5}{:<5}{:<5}{:<5}{:<5}{:<10}",
        "Pos", "Team", "P", "W", "L", "T", "NR", "Pts", "NRR"
    );
    let _ = writeln!(out, "{rule}");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<5}{:<20}{:<5}{:<5}{:<5}{:<5}{:<5}{:<5}{:<10}",
            cell(row, "position"),
            cell(row, "team_name"),
            cell(row, "played"),
            cell(row, "won"),
            cell(row, "lost"),
            cell(row, "tied"),
            cell(row, "no_result"),
            cell(row, "points"),
            cell(row, "nrr"),
        );
    }
    out
}

// Fantasy score aggregation: head-to-head, venue and recent-form passes.
//
// Each pass reads one slice of the stats caches and adds to a player's score.
// Missing data contributes nothing; a record that is present but unreadable
// is skipped on its own without affecting the rest of the pass. A player with
// both batting and bowling history collects both halves of every pass.

use serde::Serialize;
use tracing::debug;

use crate::config::ScoringWeights;
use crate::player::{Player, PlayerKey};
use crate::registry::PlayerRegistry;
use crate::stats::{
    EncounterRecord, MalformedField, PlayerHistory, StatsBook, FORM_BATTING, FORM_BOWLING,
    VENUE_BATTING, VENUE_BOWLING,
};

/// Column holding the venue name in venue tables.
const VENUE_COLUMN: &str = "venue";

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// Per-pass contributions to a player's fantasy score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub head_to_head: f64,
    pub venue: f64,
    pub form: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.head_to_head + self.venue + self.form
    }
}

/// A player's key and score, as handed to the selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub key: PlayerKey,
    pub name: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// `cap - min(economy, cap)`: zero for anything at or above the cap.
fn economy_bonus(economy: f64, cap: f64) -> f64 {
    cap - economy.min(cap)
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Stateless scorer over a pair of stats caches.
pub struct ScoreAggregator<'a> {
    stats: &'a StatsBook,
    weights: &'a ScoringWeights,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(stats: &'a StatsBook, weights: &'a ScoringWeights) -> Self {
        Self { stats, weights }
    }

    /// Score one player against the opposing lineup at `venue`.
    pub fn score(&self, player: &Player, opponents: &[&PlayerKey], venue: &str) -> ScoreBreakdown {
        let batting = self.stats.batting_history(&player.key);
        let bowling = self.stats.bowling_history(&player.key);

        let breakdown = ScoreBreakdown {
            head_to_head: self.head_to_head(&player.name, batting, bowling, opponents),
            venue: self.venue(&player.name, batting, bowling, venue),
            form: self.recent_form(batting, bowling),
        };
        debug!(
            player = %player.name,
            h2h = breakdown.head_to_head,
            venue = breakdown.venue,
            form = breakdown.form,
            "scored"
        );
        breakdown
    }

    /// Score every registered player and sort by descending score.
    ///
    /// The sort is stable, so equal scores keep registry insertion order.
    pub fn rank(&self, registry: &PlayerRegistry, venue: &str) -> Vec<RankedPlayer> {
        let mut ranked: Vec<RankedPlayer> = registry
            .iter()
            .map(|player| {
                let opponents: Vec<&PlayerKey> = registry
                    .side(player.side.opponent())
                    .map(|p| &p.key)
                    .collect();
                let breakdown = self.score(player, &opponents, venue);
                RankedPlayer {
                    key: player.key.clone(),
                    name: player.name.clone(),
                    score: breakdown.total(),
                    breakdown,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    // -- head-to-head --

    fn head_to_head(
        &self,
        name: &str,
        batting: Option<&PlayerHistory>,
        bowling: Option<&PlayerHistory>,
        opponents: &[&PlayerKey],
    ) -> f64 {
        let mut total = 0.0;
        for &opponent in opponents {
            if let Some(record) = batting.and_then(|h| usable_record(h, opponent)) {
                match self.batting_encounter(record) {
                    Ok(points) => total += points,
                    Err(e) => debug!("skipping batting h2h {name} vs {opponent}: {e}"),
                }
            }
            if let Some(record) = bowling.and_then(|h| usable_record(h, opponent)) {
                match self.bowling_encounter(record) {
                    Ok(points) => total += points,
                    Err(e) => debug!("skipping bowling h2h {name} vs {opponent}: {e}"),
                }
            }
        }
        total
    }

    /// `(SR/100)*2 + avg/10 + boundary%/10 - dismissals*2` with default weights.
    pub fn batting_encounter(&self, record: &EncounterRecord) -> Result<f64, MalformedField> {
        let w = &self.weights.head_to_head;
        let strike_rate = record.number("Strike Rate", 0.0)?;
        let average = record.number("Average", 0.0)?;
        let boundary_pct = record.number("Boundary %", 0.0)?;
        let dismissals = record.number("Dismissals", 0.0)?;
        Ok((strike_rate / 100.0) * w.strike_rate_weight + average / w.average_divisor
            + boundary_pct / w.boundary_divisor
            - dismissals * w.dismissal_penalty)
    }

    /// `dismissals*5 + (10 - min(econ, 10))`, economy 15 when absent.
    pub fn bowling_encounter(&self, record: &EncounterRecord) -> Result<f64, MalformedField> {
        let w = &self.weights.head_to_head;
        let dismissals = record.number("Dismissals", 0.0)?;
        let economy = record.number("Econ", w.missing_economy)?;
        Ok(dismissals * w.wicket_weight + economy_bonus(economy, w.economy_cap))
    }

    // -- venue --

    fn venue(
        &self,
        name: &str,
        batting: Option<&PlayerHistory>,
        bowling: Option<&PlayerHistory>,
        venue: &str,
    ) -> f64 {
        let w = &self.weights.venue;
        let mut total = 0.0;

        if let Some(table) = batting.and_then(|h| h.venue_table(VENUE_BATTING)) {
            if let Some(row) = table.find_row(VENUE_COLUMN, venue) {
                match (table.number_in(row, "Average"), table.number_in(row, "Strike Rate")) {
                    (Some(avg), Some(sr)) => {
                        total += avg / w.average_divisor + sr / w.strike_rate_divisor;
                    }
                    _ => debug!("skipping unreadable batting venue row for {name}"),
                }
            }
        }

        if let Some(table) = bowling.and_then(|h| h.venue_table(VENUE_BOWLING)) {
            if let Some(row) = table.find_row(VENUE_COLUMN, venue) {
                match (table.number_in(row, "Wickets"), table.number_in(row, "Economy")) {
                    (Some(wickets), Some(economy)) => {
                        total += wickets * w.wicket_weight + economy_bonus(economy, w.economy_cap);
                    }
                    _ => debug!("skipping unreadable bowling venue row for {name}"),
                }
            }
        }

        total
    }

    // -- recent form --

    /// Each labelled match-wise table adds its own contribution.
    fn recent_form(&self, batting: Option<&PlayerHistory>, bowling: Option<&PlayerHistory>) -> f64 {
        let w = &self.weights.form;
        let mut total = 0.0;

        for table in batting.into_iter().flat_map(|h| h.form_tables(FORM_BATTING)) {
            if let Some(runs) = table.mean("Runs") {
                total += runs / w.runs_divisor;
            }
            if let Some(sr) = table.mean("Strike Rate") {
                total += sr / w.strike_rate_divisor;
            }
        }

        for table in bowling.into_iter().flat_map(|h| h.form_tables(FORM_BOWLING)) {
            if let Some(wickets) = table.mean("Wickets") {
                total += wickets * w.wicket_weight;
            }
            if let Some(economy) = table.mean("Economy") {
                total += economy_bonus(economy, w.economy_cap);
            }
        }

        total
    }
}

/// The first encounter against `opponent`, unless it is a no-data marker.
fn usable_record<'h>(history: &'h PlayerHistory, opponent: &PlayerKey) -> Option<&'h EncounterRecord> {
    history
        .against(opponent)
        .and_then(|h2h| h2h.primary())
        .filter(|record| !record.is_no_data())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Side;
    use crate::role::RoleCategory;
    use crate::stats::{HeadToHead, TextTable};
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn player(name: &str, side: Side) -> Player {
        Player {
            name: name.into(),
            key: PlayerKey::new(name),
            role_text: "Unknown".into(),
            role: RoleCategory::Batter,
            credits: 8.0,
            is_foreign: false,
            origin_team: "Unknown".into(),
            side,
        }
    }

    fn h2h(record: EncounterRecord) -> HeadToHead {
        HeadToHead::Single(record)
    }

    fn weights() -> ScoringWeights {
        ScoringWeights::default()
    }

    #[test]
    fn batting_encounter_formula() {
        let stats = StatsBook::default();
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let rec = EncounterRecord::from([
            ("Strike Rate", json!(150.0)),
            ("Average", json!(40.0)),
            ("Boundary %", json!(20.0)),
            ("Dismissals", json!(1)),
        ]);
        // 1.5*2 + 4 + 2 - 2 = 7
        assert!((agg.batting_encounter(&rec).unwrap() - 7.0).abs() < EPS);
    }

    #[test]
    fn bowling_encounter_formula_and_missing_economy() {
        let stats = StatsBook::default();
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);

        let rec = EncounterRecord::from([("Dismissals", json!(2)), ("Econ", json!(6.5))]);
        // 2*5 + (10 - 6.5) = 13.5
        assert!((agg.bowling_encounter(&rec).unwrap() - 13.5).abs() < EPS);

        let no_econ = EncounterRecord::from([("Dismissals", json!(1))]);
        // economy defaults to 15 -> capped term is zero
        assert!((agg.bowling_encounter(&no_econ).unwrap() - 5.0).abs() < EPS);

        let high_econ = EncounterRecord::from([("Econ", json!("12.0"))]);
        assert!(agg.bowling_encounter(&high_econ).unwrap().abs() < EPS);
    }

    #[test]
    fn player_without_any_data_scores_zero() {
        let stats = StatsBook::default();
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let p = player("Ghost", Side::Home);
        let opp = PlayerKey::new("Someone");
        let b = agg.score(&p, &[&opp], "Wankhede");
        assert_eq!(b, ScoreBreakdown::default());
        assert_eq!(b.total(), 0.0);
    }

    #[test]
    fn head_to_head_uses_first_record_and_skips_no_data() {
        let mut batting = PlayerHistory::default();
        batting.head_to_head.insert(
            PlayerKey::new("Bowler A"),
            HeadToHead::Encounters(vec![
                EncounterRecord::from([("Average", json!(10.0))]),
                EncounterRecord::from([("Average", json!(1000.0))]),
            ]),
        );
        batting.head_to_head.insert(
            PlayerKey::new("Bowler B"),
            h2h(EncounterRecord::from([
                ("Message", json!("No data available")),
                ("Average", json!(500.0)),
            ])),
        );
        batting.head_to_head.insert(
            PlayerKey::new("Bowler C"),
            h2h(EncounterRecord::from([("Average", json!("garbage"))])),
        );
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("Bat"), batting);

        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let a = PlayerKey::new("Bowler A");
        let b = PlayerKey::new("Bowler B");
        let c = PlayerKey::new("Bowler C");
        let score = agg.score(&player("Bat", Side::Home), &[&a, &b, &c], "X");
        // only Bowler A's first record counts: 10/10 = 1
        assert!((score.head_to_head - 1.0).abs() < EPS);
    }

    #[test]
    fn head_to_head_only_counts_listed_opponents() {
        let mut bowling = PlayerHistory::default();
        bowling.head_to_head.insert(
            PlayerKey::new("Batter X"),
            h2h(EncounterRecord::from([("Dismissals", json!(1)), ("Econ", json!(8.0))])),
        );
        let mut stats = StatsBook::default();
        stats.bowling.insert(PlayerKey::new("Bowl"), bowling);

        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let other = PlayerKey::new("Batter Y");
        let s = agg.score(&player("Bowl", Side::Away), &[&other], "X");
        assert_eq!(s.head_to_head, 0.0);

        let x = PlayerKey::new("batter x");
        let s = agg.score(&player("Bowl", Side::Away), &[&x], "X");
        assert!((s.head_to_head - 7.0).abs() < EPS);
    }

    #[test]
    fn all_rounder_collects_both_halves() {
        let mut batting = PlayerHistory::default();
        batting.head_to_head.insert(
            PlayerKey::new("Opp"),
            h2h(EncounterRecord::from([("Average", json!(20.0))])),
        );
        batting.recent_form.push((
            FORM_BATTING.to_string(),
            TextTable::parse("Runs  Strike Rate\n40    100.0\n20    100.0"),
        ));
        let mut bowling = PlayerHistory::default();
        bowling.head_to_head.insert(
            PlayerKey::new("Opp"),
            h2h(EncounterRecord::from([("Dismissals", json!(1)), ("Econ", json!(9.0))])),
        );
        bowling.recent_form.push((
            FORM_BOWLING.to_string(),
            TextTable::parse("Wickets  Economy\n2        7.0\n0        9.0"),
        ));
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("AR"), batting);
        stats.bowling.insert(PlayerKey::new("AR"), bowling);

        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let opp = PlayerKey::new("Opp");
        let s = agg.score(&player("AR", Side::Home), &[&opp], "X");
        // h2h: bat 2.0 + bowl (5 + 1) = 8
        assert!((s.head_to_head - 8.0).abs() < EPS);
        // form: bat 30/10 + 100/100 = 4; bowl 1*5 + (10-8) = 7
        assert!((s.form - 11.0).abs() < EPS);
    }

    #[test]
    fn venue_first_matching_row_counts() {
        let mut batting = PlayerHistory::default();
        batting.venue.insert(
            VENUE_BATTING.to_string(),
            TextTable::parse(
                "venue                      Average  Strike Rate\n\
                 Wankhede Stadium, Mumbai     40.0        150.0\n\
                 Wankhede Stadium (old)       10.0         50.0",
            ),
        );
        let mut bowling = PlayerHistory::default();
        bowling.venue.insert(
            VENUE_BOWLING.to_string(),
            TextTable::parse(
                "venue                      Wickets  Economy\n\
                 Eden Gardens                     9      6.0\n\
                 Wankhede Stadium, Mumbai         2      8.5",
            ),
        );
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("P"), batting);
        stats.bowling.insert(PlayerKey::new("P"), bowling);

        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let s = agg.score(&player("P", Side::Home), &[], "wankhede stadium");
        // bat 40/20 + 150/100 = 3.5 ; bowl 2*3 + 1.5 = 7.5
        assert!((s.venue - 11.0).abs() < EPS);

        let none = agg.score(&player("P", Side::Home), &[], "Chepauk");
        assert_eq!(none.venue, 0.0);
    }

    #[test]
    fn venue_row_with_bad_numbers_is_skipped() {
        let mut batting = PlayerHistory::default();
        batting.venue.insert(
            VENUE_BATTING.to_string(),
            TextTable::parse("venue      Average  Strike Rate\nWankhede       -        150.0"),
        );
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("P"), batting);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        assert_eq!(agg.score(&player("P", Side::Home), &[], "Wankhede").venue, 0.0);
    }

    #[test]
    fn form_uses_labelled_tables_only() {
        let mut batting = PlayerHistory::default();
        // a bowling table in the batting cache is ignored
        batting.recent_form.push((
            FORM_BOWLING.to_string(),
            TextTable::parse("Wickets  Economy\n5        2.0"),
        ));
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("P"), batting);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        assert_eq!(agg.score(&player("P", Side::Home), &[], "X").form, 0.0);
    }

    #[test]
    fn every_matching_form_table_adds_up() {
        let mut batting = PlayerHistory::default();
        for runs in ["40", "20"] {
            batting.recent_form.push((
                FORM_BATTING.to_string(),
                TextTable::parse(&format!("Runs  Strike Rate\n{runs}    100.0")),
            ));
        }
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("P"), batting);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        // (40/10 + 1) + (20/10 + 1) = 8
        let form = agg.score(&player("P", Side::Home), &[], "X").form;
        assert!((form - 8.0).abs() < EPS);
    }

    #[test]
    fn scores_can_go_negative() {
        let mut batting = PlayerHistory::default();
        batting.head_to_head.insert(
            PlayerKey::new("Opp"),
            h2h(EncounterRecord::from([("Dismissals", json!(3))])),
        );
        let mut stats = StatsBook::default();
        stats.batting.insert(PlayerKey::new("P"), batting);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let opp = PlayerKey::new("Opp");
        assert!((agg.score(&player("P", Side::Home), &[&opp], "X").total() + 6.0).abs() < EPS);
    }

    #[test]
    fn rank_is_descending_and_stable_on_ties() {
        let mut stats = StatsBook::default();
        for (name, avg) in [("B", 50.0), ("C", 100.0)] {
            let mut h = PlayerHistory::default();
            h.head_to_head.insert(
                PlayerKey::new("Z"),
                h2h(EncounterRecord::from([("Average", json!(avg))])),
            );
            stats.batting.insert(PlayerKey::new(name), h);
        }
        let registry = PlayerRegistry::from_players(vec![
            player("A", Side::Home),
            player("B", Side::Home),
            player("C", Side::Home),
            player("D", Side::Home),
            player("Z", Side::Away),
        ]);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        let ranked = agg.rank(&registry, "X");
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A", "D", "Z"]);
        assert!((ranked[0].score - 10.0).abs() < EPS);
    }

    #[test]
    fn rank_is_deterministic() {
        let stats = StatsBook::default();
        let registry = PlayerRegistry::from_players(vec![
            player("A", Side::Home),
            player("B", Side::Away),
        ]);
        let w = weights();
        let agg = ScoreAggregator::new(&stats, &w);
        assert_eq!(agg.rank(&registry, "X"), agg.rank(&registry, "X"));
    }

    #[test]
    fn custom_weights_apply() {
        let mut w = weights();
        w.head_to_head.wicket_weight = 1.0;
        w.head_to_head.economy_cap = 0.0;
        let stats = StatsBook::default();
        let agg = ScoreAggregator::new(&stats, &w);
        let rec = EncounterRecord::from([("Dismissals", json!(3)), ("Econ", json!(4.0))]);
        assert!((agg.bowling_encounter(&rec).unwrap() - 3.0).abs() < EPS);
    }
}

// Player registry: the match's eligible players with their static attributes.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::lineup::LineupEntry;
use crate::player::{Player, PlayerKey, Side, UNKNOWN};
use crate::role::{classify, RoleFallback};
use crate::roster::RosterBook;
use crate::stats::StatsBook;

/// Players of one match in insertion order (home lineup, then away lineup).
///
/// Insertion order is the tie-break order for equal scores, so it must stay
/// stable for a given match input.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    index: HashMap<PlayerKey, usize>,
}

impl PlayerRegistry {
    /// Resolve both lineups against the squads and stats caches.
    ///
    /// Role text comes from the lineup entry when given, otherwise from the
    /// squad file, otherwise "Unknown". Players absent from every squad get
    /// `default_credits`, are domestic and have an unknown origin team.
    pub fn build(
        home: &[LineupEntry],
        away: &[LineupEntry],
        roster: &RosterBook,
        stats: &StatsBook,
        fallback: &RoleFallback,
        default_credits: f64,
    ) -> Self {
        let mut registry = PlayerRegistry::default();
        let sides = home
            .iter()
            .map(|e| (e, Side::Home))
            .chain(away.iter().map(|e| (e, Side::Away)));

        for (entry, side) in sides {
            let key = entry.key();
            if registry.index.contains_key(&key) {
                warn!("'{}' listed twice, keeping first occurrence", entry.name);
                continue;
            }

            let squad = roster.lookup(&key);
            if squad.is_none() {
                debug!("'{}' not found in any squad, using defaults", entry.name);
            }

            let role_text = entry
                .role
                .clone()
                .filter(|r| !r.eq_ignore_ascii_case(UNKNOWN))
                .or_else(|| {
                    squad
                        .map(|s| s.role.clone())
                        .filter(|r| !r.is_empty())
                })
                .unwrap_or_else(|| UNKNOWN.to_string());

            let role = classify(
                &role_text,
                &key,
                stats.has_batting(&key),
                stats.has_bowling(&key),
                fallback,
            );

            let player = Player {
                name: entry.name.clone(),
                key: key.clone(),
                role_text,
                role,
                credits: squad.map_or(default_credits, |s| s.credits),
                is_foreign: squad.is_some_and(|s| s.is_foreign),
                origin_team: squad.map_or_else(|| UNKNOWN.to_string(), |s| s.team.clone()),
                side,
            };
            registry.insert(player);
        }
        registry
    }

    /// Build directly from resolved players (insertion order preserved,
    /// duplicate keys ignored).
    pub fn from_players(players: impl IntoIterator<Item = Player>) -> Self {
        let mut registry = PlayerRegistry::default();
        for p in players {
            if !registry.index.contains_key(&p.key) {
                registry.insert(p);
            }
        }
        registry
    }

    fn insert(&mut self, player: Player) {
        self.index.insert(player.key.clone(), self.players.len());
        self.players.push(player);
    }

    pub fn get(&self, key: &PlayerKey) -> Option<&Player> {
        self.index.get(key).map(|&i| &self.players[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Players on the given side of the match.
    pub fn side(&self, side: Side) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.side == side)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleCategory;
    use crate::roster::SquadEntry;
    use crate::stats::PlayerHistory;

    fn squad(name: &str, role: &str, credits: f64, foreign: bool, team: &str) -> SquadEntry {
        SquadEntry {
            name: name.into(),
            role: role.into(),
            credits,
            is_foreign: foreign,
            team: team.into(),
        }
    }

    fn roster() -> RosterBook {
        RosterBook::from_entries(vec![
            squad("Rohit Sharma", "Batter", 9.5, false, "Mumbai Indians"),
            squad("Trent Boult", "Bowler", 8.5, true, "Mumbai Indians"),
            squad("Tristan Stubbs", "", 8.0, true, "Delhi Capitals"),
        ])
    }

    fn lineup(names: &[&str]) -> Vec<LineupEntry> {
        names.iter().map(|n| LineupEntry::parse(n)).collect()
    }

    #[test]
    fn resolves_squad_attributes() {
        let reg = PlayerRegistry::build(
            &lineup(&["rohit sharma", "Trent Boult"]),
            &lineup(&["Tristan Stubbs"]),
            &roster(),
            &StatsBook::default(),
            &RoleFallback::default(),
            7.0,
        );
        assert_eq!(reg.len(), 3);

        let rohit = reg.get(&PlayerKey::new("Rohit Sharma")).unwrap();
        assert_eq!(rohit.name, "rohit sharma");
        assert_eq!(rohit.role, RoleCategory::Batter);
        assert_eq!(rohit.origin_team, "Mumbai Indians");
        assert_eq!(rohit.side, Side::Home);

        let boult = reg.get(&PlayerKey::new("Trent Boult")).unwrap();
        assert!(boult.is_foreign);
        assert!((boult.credits - 8.5).abs() < f64::EPSILON);

        let stubbs = reg.get(&PlayerKey::new("Tristan Stubbs")).unwrap();
        assert_eq!(stubbs.side, Side::Away);
        assert_eq!(stubbs.role_text, UNKNOWN);
    }

    #[test]
    fn inline_role_overrides_squad_role() {
        let reg = PlayerRegistry::build(
            &lineup(&["Rohit Sharma(WK-Batter)"]),
            &[],
            &roster(),
            &StatsBook::default(),
            &RoleFallback::default(),
            7.0,
        );
        let p = reg.get(&PlayerKey::new("Rohit Sharma")).unwrap();
        assert_eq!(p.role_text, "WK-Batter");
        assert_eq!(p.role, RoleCategory::Wicketkeeper);
    }

    #[test]
    fn inline_unknown_falls_through_to_squad_role() {
        let reg = PlayerRegistry::build(
            &lineup(&["Trent Boult(Unknown)"]),
            &[],
            &roster(),
            &StatsBook::default(),
            &RoleFallback::default(),
            7.0,
        );
        assert_eq!(reg.get(&PlayerKey::new("Trent Boult")).unwrap().role, RoleCategory::Bowler);
    }

    #[test]
    fn unknown_player_gets_defaults_and_history_role() {
        let mut stats = StatsBook::default();
        stats
            .bowling
            .insert(PlayerKey::new("Mystery Spinner"), PlayerHistory::default());
        let reg = PlayerRegistry::build(
            &lineup(&["Mystery Spinner"]),
            &[],
            &roster(),
            &stats,
            &RoleFallback::default(),
            7.0,
        );
        let p = reg.get(&PlayerKey::new("mystery spinner")).unwrap();
        assert!((p.credits - 7.0).abs() < f64::EPSILON);
        assert!(!p.is_foreign);
        assert_eq!(p.origin_team, UNKNOWN);
        assert_eq!(p.role, RoleCategory::Bowler);
    }

    #[test]
    fn duplicate_names_keep_first() {
        let reg = PlayerRegistry::build(
            &lineup(&["Rohit Sharma"]),
            &lineup(&["ROHIT SHARMA"]),
            &roster(),
            &StatsBook::default(),
            &RoleFallback::default(),
            7.0,
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.side(Side::Away).count(), 0);
    }

    #[test]
    fn insertion_order_is_home_then_away() {
        let reg = PlayerRegistry::build(
            &lineup(&["A", "B"]),
            &lineup(&["C"]),
            &RosterBook::default(),
            &StatsBook::default(),
            &RoleFallback::default(),
            7.0,
        );
        let names: Vec<&str> = reg.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(reg.get(&PlayerKey::new("c")).unwrap().side, Side::Away);
    }
}

// Captain and vice-captain designation.

use serde::Serialize;

use crate::selection::Pick;

/// Names of the captain and vice-captain, `None` when the team is too short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptainPair {
    pub captain: Option<String>,
    pub vice_captain: Option<String>,
}

impl CaptainPair {
    pub fn is_captain(&self, name: &str) -> bool {
        self.captain.as_deref() == Some(name)
    }

    pub fn is_vice_captain(&self, name: &str) -> bool {
        self.vice_captain.as_deref() == Some(name)
    }
}

/// Captain is the first pick, vice-captain the second.
///
/// Both stay unset unless at least two players were selected.
pub fn assign_captains(picks: &[Pick]) -> CaptainPair {
    match picks {
        [first, second, ..] => CaptainPair {
            captain: Some(first.name.clone()),
            vice_captain: Some(second.name.clone()),
        },
        _ => CaptainPair::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerKey, Side};
    use crate::role::RoleCategory;
    use crate::scoring::ScoreBreakdown;

    fn pick(name: &str, rank: usize) -> Pick {
        Pick {
            key: PlayerKey::new(name),
            name: name.into(),
            role: RoleCategory::Batter,
            credits: 8.0,
            is_foreign: false,
            origin_team: "X".into(),
            side: Side::Home,
            score: 10.0 - rank as f64,
            breakdown: ScoreBreakdown::default(),
            rank,
        }
    }

    #[test]
    fn first_two_picks_lead() {
        let pair = assign_captains(&[pick("A", 0), pick("B", 1), pick("C", 2)]);
        assert_eq!(pair.captain.as_deref(), Some("A"));
        assert_eq!(pair.vice_captain.as_deref(), Some("B"));
        assert!(pair.is_captain("A"));
        assert!(pair.is_vice_captain("B"));
        assert!(!pair.is_captain("C"));
    }

    #[test]
    fn fewer_than_two_picks_leaves_both_unset() {
        assert_eq!(assign_captains(&[pick("A", 0)]), CaptainPair::default());
        assert_eq!(assign_captains(&[]), CaptainPair::default());
    }
}

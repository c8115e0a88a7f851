// Console report for a predicted team.

use std::collections::BTreeMap;
use std::fmt::Write;

use elevenpick_core::config::RulesConfig;
use elevenpick_core::pipeline::Prediction;
use elevenpick_core::role::RoleCategory;
use elevenpick_core::scoring::ScoreBreakdown;

fn heading(role: RoleCategory) -> &'static str {
    match role {
        RoleCategory::Wicketkeeper => "WICKET-KEEPERS",
        RoleCategory::Batter => "BATSMEN",
        RoleCategory::AllRounder => "ALL-ROUNDERS",
        RoleCategory::Bowler => "BOWLERS",
    }
}

fn breakdown_line(b: &ScoreBreakdown) -> String {
    format!("h2h {:.2} | venue {:.2} | form {:.2}", b.head_to_head, b.venue, b.form)
}

/// Render the team grouped by role, followed by the constraint summary.
pub fn render(prediction: &Prediction, rules: &RulesConfig) -> String {
    let selection = &prediction.selection;
    let captains = &prediction.captains;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "\n===== FANTASY XI =====\n");
    let _ = writeln!(out, "Match: {}", prediction.title);
    let _ = writeln!(out, "Venue: {}\n", prediction.venue);
    let _ = writeln!(
        out,
        "Total Credits: {:.1}/{:.1}",
        selection.total_credits, rules.budget
    );
    let _ = writeln!(
        out,
        "Foreign Players: {}/{}",
        selection.foreign_count, rules.max_foreign
    );
    let _ = writeln!(out, "Projected Points: {:.2}", selection.total_score());
    if selection.len() < rules.team_size {
        let _ = writeln!(
            out,
            "Only {} of {} slots could be filled under the constraints",
            selection.len(),
            rules.team_size
        );
    }

    for role in RoleCategory::ALL {
        let _ = writeln!(out, "\n{}:", heading(role));
        for pick in selection.picks.iter().filter(|p| p.role == role) {
            let mark = if captains.is_captain(&pick.name) {
                " (C)"
            } else if captains.is_vice_captain(&pick.name) {
                " (VC)"
            } else {
                ""
            };
            let foreign = if pick.is_foreign { " [FOREIGN]" } else { "" };
            let _ = writeln!(
                out,
                "  {}{} - {:.2} points - {} credits{}",
                pick.name, mark, pick.score, pick.credits, foreign
            );
            let _ = writeln!(out, "      {}", breakdown_line(&pick.breakdown));
        }
    }

    let _ = writeln!(
        out,
        "\nCAPTAIN: {}",
        captains.captain.as_deref().unwrap_or("None")
    );
    let _ = writeln!(
        out,
        "VICE-CAPTAIN: {}",
        captains.vice_captain.as_deref().unwrap_or("None")
    );

    let mut per_team: BTreeMap<&str, [usize; 4]> = BTreeMap::new();
    for pick in &selection.picks {
        per_team.entry(pick.origin_team.as_str()).or_insert([0; 4])[pick.role.index()] += 1;
    }

    let _ = writeln!(out, "\nPlayers per Team:");
    for (team, counts) in &per_team {
        let total: usize = counts.iter().sum();
        let _ = writeln!(out, "  {team}: {total}/{}", rules.max_per_origin_team);
    }
    let _ = writeln!(out, "\nRole Distribution per Team:");
    for (team, counts) in &per_team {
        let _ = writeln!(out, "  {team}:");
        for role in RoleCategory::ALL {
            let n = counts[role.index()];
            if n > 0 {
                let _ = writeln!(
                    out,
                    "    {}: {n}/{}",
                    role.short_code(),
                    rules.role_caps.cap(role)
                );
            }
        }
    }

    let bench: Vec<_> = prediction
        .ranked
        .iter()
        .enumerate()
        .filter(|(_, r)| !selection.picks.iter().any(|p| p.key == r.key))
        .collect();
    if !bench.is_empty() {
        let _ = writeln!(out, "\nNot Selected:");
        for (rank, r) in bench {
            let _ = writeln!(
                out,
                "  #{} {} - {:.2} points ({})",
                rank + 1,
                r.name,
                r.score,
                breakdown_line(&r.breakdown)
            );
        }
    }

    if !prediction.unresolved.is_empty() {
        let _ = writeln!(
            out,
            "\nNot found in any squad (default credits used): {}",
            prediction.unresolved.join(", ")
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevenpick_core::captain::assign_captains;
    use elevenpick_core::player::{PlayerKey, Side};
    use elevenpick_core::scoring::RankedPlayer;
    use elevenpick_core::selection::{Pick, Selection};

    fn pick(name: &str, role: RoleCategory, foreign: bool, team: &str, rank: usize) -> Pick {
        Pick {
            key: PlayerKey::new(name),
            name: name.into(),
            role,
            credits: 8.5,
            is_foreign: foreign,
            origin_team: team.into(),
            side: Side::Home,
            score: 20.0 - rank as f64,
            breakdown: ScoreBreakdown {
                head_to_head: 12.0 - rank as f64,
                venue: 5.0,
                form: 3.0,
            },
            rank,
        }
    }

    fn prediction(picks: Vec<Pick>) -> Prediction {
        let total_credits = picks.iter().map(|p| p.credits).sum();
        let foreign_count = picks.iter().filter(|p| p.is_foreign).count();
        let captains = assign_captains(&picks);
        Prediction {
            title: "Mumbai Indians vs Delhi Capitals".into(),
            team1: "Mumbai Indians".into(),
            team2: "Delhi Capitals".into(),
            venue: "Wankhede Stadium, Mumbai".into(),
            ranked: Vec::new(),
            selection: Selection {
                picks,
                total_credits,
                foreign_count,
            },
            captains,
            unresolved: vec!["Walk In".into()],
        }
    }

    #[test]
    fn groups_by_role_with_marks() {
        let p = prediction(vec![
            pick("Jasprit Bumrah", RoleCategory::Bowler, false, "Mumbai Indians", 0),
            pick("KL Rahul", RoleCategory::Wicketkeeper, false, "Delhi Capitals", 1),
            pick("Trent Boult", RoleCategory::Bowler, true, "Mumbai Indians", 2),
        ]);
        let text = render(&p, &RulesConfig::default());

        assert!(text.contains("Total Credits: 25.5/100.0"));
        assert!(text.contains("Foreign Players: 1/4"));
        assert!(text.contains("Projected Points: 57.00"));
        assert!(text.contains("Only 3 of 11 slots"));
        assert!(text.contains("  Jasprit Bumrah (C) - 20.00 points - 8.5 credits\n"));
        assert!(text.contains("  KL Rahul (VC) - 19.00 points"));
        assert!(text.contains("Trent Boult - 18.00 points - 8.5 credits [FOREIGN]"));
        assert!(text.contains("CAPTAIN: Jasprit Bumrah"));
        assert!(text.contains("  Mumbai Indians: 2/6"));
        assert!(text.contains("    BOWL: 2/3"));
        assert!(text.contains("Walk In"));

        let keepers = text.find("WICKET-KEEPERS:").unwrap();
        let bowlers = text.find("BOWLERS:").unwrap();
        assert!(text[keepers..bowlers].contains("KL Rahul"));
    }

    #[test]
    fn shows_breakdown_and_unpicked_players() {
        let mut p = prediction(vec![pick(
            "Jasprit Bumrah",
            RoleCategory::Bowler,
            false,
            "Mumbai Indians",
            0,
        )]);
        p.ranked = vec![
            RankedPlayer {
                key: PlayerKey::new("Jasprit Bumrah"),
                name: "Jasprit Bumrah".into(),
                score: 20.0,
                breakdown: p.selection.picks[0].breakdown,
            },
            RankedPlayer {
                key: PlayerKey::new("Will Jacks"),
                name: "Will Jacks".into(),
                score: 4.5,
                breakdown: ScoreBreakdown {
                    head_to_head: 2.0,
                    venue: 0.0,
                    form: 2.5,
                },
            },
        ];
        let text = render(&p, &RulesConfig::default());

        assert!(text.contains(
            "  Jasprit Bumrah (C) - 20.00 points - 8.5 credits\n      h2h 12.00 | venue 5.00 | form 3.00\n"
        ));
        assert!(text.contains("Not Selected:\n  #2 Will Jacks - 4.50 points (h2h 2.00 | venue 0.00 | form 2.50)"));
        assert!(!text.contains("#1 Jasprit Bumrah"));
    }

    #[test]
    fn empty_team_reports_no_captains() {
        let mut p = prediction(Vec::new());
        p.unresolved.clear();
        let text = render(&p, &RulesConfig::default());
        assert!(text.contains("CAPTAIN: None"));
        assert!(text.contains("VICE-CAPTAIN: None"));
        assert!(!text.contains("Not found in any squad"));
    }
}

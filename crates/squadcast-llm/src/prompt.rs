// Prompt templates for squad analysis, captaincy, lineup, transfer strategy
// and free-form chat.
//
// Every prompt carries the pre-computed predictions and suggestions so the
// model comments on trade-offs instead of redoing the arithmetic.

use squadcast_core::model::Position;
use squadcast_core::scoring::{Confidence, Lineup, TransferSuggestion};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// One squad member with everything a prompt shows about them.
#[derive(Debug, Clone)]
pub struct SquadLine {
    pub name: String,
    pub club: String,
    pub position: Position,
    /// Tenths of a unit.
    pub price: u32,
    pub form: f64,
    pub points_per_game: f64,
    pub total_points: i32,
    pub status: String,
    pub news: String,
    pub predicted_points: Option<u32>,
    /// Opponent short name for the next fixture.
    pub opponent: Option<String>,
    pub is_home: Option<bool>,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

/// The squad as the prompts see it.
#[derive(Debug, Clone)]
pub struct SquadContext {
    pub gameweek: u32,
    pub formation: String,
    /// Tenths of a unit.
    pub bank: u32,
    /// Tenths of a unit.
    pub value: u32,
    pub players: Vec<SquadLine>,
}

/// A ranked captaincy option.
#[derive(Debug, Clone)]
pub struct CaptainOption {
    pub name: String,
    pub predicted_points: u32,
    pub confidence: Confidence,
    pub opponent: Option<String>,
    pub is_home: Option<bool>,
}

// ---------------------------------------------------------------------------
// System prompt
// ---------------------------------------------------------------------------

/// Return the static system prompt for all squad advisory LLM calls.
pub fn system_prompt() -> String {
    "You are a Fantasy Premier League advisor.\n\
     \n\
     Rules: 15-player squad (2 GKP, 5 DEF, 5 MID, 3 FWD), at most 3 players per club, \
     100.0 starting budget. Eleven start in a legal formation with exactly one goalkeeper. \
     The captain scores double; the vice-captain takes over if the captain does not play.\n\
     \n\
     Predictions I give you come from a rule-based model blending recent form, fixture \
     difficulty, home/away team strength and minutes certainty. Treat them as a baseline, \
     not gospel.\n\
     \n\
     Be concise and direct. Use the pre-computed numbers I provide and do NOT do arithmetic. \
     Prices are in millions. Focus on trade-offs and context the numbers don't capture: \
     rotation risk, injuries in the news, fixture swings, price changes."
        .to_string()
}

// ---------------------------------------------------------------------------
// Prompt builders
// ---------------------------------------------------------------------------

/// Whole-squad review.
pub fn build_team_analysis_prompt(squad: &SquadContext) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format_header("TEAM ANALYSIS", squad));
    prompt.push_str("## MY SQUAD\n");
    prompt.push_str(&format_squad_for_prompt(squad));
    prompt.push('\n');

    let flagged: Vec<&SquadLine> = squad
        .players
        .iter()
        .filter(|p| !p.news.is_empty() || p.status != "Available")
        .collect();
    if !flagged.is_empty() {
        prompt.push_str("## AVAILABILITY CONCERNS\n");
        for p in flagged {
            prompt.push_str(&format!("  {} ({}): {}\n", p.name, p.status, p.news));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "## HOW IS MY TEAM LOOKING?\n\
         Give me the squad's strengths, its weak spots, and the one change that would help most.",
    );
    prompt
}

/// Captaincy decision over the ranked options.
pub fn build_captain_prompt(squad: &SquadContext, options: &[CaptainOption]) -> String {
    let mut prompt = String::with_capacity(1536);

    prompt.push_str(&format_header("CAPTAIN PICK", squad));
    prompt.push_str("## CAPTAIN OPTIONS (best predicted first)\n");
    for (i, o) in options.iter().enumerate() {
        prompt.push_str(&format!(
            "  {}. {} - {} pts predicted, {} confidence, {}\n",
            i + 1,
            o.name,
            o.predicted_points,
            o.confidence.label(),
            format_fixture(o.opponent.as_deref(), o.is_home),
        ));
    }
    prompt.push('\n');

    prompt.push_str("## MY SQUAD\n");
    prompt.push_str(&format_squad_for_prompt(squad));
    prompt.push('\n');

    prompt.push_str(
        "## WHO SHOULD I CAPTAIN?\n\
         Give me a captain, a vice-captain, and a differential captain if one is worth the risk.",
    );
    prompt
}

/// Commentary on a heuristic starting eleven.
pub fn build_lineup_prompt(squad: &SquadContext, lineup: &Lineup) -> String {
    let mut prompt = String::with_capacity(1536);

    prompt.push_str(&format_header("LINEUP", squad));
    prompt.push_str(&format!(
        "## SUGGESTED XI ({}, {} pts predicted)\n",
        lineup.formation, lineup.predicted_total
    ));
    for slot in &lineup.starting {
        prompt.push_str(&format!(
            "  {:>3}: {} ({} pts)\n",
            slot.position.display_str(),
            slot.web_name,
            slot.predicted_points
        ));
    }
    prompt.push_str("## BENCH (in order)\n");
    for (i, slot) in lineup.bench.iter().enumerate() {
        prompt.push_str(&format!(
            "  {}. {} {} ({} pts)\n",
            i + 1,
            slot.position.display_str(),
            slot.web_name,
            slot.predicted_points
        ));
    }
    prompt.push('\n');

    prompt.push_str(
        "## SHOULD I CHANGE ANYTHING?\n\
         Confirm or adjust the XI, the formation and the bench order, with a reason for each change.",
    );
    prompt
}

/// Transfer strategy on top of the heuristic suggestions.
pub fn build_transfer_strategy_prompt(
    squad: &SquadContext,
    suggestions: &[TransferSuggestion],
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format_header("TRANSFER STRATEGY", squad));
    prompt.push_str("## MY SQUAD\n");
    prompt.push_str(&format_squad_for_prompt(squad));
    prompt.push('\n');

    if suggestions.is_empty() {
        prompt.push_str("## MODEL SUGGESTIONS\n  (none clear the gain threshold)\n\n");
    } else {
        prompt.push_str("## MODEL SUGGESTIONS (best expected gain first)\n");
        for (i, s) in suggestions.iter().enumerate() {
            prompt.push_str(&format!(
                "  {}. {} ({}) -> {} ({}) | gain {:.1} | ppg {:.0} form {:.0} mins {:.0} fix {:.0} | bank after {}\n",
                i + 1,
                s.out_name,
                money(s.out_price),
                s.in_name,
                money(s.in_price),
                s.expected_gain,
                s.metrics.base,
                s.metrics.form,
                s.metrics.minutes,
                s.metrics.fixture,
                money(s.bank_after),
            ));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "## WHAT TRANSFERS SHOULD I MAKE?\n\
         Tell me whether to transfer this week or roll, which move to make first, \
         and any longer-term plan worth setting up.",
    );
    prompt
}

/// System prompt for free-form chat: the advisor instructions plus the squad
/// as standing context, so every turn is grounded on it.
pub fn build_chat_system_prompt(squad: &SquadContext) -> String {
    let mut prompt = system_prompt();
    prompt.push_str("\n\n");
    prompt.push_str(&format_header("CONTEXT", squad));
    prompt.push_str("## MY SQUAD\n");
    prompt.push_str(&format_squad_for_prompt(squad));
    prompt
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn money(tenths: u32) -> String {
    format!("{:.1}m", tenths as f64 / 10.0)
}

fn format_fixture(opponent: Option<&str>, is_home: Option<bool>) -> String {
    match (opponent, is_home) {
        (Some(opp), Some(true)) => format!("vs {opp} (H)"),
        (Some(opp), Some(false)) => format!("at {opp} (A)"),
        (Some(opp), None) => format!("vs {opp}"),
        (None, _) => "no fixture".to_string(),
    }
}

fn format_header(title: &str, squad: &SquadContext) -> String {
    format!(
        "## {title}\n\
         Gameweek {} | Formation {} | Squad value {} | Bank {} | {} players\n\n",
        squad.gameweek,
        squad.formation,
        money(squad.value),
        money(squad.bank),
        squad.players.len(),
    )
}

/// Format the squad grouped by position for prompt inclusion.
pub fn format_squad_for_prompt(squad: &SquadContext) -> String {
    let mut s = String::new();

    for pos in Position::ALL {
        for p in squad.players.iter().filter(|p| p.position == pos) {
            let armband = if p.is_captain {
                " (C)"
            } else if p.is_vice_captain {
                " (VC)"
            } else {
                ""
            };
            let predicted = p
                .predicted_points
                .map(|n| format!("{n} pts"))
                .unwrap_or_else(|| "-".to_string());
            s.push_str(&format!(
                "  {:>3}: {}{} [{}] {} | form {:.1} ppg {:.1} total {} | next {} -> {}\n",
                pos.display_str(),
                p.name,
                armband,
                p.club,
                money(p.price),
                p.form,
                p.points_per_game,
                p.total_points,
                format_fixture(p.opponent.as_deref(), p.is_home),
                predicted,
            ));
        }
    }

    if s.is_empty() {
        s.push_str("  [EMPTY]\n");
    }
    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use squadcast_core::scoring::{LineupSlot, TransferMetrics};
    use squadcast_core::squad::Formation;

    fn line(name: &str, position: Position) -> SquadLine {
        SquadLine {
            name: name.into(),
            club: "ARS".into(),
            position,
            price: 65,
            form: 4.5,
            points_per_game: 5.1,
            total_points: 52,
            status: "Available".into(),
            news: String::new(),
            predicted_points: Some(6),
            opponent: Some("CHE".into()),
            is_home: Some(true),
            is_captain: false,
            is_vice_captain: false,
        }
    }

    fn squad() -> SquadContext {
        let mut saka = line("Saka", Position::Midfielder);
        saka.is_captain = true;
        let mut raya = line("Raya", Position::Goalkeeper);
        raya.is_vice_captain = true;
        let mut white = line("White", Position::Defender);
        white.status = "Doubtful".into();
        white.news = "Knee injury - 75% chance of playing".into();
        SquadContext {
            gameweek: 12,
            formation: "4-4-2".into(),
            bank: 15,
            value: 995,
            players: vec![saka, raya, white],
        }
    }

    #[test]
    fn system_prompt_contains_key_rules() {
        let sp = system_prompt();
        assert!(sp.contains("2 GKP, 5 DEF, 5 MID, 3 FWD"));
        assert!(sp.contains("at most 3 players per club"));
        assert!(sp.contains("do NOT do arithmetic"));
    }

    #[test]
    fn squad_listed_back_to_front_with_armbands() {
        let s = format_squad_for_prompt(&squad());
        let gk = s.find("GKP: Raya (VC)").expect("goalkeeper line");
        let def = s.find("DEF: White").expect("defender line");
        let mid = s.find("MID: Saka (C)").expect("midfielder line");
        assert!(gk < def && def < mid);
        assert!(s.contains("[ARS] 6.5m"));
        assert!(s.contains("vs CHE (H) -> 6 pts"));
    }

    #[test]
    fn empty_squad_is_marked() {
        let mut ctx = squad();
        ctx.players.clear();
        assert_eq!(format_squad_for_prompt(&ctx), "  [EMPTY]\n");
    }

    #[test]
    fn team_analysis_prompt_has_sections_and_concerns() {
        let p = build_team_analysis_prompt(&squad());
        assert!(p.starts_with("## TEAM ANALYSIS\nGameweek 12 | Formation 4-4-2 | Squad value 99.5m | Bank 1.5m | 3 players"));
        assert!(p.contains("## MY SQUAD"));
        assert!(p.contains("## AVAILABILITY CONCERNS"));
        assert!(p.contains("White (Doubtful): Knee injury"));
        assert!(p.contains("## HOW IS MY TEAM LOOKING?"));
    }

    #[test]
    fn captain_prompt_lists_options_in_order() {
        let options = vec![
            CaptainOption {
                name: "Saka".into(),
                predicted_points: 9,
                confidence: Confidence::High,
                opponent: Some("CHE".into()),
                is_home: Some(true),
            },
            CaptainOption {
                name: "Raya".into(),
                predicted_points: 5,
                confidence: Confidence::Low,
                opponent: Some("LIV".into()),
                is_home: Some(false),
            },
        ];
        let p = build_captain_prompt(&squad(), &options);
        assert!(p.contains("1. Saka - 9 pts predicted, HIGH confidence, vs CHE (H)"));
        assert!(p.contains("2. Raya - 5 pts predicted, LOW confidence, at LIV (A)"));
        assert!(p.contains("## WHO SHOULD I CAPTAIN?"));
    }

    #[test]
    fn lineup_prompt_shows_xi_and_bench() {
        let slot = |id, name: &str, position| LineupSlot {
            player_id: id,
            web_name: name.into(),
            position,
            predicted_points: 4,
        };
        let lineup = Lineup {
            formation: Formation::new(3, 5, 2),
            starting: vec![slot(1, "Raya", Position::Goalkeeper)],
            bench: vec![slot(2, "Turner", Position::Goalkeeper)],
            predicted_total: 4,
        };
        let p = build_lineup_prompt(&squad(), &lineup);
        assert!(p.contains("## SUGGESTED XI (3-5-2, 4 pts predicted)"));
        assert!(p.contains("GKP: Raya (4 pts)"));
        assert!(p.contains("1. GKP Turner (4 pts)"));
    }

    #[test]
    fn transfer_prompt_formats_suggestions_or_notes_none() {
        let s = TransferSuggestion {
            out_id: 1,
            out_name: "White".into(),
            out_price: 55,
            in_id: 2,
            in_name: "Gabriel".into(),
            in_price: 60,
            position: Position::Defender,
            expected_gain: 7.8,
            metrics: TransferMetrics {
                base: 70.0,
                minutes: 80.0,
                fixture: 70.0,
                form: 90.0,
            },
            bank_after: 10,
        };
        let p = build_transfer_strategy_prompt(&squad(), &[s]);
        assert!(p.contains(
            "1. White (5.5m) -> Gabriel (6.0m) | gain 7.8 | ppg 70 form 90 mins 80 fix 70 | bank after 1.0m"
        ));

        let empty = build_transfer_strategy_prompt(&squad(), &[]);
        assert!(empty.contains("(none clear the gain threshold)"));
    }

    #[test]
    fn chat_system_prompt_embeds_squad() {
        let p = build_chat_system_prompt(&squad());
        assert!(p.starts_with("You are a Fantasy Premier League advisor."));
        assert!(p.contains("## CONTEXT"));
        assert!(p.contains("MID: Saka (C)"));
    }
}

// Rule-based point prediction for a single player and fixture.
//
// Four sub-scores on a 0-10 scale (form, fixture difficulty, home/away team
// strength, minutes certainty) are blended by fixed weights and scaled into a
// whole-number points estimate, together with a confidence label.

use serde::{Deserialize, Serialize};

use crate::model::{Fixture, MatchHistory, Player, PlayerStatus, TeamTable};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Value used for any sub-score whose input is missing.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Upper bound of every sub-score.
pub const MAX_SUB_SCORE: f64 = 10.0;

/// Number of most recent matches averaged for the form sub-score.
pub const FORM_WINDOW: usize = 5;

/// Team strength is divided by this to land on the 0-10 scale.
pub const STRENGTH_DIVISOR: f64 = 140.0;

/// Matches assumed played when judging a player's minutes share. This is a
/// fixed approximation and does not track how far the season has run.
pub const ASSUMED_MATCHES_PLAYED: u32 = 20;

pub const MINUTES_PER_MATCH: u32 = 90;

pub const FORM_WEIGHT: f64 = 0.4;
pub const FIXTURE_WEIGHT: f64 = 0.3;
pub const HOME_AWAY_WEIGHT: f64 = 0.1;
pub const MINUTES_WEIGHT: f64 = 0.2;

/// Multiplier from the weighted 0-10 blend to predicted points.
pub const POINTS_SCALE: f64 = 1.5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How much to trust a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

/// The four contributing sub-scores, each in [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub form: f64,
    pub fixture: f64,
    pub home_away: f64,
    pub minutes: f64,
}

/// A derived, never-persisted points forecast for one player and fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub player_id: u32,
    /// Gameweek of the fixture the prediction is for, if known.
    pub gameweek: Option<u32>,
    /// Opponent team id, if a fixture was supplied.
    pub opponent: Option<u32>,
    pub is_home: Option<bool>,
    pub predicted_points: u32,
    pub confidence: Confidence,
    pub scores: SubScores,
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, MAX_SUB_SCORE)
}

/// Form sub-score.
///
/// With a non-empty match history: mean total points over the last
/// [`FORM_WINDOW`] matches (fewer if the player has fewer). Without one: the
/// upstream recent-form average doubled. Clamped to [0, 10] either way.
pub fn form_score(player: &Player, history: Option<&[MatchHistory]>) -> f64 {
    match history {
        Some(matches) if !matches.is_empty() => {
            let start = matches.len().saturating_sub(FORM_WINDOW);
            let recent = &matches[start..];
            let total: i32 = recent.iter().map(|m| m.total_points).sum();
            clamp_score(total as f64 / recent.len() as f64)
        }
        _ => clamp_score(player.form * 2.0),
    }
}

/// Fixture-difficulty sub-score: `11 - 2 * difficulty`, neutral when no
/// fixture is known.
pub fn fixture_score(difficulty: Option<u8>) -> f64 {
    match difficulty {
        Some(d) => clamp_score(11.0 - 2.0 * d as f64),
        None => NEUTRAL_SCORE,
    }
}

/// Home/away sub-score: the relevant team strength over
/// [`STRENGTH_DIVISOR`].
///
/// Goalkeepers and defenders are judged on defensive strength, midfielders
/// and forwards on attacking strength, each for the side (home or away) the
/// player's team is on. Neutral when there is no fixture, the player's team
/// is not in it, or the team is missing from the table.
pub fn home_away_score(player: &Player, fixture: Option<&Fixture>, teams: &TeamTable) -> f64 {
    let Some(is_home) = fixture.and_then(|f| f.is_home_for(player.team)) else {
        return NEUTRAL_SCORE;
    };
    let Some(team) = teams.get(player.team) else {
        return NEUTRAL_SCORE;
    };
    let strength = team.strength_for(player.position.is_defensive(), is_home);
    clamp_score(strength as f64 / STRENGTH_DIVISOR)
}

/// Minutes-certainty sub-score.
///
/// Starts at 5. Injured or suspended players score 0 outright, as does a
/// known 0% chance of playing this round. Any other non-available status
/// costs 3. A chance under 50% costs 2, under 75% costs 1. Finally the share
/// of possible minutes (against [`ASSUMED_MATCHES_PLAYED`] full matches)
/// adds 3 above 80%, adds 1 above 60%, and costs 2 below 30%.
pub fn minutes_score(player: &Player) -> f64 {
    if matches!(
        player.status,
        PlayerStatus::Injured | PlayerStatus::Suspended
    ) {
        return 0.0;
    }
    if player.chance_of_playing_this_round == Some(0) {
        return 0.0;
    }

    let mut score = NEUTRAL_SCORE;

    if player.status != PlayerStatus::Available {
        score -= 3.0;
    }

    match player.chance_of_playing_this_round {
        Some(c) if c < 50 => score -= 2.0,
        Some(c) if c < 75 => score -= 1.0,
        _ => {}
    }

    let possible = (ASSUMED_MATCHES_PLAYED * MINUTES_PER_MATCH) as f64;
    let ratio = player.minutes as f64 / possible;
    if ratio > 0.8 {
        score += 3.0;
    } else if ratio > 0.6 {
        score += 1.0;
    } else if ratio < 0.3 {
        score -= 2.0;
    }

    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// Weighted blend scaled to points, rounded to the nearest whole point.
/// Always in [0, 15] for in-range sub-scores.
pub fn predicted_points(scores: &SubScores) -> u32 {
    let weighted = FORM_WEIGHT * scores.form
        + FIXTURE_WEIGHT * scores.fixture
        + HOME_AWAY_WEIGHT * scores.home_away
        + MINUTES_WEIGHT * scores.minutes;
    (weighted * POINTS_SCALE).round().max(0.0) as u32
}

/// HIGH needs secure minutes, decent form and a kind fixture; any one of
/// those being poor makes it LOW.
pub fn confidence(scores: &SubScores) -> Confidence {
    if scores.minutes >= 7.0 && scores.form >= 5.0 && scores.fixture >= 6.0 {
        Confidence::High
    } else if scores.minutes < 4.0 || scores.form < 3.0 || scores.fixture < 3.0 {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}

/// Predict one player's points for an optional fixture.
pub fn predict(
    player: &Player,
    fixture: Option<&Fixture>,
    teams: &TeamTable,
    history: Option<&[MatchHistory]>,
) -> Prediction {
    let scores = SubScores {
        form: form_score(player, history),
        fixture: fixture_score(fixture.and_then(|f| f.difficulty_for(player.team))),
        home_away: home_away_score(player, fixture, teams),
        minutes: minutes_score(player),
    };

    Prediction {
        player_id: player.id,
        gameweek: fixture.and_then(|f| f.event),
        opponent: fixture.and_then(|f| f.opponent_of(player.team)),
        is_home: fixture.and_then(|f| f.is_home_for(player.team)),
        predicted_points: predicted_points(&scores),
        confidence: confidence(&scores),
        scores,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::test_support::player;
    use crate::model::{Position, Team};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn history(points: &[i32]) -> Vec<MatchHistory> {
        points
            .iter()
            .enumerate()
            .map(|(i, &p)| MatchHistory {
                round: i as u32 + 1,
                total_points: p,
                minutes: 90,
                fixture: i as u32 + 1,
                was_home: i % 2 == 0,
                opponent_team: 2,
            })
            .collect()
    }

    fn team(id: u32, attack_home: u32, defence_home: u32) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            short_name: format!("T{id}"),
            strength_attack_home: attack_home,
            strength_attack_away: attack_home - 50,
            strength_defence_home: defence_home,
            strength_defence_away: defence_home - 50,
        }
    }

    fn home_fixture(home: u32, away: u32, home_difficulty: u8) -> Fixture {
        Fixture {
            id: 1,
            event: Some(8),
            team_h: home,
            team_a: away,
            team_h_difficulty: home_difficulty,
            team_a_difficulty: 3,
            finished: false,
            kickoff_time: None,
        }
    }

    // -- Form --

    #[test]
    fn form_uses_mean_of_last_five_matches() {
        let p = player(1, 1, Position::Midfielder, 80);
        // Last five are 2, 4, 6, 8, 10 -> mean 6
        let h = history(&[15, 15, 2, 4, 6, 8, 10]);
        assert!(approx_eq(form_score(&p, Some(&h)), 6.0, 1e-9));
    }

    #[test]
    fn form_from_history_is_capped_at_ten() {
        let p = player(1, 1, Position::Forward, 80);
        let h = history(&[12, 14, 20, 11, 13]);
        assert_eq!(form_score(&p, Some(&h)), 10.0);
    }

    #[test]
    fn form_from_short_history_averages_what_exists() {
        let p = player(1, 1, Position::Forward, 80);
        let h = history(&[3, 5]);
        assert!(approx_eq(form_score(&p, Some(&h)), 4.0, 1e-9));
    }

    #[test]
    fn form_never_goes_negative() {
        let p = player(1, 1, Position::Defender, 45);
        let h = history(&[-1, -2, 0, -1, -1]);
        assert_eq!(form_score(&p, Some(&h)), 0.0);
    }

    #[test]
    fn form_falls_back_to_doubled_upstream_form() {
        let mut p = player(1, 1, Position::Midfielder, 80);
        p.form = 3.5;
        assert!(approx_eq(form_score(&p, None), 7.0, 1e-9));
        assert!(approx_eq(form_score(&p, Some(&[])), 7.0, 1e-9));
        p.form = 6.2;
        assert_eq!(form_score(&p, None), 10.0);
    }

    // -- Fixture --

    #[test]
    fn fixture_score_for_every_difficulty() {
        let expected = [(1u8, 9.0), (2, 7.0), (3, 5.0), (4, 3.0), (5, 1.0)];
        for (d, want) in expected {
            assert_eq!(fixture_score(Some(d)), want, "difficulty {d}");
        }
        assert_eq!(fixture_score(None), NEUTRAL_SCORE);
        // Out-of-range ratings still clamp.
        assert_eq!(fixture_score(Some(0)), 10.0);
        assert_eq!(fixture_score(Some(6)), 0.0);
    }

    // -- Home/away --

    #[test]
    fn home_away_compares_attacking_strength_at_home() {
        let teams = TeamTable::new(&[team(1, 1200, 1100), team(2, 900, 1000)]);
        let strong = player(10, 1, Position::Midfielder, 80);
        let weak = player(11, 2, Position::Midfielder, 80);

        let strong_score = home_away_score(&strong, Some(&home_fixture(1, 3, 2)), &teams);
        let weak_score = home_away_score(&weak, Some(&home_fixture(2, 3, 2)), &teams);

        assert!(approx_eq(strong_score, 1200.0 / 140.0, 1e-9));
        assert!(approx_eq(weak_score, 900.0 / 140.0, 1e-9));
        assert!(approx_eq(strong_score, 8.57, 0.01));
        assert!(approx_eq(weak_score, 6.43, 0.01));
        assert!(strong_score > weak_score);
    }

    #[test]
    fn home_away_uses_defence_for_defenders_and_away_side() {
        let teams = TeamTable::new(&[team(1, 1200, 1260), team(2, 900, 1000)]);
        let def = player(10, 1, Position::Defender, 50);
        // Team 1 away at team 2: defence away = 1260 - 50
        let fixture = home_fixture(2, 1, 3);
        let score = home_away_score(&def, Some(&fixture), &teams);
        assert!(approx_eq(score, 1210.0 / 140.0, 1e-9));
    }

    #[test]
    fn home_away_is_neutral_without_fixture_or_team() {
        let teams = TeamTable::new(&[team(1, 1200, 1100)]);
        let p = player(10, 1, Position::Forward, 70);
        assert_eq!(home_away_score(&p, None, &teams), NEUTRAL_SCORE);

        // Fixture that does not involve the player's team.
        assert_eq!(
            home_away_score(&p, Some(&home_fixture(4, 5, 2)), &teams),
            NEUTRAL_SCORE
        );

        // Team missing from the table.
        let orphan = player(11, 7, Position::Forward, 70);
        assert_eq!(
            home_away_score(&orphan, Some(&home_fixture(7, 1, 2)), &teams),
            NEUTRAL_SCORE
        );
    }

    // -- Minutes --

    #[test]
    fn minutes_zero_for_injured_or_suspended() {
        let mut p = player(1, 1, Position::Goalkeeper, 50);
        p.minutes = 1800;
        p.status = PlayerStatus::Injured;
        assert_eq!(minutes_score(&p), 0.0);
        p.status = PlayerStatus::Suspended;
        assert_eq!(minutes_score(&p), 0.0);
    }

    #[test]
    fn minutes_rewards_regular_starters() {
        let mut p = player(1, 1, Position::Defender, 50);
        p.minutes = 1700; // 94% of 1800
        assert_eq!(minutes_score(&p), 8.0);
        p.minutes = 1200; // 67%
        assert_eq!(minutes_score(&p), 6.0);
        p.minutes = 900; // 50%
        assert_eq!(minutes_score(&p), 5.0);
        p.minutes = 300; // 17%
        assert_eq!(minutes_score(&p), 3.0);
    }

    #[test]
    fn minutes_penalises_doubtful_and_low_chance() {
        let mut p = player(1, 1, Position::Defender, 50);
        p.minutes = 1700;
        p.status = PlayerStatus::Doubtful;
        p.chance_of_playing_this_round = Some(50);
        // 5 - 3 (doubtful) - 1 (<75%) + 3 (minutes)
        assert_eq!(minutes_score(&p), 4.0);

        p.chance_of_playing_this_round = Some(25);
        // 5 - 3 - 2 + 3
        assert_eq!(minutes_score(&p), 3.0);

        p.chance_of_playing_this_round = Some(75);
        // 5 - 3 + 3
        assert_eq!(minutes_score(&p), 5.0);
    }

    #[test]
    fn minutes_zero_chance_scores_zero() {
        let mut p = player(1, 1, Position::Defender, 50);
        p.status = PlayerStatus::Doubtful;
        p.chance_of_playing_this_round = Some(0);
        p.minutes = 100;
        assert_eq!(minutes_score(&p), 0.0);
    }

    #[test]
    fn minutes_zero_chance_ignores_heavy_minutes() {
        let mut p = player(1, 1, Position::Defender, 50);
        p.chance_of_playing_this_round = Some(0);
        p.minutes = 1700;
        assert_eq!(minutes_score(&p), 0.0);
    }

    // -- Combination --

    #[test]
    fn predicted_points_matches_weighted_formula() {
        let scores = SubScores {
            form: 6.0,
            fixture: 7.0,
            home_away: 8.0,
            minutes: 8.0,
        };
        // 0.4*6 + 0.3*7 + 0.1*8 + 0.2*8 = 6.9 -> *1.5 = 10.35 -> 10
        assert_eq!(predicted_points(&scores), 10);
    }

    #[test]
    fn predicted_points_stays_within_zero_to_fifteen() {
        let steps = [0.0, 2.5, 5.0, 7.5, 10.0];
        for &form in &steps {
            for &fixture in &steps {
                for &home_away in &steps {
                    for &minutes in &steps {
                        let s = SubScores {
                            form,
                            fixture,
                            home_away,
                            minutes,
                        };
                        let pts = predicted_points(&s);
                        let expected = (1.5
                            * (0.4 * form + 0.3 * fixture + 0.1 * home_away + 0.2 * minutes))
                            .round() as u32;
                        assert_eq!(pts, expected);
                        assert!(pts <= 15);
                    }
                }
            }
        }
    }

    #[test]
    fn confidence_thresholds() {
        let s = |minutes, form, fixture| SubScores {
            form,
            fixture,
            home_away: 5.0,
            minutes,
        };
        assert_eq!(confidence(&s(8.0, 6.0, 7.0)), Confidence::High);
        assert_eq!(confidence(&s(2.0, 6.0, 7.0)), Confidence::Low);
        assert_eq!(confidence(&s(8.0, 2.9, 7.0)), Confidence::Low);
        assert_eq!(confidence(&s(8.0, 6.0, 1.0)), Confidence::Low);
        assert_eq!(confidence(&s(6.0, 6.0, 7.0)), Confidence::Medium);
        assert_eq!(confidence(&s(7.0, 5.0, 5.0)), Confidence::Medium);
        assert_eq!(confidence(&s(7.0, 5.0, 6.0)), Confidence::High);
    }

    // -- End to end --

    #[test]
    fn injured_goalkeeper_is_low_regardless_of_form_and_fixture() {
        let teams = TeamTable::new(&[team(1, 1300, 1350), team(2, 900, 900)]);
        let mut gk = player(1, 1, Position::Goalkeeper, 55);
        gk.status = PlayerStatus::Injured;
        gk.form = 9.0;
        gk.minutes = 1800;

        let fixture = home_fixture(1, 2, 1);
        let pred = predict(&gk, Some(&fixture), &teams, Some(&history(&[10, 10, 10, 10, 10])));

        assert_eq!(pred.scores.minutes, 0.0);
        assert_eq!(pred.confidence, Confidence::Low);
        // Best case without minutes: 1.5 * (4 + 2.7 + 0.96) -> 11, against
        // 14 for the same player fit.
        let mut fit = gk.clone();
        fit.status = PlayerStatus::Available;
        let fit_pred = predict(&fit, Some(&fixture), &teams, Some(&history(&[10, 10, 10, 10, 10])));
        assert!(pred.predicted_points + 2 <= fit_pred.predicted_points);
    }

    #[test]
    fn predict_without_fixture_uses_neutral_values() {
        let teams = TeamTable::default();
        let mut p = player(3, 1, Position::Forward, 75);
        p.form = 2.5;
        p.minutes = 900;
        let pred = predict(&p, None, &teams, None);
        assert_eq!(pred.gameweek, None);
        assert_eq!(pred.opponent, None);
        assert_eq!(pred.scores.fixture, NEUTRAL_SCORE);
        assert_eq!(pred.scores.home_away, NEUTRAL_SCORE);
        // 0.4*5 + 0.3*5 + 0.1*5 + 0.2*5 = 5 -> 7.5 -> 8
        assert_eq!(pred.predicted_points, 8);
        assert_eq!(pred.confidence, Confidence::Medium);
    }

    #[test]
    fn predict_records_fixture_context() {
        let teams = TeamTable::new(&[team(1, 1200, 1100), team(2, 900, 1000)]);
        let p = player(3, 2, Position::Forward, 75);
        let pred = predict(&p, Some(&home_fixture(1, 2, 2)), &teams, None);
        assert_eq!(pred.gameweek, Some(8));
        assert_eq!(pred.opponent, Some(1));
        assert_eq!(pred.is_home, Some(false));
        assert_eq!(pred.scores.fixture, 5.0); // away difficulty 3
    }
}

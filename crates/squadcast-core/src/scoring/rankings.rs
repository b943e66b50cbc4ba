// Derived views over predictions: fixture lookahead, captain ranking,
// differentials and squad totals.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::prediction::{predict, Prediction};
use crate::model::{Fixture, MatchHistory, Player, TeamTable};

/// Default ownership ceiling (percent) for a differential pick.
pub const DEFAULT_DIFFERENTIAL_OWNERSHIP: f64 = 10.0;

const DIFFERENTIAL_POINTS_WEIGHT: f64 = 0.7;
const DIFFERENTIAL_RARITY_WEIGHT: f64 = 0.3;

// ---------------------------------------------------------------------------
// Fixture lookahead
// ---------------------------------------------------------------------------

/// Unfinished, scheduled fixtures for `team_id` from gameweek `from_gameweek`
/// onward, ordered by gameweek then kickoff, capped at `limit`.
pub fn upcoming_fixtures<'a>(
    team_id: u32,
    fixtures: &'a [Fixture],
    from_gameweek: u32,
    limit: usize,
) -> Vec<&'a Fixture> {
    let mut upcoming: Vec<&Fixture> = fixtures
        .iter()
        .filter(|f| !f.finished && f.involves(team_id))
        .filter(|f| f.event.is_some_and(|gw| gw >= from_gameweek))
        .collect();

    upcoming.sort_by(|a, b| {
        a.event
            .cmp(&b.event)
            .then_with(|| a.kickoff_time.cmp(&b.kickoff_time))
            .then_with(|| a.id.cmp(&b.id))
    });
    upcoming.truncate(limit);
    upcoming
}

/// The next fixture for `team_id` at or after `from_gameweek`, if any.
pub fn next_fixture(team_id: u32, fixtures: &[Fixture], from_gameweek: u32) -> Option<&Fixture> {
    upcoming_fixtures(team_id, fixtures, from_gameweek, 1)
        .into_iter()
        .next()
}

// ---------------------------------------------------------------------------
// Multi-gameweek prediction
// ---------------------------------------------------------------------------

/// One prediction per each of the player's next `horizon` fixtures.
///
/// A blank run (no scheduled fixtures) yields an empty list rather than a
/// neutral guess, so callers can show the blank.
pub fn predict_horizon(
    player: &Player,
    fixtures: &[Fixture],
    teams: &TeamTable,
    history: Option<&[MatchHistory]>,
    from_gameweek: u32,
    horizon: usize,
) -> Vec<Prediction> {
    upcoming_fixtures(player.team, fixtures, from_gameweek, horizon)
        .into_iter()
        .map(|f| predict(player, Some(f), teams, history))
        .collect()
}

/// Predictions for every player against their next fixture.
pub fn predict_next_round(
    players: &[&Player],
    fixtures: &[Fixture],
    teams: &TeamTable,
    gameweek: u32,
) -> Vec<Prediction> {
    players
        .iter()
        .map(|p| predict(p, next_fixture(p.team, fixtures, gameweek), teams, None))
        .collect()
}

// ---------------------------------------------------------------------------
// Captain ranking
// ---------------------------------------------------------------------------

/// Sort predictions best-first for captaincy.
///
/// Ties on predicted points fall back to the form sub-score, then to the
/// lower player id so the ordering is stable across calls.
pub fn rank_captains(mut predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions.sort_by(|a, b| {
        b.predicted_points
            .cmp(&a.predicted_points)
            .then_with(|| {
                b.scores
                    .form
                    .partial_cmp(&a.scores.form)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    predictions
}

// ---------------------------------------------------------------------------
// Differentials
// ---------------------------------------------------------------------------

/// A low-ownership player ranked for rank-climbing potential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialPick {
    pub player_id: u32,
    pub ownership: f64,
    pub predicted_points: u32,
    /// `max(0, 100 - ownership)`.
    pub differential_score: f64,
    /// `0.7 * points + 0.3 * differential_score`.
    pub rank_score: f64,
    pub prediction: Prediction,
}

/// Keep players owned by at most `max_ownership` percent and rank them by a
/// blend of predicted points and rarity.
pub fn rank_differentials(
    players: &[Player],
    predictions: &[Prediction],
    max_ownership: f64,
) -> Vec<DifferentialPick> {
    let mut picks: Vec<DifferentialPick> = predictions
        .iter()
        .filter_map(|pred| {
            let player = players.iter().find(|p| p.id == pred.player_id)?;
            let ownership = player.selected_by_percent;
            if ownership > max_ownership {
                return None;
            }
            let differential_score = (100.0 - ownership).max(0.0);
            let rank_score = DIFFERENTIAL_POINTS_WEIGHT * pred.predicted_points as f64
                + DIFFERENTIAL_RARITY_WEIGHT * differential_score;
            Some(DifferentialPick {
                player_id: pred.player_id,
                ownership,
                predicted_points: pred.predicted_points,
                differential_score,
                rank_score,
                prediction: pred.clone(),
            })
        })
        .collect();

    picks.sort_by(|a, b| {
        b.rank_score
            .partial_cmp(&a.rank_score)
            .unwrap_or(Ordering::Equal)
    });
    picks
}

// ---------------------------------------------------------------------------
// Team total
// ---------------------------------------------------------------------------

/// Sum of predicted points, with the captain's prediction counted twice.
pub fn team_total(predictions: &[Prediction], captain: Option<u32>) -> u32 {
    predictions
        .iter()
        .map(|p| {
            if Some(p.player_id) == captain {
                p.predicted_points * 2
            } else {
                p.predicted_points
            }
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Heuristic transfer suggestions.
//
// For each rostered player, enumerate affordable same-position replacements
// that keep the squad legal, score each out/in pair on a 0-100 scale per
// metric, and keep the best few pairs overall.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::prediction::fixture_score;
use super::rankings::next_fixture;
use crate::model::{Fixture, Player, PlayerStatus, Position};
use crate::squad::MAX_PER_CLUB;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Candidates considered per outgoing player, in pool order.
pub const MAX_CANDIDATES_PER_PLAYER: usize = 100;

/// Suggestions returned overall (not per position).
pub const MAX_SUGGESTIONS: usize = 9;

/// Pairs must beat this expected gain to be suggested.
pub const MIN_EXPECTED_GAIN: f64 = 5.0;

/// Fixture metric used when no fixture signal is wired in.
pub const CONSTANT_FIXTURE_SCORE: f64 = 70.0;

const MINUTES_SCORE_AVAILABLE: f64 = 80.0;
const MINUTES_SCORE_DOUBTFUL: f64 = 40.0;

const BASE_WEIGHT: f64 = 0.3;
const MINUTES_WEIGHT: f64 = 0.2;
const FIXTURE_WEIGHT: f64 = 0.2;
const FORM_WEIGHT: f64 = 0.3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the fixture metric comes from.
#[derive(Debug, Clone, Copy)]
pub enum FixtureSignal<'a> {
    /// Every candidate gets [`CONSTANT_FIXTURE_SCORE`].
    Constant,
    /// Ten times the incoming player's next-fixture difficulty score.
    NextFixture {
        fixtures: &'a [Fixture],
        gameweek: u32,
    },
}

/// The four display metrics behind a suggestion, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferMetrics {
    /// Points-per-game delta, centred on 50.
    pub base: f64,
    pub minutes: f64,
    pub fixture: f64,
    /// Recent-form delta, centred on 50.
    pub form: f64,
}

/// One recommended swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    pub out_id: u32,
    pub out_name: String,
    pub out_price: u32,
    pub in_id: u32,
    pub in_name: String,
    pub in_price: u32,
    pub position: Position,
    pub expected_gain: f64,
    pub metrics: TransferMetrics,
    /// Money left in the bank if the swap is made.
    pub bank_after: u32,
}

// ---------------------------------------------------------------------------
// Candidate generation
// ---------------------------------------------------------------------------

fn club_counts(squad: &[Player]) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for p in squad {
        *counts.entry(p.team).or_insert(0) += 1;
    }
    counts
}

/// Legal, affordable, fit replacements for `outgoing`, in pool order, capped
/// at [`MAX_CANDIDATES_PER_PLAYER`].
///
/// A candidate from the outgoing player's own club is always allowed since
/// the club count does not change.
pub fn candidates_for<'a>(
    outgoing: &Player,
    squad: &[Player],
    pool: &'a [Player],
    bank: u32,
) -> Vec<&'a Player> {
    let budget = bank + outgoing.price;
    let counts = club_counts(squad);

    pool.iter()
        .filter(|c| c.position == outgoing.position)
        .filter(|c| !squad.iter().any(|s| s.id == c.id))
        .filter(|c| c.price <= budget)
        .filter(|c| {
            c.team == outgoing.team || counts.get(&c.team).copied().unwrap_or(0) < MAX_PER_CLUB
        })
        .filter(|c| c.is_selectable())
        .take(MAX_CANDIDATES_PER_PLAYER)
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

fn fixture_metric(incoming: &Player, signal: &FixtureSignal<'_>) -> f64 {
    match signal {
        FixtureSignal::Constant => CONSTANT_FIXTURE_SCORE,
        FixtureSignal::NextFixture { fixtures, gameweek } => {
            let difficulty = next_fixture(incoming.team, fixtures, *gameweek)
                .and_then(|f| f.difficulty_for(incoming.team));
            fixture_score(difficulty) * 10.0
        }
    }
}

/// Score a single out/in pair.
pub fn score_pair(
    outgoing: &Player,
    incoming: &Player,
    signal: &FixtureSignal<'_>,
) -> (f64, TransferMetrics) {
    let base = (50.0 + 10.0 * (incoming.points_per_game - outgoing.points_per_game))
        .clamp(0.0, 100.0);
    let minutes = if incoming.status == PlayerStatus::Available {
        MINUTES_SCORE_AVAILABLE
    } else {
        MINUTES_SCORE_DOUBTFUL
    };
    let fixture = fixture_metric(incoming, signal);
    let form = (50.0 + 20.0 * (incoming.form - outgoing.form)).clamp(0.0, 100.0);

    let expected_gain = (BASE_WEIGHT * base
        + MINUTES_WEIGHT * minutes
        + FIXTURE_WEIGHT * fixture
        + FORM_WEIGHT * form)
        / 10.0;

    (
        expected_gain,
        TransferMetrics {
            base,
            minutes,
            fixture,
            form,
        },
    )
}

/// Rank out/in pairs for the whole squad.
///
/// Pairs with an expected gain at or below [`MIN_EXPECTED_GAIN`] are dropped;
/// the rest are sorted best-first and cut to [`MAX_SUGGESTIONS`].
pub fn suggest_transfers(
    squad: &[Player],
    pool: &[Player],
    bank: u32,
    signal: &FixtureSignal<'_>,
) -> Vec<TransferSuggestion> {
    let mut suggestions = Vec::new();

    for outgoing in squad {
        for incoming in candidates_for(outgoing, squad, pool, bank) {
            let (expected_gain, metrics) = score_pair(outgoing, incoming, signal);
            if expected_gain <= MIN_EXPECTED_GAIN {
                continue;
            }
            suggestions.push(TransferSuggestion {
                out_id: outgoing.id,
                out_name: outgoing.web_name.clone(),
                out_price: outgoing.price,
                in_id: incoming.id,
                in_name: incoming.web_name.clone(),
                in_price: incoming.price,
                position: outgoing.position,
                expected_gain,
                metrics,
                bank_after: bank + outgoing.price - incoming.price,
            });
        }
    }

    // Stable sort keeps pool order among equal gains.
    suggestions.sort_by(|a, b| {
        b.expected_gain
            .partial_cmp(&a.expected_gain)
            .unwrap_or(Ordering::Equal)
    });
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Starting eleven selection from squad predictions.

use serde::{Deserialize, Serialize};

use super::prediction::Prediction;
use super::rankings::team_total;
use crate::model::Position;
use crate::squad::{Formation, SquadMember};

/// One squad member placed in the lineup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub player_id: u32,
    pub web_name: String,
    pub position: Position,
    pub predicted_points: u32,
}

/// A starting eleven and bench for a formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub formation: Formation,
    /// Starters back to front.
    pub starting: Vec<LineupSlot>,
    /// Substitutes, goalkeeper first, then by predicted points.
    pub bench: Vec<LineupSlot>,
    /// Predicted points of the starters, captain counted twice when starting.
    pub predicted_total: u32,
}

/// Pick the best eleven for `formation` by predicted points.
///
/// Members without a prediction count as zero points. A position short of
/// players starts everyone it has.
pub fn pick_lineup(
    members: &[SquadMember],
    formation: Formation,
    predictions: &[Prediction],
    captain: Option<u32>,
) -> Lineup {
    let points_for = |id: u32| {
        predictions
            .iter()
            .find(|p| p.player_id == id)
            .map(|p| p.predicted_points)
            .unwrap_or(0)
    };

    let mut starting = Vec::new();
    let mut bench = Vec::new();

    for pos in Position::ALL {
        let mut group: Vec<LineupSlot> = members
            .iter()
            .filter(|m| m.position == pos)
            .map(|m| LineupSlot {
                player_id: m.id,
                web_name: m.web_name.clone(),
                position: m.position,
                predicted_points: points_for(m.id),
            })
            .collect();
        // Stable: squad order breaks ties.
        group.sort_by(|a, b| b.predicted_points.cmp(&a.predicted_points));

        let take = formation.starters(pos).min(group.len());
        bench.extend(group.split_off(take));
        starting.extend(group);
    }

    // Goalkeepers stay first on the bench; outfielders follow by points.
    bench.sort_by(|a, b| {
        (b.position == Position::Goalkeeper)
            .cmp(&(a.position == Position::Goalkeeper))
            .then_with(|| b.predicted_points.cmp(&a.predicted_points))
    });

    let starter_predictions: Vec<Prediction> = predictions
        .iter()
        .filter(|p| starting.iter().any(|s| s.player_id == p.player_id))
        .cloned()
        .collect();
    let predicted_total = team_total(&starter_predictions, captain);

    Lineup {
        formation,
        starting,
        bench,
        predicted_total,
    }
}

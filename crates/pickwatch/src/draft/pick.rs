// Individual pick representation and round arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::player::Position;
use crate::provider::RawPick;

/// A single recorded draft pick.
///
/// Owned by the sync engine's append-only ledger: once stored a pick is never
/// mutated or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Overall pick number (1-indexed, strictly increasing).
    pub pick_number: u32,
    pub player_id: String,
    /// Roster that made the pick, if the provider reported one.
    pub roster_id: Option<u32>,
    /// User that made the pick (`picked_by`), if reported.
    pub owner_id: Option<String>,
    /// Display name from the pick metadata, if present.
    pub player_name: Option<String>,
    /// Normalized position from the pick metadata. `None` when the provider
    /// omitted the field.
    pub position: Option<Position>,
    pub recorded_at: DateTime<Utc>,
}

impl Pick {
    /// Build a ledger entry from a provider pick.
    pub fn from_raw(raw: &RawPick) -> Self {
        let meta = &raw.metadata;
        let player_name = match (meta.first_name.as_deref(), meta.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() || !last.is_empty() => {
                Some(format!("{first} {last}").trim().to_string())
            }
            _ => None,
        };
        let position = meta
            .position
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Position::normalize);
        let owner_id = raw.picked_by.clone().filter(|s| !s.is_empty());

        Pick {
            pick_number: raw.pick_no,
            player_id: raw.player_id.clone(),
            roster_id: raw.roster_id,
            owner_id,
            player_name,
            position,
            recorded_at: Utc::now(),
        }
    }

    /// Round implied by the pick number.
    pub fn round(&self, team_count: u32) -> u32 {
        round_for_pick(self.pick_number, team_count)
    }
}

/// Round containing the given 1-based overall pick number.
pub fn round_for_pick(pick_number: u32, team_count: u32) -> u32 {
    if team_count == 0 || pick_number == 0 {
        return 1;
    }
    (pick_number - 1) / team_count + 1
}

/// Round currently on the clock after `picks_made` picks have been recorded.
pub fn current_round(picks_made: usize, team_count: u32) -> u32 {
    if team_count == 0 {
        return 1;
    }
    picks_made as u32 / team_count + 1
}

/// Expected overall pick for a draft slot in a snake draft.
pub fn snake_overall_pick(round: u32, team_count: u32, draft_position: u32) -> u32 {
    let pick_in_round = if round % 2 == 1 {
        draft_position
    } else {
        team_count - draft_position + 1
    };
    (round - 1) * team_count + pick_in_round
}

// Draft state: status, draft order and turn detection.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::roster::TrackedOwner;
use crate::provider::DraftMetadata;

/// Lifecycle of the external draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    PreDraft,
    Drafting,
    Paused,
    Complete,
}

impl DraftStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "drafting" | "in_progress" => DraftStatus::Drafting,
            "paused" => DraftStatus::Paused,
            "complete" | "completed" => DraftStatus::Complete,
            _ => DraftStatus::PreDraft,
        }
    }
}

/// How much to trust `DraftState::is_user_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSource {
    /// Derived from the provider's draft order and a known tracked slot.
    Authoritative,
    /// Modulo approximation from a bare roster ID.
    Estimated,
    /// Tracked participant unidentified; turn detection is off.
    Unknown,
}

// ---------------------------------------------------------------------------
// Draft order
// ---------------------------------------------------------------------------

/// Pick-by-pick ownership derived from draft metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub team_count: u32,
    pub rounds: u32,
    pub snake: bool,
    /// Round from which a snake draft repeats the previous round's direction.
    pub reversal_round: u32,
    /// Index `slot - 1` -> roster ID, when the provider published it.
    pub slot_rosters: Vec<Option<u32>>,
}

impl DraftOrder {
    pub fn from_metadata(meta: &DraftMetadata) -> Self {
        let team_count = meta.settings.teams;
        let mut slot_rosters = vec![None; team_count as usize];
        if let Some(map) = &meta.slot_to_roster_id {
            for (slot, &roster) in map {
                match slot.parse::<usize>() {
                    Ok(s) if s >= 1 && s <= slot_rosters.len() => slot_rosters[s - 1] = Some(roster),
                    _ => warn!("Ignoring out-of-range draft slot '{}'", slot),
                }
            }
        }
        DraftOrder {
            team_count,
            rounds: meta.settings.rounds,
            snake: !meta.draft_type.eq_ignore_ascii_case("linear"),
            reversal_round: meta.settings.reversal_round,
            slot_rosters,
        }
    }

    pub fn total_picks(&self) -> u32 {
        self.team_count * self.rounds
    }

    /// 1-based draft slot on the clock for the 0-based pick index.
    pub fn slot_for_pick(&self, pick_index: u32) -> Option<u32> {
        if self.team_count == 0 {
            return None;
        }
        let round = pick_index / self.team_count + 1;
        let within = pick_index % self.team_count;
        let reversed = self.snake && self.is_reversed_round(round);
        Some(if reversed {
            self.team_count - within
        } else {
            within + 1
        })
    }

    /// Whether picks in `round` run from the last slot to the first.
    fn is_reversed_round(&self, round: u32) -> bool {
        let even = round % 2 == 0;
        if self.reversal_round > 1 && round >= self.reversal_round {
            // From the reversal round on, the parity flips once.
            !even
        } else {
            even
        }
    }

    /// Roster ID on the clock for the 0-based pick index.
    pub fn roster_for_pick(&self, pick_index: u32) -> Option<u32> {
        let slot = self.slot_for_pick(pick_index)?;
        self.slot_rosters.get(slot as usize - 1).copied().flatten()
    }

    /// Reverse lookup: the slot a roster drafts from.
    pub fn slot_of_roster(&self, roster_id: u32) -> Option<u32> {
        self.slot_rosters
            .iter()
            .position(|r| *r == Some(roster_id))
            .map(|i| i as u32 + 1)
    }
}

// ---------------------------------------------------------------------------
// DraftState
// ---------------------------------------------------------------------------

/// Locally held draft state, mutated only by the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftState {
    pub draft_id: String,
    pub league_id: Option<String>,
    pub status: DraftStatus,
    pub team_count: u32,
    pub order: DraftOrder,
    pub owner: TrackedOwner,
    /// The tracked participant's draft slot, when known.
    pub tracked_slot: Option<u32>,
    pub is_user_turn: bool,
    pub turn_source: TurnSource,
}

impl DraftState {
    pub fn new(meta: &DraftMetadata, owner: TrackedOwner, tracked_slot: Option<u32>) -> Self {
        let order = DraftOrder::from_metadata(meta);
        let tracked_slot = tracked_slot.or_else(|| owner.roster_id.and_then(|r| order.slot_of_roster(r)));
        let turn_source = if tracked_slot.is_some() {
            TurnSource::Authoritative
        } else if owner.roster_id.is_some() {
            TurnSource::Estimated
        } else {
            TurnSource::Unknown
        };
        DraftState {
            draft_id: meta.draft_id.clone(),
            league_id: meta.league_id.clone(),
            status: DraftStatus::parse(&meta.status),
            team_count: meta.settings.teams,
            order,
            owner,
            tracked_slot,
            is_user_turn: false,
            turn_source,
        }
    }

    /// Refresh status and order from new metadata, keeping identity fields.
    pub fn apply_metadata(&mut self, meta: &DraftMetadata) {
        self.status = DraftStatus::parse(&meta.status);
        if meta.settings.teams > 0 {
            self.team_count = meta.settings.teams;
            self.order = DraftOrder::from_metadata(meta);
        }
        if self.tracked_slot.is_some() {
            return;
        }
        let by_user = self
            .owner
            .user_id
            .as_ref()
            .and_then(|uid| meta.draft_order.as_ref()?.get(uid).copied())
            .filter(|&s| s >= 1 && s <= self.team_count);
        let slot = by_user.or_else(|| self.owner.roster_id.and_then(|r| self.order.slot_of_roster(r)));
        if let Some(slot) = slot {
            if self.owner.roster_id.is_none() {
                self.owner.roster_id = self.order.slot_rosters.get(slot as usize - 1).copied().flatten();
            }
            info!("Draft order published; tracking slot {}", slot);
            self.tracked_slot = Some(slot);
            self.turn_source = TurnSource::Authoritative;
        }
    }

    /// Whether the tracked participant is on the clock after `picks_made`
    /// picks. Only meaningful while drafting.
    pub fn compute_user_turn(&self, picks_made: usize) -> bool {
        if self.status != DraftStatus::Drafting {
            return false;
        }
        let index = picks_made as u32;
        if self.order.total_picks() > 0 && index >= self.order.total_picks() {
            return false;
        }
        match self.turn_source {
            TurnSource::Authoritative => {
                self.tracked_slot.is_some() && self.order.slot_for_pick(index) == self.tracked_slot
            }
            TurnSource::Estimated => match (self.owner.roster_id, self.team_count) {
                // Last-resort approximation; does not model snake order.
                (Some(roster), teams) if teams > 0 => (index + 1) % teams == roster % teams,
                _ => false,
            },
            TurnSource::Unknown => false,
        }
    }

    pub fn is_turn_estimated(&self) -> bool {
        self.turn_source != TurnSource::Authoritative
    }
}

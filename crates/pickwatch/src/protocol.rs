// Message types exchanged between the draft session and its presenter.
//
// The session never touches presentation state: it emits `DraftEvent`s on an
// mpsc channel and receives `UserCommand`s on another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::pick::Pick;
use crate::draft::player::{Player, Position};
use crate::plan::DraftPlan;
use crate::queue::MoveDirection;
use crate::recommend::{PickAnalysis, RecommendationSet};
use crate::timer::ClockAlert;
use crate::valuation::scarcity::ScarcitySnapshot;

// ---------------------------------------------------------------------------
// Session -> presenter
// ---------------------------------------------------------------------------

/// One processed pick with whatever the catalog knows about the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickProcessed {
    pub pick: Pick,
    pub player: Option<Player>,
    pub analysis: PickAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DraftEvent {
    /// Every new pick from one sync tick, in pick order. Sent once per tick.
    PicksProcessed(Vec<PickProcessed>),
    TurnChanged { is_user_turn: bool, estimated: bool },
    ScarcityUpdated(BTreeMap<Position, ScarcitySnapshot>),
    TimerTick { remaining_seconds: u32 },
    TimerAlert(ClockAlert),
    /// The pick clock ran out. Carries the queue head as an advisory auto-pick.
    TimerExpired { auto_pick: Option<Player> },
    RecommendationsReady(RecommendationSet),
    PanicDismissed,
    QueueChanged(Vec<Player>),
    PlanUpdated(DraftPlan),
    /// Only raised on the manual-refresh path; poll failures are just logged.
    SyncError { message: String },
    DraftCompleted { total_picks: usize },
}

// ---------------------------------------------------------------------------
// Presenter -> session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserCommand {
    /// Enter panic mode now, without waiting for the turn.
    Panic,
    DismissPanic,
    Refresh,
    Enqueue(String),
    Dequeue(String),
    Reorder(String, MoveDirection),
    /// Start the pick clock; `None` uses the configured duration.
    StartClock(Option<u32>),
    ClearClock,
    /// Plan edits: `(round, player id)`.
    PlanTarget(u32, String),
    PlanBackup(u32, String),
    Unplan(u32, String),
    RegeneratePlan,
    /// Re-send the current plan.
    ShowPlan,
    Quit,
}

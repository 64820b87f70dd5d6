// Sync engine: follows the provider's authoritative pick list.
//
// Each tick fetches draft metadata and the full pick list, appends only the
// entries past the local cursor, updates scarcity over that delta, and works
// out whether the tracked participant is now on the clock. Earlier entries
// are never re-validated, so a manual refresh racing a background poll is
// harmless.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::PlayerCatalog;
use crate::config::SessionSettings;
use crate::draft::pick::{current_round, Pick};
use crate::draft::roster::{resolve_position, roster_composition, RosterComposition, TrackedOwner};
use crate::draft::state::{DraftState, DraftStatus, TurnSource};
use crate::draft::player::Position;
use crate::provider::{DraftDataProvider, DraftMetadata, ProviderError, RawUser};
use crate::valuation::scarcity::PositionScarcity;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    /// Bad draft or league id. Fatal for the session.
    #[error("draft not found: {0}")]
    DraftNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("persistence error: {0}")]
    Store(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Tick results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTransition {
    TurnStart,
    TurnEnd,
}

#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Picks appended this tick, in pick order.
    pub new_picks: Vec<Pick>,
    pub transition: Option<TurnTransition>,
    /// Set on the tick that first observed the draft finishing.
    pub completed: bool,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.new_picks.is_empty() && self.transition.is_none() && !self.completed
    }
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

pub struct SyncEngine {
    provider: Box<dyn DraftDataProvider>,
    state: DraftState,
    picks: Vec<Pick>,
    drafted: HashSet<String>,
    scarcity: PositionScarcity,
    running: bool,
    completed: bool,
    refresh_timeout: Duration,
}

impl SyncEngine {
    /// Resolve the draft and the tracked participant.
    ///
    /// A bad draft id, or a league without drafts, is `DraftNotFound`.
    pub async fn connect(
        provider: Box<dyn DraftDataProvider>,
        settings: &SessionSettings,
    ) -> Result<Self, SessionError> {
        let meta = resolve_draft(provider.as_ref(), settings).await?;
        let league_id = meta.league_id.clone().or_else(|| settings.league_id.clone());
        info!(
            "Following draft {} ({} teams, {} rounds, status {})",
            meta.draft_id, meta.settings.teams, meta.settings.rounds, meta.status
        );

        let (owner, slot) =
            resolve_tracked(provider.as_ref(), &meta, league_id.as_deref(), settings).await;
        let state = DraftState::new(&meta, owner, slot);
        match state.turn_source {
            TurnSource::Authoritative => info!(
                "Tracking slot {:?} (roster {:?})",
                state.tracked_slot, state.owner.roster_id
            ),
            TurnSource::Estimated => warn!(
                "No draft slot for roster {:?}; turn detection is an estimate",
                state.owner.roster_id
            ),
            TurnSource::Unknown => warn!(
                "Tracked participant not identified; turn detection disabled and roster needs estimated"
            ),
        }

        Ok(SyncEngine {
            provider,
            state,
            picks: Vec::new(),
            drafted: HashSet::new(),
            scarcity: PositionScarcity::new(),
            running: false,
            completed: false,
            refresh_timeout: settings.refresh_timeout,
        })
    }

    /// Begin polling. Returns false once the draft is complete.
    pub fn start(&mut self) -> bool {
        if self.completed {
            return false;
        }
        if !self.running {
            info!("Sync started for draft {}", self.state.draft_id);
        }
        self.running = true;
        true
    }

    /// Halt polling. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running {
            info!("Sync stopped for draft {}", self.state.draft_id);
        }
        self.running = false;
    }

    /// One background poll. Failures are logged and retried next cycle.
    pub async fn poll(&mut self, catalog: &PlayerCatalog) -> Option<TickOutcome> {
        match self.poll_once(catalog).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Poll failed, retrying next cycle: {}", e);
                None
            }
        }
    }

    /// Out-of-band fetch bounded by the refresh timeout. Errors surface.
    pub async fn refresh(&mut self, catalog: &PlayerCatalog) -> Result<TickOutcome, ProviderError> {
        let limit = self.refresh_timeout;
        match tokio::time::timeout(limit, self.poll_once(catalog)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::transient(format!(
                "refresh timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }

    /// Fetch, merge past the cursor and recompute the turn.
    pub async fn poll_once(&mut self, catalog: &PlayerCatalog) -> Result<TickOutcome, ProviderError> {
        let draft_id = self.state.draft_id.clone();
        let meta = self.provider.draft(&draft_id).await?;
        let mut remote = self.provider.draft_picks(&draft_id).await?;
        remote.sort_by_key(|p| p.pick_no);

        self.state.apply_metadata(&meta);

        let mut outcome = TickOutcome::default();
        if remote.len() < self.picks.len() {
            warn!(
                "Provider returned {} picks but {} are already recorded; ignoring",
                remote.len(),
                self.picks.len()
            );
        } else if remote.len() > self.picks.len() {
            let delta: Vec<Pick> = remote[self.picks.len()..].iter().map(Pick::from_raw).collect();
            for pick in &delta {
                let position = resolve_position(pick, catalog).unwrap_or(Position::Unknown);
                self.scarcity.record(position);
                self.drafted.insert(pick.player_id.clone());
            }
            debug!(
                "Appended {} picks ({} -> {})",
                delta.len(),
                self.picks.len(),
                self.picks.len() + delta.len()
            );
            self.picks.extend(delta.iter().cloned());
            outcome.new_picks = delta;
        }

        let was_turn = self.state.is_user_turn;
        let is_turn = self.state.compute_user_turn(self.picks.len());
        self.state.is_user_turn = is_turn;
        outcome.transition = match (was_turn, is_turn) {
            (false, true) => Some(TurnTransition::TurnStart),
            (true, false) => Some(TurnTransition::TurnEnd),
            _ => None,
        };

        let total = self.state.order.total_picks() as usize;
        let finished = self.state.status == DraftStatus::Complete
            || (total > 0 && self.picks.len() >= total);
        if finished && !self.completed {
            info!("Draft {} complete after {} picks", draft_id, self.picks.len());
            self.completed = true;
            self.running = false;
            outcome.completed = true;
        }

        Ok(outcome)
    }

    pub fn provider(&self) -> &dyn DraftDataProvider {
        self.provider.as_ref()
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// The append-only pick ledger.
    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn drafted_ids(&self) -> &HashSet<String> {
        &self.drafted
    }

    pub fn scarcity(&self) -> &PositionScarcity {
        &self.scarcity
    }

    pub fn roster(&self, catalog: &PlayerCatalog) -> RosterComposition {
        roster_composition(&self.picks, &self.state.owner, catalog, self.current_round())
    }

    pub fn current_round(&self) -> u32 {
        current_round(self.picks.len(), self.state.team_count)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn owns(&self, pick: &Pick) -> bool {
        self.state.owner.owns(pick)
    }
}

// ---------------------------------------------------------------------------
// Resolution helpers
// ---------------------------------------------------------------------------

async fn resolve_draft(
    provider: &dyn DraftDataProvider,
    settings: &SessionSettings,
) -> Result<DraftMetadata, SessionError> {
    if let Some(draft_id) = settings.draft_id.as_deref() {
        return provider.draft(draft_id).await.map_err(|e| match e {
            ProviderError::NotFound { .. } => SessionError::DraftNotFound(draft_id.to_string()),
            other => SessionError::Provider(other),
        });
    }

    let Some(league_id) = settings.league_id.as_deref() else {
        return Err(SessionError::InvalidConfiguration(
            "set league.league_id or league.draft_id".into(),
        ));
    };

    let drafts = provider.league_drafts(league_id).await.map_err(|e| match e {
        ProviderError::NotFound { .. } => SessionError::DraftNotFound(format!("league {league_id}")),
        other => SessionError::Provider(other),
    })?;

    // Prefer a live draft; otherwise the most recent one listed.
    let chosen = drafts
        .iter()
        .find(|d| d.status == "drafting")
        .or_else(|| drafts.iter().find(|d| d.status == "pre_draft" || d.status == "paused"))
        .or_else(|| drafts.first())
        .ok_or_else(|| SessionError::DraftNotFound(format!("league {league_id} has no drafts")))?;

    // The league listing can be stale; fetch the draft itself.
    provider.draft(&chosen.draft_id).await.map_err(|e| match e {
        ProviderError::NotFound { .. } => SessionError::DraftNotFound(chosen.draft_id.clone()),
        other => SessionError::Provider(other),
    })
}

/// Work out who the tracked participant is and which slot they draft from.
///
/// Order: username -> user id -> `draft_order` slot; user id -> league
/// roster owner; slot -> `slot_to_roster_id`; finally the configured slot.
async fn resolve_tracked(
    provider: &dyn DraftDataProvider,
    meta: &DraftMetadata,
    league_id: Option<&str>,
    settings: &SessionSettings,
) -> (TrackedOwner, Option<u32>) {
    let mut owner = TrackedOwner::default();

    if let Some(name) = settings.tracked_username.as_deref() {
        owner.user_id = lookup_user_id(provider, name, league_id).await;
        if owner.user_id.is_none() {
            warn!("Tracked user '{}' not found", name);
        }
    }

    let mut slot = owner
        .user_id
        .as_ref()
        .and_then(|uid| meta.draft_order.as_ref()?.get(uid).copied());

    if let (Some(uid), Some(lid)) = (owner.user_id.as_deref(), league_id) {
        match provider.league_rosters(lid).await {
            Ok(rosters) => {
                owner.roster_id = rosters
                    .iter()
                    .find(|r| r.owner_id.as_deref() == Some(uid))
                    .map(|r| r.roster_id);
            }
            Err(e) => warn!("Could not load league rosters: {}", e),
        }
    }

    if owner.roster_id.is_none() {
        if let (Some(s), Some(map)) = (slot, meta.slot_to_roster_id.as_ref()) {
            owner.roster_id = map.get(&s.to_string()).copied();
        }
    }

    if slot.is_none() {
        let teams = meta.settings.teams;
        slot = settings
            .draft_position
            .filter(|&p| p >= 1 && (teams == 0 || p <= teams));
        if let Some(p) = slot {
            debug!("Using configured draft position {}", p);
        }
    }

    (owner, slot)
}

async fn lookup_user_id(
    provider: &dyn DraftDataProvider,
    name: &str,
    league_id: Option<&str>,
) -> Option<String> {
    match provider.user(name).await {
        Ok(Some(user)) => return Some(user.user_id),
        Ok(None) => {}
        Err(e) => warn!("User lookup for '{}' failed: {}", name, e),
    }
    // Display names are only searchable through the league member list.
    let lid = league_id?;
    match provider.league_users(lid).await {
        Ok(users) => users
            .into_iter()
            .find(|u: &RawUser| u.matches_name(name))
            .map(|u| u.user_id),
        Err(e) => {
            warn!("League user lookup failed: {}", e);
            None
        }
    }
}

// Draft session and its event loop.
//
// `DraftSession` owns the sync engine, catalog, plan, queue, pick clock and
// panic state, and is built from two injected collaborators: a
// `ConfigProvider` and a `DraftDataProvider`. Everything it learns is pushed
// to the presenter as `DraftEvent`s; it never renders anything itself.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::PlayerCatalog;
use crate::config::{ConfigProvider, SessionSettings};
use crate::draft::player::Player;
use crate::plan::{generate_plan, DraftPlan};
use crate::protocol::{DraftEvent, PickProcessed, UserCommand};
use crate::provider::DraftDataProvider;
use crate::queue::{MoveDirection, PickQueue};
use crate::recommend::{
    analyze_pick, generate_recommendations, PanicMode, RecommendationContext, RecommendationSet,
};
use crate::sync::{SessionError, SyncEngine, TickOutcome, TurnTransition};
use crate::timer::{ClockEvent, PickClock};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pick-clock resolution.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Trending window used to enrich the catalog at session start.
pub const TRENDING_LOOKBACK_HOURS: u32 = 24;
pub const TRENDING_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// DraftSession
// ---------------------------------------------------------------------------

pub struct DraftSession {
    config: Box<dyn ConfigProvider>,
    settings: SessionSettings,
    sync: SyncEngine,
    catalog: PlayerCatalog,
    plan: DraftPlan,
    queue: PickQueue,
    clock: PickClock,
    panic: PanicMode,
    /// Player ids from the last recommendation set, for pick analysis.
    last_recommended: HashSet<String>,
    events: mpsc::Sender<DraftEvent>,
}

impl DraftSession {
    /// Resolve the draft, load the catalog and restore the plan and queue.
    ///
    /// `DraftNotFound` and `InvalidConfiguration` are fatal here.
    pub async fn connect(
        config: Box<dyn ConfigProvider>,
        provider: Box<dyn DraftDataProvider>,
        events: mpsc::Sender<DraftEvent>,
    ) -> Result<Self, SessionError> {
        let settings = config.settings().clone();
        let sync = SyncEngine::connect(provider, &settings).await?;

        let mut catalog = load_catalog(sync.provider(), &settings).await;
        if !catalog.is_demo() {
            match sync
                .provider()
                .trending_adds(TRENDING_LOOKBACK_HOURS, TRENDING_LIMIT)
                .await
            {
                Ok(trending) => catalog.apply_trending(&trending),
                Err(e) => warn!("Trending adds unavailable: {}", e),
            }
        }

        let draft_id = sync.state().draft_id.clone();
        let plan = match config.load_plan(&draft_id)? {
            Some(plan) => {
                info!("Restored draft plan for {}", draft_id);
                plan
            }
            None => build_plan(&catalog, &sync, &settings),
        };
        let queue = PickQueue::from_players(config.load_queue(&draft_id)?);
        if !queue.is_empty() {
            info!("Restored queue of {} players", queue.len());
        }

        let mut session = DraftSession {
            config,
            settings,
            sync,
            catalog,
            plan,
            queue,
            clock: PickClock::new(),
            panic: PanicMode::new(),
            last_recommended: HashSet::new(),
            events,
        };
        session.persist_plan();
        Ok(session)
    }

    // --- sync ------------------------------------------------------------

    /// Begin background polling. Returns false once the draft is over.
    pub fn start_sync(&mut self) -> bool {
        self.sync.start()
    }

    pub fn stop_sync(&mut self) {
        self.sync.stop();
    }

    /// One background poll cycle.
    pub async fn on_poll_tick(&mut self) {
        let Some(outcome) = self.sync.poll(&self.catalog).await else {
            return;
        };
        if self.apply_outcome(outcome).await {
            self.start_turn_panic().await;
        }
    }

    /// Manual refresh. Errors are reported to the presenter.
    pub async fn refresh(&mut self) -> bool {
        match self.sync.refresh(&self.catalog).await {
            Ok(outcome) => {
                if self.apply_outcome(outcome).await {
                    self.start_turn_panic().await;
                }
                true
            }
            Err(e) => {
                warn!("Manual refresh failed: {}", e);
                self.emit(DraftEvent::SyncError {
                    message: e.to_string(),
                })
                .await;
                false
            }
        }
    }

    /// Fold one tick into the session and notify the presenter. Returns
    /// whether the tracked participant just went on the clock.
    async fn apply_outcome(&mut self, outcome: TickOutcome) -> bool {
        if !outcome.new_picks.is_empty() {
            let drafted = self.sync.drafted_ids().clone();

            let evicted = self.queue.evict_drafted(&drafted);
            if !evicted.is_empty() {
                info!(
                    "Evicted drafted players from queue: {}",
                    evicted.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
                );
                self.persist_queue();
                self.emit(DraftEvent::QueueChanged(self.queue.players().to_vec())).await;
            }

            let removed = self.plan.remove_drafted(&drafted);
            if removed > 0 {
                debug!("Removed {} drafted players from plan", removed);
                self.persist_plan();
                self.emit(DraftEvent::PlanUpdated(self.plan.clone())).await;
            }

            let processed: Vec<PickProcessed> = outcome
                .new_picks
                .into_iter()
                .map(|pick| {
                    let player = self.catalog.get(&pick.player_id).cloned();
                    let analysis = analyze_pick(
                        &pick,
                        player.as_ref(),
                        self.sync.owns(&pick),
                        &self.last_recommended,
                    );
                    PickProcessed {
                        pick,
                        player,
                        analysis,
                    }
                })
                .collect();
            self.emit(DraftEvent::PicksProcessed(processed)).await;
            self.emit(DraftEvent::ScarcityUpdated(self.sync.scarcity().snapshot()))
                .await;
        }

        let mut turn_started = false;
        match outcome.transition {
            Some(TurnTransition::TurnStart) => {
                info!("Tracked participant is on the clock");
                self.emit_turn(true).await;
                self.clock.start(self.settings.pick_seconds);
                self.emit(DraftEvent::TimerTick {
                    remaining_seconds: self.clock.remaining(),
                })
                .await;
                turn_started = true;
            }
            Some(TurnTransition::TurnEnd) => {
                info!("Tracked participant's turn ended");
                self.emit_turn(false).await;
                self.clock.clear();
                if self.panic.exit() {
                    self.emit(DraftEvent::PanicDismissed).await;
                }
            }
            None => {}
        }

        if outcome.completed {
            self.clock.clear();
            self.panic.exit();
            self.emit(DraftEvent::DraftCompleted {
                total_picks: self.sync.picks().len(),
            })
            .await;
        }

        turn_started
    }

    async fn emit_turn(&self, is_user_turn: bool) {
        let estimated = self.sync.state().is_turn_estimated();
        if estimated {
            warn!("Turn change is estimated, not authoritative");
        }
        self.emit(DraftEvent::TurnChanged {
            is_user_turn,
            estimated,
        })
        .await;
    }

    // --- panic mode ------------------------------------------------------

    /// Explicit trigger: refresh out of band (best-effort), then recommend.
    pub async fn trigger_panic(&mut self) {
        if self.panic.is_active() {
            debug!("Panic mode already active");
            return;
        }
        match self.sync.refresh(&self.catalog).await {
            Ok(outcome) => {
                // A turn start found here enters panic mode itself.
                if self.apply_outcome(outcome).await {
                    self.start_turn_panic().await;
                    return;
                }
            }
            Err(e) => warn!("Refresh before panic failed, using last known state: {}", e),
        }
        self.enter_panic().await;
    }

    async fn enter_panic(&mut self) {
        if !self.panic.try_enter() {
            return;
        }
        info!("Entering panic mode");
        self.emit_recommendations().await;
    }

    /// Turn start always gets a fresh set, even when the user already
    /// opened panic mode before going on the clock.
    async fn start_turn_panic(&mut self) {
        if self.panic.try_enter() {
            info!("Entering panic mode");
        } else {
            debug!("Panic mode already active; refreshing recommendations for turn start");
        }
        self.emit_recommendations().await;
    }

    async fn emit_recommendations(&mut self) {
        let set = self.recommendations();
        self.last_recommended = set.player_ids();
        self.emit(DraftEvent::RecommendationsReady(set)).await;
    }

    pub async fn dismiss_panic(&mut self) {
        if self.panic.exit() {
            info!("Panic mode dismissed");
            self.emit(DraftEvent::PanicDismissed).await;
        }
    }

    /// Current recommendations without touching panic state.
    pub fn recommendations(&self) -> RecommendationSet {
        let roster = self.sync.roster(&self.catalog);
        generate_recommendations(&RecommendationContext {
            catalog: &self.catalog,
            picks: self.sync.picks(),
            scarcity: self.sync.scarcity(),
            roster: &roster,
            plan: Some(&self.plan),
            team_count: self.sync.state().team_count,
        })
    }

    // --- pick clock ------------------------------------------------------

    pub async fn on_clock_tick(&mut self) {
        for event in self.clock.tick() {
            match event {
                ClockEvent::Tick { remaining_seconds } => {
                    self.emit(DraftEvent::TimerTick { remaining_seconds }).await;
                }
                ClockEvent::Alert(alert) => {
                    self.emit(DraftEvent::TimerAlert(alert)).await;
                }
                ClockEvent::Expired => {
                    let auto_pick = self.queue.head().cloned();
                    match &auto_pick {
                        Some(p) => warn!("Pick clock expired; queue head is {} ({})", p.name, p.id),
                        None => warn!("Pick clock expired with an empty queue"),
                    }
                    self.emit(DraftEvent::TimerExpired { auto_pick }).await;
                }
            }
        }
    }

    pub fn start_clock(&mut self, seconds: Option<u32>) {
        self.clock.start(seconds.unwrap_or(self.settings.pick_seconds));
    }

    // --- queue and plan --------------------------------------------------

    fn resolve_available(&self, player_id: &str) -> Option<Player> {
        if self.sync.drafted_ids().contains(player_id) {
            warn!("Player {} is already drafted", player_id);
            return None;
        }
        let player = self.catalog.get(player_id).cloned();
        if player.is_none() {
            warn!("Unknown player id {}", player_id);
        }
        player
    }

    pub async fn enqueue(&mut self, player_id: &str) -> bool {
        let Some(player) = self.resolve_available(player_id) else {
            return false;
        };
        if !self.queue.enqueue(player) {
            return false;
        }
        self.queue_changed().await;
        true
    }

    pub async fn dequeue(&mut self, player_id: &str) -> bool {
        if self.queue.dequeue(player_id).is_none() {
            return false;
        }
        self.queue_changed().await;
        true
    }

    pub async fn reorder(&mut self, player_id: &str, direction: MoveDirection) -> bool {
        if !self.queue.reorder(player_id, direction) {
            return false;
        }
        self.queue_changed().await;
        true
    }

    async fn queue_changed(&mut self) {
        self.persist_queue();
        self.emit(DraftEvent::QueueChanged(self.queue.players().to_vec())).await;
    }

    fn is_plan_round(&self, round: u32) -> bool {
        let rounds = self.sync.state().order.rounds;
        let ok = round >= 1 && (rounds == 0 || round <= rounds);
        if !ok {
            warn!("Round {} is outside the draft", round);
        }
        ok
    }

    /// Manual plan edit: add a target for `round`.
    pub async fn add_plan_target(&mut self, round: u32, player_id: &str) -> bool {
        if !self.is_plan_round(round) {
            return false;
        }
        let Some(player) = self.resolve_available(player_id) else {
            return false;
        };
        let added = self.plan.add_target(round, player);
        if added {
            self.plan_changed().await;
        }
        added
    }

    pub async fn add_plan_backup(&mut self, round: u32, player_id: &str) -> bool {
        if !self.is_plan_round(round) {
            return false;
        }
        let Some(player) = self.resolve_available(player_id) else {
            return false;
        };
        let added = self.plan.add_backup(round, player);
        if added {
            self.plan_changed().await;
        }
        added
    }

    pub async fn remove_from_plan(&mut self, round: u32, player_id: &str) -> bool {
        let removed = self.plan.remove_player(round, player_id);
        if removed {
            self.plan_changed().await;
        }
        removed
    }

    pub async fn regenerate_plan(&mut self) {
        let mut plan = build_plan(&self.catalog, &self.sync, &self.settings);
        plan.remove_drafted(self.sync.drafted_ids());
        self.plan = plan;
        self.plan_changed().await;
    }

    async fn plan_changed(&mut self) {
        self.persist_plan();
        self.emit(DraftEvent::PlanUpdated(self.plan.clone())).await;
    }

    // --- commands --------------------------------------------------------

    /// Apply one user command. Returns false on `Quit`.
    pub async fn handle_command(&mut self, cmd: UserCommand) -> bool {
        match cmd {
            UserCommand::Panic => self.trigger_panic().await,
            UserCommand::DismissPanic => self.dismiss_panic().await,
            UserCommand::Refresh => {
                self.refresh().await;
            }
            UserCommand::Enqueue(id) => {
                self.enqueue(&id).await;
            }
            UserCommand::Dequeue(id) => {
                self.dequeue(&id).await;
            }
            UserCommand::Reorder(id, direction) => {
                self.reorder(&id, direction).await;
            }
            UserCommand::StartClock(seconds) => {
                self.start_clock(seconds);
                self.emit(DraftEvent::TimerTick {
                    remaining_seconds: self.clock.remaining(),
                })
                .await;
            }
            UserCommand::ClearClock => {
                self.clock.clear();
            }
            UserCommand::PlanTarget(round, id) => {
                self.add_plan_target(round, &id).await;
            }
            UserCommand::PlanBackup(round, id) => {
                self.add_plan_backup(round, &id).await;
            }
            UserCommand::Unplan(round, id) => {
                self.remove_from_plan(round, &id).await;
            }
            UserCommand::RegeneratePlan => self.regenerate_plan().await,
            UserCommand::ShowPlan => {
                self.emit(DraftEvent::PlanUpdated(self.plan.clone())).await;
            }
            UserCommand::Quit => return false,
        }
        true
    }

    /// Stop polling and the clock, and flush persisted state.
    pub fn shutdown(&mut self) {
        self.sync.stop();
        self.clock.clear();
        self.persist_plan();
        self.persist_queue();
    }

    // --- persistence -----------------------------------------------------

    fn persist_plan(&mut self) {
        let draft_id = self.sync.state().draft_id.clone();
        if let Err(e) = self.config.save_plan(&draft_id, &self.plan) {
            warn!("Failed to save plan: {:#}", e);
        }
    }

    fn persist_queue(&mut self) {
        let draft_id = self.sync.state().draft_id.clone();
        if let Err(e) = self.config.save_queue(&draft_id, self.queue.players()) {
            warn!("Failed to save queue: {:#}", e);
        }
    }

    async fn emit(&self, event: DraftEvent) {
        let _ = self.events.send(event).await;
    }

    // --- accessors -------------------------------------------------------

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn catalog(&self) -> &PlayerCatalog {
        &self.catalog
    }

    pub fn plan(&self) -> &DraftPlan {
        &self.plan
    }

    pub fn queue(&self) -> &PickQueue {
        &self.queue
    }

    pub fn clock(&self) -> &PickClock {
        &self.clock
    }

    pub fn is_panic_active(&self) -> bool {
        self.panic.is_active()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

/// Catalog from a CSV snapshot or the provider, else the demo catalog.
async fn load_catalog(provider: &dyn DraftDataProvider, settings: &SessionSettings) -> PlayerCatalog {
    let format = settings.scoring_format;
    if let Some(path) = settings.catalog_csv.as_deref() {
        match PlayerCatalog::from_csv(path, format) {
            Ok(catalog) => {
                info!("Loaded {} players from {}", catalog.len(), path.display());
                return catalog;
            }
            Err(e) => warn!("Catalog CSV unusable, falling back to provider: {}", e),
        }
    }

    match provider.players().await {
        Ok(raw) => {
            let catalog = PlayerCatalog::from_provider(&raw, format);
            if !catalog.is_empty() {
                return catalog;
            }
            warn!("Provider returned an empty player catalog; using demo data");
        }
        Err(e) => warn!("Player catalog failed to load ({}); using demo data", e),
    }
    PlayerCatalog::demo(format)
}

fn build_plan(catalog: &PlayerCatalog, sync: &SyncEngine, settings: &SessionSettings) -> DraftPlan {
    let state = sync.state();
    let team_count = state.team_count.max(1);
    let slot = state
        .tracked_slot
        .or(settings.draft_position)
        .unwrap_or_else(|| {
            warn!("Draft slot unknown; planning from slot 1");
            1
        });
    generate_plan(catalog, team_count, slot, settings.scoring_format)
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the session until `Quit` or the command channel closes.
///
/// Listens with `tokio::select!` on:
/// 1. the poll interval, while sync is running
/// 2. the one-second clock interval, while the pick clock runs
/// 3. user commands
pub async fn run(
    mut session: DraftSession,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
) -> anyhow::Result<()> {
    info!("Draft session loop started");
    session.start_sync();

    let mut poll_interval = tokio::time::interval(session.settings().poll_interval);
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut clock_interval = tokio::time::interval(CLOCK_TICK);
    clock_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock_armed = false;

    loop {
        // Re-arm so the first clock tick lands one full second after start.
        let clock_running = session.clock().is_running();
        if clock_running && !clock_armed {
            clock_interval.reset();
        }
        clock_armed = clock_running;

        tokio::select! {
            _ = poll_interval.tick(), if session.sync().is_running() => {
                session.on_poll_tick().await;
            }

            _ = clock_interval.tick(), if clock_running => {
                session.on_clock_tick().await;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) | None => {
                        info!("Shutting down draft session");
                        break;
                    }
                    Some(cmd) => {
                        session.handle_command(cmd).await;
                    }
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

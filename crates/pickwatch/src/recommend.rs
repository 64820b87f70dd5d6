// Panic-mode recommendation engine.
//
// When the tracked participant is on the clock, produces up to three ranked
// suggestions by walking a fixed waterfall: plan target, plan backup,
// scarcity pick, value pick, then best available by ADP. Also grades every
// processed pick against ADP for the draft log.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::PlayerCatalog;
use crate::draft::pick::{current_round, Pick};
use crate::draft::player::{InjuryStatus, Player};
use crate::draft::roster::{needs_position, RosterComposition};
use crate::plan::DraftPlan;
use crate::valuation::adp::{is_draftable, UNDRAFTABLE_ADP};
use crate::valuation::scarcity::{PositionScarcity, ScarcityLevel};

pub const MAX_RECOMMENDATIONS: usize = 3;

/// Picks by which ADP must trail the current pick for a value call.
pub const VALUE_THRESHOLD: f64 = 6.0;

pub const MIN_CONFIDENCE: u8 = 10;
pub const MAX_CONFIDENCE: u8 = 95;

// ---------------------------------------------------------------------------
// Panic mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanicState {
    Idle,
    Active,
}

/// Idle -> Active -> Idle, guarded against re-entry.
#[derive(Debug, Clone)]
pub struct PanicMode {
    state: PanicState,
}

impl Default for PanicMode {
    fn default() -> Self {
        Self::new()
    }
}

impl PanicMode {
    pub fn new() -> Self {
        Self {
            state: PanicState::Idle,
        }
    }

    /// Enter panic mode. Returns false if already active.
    pub fn try_enter(&mut self) -> bool {
        if self.state == PanicState::Active {
            return false;
        }
        self.state = PanicState::Active;
        true
    }

    /// Leave panic mode. Returns whether it was active.
    pub fn exit(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = PanicState::Idle;
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.state == PanicState::Active
    }

    pub fn state(&self) -> PanicState {
        self.state
    }
}

// ---------------------------------------------------------------------------
// Recommendation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyTag {
    PlanTarget,
    PlanBackup,
    ScarcityPick,
    ValuePick,
    BestAvailable,
}

impl StrategyTag {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyTag::PlanTarget => "PLAN TARGET",
            StrategyTag::PlanBackup => "PLAN BACKUP",
            StrategyTag::ScarcityPick => "SCARCITY",
            StrategyTag::ValuePick => "VALUE",
            StrategyTag::BestAvailable => "BEST AVAILABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub player: Player,
    pub strategy: StrategyTag,
    pub reasoning: String,
    /// 10..=95.
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    /// Derived from the fixed demo catalog rather than real data.
    pub using_demo_data: bool,
    /// Roster needs came from the round-based estimate.
    pub roster_estimated: bool,
    pub round: u32,
    pub overall_pick: u32,
}

impl RecommendationSet {
    pub fn player_ids(&self) -> HashSet<String> {
        self.recommendations
            .iter()
            .map(|r| r.player.id.clone())
            .collect()
    }
}

/// Everything the waterfall reads. Borrowed from the session for one call.
pub struct RecommendationContext<'a> {
    pub catalog: &'a PlayerCatalog,
    pub picks: &'a [Pick],
    pub scarcity: &'a PositionScarcity,
    pub roster: &'a RosterComposition,
    pub plan: Option<&'a DraftPlan>,
    pub team_count: u32,
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

fn base_confidence(strategy: StrategyTag, level: Option<ScarcityLevel>) -> i32 {
    match strategy {
        StrategyTag::PlanTarget => 95,
        StrategyTag::PlanBackup => 92,
        StrategyTag::ScarcityPick => match level {
            Some(ScarcityLevel::Critical) => 88,
            _ => 82,
        },
        StrategyTag::ValuePick => 85,
        StrategyTag::BestAvailable => 75,
    }
}

fn injury_penalty(injury: Option<&InjuryStatus>) -> i32 {
    match injury {
        None => 0,
        Some(InjuryStatus::Questionable) => 8,
        Some(InjuryStatus::Doubtful) | Some(InjuryStatus::Out) => 12,
        Some(_) => 10,
    }
}

pub fn confidence_for(strategy: StrategyTag, level: Option<ScarcityLevel>, player: &Player) -> u8 {
    let raw = base_confidence(strategy, level) - injury_penalty(player.injury.as_ref());
    raw.clamp(i32::from(MIN_CONFIDENCE), i32::from(MAX_CONFIDENCE)) as u8
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

struct Waterfall<'a> {
    round: u32,
    drafted: HashSet<&'a str>,
    roster: &'a RosterComposition,
    picked: Vec<Recommendation>,
}

impl<'a> Waterfall<'a> {
    fn is_full(&self) -> bool {
        self.picked.len() >= MAX_RECOMMENDATIONS
    }

    fn already_picked(&self, player_id: &str) -> bool {
        self.picked.iter().any(|r| r.player.id == player_id)
    }

    /// Undrafted, realistically draftable now, and the roster has room.
    fn eligible(&self, player: &Player) -> bool {
        !self.drafted.contains(player.id.as_str())
            && !self.already_picked(&player.id)
            && is_draftable(player, self.round)
            && needs_position(self.roster, player.position, self.round)
    }

    fn push(&mut self, player: &Player, strategy: StrategyTag, level: Option<ScarcityLevel>, why: String) {
        if self.is_full() || self.already_picked(&player.id) {
            return;
        }
        let reasoning = decorate_reasoning(why, player);
        self.picked.push(Recommendation {
            player: player.clone(),
            strategy,
            reasoning,
            confidence: confidence_for(strategy, level, player),
        });
    }
}

fn decorate_reasoning(mut why: String, player: &Player) -> String {
    if let Some(adds) = player.trending_adds.filter(|&n| n > 0) {
        why.push_str(&format!(" Trending: +{adds} adds."));
    }
    if let Some(injury) = &player.injury {
        why.push_str(&format!(" Injury: {}.", injury.label()));
    }
    why
}

fn adp_text(player: &Player) -> String {
    if player.adp >= UNDRAFTABLE_ADP {
        "no ADP".to_string()
    } else {
        format!("ADP {:.0}", player.adp)
    }
}

/// Rank up to three suggestions for the pick on the clock.
pub fn generate_recommendations(ctx: &RecommendationContext<'_>) -> RecommendationSet {
    let round = current_round(ctx.picks.len(), ctx.team_count);
    let overall_pick = ctx.picks.len() as u32 + 1;
    let mut wf = Waterfall {
        round,
        drafted: ctx.picks.iter().map(|p| p.player_id.as_str()).collect(),
        roster: ctx.roster,
        picked: Vec::new(),
    };

    // 1 and 2: the plan for this round.
    if let Some(round_plan) = ctx.plan.and_then(|p| p.round(round)) {
        let target = round_plan.targets.iter().find(|p| wf.eligible(p)).cloned();
        match target {
            Some(player) => {
                let why = format!("Round {round} plan target ({}).", adp_text(&player));
                wf.push(&player, StrategyTag::PlanTarget, None, why);
            }
            None => {
                if let Some(player) = round_plan.backups.iter().find(|p| wf.eligible(p)).cloned() {
                    let why = format!(
                        "Round {round} targets are gone; top backup ({}).",
                        adp_text(&player)
                    );
                    wf.push(&player, StrategyTag::PlanBackup, None, why);
                }
            }
        }
    }

    // 3: worst scarcity first, Critical before Scarce.
    if !wf.is_full() {
        for (position, level) in ctx.scarcity.by_severity() {
            if level < ScarcityLevel::Scarce {
                break;
            }
            if !needs_position(ctx.roster, position, round) {
                continue;
            }
            let best = ctx
                .catalog
                .by_position(position)
                .find(|p| wf.eligible(p))
                .cloned();
            if let Some(player) = best {
                let remaining = ctx
                    .scarcity
                    .entry(position)
                    .map(|e| e.remaining())
                    .unwrap_or(0);
                let why = format!(
                    "{position} is {} ({} quality left); best remaining ({}).",
                    level.label(),
                    remaining.max(0),
                    adp_text(&player)
                );
                wf.push(&player, StrategyTag::ScarcityPick, Some(level), why);
                break;
            }
        }
    }

    // 4: a faller whose ADP is well before the current pick.
    if !wf.is_full() {
        let pick = f64::from(overall_pick);
        let faller = ctx
            .catalog
            .players()
            .iter()
            .find(|p| pick - p.adp > VALUE_THRESHOLD && wf.eligible(p))
            .cloned();
        if let Some(player) = faller {
            let why = format!(
                "Falling: {} at pick {overall_pick}, {:.0} picks past market.",
                adp_text(&player),
                pick - player.adp
            );
            wf.push(&player, StrategyTag::ValuePick, None, why);
        }
    }

    // 5: fill by ADP.
    let fill: Vec<Player> = ctx
        .catalog
        .players()
        .iter()
        .filter(|p| wf.eligible(p))
        .take(MAX_RECOMMENDATIONS)
        .cloned()
        .collect();
    for player in fill {
        if wf.is_full() {
            break;
        }
        let why = format!("Best available by ADP ({}).", adp_text(&player));
        wf.push(&player, StrategyTag::BestAvailable, None, why);
    }

    // Nothing drafted may survive, however it got here.
    let drafted = wf.drafted;
    let mut recommendations = wf.picked;
    recommendations.retain(|r| {
        let stale = drafted.contains(r.player.id.as_str());
        if stale {
            warn!(
                "Stale recommendation dropped: {} ({}) is already drafted",
                r.player.name, r.player.id
            );
        }
        !stale
    });

    if ctx.catalog.is_demo() {
        warn!("Recommendations derived from demo catalog");
    }
    info!(
        "Recommendations for round {} pick {}: {}",
        round,
        overall_pick,
        recommendations
            .iter()
            .map(|r| format!("{} [{}]", r.player.name, r.strategy.label()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    RecommendationSet {
        recommendations,
        using_demo_data: ctx.catalog.is_demo(),
        roster_estimated: ctx.roster.is_estimated,
        round,
        overall_pick,
    }
}

// ---------------------------------------------------------------------------
// Pick analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickVerdict {
    /// Taken well before ADP.
    Reach,
    /// Taken well after ADP.
    Value,
    OnPar,
}

impl PickVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            PickVerdict::Reach => "REACH",
            PickVerdict::Value => "VALUE",
            PickVerdict::OnPar => "ON PAR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickAnalysis {
    /// `pick_number - adp`; positive means the player fell.
    pub adp_delta: Option<f64>,
    pub verdict: PickVerdict,
    pub by_tracked_roster: bool,
    pub was_recommended: bool,
}

/// Grade a processed pick against the player's ADP.
pub fn analyze_pick(
    pick: &Pick,
    player: Option<&Player>,
    by_tracked_roster: bool,
    last_recommended: &HashSet<String>,
) -> PickAnalysis {
    let adp_delta = player
        .filter(|p| p.adp < UNDRAFTABLE_ADP)
        .map(|p| f64::from(pick.pick_number) - p.adp);
    let verdict = match adp_delta {
        Some(d) if d > VALUE_THRESHOLD => PickVerdict::Value,
        Some(d) if d < -VALUE_THRESHOLD => PickVerdict::Reach,
        _ => PickVerdict::OnPar,
    };
    debug!(
        "Pick {} ({}): {:?} delta {:?}",
        pick.pick_number, pick.player_id, verdict, adp_delta
    );
    PickAnalysis {
        adp_delta,
        verdict,
        by_tracked_roster,
        was_recommended: last_recommended.contains(&pick.player_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::player::Position;
    use crate::draft::roster::estimate_roster_from_round;
    use crate::valuation::adp::ScoringFormat;
    use chrono::Utc;

    fn demo() -> PlayerCatalog {
        PlayerCatalog::demo(ScoringFormat::HalfPpr)
    }

    fn pick(n: u32, player_id: &str, position: Option<Position>) -> Pick {
        Pick {
            pick_number: n,
            player_id: player_id.into(),
            roster_id: Some(99),
            owner_id: None,
            player_name: None,
            position,
            recorded_at: Utc::now(),
        }
    }

    fn picks_of(ids: &[&str], catalog: &PlayerCatalog) -> Vec<Pick> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| pick(i as u32 + 1, id, catalog.get(id).map(|p| p.position)))
            .collect()
    }

    #[test]
    fn panic_mode_guards_reentry() {
        let mut panic = PanicMode::new();
        assert!(panic.try_enter());
        assert!(!panic.try_enter());
        assert!(panic.exit());
        assert!(!panic.exit());
        assert_eq!(panic.state(), PanicState::Idle);
    }

    #[test]
    fn empty_board_falls_back_to_adp_order() {
        let catalog = demo();
        let scarcity = PositionScarcity::new();
        let roster = RosterComposition::default();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &[],
            scarcity: &scarcity,
            roster: &roster,
            plan: None,
            team_count: 12,
        });
        assert_eq!(set.recommendations.len(), 3);
        assert!(set.using_demo_data);
        assert_eq!(set.round, 1);
        assert_eq!(set.overall_pick, 1);
        let ids: Vec<&str> = set.recommendations.iter().map(|r| r.player.id.as_str()).collect();
        // Four players share ADP 1; ties break by name.
        assert_eq!(ids, vec!["demo-05", "demo-01", "demo-02"]);
        assert!(set
            .recommendations
            .iter()
            .all(|r| r.strategy == StrategyTag::BestAvailable && r.confidence == 75));
    }

    #[test]
    fn plan_target_leads_and_skips_drafted() {
        let catalog = demo();
        let mut plan = DraftPlan::new();
        plan.add_target(1, catalog.get("demo-01").unwrap().clone());
        plan.add_target(1, catalog.get("demo-04").unwrap().clone());
        plan.add_backup(1, catalog.get("demo-06").unwrap().clone());
        let picks = picks_of(&["demo-01"], &catalog);
        let scarcity = PositionScarcity::new();
        let roster = RosterComposition::default();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &picks,
            scarcity: &scarcity,
            roster: &roster,
            plan: Some(&plan),
            team_count: 12,
        });
        let first = &set.recommendations[0];
        assert_eq!(first.player.id, "demo-04");
        assert_eq!(first.strategy, StrategyTag::PlanTarget);
        assert_eq!(first.confidence, 95);
        assert!(!set.recommendations.iter().any(|r| r.strategy == StrategyTag::PlanBackup));
    }

    #[test]
    fn backup_used_when_targets_gone() {
        let catalog = demo();
        let mut plan = DraftPlan::new();
        plan.add_target(1, catalog.get("demo-01").unwrap().clone());
        plan.add_backup(1, catalog.get("demo-06").unwrap().clone());
        let picks = picks_of(&["demo-01"], &catalog);
        let scarcity = PositionScarcity::new();
        let roster = RosterComposition::default();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &picks,
            scarcity: &scarcity,
            roster: &roster,
            plan: Some(&plan),
            team_count: 12,
        });
        assert_eq!(set.recommendations[0].player.id, "demo-06");
        assert_eq!(set.recommendations[0].strategy, StrategyTag::PlanBackup);
        assert_eq!(set.recommendations[0].confidence, 92);
    }

    #[test]
    fn scarcity_pick_prefers_critical_position() {
        let catalog = demo();
        let mut scarcity = PositionScarcity::new();
        for _ in 0..13 {
            scarcity.record(Position::TE);
        }
        let roster = RosterComposition::default();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &[],
            scarcity: &scarcity,
            roster: &roster,
            plan: None,
            team_count: 12,
        });
        let scarce = set
            .recommendations
            .iter()
            .find(|r| r.strategy == StrategyTag::ScarcityPick)
            .expect("scarcity pick");
        assert_eq!(scarce.player.position, Position::TE);
        assert_eq!(scarce.confidence, 88);
    }

    #[test]
    fn value_pick_finds_faller() {
        let catalog = demo();
        // 20 picks made, none of them from the catalog.
        let picks: Vec<Pick> = (1..=20).map(|n| pick(n, &format!("other-{n}"), None)).collect();
        let scarcity = PositionScarcity::new();
        let roster = RosterComposition::default();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &picks,
            scarcity: &scarcity,
            roster: &roster,
            plan: None,
            team_count: 12,
        });
        let value = set
            .recommendations
            .iter()
            .find(|r| r.strategy == StrategyTag::ValuePick)
            .expect("value pick");
        assert_eq!(value.player.id, "demo-05");
        assert_eq!(value.confidence, 85);
    }

    #[test]
    fn capped_positions_are_filtered() {
        let catalog = demo();
        let mut roster = RosterComposition::default();
        roster.counts.insert(Position::RB, 0);
        roster.counts.insert(Position::QB, 3);
        let picks: Vec<Pick> = (1..=60).map(|n| pick(n, &format!("x{n}"), None)).collect();
        let scarcity = PositionScarcity::new();
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &picks,
            scarcity: &scarcity,
            roster: &roster,
            plan: None,
            team_count: 12,
        });
        assert!(set.recommendations.iter().all(|r| r.player.position != Position::QB));
        // Round 6: kickers and defenses are still capped at zero.
        assert!(set
            .recommendations
            .iter()
            .all(|r| !matches!(r.player.position, Position::K | Position::DEF)));
    }

    #[test]
    fn never_recommends_drafted_and_bounds_hold() {
        let catalog = demo();
        let mut plan = DraftPlan::new();
        for id in ["demo-01", "demo-02", "demo-03", "demo-04"] {
            plan.add_target(1, catalog.get(id).unwrap().clone());
        }
        let drafted = ["demo-01", "demo-02", "demo-03", "demo-05", "demo-07"];
        let picks = picks_of(&drafted, &catalog);
        let mut scarcity = PositionScarcity::new();
        for p in &picks {
            scarcity.record(p.position.unwrap_or(Position::Unknown));
        }
        let roster = estimate_roster_from_round(1);
        let set = generate_recommendations(&RecommendationContext {
            catalog: &catalog,
            picks: &picks,
            scarcity: &scarcity,
            roster: &roster,
            plan: Some(&plan),
            team_count: 12,
        });
        assert!(set.recommendations.len() <= MAX_RECOMMENDATIONS);
        assert!(set.roster_estimated);
        let mut seen = HashSet::new();
        for r in &set.recommendations {
            assert!(!drafted.contains(&r.player.id.as_str()));
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&r.confidence));
            assert!(seen.insert(r.player.id.clone()), "duplicate {}", r.player.id);
        }
    }

    #[test]
    fn injury_lowers_confidence_and_is_explained() {
        let mut player = demo().get("demo-10").unwrap().clone();
        player.injury = Some(InjuryStatus::Questionable);
        assert_eq!(confidence_for(StrategyTag::PlanTarget, None, &player), 87);
        player.injury = Some(InjuryStatus::Out);
        assert_eq!(confidence_for(StrategyTag::BestAvailable, None, &player), 63);
        let why = decorate_reasoning("x.".into(), &player);
        assert!(why.contains("Injury"));
    }

    #[test]
    fn trending_adds_mentioned() {
        let mut player = demo().get("demo-10").unwrap().clone();
        player.trending_adds = Some(250);
        assert!(decorate_reasoning("x.".into(), &player).contains("+250 adds"));
    }

    #[test]
    fn pick_analysis_verdicts() {
        let catalog = demo();
        let none = HashSet::new();
        let reach = analyze_pick(&pick(1, "demo-20", None), catalog.get("demo-20"), false, &none);
        assert_eq!(reach.verdict, PickVerdict::Reach);
        let value = analyze_pick(&pick(20, "demo-01", None), catalog.get("demo-01"), true, &none);
        assert_eq!(value.verdict, PickVerdict::Value);
        assert!(value.by_tracked_roster);
        let mut recommended = HashSet::new();
        recommended.insert("demo-02".to_string());
        let par = analyze_pick(&pick(2, "demo-02", None), catalog.get("demo-02"), false, &recommended);
        assert_eq!(par.verdict, PickVerdict::OnPar);
        assert!(par.was_recommended);
        let unknown = analyze_pick(&pick(5, "ghost", None), None, false, &none);
        assert_eq!(unknown.adp_delta, None);
        assert_eq!(unknown.verdict, PickVerdict::OnPar);
    }
}

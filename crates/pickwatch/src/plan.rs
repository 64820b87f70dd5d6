// Round-by-round draft plan.
//
// The builder walks the tracked participant's snake-draft picks, looks for
// players whose ADP lands near each pick, and orders them by a hand-authored
// position priority that is rebalanced as the plan fills up.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::PlayerCatalog;
use crate::draft::pick::snake_overall_pick;
use crate::draft::player::{Player, Position};
use crate::valuation::adp::{default_band_adp, ScoringFormat, UNDRAFTABLE_ADP};

pub const PLAN_ROUNDS: u32 = 15;

/// Maximum targets (and, separately, backups) kept per round.
pub const MAX_PER_LIST: usize = 4;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub targets: Vec<Player>,
    pub backups: Vec<Player>,
}

impl RoundPlan {
    fn contains(&self, player_id: &str) -> bool {
        self.targets.iter().chain(&self.backups).any(|p| p.id == player_id)
    }

    fn retain(&mut self, keep: impl Fn(&Player) -> bool) -> usize {
        let before = self.targets.len() + self.backups.len();
        self.targets.retain(&keep);
        self.backups.retain(&keep);
        before - self.targets.len() - self.backups.len()
    }
}

/// Targets and backups for each round (1..=15).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPlan {
    rounds: BTreeMap<u32, RoundPlan>,
}

impl DraftPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self, round: u32) -> Option<&RoundPlan> {
        self.rounds.get(&round)
    }

    pub fn rounds(&self) -> &BTreeMap<u32, RoundPlan> {
        &self.rounds
    }

    pub fn is_empty(&self) -> bool {
        self.rounds
            .values()
            .all(|r| r.targets.is_empty() && r.backups.is_empty())
    }

    /// Replace a round wholesale. Lists longer than four are truncated.
    pub fn set_round(&mut self, round: u32, mut targets: Vec<Player>, mut backups: Vec<Player>) {
        targets.truncate(MAX_PER_LIST);
        backups.truncate(MAX_PER_LIST);
        self.rounds.insert(round, RoundPlan { targets, backups });
    }

    /// Append a target. Fails when the round is full or already lists the player.
    pub fn add_target(&mut self, round: u32, player: Player) -> bool {
        let plan = self.rounds.entry(round).or_default();
        if plan.targets.len() >= MAX_PER_LIST || plan.contains(&player.id) {
            return false;
        }
        plan.targets.push(player);
        true
    }

    pub fn add_backup(&mut self, round: u32, player: Player) -> bool {
        let plan = self.rounds.entry(round).or_default();
        if plan.backups.len() >= MAX_PER_LIST || plan.contains(&player.id) {
            return false;
        }
        plan.backups.push(player);
        true
    }

    /// Remove a player from one round's targets and backups.
    pub fn remove_player(&mut self, round: u32, player_id: &str) -> bool {
        self.rounds
            .get_mut(&round)
            .map(|plan| plan.retain(|p| p.id != player_id) > 0)
            .unwrap_or(false)
    }

    /// Drop every planned player that has been drafted by anyone.
    /// Returns how many entries were removed.
    pub fn remove_drafted(&mut self, drafted: &HashSet<String>) -> usize {
        self.rounds
            .values_mut()
            .map(|plan| plan.retain(|p| !drafted.contains(&p.id)))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Half-width of the ADP window searched around the expected pick.
pub fn window_for_round(round: u32) -> f64 {
    match round {
        1..=7 => 15.0,
        8..=12 => 25.0,
        _ => 50.0,
    }
}

/// Hand-authored position priorities per round.
pub fn base_priorities(round: u32) -> &'static [Position] {
    use Position::*;
    match round {
        1 | 2 => &[RB, WR],
        3 => &[WR, RB],
        4 => &[WR, RB, TE],
        5 => &[QB, TE, RB, WR],
        6 => &[QB, WR, RB, TE],
        7 => &[TE, QB, RB, WR],
        8 => &[RB, WR, QB, TE],
        9 => &[WR, RB, TE, QB],
        10 => &[RB, WR, QB, TE],
        11 => &[WR, RB, TE, QB],
        12 => &[RB, WR, QB, TE],
        13 => &[K, DEF, RB, WR],
        14 => &[DEF, K, WR, RB],
        _ => &[K, DEF, RB, WR, QB, TE],
    }
}

/// Most players the plan assigns to a position as a round's top target.
pub fn plan_cap(position: Position) -> u32 {
    match position {
        Position::QB | Position::TE => 2,
        Position::K | Position::DEF => 1,
        Position::RB | Position::WR => 6,
        Position::Unknown => 0,
    }
}

/// Apply the roster-balance rules to a round's base priorities.
fn adjusted_priorities(round: u32, planned: &HashMap<Position, u32>) -> Vec<Position> {
    let mut priorities = base_priorities(round).to_vec();
    let count = |pos| planned.get(&pos).copied().unwrap_or(0);

    // TE first so a QB promotion in the same round lands on top.
    if round >= 9 && count(Position::TE) == 0 {
        promote(&mut priorities, Position::TE);
    }
    if round >= 8 && count(Position::QB) == 0 {
        promote(&mut priorities, Position::QB);
    }
    priorities.retain(|&pos| count(pos) < plan_cap(pos));
    priorities
}

fn promote(priorities: &mut Vec<Position>, position: Position) {
    priorities.retain(|&p| p != position);
    priorities.insert(0, position);
}

/// Whether a player belongs in a plan at all.
fn plannable(player: &Player) -> bool {
    player.active
        && player.team.as_deref().is_some_and(|t| !t.is_empty())
        && !player.injury.as_ref().is_some_and(|i| i.is_long_term())
}

/// ADP used for windowing: K/DEF without a usable rank get a default band.
fn effective_adps(catalog: &PlayerCatalog) -> HashMap<String, f64> {
    let mut adps: HashMap<String, f64> = catalog
        .players()
        .iter()
        .filter(|p| p.adp < UNDRAFTABLE_ADP)
        .map(|p| (p.id.clone(), p.adp))
        .collect();

    for position in [Position::K, Position::DEF] {
        let mut unranked: Vec<&Player> = catalog
            .by_position(position)
            .filter(|p| p.adp >= UNDRAFTABLE_ADP && plannable(p))
            .collect();
        unranked.sort_by(|a, b| {
            a.search_rank
                .unwrap_or(u32::MAX)
                .cmp(&b.search_rank.unwrap_or(u32::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });
        for (i, player) in unranked.into_iter().enumerate() {
            if let Some(adp) = default_band_adp(position, i) {
                adps.insert(player.id.clone(), adp);
            }
        }
    }
    adps
}

/// Build a 15-round plan for the given slot.
///
/// The catalog is rescored first if it was valued under a different format.
pub fn generate_plan(
    catalog: &PlayerCatalog,
    team_count: u32,
    draft_position: u32,
    format: ScoringFormat,
) -> DraftPlan {
    let catalog: Cow<'_, PlayerCatalog> = if catalog.format() == format {
        Cow::Borrowed(catalog)
    } else {
        Cow::Owned(catalog.rescored(format))
    };
    let team_count = team_count.max(1);
    let draft_position = draft_position.clamp(1, team_count);
    let adps = effective_adps(&catalog);

    let mut plan = DraftPlan::new();
    let mut planned: HashMap<Position, u32> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();

    for round in 1..=PLAN_ROUNDS {
        let overall = f64::from(snake_overall_pick(round, team_count, draft_position));
        let w = window_for_round(round);
        let priorities = adjusted_priorities(round, &planned);

        // Window candidates per priority position, best ADP first.
        let mut buckets: Vec<Vec<&Player>> = priorities
            .iter()
            .map(|&pos| {
                let mut bucket: Vec<&Player> = catalog
                    .by_position(pos)
                    .filter(|p| plannable(p) && !used.contains(&p.id))
                    .filter(|p| {
                        adps.get(&p.id)
                            .is_some_and(|&adp| adp >= overall - w && adp <= overall + w)
                    })
                    .collect();
                bucket.sort_by(|a, b| {
                    adps[&a.id]
                        .partial_cmp(&adps[&b.id])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                bucket.reverse();
                bucket
            })
            .collect();

        // Round-robin across positions so each priority gets a look.
        let mut ordered: Vec<Player> = Vec::new();
        while ordered.len() < MAX_PER_LIST * 2 && buckets.iter().any(|b| !b.is_empty()) {
            for bucket in buckets.iter_mut() {
                if ordered.len() >= MAX_PER_LIST * 2 {
                    break;
                }
                if let Some(p) = bucket.pop() {
                    // Planned K/DEF carry their band ADP so later rounds can draft them.
                    let mut entry = p.clone();
                    entry.adp = adps[&p.id];
                    ordered.push(entry);
                }
            }
        }

        let backups = ordered.split_off(ordered.len().min(MAX_PER_LIST));
        let targets = ordered;

        if let Some(top) = targets.first() {
            *planned.entry(top.position).or_insert(0) += 1;
        }
        used.extend(targets.iter().chain(&backups).map(|p| p.id.clone()));

        debug!(
            "Plan round {} (pick {}): {} targets, {} backups, priorities {:?}",
            round,
            overall,
            targets.len(),
            backups.len(),
            priorities
        );
        plan.set_round(round, targets, backups);
    }

    info!(
        "Generated {}-round plan for slot {} of {} ({})",
        PLAN_ROUNDS, draft_position, team_count, format
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RawPlayer;
    use crate::valuation::adp::is_draftable;

    /// A catalog with 30 ranked players per skill position plus unranked
    /// kickers and defenses.
    fn full_catalog(format: ScoringFormat) -> PlayerCatalog {
        let mut raw = HashMap::new();
        let mut rank = 1;
        for i in 0..40 {
            for pos in ["RB", "WR", "WR", "RB", "QB", "TE"] {
                let id = format!("{pos}{i}-{rank}");
                raw.insert(
                    id.clone(),
                    RawPlayer {
                        player_id: id.clone(),
                        full_name: Some(id.clone()),
                        position: Some(pos.into()),
                        team: Some("NYG".into()),
                        search_rank: Some(rank),
                        years_exp: Some(3),
                        active: Some(true),
                        ..Default::default()
                    },
                );
                rank += 1;
            }
        }
        for i in 0..12 {
            for pos in ["K", "DEF"] {
                let id = format!("{pos}{i}");
                raw.insert(
                    id.clone(),
                    RawPlayer {
                        player_id: id.clone(),
                        full_name: Some(id.clone()),
                        position: Some(pos.into()),
                        team: Some("NYG".into()),
                        search_rank: None,
                        active: Some(true),
                        ..Default::default()
                    },
                );
            }
        }
        PlayerCatalog::from_provider(&raw, format)
    }

    #[test]
    fn plan_covers_fifteen_rounds_within_limits() {
        let catalog = full_catalog(ScoringFormat::HalfPpr);
        let plan = generate_plan(&catalog, 12, 5, ScoringFormat::HalfPpr);
        assert_eq!(plan.rounds().len(), 15);
        for (round, rp) in plan.rounds() {
            assert!(rp.targets.len() <= MAX_PER_LIST, "round {round}");
            assert!(rp.backups.len() <= MAX_PER_LIST, "round {round}");
        }
    }

    #[test]
    fn early_rounds_are_skill_positions() {
        let catalog = full_catalog(ScoringFormat::HalfPpr);
        let plan = generate_plan(&catalog, 12, 5, ScoringFormat::HalfPpr);
        for round in 1..=3 {
            let rp = plan.round(round).unwrap();
            assert!(!rp.targets.is_empty(), "round {round} has no targets");
            for p in &rp.targets {
                assert!(matches!(p.position, Position::RB | Position::WR));
            }
        }
    }

    #[test]
    fn late_rounds_backfill_kickers_and_defenses() {
        let catalog = full_catalog(ScoringFormat::HalfPpr);
        let plan = generate_plan(&catalog, 12, 5, ScoringFormat::HalfPpr);
        let late: Vec<&Player> = (13..=15)
            .filter_map(|r| plan.round(r))
            .flat_map(|rp| rp.targets.iter())
            .collect();
        assert!(late.iter().any(|p| p.position == Position::K));
        assert!(late.iter().any(|p| p.position == Position::DEF));
        for p in late.iter().filter(|p| matches!(p.position, Position::K | Position::DEF)) {
            assert!(p.adp < 300.0, "{} kept ADP {}", p.id, p.adp);
            assert!(is_draftable(p, 13));
        }
    }

    #[test]
    fn no_player_planned_twice() {
        let catalog = full_catalog(ScoringFormat::FullPpr);
        let plan = generate_plan(&catalog, 10, 1, ScoringFormat::FullPpr);
        let mut seen = HashSet::new();
        for rp in plan.rounds().values() {
            for p in rp.targets.iter().chain(&rp.backups) {
                assert!(seen.insert(p.id.clone()), "{} planned twice", p.id);
            }
        }
    }

    #[test]
    fn top_targets_respect_position_caps() {
        let catalog = full_catalog(ScoringFormat::HalfPpr);
        let plan = generate_plan(&catalog, 12, 7, ScoringFormat::HalfPpr);
        let mut tops: HashMap<Position, u32> = HashMap::new();
        for rp in plan.rounds().values() {
            if let Some(top) = rp.targets.first() {
                *tops.entry(top.position).or_insert(0) += 1;
            }
        }
        for (pos, n) in tops {
            assert!(n <= plan_cap(pos), "{pos} top target {n} times");
        }
    }

    #[test]
    fn qb_promoted_when_none_planned_by_round_eight() {
        let planned: HashMap<Position, u32> = HashMap::new();
        assert_eq!(adjusted_priorities(8, &planned)[0], Position::QB);
        assert_eq!(adjusted_priorities(7, &planned)[0], Position::TE);

        let mut with_qb = HashMap::new();
        with_qb.insert(Position::QB, 1);
        assert_eq!(adjusted_priorities(9, &with_qb)[0], Position::TE);
    }

    #[test]
    fn capped_positions_dropped_from_priorities() {
        let mut planned = HashMap::new();
        planned.insert(Position::K, 1);
        planned.insert(Position::QB, 2);
        let p = adjusted_priorities(13, &planned);
        assert!(!p.contains(&Position::K));
        assert!(!p.contains(&Position::QB));
        assert!(p.contains(&Position::DEF));
    }

    #[test]
    fn windows_widen_by_round_band() {
        assert_eq!(window_for_round(1), 15.0);
        assert_eq!(window_for_round(7), 15.0);
        assert_eq!(window_for_round(8), 25.0);
        assert_eq!(window_for_round(12), 25.0);
        assert_eq!(window_for_round(13), 50.0);
    }

    #[test]
    fn remove_drafted_across_rounds() {
        let catalog = PlayerCatalog::demo(ScoringFormat::HalfPpr);
        let mut plan = DraftPlan::new();
        assert!(plan.add_target(1, catalog.get("demo-01").unwrap().clone()));
        assert!(plan.add_backup(1, catalog.get("demo-02").unwrap().clone()));
        assert!(plan.add_target(2, catalog.get("demo-03").unwrap().clone()));
        let drafted: HashSet<String> = ["demo-01", "demo-03"].iter().map(|s| s.to_string()).collect();
        assert_eq!(plan.remove_drafted(&drafted), 2);
        assert!(plan.round(1).unwrap().targets.is_empty());
        assert_eq!(plan.round(1).unwrap().backups.len(), 1);
    }

    #[test]
    fn manual_edits_enforce_limits() {
        let catalog = PlayerCatalog::demo(ScoringFormat::HalfPpr);
        let mut plan = DraftPlan::new();
        let ps: Vec<Player> = catalog.players().iter().take(6).cloned().collect();
        for p in &ps[..4] {
            assert!(plan.add_target(3, p.clone()));
        }
        assert!(!plan.add_target(3, ps[4].clone()));
        assert!(!plan.add_backup(3, ps[0].clone()));
        assert!(plan.add_backup(3, ps[5].clone()));
        assert!(plan.remove_player(3, &ps[0].id));
        assert!(!plan.remove_player(3, &ps[0].id));
        assert!(!plan.remove_player(9, &ps[1].id));
    }

    #[test]
    fn plan_round_trips_through_json() {
        let catalog = PlayerCatalog::demo(ScoringFormat::HalfPpr);
        let plan = generate_plan(&catalog, 12, 3, ScoringFormat::HalfPpr);
        let json = serde_json::to_string(&plan).unwrap();
        let back: DraftPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}

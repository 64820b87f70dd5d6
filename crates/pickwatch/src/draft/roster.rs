// Roster composition for the tracked participant.
//
// Counts come from the pick ledger filtered by owner. When a pick lacks a
// position we try the catalog, then a small hand-curated name table, and
// otherwise leave it uncounted. When the tracked roster is unknown entirely
// the counts are a round-based estimate and are flagged as such.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pick::Pick;
use super::player::Position;
use crate::catalog::PlayerCatalog;

/// Who the tracked participant is, as far as the provider lets us know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedOwner {
    pub roster_id: Option<u32>,
    pub user_id: Option<String>,
}

impl TrackedOwner {
    pub fn is_known(&self) -> bool {
        self.roster_id.is_some() || self.user_id.is_some()
    }

    /// Whether `pick` belongs to this owner. Roster ID wins when both sides
    /// report one; otherwise fall back to the picking user.
    pub fn owns(&self, pick: &Pick) -> bool {
        if let (Some(mine), Some(theirs)) = (self.roster_id, pick.roster_id) {
            return mine == theirs;
        }
        match (self.user_id.as_deref(), pick.owner_id.as_deref()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

/// Position counts for the tracked roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterComposition {
    pub counts: BTreeMap<Position, u32>,
    /// Owned picks whose position could not be resolved.
    pub uncounted: u32,
    /// True when derived from the round curve rather than real picks.
    pub is_estimated: bool,
}

impl RosterComposition {
    pub fn count(&self, position: Position) -> u32 {
        self.counts.get(&position).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn add(&mut self, position: Position) {
        *self.counts.entry(position).or_insert(0) += 1;
    }
}

/// Count the tracked roster's picks by position.
///
/// Falls back to [`estimate_roster_from_round`] when the owner is unknown.
pub fn roster_composition(
    picks: &[Pick],
    owner: &TrackedOwner,
    catalog: &PlayerCatalog,
    current_round: u32,
) -> RosterComposition {
    if !owner.is_known() {
        return estimate_roster_from_round(current_round);
    }

    let mut composition = RosterComposition::default();
    for pick in picks.iter().filter(|p| owner.owns(p)) {
        match resolve_position(pick, catalog) {
            Some(pos) => composition.add(pos),
            None => composition.uncounted += 1,
        }
    }
    composition
}

/// Best-effort position for a pick: provider field, catalog, name table.
pub fn resolve_position(pick: &Pick, catalog: &PlayerCatalog) -> Option<Position> {
    pick.position
        .filter(|p| p.is_draftable())
        .or_else(|| catalog.get(&pick.player_id).map(|p| p.position))
        .or_else(|| pick.player_name.as_deref().and_then(position_from_name))
}

/// Approximate position counts after `current_round - 1` completed rounds.
///
/// Skill positions dominate the first rounds, a TE appears from round 4,
/// a QB from round 6 and K/DEF at the very end.
pub fn estimate_roster_from_round(current_round: u32) -> RosterComposition {
    let completed = current_round.saturating_sub(1);
    let mut composition = RosterComposition {
        is_estimated: true,
        ..Default::default()
    };
    if completed == 0 {
        return composition;
    }

    let qb = u32::from(current_round >= 6);
    let te = u32::from(current_round >= 4);
    let k = u32::from(current_round >= 15);
    let def = u32::from(current_round >= 14);
    let skill = completed.saturating_sub(qb + te + k + def);

    for (pos, n) in [
        (Position::QB, qb),
        (Position::RB, skill.div_ceil(2)),
        (Position::WR, skill / 2),
        (Position::TE, te),
        (Position::K, k),
        (Position::DEF, def),
    ] {
        if n > 0 {
            composition.counts.insert(pos, n);
        }
    }
    composition
}

/// Maximum the tracked roster should hold at `position` in `round` before the
/// position is filtered out of recommendations.
pub fn position_cap(position: Position, round: u32) -> u32 {
    match position {
        Position::QB | Position::TE => 3,
        Position::K if round < 13 => 0,
        Position::DEF if round < 12 => 0,
        Position::K | Position::DEF => 1,
        Position::RB | Position::WR => u32::MAX,
        Position::Unknown => 0,
    }
}

/// Whether the roster still has room at `position` this round.
pub fn needs_position(composition: &RosterComposition, position: Position, round: u32) -> bool {
    composition.count(position) < position_cap(position, round)
}

/// Hand-curated name table for picks whose metadata omits the position.
pub fn position_from_name(name: &str) -> Option<Position> {
    let key = name.trim().to_lowercase();
    KNOWN_NAMES
        .iter()
        .find(|(n, _)| *n == key)
        .map(|&(_, pos)| pos)
}

const KNOWN_NAMES: &[(&str, Position)] = &[
    ("patrick mahomes", Position::QB),
    ("josh allen", Position::QB),
    ("lamar jackson", Position::QB),
    ("jalen hurts", Position::QB),
    ("joe burrow", Position::QB),
    ("c.j. stroud", Position::QB),
    ("christian mccaffrey", Position::RB),
    ("bijan robinson", Position::RB),
    ("saquon barkley", Position::RB),
    ("jahmyr gibbs", Position::RB),
    ("breece hall", Position::RB),
    ("derrick henry", Position::RB),
    ("jonathan taylor", Position::RB),
    ("ja'marr chase", Position::WR),
    ("justin jefferson", Position::WR),
    ("ceedee lamb", Position::WR),
    ("tyreek hill", Position::WR),
    ("amon-ra st. brown", Position::WR),
    ("puka nacua", Position::WR),
    ("a.j. brown", Position::WR),
    ("travis kelce", Position::TE),
    ("brock bowers", Position::TE),
    ("sam laporta", Position::TE),
    ("trey mcbride", Position::TE),
    ("mark andrews", Position::TE),
    ("justin tucker", Position::K),
    ("brandon aubrey", Position::K),
    ("harrison butker", Position::K),
];

// Positional scarcity tracking.
//
// For each position, compares a fixed league-wide estimate of "draftable
// quality" players against how many have already been taken. Counts are
// updated one pick at a time as the sync engine appends to the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::player::Position;

// ---------------------------------------------------------------------------
// Scarcity levels
// ---------------------------------------------------------------------------

/// How thin the remaining pool at a position is.
///
/// Variants are declared from least to most severe so `Ord` ranks severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScarcityLevel {
    /// 20+ quality players left.
    Abundant,
    Normal,
    /// 8 or fewer left.
    Scarce,
    /// 3 or fewer left: act now or miss out.
    Critical,
}

impl ScarcityLevel {
    pub fn from_remaining(remaining: i32) -> Self {
        if remaining <= 3 {
            ScarcityLevel::Critical
        } else if remaining <= 8 {
            ScarcityLevel::Scarce
        } else if remaining >= 20 {
            ScarcityLevel::Abundant
        } else {
            ScarcityLevel::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScarcityLevel::Critical => "CRITICAL",
            ScarcityLevel::Scarce => "SCARCE",
            ScarcityLevel::Normal => "NORMAL",
            ScarcityLevel::Abundant => "ABUNDANT",
        }
    }
}

/// Roughly how many players at each position are worth drafting league-wide.
pub fn starters_estimate(position: Position) -> u32 {
    match position {
        Position::QB => 15,
        Position::RB => 30,
        Position::WR => 36,
        Position::TE => 15,
        Position::K => 12,
        Position::DEF => 12,
        Position::Unknown => 0,
    }
}

// ---------------------------------------------------------------------------
// Per-position entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScarcityEntry {
    pub starters_estimate: u32,
    pub drafted_count: u32,
}

impl ScarcityEntry {
    /// Quality players left. Negative once the position is drafted past the
    /// estimate.
    pub fn remaining(&self) -> i32 {
        self.starters_estimate as i32 - self.drafted_count as i32
    }

    pub fn level(&self) -> ScarcityLevel {
        ScarcityLevel::from_remaining(self.remaining())
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Incrementally maintained drafted counts for the six draftable positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionScarcity {
    entries: BTreeMap<Position, ScarcityEntry>,
    /// Picks whose position could not be classified.
    unclassified: u32,
}

impl Default for PositionScarcity {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionScarcity {
    pub fn new() -> Self {
        let entries = Position::DRAFTABLE
            .iter()
            .map(|&pos| {
                (
                    pos,
                    ScarcityEntry {
                        starters_estimate: starters_estimate(pos),
                        drafted_count: 0,
                    },
                )
            })
            .collect();
        PositionScarcity {
            entries,
            unclassified: 0,
        }
    }

    /// Count one drafted player.
    pub fn record(&mut self, position: Position) {
        match self.entries.get_mut(&position) {
            Some(entry) => entry.drafted_count += 1,
            None => self.unclassified += 1,
        }
    }

    /// Drop all counts. Only used on session reset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn entry(&self, position: Position) -> Option<&ScarcityEntry> {
        self.entries.get(&position)
    }

    /// Severity at `position`. Unclassified positions report `Normal`.
    pub fn scarcity(&self, position: Position) -> ScarcityLevel {
        self.entry(position)
            .map(|e| e.level())
            .unwrap_or(ScarcityLevel::Normal)
    }

    pub fn drafted_count(&self, position: Position) -> u32 {
        self.entry(position).map(|e| e.drafted_count).unwrap_or(0)
    }

    pub fn unclassified(&self) -> u32 {
        self.unclassified
    }

    pub fn entries(&self) -> &BTreeMap<Position, ScarcityEntry> {
        &self.entries
    }

    /// Positions ordered most severe first, ties broken by fewest remaining.
    pub fn by_severity(&self) -> Vec<(Position, ScarcityLevel)> {
        let mut ranked: Vec<(Position, ScarcityEntry)> =
            self.entries.iter().map(|(&p, &e)| (p, e)).collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.level()
                .cmp(&a.level())
                .then_with(|| a.remaining().cmp(&b.remaining()))
        });
        ranked.into_iter().map(|(p, e)| (p, e.level())).collect()
    }

    /// Snapshot for presentation.
    pub fn snapshot(&self) -> BTreeMap<Position, ScarcitySnapshot> {
        self.entries
            .iter()
            .map(|(&pos, entry)| {
                (
                    pos,
                    ScarcitySnapshot {
                        starters_estimate: entry.starters_estimate,
                        drafted_count: entry.drafted_count,
                        remaining: entry.remaining(),
                        level: entry.level(),
                    },
                )
            })
            .collect()
    }
}

/// Presentation view of one position's scarcity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScarcitySnapshot {
    pub starters_estimate: u32,
    pub drafted_count: u32,
    pub remaining: i32,
    pub level: ScarcityLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(ScarcityLevel::from_remaining(25), ScarcityLevel::Abundant);
        assert_eq!(ScarcityLevel::from_remaining(20), ScarcityLevel::Abundant);
        assert_eq!(ScarcityLevel::from_remaining(19), ScarcityLevel::Normal);
        assert_eq!(ScarcityLevel::from_remaining(9), ScarcityLevel::Normal);
        assert_eq!(ScarcityLevel::from_remaining(8), ScarcityLevel::Scarce);
        assert_eq!(ScarcityLevel::from_remaining(4), ScarcityLevel::Scarce);
        assert_eq!(ScarcityLevel::from_remaining(3), ScarcityLevel::Critical);
        assert_eq!(ScarcityLevel::from_remaining(-5), ScarcityLevel::Critical);
    }

    #[test]
    fn severity_ordering() {
        assert!(ScarcityLevel::Critical > ScarcityLevel::Scarce);
        assert!(ScarcityLevel::Scarce > ScarcityLevel::Normal);
        assert!(ScarcityLevel::Normal > ScarcityLevel::Abundant);
    }

    #[test]
    fn fresh_tracker_levels() {
        let s = PositionScarcity::new();
        assert_eq!(s.scarcity(Position::WR), ScarcityLevel::Abundant);
        assert_eq!(s.scarcity(Position::RB), ScarcityLevel::Abundant);
        assert_eq!(s.scarcity(Position::QB), ScarcityLevel::Normal);
        assert_eq!(s.scarcity(Position::K), ScarcityLevel::Normal);
    }

    #[test]
    fn severity_never_improves_as_players_are_drafted() {
        for pos in Position::DRAFTABLE {
            let mut s = PositionScarcity::new();
            let mut prev = s.scarcity(pos);
            for _ in 0..50 {
                s.record(pos);
                let level = s.scarcity(pos);
                assert!(level >= prev, "{pos}: {level:?} improved from {prev:?}");
                prev = level;
            }
            assert_eq!(prev, ScarcityLevel::Critical);
        }
    }

    #[test]
    fn record_counts_only_that_position() {
        let mut s = PositionScarcity::new();
        s.record(Position::TE);
        s.record(Position::TE);
        assert_eq!(s.drafted_count(Position::TE), 2);
        assert_eq!(s.drafted_count(Position::QB), 0);
        assert_eq!(s.entry(Position::TE).unwrap().remaining(), 13);
    }

    #[test]
    fn unknown_positions_are_tallied_separately() {
        let mut s = PositionScarcity::new();
        s.record(Position::Unknown);
        assert_eq!(s.unclassified(), 1);
        assert_eq!(s.entries().len(), 6);
        assert_eq!(s.scarcity(Position::Unknown), ScarcityLevel::Normal);
    }

    #[test]
    fn by_severity_puts_critical_first() {
        let mut s = PositionScarcity::new();
        for _ in 0..10 {
            s.record(Position::K);
        }
        for _ in 0..9 {
            s.record(Position::TE);
        }
        let ranked = s.by_severity();
        assert_eq!(ranked[0], (Position::K, ScarcityLevel::Critical));
        assert_eq!(ranked[1], (Position::TE, ScarcityLevel::Scarce));
    }

    #[test]
    fn reset_clears_counts() {
        let mut s = PositionScarcity::new();
        s.record(Position::RB);
        s.record(Position::Unknown);
        s.reset();
        assert_eq!(s.drafted_count(Position::RB), 0);
        assert_eq!(s.unclassified(), 0);
    }
}

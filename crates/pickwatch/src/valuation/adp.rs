// ADP, tier, risk and draftability computed from provider rank data.
//
// The provider only exposes a popularity rank (`search_rank`). ADP is derived
// from it with a deterministic step function, then shifted earlier for
// pass-catchers according to the league's reception scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draft::player::{InjuryStatus, Player, Position, RiskLevel, Tier};

/// ADP sentinel for players that should never be drafted.
pub const UNDRAFTABLE_ADP: f64 = 999.0;

/// Ranks beyond this are treated as undraftable.
pub const MAX_DRAFTABLE_RANK: u32 = 500;

// ---------------------------------------------------------------------------
// Scoring format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    Standard,
    #[default]
    HalfPpr,
    FullPpr,
}

impl ScoringFormat {
    /// Parse a config or provider scoring string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "standard" | "std" | "non_ppr" | "0" => Some(ScoringFormat::Standard),
            "half_ppr" | "half" | "0.5" | "0.5_ppr" => Some(ScoringFormat::HalfPpr),
            "full_ppr" | "ppr" | "full" | "1" | "1.0" => Some(ScoringFormat::FullPpr),
            _ => None,
        }
    }

    /// Fraction of a full point per reception.
    pub fn ppr_factor(&self) -> f64 {
        match self {
            ScoringFormat::Standard => 0.0,
            ScoringFormat::HalfPpr => 0.5,
            ScoringFormat::FullPpr => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoringFormat::Standard => "Standard",
            ScoringFormat::HalfPpr => "Half-PPR",
            ScoringFormat::FullPpr => "Full-PPR",
        }
    }
}

impl fmt::Display for ScoringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ADP
// ---------------------------------------------------------------------------

/// Map a provider rank onto an unadjusted ADP.
///
/// Spread widens with rank: the top dozen are taken almost exactly where they
/// rank, while deep ranks drift further from market ADP.
pub fn base_adp(search_rank: Option<u32>) -> f64 {
    let rank = match search_rank {
        Some(r) if r > 0 && r <= MAX_DRAFTABLE_RANK => r,
        _ => return UNDRAFTABLE_ADP,
    };
    let spread = match rank {
        1..=12 => 0,
        13..=36 => 1,
        37..=84 => 3,
        85..=200 => 6,
        _ => 12,
    };
    f64::from(rank + spread)
}

/// Picks gained by a pass-catcher under full PPR, by how early it already goes.
fn full_ppr_boost(position: Position, adp: f64) -> f64 {
    let (wr, rb_te) = if adp <= 24.0 {
        (8.0, 4.0)
    } else if adp <= 60.0 {
        (6.0, 3.0)
    } else if adp <= 120.0 {
        (4.0, 2.0)
    } else if adp <= 300.0 {
        (2.0, 1.0)
    } else {
        (0.0, 0.0)
    };
    match position {
        Position::WR => wr,
        Position::RB | Position::TE => rb_te,
        _ => 0.0,
    }
}

/// Apply the reception-scoring shift to an unadjusted ADP.
///
/// QB, K and DEF are untouched; undraftable players stay undraftable.
pub fn scoring_adjusted_adp(adp: f64, position: Position, format: ScoringFormat) -> f64 {
    if adp >= UNDRAFTABLE_ADP || !position.is_pass_catcher() {
        return adp;
    }
    let boost = (full_ppr_boost(position, adp) * format.ppr_factor()).round();
    (adp - boost).max(1.0)
}

/// Full ADP pipeline: rank step function, then scoring adjustment.
pub fn compute_adp(search_rank: Option<u32>, position: Position, format: ScoringFormat) -> f64 {
    scoring_adjusted_adp(base_adp(search_rank), position, format)
}

// ---------------------------------------------------------------------------
// Tier and risk
// ---------------------------------------------------------------------------

pub fn tier_for_adp(adp: f64) -> Tier {
    if adp <= 36.0 {
        Tier::Elite
    } else if adp <= 72.0 {
        Tier::High
    } else if adp <= 120.0 {
        Tier::Mid
    } else if adp <= 180.0 {
        Tier::Deep
    } else {
        Tier::Flyer
    }
}

pub fn compute_tier(search_rank: Option<u32>, position: Position, format: ScoringFormat) -> Tier {
    tier_for_adp(compute_adp(search_rank, position, format))
}

pub fn compute_risk(age: Option<u32>, years_experience: u32, injury: Option<&InjuryStatus>) -> RiskLevel {
    let mut score = 0;
    if age.is_some_and(|a| a > 30) {
        score += 2;
    }
    if years_experience < 2 {
        score += 1;
    }
    if injury.is_some() {
        score += 3;
    }
    match score {
        s if s >= 4 => RiskLevel::High,
        s if s >= 2 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

// ---------------------------------------------------------------------------
// Draftability
// ---------------------------------------------------------------------------

/// Whether a player can realistically be taken in `current_round`.
pub fn is_draftable(player: &Player, current_round: u32) -> bool {
    if !player.active || !player.position.is_draftable() {
        return false;
    }
    if player.team.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return false;
    }
    match &player.injury {
        Some(status) if status.is_long_term() => return false,
        Some(InjuryStatus::Doubtful) if current_round < 9 => return false,
        _ => {}
    }
    if !player.adp.is_finite() || player.adp > 400.0 {
        return false;
    }
    if player.adp > 300.0 && current_round < 13 {
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Thin-position back-fill
// ---------------------------------------------------------------------------

/// Default ADP for kickers and defenses that lack a usable rank.
///
/// `index` is the player's order within its position (best first); the band
/// spreads them over 20 picks so ordering survives.
pub fn default_band_adp(position: Position, index: usize) -> Option<f64> {
    let start = match position {
        Position::K => 180.0,
        Position::DEF => 190.0,
        _ => return None,
    };
    Some(start + (index.min(20)) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scoring_format_parse() {
        assert_eq!(ScoringFormat::parse("ppr"), Some(ScoringFormat::FullPpr));
        assert_eq!(ScoringFormat::parse("Full-PPR"), Some(ScoringFormat::FullPpr));
        assert_eq!(ScoringFormat::parse("half_ppr"), Some(ScoringFormat::HalfPpr));
        assert_eq!(ScoringFormat::parse("Half PPR"), Some(ScoringFormat::HalfPpr));
        assert_eq!(ScoringFormat::parse("standard"), Some(ScoringFormat::Standard));
        assert_eq!(ScoringFormat::parse("bogus"), None);
        assert_eq!(ScoringFormat::default(), ScoringFormat::HalfPpr);
    }

    #[test]
    fn base_adp_undraftable_ranks() {
        assert!(approx_eq(base_adp(None), UNDRAFTABLE_ADP));
        assert!(approx_eq(base_adp(Some(0)), UNDRAFTABLE_ADP));
        assert!(approx_eq(base_adp(Some(501)), UNDRAFTABLE_ADP));
        assert!(approx_eq(base_adp(Some(9999999)), UNDRAFTABLE_ADP));
    }

    #[test]
    fn base_adp_is_monotonic() {
        let mut prev = 0.0;
        for rank in 1..=MAX_DRAFTABLE_RANK {
            let adp = base_adp(Some(rank));
            assert!(adp >= prev, "rank {rank} gave {adp} < {prev}");
            prev = adp;
        }
    }

    #[test]
    fn base_adp_tight_at_top() {
        assert!(approx_eq(base_adp(Some(1)), 1.0));
        assert!(approx_eq(base_adp(Some(12)), 12.0));
    }

    #[test]
    fn full_ppr_wr_at_forty_moves_up_six() {
        let adjusted = scoring_adjusted_adp(40.0, Position::WR, ScoringFormat::FullPpr);
        assert!(approx_eq(adjusted, 34.0));
    }

    #[test]
    fn half_ppr_is_half_the_shift() {
        let adjusted = scoring_adjusted_adp(40.0, Position::WR, ScoringFormat::HalfPpr);
        assert!(approx_eq(adjusted, 37.0));
    }

    #[test]
    fn standard_scoring_leaves_adp_alone() {
        for pos in Position::DRAFTABLE {
            assert!(approx_eq(
                scoring_adjusted_adp(40.0, pos, ScoringFormat::Standard),
                40.0
            ));
        }
    }

    #[test]
    fn non_pass_catchers_unaffected() {
        for pos in [Position::QB, Position::K, Position::DEF] {
            assert!(approx_eq(
                scoring_adjusted_adp(40.0, pos, ScoringFormat::FullPpr),
                40.0
            ));
        }
    }

    #[test]
    fn adjusted_adp_never_below_one() {
        assert!(approx_eq(
            scoring_adjusted_adp(3.0, Position::WR, ScoringFormat::FullPpr),
            1.0
        ));
    }

    #[test]
    fn wr_gains_more_than_rb_and_te() {
        let wr = scoring_adjusted_adp(100.0, Position::WR, ScoringFormat::FullPpr);
        let rb = scoring_adjusted_adp(100.0, Position::RB, ScoringFormat::FullPpr);
        let te = scoring_adjusted_adp(100.0, Position::TE, ScoringFormat::FullPpr);
        assert!(wr < rb);
        assert!(approx_eq(rb, te));
    }

    #[test]
    fn rank_five_is_elite_in_every_format() {
        for format in [ScoringFormat::Standard, ScoringFormat::HalfPpr, ScoringFormat::FullPpr] {
            for pos in Position::DRAFTABLE {
                assert_eq!(compute_tier(Some(5), pos, format), Tier::Elite);
            }
        }
    }

    #[test]
    fn compute_tier_is_deterministic() {
        for rank in [1, 37, 88, 150, 240, 480] {
            let first = compute_tier(Some(rank), Position::WR, ScoringFormat::FullPpr);
            for _ in 0..20 {
                assert_eq!(compute_tier(Some(rank), Position::WR, ScoringFormat::FullPpr), first);
            }
        }
    }

    #[test]
    fn tier_buckets() {
        assert_eq!(tier_for_adp(36.0), Tier::Elite);
        assert_eq!(tier_for_adp(36.5), Tier::High);
        assert_eq!(tier_for_adp(72.0), Tier::High);
        assert_eq!(tier_for_adp(120.0), Tier::Mid);
        assert_eq!(tier_for_adp(180.0), Tier::Deep);
        assert_eq!(tier_for_adp(181.0), Tier::Flyer);
        assert_eq!(tier_for_adp(UNDRAFTABLE_ADP), Tier::Flyer);
    }

    #[test]
    fn risk_scoring() {
        assert_eq!(compute_risk(Some(25), 5, None), RiskLevel::Low);
        assert_eq!(compute_risk(Some(22), 0, None), RiskLevel::Low);
        assert_eq!(compute_risk(Some(31), 9, None), RiskLevel::Medium);
        assert_eq!(compute_risk(Some(31), 1, None), RiskLevel::Medium);
        assert_eq!(
            compute_risk(Some(26), 4, Some(&InjuryStatus::Questionable)),
            RiskLevel::Medium
        );
        assert_eq!(
            compute_risk(Some(26), 1, Some(&InjuryStatus::Questionable)),
            RiskLevel::High
        );
        assert_eq!(compute_risk(None, 5, None), RiskLevel::Low);
    }

    fn player(adp: f64) -> Player {
        Player {
            id: "1".into(),
            name: "Test Player".into(),
            position: Position::RB,
            team: Some("DAL".into()),
            years_experience: 3,
            college: None,
            rookie: false,
            age: Some(25),
            injury: None,
            active: true,
            search_rank: Some(50),
            adp,
            tier: tier_for_adp(adp),
            risk: RiskLevel::Low,
            trending_adds: None,
        }
    }

    #[test]
    fn draftable_baseline() {
        assert!(is_draftable(&player(50.0), 1));
    }

    #[test]
    fn inactive_and_free_agents_excluded() {
        let mut p = player(50.0);
        p.active = false;
        assert!(!is_draftable(&p, 10));

        let mut p = player(50.0);
        p.team = None;
        assert!(!is_draftable(&p, 10));

        let mut p = player(50.0);
        p.team = Some(String::new());
        assert!(!is_draftable(&p, 10));
    }

    #[test]
    fn long_term_designations_always_excluded() {
        for status in [
            InjuryStatus::InjuredReserve,
            InjuryStatus::PhysicallyUnable,
            InjuryStatus::Suspended,
            InjuryStatus::Covid,
        ] {
            let mut p = player(50.0);
            p.injury = Some(status);
            assert!(!is_draftable(&p, 15));
        }
    }

    #[test]
    fn doubtful_allowed_from_round_nine() {
        let mut p = player(50.0);
        p.injury = Some(InjuryStatus::Doubtful);
        assert!(!is_draftable(&p, 8));
        assert!(is_draftable(&p, 9));
    }

    #[test]
    fn deep_adp_allowed_late_only() {
        let p = player(350.0);
        assert!(!is_draftable(&p, 12));
        assert!(is_draftable(&p, 13));
        assert!(!is_draftable(&player(401.0), 15));
        assert!(!is_draftable(&player(UNDRAFTABLE_ADP), 15));
        assert!(!is_draftable(&player(f64::NAN), 15));
    }

    #[test]
    fn default_band_for_thin_positions() {
        assert_eq!(default_band_adp(Position::K, 0), Some(180.0));
        assert_eq!(default_band_adp(Position::K, 50), Some(200.0));
        assert_eq!(default_band_adp(Position::DEF, 3), Some(193.0));
        assert_eq!(default_band_adp(Position::WR, 0), None);
    }
}

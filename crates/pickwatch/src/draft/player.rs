// Player model: positions, tiers, risk levels and injury designations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fantasy football positions tracked by the draft.
///
/// `Unknown` is the sentinel bucket for provider codes we cannot classify
/// (e.g. "OL", "LB" on an IDP-less league). It is never draftable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
    Unknown,
}

impl Position {
    /// The six draftable positions, in display order.
    pub const DRAFTABLE: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DEF,
    ];

    /// Canonicalize a provider position code.
    ///
    /// Handles the common defense aliases ("DST", "D/ST", "DEF", "D") and
    /// kicker aliases ("PK"). Anything else maps to `Unknown`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "QB" => Position::QB,
            "RB" | "HB" | "FB" => Position::RB,
            "WR" => Position::WR,
            "TE" => Position::TE,
            "K" | "PK" => Position::K,
            "DEF" | "DST" | "D/ST" | "D" | "DST/DEF" => Position::DEF,
            _ => Position::Unknown,
        }
    }

    /// Pick the first draftable position from a `fantasy_positions` list,
    /// falling back to the primary `position` field.
    pub fn from_provider(fantasy_positions: &[String], primary: Option<&str>) -> Self {
        fantasy_positions
            .iter()
            .map(|p| Position::normalize(p))
            .find(|p| p.is_draftable())
            .or_else(|| primary.map(Position::normalize))
            .unwrap_or(Position::Unknown)
    }

    pub fn is_draftable(&self) -> bool {
        !matches!(self, Position::Unknown)
    }

    /// Reception-heavy positions whose value moves with PPR scoring.
    pub fn is_pass_catcher(&self) -> bool {
        matches!(self, Position::RB | Position::WR | Position::TE)
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DEF => "DEF",
            Position::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Value tier derived from the scoring-adjusted rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Elite,
    High,
    Mid,
    Deep,
    Flyer,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Elite => "Elite",
            Tier::High => "High",
            Tier::Mid => "Mid",
            Tier::Deep => "Deep",
            Tier::Flyer => "Flyer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Injury designation as reported by the provider's `injury_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjuryStatus {
    Questionable,
    Doubtful,
    Out,
    InjuredReserve,
    PhysicallyUnable,
    Suspended,
    Covid,
    Other(String),
}

impl InjuryStatus {
    /// Parse a provider injury string. Empty strings mean "no designation".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let status = match trimmed.to_uppercase().as_str() {
            "Q" | "QUESTIONABLE" => InjuryStatus::Questionable,
            "D" | "DOUBTFUL" => InjuryStatus::Doubtful,
            "O" | "OUT" => InjuryStatus::Out,
            "IR" | "INJURED RESERVE" => InjuryStatus::InjuredReserve,
            "PUP" => InjuryStatus::PhysicallyUnable,
            "SUS" | "SUSPENDED" => InjuryStatus::Suspended,
            "COV" | "COVID" => InjuryStatus::Covid,
            _ => InjuryStatus::Other(trimmed.to_string()),
        };
        Some(status)
    }

    /// Designations that make a player unavailable for the foreseeable future.
    pub fn is_long_term(&self) -> bool {
        matches!(
            self,
            InjuryStatus::InjuredReserve
                | InjuryStatus::PhysicallyUnable
                | InjuryStatus::Suspended
                | InjuryStatus::Covid
        )
    }

    pub fn label(&self) -> &str {
        match self {
            InjuryStatus::Questionable => "Questionable",
            InjuryStatus::Doubtful => "Doubtful",
            InjuryStatus::Out => "Out",
            InjuryStatus::InjuredReserve => "IR",
            InjuryStatus::PhysicallyUnable => "PUP",
            InjuryStatus::Suspended => "Suspended",
            InjuryStatus::Covid => "COVID",
            InjuryStatus::Other(s) => s.as_str(),
        }
    }
}

/// A draftable player with computed valuation fields.
///
/// Immutable for the lifetime of a session; the whole catalog is rebuilt if
/// the scoring format changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Provider player ID (`player_id`).
    pub id: String,
    pub name: String,
    pub position: Position,
    /// NFL team abbreviation; `None` for free agents.
    pub team: Option<String>,
    pub years_experience: u32,
    pub college: Option<String>,
    pub rookie: bool,
    pub age: Option<u32>,
    pub injury: Option<InjuryStatus>,
    /// Whether the provider lists the player as active.
    pub active: bool,
    /// Provider popularity rank (`search_rank`), if ranked at all.
    pub search_rank: Option<u32>,
    /// Scoring-adjusted ADP. 999.0 means undraftable.
    pub adp: f64,
    pub tier: Tier,
    pub risk: RiskLevel,
    /// Trending add count over the provider's lookback window.
    #[serde(default)]
    pub trending_adds: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_standard_codes() {
        assert_eq!(Position::normalize("QB"), Position::QB);
        assert_eq!(Position::normalize("rb"), Position::RB);
        assert_eq!(Position::normalize(" WR "), Position::WR);
        assert_eq!(Position::normalize("TE"), Position::TE);
        assert_eq!(Position::normalize("K"), Position::K);
    }

    #[test]
    fn normalize_defense_aliases() {
        for raw in ["DEF", "DST", "D/ST", "dst", "D"] {
            assert_eq!(Position::normalize(raw), Position::DEF, "alias {raw}");
        }
    }

    #[test]
    fn normalize_unknown_codes_map_to_sentinel() {
        assert_eq!(Position::normalize("LB"), Position::Unknown);
        assert_eq!(Position::normalize(""), Position::Unknown);
        assert_eq!(Position::normalize("OL"), Position::Unknown);
        assert!(!Position::Unknown.is_draftable());
    }

    #[test]
    fn from_provider_prefers_fantasy_positions() {
        let fp = vec!["LB".to_string(), "TE".to_string()];
        assert_eq!(Position::from_provider(&fp, Some("WR")), Position::TE);
        assert_eq!(Position::from_provider(&[], Some("DST")), Position::DEF);
        assert_eq!(Position::from_provider(&[], None), Position::Unknown);
    }

    #[test]
    fn pass_catchers() {
        assert!(Position::WR.is_pass_catcher());
        assert!(Position::RB.is_pass_catcher());
        assert!(Position::TE.is_pass_catcher());
        assert!(!Position::QB.is_pass_catcher());
        assert!(!Position::DEF.is_pass_catcher());
    }

    #[test]
    fn injury_parse() {
        assert_eq!(InjuryStatus::parse(""), None);
        assert_eq!(InjuryStatus::parse("  "), None);
        assert_eq!(InjuryStatus::parse("IR"), Some(InjuryStatus::InjuredReserve));
        assert_eq!(InjuryStatus::parse("Sus"), Some(InjuryStatus::Suspended));
        assert_eq!(InjuryStatus::parse("Doubtful"), Some(InjuryStatus::Doubtful));
        assert_eq!(
            InjuryStatus::parse("NA"),
            Some(InjuryStatus::Other("NA".to_string()))
        );
        assert!(InjuryStatus::PhysicallyUnable.is_long_term());
        assert!(!InjuryStatus::Questionable.is_long_term());
    }
}

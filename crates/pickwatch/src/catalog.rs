// Player catalog: the normalized, valued view of every draftable player.
//
// Built once per session from the provider's player map (or a local CSV
// snapshot). When neither is available, a small fixed demo catalog stands in
// and every output derived from it is flagged.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::draft::player::{InjuryStatus, Player, Position};
use crate::provider::{RawPlayer, TrendingPlayer};
use crate::valuation::adp::{compute_adp, compute_risk, tier_for_adp, ScoringFormat};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("player catalog is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// PlayerCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlayerCatalog {
    /// Sorted by ascending ADP, ties broken by name.
    players: Vec<Player>,
    index: HashMap<String, usize>,
    format: ScoringFormat,
    is_demo: bool,
}

impl PlayerCatalog {
    fn from_players(mut players: Vec<Player>, format: ScoringFormat, is_demo: bool) -> Self {
        players.sort_by(|a, b| {
            a.adp
                .partial_cmp(&b.adp)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        let index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        PlayerCatalog {
            players,
            index,
            format,
            is_demo,
        }
    }

    /// An empty catalog (still loading or failed to load).
    pub fn empty(format: ScoringFormat) -> Self {
        Self::from_players(Vec::new(), format, false)
    }

    /// Build from the provider's `players/nfl` map.
    ///
    /// Players outside the six draftable positions are skipped.
    pub fn from_provider(raw: &HashMap<String, RawPlayer>, format: ScoringFormat) -> Self {
        let players: Vec<Player> = raw
            .iter()
            .filter_map(|(id, rp)| player_from_raw(id, rp, format))
            .collect();
        let skipped = raw.len() - players.len();
        info!(
            "Catalog built from provider: {} draftable players ({} skipped)",
            players.len(),
            skipped
        );
        Self::from_players(players, format, false)
    }

    /// Import a catalog snapshot from CSV.
    ///
    /// Expected headers: `player_id,name,position,team,search_rank,years_exp,age,injury_status,college`.
    pub fn from_csv(path: &Path, format: ScoringFormat) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_csv_reader(file, format).map_err(|e| match e {
            CatalogError::Csv { source, .. } => CatalogError::Csv {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_csv_reader<R: std::io::Read>(
        reader: R,
        format: ScoringFormat,
    ) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut players = Vec::new();
        for (line, result) in rdr.deserialize::<CsvPlayerRow>().enumerate() {
            let row = result.map_err(|e| CatalogError::Csv {
                path: "<reader>".into(),
                source: e,
            })?;
            let raw = RawPlayer {
                player_id: row.player_id.clone(),
                full_name: Some(row.name),
                position: Some(row.position),
                team: row.team.filter(|t| !t.is_empty()),
                years_exp: row.years_exp,
                college: row.college.filter(|c| !c.is_empty()),
                age: row.age,
                injury_status: row.injury_status,
                search_rank: row.search_rank,
                active: Some(true),
                ..Default::default()
            };
            match player_from_raw(&row.player_id, &raw, format) {
                Some(p) => players.push(p),
                None => warn!("Skipping CSV row {}: unrecognized position", line + 2),
            }
        }
        if players.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self::from_players(players, format, false))
    }

    /// Fixed fallback catalog used when the real one is unavailable.
    pub fn demo(format: ScoringFormat) -> Self {
        let players = DEMO_PLAYERS
            .iter()
            .map(|&(id, name, pos, team, rank, exp, age)| {
                let raw = RawPlayer {
                    player_id: id.to_string(),
                    full_name: Some(name.to_string()),
                    position: Some(pos.to_string()),
                    team: Some(team.to_string()),
                    search_rank: Some(rank),
                    years_exp: Some(exp),
                    age: Some(age),
                    active: Some(true),
                    ..Default::default()
                };
                player_from_raw(id, &raw, format)
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        Self::from_players(players, format, true)
    }

    /// Recompute every valuation for a different scoring format.
    pub fn rescored(&self, format: ScoringFormat) -> Self {
        if format == self.format {
            return self.clone();
        }
        let players = self
            .players
            .iter()
            .map(|p| {
                let adp = compute_adp(p.search_rank, p.position, format);
                Player {
                    adp,
                    tier: tier_for_adp(adp),
                    ..p.clone()
                }
            })
            .collect();
        Self::from_players(players, format, self.is_demo)
    }

    /// Attach trending add counts.
    pub fn apply_trending(&mut self, trending: &[TrendingPlayer]) {
        for t in trending {
            if let Some(&i) = self.index.get(&t.player_id) {
                self.players[i].trending_adds = Some(t.count);
            }
        }
    }

    pub fn get(&self, player_id: &str) -> Option<&Player> {
        self.index.get(player_id).map(|&i| &self.players[i])
    }

    /// All players, best ADP first.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn by_position(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.position == position)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn format(&self) -> ScoringFormat {
        self.format
    }

    pub fn is_demo(&self) -> bool {
        self.is_demo
    }
}

/// Convert one provider record into a valued `Player`.
fn player_from_raw(id: &str, raw: &RawPlayer, format: ScoringFormat) -> Option<Player> {
    let fantasy_positions = raw.fantasy_positions.clone().unwrap_or_default();
    let position = Position::from_provider(&fantasy_positions, raw.position.as_deref());
    if !position.is_draftable() {
        return None;
    }

    let player_id = if raw.player_id.is_empty() {
        id.to_string()
    } else {
        raw.player_id.clone()
    };
    let injury = raw.injury_status.as_deref().and_then(InjuryStatus::parse);
    let years_experience = raw.years_exp.unwrap_or(0);
    let active = raw.active.unwrap_or_else(|| {
        raw.status
            .as_deref()
            .map_or(true, |s| s.eq_ignore_ascii_case("active"))
    });
    // Team defenses are keyed by team abbreviation and carry no team field.
    let team = raw
        .team
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| (position == Position::DEF).then(|| player_id.clone()));

    let adp = compute_adp(raw.search_rank, position, format);
    let name = match raw.display_name() {
        n if n.is_empty() => player_id.clone(),
        n => n,
    };

    Some(Player {
        id: player_id,
        name,
        position,
        team,
        years_experience,
        college: raw.college.clone(),
        rookie: raw.years_exp == Some(0),
        age: raw.age,
        risk: compute_risk(raw.age, years_experience, injury.as_ref()),
        injury,
        active,
        search_rank: raw.search_rank,
        adp,
        tier: tier_for_adp(adp),
        trending_adds: None,
    })
}

#[derive(Debug, Deserialize)]
struct CsvPlayerRow {
    player_id: String,
    name: String,
    position: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    search_rank: Option<u32>,
    #[serde(default)]
    years_exp: Option<u32>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    injury_status: Option<String>,
    #[serde(default)]
    college: Option<String>,
}

/// (id, name, position, team, search_rank, years_exp, age)
const DEMO_PLAYERS: &[(&str, &str, &str, &str, u32, u32, u32)] = &[
    ("demo-01", "Christian McCaffrey", "RB", "SF", 1, 8, 30),
    ("demo-02", "Ja'Marr Chase", "WR", "CIN", 2, 5, 26),
    ("demo-03", "Justin Jefferson", "WR", "MIN", 3, 6, 27),
    ("demo-04", "Bijan Robinson", "RB", "ATL", 4, 3, 24),
    ("demo-05", "CeeDee Lamb", "WR", "DAL", 5, 6, 27),
    ("demo-06", "Saquon Barkley", "RB", "PHI", 6, 8, 29),
    ("demo-07", "Jahmyr Gibbs", "RB", "DET", 7, 3, 24),
    ("demo-08", "Amon-Ra St. Brown", "WR", "DET", 8, 5, 26),
    ("demo-09", "Puka Nacua", "WR", "LAR", 11, 3, 25),
    ("demo-10", "Breece Hall", "RB", "NYJ", 15, 4, 25),
    ("demo-11", "Josh Allen", "QB", "BUF", 20, 8, 30),
    ("demo-12", "Lamar Jackson", "QB", "BAL", 24, 8, 29),
    ("demo-13", "Brock Bowers", "TE", "LV", 22, 2, 23),
    ("demo-14", "Trey McBride", "TE", "ARI", 40, 4, 26),
    ("demo-15", "Garrett Wilson", "WR", "NYJ", 30, 4, 25),
    ("demo-16", "Kyren Williams", "RB", "LAR", 33, 4, 25),
    ("demo-17", "Jalen Hurts", "QB", "PHI", 45, 6, 27),
    ("demo-18", "Sam LaPorta", "TE", "DET", 60, 3, 24),
    ("demo-19", "James Cook", "RB", "BUF", 50, 4, 26),
    ("demo-20", "DK Metcalf", "WR", "PIT", 70, 7, 28),
    ("demo-21", "Brandon Aubrey", "K", "DAL", 150, 2, 30),
    ("demo-22", "Jake Elliott", "K", "PHI", 190, 9, 30),
    ("demo-23", "Baltimore Ravens", "DEF", "BAL", 160, 0, 0),
    ("demo-24", "Philadelphia Eagles", "DEF", "PHI", 175, 0, 0),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::player::Tier;

    fn raw(id: &str, pos: &str, rank: Option<u32>) -> RawPlayer {
        RawPlayer {
            player_id: id.into(),
            first_name: Some("First".into()),
            last_name: Some(id.into()),
            position: Some(pos.into()),
            fantasy_positions: Some(vec![pos.into()]),
            team: Some("KC".into()),
            years_exp: Some(3),
            age: Some(26),
            search_rank: rank,
            active: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn from_provider_skips_non_fantasy_positions() {
        let mut map = HashMap::new();
        map.insert("1".to_string(), raw("1", "WR", Some(10)));
        map.insert("2".to_string(), raw("2", "OL", Some(900)));
        map.insert("3".to_string(), raw("3", "RB", Some(4)));
        let catalog = PlayerCatalog::from_provider(&map, ScoringFormat::HalfPpr);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("2").is_none());
        assert!(!catalog.is_demo());
    }

    #[test]
    fn players_sorted_by_adp() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), raw("a", "QB", Some(80)));
        map.insert("b".to_string(), raw("b", "RB", Some(2)));
        map.insert("c".to_string(), raw("c", "TE", None));
        let catalog = PlayerCatalog::from_provider(&map, ScoringFormat::Standard);
        let ids: Vec<&str> = catalog.players().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(catalog.get("b").unwrap().tier, Tier::Elite);
    }

    #[test]
    fn defense_without_team_uses_its_own_id() {
        let mut def = raw("KC", "DEF", Some(170));
        def.team = None;
        let p = player_from_raw("KC", &def, ScoringFormat::Standard).unwrap();
        assert_eq!(p.team.as_deref(), Some("KC"));
    }

    #[test]
    fn inactive_status_string_respected() {
        let mut r = raw("9", "WR", Some(100));
        r.active = None;
        r.status = Some("Inactive".into());
        let p = player_from_raw("9", &r, ScoringFormat::Standard).unwrap();
        assert!(!p.active);
    }

    #[test]
    fn rookie_flag_from_experience() {
        let mut r = raw("r", "RB", Some(60));
        r.years_exp = Some(0);
        let p = player_from_raw("r", &r, ScoringFormat::Standard).unwrap();
        assert!(p.rookie);
    }

    #[test]
    fn demo_catalog_is_flagged_and_populated() {
        let catalog = PlayerCatalog::demo(ScoringFormat::HalfPpr);
        assert!(catalog.is_demo());
        assert_eq!(catalog.len(), DEMO_PLAYERS.len());
        for pos in Position::DRAFTABLE {
            assert!(catalog.by_position(pos).next().is_some(), "demo lacks {pos}");
        }
    }

    #[test]
    fn rescored_changes_pass_catcher_adp() {
        let catalog = PlayerCatalog::demo(ScoringFormat::Standard);
        let ppr = catalog.rescored(ScoringFormat::FullPpr);
        assert_eq!(ppr.format(), ScoringFormat::FullPpr);
        assert!(ppr.is_demo());
        let wr_std = catalog.get("demo-15").unwrap().adp;
        let wr_ppr = ppr.get("demo-15").unwrap().adp;
        assert!(wr_ppr < wr_std);
        let qb_std = catalog.get("demo-11").unwrap().adp;
        let qb_ppr = ppr.get("demo-11").unwrap().adp;
        assert_eq!(qb_std, qb_ppr);
    }

    #[test]
    fn trending_counts_attach() {
        let mut catalog = PlayerCatalog::demo(ScoringFormat::HalfPpr);
        catalog.apply_trending(&[
            TrendingPlayer {
                player_id: "demo-10".into(),
                count: 412,
            },
            TrendingPlayer {
                player_id: "nobody".into(),
                count: 9,
            },
        ]);
        assert_eq!(catalog.get("demo-10").unwrap().trending_adds, Some(412));
    }

    #[test]
    fn csv_import() {
        let data = "\
player_id,name,position,team,search_rank,years_exp,age,injury_status,college
100,Alpha Back,RB,NYG,12,2,24,,Georgia
200,Beta Wideout,WR,SEA,30,5,27,Questionable,
300,Gamma Lineman,OT,SEA,999,5,27,,
";
        let catalog =
            PlayerCatalog::from_csv_reader(data.as_bytes(), ScoringFormat::HalfPpr).unwrap();
        assert_eq!(catalog.len(), 2);
        let wr = catalog.get("200").unwrap();
        assert_eq!(wr.injury, Some(InjuryStatus::Questionable));
        assert_eq!(catalog.get("100").unwrap().college.as_deref(), Some("Georgia"));
    }

    #[test]
    fn csv_import_rejects_empty() {
        let data = "player_id,name,position\n";
        let err = PlayerCatalog::from_csv_reader(data.as_bytes(), ScoringFormat::HalfPpr)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }
}

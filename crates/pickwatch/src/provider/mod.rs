// Draft data provider boundary: wire types and the read-only provider trait.
//
// The core treats provider payloads as opaque records keyed by a handful of
// documented fields (`player_id`, `pick_no`, `roster_id`, `owner_id`, ...).
// Everything else is ignored via `#[serde(default)]`.

pub mod sleeper;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout or 5xx. Retried on the next poll cycle.
    #[error("transient fetch error: {message}")]
    Transient { message: String },

    /// The requested resource does not exist (404 or `null` body).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The provider answered but the body could not be decoded.
    #[error("malformed response from {resource}: {message}")]
    Malformed { resource: String, message: String },
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        ProviderError::Transient {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ProviderError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Draft metadata (`GET draft/{id}` and entries of `league/{id}/drafts`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftMetadata {
    pub draft_id: String,
    #[serde(default)]
    pub league_id: Option<String>,
    /// `pre_draft`, `drafting`, `paused` or `complete`.
    #[serde(default)]
    pub status: String,
    /// `snake`, `linear` or `auction`.
    #[serde(default, rename = "type")]
    pub draft_type: String,
    #[serde(default)]
    pub settings: DraftSettings,
    /// user_id -> draft slot (1-based).
    #[serde(default)]
    pub draft_order: Option<HashMap<String, u32>>,
    /// draft slot (as a string key) -> roster_id.
    #[serde(default)]
    pub slot_to_roster_id: Option<HashMap<String, u32>>,
    #[serde(default)]
    pub start_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftSettings {
    #[serde(default)]
    pub teams: u32,
    #[serde(default)]
    pub rounds: u32,
    #[serde(default)]
    pub pick_timer: u32,
    /// Round at which a snake draft repeats direction (third-round reversal).
    /// 0 means no reversal.
    #[serde(default)]
    pub reversal_round: u32,
}

/// An entry of `GET draft/{id}/picks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPick {
    pub pick_no: u32,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub draft_slot: u32,
    #[serde(default)]
    pub roster_id: Option<u32>,
    #[serde(default)]
    pub picked_by: Option<String>,
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub metadata: PickMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PickMetadata {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

/// An entry of `GET league/{id}/rosters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRoster {
    pub roster_id: u32,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub settings: RosterSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSettings {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    #[serde(default)]
    pub fpts: f64,
}

/// A league member or a user looked up by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl RawUser {
    /// Case-insensitive match against either the username or display name.
    pub fn matches_name(&self, name: &str) -> bool {
        [self.username.as_deref(), self.display_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// A value of the `GET players/nfl` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlayer {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub fantasy_positions: Option<Vec<String>>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub years_exp: Option<u32>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub injury_status: Option<String>,
    /// `Active`, `Inactive`, ...
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub search_rank: Option<u32>,
}

impl RawPlayer {
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().filter(|s| !s.is_empty()) {
            return full.to_string();
        }
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

/// An entry of `GET players/nfl/trending/add`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingPlayer {
    pub player_id: String,
    #[serde(default)]
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Read-only access to the external draft host.
///
/// There is no write path: picks are never submitted back to the provider.
#[async_trait]
pub trait DraftDataProvider: Send + Sync {
    async fn league_drafts(&self, league_id: &str) -> Result<Vec<DraftMetadata>, ProviderError>;

    async fn draft(&self, draft_id: &str) -> Result<DraftMetadata, ProviderError>;

    /// The authoritative, append-only pick list.
    async fn draft_picks(&self, draft_id: &str) -> Result<Vec<RawPick>, ProviderError>;

    async fn league_rosters(&self, league_id: &str) -> Result<Vec<RawRoster>, ProviderError>;

    async fn league_users(&self, league_id: &str) -> Result<Vec<RawUser>, ProviderError>;

    /// Look up a user by username. `Ok(None)` when no such user exists.
    async fn user(&self, username: &str) -> Result<Option<RawUser>, ProviderError>;

    /// The full player catalog keyed by player ID.
    async fn players(&self) -> Result<HashMap<String, RawPlayer>, ProviderError>;

    async fn trending_adds(
        &self,
        lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingPlayer>, ProviderError>;
}

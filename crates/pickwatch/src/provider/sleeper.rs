// HTTP client for the Sleeper public API.
//
// All endpoints are unauthenticated GETs returning JSON. Unknown resources
// come back either as 404 or as a literal `null` body; both map to
// `ProviderError::NotFound`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    DraftDataProvider, DraftMetadata, ProviderError, RawPick, RawPlayer, RawRoster, RawUser,
    TrendingPlayer,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SLEEPER_API_URL: &str = "https://api.sleeper.app/v1";

/// Default per-request timeout. Covers the multi-megabyte players body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// SleeperClient
// ---------------------------------------------------------------------------

pub struct SleeperClient {
    http: reqwest::Client,
    base_url: String,
}

impl SleeperClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pickwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and decode the body. A `null` body becomes `NotFound`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await.map_err(map_send_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(path));
        }
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::transient(format!("{path}: HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ProviderError::Malformed {
                resource: path.to_string(),
                message: format!("unexpected HTTP {status}"),
            });
        }

        let body: Option<T> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::transient(format!("{path}: {e}"))
            } else {
                ProviderError::Malformed {
                    resource: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        body.ok_or_else(|| ProviderError::not_found(path))
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    // Anything that fails before a response arrives is worth retrying.
    ProviderError::transient(e.to_string())
}

#[async_trait]
impl DraftDataProvider for SleeperClient {
    async fn league_drafts(&self, league_id: &str) -> Result<Vec<DraftMetadata>, ProviderError> {
        self.get_json(&format!("league/{league_id}/drafts")).await
    }

    async fn draft(&self, draft_id: &str) -> Result<DraftMetadata, ProviderError> {
        self.get_json(&format!("draft/{draft_id}")).await
    }

    async fn draft_picks(&self, draft_id: &str) -> Result<Vec<RawPick>, ProviderError> {
        self.get_json(&format!("draft/{draft_id}/picks")).await
    }

    async fn league_rosters(&self, league_id: &str) -> Result<Vec<RawRoster>, ProviderError> {
        self.get_json(&format!("league/{league_id}/rosters")).await
    }

    async fn league_users(&self, league_id: &str) -> Result<Vec<RawUser>, ProviderError> {
        self.get_json(&format!("league/{league_id}/users")).await
    }

    async fn user(&self, username: &str) -> Result<Option<RawUser>, ProviderError> {
        match self.get_json(&format!("user/{username}")).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn players(&self) -> Result<HashMap<String, RawPlayer>, ProviderError> {
        self.get_json("players/nfl").await
    }

    async fn trending_adds(
        &self,
        lookback_hours: u32,
        limit: u32,
    ) -> Result<Vec<TrendingPlayer>, ProviderError> {
        self.get_json(&format!(
            "players/nfl/trending/add?lookback_hours={lookback_hours}&limit={limit}"
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slashes() {
        let client = SleeperClient::new("https://api.example.test/v1/", DEFAULT_REQUEST_TIMEOUT)
            .unwrap();
        assert_eq!(
            client.url("/draft/123/picks"),
            "https://api.example.test/v1/draft/123/picks"
        );
        assert_eq!(client.url("players/nfl"), "https://api.example.test/v1/players/nfl");
    }

    #[tokio::test]
    async fn unreachable_host_is_transient() {
        // Port 9 on localhost is the discard port; nothing should listen there.
        let client =
            SleeperClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.draft("1").await.unwrap_err();
        assert!(err.is_transient(), "expected transient error, got {err:?}");
    }
}

// Fantasy statistics API client with a TTL cache in front of every call.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use squadcast_core::config::StatsApiConfig;
use squadcast_core::model::{
    Bootstrap, Fixture, LeagueStandingsPage, ManagerEntry, ManagerPicks, PlayerSummary,
};

use crate::cache::TtlCache;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a raw upstream document into a model type.
pub fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, StatsError> {
    serde_json::from_value(value).map_err(|source| StatsError::Decode {
        what: what.to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// StatsSource trait
// ---------------------------------------------------------------------------

/// Read access to the statistics API.
///
/// Implementors provide the two transport primitives; the named endpoints
/// are built on top of them. Raw `Value` variants back the passthrough
/// routes, typed variants back the scoring routes.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// GET `{base_url}/{path}` as JSON.
    async fn get_json(&self, path: &str) -> Result<Value, StatsError>;

    /// A player's photo as PNG bytes, by player `code`.
    async fn photo(&self, code: u32) -> Result<Vec<u8>, StatsError>;

    async fn bootstrap_raw(&self) -> Result<Value, StatsError> {
        self.get_json("bootstrap-static/").await
    }

    async fn fixtures_raw(&self) -> Result<Value, StatsError> {
        self.get_json("fixtures/").await
    }

    async fn entry_raw(&self, manager_id: u64) -> Result<Value, StatsError> {
        self.get_json(&format!("entry/{manager_id}/")).await
    }

    async fn picks_raw(&self, manager_id: u64, gameweek: u32) -> Result<Value, StatsError> {
        self.get_json(&format!("entry/{manager_id}/event/{gameweek}/picks/"))
            .await
    }

    async fn bootstrap(&self) -> Result<Bootstrap, StatsError> {
        decode("bootstrap", self.bootstrap_raw().await?)
    }

    async fn fixtures(&self) -> Result<Vec<Fixture>, StatsError> {
        decode("fixtures", self.fixtures_raw().await?)
    }

    async fn player_summary(&self, player_id: u32) -> Result<PlayerSummary, StatsError> {
        let raw = self
            .get_json(&format!("element-summary/{player_id}/"))
            .await?;
        decode("player summary", raw)
    }

    async fn entry(&self, manager_id: u64) -> Result<ManagerEntry, StatsError> {
        decode("manager entry", self.entry_raw(manager_id).await?)
    }

    async fn picks(&self, manager_id: u64, gameweek: u32) -> Result<ManagerPicks, StatsError> {
        decode("manager picks", self.picks_raw(manager_id, gameweek).await?)
    }

    async fn league_standings(
        &self,
        league_id: u64,
        page: u32,
    ) -> Result<LeagueStandingsPage, StatsError> {
        let raw = self
            .get_json(&format!(
                "leagues-classic/{league_id}/standings/?page_standings={page}"
            ))
            .await?;
        decode("league standings", raw)
    }
}

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

/// HTTP implementation of [`StatsSource`], caching every successful
/// response by request path. No retries.
pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
    photo_base_url: String,
    json_cache: TtlCache<Value>,
    photo_cache: TtlCache<Vec<u8>>,
}

impl FplClient {
    pub fn new(config: &StatsApiConfig) -> Result<Self, StatsError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(StatsError::Client)?;
        let ttl = Duration::from_secs(config.cache_ttl_secs);

        info!(
            "Stats client targeting {} (cache TTL {}s)",
            config.base_url, config.cache_ttl_secs
        );

        Ok(FplClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            photo_base_url: config.photo_base_url.trim_end_matches('/').to_string(),
            json_cache: TtlCache::new(ttl),
            photo_cache: TtlCache::new(ttl),
        })
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, StatsError> {
        let response = self.http.get(url).send().await.map_err(|source| {
            warn!("Upstream request to {url} failed: {source}");
            StatsError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Upstream {url} returned {status}");
            return Err(StatsError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl StatsSource for FplClient {
    async fn get_json(&self, path: &str) -> Result<Value, StatsError> {
        if let Some(hit) = self.json_cache.get(path) {
            return Ok(hit);
        }

        let url = format!("{}/{}", self.base_url, path);
        let value: Value = self
            .fetch(&url)
            .await?
            .json()
            .await
            .map_err(|source| StatsError::Transport { url, source })?;

        self.json_cache.insert(path, value.clone());
        Ok(value)
    }

    async fn photo(&self, code: u32) -> Result<Vec<u8>, StatsError> {
        let key = format!("p{code}.png");
        if let Some(hit) = self.photo_cache.get(&key) {
            return Ok(hit);
        }

        let url = format!("{}/{}", self.photo_base_url, key);
        let bytes = self
            .fetch(&url)
            .await?
            .bytes()
            .await
            .map_err(|source| StatsError::Transport { url, source })?
            .to_vec();

        self.photo_cache.insert(key, bytes.clone());
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `status` + `body` to every connection, counting requests.
    async fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn config(base_url: &str) -> StatsApiConfig {
        StatsApiConfig {
            base_url: base_url.to_string(),
            photo_base_url: base_url.to_string(),
            user_agent: "squadcast-test".into(),
            timeout_secs: 5,
            cache_ttl_secs: 300,
        }
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let (url, hits) = serve("200 OK", r#"[{"id":1,"event":3,"team_h":1,"team_a":2,"team_h_difficulty":2,"team_a_difficulty":4}]"#).await;
        let client = FplClient::new(&config(&url)).unwrap();

        let first = client.fixtures().await.unwrap();
        let second = client.fixtures().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].event, Some(3));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_and_not_cached() {
        let (url, hits) = serve("503 Service Unavailable", "{}").await;
        let client = FplClient::new(&config(&url)).unwrap();

        let err = client.bootstrap_raw().await.unwrap_err();
        assert!(matches!(err, StatsError::Status { status: 503, .. }));
        assert!(client.bootstrap_raw().await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FplClient::new(&config(&format!("http://{addr}"))).unwrap();
        let err = client.entry_raw(7).await.unwrap_err();
        assert!(matches!(err, StatsError::Transport { .. }));
    }

    #[tokio::test]
    async fn malformed_document_is_a_decode_error() {
        let (url, _) = serve("200 OK", r#"{"unexpected": true}"#).await;
        let client = FplClient::new(&config(&url)).unwrap();
        let err = client.picks(1, 1).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to decode manager picks"));
    }
}

use std::time::Duration;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    onair_config::TwitchConfig,
    onair_reconciler::{QueryError, SnapshotSource, StreamSnapshot},
    secrecy::ExposeSecret,
    serde::Deserialize,
    tracing::{debug, warn},
};

use crate::{
    auth::{AppTokenProvider, DEFAULT_TOKEN_URL},
    error::{Error, Result},
};

pub const DEFAULT_API_URL: &str = "https://api.twitch.tv/helix";

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<HelixStream>,
}

#[derive(Debug, Deserialize)]
struct HelixStream {
    #[serde(default)]
    title: String,
    #[serde(default)]
    game_name: String,
    #[serde(default)]
    thumbnail_url: String,
    started_at: DateTime<Utc>,
    #[serde(default)]
    viewer_count: u64,
}

impl From<HelixStream> for StreamSnapshot {
    fn from(s: HelixStream) -> Self {
        Self {
            title: s.title,
            game: s.game_name,
            thumbnail_url: s.thumbnail_url,
            started_at: s.started_at,
            viewer_count: s.viewer_count,
        }
    }
}

/// Reads stream status from the Helix API.
pub struct HelixClient {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
    auth: AppTokenProvider,
}

impl HelixClient {
    /// Client against the public Twitch endpoints.
    pub fn new(config: &TwitchConfig) -> Result<Self> {
        Self::with_endpoints(config, DEFAULT_TOKEN_URL, DEFAULT_API_URL)
    }

    pub fn with_endpoints(
        config: &TwitchConfig,
        token_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::http("building http client", e))?;
        let auth = AppTokenProvider::new(
            client.clone(),
            token_url,
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            auth,
        })
    }

    /// Current stream of `login`, `None` when offline.
    ///
    /// A rejected token is renewed and the request repeated once.
    pub async fn stream(&self, login: &str) -> Result<Option<StreamSnapshot>> {
        match self.fetch_stream(login).await {
            Err(e) if e.is_unauthorized() => {
                warn!(login, "helix rejected the app token, renewing");
                self.auth.invalidate().await;
                self.fetch_stream(login).await
            },
            other => other,
        }
    }

    async fn fetch_stream(&self, login: &str) -> Result<Option<StreamSnapshot>> {
        let token = self.auth.token().await?;
        let resp = self
            .client
            .get(format!("{}/streams", self.api_url))
            .query(&[("user_login", login)])
            .header("Client-Id", &self.client_id)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::http("streams request", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                context: "streams request",
                status,
                body,
            });
        }

        let body: StreamsResponse = resp
            .json()
            .await
            .map_err(|e| Error::http("streams response", e))?;
        let snapshot = body.data.into_iter().next().map(StreamSnapshot::from);
        debug!(login, live = snapshot.is_some(), "helix stream status");
        Ok(snapshot)
    }
}

#[async_trait]
impl SnapshotSource for HelixClient {
    async fn fetch(&self, resource: &str) -> std::result::Result<Option<StreamSnapshot>, QueryError> {
        self.stream(resource)
            .await
            .map_err(|e| QueryError::external("twitch helix", e))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        mockito::{Matcher, Server},
        secrecy::Secret,
    };

    fn config() -> TwitchConfig {
        TwitchConfig {
            client_id: "cid".into(),
            client_secret: Secret::new("shh".into()),
            streamer: "kitty".into(),
            request_timeout_secs: 5,
        }
    }

    async fn mock_token(server: &mut Server, token: &str, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"access_token":"{token}","expires_in":5000000}}"#
            ))
            .expect(hits)
            .create_async()
            .await
    }

    fn client(server: &Server) -> HelixClient {
        HelixClient::with_endpoints(
            &config(),
            format!("{}/oauth2/token", server.url()),
            format!("{}/helix", server.url()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn live_stream_maps_to_snapshot() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server, "tok", 1).await;
        let streams = server
            .mock("GET", "/helix/streams")
            .match_query(Matcher::UrlEncoded("user_login".into(), "kitty".into()))
            .match_header("client-id", "cid")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "data": [{
                        "id": "1",
                        "user_login": "kitty",
                        "game_name": "Celeste",
                        "type": "live",
                        "title": "Any% [PB attempts]",
                        "viewer_count": 321,
                        "started_at": "2026-05-09T19:00:00Z",
                        "thumbnail_url": "https://static-cdn.example/live_user_kitty-{width}x{height}.jpg"
                    }],
                    "pagination": {}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let snapshot = client(&server).stream("kitty").await.unwrap().unwrap();
        assert_eq!(snapshot.title, "Any% [PB attempts]");
        assert_eq!(snapshot.game, "Celeste");
        assert_eq!(snapshot.viewer_count, 321);
        assert_eq!(
            snapshot.started_at,
            Utc.with_ymd_and_hms(2026, 5, 9, 19, 0, 0).unwrap()
        );
        assert!(snapshot.thumbnail_url.contains("{width}x{height}"));
        streams.assert_async().await;
    }

    #[tokio::test]
    async fn empty_data_means_offline() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server, "tok", 1).await;
        let _streams = server
            .mock("GET", "/helix/streams")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[],"pagination":{}}"#)
            .create_async()
            .await;

        assert!(client(&server).stream("kitty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthorized_renews_token_once() {
        let mut server = Server::new_async().await;
        let token = mock_token(&mut server, "tok", 2).await;
        let rejected = server
            .mock("GET", "/helix/streams")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#)
            .expect(2)
            .create_async()
            .await;

        let err = client(&server).stream("kitty").await.unwrap_err();
        assert!(err.is_unauthorized());
        token.assert_async().await;
        rejected.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_becomes_query_error() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server, "tok", 1).await;
        let _streams = server
            .mock("GET", "/helix/streams")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client(&server).fetch("kitty").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let mut server = Server::new_async().await;
        let _token = mock_token(&mut server, "tok", 1).await;
        let _streams = server
            .mock("GET", "/helix/streams")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"title":"x"}]}"#)
            .create_async()
            .await;

        assert!(client(&server).fetch("kitty").await.is_err());
    }
}

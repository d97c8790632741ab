//! App access token via the client-credentials grant, cached until shortly
//! before it expires.

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::{sync::Mutex, time::Instant},
    tracing::{debug, info},
};

use crate::error::{Error, Result};

pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Tokens are renewed this long before Twitch says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    access_token: Secret<String>,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at
            .is_none_or(|at| Instant::now() + EXPIRY_MARGIN < at)
    }
}

pub struct AppTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl AppTokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Secret<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, requesting a new one when needed.
    pub async fn token(&self) -> Result<Secret<String>> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.request().await?;
        let token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Forget the cached token so the next call requests a new one.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("twitch app token invalidated");
        }
    }

    async fn request(&self) -> Result<CachedToken> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret().as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| Error::http("token request", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                context: "token request",
                status,
                body,
            });
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::http("token response", e))?;
        info!(expires_in = body.expires_in, "obtained twitch app access token");

        Ok(CachedToken {
            access_token: Secret::new(body.access_token),
            expires_at: body
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }
}

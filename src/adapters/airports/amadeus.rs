use crate::adapters::airports::LookupError;
use crate::config::AirportLookupConfig;
use crate::domain::airport::Airport;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 1799;
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

/// When a token issued at `now` should be replaced. Upstream lifetimes are
/// capped at one day.
fn refresh_deadline(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME).saturating_sub(TOKEN_EXPIRY_MARGIN);
    now + lifetime
}

#[derive(Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<Location>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    iata_code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: LocationAddress,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LocationAddress {
    #[serde(default)]
    city_name: String,
    #[serde(default)]
    country_name: String,
}

impl From<Location> for Airport {
    fn from(l: Location) -> Self {
        Self { iata_code: l.iata_code, name: l.name, city_name: l.address.city_name, country_name: l.address.country_name }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// OAuth2 client-credentials client for the airport location search.
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    limit: u32,
    token: RwLock<Option<CachedToken>>,
}

impl AmadeusClient {
    /// Returns `None` unless both client id and secret are configured.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AirportLookupConfig) -> anyhow::Result<Option<Self>> {
        let (Some(client_id), Some(client_secret)) = (&config.client_id, &config.client_secret) else {
            return Ok(None);
        };

        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Some(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            limit: config.limit,
            token: RwLock::new(None),
        }))
    }

    async fn access_token(&self) -> Result<String, LookupError> {
        if let Some(token) = self.token.read().await.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let response = self
            .http
            .post(format!("{}{TOKEN_PATH}", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Token(response.status()));
        }

        let body: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = body.expires_in, "Obtained airport lookup access token");

        *guard = Some(CachedToken {
            value: body.access_token.clone(),
            refresh_at: refresh_deadline(Instant::now(), body.expires_in),
        });
        Ok(body.access_token)
    }

    /// Searches airports whose name, city or code matches `keyword`.
    ///
    /// # Errors
    /// Returns `LookupError` if the token exchange or the search fails.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Airport>, LookupError> {
        let token = self.access_token().await?;
        let limit = self.limit.to_string();

        let response = self
            .http
            .get(format!("{}{LOCATIONS_PATH}", self.base_url))
            .bearer_auth(token)
            .query(&[("keyword", keyword), ("subType", "AIRPORT"), ("page[limit]", limit.as_str()), ("view", "LIGHT")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                *self.token.write().await = None;
            }
            return Err(LookupError::Search(status));
        }

        let body: LocationsResponse = response.json().await?;
        Ok(body.data.into_iter().map(Airport::from).collect())
    }
}

impl std::fmt::Debug for AmadeusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmadeusClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

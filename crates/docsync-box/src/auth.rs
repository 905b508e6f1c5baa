//! Box service-account authentication
//!
//! Uses the OAuth2 client-credentials grant. Box extends the grant with a
//! subject: the token acts either for the enterprise's service account or for
//! one managed user.
//!
//! Tokens are cached in memory and refreshed shortly before they expire.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, TokenResponse, TokenUrl};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::BoxError;

/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint does not report one
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

type TokenClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Who the token acts as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxSubject {
    /// The enterprise service account
    Enterprise(String),
    /// A managed user of the enterprise
    User(String),
}

impl BoxSubject {
    fn kind(&self) -> &'static str {
        match self {
            Self::Enterprise(_) => "enterprise",
            Self::User(_) => "user",
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Enterprise(id) | Self::User(id) => id,
        }
    }
}

/// Client id, secret and subject for the client-credentials grant
#[derive(Clone)]
pub struct BoxCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub subject: BoxSubject,
}

impl std::fmt::Debug for BoxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

/// A bearer token and when it stops being valid
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns true if the token expires within the refresh margin of `now`
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now
    }
}

/// Fetches and caches service-account tokens
pub struct BoxAuth {
    client: TokenClient,
    subject: BoxSubject,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl BoxAuth {
    /// Creates an authenticator for the token endpoint at `token_url`
    pub fn new(credentials: BoxCredentials, token_url: &str) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(credentials.client_id))
            .set_client_secret(ClientSecret::new(credentials.client_secret))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(TokenUrl::new(token_url.to_string()).context("Invalid token URL")?);

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build token HTTP client")?;

        Ok(Self {
            client,
            subject: credentials.subject,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one when needed
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expiring(Utc::now()) {
                return Ok(token.secret.clone());
            }
            debug!("Cached Box token is expiring, refreshing");
        }

        let token = self.fetch_token().await?;
        let secret = token.secret.clone();
        *cached = Some(token);
        Ok(secret)
    }

    /// Drops the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Requests a new token from the token endpoint
    pub async fn fetch_token(&self) -> Result<AccessToken> {
        info!(
            subject_type = self.subject.kind(),
            subject_id = self.subject.id(),
            "Requesting Box access token"
        );

        let response = self
            .client
            .exchange_client_credentials()
            .add_extra_param("box_subject_type", self.subject.kind())
            .add_extra_param("box_subject_id", self.subject.id().to_string())
            .request_async(&self.http)
            .await
            .map_err(|e| BoxError::TokenRequest(e.to_string()))?;

        let lifetime = response
            .expires_in()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(AccessToken {
            secret: response.access_token().secret().to_string(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }
}

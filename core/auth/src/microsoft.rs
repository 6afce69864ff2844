//! OAuth2 authentication and token management for the Microsoft identity
//! platform.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use inboxdrive_common::{Error, Result};

use crate::provider::{CredentialProvider, DEFAULT_SCOPES};

/// OAuth2 client ID registered for this application.
const CLIENT_ID: &str = "1ed48382-20a5-46a5-9c5d-297c27f7b11b";
/// Authority for the multi-tenant Microsoft identity platform.
const AUTHORITY: &str = "https://login.microsoftonline.com/common";
/// Redirect URL for the OAuth2 flow (localhost for native clients).
const REDIRECT_URL: &str = "http://localhost:8080/callback";

/// Requested in addition to the delegated scopes so that the token
/// endpoint issues a refresh token.
const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

/// Page served to the browser once the redirect has been captured.
const CALLBACK_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body><p>Signed in. You can close this tab and return to the terminal.</p></body></html>";

/// OAuth2 tokens with expiration tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    /// Access token for API requests.
    pub access_token: String,
    /// Refresh token for obtaining new access tokens, when granted.
    pub refresh_token: Option<String>,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Check if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.expires_at < Utc::now() + Duration::minutes(5)
    }
}

/// Configuration for OAuth2 authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Client ID (can be overridden from default).
    pub client_id: String,
    /// Identity platform authority, e.g. a tenant-specific endpoint.
    pub authority: String,
    /// Redirect URL for the OAuth2 callback.
    pub redirect_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: CLIENT_ID.to_string(),
            authority: AUTHORITY.to_string(),
            redirect_url: REDIRECT_URL.to_string(),
        }
    }
}

/// Credential provider backed by the Microsoft identity platform.
///
/// Performs the authorization-code flow interactively on `login` and keeps
/// the resulting tokens in memory for the lifetime of the process; nothing
/// is persisted.
pub struct MicrosoftProvider {
    client: BasicClient,
    config: AuthConfig,
    tokens: RwLock<Option<Tokens>>,
}

impl MicrosoftProvider {
    /// Create a new provider.
    ///
    /// # Errors
    /// - Invalid authority or redirect URL in the configuration
    pub fn new(config: AuthConfig) -> Result<Self> {
        let auth_url = format!("{}/oauth2/v2.0/authorize", config.authority);
        let token_url = format!("{}/oauth2/v2.0/token", config.authority);

        // Public client: no secret is registered for a native application.
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            None,
            AuthUrl::new(auth_url)
                .map_err(|e| Error::InvalidInput(format!("Invalid auth URL: {}", e)))?,
            Some(
                TokenUrl::new(token_url)
                    .map_err(|e| Error::InvalidInput(format!("Invalid token URL: {}", e)))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_url.clone())
                .map_err(|e| Error::InvalidInput(format!("Invalid redirect URL: {}", e)))?,
        );

        Ok(Self {
            client,
            config,
            tokens: RwLock::new(None),
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(AuthConfig::default())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Generate the authorization URL for the user to visit.
    ///
    /// Returns the URL and the CSRF token that must match on callback.
    pub fn authorization_url(&self) -> (String, String) {
        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in DEFAULT_SCOPES {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }
        request = request.add_scope(Scope::new(OFFLINE_ACCESS_SCOPE.to_string()));

        let (auth_url, csrf_token) = request.url();
        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// - Invalid authorization code
    /// - Network errors
    async fn exchange_code(&self, code: &str) -> Result<Tokens> {
        use oauth2::reqwest::async_http_client;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token exchange failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();
        let refresh_token = token_result.refresh_token().map(|t| t.secret().clone());
        if refresh_token.is_none() {
            warn!("No refresh token received; silent re-acquisition will fail after expiry");
        }

        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));
        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        Ok(Tokens {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Refresh an access token using the refresh token.
    ///
    /// # Errors
    /// - Invalid or revoked refresh token
    /// - Network errors
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<Tokens> {
        use oauth2::reqwest::async_http_client;

        let mut request = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()));
        for scope in scopes {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let token_result = request
            .request_async(async_http_client)
            .await
            .map_err(|e| Error::Authentication(format!("Token refresh failed: {}", e)))?;

        let access_token = token_result.access_token().secret().clone();

        // Refresh tokens may or may not be returned in refresh response
        let new_refresh_token = token_result
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| Some(refresh_token.to_string()));

        let expires_in = token_result
            .expires_in()
            .unwrap_or_else(|| std::time::Duration::from_secs(3600));
        let expires_at =
            Utc::now() + Duration::from_std(expires_in).unwrap_or_else(|_| Duration::hours(1));

        Ok(Tokens {
            access_token,
            refresh_token: new_refresh_token,
            expires_at,
        })
    }

    /// Wait for the OAuth2 redirect on the configured localhost URL.
    ///
    /// Accepts a single connection, answers it with a small HTML page, and
    /// returns the `code` and `state` query parameters.
    async fn wait_for_callback(&self) -> Result<(String, String)> {
        let redirect = Url::parse(&self.config.redirect_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid redirect URL: {}", e)))?;
        let port = redirect.port().unwrap_or(80);

        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        debug!("Waiting for OAuth2 callback on port {}", port);

        let (mut stream, _) = listener.accept().await?;

        let mut request_line = String::new();
        {
            let mut reader = BufReader::new(&mut stream);
            reader.read_line(&mut request_line).await?;
        }

        // Request line looks like: GET /callback?code=...&state=... HTTP/1.1
        let path = request_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| Error::Authentication("Malformed callback request".to_string()))?;
        let callback = Url::parse(&format!("http://localhost{}", path))
            .map_err(|e| Error::Authentication(format!("Malformed callback URL: {}", e)))?;

        let mut code = None;
        let mut state = None;
        for (key, value) in callback.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        stream.write_all(CALLBACK_PAGE.as_bytes()).await?;

        match (code, state) {
            (Some(code), Some(state)) => Ok((code, state)),
            _ => Err(Error::Authentication(
                "Callback did not carry an authorization code".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CredentialProvider for MicrosoftProvider {
    async fn login(&self) -> Result<()> {
        let (auth_url, csrf) = self.authorization_url();

        info!("Complete sign-in in your browser: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("Could not open browser automatically: {}", e);
        }

        let (code, state) = self.wait_for_callback().await?;
        if state != csrf {
            return Err(Error::Authentication(
                "State mismatch in OAuth2 callback".to_string(),
            ));
        }

        let tokens = self.exchange_code(&code).await?;
        *self.tokens.write().await = Some(tokens);
        info!("Signed in");

        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        *self.tokens.write().await = None;
        debug!("Discarded cached tokens");
        Ok(())
    }

    async fn is_signed_in(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    async fn acquire_token(&self, scopes: &[&str]) -> Result<String> {
        {
            let tokens = self.tokens.read().await;
            match tokens.as_ref() {
                None => {
                    return Err(Error::Authentication(
                        "Silent token acquisition requires a signed-in account".to_string(),
                    ))
                }
                Some(t) if !t.is_expired() => return Ok(t.access_token.clone()),
                Some(_) => {}
            }
        }

        // Need to refresh
        let mut tokens = self.tokens.write().await;

        // Double-check after acquiring write lock
        let current = tokens.as_ref().ok_or_else(|| {
            Error::Authentication("Silent token acquisition requires a signed-in account".to_string())
        })?;
        if !current.is_expired() {
            return Ok(current.access_token.clone());
        }

        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            Error::Authentication("Access token expired and no refresh token is available".to_string())
        })?;

        info!("Refreshing expired access token");
        let new_tokens = self.refresh(&refresh_token, scopes).await?;
        let access_token = new_tokens.access_token.clone();
        *tokens = Some(new_tokens);

        Ok(access_token)
    }
}

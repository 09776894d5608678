//! Bearer-token cache for the ICD API.
//!
//! Holds one access token and its absolute expiry in device-local storage.
//! `get_token()` returns the stored token while `now < expires_at`,
//! otherwise performs a client-credentials exchange, persists the result and
//! returns the fresh token.
//!
//! Key properties:
//! - A valid stored token costs zero network calls
//! - The check-then-refresh sequence is serialized: concurrent callers that
//!   all see an expired token trigger a single exchange
//! - The stored pair is overwritten on refresh, never deleted
//! - No retry: exchange failures surface to the caller

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;

use crate::db::{self, DatabaseError, DbHandle};

/// Settings key holding the cached access token.
pub const TOKEN_KEY: &str = "icd_access_token";
/// Settings key holding the token expiry in epoch millis.
pub const EXPIRES_AT_KEY: &str = "icd_token_expires_at";

/// OAuth scope granting access to the ICD API.
pub const ICD_SCOPE: &str = "icdapi_access";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// A bearer token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: String,
    pub expires_at_millis: i64,
}

impl CachedCredential {
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at_millis
    }
}

/// A token freshly issued by the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in_secs: i64,
}

/// Errors from credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Cannot reach authorization server at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Authorization server rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed token response: {0}")]
    ResponseParsing(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Internal lock error")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// Seams: clock, storage, exchange
// ═══════════════════════════════════════════════════════════

/// Wall-clock source in epoch millis.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Persistence for the cached token pair.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<CachedCredential>, CredentialError>;
    fn save(&self, credential: &CachedCredential) -> Result<(), CredentialError>;
}

/// Obtains a new token from the authorization server.
pub trait TokenExchange: Send + Sync {
    fn exchange(&self) -> Result<IssuedToken, CredentialError>;
}

// ═══════════════════════════════════════════════════════════
// Token stores
// ═══════════════════════════════════════════════════════════

/// Token pair kept in the local `settings` table.
pub struct SqliteTokenStore {
    db: Arc<DbHandle>,
}

impl SqliteTokenStore {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }
}

impl TokenStore for SqliteTokenStore {
    fn load(&self) -> Result<Option<CachedCredential>, CredentialError> {
        let (token, expires_at) = self.db.with_conn(|conn| {
            Ok((
                db::get_setting(conn, TOKEN_KEY)?,
                db::get_setting(conn, EXPIRES_AT_KEY)?,
            ))
        })?;

        let (Some(token), Some(expires_at)) = (token, expires_at) else {
            return Ok(None);
        };
        match expires_at.parse::<i64>() {
            Ok(expires_at_millis) => Ok(Some(CachedCredential {
                token,
                expires_at_millis,
            })),
            Err(_) => {
                tracing::warn!(value = %expires_at, "Unparsable token expiry, treating as absent");
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &CachedCredential) -> Result<(), CredentialError> {
        let expires_at = credential.expires_at_millis.to_string();
        self.db.with_conn(|conn| {
            db::set_settings(
                conn,
                &[
                    (TOKEN_KEY, credential.token.as_str()),
                    (EXPIRES_AT_KEY, expires_at.as_str()),
                ],
            )
        })?;
        Ok(())
    }
}

/// Process-local token storage (nothing survives a restart).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<CachedCredential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: CachedCredential) -> Self {
        Self {
            inner: Mutex::new(Some(credential)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<CachedCredential>, CredentialError> {
        let guard = self.inner.lock().map_err(|_| CredentialError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, credential: &CachedCredential) -> Result<(), CredentialError> {
        let mut guard = self.inner.lock().map_err(|_| CredentialError::LockPoisoned)?;
        *guard = Some(credential.clone());
        Ok(())
    }
}

impl<S: TokenStore + ?Sized> TokenStore for Arc<S> {
    fn load(&self) -> Result<Option<CachedCredential>, CredentialError> {
        (**self).load()
    }

    fn save(&self, credential: &CachedCredential) -> Result<(), CredentialError> {
        (**self).save(credential)
    }
}

// ═══════════════════════════════════════════════════════════
// Client-credentials exchange over HTTP
// ═══════════════════════════════════════════════════════════

/// OAuth2 client-credentials grant against the ICD access-management server.
pub struct ClientCredentialsExchange {
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl ClientCredentialsExchange {
    pub fn new(
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CredentialError::HttpClient(e.to_string()))?;

        Ok(Self {
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: ICD_SCOPE.to_string(),
            client,
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl std::fmt::Debug for ClientCredentialsExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsExchange")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenExchange for ClientCredentialsExchange {
    fn exchange(&self) -> Result<IssuedToken, CredentialError> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    CredentialError::Connection(self.token_url.clone())
                } else {
                    CredentialError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response
            .json()
            .map_err(|e| CredentialError::ResponseParsing(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(CredentialError::ResponseParsing("empty access_token".into()));
        }
        if parsed.expires_in < 0 {
            return Err(CredentialError::ResponseParsing(format!(
                "negative expires_in: {}",
                parsed.expires_in
            )));
        }

        Ok(IssuedToken {
            access_token: parsed.access_token,
            expires_in_secs: parsed.expires_in,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// CredentialCache
// ═══════════════════════════════════════════════════════════

/// Cached bearer token with expiry-driven refresh.
pub struct CredentialCache {
    exchange: Box<dyn TokenExchange>,
    store: Box<dyn TokenStore>,
    clock: Box<dyn Clock>,
    /// Treat tokens as expired this many millis early.
    refresh_margin_millis: i64,
    /// Serializes check-then-refresh.
    refresh_lock: Mutex<()>,
}

impl CredentialCache {
    pub fn new(exchange: impl TokenExchange + 'static, store: impl TokenStore + 'static) -> Self {
        Self {
            exchange: Box::new(exchange),
            store: Box::new(store),
            clock: Box::new(SystemClock),
            refresh_margin_millis: 0,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin_millis = i64::try_from(margin.as_millis()).unwrap_or(i64::MAX);
        self
    }

    /// Return a usable bearer token, refreshing it if needed.
    pub fn get_token(&self) -> Result<String, CredentialError> {
        if let Some(credential) = self.valid_stored()? {
            tracing::debug!("ICD token cache hit");
            return Ok(credential.token);
        }

        let _guard = self
            .refresh_lock
            .lock()
            .map_err(|_| CredentialError::LockPoisoned)?;

        // Another caller may have refreshed while we waited.
        if let Some(credential) = self.valid_stored()? {
            tracing::debug!("ICD token refreshed by concurrent caller");
            return Ok(credential.token);
        }

        self.refresh()
    }

    /// Mark the stored token as expired so the next call refreshes.
    pub fn invalidate(&self) -> Result<(), CredentialError> {
        let _guard = self
            .refresh_lock
            .lock()
            .map_err(|_| CredentialError::LockPoisoned)?;
        if let Some(mut credential) = self.store.load()? {
            credential.expires_at_millis = 0;
            self.store.save(&credential)?;
            tracing::info!("ICD token invalidated");
        }
        Ok(())
    }

    fn valid_stored(&self) -> Result<Option<CachedCredential>, CredentialError> {
        let now = self.clock.now_millis();
        let margin = self.refresh_margin_millis;
        Ok(self
            .store
            .load()?
            .filter(|c| c.is_valid_at(now.saturating_add(margin))))
    }

    fn refresh(&self) -> Result<String, CredentialError> {
        let issued = match self.exchange.exchange() {
            Ok(issued) => issued,
            Err(e) => {
                tracing::warn!(error = %e, "ICD token exchange failed");
                return Err(e);
            }
        };

        let now = self.clock.now_millis();
        let credential = CachedCredential {
            token: issued.access_token,
            expires_at_millis: now.saturating_add(issued.expires_in_secs.saturating_mul(1000)),
        };
        self.store.save(&credential)?;

        tracing::info!(
            expires_in_secs = issued.expires_in_secs,
            expires_at_millis = credential.expires_at_millis,
            "ICD token refreshed"
        );
        Ok(credential.token)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

//! Google ID token verification.
//!
//! Tokens are RS256-signed by Google and checked against its published JWKS.
//! A shared HS256 secret can replace JWKS verification for local development
//! and tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::Identity;

/// Issuers Google uses for ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Key lifetime when the JWKS response carries no `max-age`.
const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(3600);

/// Minimum age of the cached keys before an unknown `kid` triggers a refetch.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Claims read from an ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        }
    }
}

/// One RSA key of a JWKS document.
#[derive(Debug, Clone, Deserialize)]
struct JwksKey {
    kid: String,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwks {
    keys: Vec<JwksKey>,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    expires_at: Instant,
}

enum CacheLookup {
    Hit(DecodingKey),
    /// Fresh keys that do not contain the `kid`.
    Unknown,
    Refresh,
}

impl CachedKeys {
    fn lookup(&self, kid: &str, now: Instant) -> CacheLookup {
        if self.expires_at <= now {
            return CacheLookup::Refresh;
        }
        match self.keys.get(kid) {
            Some(key) => CacheLookup::Hit(key.clone()),
            None if now.duration_since(self.fetched_at) < MIN_REFETCH_INTERVAL => {
                CacheLookup::Unknown
            }
            None => CacheLookup::Refresh,
        }
    }
}

enum KeySource {
    Shared(DecodingKey),
    Jwks {
        url: String,
        http: reqwest::Client,
        cache: RwLock<Option<CachedKeys>>,
    },
}

/// Verifies bearer ID tokens and yields the identity they assert.
pub struct IdTokenVerifier {
    source: KeySource,
    client_id: Option<String>,
}

impl IdTokenVerifier {
    /// Build a verifier from configuration.
    ///
    /// `LEETSIGHT_AUTH_SECRET` selects HS256 verification, otherwise keys come
    /// from the configured JWKS endpoint.
    pub fn from_config(config: &Config) -> Self {
        match &config.auth_secret {
            Some(secret) => Self::shared_secret(secret, config.google_client_id.clone()),
            None => Self::jwks(&config.google_jwks_url, config.google_client_id.clone()),
        }
    }

    pub fn shared_secret(secret: &str, client_id: Option<String>) -> Self {
        Self {
            source: KeySource::Shared(DecodingKey::from_secret(secret.as_bytes())),
            client_id,
        }
    }

    pub fn jwks(url: &str, client_id: Option<String>) -> Self {
        Self {
            source: KeySource::Jwks {
                url: url.to_string(),
                http: reqwest::Client::new(),
                cache: RwLock::new(None),
            },
            client_id,
        }
    }

    pub fn uses_shared_secret(&self) -> bool {
        matches!(self.source, KeySource::Shared(_))
    }

    /// Whether the verifier can accept any token at all.
    pub fn is_configured(&self) -> bool {
        self.uses_shared_secret() || self.client_id.is_some()
    }

    /// Verify `token` and return the identity it asserts.
    pub async fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let claims = match &self.source {
            KeySource::Shared(key) => {
                let mut validation = Validation::new(Algorithm::HS256);
                self.apply_audience(&mut validation);
                decode::<Claims>(token, key, &validation)?.claims
            }
            KeySource::Jwks { url, http, cache } => {
                if self.client_id.is_none() {
                    return Err(AppError::Unauthorized(
                        "Sign-in is not configured on this server".to_string(),
                    ));
                }
                let header = decode_header(token)?;
                let kid = header
                    .kid
                    .ok_or_else(|| AppError::Unauthorized("ID token has no key id".to_string()))?;
                let key = self.key_for(&kid, url, http, cache).await?;

                let mut validation = Validation::new(Algorithm::RS256);
                validation.set_issuer(&GOOGLE_ISSUERS);
                self.apply_audience(&mut validation);
                decode::<Claims>(token, &key, &validation)?.claims
            }
        };

        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("ID token has no subject".to_string()));
        }

        Ok(claims.into())
    }

    fn apply_audience(&self, validation: &mut Validation) {
        match &self.client_id {
            Some(client_id) => validation.set_audience(&[client_id]),
            None => validation.validate_aud = false,
        }
    }

    /// Decoding key for `kid`, refreshing the cache when it is stale or, at
    /// most once per `MIN_REFETCH_INTERVAL`, when the key is unknown.
    async fn key_for(
        &self,
        kid: &str,
        url: &str,
        http: &reqwest::Client,
        cache: &RwLock<Option<CachedKeys>>,
    ) -> Result<DecodingKey, AppError> {
        {
            let cached = cache.read().await;
            if let Some(entry) = cached.as_ref() {
                match entry.lookup(kid, Instant::now()) {
                    CacheLookup::Hit(key) => return Ok(key),
                    CacheLookup::Unknown => return Err(unknown_key(kid)),
                    CacheLookup::Refresh => {}
                }
            }
        }

        let mut cached = cache.write().await;
        // Another request may have refreshed the keys while this one waited
        if let Some(entry) = cached.as_ref() {
            match entry.lookup(kid, Instant::now()) {
                CacheLookup::Hit(key) => return Ok(key),
                CacheLookup::Unknown => return Err(unknown_key(kid)),
                CacheLookup::Refresh => {}
            }
        }

        let fresh = fetch_jwks(http, url).await?;
        let key = fresh.keys.get(kid).cloned();
        *cached = Some(fresh);

        key.ok_or_else(|| unknown_key(kid))
    }
}

fn unknown_key(kid: &str) -> AppError {
    AppError::Unauthorized(format!("Unknown signing key '{}'", kid))
}

async fn fetch_jwks(http: &reqwest::Client, url: &str) -> Result<CachedKeys, AppError> {
    tracing::debug!("Fetching JWKS from {}", url);

    let response = http.get(url).send().await?.error_for_status()?;
    let ttl = response
        .headers()
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age)
        .unwrap_or(DEFAULT_JWKS_TTL);
    let jwks: Jwks = response.json().await?;

    let mut keys = HashMap::new();
    for key in jwks.keys.into_iter().filter(|k| k.kty == "RSA") {
        let (Some(n), Some(e)) = (key.n.as_deref(), key.e.as_deref()) else {
            continue;
        };
        match DecodingKey::from_rsa_components(n, e) {
            Ok(decoding_key) => {
                keys.insert(key.kid, decoding_key);
            }
            Err(err) => tracing::warn!("Skipping malformed JWKS key {}: {}", key.kid, err),
        }
    }

    tracing::info!("Loaded {} signing keys, cached for {}s", keys.len(), ttl.as_secs());

    let fetched_at = Instant::now();
    Ok(CachedKeys {
        keys,
        fetched_at,
        expires_at: fetched_at + ttl,
    })
}

/// `max-age` directive of a `Cache-Control` header.
fn parse_max_age(header: &str) -> Option<Duration> {
    header
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! Firebase Auth issues RS256 JWTs signed by rotating Google keys. We fetch
//! the key set, cache it for the `Cache-Control: max-age` the endpoint
//! advertises, and check issuer, audience and timing claims ourselves.

use anyhow::Context;
use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Verified Firebase user extracted from a valid ID token.
#[derive(Debug, Clone)]
pub struct FirebaseUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Token verification error categories.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No bearer token was presented.
    Missing,
    /// The token is malformed, expired, or issued for another project.
    Invalid(String),
    /// Key retrieval failed; the token may well be valid.
    Transient(String),
}

#[derive(Clone)]
enum VerifierMode {
    Firebase,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase Auth ID tokens.
pub struct FirebaseAuth {
    http_client: reqwest::Client,
    project_id: String,
    issuer: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseAuth {
    /// Create a verifier that fetches and caches Google's securetoken keys.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        let verifier = Self::build(project_id, VerifierMode::Firebase)?;

        tracing::info!(
            project_id = %verifier.project_id,
            issuer = %verifier.issuer,
            "Initialized Firebase ID token verifier"
        );

        Ok(verifier)
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        project_id: &str,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key kid must not be empty");
        }

        Self::build(
            project_id,
            VerifierMode::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(project_id: &str, mode: VerifierMode) -> anyhow::Result<Self> {
        if project_id.trim().is_empty() {
            anyhow::bail!("Firebase project id must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            issuer: format!("{ISSUER_PREFIX}{project_id}"),
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify a Firebase ID token from an Authorization header.
    pub async fn verify_bearer(
        &self,
        auth_header: Option<&HeaderValue>,
    ) -> Result<FirebaseUser, AuthError> {
        let token = extract_bearer_token(auth_header)?;
        self.verify_id_token(token).await
    }

    /// Verify a raw Firebase ID token.
    pub async fn verify_id_token(&self, token: &str) -> Result<FirebaseUser, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::Invalid(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::Invalid(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AuthError::Invalid("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| AuthError::Invalid(format!("JWT validation failed: {e}")))?
            .claims;

        if claims.sub.trim().is_empty() || claims.sub.len() > 128 {
            return Err(AuthError::Invalid("sub claim must be a uid".to_string()));
        }

        let now = now_unix_secs();
        validate_not_in_future("iat", claims.iat, now)?;
        validate_not_in_future("auth_time", claims.auth_time, now)?;

        tracing::debug!(uid = %claims.sub, "Firebase ID token verified");

        Ok(FirebaseUser {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        match &self.mode {
            VerifierMode::StaticKey {
                kid: static_kid,
                decoding_key,
            } => {
                if kid == static_kid {
                    return Ok(decoding_key.clone());
                }

                return Err(AuthError::Invalid(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )));
            }
            VerifierMode::Firebase => {}
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; a cache miss on an unexpired set forces one refetch.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AuthError::Invalid(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = FIREBASE_JWKS_URL, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .map_err(|e| AuthError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AuthError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(AuthError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    email: Option<String>,
    name: Option<String>,
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    let mut keys_by_kid = HashMap::new();

    for jwk in jwks.keys {
        if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
            continue;
        }
        if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            continue;
        }
        if jwk.use_.as_deref().is_some_and(|u| u != "sig") {
            continue;
        }

        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys_by_kid.insert(jwk.kid, Arc::new(key));
            }
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
            }
        }
    }

    keys_by_kid
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(auth_header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = auth_header
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Missing)?;

    let token = value.strip_prefix("Bearer ").ok_or(AuthError::Missing)?;

    if token.trim().is_empty() {
        return Err(AuthError::Missing);
    }

    Ok(token.trim())
}

fn validate_not_in_future(claim: &str, value: Option<u64>, now: u64) -> Result<(), AuthError> {
    let Some(value) = value else {
        return Err(AuthError::Invalid(format!("missing {claim} claim")));
    };

    if value > now + CLOCK_SKEW_SECS {
        return Err(AuthError::Invalid(format!("{claim} claim is in the future")));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

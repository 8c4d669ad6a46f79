//! Bearer/refresh token handling.
//!
//! Tokens are decoded without signature verification: the CLI is not the
//! audience of these tokens, it only needs the expiry and scope claims. All
//! refresh work happens synchronously on the caller; there is no background
//! refresh task.

use crate::config::{self, Config};
use crate::constants::{DEFAULT_TOKEN_URL, TOKEN_MIN_VALIDITY};
use crate::error::{self, Error, Result};
use crate::reporter::Reporter;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use snafu::ResultExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

const OFFLINE_TOKEN_DEPRECATION: &str =
    "Logging in with offline tokens is being deprecated and will no longer be maintained \
     or enhanced. Instead, log in with --use-auth-code or --use-device-code. \
     Learn more about deprecating offline tokens via \
     https://console.redhat.com/openshift/token/rosa";

/// The claims the CLI cares about. Everything else in the token is opaque.
#[derive(Debug, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Owns the token pair for one Runtime and refreshes it against the OAuth
/// token endpoint when it is within the freshness floor.
#[derive(Debug)]
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    current: Mutex<TokenPair>,
    changed: AtomicBool,
}

impl TokenManager {
    /// Build a manager from the persisted config. Enforces the config
    /// invariant that a present refresh token implies both tokens decode as
    /// JWTs; the access token is allowed to be expired.
    pub fn new(cfg: &Config, http: reqwest::Client) -> Result<Self> {
        if cfg.access_token.is_empty() && cfg.refresh_token.is_empty() {
            return Err(Error::NotLoggedIn);
        }
        if !cfg.refresh_token.is_empty() {
            decode_claims(&cfg.access_token).context(error::MalformedTokenSnafu)?;
            decode_claims(&cfg.refresh_token).context(error::MalformedTokenSnafu)?;
        }
        let token_url = if cfg.token_url.is_empty() {
            DEFAULT_TOKEN_URL.to_string()
        } else {
            cfg.token_url.clone()
        };
        Ok(Self {
            http,
            token_url,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            current: Mutex::new(TokenPair {
                access: cfg.access_token.clone(),
                refresh: cfg.refresh_token.clone(),
            }),
            changed: AtomicBool::new(false),
        })
    }

    pub fn current(&self) -> TokenPair {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the pair has changed since construction and still needs to be
    /// flushed by `persist`.
    pub fn is_dirty(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    /// Return a pair whose access token remains valid for at least
    /// `min_remaining`, refreshing and persisting first when it does not.
    pub async fn get_or_refresh(&self, min_remaining: Duration) -> Result<TokenPair> {
        let pair = self.current();
        if remaining_validity(&pair.access) >= min_remaining {
            return Ok(pair);
        }
        if pair.refresh.is_empty() {
            return Err(Error::Unauthorized {
                message: "your authorization token needs to be updated. Please login again"
                    .to_string(),
            });
        }

        let refreshed = self.refresh_grant(&pair).await?;
        {
            let mut current = self
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *current = refreshed.clone();
        }
        self.changed.store(true, Ordering::SeqCst);
        // The new pair must be on disk before any request uses it.
        self.persist()?;
        Ok(refreshed)
    }

    /// Convenience wrapper around `get_or_refresh` with the default
    /// freshness floor.
    pub async fn keep_alive(&self) -> Result<TokenPair> {
        self.get_or_refresh(TOKEN_MIN_VALIDITY).await
    }

    /// Flush the current pair to the config file. Idempotent; clears the
    /// dirty flag on success.
    pub fn persist(&self) -> Result<()> {
        let pair = self.current();
        config::persist_tokens(None, &pair.access, &pair.refresh)?;
        self.changed.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh_grant(&self, pair: &TokenPair) -> Result<TokenPair> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", pair.refresh.as_str()),
        ];
        if !self.client_id.is_empty() {
            form.push(("client_id", self.client_id.as_str()));
        }
        if !self.client_secret.is_empty() {
            form.push(("client_secret", self.client_secret.as_str()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .context(error::NetworkSnafu)?;
        let status = response.status();
        let body = response.text().await.context(error::NetworkSnafu)?;

        if !status.is_success() {
            if body.contains("invalid_grant") {
                return Err(Error::Unauthorized {
                    message: "your authorization token needs to be updated. Please login again"
                        .to_string(),
                });
            }
            return Err(Error::Server {
                message: format!("the token endpoint returned an error ({})", status),
                operation_id: None,
            });
        }

        let grant: GrantResponse =
            serde_json::from_str(&body).map_err(|_| Error::Server {
                message: "the token endpoint returned an unparseable response".to_string(),
                operation_id: None,
            })?;
        Ok(TokenPair {
            access: grant.access_token,
            // The endpoint may rotate the refresh token; keep ours if not.
            refresh: grant.refresh_token.unwrap_or_else(|| pair.refresh.clone()),
        })
    }
}

/// Decode a JWT's claims without verifying its signature.
pub fn decode_claims(token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation.algorithms = vec![
        Algorithm::HS256,
        Algorithm::HS384,
        Algorithm::HS512,
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
        Algorithm::ES256,
        Algorithm::ES384,
        Algorithm::PS256,
        Algorithm::PS384,
        Algorithm::PS512,
        Algorithm::EdDSA,
    ];
    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).map(|data| data.claims)
}

/// How long the token's `exp` claim says it remains valid. Tokens that do
/// not decode, or carry no `exp`, count as already expired.
pub fn remaining_validity(token: &str) -> Duration {
    let exp = match decode_claims(token) {
        Ok(Claims { exp: Some(exp), .. }) => exp,
        _ => return Duration::ZERO,
    };
    let remaining = exp - chrono::Utc::now().timestamp();
    if remaining <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(remaining as u64)
    }
}

/// Warn once when the refresh token still carries the deprecated
/// `offline_access` scope. Parse failures are debug-logged and swallowed;
/// this warning must never block the user.
pub fn scope_warning(reporter: &Reporter, refresh_token: &str) {
    let claims = match decode_claims(refresh_token) {
        Ok(claims) => claims,
        Err(err) => {
            log::debug!("failed to parse refresh token for deprecation warning: {}", err);
            return;
        }
    };
    let scopes = match claims.scope {
        Some(scopes) => scopes,
        None => {
            log::debug!("refresh token has no scope claim; skipping deprecation warning");
            return;
        }
    };
    if scopes.split_whitespace().any(|s| s == OFFLINE_ACCESS_SCOPE) {
        reporter.warn(OFFLINE_TOKEN_DEPRECATION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_jwt;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with(access: &str, refresh: &str, token_url: &str) -> Config {
        Config {
            token_url: token_url.to_string(),
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn decodes_claims_without_verification() {
        let token = test_jwt(1_999_999_999, Some("openid offline_access"));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, Some(1_999_999_999));
        assert_eq!(claims.scope.as_deref(), Some("openid offline_access"));
    }

    #[test]
    fn garbage_is_not_a_token() {
        assert!(decode_claims("not-a-jwt").is_err());
        assert_eq!(remaining_validity("not-a-jwt"), Duration::ZERO);
    }

    #[test]
    fn expired_tokens_have_no_remaining_validity() {
        let token = test_jwt(chrono::Utc::now().timestamp() - 60, None);
        assert_eq!(remaining_validity(&token), Duration::ZERO);
    }

    #[test]
    fn fresh_tokens_report_their_validity() {
        let token = test_jwt(chrono::Utc::now().timestamp() + 3600, None);
        let remaining = remaining_validity(&token);
        assert!(remaining > Duration::from_secs(3500));
        assert!(remaining <= Duration::from_secs(3600));
    }

    #[test]
    fn manager_rejects_empty_credentials() {
        let cfg = Config::default();
        let err = TokenManager::new(&cfg, reqwest::Client::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unauthorized);
    }

    #[test]
    fn manager_rejects_malformed_pairs() {
        let cfg = config_with("garbage", "also-garbage", "");
        let err = TokenManager::new(&cfg, reqwest::Client::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn valid_access_token_is_returned_without_a_grant() {
        let access = test_jwt(chrono::Utc::now().timestamp() + 3600, None);
        let refresh = test_jwt(chrono::Utc::now().timestamp() + 86400, None);
        let cfg = config_with(&access, &refresh, "http://127.0.0.1:1/never-called");
        let manager = TokenManager::new(&cfg, reqwest::Client::new()).unwrap();
        let pair = manager
            .get_or_refresh(Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(pair.access, access);
        assert!(!manager.is_dirty());
    }

    #[tokio::test]
    async fn expired_access_token_triggers_a_grant_and_persists() {
        let _env = crate::test_util::TempConfigEnv::new();
        let server = MockServer::start().await;
        let new_access = test_jwt(chrono::Utc::now().timestamp() + 3600, None);
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": new_access,
                "refresh_token": "",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stale = test_jwt(chrono::Utc::now().timestamp() - 60, None);
        let refresh = test_jwt(chrono::Utc::now().timestamp() + 86400, None);
        let cfg = config_with(&stale, &refresh, &format!("{}/token", server.uri()));
        let manager = TokenManager::new(&cfg, reqwest::Client::new()).unwrap();

        let pair = manager
            .get_or_refresh(Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(pair.access, new_access);
        assert!(remaining_validity(&pair.access) >= Duration::from_secs(600));
        // The endpoint returned an empty refresh token; ours is kept.
        assert_eq!(pair.refresh, refresh);
        // Persisted before the pair is handed back.
        let stored = config::load().unwrap().unwrap();
        assert_eq!(stored.access_token, new_access);
    }

    #[tokio::test]
    async fn invalid_grant_maps_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid_grant","error_description":"Session not active"}"#),
            )
            .mount(&server)
            .await;

        let stale = test_jwt(chrono::Utc::now().timestamp() - 60, None);
        let refresh = test_jwt(chrono::Utc::now().timestamp() + 86400, None);
        let cfg = config_with(&stale, &refresh, &server.uri());
        let manager = TokenManager::new(&cfg, reqwest::Client::new()).unwrap();
        let err = manager
            .get_or_refresh(Duration::from_secs(600))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Unauthorized);
        assert!(err.to_string().contains("login again"));
    }

    #[test]
    fn offline_access_scope_is_detected() {
        let token = test_jwt(1_999_999_999, Some("openid offline_access"));
        let claims = decode_claims(&token).unwrap();
        assert!(claims
            .scope
            .unwrap()
            .split_whitespace()
            .any(|s| s == OFFLINE_ACCESS_SCOPE));
    }
}

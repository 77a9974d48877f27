//! Admin authentication.
//!
//! One admin account, configured through the environment. A successful
//! login hands out a random bearer token; admin routes accept either such a
//! session token or the static `ADMIN_TOKEN`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use pbkdf2::pbkdf2_hmac;
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ServerError;

/// Iterations used when hashing a new password.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Password accepted when no `ADMIN_PASSWORD_HASH` is configured.
const DEVELOPMENT_PASSWORD: &str = "password123";

const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

// ---------------------------------------------------------------------------
// Password hashes
// ---------------------------------------------------------------------------

/// Hash `password` as `pbkdf2:sha256:<iterations>$<salt>$<hex digest>`, the
/// format produced by werkzeug's `generate_password_hash`.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let mut digest = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    format!("pbkdf2:sha256:{iterations}${salt}${}", hex::encode(digest))
}

/// Check `password` against a werkzeug hash, `pbkdf2:<digest>:<iterations>`
/// or `scrypt:<N>:<r>:<p>`. Unknown methods and malformed hashes never
/// match.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };

    let mut method_parts = method.split(':');
    let actual = match method_parts.next() {
        Some("pbkdf2") => pbkdf2_digest(method_parts, password, salt),
        Some("scrypt") => scrypt_digest(method_parts, password, salt),
        _ => {
            warn!(method, "Unsupported password hash method");
            None
        }
    };

    actual.is_some_and(|actual| constant_time_eq(&actual, &expected))
}

fn pbkdf2_digest<'a>(
    mut params: impl Iterator<Item = &'a str>,
    password: &str,
    salt: &str,
) -> Option<Vec<u8>> {
    let algorithm = params.next().unwrap_or("sha256");
    let iterations = match params.next() {
        Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0)?,
        None => DEFAULT_ITERATIONS,
    };

    match algorithm {
        "sha256" => {
            let mut out = [0u8; 32];
            pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
            Some(out.to_vec())
        }
        "sha512" => {
            let mut out = [0u8; 64];
            pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
            Some(out.to_vec())
        }
        other => {
            warn!(algorithm = other, "Unsupported pbkdf2 digest");
            None
        }
    }
}

/// werkzeug's scrypt: `N`, `r`, `p` default to 32768, 8 and 1; the key is
/// 64 bytes.
fn scrypt_digest<'a>(
    mut params: impl Iterator<Item = &'a str>,
    password: &str,
    salt: &str,
) -> Option<Vec<u8>> {
    let mut next_or = |default: u32| match params.next() {
        Some(raw) => raw.parse::<u32>().ok(),
        None => Some(default),
    };
    let cost = next_or(1 << 15)?;
    let block_size = next_or(8)?;
    let parallelism = next_or(1)?;

    if cost < 2 || !cost.is_power_of_two() {
        warn!(cost, "scrypt cost is not a power of two");
        return None;
    }
    let log_n = u8::try_from(cost.trailing_zeros()).ok()?;
    let params = scrypt::Params::new(log_n, block_size, parallelism, 64).ok()?;

    let mut out = [0u8; 64];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut out).ok()?;
    Some(out.to_vec())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Issued session tokens and when they were issued.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    tokens: Arc<RwLock<HashMap<String, Instant>>>,
}

impl SessionRegistry {
    pub async fn open(&self) -> String {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        self.tokens.write().await.insert(token.clone(), Instant::now());
        token
    }

    pub async fn close(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .is_some_and(|issued| issued.elapsed() < SESSION_TTL)
    }

    pub async fn purge_expired(&self) {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, issued| issued.elapsed() < SESSION_TTL);
        let removed = before - tokens.len();
        if removed > 0 {
            debug!(removed, "Purged expired admin sessions");
        }
    }
}

// ---------------------------------------------------------------------------
// Admin credentials
// ---------------------------------------------------------------------------

pub struct AdminAuth {
    username: String,
    password_hash: String,
    static_token: Option<String>,
    pub sessions: SessionRegistry,
}

impl AdminAuth {
    pub fn new(username: String, password_hash: String, static_token: Option<String>) -> Self {
        Self {
            username,
            password_hash,
            static_token,
            sessions: SessionRegistry::default(),
        }
    }

    /// Credentials from the configuration. Without `ADMIN_PASSWORD_HASH`
    /// the development password is hashed at startup and a warning logged.
    pub fn from_config(config: &ServerConfig) -> Self {
        let password_hash = match &config.admin_password_hash {
            Some(hash) => hash.clone(),
            None => {
                warn!(
                    username = %config.admin_username,
                    "ADMIN_PASSWORD_HASH not set, using the development password"
                );
                hash_password(DEVELOPMENT_PASSWORD, DEFAULT_ITERATIONS)
            }
        };
        Self::new(
            config.admin_username.clone(),
            password_hash,
            config.admin_token.clone(),
        )
    }

    /// CPU-bound; run it off the async workers.
    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let password_ok = verify_password(&self.password_hash, password);
        user_ok && password_ok
    }

    pub async fn is_authorized(&self, token: &str) -> bool {
        if let Some(expected) = &self.static_token {
            if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
                return true;
            }
        }
        self.sessions.is_valid(token).await
    }
}

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor guarding admin routes.
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ServerError::Unauthorized);
        };
        if !state.auth.is_authorized(token).await {
            debug!(path = %parts.uri.path(), "Rejected admin request with unknown token");
            return Err(ServerError::Unauthorized);
        }
        Ok(AdminSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("s3cret", FAST);
        assert!(hash.starts_with("pbkdf2:sha256:1000$"));
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "S3cret"));
        assert!(!verify_password(&hash, ""));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same", FAST), hash_password("same", FAST));
    }

    #[test]
    fn test_verify_known_hash() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1 iteration, 32 bytes).
        let stored = "pbkdf2:sha256:1$salt$120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b";
        assert!(verify_password(stored, "password"));
        assert!(!verify_password(stored, "passwore"));
    }

    #[test]
    fn test_verify_werkzeug_scrypt() {
        // generate_password_hash("correct horse", method="scrypt:1024:8:1")
        let stored = "scrypt:1024:8:1$QvTTL0T1YymmCXBS$f5bc6125414d69dd1dafe6477108658869d8cdcbde1f60192cc5d8d1c2bb7d473479c78e8d288be80f9c2140a5f430d618ce633e02828b24fc0c292a9b8a3e59";
        assert!(verify_password(stored, "correct horse"));
        assert!(!verify_password(stored, "correct horsf"));
    }

    #[test]
    fn test_verify_werkzeug_default_scrypt() {
        // generate_password_hash("correct horse") with werkzeug 3 defaults.
        let stored = "scrypt:32768:8:1$35l77ZS2U8AhnIL9$2a0e940bd52f93c2dded3660d6963c7947ff56270c21b6fc4767360273d338b9773d50e48f2f9297b0d87610c09d541f6c9479fecf076ae2188a07a586c2cc94";
        assert!(verify_password(stored, "correct horse"));

        let auth = AdminAuth::new("admin".into(), stored.to_string(), None);
        assert!(auth.check_credentials("admin", "correct horse"));
        assert!(!auth.check_credentials("admin", "password123"));
    }

    #[test]
    fn test_malformed_hashes_never_match() {
        for stored in [
            "",
            "plaintext",
            "pbkdf2:sha256:1000$salt",
            "pbkdf2:sha256:1000$salt$nothex",
            "pbkdf2:sha256:zero$salt$00",
            "pbkdf2:md5:1000$salt$00",
            "scrypt:1000:8:1$salt$00",
            "scrypt:1024:0:1$salt$00",
            "bcrypt$salt$00",
        ] {
            assert!(!verify_password(stored, "password"), "{stored}");
        }
    }

    #[test]
    fn test_check_credentials() {
        let auth = AdminAuth::new("admin".into(), hash_password("pw", FAST), None);
        assert!(auth.check_credentials("admin", "pw"));
        assert!(!auth.check_credentials("Admin", "pw"));
        assert!(!auth.check_credentials("admin", "nope"));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let auth = AdminAuth::new("admin".into(), hash_password("pw", FAST), None);
        let token = auth.sessions.open().await;
        assert_eq!(token.len(), 64);
        assert!(auth.is_authorized(&token).await);
        assert!(!auth.is_authorized("forged").await);

        assert!(auth.sessions.close(&token).await);
        assert!(!auth.sessions.close(&token).await);
        assert!(!auth.is_authorized(&token).await);
    }

    #[tokio::test]
    async fn test_static_token() {
        let auth = AdminAuth::new("admin".into(), String::new(), Some("ops-token".into()));
        assert!(auth.is_authorized("ops-token").await);
        assert!(!auth.is_authorized("ops-toke").await);
        assert!(!auth.is_authorized("").await);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }
}

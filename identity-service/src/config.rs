//! Identity configuration

use std::env;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use tracing::warn;

/// Default session lifetime in seconds
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// Default lifetime of a signup OTP in seconds
pub const DEFAULT_OTP_TTL_SECS: i64 = 600;

/// Identity configuration
#[derive(Clone)]
pub struct IdentityConfig {
    /// HMAC key for session tokens
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub session_ttl_secs: i64,
    /// Signup OTP lifetime in seconds
    pub otp_ttl_secs: i64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            warn!("JWT_SECRET is not set; using a random key, sessions will not survive a restart");
            random_secret()
        });

        Self {
            jwt_secret,
            session_ttl_secs: env_secs("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            otp_ttl_secs: env_secs("OTP_TTL_SECS", DEFAULT_OTP_TTL_SECS),
        }
    }
}

impl IdentityConfig {
    /// Create a new identity configuration from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new identity configuration with explicit values
    pub fn new(jwt_secret: impl Into<String>, session_ttl_secs: i64, otp_ttl_secs: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_ttl_secs,
            otp_ttl_secs,
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("otp_ttl_secs", &self.otp_ttl_secs)
            .finish()
    }
}

fn env_secs(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

//! HS256 session tokens
//!
//! Compact JWS with a fixed `{"alg":"HS256","typ":"JWT"}` header and
//! [`Claims`] as payload, signed with HMAC-SHA256 over the shared secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use common::error::{Error, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: Uuid,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Issued session handed to a client after login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Session {
    /// Bearer token
    pub token: String,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

fn auth_error(message: &str) -> Error {
    Error::AuthenticationError(message.to_string())
}

fn sign(secret: &str, signing_input: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::ConfigurationError(format!("invalid session secret: {e}")))?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Encode and sign claims
pub fn encode_token(secret: &str, claims: &Claims) -> Result<String> {
    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = sign(secret, &signing_input)?.finalize().into_bytes();
    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify signature and expiry, returning the claims
pub fn decode_token(secret: &str, token: &str, now: DateTime<Utc>) -> Result<Claims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(auth_error("malformed token"));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0].as_bytes())
        .map_err(|_| auth_error("malformed token header"))?;
    let header: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| auth_error("malformed token header"))?;
    if header.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(auth_error("unsupported token algorithm"));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(parts[2].as_bytes())
        .map_err(|_| auth_error("malformed token signature"))?;
    sign(secret, &format!("{}.{}", parts[0], parts[1]))?
        .verify_slice(&signature)
        .map_err(|_| auth_error("invalid token signature"))?;

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].as_bytes())
        .map_err(|_| auth_error("malformed token payload"))?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| auth_error("malformed token payload"))?;

    if now.timestamp() >= claims.exp {
        return Err(auth_error("token expired"));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(now: DateTime<Utc>, ttl: i64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
        }
    }

    #[test]
    fn token_roundtrip() {
        let now = Utc::now();
        let claims = claims(now, 60);
        let token = encode_token("secret", &claims).unwrap();
        assert_eq!(decode_token("secret", &token, now).unwrap(), claims);
    }

    #[test]
    fn wrong_secret_rejected() {
        let now = Utc::now();
        let token = encode_token("secret", &claims(now, 60)).unwrap();
        assert!(matches!(
            decode_token("other", &token, now),
            Err(Error::AuthenticationError(_))
        ));
    }

    #[test]
    fn tampered_payload_rejected() {
        let now = Utc::now();
        let token = encode_token("secret", &claims(now, 60)).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(now, 6000)).unwrap());
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert!(decode_token("secret", &tampered, now).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let now = Utc::now();
        let token = encode_token("secret", &claims(now, 60)).unwrap();
        let later = now + Duration::seconds(61);
        assert!(matches!(
            decode_token("secret", &token, later),
            Err(Error::AuthenticationError(_))
        ));
    }

    #[test]
    fn garbage_rejected() {
        assert!(decode_token("secret", "abc", Utc::now()).is_err());
        assert!(decode_token("secret", "a.b.c", Utc::now()).is_err());
    }
}

//! Session-token issuance and verification.
//!
//! Tokens are `base64url(claims).base64url(hmac)` with HMAC-SHA256 over the
//! claims under the master key. They are stateless and non-revocable by
//! design: nothing is stored server-side and expiry is the only bound on a
//! token's lifetime. This is a documented limitation, not a bug.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::password::hash_password;
use keepvault_common::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime from issuance, in minutes.
pub const TOKEN_TTL_MINUTES: i64 = 30;

/// Signed token claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    login: String,
    iat: i64,
    exp: i64,
}

fn sign(payload: &[u8], key: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

fn encode(claims: &Claims, signing_key: &[u8]) -> Result<String> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| Error::Serialization(format!("Claims encoding failed: {}", e)))?;
    let payload = URL_SAFE_NO_PAD.encode(payload);
    let signature = URL_SAFE_NO_PAD.encode(sign(payload.as_bytes(), signing_key));
    Ok(format!("{}.{}", payload, signature))
}

/// Verify `password` against `stored_hash` and issue a session token
/// asserting `login`.
///
/// # Postconditions
/// - The token carries issued-at and a fixed 30-minute expiry
///
/// # Errors
/// - Returns `Error::Auth` unless the password hash matches `stored_hash`
pub fn issue_token(
    login: &str,
    password: &str,
    stored_hash: &str,
    signing_key: &[u8],
) -> Result<String> {
    let candidate = hash_password(password.as_bytes());
    if !bool::from(candidate.as_bytes().ct_eq(stored_hash.as_bytes())) {
        return Err(Error::Auth("wrong login or password".to_string()));
    }

    let now = Utc::now();
    let claims = Claims {
        login: login.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(TOKEN_TTL_MINUTES)).timestamp(),
    };

    encode(&claims, signing_key)
}

/// Verify a token and return the login it asserts.
///
/// # Errors
/// - Returns `Error::Auth` on a malformed token, bad signature, or expiry
pub fn verify_token(token: &str, signing_key: &[u8]) -> Result<String> {
    let (payload, signature) = token
        .split_once('.')
        .ok_or_else(|| Error::Auth("malformed token".to_string()))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| Error::Auth("malformed token".to_string()))?;

    // Constant-time comparison
    let expected = sign(payload.as_bytes(), signing_key);
    if !bool::from(expected.ct_eq(&signature)) {
        return Err(Error::Auth("invalid token".to_string()));
    }

    let claims: Claims = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .ok_or_else(|| Error::Auth("malformed token".to_string()))?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(Error::Auth("token expired".to_string()));
    }

    Ok(claims.login)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"signing key";

    fn stored_hash() -> String {
        hash_password(b"hunter2")
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let token = issue_token("alice", "hunter2", &stored_hash(), KEY).unwrap();
        assert_eq!(verify_token(&token, KEY).unwrap(), "alice");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let result = issue_token("alice", "hunter3", &stored_hash(), KEY);
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[test]
    fn test_wrong_signing_key_rejected() {
        let token = issue_token("alice", "hunter2", &stored_hash(), KEY).unwrap();
        assert!(matches!(
            verify_token(&token, b"other key"),
            Err(Error::Auth(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = issue_token("alice", "hunter2", &stored_hash(), KEY).unwrap();
        let (payload, signature) = token.split_once('.').unwrap();

        let mut raw = URL_SAFE_NO_PAD.decode(payload).unwrap();
        let json = String::from_utf8(raw.clone()).unwrap();
        raw = json.replace("alice", "mallory").into_bytes();
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(raw), signature);

        assert!(matches!(verify_token(&forged, KEY), Err(Error::Auth(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let past = Utc::now().timestamp() - 60;
        let claims = Claims {
            login: "alice".to_string(),
            iat: past - TOKEN_TTL_MINUTES * 60,
            exp: past,
        };
        let token = encode(&claims, KEY).unwrap();

        assert!(matches!(verify_token(&token, KEY), Err(Error::Auth(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            verify_token("not-a-token", KEY),
            Err(Error::Auth(_))
        ));
        assert!(matches!(verify_token("a.b", KEY), Err(Error::Auth(_))));
    }
}

//! Access Token Value Object
//!
//! Tokens are JWT-shaped: `base64url(header).base64url(payload).base64url(sig)`.
//! The client only ever reads `exp` from the payload; signing and
//! verification (HS256) are used by the mock backend.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use platform::crypto;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Tokens expiring within this window are treated as already expired
pub const DEFAULT_EXPIRY_LEEWAY: Duration = Duration::from_secs(10);

const HS256_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims issued by the mock backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

fn segments(token: &str) -> AuthResult<(&str, &str, &str)> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(AuthError::Validation("Token is not JWT-shaped".to_string())),
    }
}

fn decode_payload<T: for<'de> Deserialize<'de>>(payload: &str) -> AuthResult<T> {
    let bytes = crypto::from_base64url(payload)
        .map_err(|e| AuthError::Validation(format!("Token payload is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Validation(format!("Token payload is not valid JSON: {}", e)))
}

/// Expiry embedded in a token, without verifying its signature
pub fn expires_at(token: &str) -> AuthResult<DateTime<Utc>> {
    let (_, payload, _) = segments(token)?;
    let claim: ExpiryClaim = decode_payload(payload)?;

    DateTime::from_timestamp(claim.exp, 0)
        .ok_or_else(|| AuthError::Validation(format!("Token expiry out of range: {}", claim.exp)))
}

/// Whether the token is still usable at `now`
///
/// Decode errors and expiries too close to the clock range to subtract the
/// leeway from both count as expired.
pub fn is_live(token: &str, now: DateTime<Utc>, leeway: Duration) -> bool {
    let leeway = TimeDelta::from_std(leeway).unwrap_or(TimeDelta::zero());
    expires_at(token)
        .ok()
        .and_then(|exp| exp.checked_sub_signed(leeway))
        .is_some_and(|usable_until| usable_until > now)
}

/// Sign claims with HS256
pub fn sign(claims: &TokenClaims, secret: &[u8]) -> AuthResult<String> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| AuthError::Internal(format!("Failed to encode claims: {}", e)))?;

    let signing_input = format!(
        "{}.{}",
        crypto::to_base64url(HS256_HEADER.as_bytes()),
        crypto::to_base64url(&payload)
    );
    let tag = crypto::hmac_sha256(secret, signing_input.as_bytes())
        .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok(format!("{}.{}", signing_input, crypto::to_base64url(&tag)))
}

/// Verify an HS256 signature and decode the claims
///
/// Expiry is not checked here; callers compare `exp` against their clock.
pub fn verify(token: &str, secret: &[u8]) -> AuthResult<TokenClaims> {
    let invalid = || AuthError::Unauthorized("Invalid token".to_string());

    let (header, payload, signature) = segments(token).map_err(|_| invalid())?;
    let tag = crypto::from_base64url(signature).map_err(|_| invalid())?;
    let signing_input = format!("{}.{}", header, payload);

    if !crypto::verify_hmac_sha256(secret, signing_input.as_bytes(), &tag) {
        return Err(invalid());
    }

    decode_payload(payload).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> TokenClaims {
        TokenClaims {
            sub: "1".to_string(),
            email: Some("user@example.com".to_string()),
            role: Some(UserRole::User),
            typ: TokenType::Access,
            iat: exp - 900,
            exp,
            jti: "jti-1".to_string(),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let secret = [7u8; 32];
        let token = sign(&claims(2_000_000_000), &secret).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(verify(&token, &secret).unwrap(), claims(2_000_000_000));
        assert!(verify(&token, &[8u8; 32]).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = [7u8; 32];
        let token = sign(&claims(2_000_000_000), &secret).unwrap();
        let (head, rest) = token.split_once('.').unwrap();
        let (_, sig) = rest.split_once('.').unwrap();
        let forged_payload = crypto::to_base64url(br#"{"sub":"2","typ":"access","iat":0,"exp":2000000000,"jti":"x"}"#);

        let forged = format!("{}.{}.{}", head, forged_payload, sig);
        assert_eq!(
            verify(&forged, &secret),
            Err(AuthError::Unauthorized("Invalid token".to_string()))
        );
    }

    #[test]
    fn test_expires_at_reads_foreign_tokens() {
        let payload = crypto::to_base64url(br#"{"exp":1700000000,"custom":true}"#);
        let token = format!("eyJhbGciOiJub25lIn0.{}.sig", payload);

        assert_eq!(expires_at(&token).unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_expires_at_rejects_garbage() {
        assert!(expires_at("").is_err());
        assert!(expires_at("not-a-token").is_err());
        assert!(expires_at("a.b").is_err());
        assert!(expires_at("a.%%%.c").is_err());
        assert!(expires_at(&format!("a.{}.c", crypto::to_base64url(b"{}"))).is_err());
    }

    #[test]
    fn test_is_live_applies_leeway() {
        let now = Utc::now();
        let secret = [1u8; 32];
        let soon = sign(&claims(now.timestamp() + 5), &secret).unwrap();
        let later = sign(&claims(now.timestamp() + 600), &secret).unwrap();

        assert!(!is_live(&soon, now, DEFAULT_EXPIRY_LEEWAY));
        assert!(is_live(&soon, now, Duration::ZERO));
        assert!(is_live(&later, now, DEFAULT_EXPIRY_LEEWAY));
        assert!(!is_live("garbage", now, Duration::ZERO));
    }

    #[test]
    fn test_is_live_with_expiry_at_clock_limits() {
        let now = Utc::now();
        let at = |exp: i64| {
            let payload = crypto::to_base64url(format!(r#"{{"exp":{}}}"#, exp).as_bytes());
            format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
        };

        let earliest = at(DateTime::<Utc>::MIN_UTC.timestamp());
        let latest = at(DateTime::<Utc>::MAX_UTC.timestamp());

        assert!(!is_live(&earliest, now, DEFAULT_EXPIRY_LEEWAY));
        assert!(!is_live(&earliest, now, Duration::ZERO));
        assert!(is_live(&latest, now, DEFAULT_EXPIRY_LEEWAY));
        assert!(!is_live(&at(i64::MIN), now, DEFAULT_EXPIRY_LEEWAY));
    }
}

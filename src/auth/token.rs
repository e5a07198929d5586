//! Bearer tokens: HMAC-SHA256-signed identity claims.
//!
//! Token format: `hex(payload).hex(tag)` where the payload is
//! `account_id|issued_at|expires_at` and the tag is an HMAC over the
//! payload bytes. The token proves identity claims only; revocation is
//! the session store's job.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::auth::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub account_id: Uuid,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs: ttl_secs as i64,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("hmac accepts keys of any length")
    }

    /// Mint a token for an account.
    pub fn issue(&self, account_id: Uuid) -> String {
        let issued_at = Utc::now().timestamp();
        let payload = format!("{}|{}|{}", account_id, issued_at, issued_at + self.ttl_secs);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let tag = mac.finalize().into_bytes();

        format!("{}.{}", hex::encode(payload.as_bytes()), hex::encode(tag))
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let (payload_hex, tag_hex) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let payload = hex::decode(payload_hex).map_err(|_| AuthError::InvalidToken)?;
        let tag = hex::decode(tag_hex).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(&payload);
        // Constant-time comparison.
        mac.verify_slice(&tag).map_err(|_| AuthError::InvalidToken)?;

        let payload = String::from_utf8(payload).map_err(|_| AuthError::InvalidToken)?;
        let mut parts = payload.split('|');
        let account_id = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(AuthError::InvalidToken)?;
        let issued_at = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(AuthError::InvalidToken)?;
        let expires_at: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(AuthError::InvalidToken)?;

        if Utc::now().timestamp() >= expires_at {
            return Err(AuthError::InvalidToken);
        }

        Ok(TokenClaims {
            account_id,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let service = TokenService::new("test-secret", 3600);
        let account = Uuid::new_v4();

        let token = service.issue(account);
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.account_id, account);
        assert_eq!(claims.expires_at - claims.issued_at, 3600);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = TokenService::new("test-secret", 3600);
        let token = service.issue(Uuid::new_v4());

        let (payload, tag) = token.split_once('.').unwrap();
        let mut bytes = hex::decode(payload).unwrap();
        bytes[0] ^= 0xff;
        let forged = format!("{}.{}", hex::encode(bytes), tag);

        assert_eq!(service.verify(&forged), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new("secret-a", 3600);
        let verifier = TokenService::new("secret-b", 3600);

        let token = issuer.issue(Uuid::new_v4());
        assert_eq!(verifier.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new("test-secret", 0);
        let token = service.issue(Uuid::new_v4());
        assert_eq!(service.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let service = TokenService::new("test-secret", 3600);
        for garbage in ["", "no-dot", "zz.zz", "abc.", ".abc"] {
            assert_eq!(service.verify(garbage), Err(AuthError::InvalidToken));
        }
    }
}

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::OnceLock;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Password Hashing (Argon2id)
// =============================================================================

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Run a full argon2 verification against a throwaway hash.
///
/// Called when no account matches a login email so the miss costs the same
/// as a wrong password. Returns whether `password` matched the throwaway hash.
pub fn verify_dummy_password(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let hash = DUMMY_HASH.get_or_init(|| hash_password("unused-account-placeholder").ok());

    match hash {
        Some(hash) => verify_password(password, hash).unwrap_or(false),
        None => false,
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Claims carried by a verified session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: u64,
    /// Unix timestamp (seconds) after which the token is rejected
    pub expires_at: i64,
}

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Malformed,
    BadSignature,
    Expired,
}

fn sign(payload: &str, secret: &str) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(payload.as_bytes());
    Some(mac)
}

/// Issue a session token for `user_id`, valid for `ttl_secs` from `now`.
///
/// Format: `{user_id}.{expires_at}.{hex(HMAC-SHA256(user_id.expires_at))}`.
/// Clients treat the value as opaque.
pub fn issue_token(user_id: u64, now: i64, ttl_secs: i64, secret: &str) -> String {
    let payload = format!("{}.{}", user_id, now + ttl_secs);
    let signature = sign(&payload, secret)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}.{}", payload, signature)
}

/// Verify a session token's signature and expiry against `now`.
pub fn verify_token(token: &str, now: i64, secret: &str) -> Result<TokenClaims, TokenError> {
    let (payload, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let (user_id, expires_at) = payload.split_once('.').ok_or(TokenError::Malformed)?;

    let user_id: u64 = user_id.parse().map_err(|_| TokenError::Malformed)?;
    let expires_at: i64 = expires_at.parse().map_err(|_| TokenError::Malformed)?;
    let sig_bytes = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

    let mac = sign(payload, secret).ok_or(TokenError::BadSignature)?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| TokenError::BadSignature)?;

    if now >= expires_at {
        return Err(TokenError::Expired);
    }

    Ok(TokenClaims {
        user_id,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const NOW: i64 = 1_760_000_000;
    const WEEK: i64 = 7 * 24 * 3600;

    #[test]
    fn test_dummy_verification_rejects_real_passwords() {
        assert!(!verify_dummy_password("secret123"));
        assert!(!verify_dummy_password(""));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(42, NOW, WEEK, SECRET);
        let claims = verify_token(&token, NOW + 60, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.expires_at, NOW + WEEK);
    }

    #[test]
    fn test_token_expired() {
        let token = issue_token(42, NOW, WEEK, SECRET);
        assert_eq!(
            verify_token(&token, NOW + WEEK, SECRET),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = issue_token(42, NOW, WEEK, SECRET);
        assert_eq!(
            verify_token(&token, NOW, "other-secret"),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_tampered_user_id() {
        let token = issue_token(42, NOW, WEEK, SECRET);
        let tampered = token.replacen("42.", "43.", 1);
        assert_eq!(
            verify_token(&tampered, NOW, SECRET),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_malformed() {
        assert_eq!(verify_token("", NOW, SECRET), Err(TokenError::Malformed));
        assert_eq!(
            verify_token("abc.def", NOW, SECRET),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            verify_token("1.2.zz", NOW, SECRET),
            Err(TokenError::Malformed)
        );
    }
}

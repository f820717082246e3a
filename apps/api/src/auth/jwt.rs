// JWT token creation and verification
// HS256 tokens carrying the user's id, username and role

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::{User, UserRole};

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `username` - Login name at issue time
/// * `role` - Role at issue time; handlers re-check against the stored user
/// * `iat` / `exp` - Issue and expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
}

/// Creates a JWT token for a user
///
/// # Arguments
/// * `user` - The authenticated user
/// * `secret` - The secret key for signing
/// * `ttl_hours` - Hours until the token expires
///
/// # Example
/// ```
/// use dlvery_api::auth::jwt::{create_token, verify_token};
/// use dlvery_api::domain::user::{Email, User, UserRole};
///
/// let user = User::new(
///     "agent1".to_string(),
///     "hash".to_string(),
///     Email::new("agent1@dlvery.io").unwrap(),
///     "Agent One".to_string(),
///     UserRole::DlTeam,
///     None,
/// );
/// let token = create_token(&user, "your-secret-key", 8).expect("valid token");
/// let claims = verify_token(&token, "your-secret-key").expect("valid token");
/// assert_eq!(claims.sub, user.id);
/// ```
pub fn create_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a JWT token
///
/// # Returns
/// * `Ok(Claims)` - The decoded claims if token is valid
/// * `Err(String)` - If token is invalid or expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Email;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    fn user() -> User {
        User::new(
            "stores1".to_string(),
            "hash".to_string(),
            Email::new("stores1@dlvery.io").unwrap(),
            "Stores One".to_string(),
            UserRole::InvTeam,
            None,
        )
    }

    #[test]
    fn create_and_verify_token() {
        let user = user();
        let token = create_token(&user, TEST_SECRET, 8).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "stores1");
        assert_eq!(claims.role, UserRole::InvTeam);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_token(&user(), TEST_SECRET, 8).expect("valid token");
        assert!(verify_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn invalid_token_fails() {
        assert!(verify_token("invalid.token.string", TEST_SECRET).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let token = create_token(&user(), TEST_SECRET, -2).expect("valid token");
        assert!(verify_token(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn token_expiry_follows_ttl() {
        let token = create_token(&user(), TEST_SECRET, 8).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        let expiry_time = claims.exp as i64;
        let now = Utc::now().timestamp();
        let in_8_hours = (Utc::now() + Duration::hours(8)).timestamp();

        assert!(expiry_time > now);
        assert!(expiry_time <= in_8_hours + 10);
    }
}

// Password hashing utilities
// Uses bcrypt with a configurable cost

use bcrypt::{hash, verify};

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use dlvery_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password", 4).expect("valid hash");
/// assert!(verify_password("my_password", &hash).unwrap());
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, String> {
    hash(password, cost).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
///
/// Returns `Ok(false)` on mismatch; `Err` only when the hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

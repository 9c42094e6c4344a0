// Password hashing for stored user credentials.
// The stored value is an opaque bcrypt string; plaintext never reaches the store.

use bcrypt::BcryptError;

pub use bcrypt::DEFAULT_COST;

/// Hashes a plaintext password with the given bcrypt cost
///
/// # Example
/// ```
/// use monolith_api::domain::user::password::hash_password;
///
/// let hash = hash_password("correct horse", 4).expect("valid hash");
/// assert!(hash.starts_with("$2"));
/// ```
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// bcrypt cost used for stored admin passwords.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt at [`BCRYPT_COST`].
///
/// # Errors
/// Returns the bcrypt error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a bcrypt hash.
///
/// # Errors
/// Returns the bcrypt error if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

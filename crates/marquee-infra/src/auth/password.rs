//! Password hashing for editor accounts.
//!
//! Hashes are PHC strings, so the work parameters travel with each hash and
//! can be tightened later without invalidating stored credentials.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use marquee_core::ports::{AuthError, PasswordService};

/// Argon2id adapter behind the [`PasswordService`] port.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        // A malformed stored hash is an error, not a failed login.
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_the_right_password_only() {
        let service = Argon2PasswordService::new();

        let hash = service.hash("correct horse battery staple").unwrap();
        assert!(service.verify("correct horse battery staple", &hash).unwrap());
        assert!(!service.verify("correct horse battery", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let service = Argon2PasswordService::new();

        let a = service.hash("same password").unwrap();
        let b = service.hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let service = Argon2PasswordService::new();

        let result = service.verify("anything", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }
}

//! Password hashing and temporary password generation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;

const TEMP_PASSWORD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("hash password: {e}"))
}

/// Verify a password against a stored hash. Unparseable hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// Random temporary password of uppercase letters and digits
pub fn generate_temp_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| TEMP_PASSWORD_CHARSET[rng.random_range(0..TEMP_PASSWORD_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("K3YB0ARD").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("K3YB0ARD", &hash));
        assert!(!verify_password("k3yb0ard", &hash));
    }

    #[test]
    fn test_invalid_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext"));
    }

    #[test]
    fn test_temp_password_shape() {
        let password = generate_temp_password(8);

        assert_eq!(password.len(), 8);
        assert!(password.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_ne!(generate_temp_password(16), generate_temp_password(16));
    }
}

use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;

use crate::auth::config::HasherCost;
use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// One-way salted credential hashing with Argon2id.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(cost: HasherCost) -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(cost.memory_kib);
        builder.t_cost(cost.iterations);
        builder.p_cost(cost.parallelism);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    /// Hash with a fresh random salt; two calls on the same input never agree.
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng()
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthError::PasswordHash(format!("entropy source failed: {err}")))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// Returns `false` for a wrong password and for anything that is not a
    /// parseable PHC hash string.
    pub fn verify_password(&self, password: &str, encoded: &str) -> bool {
        let parsed = match PasswordHash::new(encoded) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("stored password hash is malformed: {}", err);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_service() -> PasswordService {
        PasswordService::new(HasherCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("password service")
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let service = fast_service();
        let hash = service
            .hash_password("super-secret")
            .expect("hash generation");
        assert_ne!(hash, "super-secret");
        assert!(service.verify_password("super-secret", &hash));
        assert!(!service.verify_password("wrong-password", &hash));
    }

    #[test]
    fn salts_differ_between_calls() {
        let service = fast_service();
        let first = service.hash_password("pw123").expect("first hash");
        let second = service.hash_password("pw123").expect("second hash");
        assert_ne!(first, second);
        assert!(service.verify_password("pw123", &first));
        assert!(service.verify_password("pw123", &second));
    }

    #[test]
    fn malformed_hashes_do_not_verify() {
        let service = fast_service();
        assert!(!service.verify_password("pw123", "not-a-phc-string"));
        assert!(!service.verify_password("pw123", ""));
        assert!(!service.verify_password("pw123", "pw123"));
    }

    #[test]
    fn rejects_invalid_cost_parameters() {
        let result = PasswordService::new(HasherCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(AuthError::Argon2(_))));
    }
}

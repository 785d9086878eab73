use std::env;
use std::fmt;

use crate::auth::{AuthError, AuthResult};

const MIN_SECRET_LEN: usize = 32;
/// Upper bound on access token lifetime (30 days).
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

/// Work factor for the Argon2id credential hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Authentication configuration loaded once at startup from environment variables.
#[derive(Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_secs: i64,
    pub token_leeway_secs: u64,
    pub jwt_secret: String,
    pub hasher_cost: HasherCost,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let jwt_secret = env::var("DIRECTORY_JWT_SECRET")
            .map_err(|_| AuthError::Config("DIRECTORY_JWT_SECRET is required".into()))?;
        let issuer =
            env::var("DIRECTORY_JWT_ISSUER").unwrap_or_else(|_| "http://localhost".into());
        let audience =
            env::var("DIRECTORY_JWT_AUDIENCE").unwrap_or_else(|_| "directory-api".into());
        let access_token_ttl_secs = env_i64("DIRECTORY_TOKEN_TTL_SECS", 24 * 60 * 60);
        // Opt-in clock-skew allowance. Any non-zero value lets tokens through for
        // that many seconds past their expiry.
        let token_leeway_secs = env_i64("DIRECTORY_TOKEN_LEEWAY_SECS", 0).max(0) as u64;
        let defaults = HasherCost::default();
        let hasher_cost = HasherCost {
            memory_kib: env_u32("DIRECTORY_ARGON2_M_COST_KIB", defaults.memory_kib),
            iterations: env_u32("DIRECTORY_ARGON2_T_COST", defaults.iterations),
            parallelism: env_u32("DIRECTORY_ARGON2_P_COST", defaults.parallelism),
        };

        let config = Self {
            issuer,
            audience,
            access_token_ttl_secs,
            token_leeway_secs,
            jwt_secret,
            hasher_cost,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the token service cannot safely run with.
    pub fn validate(&self) -> AuthResult<()> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if self.access_token_ttl_secs <= 0 || self.access_token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(AuthError::Config(format!(
                "access token TTL must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("jwt_secret", &"<redacted>")
            .field("hasher_cost", &self.hasher_cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(secret: &str) -> AuthConfig {
        AuthConfig {
            issuer: "https://directory.test".into(),
            audience: "directory-api".into(),
            access_token_ttl_secs: 86_400,
            token_leeway_secs: 0,
            jwt_secret: secret.into(),
            hasher_cost: HasherCost::default(),
        }
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = config_with_secret("0123456789abcdef0123456789abcdef-secret");
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("0123456789abcdef"));
    }

    #[test]
    fn short_secrets_are_rejected() {
        let err = config_with_secret("short").validate().unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
        assert!(
            config_with_secret("0123456789abcdef0123456789abcdef")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let mut config = config_with_secret("0123456789abcdef0123456789abcdef");
        config.access_token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let mut config = config_with_secret("0123456789abcdef0123456789abcdef");
        config.access_token_ttl_secs = i64::MAX;
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));

        config.access_token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());
        config.access_token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(config.validate().is_err());
    }
}

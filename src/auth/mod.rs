//! Authentication module: configuration, credential hashing, token minting,
//! Rocket request guards, and the register/login route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod responses;
pub mod routes;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::AuthUser;
pub use jwt::JwtService;
pub use passwords::PasswordService;

/// Process-wide authentication state, built once at ignition and managed by Rocket.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        password_service: PasswordService,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            config,
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
        }
    }

    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        let password_service = PasswordService::new(config.hasher_cost)?;
        let jwt_service = JwtService::from_config(&config)?;
        Ok(Self::new(config, password_service, jwt_service))
    }
}

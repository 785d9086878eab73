use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("unauthorized")]
    Unauthorized,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("token signing error: {0}")]
    Signing(String),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::Unauthorized => Status::Unauthorized,
            AuthError::Config(_)
            | AuthError::Signing(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_) => Status::InternalServerError,
        }
    }

    /// Whether the failure is a caller problem rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        self.status().class().is_client_error()
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_unauthorized() {
        for err in [
            AuthError::TokenExpired,
            AuthError::TokenInvalid,
            AuthError::Unauthorized,
        ] {
            assert_eq!(err.status(), Status::Unauthorized);
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn primitive_failures_are_internal() {
        let err = AuthError::Signing("boom".into());
        assert_eq!(err.status(), Status::InternalServerError);
        assert!(!err.is_client_error());
    }
}

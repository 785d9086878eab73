use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{
    Object, SecurityRequirement, SecurityScheme, SecuritySchemeData,
};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, AuthState};

/// Caller identity proven by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => {
                if err.is_client_error() {
                    log::debug!("rejecting request to {}: {}", request.uri(), err);
                } else {
                    log::error!("authentication guard failed: {}", err);
                }
                Outcome::Error((err.status(), err))
            }
        }
    }
}

impl<'r> OpenApiFromRequest<'r> for AuthUser {
    fn from_request_input(
        _generator: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let scheme = SecurityScheme {
            description: Some("Access token returned by /auth/register or /auth/login.".into()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".into(),
                bearer_format: Some("JWT".into()),
            },
            extensions: Object::default(),
        };
        let mut requirement = SecurityRequirement::new();
        requirement.insert("BearerAuth".into(), Vec::new());
        Ok(RequestHeaderInput::Security(
            "BearerAuth".into(),
            scheme,
            requirement,
        ))
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let identity = auth_state.jwt_service.validate(token)?;

    Ok(AuthUser {
        id: identity.user_id,
        email: identity.email,
    })
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::Unauthorized)?;
    parse_bearer(header)
}

fn parse_bearer(header: &str) -> AuthResult<&str> {
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_headers() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(parse_bearer("bearer  abc").unwrap(), "abc");
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        for header in ["Basic dXNlcjpwdw==", "Bearer", "Bearer   ", "abc.def.ghi", ""] {
            assert!(
                matches!(parse_bearer(header), Err(AuthError::Unauthorized)),
                "{header:?} should be rejected"
            );
        }
    }
}

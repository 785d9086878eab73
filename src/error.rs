use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Catcher, Request, Response, catch, catchers};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::Map;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use serde::Serialize;
use std::io::Cursor;

use crate::auth::AuthError;
use crate::directory::{DirectoryError, StoreError};
use crate::models::FieldError;

/// Boundary error type: every failure leaving a route handler passes through here.
#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    status: String,
    message: String,
    status_code: u16,
}

#[derive(Serialize)]
struct ValidationResponse {
    errors: Vec<FieldError>,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::UnprocessableEntity,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::InternalError(_) => Status::InternalServerError,
        }
    }

    fn body(self) -> String {
        let status = self.status();
        let message = match self {
            ApiError::Validation(errors) => return validation_body(errors),
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                "Internal server error".to_string()
            }
        };
        error_body(status, message)
    }
}

/// Render the `{errors:[{field, message}]}` body used for 422 responses.
pub fn validation_body(errors: Vec<FieldError>) -> String {
    serde_json::to_string(&ValidationResponse { errors })
        .unwrap_or_else(|_| r#"{"errors":[]}"#.to_string())
}

/// Render the `{status, message, statusCode}` body shared by handlers and catchers.
pub fn error_body(status: Status, message: impl Into<String>) -> String {
    // Clients branch on `status`, which has only ever carried these two
    // labels. Every 4xx says "Bad request"; `statusCode` holds the real code.
    let label = if status.class().is_server_error() {
        "Internal server error"
    } else {
        "Bad request"
    };
    let error_response = ErrorResponse {
        status: label.to_string(),
        message: message.into(),
        status_code: status.code,
    };

    serde_json::to_string(&error_response).unwrap_or_else(|_| {
        r#"{"status":"Internal server error","message":"Failed to serialize error","statusCode":500}"#
            .to_string()
    })
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let json = self.body();

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Map::new();
        for (code, description) in [
            ("400", "Malformed request body."),
            ("401", "Missing, invalid or expired token, or failed authentication."),
            ("403", "Caller is not a member of the target organisation."),
            ("404", "Target user or organisation does not exist."),
            ("422", "Field-level validation errors, including duplicate email."),
            ("500", "Internal failure; details are logged, not returned."),
        ] {
            responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}

// ===== Catchers =====

type CaughtBody = (Status, (ContentType, String));

fn caught(status: Status, message: &str) -> CaughtBody {
    (status, (ContentType::JSON, error_body(status, message)))
}

#[catch(400)]
fn bad_request() -> CaughtBody {
    caught(Status::BadRequest, "Malformed request body")
}

#[catch(401)]
fn unauthorized() -> CaughtBody {
    caught(Status::Unauthorized, "Invalid or missing token")
}

#[catch(403)]
fn forbidden() -> CaughtBody {
    caught(Status::Forbidden, "You do not have access to this resource")
}

#[catch(404)]
fn not_found() -> CaughtBody {
    caught(Status::NotFound, "Resource not found")
}

/// Rocket answers 422 when a JSON body does not fit the request type.
#[catch(422)]
fn unprocessable() -> CaughtBody {
    let body = validation_body(vec![FieldError::new(
        "body",
        "Request body has the wrong shape",
    )]);
    (Status::UnprocessableEntity, (ContentType::JSON, body))
}

#[catch(500)]
fn internal_error() -> CaughtBody {
    caught(Status::InternalServerError, "Internal server error")
}

#[catch(default)]
fn fallback(status: Status, _request: &Request<'_>) -> CaughtBody {
    let message = if status.class().is_server_error() {
        "Internal server error"
    } else {
        status.reason().unwrap_or("Request failed")
    };
    caught(status, message)
}

/// JSON catchers for everything that fails before or outside a handler.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable,
        internal_error,
        fallback
    ]
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Validation(errors) => ApiError::Validation(errors),
            DirectoryError::DuplicateEmail => {
                log::debug!("registration rejected: duplicate email");
                ApiError::Validation(vec![FieldError::new("email", "Email already exists")])
            }
            DirectoryError::AuthenticationFailed => {
                ApiError::Unauthorized("Authentication failed".to_string())
            }
            DirectoryError::Forbidden => {
                ApiError::Forbidden("You do not have access to this resource".to_string())
            }
            DirectoryError::NotFound(entity) => ApiError::NotFound(format!("{entity} not found")),
            DirectoryError::Auth(err) => ApiError::from(err),
            DirectoryError::Store(err) => ApiError::from(err),
            DirectoryError::Task(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::TokenInvalid | AuthError::Unauthorized => {
                ApiError::Unauthorized("Invalid or missing token".to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

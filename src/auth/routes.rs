use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::openapi;

use crate::auth::responses::{AuthPayload, LoginRequest, RegisterRequest};
use crate::directory::DirectoryService;
use crate::error::ApiError;
use crate::models::ApiResponse;

type AuthRouteResult = Result<status::Custom<Json<ApiResponse<AuthPayload>>>, ApiError>;

/// Register a user, create their default organisation and return an access token.
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<payload>")]
pub async fn register(
    directory: &State<DirectoryService>,
    payload: Json<RegisterRequest>,
) -> AuthRouteResult {
    let auth = directory.register(&payload).await?;

    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::success("Registration successful", auth)),
    ))
}

/// Exchange email and password for an access token.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    directory: &State<DirectoryService>,
    payload: Json<LoginRequest>,
) -> AuthRouteResult {
    let auth = directory.login(&payload).await?;

    Ok(status::Custom(
        Status::Ok,
        Json(ApiResponse::success("Login successful", auth)),
    ))
}

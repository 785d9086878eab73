use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::directory::DirectoryService;
use crate::error::ApiError;
use crate::models::{ApiResponse, UserProfile};

use super::helpers::parse_path_id;

/// Fetch a user's public profile. Visible to the user themselves and to
/// anyone sharing an organisation with them.
#[openapi(tag = "Users")]
#[get("/api/users/<user_id>")]
pub async fn get_user(
    user: AuthUser,
    directory: &State<DirectoryService>,
    user_id: &str,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let target = parse_path_id(user_id, "User")?;
    let profile = directory.get_user(&user, target).await?;
    Ok(Json(ApiResponse::success("User found", profile)))
}

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;

use crate::auth::AuthUser;
use crate::directory::DirectoryService;
use crate::error::ApiError;
use crate::models::{
    AddMemberRequest, ApiResponse, CreateOrganisationRequest, OrganisationList, OrganisationView,
};

use super::helpers::parse_path_id;

/// List the organisations the caller belongs to.
#[openapi(tag = "Organisations")]
#[get("/api/organisations")]
pub async fn list_organisations(
    user: AuthUser,
    directory: &State<DirectoryService>,
) -> Result<Json<ApiResponse<OrganisationList>>, ApiError> {
    let organisations = directory.list_organisations(&user).await?;
    Ok(Json(ApiResponse::success(
        "Organisations found",
        OrganisationList { organisations },
    )))
}

/// Fetch one organisation. Only members may read it.
#[openapi(tag = "Organisations")]
#[get("/api/organisations/<org_id>")]
pub async fn get_organisation(
    user: AuthUser,
    directory: &State<DirectoryService>,
    org_id: &str,
) -> Result<Json<ApiResponse<OrganisationView>>, ApiError> {
    let org_id = parse_path_id(org_id, "Organisation")?;
    let org = directory.get_organisation(&user, org_id).await?;
    Ok(Json(ApiResponse::success("Organisation found", org)))
}

#[openapi(tag = "Organisations")]
#[post("/api/organisations", data = "<payload>")]
pub async fn create_organisation(
    user: AuthUser,
    directory: &State<DirectoryService>,
    payload: Json<CreateOrganisationRequest>,
) -> Result<status::Custom<Json<ApiResponse<OrganisationView>>>, ApiError> {
    let org = directory.create_organisation(&user, &payload).await?;
    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::success("Organisation created successfully", org)),
    ))
}

/// Add an existing user to an organisation the caller is a member of.
/// Adding someone who is already a member succeeds without change.
#[openapi(tag = "Organisations")]
#[post("/api/organisations/<org_id>/users", data = "<payload>")]
pub async fn add_member(
    user: AuthUser,
    directory: &State<DirectoryService>,
    org_id: &str,
    payload: Json<AddMemberRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let org_id = parse_path_id(org_id, "Organisation")?;
    directory.add_member(&user, org_id, &payload).await?;
    Ok(Json(ApiResponse::message_only(
        "User added to organisation successfully",
    )))
}

//! Readiness endpoint reporting whether the directory store is reachable.

use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::directory::DirectoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise.
    pub status: String,
    pub store: String,
}

/// Returns 200 when the store answers a ping and 503 when it does not.
#[openapi(tag = "Health")]
#[get("/api/health")]
pub async fn health_check(directory: &State<DirectoryService>) -> status::Custom<Json<HealthResponse>> {
    let (code, status, store) = if directory.store_reachable().await {
        (Status::Ok, "ok", "reachable")
    } else {
        (Status::ServiceUnavailable, "degraded", "unreachable")
    };

    status::Custom(
        code,
        Json(HealthResponse {
            status: status.to_string(),
            store: store.to_string(),
        }),
    )
}

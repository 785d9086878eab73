use directory_api::routes::health::{HealthResponse, health_check};
use directory_api::test_support::{TestDirectory, TestRocketBuilder};
use rocket::http::Status;
use rocket::routes;

#[test]
fn health_endpoint_reports_reachable_store() {
    let (directory, _) = TestDirectory::in_memory();
    let client = TestRocketBuilder::new()
        .manage_directory(&directory)
        .mount_routes(routes![health_check])
        .blocking_client();

    let response = client.get("/api/health").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let payload: HealthResponse = response.into_json().expect("valid JSON payload");
    assert_eq!(payload.status, "ok");
    assert_eq!(payload.store, "reachable");
}

#[test]
fn unknown_paths_get_a_json_404() {
    let (directory, _) = TestDirectory::in_memory();
    let client = TestRocketBuilder::new()
        .manage_directory(&directory)
        .mount_routes(routes![health_check])
        .blocking_client();

    let response = client.get("/api/nowhere").dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let body: serde_json::Value = response.into_json().expect("json body");
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["status"], "Bad request");
}

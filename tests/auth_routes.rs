use directory_api::api_routes;
use directory_api::auth::responses::AuthPayload;
use directory_api::models::ApiResponse;
use directory_api::test_support::{TestDirectory, TestRocketBuilder};
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::{Value, json};

fn client() -> Client {
    let (directory, _) = TestDirectory::in_memory();
    TestRocketBuilder::new()
        .manage_directory(&directory)
        .mount_routes(api_routes())
        .blocking_client()
}

fn john() -> Value {
    json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john@example.com",
        "password": "password123",
        "phone": "1234567890"
    })
}

#[test]
fn register_returns_created_with_token_and_profile() {
    let client = client();
    let response = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(john().to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Created);

    let body: Value = response.into_json().expect("json body");
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Registration successful");
    assert!(body["data"]["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["data"]["user"]["firstName"], "John");
    assert_eq!(body["data"]["user"]["phone"], "1234567890");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(!body.to_string().contains("password123"));
}

#[test]
fn register_lists_missing_fields_as_422() {
    let client = client();
    let response = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(json!({"email": "john@example.com"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let body: Value = response.into_json().expect("json body");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["firstName", "lastName", "password"]);
}

#[test]
fn duplicate_email_is_a_422_field_error() {
    let client = client();
    let first = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(john().to_string())
        .dispatch();
    assert_eq!(first.status(), Status::Created);

    let second = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(john().to_string())
        .dispatch();
    assert_eq!(second.status(), Status::UnprocessableEntity);
    let body: Value = second.into_json().expect("json body");
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["message"], "Email already exists");
}

#[test]
fn malformed_json_is_rejected_with_json_body() {
    let client = client();
    let response = client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().expect("json body");
    assert_eq!(body["statusCode"], 400);
}

#[test]
fn login_round_trip_and_generic_failures() {
    let client = client();
    client
        .post("/auth/register")
        .header(ContentType::JSON)
        .body(john().to_string())
        .dispatch();

    let ok = client
        .post("/auth/login")
        .header(ContentType::JSON)
        .body(json!({"email": "john@example.com", "password": "password123"}).to_string())
        .dispatch();
    assert_eq!(ok.status(), Status::Ok);
    let payload: ApiResponse<AuthPayload> = ok.into_json().expect("auth payload");
    assert_eq!(payload.message, "Login successful");
    assert_eq!(payload.data.expect("data").user.email, "john@example.com");

    let mut bodies = Vec::new();
    for attempt in [
        json!({"email": "john@example.com", "password": "nope"}),
        json!({"email": "ghost@example.com", "password": "password123"}),
    ] {
        let response = client
            .post("/auth/login")
            .header(ContentType::JSON)
            .body(attempt.to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
        bodies.push(response.into_string().expect("body"));
    }
    assert_eq!(bodies[0], bodies[1]);
    let body: Value = serde_json::from_str(&bodies[0]).expect("json");
    assert_eq!(body["message"], "Authentication failed");
}

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use auth_cell::router::auth_routes;
use auth_cell::{AuthService, LoginRequest};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{seed_doctor, send, test_state, JwtTestUtils, TEST_PASSWORD};

fn registration(email: &str, license: &str) -> Value {
    json!({
        "email": email,
        "password": "Aa12345678",
        "full_name": "Dr Gregory House",
        "license_number": license,
        "specialization": "Diagnostics"
    })
}

#[tokio::test]
async fn test_register_returns_token_and_hides_hash() {
    let state = test_state().await;
    let app = auth_routes(state.clone());

    let response = send(&app, Method::POST, "/register/doctor", None, Some(registration("house@x.com", "LIC-1"))).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["doctor"]["email"], "house@x.com");
    assert!(response.body["doctor"].get("password_hash").is_none());

    let token = response.body["token"].as_str().unwrap();
    let doctor = validate_token(token, &state.config.jwt_secret).unwrap();
    assert_eq!(doctor.role, "doctor");
    assert_eq!(doctor.id, response.body["doctor"]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn test_register_duplicates_conflict() {
    let state = test_state().await;
    let app = auth_routes(state.clone());
    send(&app, Method::POST, "/register/doctor", None, Some(registration("house@x.com", "LIC-1"))).await;

    let same_email = send(&app, Method::POST, "/register/doctor", None, Some(registration("house@x.com", "LIC-2"))).await;
    assert_eq!(same_email.status, StatusCode::CONFLICT);
    assert_eq!(same_email.body["kind"], "duplicate");
    assert!(same_email.body["error"].as_str().unwrap().contains("email"));

    let same_license = send(&app, Method::POST, "/register/doctor", None, Some(registration("cuddy@x.com", "LIC-1"))).await;
    assert_eq!(same_license.status, StatusCode::CONFLICT);
    assert!(same_license.body["error"].as_str().unwrap().contains("license"));
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let state = test_state().await;
    let app = auth_routes(state);
    let mut body = registration("house@x.com", "LIC-1");
    body["password"] = json!("alllowercase");

    let response = send(&app, Method::POST, "/register/doctor", None, Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "validation_error");
}

#[tokio::test]
async fn test_login() {
    let state = test_state().await;
    let doctor_id = seed_doctor(&state.db, "house@x.com", "LIC-1").await;
    let service = AuthService::new(&state);

    let session = service
        .login(LoginRequest {
            email: "House@X.com".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.doctor.id, doctor_id);

    let wrong_password = service
        .login(LoginRequest {
            email: "house@x.com".to_string(),
            password: "Wrong12345".to_string(),
        })
        .await;
    assert_matches!(wrong_password, Err(AppError::Auth(ref msg)) if msg == "Invalid credentials");

    let unknown = service
        .login(LoginRequest {
            email: "nobody@x.com".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await;
    assert_matches!(unknown, Err(AppError::Auth(ref msg)) if msg == "Invalid credentials");
}

#[tokio::test]
async fn test_login_route_wrong_password_is_unauthorized() {
    let state = test_state().await;
    seed_doctor(&state.db, "house@x.com", "LIC-1").await;
    let app = auth_routes(state);

    let response = send(
        &app,
        Method::POST,
        "/login/doctor",
        None,
        Some(json!({ "email": "house@x.com", "password": "Wrong12345" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_validate_and_verify() {
    let state = test_state().await;
    let app = auth_routes(state.clone());
    let secret = &state.config.jwt_secret;
    let good = JwtTestUtils::create_test_token(7, "house@x.com", secret);
    let expired = JwtTestUtils::create_expired_token(7, "house@x.com", secret);

    let valid = send(&app, Method::POST, "/validate", Some(&good), None).await;
    assert_eq!(valid.status, StatusCode::OK);
    assert_eq!(valid.body["doctor_id"], 7);
    assert_eq!(valid.body["valid"], true);

    let rejected = send(&app, Method::POST, "/validate", Some(&expired), None).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.body["error"], "Token expired");

    let verified = send(&app, Method::POST, "/verify", Some(&good), None).await;
    assert_eq!(verified.body["valid"], true);

    let malformed = send(&app, Method::POST, "/verify", Some(&JwtTestUtils::create_malformed_token()), None).await;
    assert_eq!(malformed.status, StatusCode::OK);
    assert_eq!(malformed.body["valid"], false);

    let missing = send(&app, Method::POST, "/verify", None, None).await;
    assert_eq!(missing.body["valid"], false);
}

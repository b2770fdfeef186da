use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};

use medrec_api::router::create_router;
use shared_utils::test_utils::{send, test_state};

async fn app() -> Router {
    create_router(test_state().await)
}

async fn register(app: &Router, email: &str, license: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/auth/register/doctor",
        None,
        Some(json!({
            "email": email,
            "password": "Aa12345678",
            "full_name": "Dr Jane Smith",
            "license_number": license,
            "specialization": "General Practice",
            "phone": "+33612345678"
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    response.body["token"].as_str().unwrap().to_string()
}

async fn create_patient(app: &Router, token: &str, name: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/patients",
        Some(token),
        Some(json!({
            "full_name": name,
            "date_of_birth": "1990-01-01",
            "gender": "male",
            "medical_info": { "blood_type": "O+" }
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    response.body
}

fn is_code(value: &Value, prefix: &str) -> bool {
    value.as_str().is_some_and(|code| {
        code.strip_prefix(prefix).is_some_and(|suffix| {
            suffix.len() == 8 && suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
    })
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let response = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_duplicates() {
    let app = app().await;
    let token = register(&app, "doc@x.com", "LIC-1").await;
    let session = send(&app, Method::POST, "/auth/validate", Some(&token), None).await;
    assert_eq!(session.body["valid"], true);

    let login = send(
        &app,
        Method::POST,
        "/auth/login/doctor",
        None,
        Some(json!({ "email": "doc@x.com", "password": "Aa12345678" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body["token"].is_string());
    assert_eq!(login.body["doctor"]["id"], session.body["doctor_id"]);

    let wrong = send(
        &app,
        Method::POST,
        "/auth/login/doctor",
        None,
        Some(json!({ "email": "doc@x.com", "password": "Aa00000000" })),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["kind"], "auth_error");

    let duplicate = send(
        &app,
        Method::POST,
        "/auth/register/doctor",
        None,
        Some(json!({
            "email": "doc@x.com",
            "password": "Aa12345678",
            "full_name": "Dr Someone Else",
            "license_number": "LIC-2",
            "specialization": "Cardiology"
        })),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_patient_record_and_consultation_flow() {
    let app = app().await;
    let token = register(&app, "doc@x.com", "LIC-1").await;

    let created = create_patient(&app, &token, "John Doe").await;
    assert!(is_code(&created["patient"]["unique_code"], "PAT-"));
    assert!(is_code(&created["medical_record"]["record_code"], "MR-"));
    let record_code = created["medical_record"]["record_code"].as_str().unwrap().to_string();
    let record_id = created["medical_record"]["id"].as_i64().unwrap();

    let access = json!({ "record_code": record_code });
    let before = send(&app, Method::POST, "/medical-records/access", None, Some(access.clone())).await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.body["consultations"], json!([]));
    assert_eq!(before.body["medical_record"]["patient_name"], "John Doe");

    let consultation = send(
        &app,
        Method::POST,
        &format!("/medical-records/{}/consultations", record_id),
        Some(&token),
        Some(json!({ "diagnosis": "flu" })),
    )
    .await;
    assert_eq!(consultation.status, StatusCode::CREATED);
    let consultation_id = consultation.body["consultation_id"].as_i64().unwrap();

    let first = send(&app, Method::POST, "/medical-records/access", None, Some(access.clone())).await;
    let second = send(&app, Method::POST, "/medical-records/access", None, Some(access)).await;
    assert_eq!(first.body["consultations"][0]["diagnosis"], "flu");
    assert_eq!(first.body, second.body);

    let fetched = send(&app, Method::GET, &format!("/consultations/{}", consultation_id), Some(&token), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["consultation"]["diagnosis"], "flu");

    let bad_code = send(
        &app,
        Method::POST,
        "/medical-records/access",
        None,
        Some(json!({ "record_code": "MR-123" })),
    )
    .await;
    assert_eq!(bad_code.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_doctor_scope_isolation() {
    let app = app().await;
    let alice = register(&app, "alice@x.com", "LIC-A").await;
    let bob = register(&app, "bob@x.com", "LIC-B").await;
    let created = create_patient(&app, &alice, "John Doe").await;
    let patient_id = created["patient"]["id"].as_i64().unwrap();

    let search = "/doctors/search?search_term=john&search_type=patient_name";
    let mine = send(&app, Method::GET, search, Some(&alice), None).await;
    assert_eq!(mine.body["total"], 1);

    let theirs = send(&app, Method::GET, search, Some(&bob), None).await;
    assert_eq!(theirs.status, StatusCode::OK);
    assert_eq!(theirs.body["total"], 0);

    let listing = send(&app, Method::GET, "/patients", Some(&bob), None).await;
    assert_eq!(listing.body["total"], 0);

    let forbidden = send(&app, Method::GET, &format!("/patients/{}", patient_id), Some(&bob), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let unauthenticated = send(&app, Method::GET, "/doctors/profile", None, None).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
}

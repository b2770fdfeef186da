use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde_json::json;

use medical_record_cell::router::medical_record_routes;
use medical_record_cell::services::fingerprint::digest_image;
use medical_record_cell::{
    AccessResolver, CodeKind, FingerprintRequest, RecordAttributes, RecordSearchQuery, RecordService,
};
use shared_database::{AppState, DbPool};
use shared_models::error::AppError;
use shared_utils::test_utils::{seed_doctor, send, test_state, JwtTestUtils};

const FINGERPRINT: &[u8] = b"left-index-ridges";

struct Seeded {
    patient_id: i64,
    record_id: i64,
}

async fn seed_patient(
    pool: &DbPool,
    doctor_id: i64,
    name: &str,
    patient_code: &str,
    record_code: &str,
    fingerprint_hash: Option<String>,
) -> Seeded {
    let now = Utc::now();
    let patient_id = sqlx::query(
        "INSERT INTO patients (unique_code, full_name, date_of_birth, gender, created_by, fingerprint_hash,
                               created_at, updated_at)
         VALUES (?, ?, '1990-01-01', 'female', ?, ?, ?, ?)",
    )
    .bind(patient_code)
    .bind(name)
    .bind(doctor_id)
    .bind(fingerprint_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    let record_id = sqlx::query(
        "INSERT INTO medical_records (record_code, patient_id, doctor_id, blood_type, created_at, updated_at)
         VALUES (?, ?, ?, 'O+', ?, ?)",
    )
    .bind(record_code)
    .bind(patient_id)
    .bind(doctor_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    Seeded { patient_id, record_id }
}

struct Fixture {
    state: Arc<AppState>,
    owner_id: i64,
    other_id: i64,
    jane: Seeded,
}

async fn fixture() -> Fixture {
    let state = test_state().await;
    let owner_id = seed_doctor(&state.db, "owner@x.com", "LIC-1").await;
    let other_id = seed_doctor(&state.db, "other@x.com", "LIC-2").await;
    let jane = seed_patient(
        &state.db,
        owner_id,
        "Jane Roe",
        "PAT-JANE0001",
        "MR-JANE0001",
        Some(digest_image(FINGERPRINT)),
    )
    .await;
    seed_patient(&state.db, other_id, "Janet Smith", "PAT-JANE0002", "MR-JANE0002", None).await;
    Fixture { state, owner_id, other_id, jane }
}

fn search(term: &str, search_type: &str) -> RecordSearchQuery {
    RecordSearchQuery {
        search_term: Some(term.to_string()),
        search_type: Some(search_type.to_string()),
    }
}

#[tokio::test]
async fn test_access_by_record_code_is_idempotent() {
    let f = fixture().await;
    let resolver = AccessResolver::new(&f.state.db);

    let first = resolver.by_record_code("MR-JANE0001").await.unwrap();
    let second = resolver.by_record_code("MR-JANE0001").await.unwrap();

    assert_eq!(first.medical_record.record.id, f.jane.record_id);
    assert_eq!(first.medical_record.patient_name, "Jane Roe");
    assert_eq!(first.medical_record.patient_code, "PAT-JANE0001");
    assert_eq!(first.medical_record.doctor_name, "Dr owner@x.com");
    assert!(first.consultations.is_empty());
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[tokio::test]
async fn test_access_by_record_code_rejections() {
    let f = fixture().await;
    let resolver = AccessResolver::new(&f.state.db);

    assert_matches!(resolver.by_record_code("MR-jane0001").await, Err(AppError::ValidationError(_)));
    assert_matches!(resolver.by_record_code("PAT-JANE0001").await, Err(AppError::ValidationError(_)));
    assert_matches!(resolver.by_record_code("MR-NONE0000").await, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_search_is_scoped_to_creator() {
    let f = fixture().await;
    let resolver = AccessResolver::new(&f.state.db);

    let owner_hits = resolver.search_for_doctor(f.owner_id, &search("jan", "patient_name")).await.unwrap();
    assert_eq!(owner_hits.len(), 1);
    assert_eq!(owner_hits[0].full_name, "Jane Roe");
    assert_eq!(owner_hits[0].record_code.as_deref(), Some("MR-JANE0001"));

    let by_foreign_code = resolver
        .search_for_doctor(f.owner_id, &search("MR-JANE0002", "record_code"))
        .await
        .unwrap();
    assert!(by_foreign_code.is_empty());

    let by_patient_code = resolver
        .search_for_doctor(f.other_id, &search("pat-jane0002", "patient_code"))
        .await
        .unwrap();
    assert_eq!(by_patient_code.len(), 1);
}

#[tokio::test]
async fn test_search_escapes_wildcards_and_validates_input() {
    let f = fixture().await;
    let resolver = AccessResolver::new(&f.state.db);

    let wildcard = resolver.search_for_doctor(f.owner_id, &search("%%", "patient_name")).await.unwrap();
    assert!(wildcard.is_empty());

    assert_matches!(
        resolver.search_for_doctor(f.owner_id, &search("j", "patient_name")).await,
        Err(AppError::ValidationError(_))
    );
    assert_matches!(
        resolver.search_for_doctor(f.owner_id, &search("jane", "email")).await,
        Err(AppError::ValidationError(_))
    );
}

#[tokio::test]
async fn test_access_by_fingerprint() {
    let f = fixture().await;
    let resolver = AccessResolver::new(&f.state.db);

    let by_image = resolver
        .by_fingerprint(&FingerprintRequest {
            fingerprint_image: Some(STANDARD.encode(FINGERPRINT)),
            fingerprint_hash: None,
        })
        .await
        .unwrap();
    assert_eq!(by_image.patient.id, f.jane.patient_id);
    assert_eq!(by_image.access.medical_record.record.record_code, "MR-JANE0001");

    let unknown = resolver
        .by_fingerprint(&FingerprintRequest {
            fingerprint_image: None,
            fingerprint_hash: Some(digest_image(b"someone else")),
        })
        .await;
    assert_matches!(unknown, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_record_fields() {
    let f = fixture().await;
    let service = RecordService::new(&f.state.db);

    let updated = service
        .update_record(
            f.jane.record_id,
            f.owner_id,
            RecordAttributes {
                allergies: Some("penicillin".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.allergies.as_deref(), Some("penicillin"));
    assert_eq!(updated.blood_type.as_deref(), Some("O+"));

    assert_matches!(
        service.update_record(f.jane.record_id, f.owner_id, RecordAttributes::default()).await,
        Err(AppError::ValidationError(_))
    );
    assert_matches!(
        service
            .update_record(
                f.jane.record_id,
                f.other_id,
                RecordAttributes { weight: Some(60.0), ..Default::default() }
            )
            .await,
        Err(AppError::Forbidden(_))
    );
    assert_matches!(
        service
            .update_record(9999, f.owner_id, RecordAttributes { weight: Some(60.0), ..Default::default() })
            .await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_unused_code_returns_free_code() {
    let f = fixture().await;
    let mut conn = f.state.db.acquire().await.unwrap();

    let code = CodeKind::Record.unused_code(&mut conn).await.unwrap();

    assert!(CodeKind::Record.is_valid(&code));
    assert_ne!(code, "MR-JANE0001");
}

#[tokio::test]
async fn test_unused_code_skips_taken_candidates() {
    let f = fixture().await;
    let mut conn = f.state.db.acquire().await.unwrap();
    let mut candidates = vec!["MR-FREE0001", "MR-JANE0002", "MR-JANE0001"];

    let code = CodeKind::Record
        .unused_code_from(&mut conn, || candidates.pop().unwrap().to_string())
        .await
        .unwrap();

    assert_eq!(code, "MR-FREE0001");
}

#[tokio::test]
async fn test_unused_code_gives_up_after_repeated_collisions() {
    let f = fixture().await;
    let mut conn = f.state.db.acquire().await.unwrap();
    let mut draws = 0;

    let result = CodeKind::Record
        .unused_code_from(&mut conn, || {
            draws += 1;
            "MR-JANE0001".to_string()
        })
        .await;

    assert_matches!(result, Err(AppError::Database(_)));
    assert_eq!(draws, 5);
}

#[tokio::test]
async fn test_public_access_route_needs_no_token() {
    let f = fixture().await;
    let app = medical_record_routes(f.state.clone());

    let found = send(&app, Method::POST, "/access", None, Some(json!({ "record_code": "MR-JANE0001" }))).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["medical_record"]["record_code"], "MR-JANE0001");
    assert_eq!(found.body["medical_record"]["patient_name"], "Jane Roe");
    assert_eq!(found.body["consultations"], json!([]));

    let malformed = send(&app, Method::POST, "/access", None, Some(json!({ "record_code": "bogus" }))).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["kind"], "validation_error");

    let missing = send(&app, Method::POST, "/access", None, Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_consultation_routes_on_record() {
    let f = fixture().await;
    let app = medical_record_routes(f.state.clone());
    let token = JwtTestUtils::create_test_token(f.other_id, "other@x.com", &f.state.config.jwt_secret);
    let uri = format!("/{}/consultations", f.jane.record_id);

    let unauthenticated = send(&app, Method::POST, &uri, None, Some(json!({ "diagnosis": "flu" }))).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let created = send(&app, Method::POST, &uri, Some(&token), Some(json!({ "examen": "flu" }))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["consultation"]["diagnosis"], "flu");

    let empty = send(&app, Method::POST, &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["kind"], "validation_error");

    let owner = JwtTestUtils::create_test_token(f.owner_id, "owner@x.com", &f.state.config.jwt_secret);
    let history = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["consultations"].as_array().unwrap().len(), 1);

    let foreign = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    assert!(foreign.body.get("consultations").is_none());

    let missing = send(&app, Method::GET, "/9999/consultations", Some(&owner), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let public = send(&app, Method::POST, "/access", None, Some(json!({ "record_code": "MR-JANE0001" }))).await;
    assert_eq!(public.body["consultations"][0]["diagnosis"], "flu");
    assert_eq!(public.body["consultations"][0]["doctor_name"], "Dr other@x.com");
}

#[tokio::test]
async fn test_update_route_rejects_unknown_keys_and_foreign_doctor() {
    let f = fixture().await;
    let app = medical_record_routes(f.state.clone());
    let secret = &f.state.config.jwt_secret;
    let owner = JwtTestUtils::create_test_token(f.owner_id, "owner@x.com", secret);
    let other = JwtTestUtils::create_test_token(f.other_id, "other@x.com", secret);
    let uri = format!("/{}", f.jane.record_id);

    let unknown = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "record_code": "MR-AAAAAAAA" }))).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let forbidden = send(&app, Method::PUT, &uri, Some(&other), Some(json!({ "height": 170.0 }))).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let updated = send(&app, Method::PUT, &uri, Some(&owner), Some(json!({ "height": 170.0 }))).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["medical_record"]["height"], 170.0);

    let fingerprint = send(
        &app,
        Method::POST,
        "/fingerprint/search",
        Some(&other),
        Some(json!({ "fingerprint_hash": digest_image(FINGERPRINT) })),
    )
    .await;
    assert_eq!(fingerprint.status, StatusCode::OK);
    assert_eq!(fingerprint.body["patient"]["unique_code"], "PAT-JANE0001");
    assert_eq!(fingerprint.body["medical_record"]["height"], 170.0);
}

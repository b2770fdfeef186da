use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use shared_config::AppConfig;
use shared_database::{connect_in_memory, init_schema, AppState, DbPool};
use shared_models::auth::{JwtClaims, DOCTOR_ROLE};

use crate::password::PasswordService;

pub const TEST_PASSWORD: &str = "Aa12345678";

pub struct TestConfig {
    pub jwt_secret: String,
    pub db_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            db_url: "sqlite::memory:".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            db_url: self.db_url.clone(),
            db_max_connections: 1,
            jwt_secret: self.jwt_secret.clone(),
            jwt_expiry_hours: 24,
            port: 0,
            cors_origin: None,
        }
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn test_pool() -> DbPool {
    let pool = connect_in_memory().await.expect("in-memory pool");
    init_schema(&pool).await.expect("schema");
    pool
}

pub async fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(TestConfig::default().to_app_config(), test_pool().await))
}

/// Inserts a doctor whose password is [`TEST_PASSWORD`] and returns its id.
pub async fn seed_doctor(pool: &DbPool, email: &str, license_number: &str) -> i64 {
    // Hashing is slow in debug builds; every seeded doctor shares one hash.
    static HASH: OnceLock<String> = OnceLock::new();
    let hash = HASH.get_or_init(|| PasswordService::hash_password(TEST_PASSWORD).expect("hash"));
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO doctors (email, password_hash, full_name, license_number, specialization, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(email)
    .bind(hash.as_str())
    .bind(format!("Dr {}", email))
    .bind(license_number)
    .bind("General Practice")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("seed doctor")
    .last_insert_rowid()
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_token_with_role(doctor_id: i64, email: &str, role: &str, secret: &str, exp_hours: i64) -> String {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: doctor_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp() as u64,
            exp: (now + Duration::hours(exp_hours)).timestamp() as u64,
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .expect("HMAC can take key of any size")
    }

    pub fn create_test_token(doctor_id: i64, email: &str, secret: &str) -> String {
        Self::create_token_with_role(doctor_id, email, DOCTOR_ROLE, secret, 24)
    }

    pub fn create_expired_token(doctor_id: i64, email: &str, secret: &str) -> String {
        Self::create_token_with_role(doctor_id, email, DOCTOR_ROLE, secret, -2)
    }

    pub fn create_invalid_signature_token(doctor_id: i64, email: &str) -> String {
        Self::create_token_with_role(doctor_id, email, DOCTOR_ROLE, "wrong-secret", 24)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub body: Value,
}

/// Drives one request through `app` and collects the response.
pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse { status, content_type, text, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::default().to_app_config();

        assert_eq!(app_config.db_url, "sqlite::memory:");
        assert!(!app_config.jwt_secret.is_empty());
        assert!(app_config.is_configured());
    }

    #[test]
    fn test_jwt_token_creation() {
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(3, "doc@example.com", secret);

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(validate_token(&token, secret).unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_seed_doctor_returns_id() {
        let pool = test_pool().await;
        let first = seed_doctor(&pool, "a@x.com", "LIC1").await;
        let second = seed_doctor(&pool, "b@x.com", "LIC2").await;
        assert_ne!(first, second);
    }
}

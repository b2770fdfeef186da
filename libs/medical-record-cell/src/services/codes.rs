use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use sqlx::SqliteConnection;
use tracing::warn;

use shared_models::error::AppError;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_SUFFIX_LEN: usize = 8;
const MAX_CODE_ATTEMPTS: usize = 5;

/// Human-facing identifiers: `PAT-XXXXXXXX` for patients, `MR-XXXXXXXX` for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Patient,
    Record,
}

fn patient_code_regex() -> &'static Regex {
    static PATIENT: OnceLock<Regex> = OnceLock::new();
    PATIENT.get_or_init(|| Regex::new(r"^PAT-[A-Z0-9]{8}$").expect("patient code pattern compiles"))
}

fn record_code_regex() -> &'static Regex {
    static RECORD: OnceLock<Regex> = OnceLock::new();
    RECORD.get_or_init(|| Regex::new(r"^MR-[A-Z0-9]{8}$").expect("record code pattern compiles"))
}

impl CodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            CodeKind::Patient => "PAT-",
            CodeKind::Record => "MR-",
        }
    }

    fn lookup_sql(self) -> &'static str {
        match self {
            CodeKind::Patient => "SELECT COUNT(*) FROM patients WHERE unique_code = ?",
            CodeKind::Record => "SELECT COUNT(*) FROM medical_records WHERE record_code = ?",
        }
    }

    pub fn generate(self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..CODE_SUFFIX_LEN)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect();
        format!("{}{}", self.prefix(), suffix)
    }

    pub fn is_valid(self, code: &str) -> bool {
        match self {
            CodeKind::Patient => patient_code_regex().is_match(code),
            CodeKind::Record => record_code_regex().is_match(code),
        }
    }

    /// Draws codes until one is not taken. Runs on the caller's connection so
    /// it can take part in an open transaction. The unique index still guards
    /// the insert itself.
    pub async fn unused_code(self, conn: &mut SqliteConnection) -> Result<String, AppError> {
        self.unused_code_from(conn, || self.generate()).await
    }

    /// Same as [`CodeKind::unused_code`] with the candidate source supplied by the caller.
    pub async fn unused_code_from<F>(self, conn: &mut SqliteConnection, mut draw: F) -> Result<String, AppError>
    where
        F: FnMut() -> String,
    {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = draw();
            let taken: i64 = sqlx::query_scalar(self.lookup_sql())
                .bind(&code)
                .fetch_one(&mut *conn)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
            warn!("{} code collision on attempt {}", self.prefix(), attempt);
        }

        Err(AppError::Database(format!(
            "Could not generate an unused {} code after {} attempts",
            self.prefix(),
            MAX_CODE_ATTEMPTS
        )))
    }
}

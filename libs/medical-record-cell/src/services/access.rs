use tracing::{debug, info};

use consultation_cell::ConsultationService;
use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::{
    FingerprintAccess, FingerprintRequest, MedicalRecordDetails, PatientSummary, RecordAccess, RecordSearchHit,
    RecordSearchQuery, SearchType,
};
use crate::services::codes::CodeKind;
use crate::services::fingerprint;
use crate::services::record::RecordService;

const MIN_SEARCH_TERM_LEN: usize = 2;

const SEARCH_SELECT: &str = "SELECT p.id AS patient_id, p.unique_code, p.full_name, p.date_of_birth, p.gender,
        p.created_by, mr.id AS record_id, mr.record_code
     FROM patients p
     LEFT JOIN medical_records mr ON mr.patient_id = p.id
     WHERE p.created_by = ?";

/// Escapes LIKE wildcards so a term only ever matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The three ways a caller can reach a medical record: a shared record
/// code, a doctor's own patients, or an exact fingerprint digest.
pub struct AccessResolver {
    db: DbPool,
}

impl AccessResolver {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    /// Public channel. Holding the code is the authorization.
    pub async fn by_record_code(&self, record_code: &str) -> Result<RecordAccess, AppError> {
        if !CodeKind::Record.is_valid(record_code) {
            return Err(AppError::ValidationError(
                "Record code must match MR- followed by 8 uppercase letters or digits".to_string(),
            ));
        }

        let details = RecordService::new(&self.db)
            .find_details_by_code(record_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Medical record not found".to_string()))?;

        info!("Medical record {} accessed by record code", details.record.id);
        self.with_history(details).await
    }

    pub async fn by_fingerprint(&self, request: &FingerprintRequest) -> Result<FingerprintAccess, AppError> {
        let digest = fingerprint::resolve_digest(request)?;

        let patient = self
            .patient_by_fingerprint(&digest)
            .await?
            .ok_or_else(|| AppError::NotFound("No patient matches this fingerprint".to_string()))?;

        let details = RecordService::new(&self.db)
            .find_details_by_patient(patient.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medical record not found".to_string()))?;

        info!("Medical record {} accessed by fingerprint", details.record.id);
        let access = self.with_history(details).await?;
        Ok(FingerprintAccess { patient, access })
    }

    pub async fn patient_by_fingerprint(&self, digest: &str) -> Result<Option<PatientSummary>, AppError> {
        let patient = sqlx::query_as::<_, PatientSummary>(
            "SELECT id, unique_code, full_name, date_of_birth, gender FROM patients WHERE fingerprint_hash = ?",
        )
        .bind(digest)
        .fetch_optional(&self.db)
        .await?;

        Ok(patient)
    }

    /// Searches only among the patients the doctor created.
    pub async fn search_for_doctor(
        &self,
        doctor_id: i64,
        query: &RecordSearchQuery,
    ) -> Result<Vec<RecordSearchHit>, AppError> {
        let term = query.search_term.as_deref().map(str::trim).unwrap_or_default();
        if term.chars().count() < MIN_SEARCH_TERM_LEN {
            return Err(AppError::ValidationError(format!(
                "Search term must be at least {} characters",
                MIN_SEARCH_TERM_LEN
            )));
        }
        let search_type = SearchType::parse(query.search_type.as_deref().unwrap_or("patient_name"))?;
        debug!("Doctor {} searching records by {:?}", doctor_id, search_type);

        let sql = match search_type {
            SearchType::PatientName => {
                format!("{} AND LOWER(p.full_name) LIKE ? ESCAPE '\\' ORDER BY p.full_name", SEARCH_SELECT)
            }
            SearchType::RecordCode => format!("{} AND mr.record_code = ?", SEARCH_SELECT),
            SearchType::PatientCode => format!("{} AND p.unique_code = ?", SEARCH_SELECT),
        };
        let value = match search_type {
            SearchType::PatientName => format!("%{}%", escape_like(&term.to_lowercase())),
            SearchType::RecordCode | SearchType::PatientCode => term.to_uppercase(),
        };

        let hits = sqlx::query_as::<_, RecordSearchHit>(&sql)
            .bind(doctor_id)
            .bind(value)
            .fetch_all(&self.db)
            .await?;

        Ok(hits)
    }

    async fn with_history(&self, details: MedicalRecordDetails) -> Result<RecordAccess, AppError> {
        let consultations = ConsultationService::new(&self.db)
            .list_for_record(details.record.id)
            .await?;

        Ok(RecordAccess {
            medical_record: details,
            consultations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}

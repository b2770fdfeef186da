use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};

use medical_record_cell::services::access::escape_like;
use medical_record_cell::services::fingerprint;
use medical_record_cell::{CodeKind, FingerprintRequest, RecordService};
use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::{
    CreatePatientRequest, CreatedPatient, EnrollFingerprintRequest, Patient, PatientListItem, PatientWithRecord,
};

const PATIENT_COLUMNS: &str = "p.id, p.unique_code, p.full_name, p.date_of_birth, p.gender, p.phone_number,
        p.email, p.emergency_contact, p.address, p.created_by, p.fingerprint_hash, p.fingerprint_image_ref,
        p.created_at, p.updated_at";

pub struct PatientService {
    db: DbPool,
}

impl PatientService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    /// Creates the patient and its medical record in one transaction. Either
    /// both rows exist afterwards or neither does.
    pub async fn create_patient_with_record(
        &self,
        doctor_id: i64,
        request: CreatePatientRequest,
    ) -> Result<CreatedPatient, AppError> {
        debug!("Creating patient for doctor {}", doctor_id);
        request.validate(Utc::now().date_naive())?;

        let mut tx = self.db.begin().await?;

        match Self::insert_with_record(&mut *tx, doctor_id, &request).await {
            Ok(created) => {
                tx.commit().await?;
                info!(
                    "Patient {} created with medical record {} by doctor {}",
                    created.patient.id, created.medical_record.id, doctor_id
                );
                Ok(created)
            }
            Err(e) => {
                warn!("Rolling back patient creation for doctor {}: {}", doctor_id, e);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed for doctor {}: {}", doctor_id, rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn insert_with_record(
        conn: &mut SqliteConnection,
        doctor_id: i64,
        request: &CreatePatientRequest,
    ) -> Result<CreatedPatient, AppError> {
        let unique_code = CodeKind::Patient.unused_code(conn).await?;
        let now = Utc::now();

        let patient_id = sqlx::query(
            "INSERT INTO patients
                (unique_code, full_name, date_of_birth, gender, phone_number, email, emergency_contact,
                 address, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&unique_code)
        .bind(request.full_name.trim())
        .bind(request.date_of_birth)
        .bind(request.gender.as_str())
        .bind(&request.phone_number)
        .bind(&request.email)
        .bind(&request.emergency_contact)
        .bind(&request.address)
        .bind(doctor_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let patient = sqlx::query_as::<_, Patient>(&format!("SELECT {} FROM patients p WHERE p.id = ?", PATIENT_COLUMNS))
            .bind(patient_id)
            .fetch_one(&mut *conn)
            .await?;

        let attributes = request.medical_info.clone().unwrap_or_default();
        let medical_record = RecordService::insert_record(conn, patient_id, doctor_id, &attributes).await?;

        Ok(CreatedPatient { patient, medical_record })
    }

    async fn find_patient(&self, patient_id: i64) -> Result<Patient, AppError> {
        sqlx::query_as::<_, Patient>(&format!("SELECT {} FROM patients p WHERE p.id = ?", PATIENT_COLUMNS))
            .bind(patient_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))
    }

    /// Only the creating doctor may read a patient by id.
    pub async fn get_patient(&self, patient_id: i64, doctor_id: i64) -> Result<Patient, AppError> {
        let patient = self.find_patient(patient_id).await?;
        if patient.created_by != doctor_id {
            return Err(AppError::Forbidden("Access denied to this patient".to_string()));
        }
        Ok(patient)
    }

    pub async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<PatientListItem>, AppError> {
        let patients = sqlx::query_as::<_, PatientListItem>(&format!(
            "SELECT {}, mr.id AS record_id, mr.record_code
             FROM patients p
             LEFT JOIN medical_records mr ON mr.patient_id = p.id
             WHERE p.created_by = ?
             ORDER BY p.created_at DESC, p.id DESC",
            PATIENT_COLUMNS
        ))
        .bind(doctor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(patients)
    }

    pub async fn search_by_name(&self, doctor_id: i64, full_name: &str) -> Result<Vec<PatientListItem>, AppError> {
        let term = full_name.trim();
        if term.is_empty() {
            return Err(AppError::ValidationError("full_name query parameter is required".to_string()));
        }

        let patients = sqlx::query_as::<_, PatientListItem>(&format!(
            "SELECT {}, mr.id AS record_id, mr.record_code
             FROM patients p
             LEFT JOIN medical_records mr ON mr.patient_id = p.id
             WHERE p.created_by = ? AND LOWER(p.full_name) LIKE ? ESCAPE '\\'
             ORDER BY p.full_name",
            PATIENT_COLUMNS
        ))
        .bind(doctor_id)
        .bind(format!("%{}%", escape_like(&term.to_lowercase())))
        .fetch_all(&self.db)
        .await?;

        Ok(patients)
    }

    /// Stores the SHA-256 of the image. A digest already held by another
    /// patient is a conflict.
    pub async fn enroll_fingerprint(
        &self,
        patient_id: i64,
        doctor_id: i64,
        request: EnrollFingerprintRequest,
    ) -> Result<Patient, AppError> {
        let patient = self.get_patient(patient_id, doctor_id).await?;
        let digest = fingerprint::digest_image(&fingerprint::decode_image(&request.fingerprint_image)?);

        let holder: Option<i64> = sqlx::query_scalar("SELECT id FROM patients WHERE fingerprint_hash = ?")
            .bind(&digest)
            .fetch_optional(&self.db)
            .await?;
        if holder.is_some_and(|id| id != patient.id) {
            return Err(AppError::Conflict(
                "This fingerprint is already registered to another patient".to_string(),
            ));
        }

        sqlx::query("UPDATE patients SET fingerprint_hash = ?, fingerprint_image_ref = ?, updated_at = ? WHERE id = ?")
            .bind(&digest)
            .bind(&request.fingerprint_image_ref)
            .bind(Utc::now())
            .bind(patient.id)
            .execute(&self.db)
            .await?;

        info!("Fingerprint enrolled for patient {} by doctor {}", patient.id, doctor_id);
        self.find_patient(patient.id).await
    }

    pub async fn find_by_fingerprint(&self, request: &FingerprintRequest) -> Result<PatientWithRecord, AppError> {
        let digest = fingerprint::resolve_digest(request)?;

        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients p WHERE p.fingerprint_hash = ?",
            PATIENT_COLUMNS
        ))
        .bind(&digest)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No patient matches this fingerprint".to_string()))?;

        let medical_record = RecordService::new(&self.db).find_details_by_patient(patient.id).await?;

        Ok(PatientWithRecord { patient, medical_record })
    }
}

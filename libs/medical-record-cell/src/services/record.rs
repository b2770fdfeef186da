use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::{MedicalRecord, MedicalRecordDetails, RecordAttributes, RecordOverview};
use crate::services::codes::CodeKind;

const RECORD_COLUMNS: &str = "mr.id, mr.record_code, mr.patient_id, mr.doctor_id, mr.blood_type, mr.height,
        mr.weight, mr.allergies, mr.chronic_diseases, mr.current_medications, mr.created_at, mr.updated_at";

pub(crate) fn details_select() -> String {
    format!(
        "SELECT {}, p.full_name AS patient_name, p.unique_code AS patient_code, p.date_of_birth, p.gender,
                d.full_name AS doctor_name
         FROM medical_records mr
         JOIN patients p ON p.id = mr.patient_id
         JOIN doctors d ON d.id = mr.doctor_id",
        RECORD_COLUMNS
    )
}

pub struct RecordService {
    db: DbPool,
}

impl RecordService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    /// Inserts the record for a freshly created patient. Takes a connection so
    /// the caller can run it inside the patient's transaction.
    pub async fn insert_record(
        conn: &mut SqliteConnection,
        patient_id: i64,
        doctor_id: i64,
        attributes: &RecordAttributes,
    ) -> Result<MedicalRecord, AppError> {
        attributes.validate()?;

        let record_code = CodeKind::Record.unused_code(conn).await?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO medical_records
                (record_code, patient_id, doctor_id, blood_type, height, weight, allergies,
                 chronic_diseases, current_medications, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record_code)
        .bind(patient_id)
        .bind(doctor_id)
        .bind(&attributes.blood_type)
        .bind(attributes.height)
        .bind(attributes.weight)
        .bind(&attributes.allergies)
        .bind(&attributes.chronic_diseases)
        .bind(&attributes.current_medications)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        debug!("Medical record {} ({}) created for patient {}", id, record_code, patient_id);

        let record = sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {} FROM medical_records mr WHERE mr.id = ?",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    pub async fn get_record(&self, record_id: i64) -> Result<MedicalRecord, AppError> {
        sqlx::query_as::<_, MedicalRecord>(&format!(
            "SELECT {} FROM medical_records mr WHERE mr.id = ?",
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medical record not found".to_string()))
    }

    pub async fn find_details_by_code(&self, record_code: &str) -> Result<Option<MedicalRecordDetails>, AppError> {
        let details = sqlx::query_as::<_, MedicalRecordDetails>(&format!(
            "{} WHERE mr.record_code = ?",
            details_select()
        ))
        .bind(record_code)
        .fetch_optional(&self.db)
        .await?;

        Ok(details)
    }

    pub async fn find_details_by_patient(&self, patient_id: i64) -> Result<Option<MedicalRecordDetails>, AppError> {
        let details = sqlx::query_as::<_, MedicalRecordDetails>(&format!(
            "{} WHERE mr.patient_id = ?",
            details_select()
        ))
        .bind(patient_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(details)
    }

    /// Records owned by a doctor, by patient name, with their consultation counts.
    pub async fn list_for_doctor(&self, doctor_id: i64) -> Result<Vec<RecordOverview>, AppError> {
        let records = sqlx::query_as::<_, RecordOverview>(&format!(
            "SELECT {}, p.full_name AS patient_name, p.date_of_birth, p.gender,
                    (SELECT COUNT(*) FROM consultations c WHERE c.medical_record_id = mr.id) AS consultation_count
             FROM medical_records mr
             JOIN patients p ON p.id = mr.patient_id
             WHERE mr.doctor_id = ?
             ORDER BY p.full_name ASC, mr.id ASC",
            RECORD_COLUMNS
        ))
        .bind(doctor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Writes only the supplied attributes. Only the owning doctor may edit.
    pub async fn update_record(
        &self,
        record_id: i64,
        doctor_id: i64,
        attributes: RecordAttributes,
    ) -> Result<MedicalRecord, AppError> {
        if attributes.is_empty() {
            return Err(AppError::no_fields());
        }
        attributes.validate()?;

        let existing = self.get_record(record_id).await?;
        if existing.doctor_id != doctor_id {
            return Err(AppError::Forbidden(
                "Only the owning doctor can modify this medical record".to_string(),
            ));
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE medical_records SET ");
        let mut fields = builder.separated(", ");
        if let Some(blood_type) = attributes.blood_type {
            fields.push("blood_type = ").push_bind_unseparated(blood_type);
        }
        if let Some(height) = attributes.height {
            fields.push("height = ").push_bind_unseparated(height);
        }
        if let Some(weight) = attributes.weight {
            fields.push("weight = ").push_bind_unseparated(weight);
        }
        if let Some(allergies) = attributes.allergies {
            fields.push("allergies = ").push_bind_unseparated(allergies);
        }
        if let Some(chronic_diseases) = attributes.chronic_diseases {
            fields.push("chronic_diseases = ").push_bind_unseparated(chronic_diseases);
        }
        if let Some(current_medications) = attributes.current_medications {
            fields.push("current_medications = ").push_bind_unseparated(current_medications);
        }
        fields.push("updated_at = ").push_bind_unseparated(Utc::now());
        builder.push(" WHERE id = ").push_bind(record_id);

        builder.build().execute(&self.db).await?;
        info!("Medical record {} updated by doctor {}", record_id, doctor_id);

        self.get_record(record_id).await
    }
}

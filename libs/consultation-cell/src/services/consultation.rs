use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, warn};

use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::{Consultation, ConsultationPayload};

const CONSULTATION_SELECT: &str = "SELECT c.id, c.medical_record_id, c.doctor_id, d.full_name AS doctor_name,
        c.consultation_date, c.symptoms, c.diagnosis, c.prescription, c.notes,
        c.next_appointment, c.created_at, c.updated_at
     FROM consultations c
     JOIN doctors d ON d.id = c.doctor_id";

const NEWEST_FIRST: &str = "ORDER BY c.consultation_date DESC, c.id DESC";

pub struct ConsultationService {
    db: DbPool,
}

impl ConsultationService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    /// Appends a consultation to a record; the date defaults to now.
    pub async fn add_consultation(
        &self,
        medical_record_id: i64,
        doctor_id: i64,
        payload: ConsultationPayload,
    ) -> Result<Consultation, AppError> {
        debug!("Adding consultation to medical record {}", medical_record_id);
        payload.validate_new()?;

        let record: Option<i64> = sqlx::query_scalar("SELECT id FROM medical_records WHERE id = ?")
            .bind(medical_record_id)
            .fetch_optional(&self.db)
            .await?;
        if record.is_none() {
            return Err(AppError::NotFound("Medical record not found".to_string()));
        }

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO consultations
                (medical_record_id, doctor_id, consultation_date, symptoms, diagnosis, prescription, notes,
                 next_appointment, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(medical_record_id)
        .bind(doctor_id)
        .bind(payload.consultation_date.unwrap_or(now))
        .bind(payload.symptoms)
        .bind(payload.diagnosis)
        .bind(payload.prescription)
        .bind(payload.notes)
        .bind(payload.next_appointment)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        info!("Consultation {} added to medical record {} by doctor {}", id, medical_record_id, doctor_id);
        self.get_consultation(id).await
    }

    pub async fn get_consultation(&self, consultation_id: i64) -> Result<Consultation, AppError> {
        sqlx::query_as::<_, Consultation>(&format!("{} WHERE c.id = ?", CONSULTATION_SELECT))
            .bind(consultation_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Consultation not found".to_string()))
    }

    /// Full history is readable by the record's owner and by the doctor who
    /// created the patient. Everyone else goes through the record code or
    /// fingerprint channels.
    pub async fn ensure_history_reader(&self, medical_record_id: i64, doctor_id: i64) -> Result<(), AppError> {
        let holders: Option<(i64, i64)> = sqlx::query_as(
            "SELECT mr.doctor_id, p.created_by
             FROM medical_records mr
             JOIN patients p ON p.id = mr.patient_id
             WHERE mr.id = ?",
        )
        .bind(medical_record_id)
        .fetch_optional(&self.db)
        .await?;

        match holders {
            None => Err(AppError::NotFound("Medical record not found".to_string())),
            Some((owner_id, creator_id)) if owner_id == doctor_id || creator_id == doctor_id => Ok(()),
            Some(_) => {
                warn!(
                    "Doctor {} denied consultation history of medical record {}",
                    doctor_id, medical_record_id
                );
                Err(AppError::Forbidden(
                    "Access denied to this medical record's consultations".to_string(),
                ))
            }
        }
    }

    pub async fn history_for_doctor(
        &self,
        medical_record_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<Consultation>, AppError> {
        self.ensure_history_reader(medical_record_id, doctor_id).await?;
        self.list_for_record(medical_record_id).await
    }

    /// A single consultation, visible to its author and to whoever may read
    /// the parent record's history.
    pub async fn get_consultation_for(&self, consultation_id: i64, doctor_id: i64) -> Result<Consultation, AppError> {
        let consultation = self.get_consultation(consultation_id).await?;
        if consultation.doctor_id != doctor_id {
            self.ensure_history_reader(consultation.medical_record_id, doctor_id).await?;
        }
        Ok(consultation)
    }

    /// Consultation history of one record, newest first.
    pub async fn list_for_record(&self, medical_record_id: i64) -> Result<Vec<Consultation>, AppError> {
        let consultations = sqlx::query_as::<_, Consultation>(&format!(
            "{} WHERE c.medical_record_id = ? {}",
            CONSULTATION_SELECT, NEWEST_FIRST
        ))
        .bind(medical_record_id)
        .fetch_all(&self.db)
        .await?;

        Ok(consultations)
    }

    pub async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Consultation>, AppError> {
        let consultations = sqlx::query_as::<_, Consultation>(&format!(
            "{} JOIN medical_records mr ON mr.id = c.medical_record_id WHERE mr.patient_id = ? {}",
            CONSULTATION_SELECT, NEWEST_FIRST
        ))
        .bind(patient_id)
        .fetch_all(&self.db)
        .await?;

        Ok(consultations)
    }

    /// Writes only the supplied fields. Only the authoring doctor may edit.
    pub async fn update_consultation(
        &self,
        consultation_id: i64,
        doctor_id: i64,
        payload: ConsultationPayload,
    ) -> Result<Consultation, AppError> {
        debug!("Updating consultation {}", consultation_id);

        if payload.is_empty() {
            return Err(AppError::no_fields());
        }
        payload.validate()?;

        let existing = self.get_consultation(consultation_id).await?;
        if existing.doctor_id != doctor_id {
            return Err(AppError::Forbidden(
                "Only the authoring doctor can modify this consultation".to_string(),
            ));
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE consultations SET ");
        let mut fields = builder.separated(", ");
        if let Some(date) = payload.consultation_date {
            fields.push("consultation_date = ").push_bind_unseparated(date);
        }
        if let Some(symptoms) = payload.symptoms {
            fields.push("symptoms = ").push_bind_unseparated(symptoms);
        }
        if let Some(diagnosis) = payload.diagnosis {
            fields.push("diagnosis = ").push_bind_unseparated(diagnosis);
        }
        if let Some(prescription) = payload.prescription {
            fields.push("prescription = ").push_bind_unseparated(prescription);
        }
        if let Some(notes) = payload.notes {
            fields.push("notes = ").push_bind_unseparated(notes);
        }
        if let Some(next_appointment) = payload.next_appointment {
            fields.push("next_appointment = ").push_bind_unseparated(next_appointment);
        }
        fields.push("updated_at = ").push_bind_unseparated(Utc::now());
        builder.push(" WHERE id = ").push_bind(consultation_id);

        builder.build().execute(&self.db).await?;

        self.get_consultation(consultation_id).await
    }

    pub async fn delete_consultation(&self, consultation_id: i64, doctor_id: i64) -> Result<(), AppError> {
        let existing = self.get_consultation(consultation_id).await?;
        if existing.doctor_id != doctor_id {
            return Err(AppError::Forbidden(
                "Only the authoring doctor can delete this consultation".to_string(),
            ));
        }

        sqlx::query("DELETE FROM consultations WHERE id = ?")
            .bind(consultation_id)
            .execute(&self.db)
            .await?;

        info!("Consultation {} deleted by doctor {}", consultation_id, doctor_id);
        Ok(())
    }
}

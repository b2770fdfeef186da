use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;
use shared_utils::validation::check_max_length;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Consultation {
    pub id: i64,
    pub medical_record_id: i64,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub consultation_date: DateTime<Utc>,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub next_appointment: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of consultation create and update requests.
///
/// The serde aliases are the single mapping between the legacy French
/// payload names and the stored columns:
///
/// | payload        | column             |
/// |----------------|--------------------|
/// | `plaintes`     | `symptoms`         |
/// | `examen`       | `diagnosis`        |
/// | `prochain_rdv` | `next_appointment` |
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsultationPayload {
    pub consultation_date: Option<DateTime<Utc>>,
    #[serde(alias = "plaintes")]
    pub symptoms: Option<String>,
    #[serde(alias = "examen")]
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "prochain_rdv")]
    pub next_appointment: Option<NaiveDate>,
}

impl ConsultationPayload {
    pub fn is_empty(&self) -> bool {
        self.consultation_date.is_none()
            && self.symptoms.is_none()
            && self.diagnosis.is_none()
            && self.prescription.is_none()
            && self.notes.is_none()
            && self.next_appointment.is_none()
    }

    /// True when at least one clinical text field carries something besides whitespace.
    pub fn has_clinical_content(&self) -> bool {
        [&self.symptoms, &self.diagnosis, &self.prescription, &self.notes]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|text| !text.trim().is_empty()))
    }

    /// Create requires clinical content on top of the length limits.
    pub fn validate_new(&self) -> Result<(), AppError> {
        if !self.has_clinical_content() {
            return Err(AppError::ValidationError(
                "A consultation needs symptoms, diagnosis, prescription or notes".to_string(),
            ));
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        check_max_length("symptoms", self.symptoms.as_deref(), 1000)?;
        check_max_length("diagnosis", self.diagnosis.as_deref(), 1000)?;
        check_max_length("prescription", self.prescription.as_deref(), 500)?;
        check_max_length("notes", self.notes.as_deref(), 2000)?;
        Ok(())
    }
}

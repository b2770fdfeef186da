use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use consultation_cell::Consultation;
use shared_models::error::AppError;
use shared_utils::validation::check_max_length;

pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MedicalRecord {
    pub id: i64,
    pub record_code: String,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub blood_type: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub current_medications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record joined with its patient and owning doctor, as shown to readers.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MedicalRecordDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub patient_name: String,
    pub patient_code: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub doctor_name: String,
}

/// A doctor's record listing entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecordOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub patient_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub consultation_count: i64,
}

/// Mutable clinical fields of a record. Used both at creation (`medical_info`)
/// and for partial updates, where only the present keys are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordAttributes {
    pub blood_type: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub allergies: Option<String>,
    pub chronic_diseases: Option<String>,
    pub current_medications: Option<String>,
}

impl RecordAttributes {
    pub fn is_empty(&self) -> bool {
        self.blood_type.is_none()
            && self.height.is_none()
            && self.weight.is_none()
            && self.allergies.is_none()
            && self.chronic_diseases.is_none()
            && self.current_medications.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(blood_type) = &self.blood_type {
            if !BLOOD_TYPES.contains(&blood_type.as_str()) {
                return Err(AppError::ValidationError(format!("Invalid blood type: {}", blood_type)));
            }
        }
        if let Some(height) = self.height {
            if !(30.0..=250.0).contains(&height) {
                return Err(AppError::ValidationError("Height must be between 30 and 250 cm".to_string()));
            }
        }
        if let Some(weight) = self.weight {
            if !(1.0..=300.0).contains(&weight) {
                return Err(AppError::ValidationError("Weight must be between 1 and 300 kg".to_string()));
            }
        }
        check_max_length("allergies", self.allergies.as_deref(), 2000)?;
        check_max_length("chronic_diseases", self.chronic_diseases.as_deref(), 2000)?;
        check_max_length("current_medications", self.current_medications.as_deref(), 2000)?;
        Ok(())
    }
}

/// What every access channel returns.
#[derive(Debug, Clone, Serialize)]
pub struct RecordAccess {
    pub medical_record: MedicalRecordDetails,
    pub consultations: Vec<Consultation>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PatientSummary {
    pub id: i64,
    pub unique_code: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerprintAccess {
    pub patient: PatientSummary,
    #[serde(flatten)]
    pub access: RecordAccess,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordCodeRequest {
    pub record_code: String,
}

/// Either the raw image (base64) or its hex SHA-256 digest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FingerprintRequest {
    pub fingerprint_image: Option<String>,
    #[serde(alias = "fingerprint_data")]
    pub fingerprint_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    PatientName,
    RecordCode,
    PatientCode,
}

impl SearchType {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "patient_name" => Ok(SearchType::PatientName),
            "record_code" => Ok(SearchType::RecordCode),
            "patient_code" => Ok(SearchType::PatientCode),
            _ => Err(AppError::ValidationError(
                "Search type must be one of: patient_name, record_code, patient_code".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSearchQuery {
    pub search_term: Option<String>,
    pub search_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecordSearchHit {
    pub patient_id: i64,
    pub unique_code: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub created_by: i64,
    pub record_id: Option<i64>,
    pub record_code: Option<String>,
}

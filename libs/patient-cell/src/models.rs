use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use medical_record_cell::{MedicalRecord, MedicalRecordDetails, RecordAttributes};
use shared_models::error::AppError;
use shared_utils::validation::{check_length, check_max_length, is_valid_email, is_valid_phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Patient {
    pub id: i64,
    pub unique_code: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
    pub created_by: i64,
    #[serde(skip_serializing)]
    pub fingerprint_hash: Option<String>,
    pub fingerprint_image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn has_fingerprint(&self) -> bool {
        self.fingerprint_hash.is_some()
    }

    pub fn age(&self) -> u32 {
        Utc::now().date_naive().years_since(self.date_of_birth).unwrap_or(0)
    }
}

/// A patient in a doctor's listing, with the record code to share.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PatientListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub patient: Patient,
    pub record_id: Option<i64>,
    pub record_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub emergency_contact: Option<String>,
    pub address: Option<String>,
    pub medical_info: Option<RecordAttributes>,
}

impl CreatePatientRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), AppError> {
        check_length("full_name", self.full_name.trim(), 3, 255)?;
        if self.date_of_birth > today {
            return Err(AppError::ValidationError(
                "Date of birth cannot be in the future".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(AppError::ValidationError("Invalid email format".to_string()));
            }
        }
        if let Some(phone) = &self.phone_number {
            if !is_valid_phone(phone) {
                return Err(AppError::ValidationError("Invalid phone number format".to_string()));
            }
        }
        check_max_length("emergency_contact", self.emergency_contact.as_deref(), 255)?;
        check_max_length("address", self.address.as_deref(), 500)?;
        if let Some(medical_info) = &self.medical_info {
            medical_info.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPatient {
    pub patient: Patient,
    pub medical_record: MedicalRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientWithRecord {
    pub patient: Patient,
    pub medical_record: Option<MedicalRecordDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollFingerprintRequest {
    pub fingerprint_image: String,
    pub fingerprint_image_ref: Option<String>,
}

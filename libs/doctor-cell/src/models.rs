use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use consultation_cell::Consultation;
use medical_record_cell::MedicalRecordDetails;
use patient_cell::Patient;
use shared_models::error::AppError;
use shared_utils::validation::{check_length, is_valid_phone, require_non_empty};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Doctor {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub license_number: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub license_number: String,
    pub specialization: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.specialization.is_none() && self.phone.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(full_name) = &self.full_name {
            check_length("full_name", full_name.trim(), 3, 255)?;
        }
        if let Some(specialization) = &self.specialization {
            require_non_empty("specialization", specialization)?;
            check_length("specialization", specialization, 1, 255)?;
        }
        if let Some(phone) = &self.phone {
            if !is_valid_phone(phone) {
                return Err(AppError::ValidationError("Invalid phone number format".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentPatient {
    pub id: i64,
    pub unique_code: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentConsultation {
    pub id: i64,
    pub medical_record_id: i64,
    pub patient_name: String,
    pub consultation_date: DateTime<Utc>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorStatistics {
    pub total_patients: i64,
    pub consultations_this_month: i64,
    pub recent_patients: Vec<RecentPatient>,
    pub recent_consultations: Vec<RecentConsultation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyReportQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyConsultation {
    pub id: i64,
    pub consultation_date: DateTime<Utc>,
    pub patient_name: String,
    pub patient_code: String,
    pub record_code: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: i32,
    pub total: usize,
    pub consultations: Vec<MonthlyConsultation>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PatientGrowth {
    /// `YYYY-MM`
    pub month: String,
    pub new_patients: i64,
}

/// A patient with no consultation in the last year.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FollowUpNotice {
    pub patient_id: i64,
    pub full_name: String,
    pub unique_code: String,
    pub record_code: String,
    pub last_consultation: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.unwrap_or("json").to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AppError::ValidationError(format!(
                "Unsupported export format: {}. Use json or csv",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientExport {
    pub exported_at: DateTime<Utc>,
    pub patient: Patient,
    pub medical_record: Option<MedicalRecordDetails>,
    pub consultations: Vec<Consultation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    pub year: i32,
    pub month: u32,
}

impl ReportMonth {
    pub fn resolve(query: &MonthlyReportQuery, today: NaiveDate) -> Result<Self, AppError> {
        let month = query.month.unwrap_or_else(|| today.month());
        let year = query.year.unwrap_or_else(|| today.year());
        if !(1..=12).contains(&month) {
            return Err(AppError::ValidationError("Month must be between 1 and 12".to_string()));
        }
        if !(1900..=9999).contains(&year) {
            return Err(AppError::ValidationError("Year is out of range".to_string()));
        }
        Ok(Self { year, month })
    }
}

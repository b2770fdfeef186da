use chrono::Utc;
use tracing::info;

use consultation_cell::ConsultationService;
use medical_record_cell::RecordService;
use patient_cell::PatientService;
use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::PatientExport;

const CSV_HEADER: [&str; 13] = [
    "patient_code",
    "full_name",
    "date_of_birth",
    "gender",
    "record_code",
    "blood_type",
    "allergies",
    "consultation_date",
    "symptoms",
    "diagnosis",
    "prescription",
    "notes",
    "doctor_name",
];

/// Quotes a CSV field when it holds a delimiter, quote or line break.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut row = fields.into_iter().map(csv_field).collect::<Vec<_>>().join(",");
    row.push_str("\r\n");
    row
}

pub struct ExportService {
    db: DbPool,
}

impl ExportService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    /// Everything held about one of the doctor's patients.
    pub async fn export_patient(&self, patient_id: i64, doctor_id: i64) -> Result<PatientExport, AppError> {
        let patient = PatientService::new(&self.db).get_patient(patient_id, doctor_id).await?;
        let medical_record = RecordService::new(&self.db).find_details_by_patient(patient.id).await?;
        let consultations = ConsultationService::new(&self.db).list_for_patient(patient.id).await?;

        info!("Patient {} exported by doctor {}", patient.id, doctor_id);
        Ok(PatientExport {
            exported_at: Utc::now(),
            patient,
            medical_record,
            consultations,
        })
    }

    /// One row per consultation; a patient without history yields a single
    /// row with empty consultation columns.
    pub fn to_csv(export: &PatientExport) -> String {
        let mut out = csv_row(CSV_HEADER);

        let patient = &export.patient;
        let date_of_birth = patient.date_of_birth.to_string();
        let record = export.medical_record.as_ref().map(|details| &details.record);
        let record_code = record.map(|r| r.record_code.as_str()).unwrap_or_default();
        let blood_type = record.and_then(|r| r.blood_type.as_deref()).unwrap_or_default();
        let allergies = record.and_then(|r| r.allergies.as_deref()).unwrap_or_default();
        let leading = [
            patient.unique_code.as_str(),
            patient.full_name.as_str(),
            date_of_birth.as_str(),
            patient.gender.as_str(),
            record_code,
            blood_type,
            allergies,
        ];

        if export.consultations.is_empty() {
            out.push_str(&csv_row(leading.into_iter().chain(["", "", "", "", "", ""])));
            return out;
        }

        for consultation in &export.consultations {
            let date = consultation.consultation_date.to_rfc3339();
            let trailing = [
                date.as_str(),
                consultation.symptoms.as_deref().unwrap_or_default(),
                consultation.diagnosis.as_deref().unwrap_or_default(),
                consultation.prescription.as_deref().unwrap_or_default(),
                consultation.notes.as_deref().unwrap_or_default(),
                consultation.doctor_name.as_str(),
            ];
            out.push_str(&csv_row(leading.into_iter().chain(trailing)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"ah\""), "\"say \"\"ah\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_row_terminates_with_crlf() {
        assert_eq!(csv_row(["a", "b,c"]), "a,\"b,c\"\r\n");
    }
}

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use tracing::debug;

use shared_database::DbPool;
use shared_models::error::AppError;

use crate::models::{
    DoctorStatistics, FollowUpNotice, MonthlyConsultation, MonthlyReport, PatientGrowth, RecentConsultation,
    RecentPatient, ReportMonth,
};

const RECENT_LIMIT: i64 = 5;
const GROWTH_MONTHS: i64 = 12;
const NOTIFICATION_LIMIT: i64 = 10;
const FOLLOW_UP_AFTER_DAYS: i64 = 365;

impl ReportMonth {
    /// Half-open UTC range `[first day, first day of next month)`.
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        let start = month_start(self.year, self.month)?;
        let end = month_start(next_year, next_month)?;
        Ok((start, end))
    }
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>, AppError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AppError::ValidationError("Invalid month or year".to_string()))
}

pub struct ReportService {
    db: DbPool,
}

impl ReportService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    pub async fn statistics(&self, doctor_id: i64) -> Result<DoctorStatistics, AppError> {
        debug!("Computing statistics for doctor {}", doctor_id);
        let today = Utc::now().date_naive();
        let (month_start, month_end) = ReportMonth {
            year: today.year(),
            month: today.month(),
        }
        .bounds()?;

        let total_patients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients WHERE created_by = ?")
            .bind(doctor_id)
            .fetch_one(&self.db)
            .await?;

        let consultations_this_month: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM consultations c
             JOIN medical_records mr ON mr.id = c.medical_record_id
             WHERE mr.doctor_id = ? AND c.consultation_date >= ? AND c.consultation_date < ?",
        )
        .bind(doctor_id)
        .bind(month_start)
        .bind(month_end)
        .fetch_one(&self.db)
        .await?;

        let recent_patients = sqlx::query_as::<_, RecentPatient>(
            "SELECT id, unique_code, full_name, created_at
             FROM patients
             WHERE created_by = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(doctor_id)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.db)
        .await?;

        let recent_consultations = sqlx::query_as::<_, RecentConsultation>(
            "SELECT c.id, c.medical_record_id, p.full_name AS patient_name, c.consultation_date, c.diagnosis
             FROM consultations c
             JOIN medical_records mr ON mr.id = c.medical_record_id
             JOIN patients p ON p.id = mr.patient_id
             WHERE c.doctor_id = ?
             ORDER BY c.consultation_date DESC, c.id DESC
             LIMIT ?",
        )
        .bind(doctor_id)
        .bind(RECENT_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(DoctorStatistics {
            total_patients,
            consultations_this_month,
            recent_patients,
            recent_consultations,
        })
    }

    /// Consultations the doctor authored during the given month.
    pub async fn monthly_consultations(&self, doctor_id: i64, month: ReportMonth) -> Result<MonthlyReport, AppError> {
        let (start, end) = month.bounds()?;

        let consultations = sqlx::query_as::<_, MonthlyConsultation>(
            "SELECT c.id, c.consultation_date, p.full_name AS patient_name, p.unique_code AS patient_code,
                    mr.record_code, c.symptoms, c.diagnosis
             FROM consultations c
             JOIN medical_records mr ON mr.id = c.medical_record_id
             JOIN patients p ON p.id = mr.patient_id
             WHERE c.doctor_id = ? AND c.consultation_date >= ? AND c.consultation_date < ?
             ORDER BY c.consultation_date DESC, c.id DESC",
        )
        .bind(doctor_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(MonthlyReport {
            month: month.month,
            year: month.year,
            total: consultations.len(),
            consultations,
        })
    }

    /// New patients per month, newest month first.
    pub async fn patient_growth(&self, doctor_id: i64) -> Result<Vec<PatientGrowth>, AppError> {
        let growth = sqlx::query_as::<_, PatientGrowth>(
            "SELECT substr(created_at, 1, 7) AS month, COUNT(*) AS new_patients
             FROM patients
             WHERE created_by = ?
             GROUP BY month
             ORDER BY month DESC
             LIMIT ?",
        )
        .bind(doctor_id)
        .bind(GROWTH_MONTHS)
        .fetch_all(&self.db)
        .await?;

        Ok(growth)
    }

    /// Owned patients not seen for a year, longest-unseen first.
    pub async fn follow_up_notices(&self, doctor_id: i64) -> Result<Vec<FollowUpNotice>, AppError> {
        let cutoff = Utc::now() - Duration::days(FOLLOW_UP_AFTER_DAYS);

        let notices = sqlx::query_as::<_, FollowUpNotice>(
            "SELECT p.id AS patient_id, p.full_name, p.unique_code, mr.record_code,
                    (SELECT MAX(c.consultation_date) FROM consultations c
                     WHERE c.medical_record_id = mr.id) AS last_consultation
             FROM patients p
             JOIN medical_records mr ON mr.patient_id = p.id
             WHERE p.created_by = ?
               AND NOT EXISTS (SELECT 1 FROM consultations c
                               WHERE c.medical_record_id = mr.id AND c.consultation_date >= ?)
             ORDER BY last_consultation ASC, p.id ASC
             LIMIT ?",
        )
        .bind(doctor_id)
        .bind(cutoff)
        .bind(NOTIFICATION_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(notices)
    }
}

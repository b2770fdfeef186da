use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use shared_database::DbPool;
use shared_models::error::AppError;
use shared_utils::password::PasswordService;

use crate::models::{ChangePasswordRequest, Doctor, NewDoctor, UpdateProfileRequest};

const DOCTOR_SELECT: &str = "SELECT id, email, password_hash, full_name, license_number, specialization, phone,
        created_at, updated_at
     FROM doctors";

pub struct DoctorService {
    db: DbPool,
}

impl DoctorService {
    pub fn new(db: &DbPool) -> Self {
        Self { db: db.clone() }
    }

    pub async fn create_doctor(&self, doctor: NewDoctor) -> Result<Doctor, AppError> {
        debug!("Creating doctor account for {}", doctor.email);
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO doctors
                (email, password_hash, full_name, license_number, specialization, phone, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&doctor.email)
        .bind(&doctor.password_hash)
        .bind(&doctor.full_name)
        .bind(&doctor.license_number)
        .bind(&doctor.specialization)
        .bind(&doctor.phone)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        info!("Doctor {} registered", id);
        self.get_doctor(id).await
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, AppError> {
        sqlx::query_as::<_, Doctor>(&format!("{} WHERE id = ?", DOCTOR_SELECT))
            .bind(doctor_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Doctor>, AppError> {
        let doctor = sqlx::query_as::<_, Doctor>(&format!("{} WHERE email = ?", DOCTOR_SELECT))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(doctor)
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doctors WHERE email = ?")
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn license_taken(&self, license_number: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doctors WHERE license_number = ?")
            .bind(license_number)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn update_profile(&self, doctor_id: i64, request: UpdateProfileRequest) -> Result<Doctor, AppError> {
        if request.is_empty() {
            return Err(AppError::no_fields());
        }
        request.validate()?;
        self.get_doctor(doctor_id).await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE doctors SET ");
        let mut fields = builder.separated(", ");
        if let Some(full_name) = request.full_name {
            fields.push("full_name = ").push_bind_unseparated(full_name.trim().to_string());
        }
        if let Some(specialization) = request.specialization {
            fields.push("specialization = ").push_bind_unseparated(specialization);
        }
        if let Some(phone) = request.phone {
            fields.push("phone = ").push_bind_unseparated(phone);
        }
        fields.push("updated_at = ").push_bind_unseparated(Utc::now());
        builder.push(" WHERE id = ").push_bind(doctor_id);

        builder.build().execute(&self.db).await?;
        info!("Doctor {} updated their profile", doctor_id);

        self.get_doctor(doctor_id).await
    }

    pub async fn change_password(&self, doctor_id: i64, request: ChangePasswordRequest) -> Result<(), AppError> {
        let doctor = self.get_doctor(doctor_id).await?;

        if !PasswordService::verify_password(&request.current_password, &doctor.password_hash)? {
            return Err(AppError::Auth("Current password is incorrect".to_string()));
        }
        PasswordService::ensure_strong(&request.new_password)?;
        let password_hash = PasswordService::hash_password(&request.new_password)?;

        sqlx::query("UPDATE doctors SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(doctor_id)
            .execute(&self.db)
            .await?;

        info!("Doctor {} changed their password", doctor_id);
        Ok(())
    }
}

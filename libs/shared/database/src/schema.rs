use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::pool::DbPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS doctors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name TEXT NOT NULL,
        license_number TEXT NOT NULL UNIQUE,
        specialization TEXT,
        phone TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        unique_code TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        date_of_birth TEXT NOT NULL,
        gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'other')),
        phone_number TEXT,
        email TEXT,
        emergency_contact TEXT,
        address TEXT,
        created_by INTEGER NOT NULL REFERENCES doctors(id),
        fingerprint_hash TEXT UNIQUE,
        fingerprint_image_ref TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS medical_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        record_code TEXT NOT NULL UNIQUE,
        patient_id INTEGER NOT NULL UNIQUE REFERENCES patients(id),
        doctor_id INTEGER NOT NULL REFERENCES doctors(id),
        blood_type TEXT,
        height REAL,
        weight REAL,
        allergies TEXT,
        chronic_diseases TEXT,
        current_medications TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS consultations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        medical_record_id INTEGER NOT NULL REFERENCES medical_records(id),
        doctor_id INTEGER NOT NULL REFERENCES doctors(id),
        consultation_date TEXT NOT NULL,
        symptoms TEXT,
        diagnosis TEXT,
        prescription TEXT,
        notes TEXT,
        next_appointment TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_patients_created_by ON patients(created_by)",
    "CREATE INDEX IF NOT EXISTS idx_medical_records_doctor ON medical_records(doctor_id)",
    "CREATE INDEX IF NOT EXISTS idx_consultations_record ON consultations(medical_record_id, consultation_date)",
    "CREATE INDEX IF NOT EXISTS idx_consultations_doctor ON consultations(doctor_id)",
];

/// Creates the tables and indexes if they are missing. Safe to run on every start.
pub async fn init_schema(pool: &DbPool) -> Result<()> {
    info!("Initializing database schema ({} statements)", SCHEMA.len());

    let mut tx = pool.begin().await.context("Failed to open schema transaction")?;
    for (index, statement) in SCHEMA.iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Schema statement {} failed", index + 1))?;
        debug!("Executed schema statement {}/{}", index + 1, SCHEMA.len());
    }
    tx.commit().await.context("Failed to commit schema")?;

    info!("Database schema ready");
    Ok(())
}

use tracing::{debug, info, warn};

use doctor_cell::{Doctor, DoctorService, NewDoctor};
use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::jwt::issue_token;
use shared_utils::password::PasswordService;

use crate::models::{AuthSession, LoginRequest, RegisterRequest};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    doctors: DoctorService,
    jwt_secret: String,
    jwt_expiry_hours: i64,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            doctors: DoctorService::new(&state.db),
            jwt_secret: state.config.jwt_secret.clone(),
            jwt_expiry_hours: state.config.jwt_expiry_hours,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AppError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        let license_number = request.license_number.trim().to_string();
        debug!("Registering doctor {}", email);

        if self.doctors.email_taken(&email).await? {
            return Err(AppError::Conflict("A doctor with this email already exists".to_string()));
        }
        if self.doctors.license_taken(&license_number).await? {
            return Err(AppError::Conflict(
                "A doctor with this license number already exists".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let doctor = self
            .doctors
            .create_doctor(NewDoctor {
                email,
                password_hash,
                full_name: request.full_name.trim().to_string(),
                license_number,
                specialization: request.specialization.trim().to_string(),
                phone: request.phone,
            })
            .await?;

        self.session_for(doctor)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AppError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let Some(doctor) = self.doctors.find_by_email(&email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        if !PasswordService::verify_password(&request.password, &doctor.password_hash)? {
            warn!("Failed login for doctor {}", doctor.id);
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        info!("Doctor {} logged in", doctor.id);
        self.session_for(doctor)
    }

    fn session_for(&self, doctor: Doctor) -> Result<AuthSession, AppError> {
        let token = issue_token(doctor.id, &doctor.email, &self.jwt_secret, self.jwt_expiry_hours)
            .map_err(AppError::Internal)?;
        Ok(AuthSession { token, doctor })
    }
}

pub mod doctor;
pub mod export;
pub mod reports;

pub use doctor::DoctorService;
pub use export::ExportService;
pub use reports::ReportService;

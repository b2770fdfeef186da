pub mod access;
pub mod codes;
pub mod fingerprint;
pub mod record;

pub use access::AccessResolver;
pub use codes::CodeKind;
pub use record::RecordService;

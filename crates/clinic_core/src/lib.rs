//! Core domain logic for the multi-tenant patient registry.
//! This crate is the single source of truth for CPF validation and the
//! save-time document normalization policy.

pub mod config;
pub mod db;
pub mod document;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, InitialTenant, RegistryConfig};
pub use document::cpf::{
    extract_digits, extract_digits_opt, format_masked, is_canonical, is_valid_document,
    validate_document, validate_document_opt, DocumentError, CPF_LENGTH,
};
pub use document::normalizer::{
    CollisionPolicy, DocumentLookup, DocumentNormalizer, NormalizeError, NormalizeOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::patient::{
    Address, EmergencyContact, Gender, Guardian, Insurance, Patient, PatientId, PatientProfile,
    PatientRecord, PatientValidationError, ReminderChannel,
};
pub use model::tenant::{slugify, Tenant, TenantId, TenantValidationError};
pub use repo::error::{RepoError, RepoResult};
pub use repo::patient_repo::{PatientListQuery, PatientRepository, SqlitePatientRepository};
pub use repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
pub use service::patient_service::{
    FieldError, FieldErrorKind, PatientService, PatientServiceError, PatientValidationErrors,
    DOCUMENT_FIELD, FULL_NAME_FIELD,
};
pub use service::tenant_service::{TenantProvisioning, TenantService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! Patient use-case service.
//!
//! # Responsibility
//! - Run the save-time document normalizer on every create/update.
//! - Expose the explicit, field-level full validation pathway.
//!
//! # Invariants
//! - Save never enforces CPF check digits; only `full_clean` does.
//! - The stored document is always the normalizer's choice, never the raw
//!   caller value by accident.
//! - Storage uniqueness rejections are reported as-is, never retried.

use crate::document::cpf::{extract_digits, validate_document, DocumentError};
use crate::document::normalizer::{DocumentNormalizer, NormalizeError};
use crate::model::patient::{Patient, PatientId, PatientRecord, PatientValidationError};
use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::patient_repo::{PatientListQuery, PatientRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field name used for document errors, matching the serialized name.
pub const DOCUMENT_FIELD: &str = "cpf";
pub const FULL_NAME_FIELD: &str = "full_name";

/// One reason a field failed full validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Structure(PatientValidationError),
    Document(DocumentError),
    /// Another patient of the same tenant holds the same digits.
    DuplicateDocument { existing: PatientId },
}

/// Field-attributed validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FieldErrorKind::Structure(err) => write!(f, "{}: {err}", self.field),
            FieldErrorKind::Document(err) => write!(f, "{}: {err}", self.field),
            FieldErrorKind::DuplicateDocument { .. } => write!(
                f,
                "{}: a patient with this CPF already exists in this clinic",
                self.field
            ),
        }
    }
}

/// All field errors found by one `full_clean` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientValidationErrors {
    pub errors: Vec<FieldError>,
}

impl PatientValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors attributed to `field`, in discovery order.
    pub fn for_field(&self, field: &str) -> Vec<&FieldError> {
        self.errors
            .iter()
            .filter(|error| error.field == field)
            .collect()
    }

    fn push(&mut self, field: &'static str, kind: FieldErrorKind) {
        self.errors.push(FieldError { field, kind });
    }
}

impl Display for PatientValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl Error for PatientValidationErrors {}

/// Service error for patient use-cases.
#[derive(Debug)]
pub enum PatientServiceError {
    /// Explicit full validation failed.
    Invalid(PatientValidationErrors),
    /// Canonical-form collision under the `Reject` policy.
    DocumentCollision {
        tenant_id: TenantId,
        existing: PatientId,
    },
    /// Storage rejected an identical non-blank document in the same tenant.
    UniquenessViolation { tenant_id: TenantId },
    PatientNotFound(PatientId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PatientServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "invalid patient: {errors}"),
            Self::DocumentCollision {
                tenant_id,
                existing,
            } => write!(
                f,
                "document already registered in tenant {tenant_id} by patient {existing}"
            ),
            Self::UniquenessViolation { tenant_id } => write!(
                f,
                "a patient with this CPF already exists in tenant {tenant_id}"
            ),
            Self::PatientNotFound(id) => write!(f, "patient not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent patient state: {details}"),
        }
    }
}

impl Error for PatientServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PatientServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::PatientNotFound(id),
            RepoError::UniquenessViolation { tenant_id } => Self::UniquenessViolation { tenant_id },
            other => Self::Repo(other),
        }
    }
}

impl From<NormalizeError> for PatientServiceError {
    fn from(value: NormalizeError) -> Self {
        match value {
            NormalizeError::DocumentCollision {
                tenant_id,
                existing,
            } => Self::DocumentCollision {
                tenant_id,
                existing,
            },
            NormalizeError::Lookup(err) => err.into(),
        }
    }
}

/// Patient service facade over repository implementations.
pub struct PatientService<R: PatientRepository> {
    repo: R,
    normalizer: DocumentNormalizer,
}

impl<R: PatientRepository> PatientService<R> {
    /// Creates a service with the default `KeepRaw` collision policy.
    pub fn new(repo: R) -> Self {
        Self::with_normalizer(repo, DocumentNormalizer::default())
    }

    pub fn with_normalizer(repo: R, normalizer: DocumentNormalizer) -> Self {
        Self { repo, normalizer }
    }

    /// Returns the document value a write of `patient` would persist.
    pub fn prepare_document(&self, patient: &Patient) -> Result<String, PatientServiceError> {
        self.normalizer
            .prepare(&self.repo, &patient.document, patient.tenant_id, patient.id)
            .map_err(Into::into)
    }

    /// Creates one patient after document normalization.
    ///
    /// # Errors
    /// - `UniquenessViolation` when storage rejects a genuine duplicate.
    /// - `DocumentCollision` under the `Reject` policy.
    pub fn create_patient(&self, patient: &Patient) -> Result<PatientRecord, PatientServiceError> {
        let stored = self.with_prepared_document(patient)?;
        self.repo.create_patient(&stored)?;
        info!(
            "event=patient_create module=service status=ok tenant_id={} patient_id={} has_document={}",
            stored.tenant_id,
            stored.id,
            stored.has_document()
        );

        self.repo
            .get_patient(stored.id)?
            .ok_or(PatientServiceError::InconsistentState(
                "created patient not found in read-back",
            ))
    }

    /// Updates one patient after document normalization.
    ///
    /// The record being saved is excluded from the collision lookup, so
    /// re-saving an unchanged patient keeps its document.
    pub fn update_patient(&self, patient: &Patient) -> Result<PatientRecord, PatientServiceError> {
        let stored = self.with_prepared_document(patient)?;
        self.repo.update_patient(&stored)?;
        info!(
            "event=patient_update module=service status=ok tenant_id={} patient_id={} has_document={}",
            stored.tenant_id,
            stored.id,
            stored.has_document()
        );

        self.repo
            .get_patient(stored.id)?
            .ok_or(PatientServiceError::InconsistentState(
                "updated patient not found in read-back",
            ))
    }

    /// Runs every field check on `patient` without writing anything.
    ///
    /// # Errors
    /// - `Invalid` with all field errors collected.
    /// - `Repo` when the duplicate lookup fails.
    pub fn full_clean(&self, patient: &Patient) -> Result<(), PatientServiceError> {
        let mut errors = PatientValidationErrors::default();

        if let Err(err) = patient.validate() {
            errors.push(structure_field(&err), FieldErrorKind::Structure(err));
        }

        if let Err(err) = validate_document(&patient.document) {
            errors.push(DOCUMENT_FIELD, FieldErrorKind::Document(err));
        }

        let canonical = extract_digits(&patient.document);
        if !canonical.is_empty() && !patient.tenant_id.is_nil() {
            if let Some(existing) =
                self.repo
                    .find_document_collision(patient.tenant_id, &canonical, patient.id)?
            {
                errors.push(
                    DOCUMENT_FIELD,
                    FieldErrorKind::DuplicateDocument { existing },
                );
            }
        }

        if errors.is_empty() {
            return Ok(());
        }

        warn!(
            "event=patient_full_clean module=service status=invalid tenant_id={} patient_id={} error_count={}",
            patient.tenant_id,
            patient.id,
            errors.errors.len()
        );
        Err(PatientServiceError::Invalid(errors))
    }

    pub fn get_patient(&self, id: PatientId) -> RepoResult<Option<PatientRecord>> {
        self.repo.get_patient(id)
    }

    pub fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<PatientRecord>> {
        self.repo.list_patients(query)
    }

    /// Digit-level document search inside one tenant.
    pub fn find_by_document(
        &self,
        tenant_id: TenantId,
        raw: &str,
    ) -> RepoResult<Vec<PatientRecord>> {
        self.repo.find_by_document(tenant_id, raw)
    }

    fn with_prepared_document(&self, patient: &Patient) -> Result<Patient, PatientServiceError> {
        let document = self.prepare_document(patient)?;
        let mut stored = patient.clone();
        stored.document = document;
        Ok(stored)
    }
}

fn structure_field(err: &PatientValidationError) -> &'static str {
    match err {
        PatientValidationError::NilUuid => "id",
        PatientValidationError::NilTenant => "tenant_id",
        PatientValidationError::BlankFullName | PatientValidationError::FullNameTooLong { .. } => {
            FULL_NAME_FIELD
        }
    }
}

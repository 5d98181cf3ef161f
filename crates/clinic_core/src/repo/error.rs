//! Repository error taxonomy shared by tenant and patient persistence.
//!
//! # Invariants
//! - SQLite constraint failures are mapped to semantic variants at the
//!   repository boundary; callers never inspect raw SQLite codes.
//! - `UniquenessViolation` is terminal and never retried.

use crate::db::DbError;
use crate::model::patient::{PatientId, PatientValidationError};
use crate::model::tenant::{TenantId, TenantValidationError};
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::os::raw::c_int;

const FOREIGN_KEY_MESSAGE: &str = "FOREIGN KEY constraint failed";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for tenant/patient persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PatientValidationError),
    TenantValidation(TenantValidationError),
    Db(DbError),
    NotFound(PatientId),
    TenantNotFound(TenantId),
    /// Tenant still owns patient records.
    TenantInUse(TenantId),
    SlugTaken(String),
    /// Storage rejected a second identical non-blank document in one tenant.
    UniquenessViolation { tenant_id: TenantId },
    /// Connection was not opened through `open_db*`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingSqlFunction(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TenantValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "patient not found: {id}"),
            Self::TenantNotFound(id) => write!(f, "tenant not found: {id}"),
            Self::TenantInUse(id) => {
                write!(f, "tenant {id} still owns patient records; refusing to delete")
            }
            Self::SlugTaken(slug) => write!(f, "tenant slug already in use: `{slug}`"),
            Self::UniquenessViolation { tenant_id } => write!(
                f,
                "a patient with this CPF already exists in tenant {tenant_id}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingSqlFunction(name) => {
                write!(f, "repository requires SQL function `{name}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::TenantValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatientValidationError> for RepoError {
    fn from(value: PatientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TenantValidationError> for RepoError {
    fn from(value: TenantValidationError) -> Self {
        Self::TenantValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Kind of SQLite constraint that rejected a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
    Other,
}

/// Classifies `err` when it is a constraint violation.
pub(crate) fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    match err {
        rusqlite::Error::SqliteFailure(inner, message)
            if inner.code == ErrorCode::ConstraintViolation =>
        {
            Some(classify(inner.extended_code, message.as_deref()))
        }
        _ => None,
    }
}

fn classify(extended_code: c_int, message: Option<&str>) -> ConstraintKind {
    match extended_code {
        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
        rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        // `ON DELETE RESTRICT` fails through SQLite's internal FK trigger.
        rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER
            if message.is_some_and(|text| text.starts_with(FOREIGN_KEY_MESSAGE)) =>
        {
            ConstraintKind::ForeignKey
        }
        _ => ConstraintKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::{constraint_kind, ConstraintKind};
    use rusqlite::ffi;

    fn failure(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(extended_code), Some(message.to_string()))
    }

    #[test]
    fn restrict_trigger_failure_counts_as_foreign_key() {
        let err = failure(
            ffi::SQLITE_CONSTRAINT_TRIGGER,
            "FOREIGN KEY constraint failed",
        );
        assert_eq!(constraint_kind(&err), Some(ConstraintKind::ForeignKey));
    }

    #[test]
    fn user_trigger_failure_is_not_foreign_key() {
        let err = failure(ffi::SQLITE_CONSTRAINT_TRIGGER, "custom abort");
        assert_eq!(constraint_kind(&err), Some(ConstraintKind::Other));
    }

    #[test]
    fn classifies_standard_constraint_codes() {
        let unique = failure(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed");
        assert_eq!(constraint_kind(&unique), Some(ConstraintKind::Unique));

        let fk = failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed");
        assert_eq!(constraint_kind(&fk), Some(ConstraintKind::ForeignKey));

        assert_eq!(constraint_kind(&rusqlite::Error::QueryReturnedNoRows), None);
    }
}

//! Save-time document normalization policy.
//!
//! # Responsibility
//! - Pick the document value that is persisted for a patient write.
//! - Prefer canonical digits-only form unless it would collide with another
//!   record of the same tenant.
//!
//! # Invariants
//! - Blank input is stored as `""` and never participates in lookups.
//! - The collision lookup is tenant-scoped and excludes the record being saved.
//! - This step does not enforce check digits; see `validate_document`.
//! - The storage unique index stays the final guard against duplicates.

use crate::document::cpf::extract_digits;
use crate::model::patient::PatientId;
use crate::model::tenant::TenantId;
use crate::repo::error::{RepoError, RepoResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What to do when the canonical form already exists in the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Store the caller's raw input unchanged.
    #[default]
    KeepRaw,
    /// Refuse the write with [`NormalizeError::DocumentCollision`].
    Reject,
}

impl CollisionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepRaw => "keep_raw",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep_raw" | "keep-raw" => Ok(Self::KeepRaw),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unsupported collision policy `{other}`; expected keep_raw|reject"
            )),
        }
    }
}

/// Read-only lookup used to detect canonical-form collisions.
pub trait DocumentLookup {
    /// Finds another record in `tenant_id`, other than `exclude`, whose stored
    /// document has the same digits as `canonical`.
    fn find_document_collision(
        &self,
        tenant_id: TenantId,
        canonical: &str,
        exclude: PatientId,
    ) -> RepoResult<Option<PatientId>>;
}

#[derive(Debug)]
pub enum NormalizeError {
    /// Collision found while running under [`CollisionPolicy::Reject`].
    DocumentCollision {
        tenant_id: TenantId,
        existing: PatientId,
    },
    /// The collision lookup itself failed.
    Lookup(RepoError),
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentCollision {
                tenant_id,
                existing,
            } => write!(
                f,
                "document already registered in tenant {tenant_id} by patient {existing}"
            ),
            Self::Lookup(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NormalizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DocumentCollision { .. } => None,
            Self::Lookup(err) => Some(err),
        }
    }
}

impl From<RepoError> for NormalizeError {
    fn from(value: RepoError) -> Self {
        Self::Lookup(value)
    }
}

/// Outcome label used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Blank,
    Canonical,
    KeptRaw,
}

impl NormalizeOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Canonical => "canonical",
            Self::KeptRaw => "kept_raw",
        }
    }
}

/// Stateless save-time normalizer configured with a collision policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentNormalizer {
    policy: CollisionPolicy,
}

impl DocumentNormalizer {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Returns the value to persist for `raw` in `tenant_id`.
    ///
    /// # Contract
    /// - Blank (after trim) -> `""`.
    /// - Non-blank input with no digits -> raw input unchanged.
    /// - No collision -> canonical digits-only form.
    /// - Collision -> raw input unchanged (`KeepRaw`) or an error (`Reject`).
    ///
    /// # Errors
    /// - [`NormalizeError::Lookup`] when the collision lookup fails.
    /// - [`NormalizeError::DocumentCollision`] under `Reject` only.
    pub fn prepare<L: DocumentLookup>(
        &self,
        lookup: &L,
        raw: &str,
        tenant_id: TenantId,
        exclude: PatientId,
    ) -> Result<String, NormalizeError> {
        self.prepare_with_outcome(lookup, raw, tenant_id, exclude)
            .map(|(value, _)| value)
    }

    /// Like [`prepare`](Self::prepare), also reporting which branch was taken.
    pub fn prepare_with_outcome<L: DocumentLookup>(
        &self,
        lookup: &L,
        raw: &str,
        tenant_id: TenantId,
        exclude: PatientId,
    ) -> Result<(String, NormalizeOutcome), NormalizeError> {
        if raw.trim().is_empty() {
            return Ok(self.finish(String::new(), NormalizeOutcome::Blank, raw));
        }

        let canonical = extract_digits(raw);
        if canonical.is_empty() {
            return Ok(self.finish(raw.to_string(), NormalizeOutcome::KeptRaw, raw));
        }

        match lookup.find_document_collision(tenant_id, canonical.as_str(), exclude)? {
            None => Ok(self.finish(canonical, NormalizeOutcome::Canonical, raw)),
            Some(existing) => match self.policy {
                CollisionPolicy::KeepRaw => {
                    Ok(self.finish(raw.to_string(), NormalizeOutcome::KeptRaw, raw))
                }
                CollisionPolicy::Reject => {
                    debug!(
                        "event=document_normalize module=document status=rejected policy={}",
                        self.policy.as_str()
                    );
                    Err(NormalizeError::DocumentCollision {
                        tenant_id,
                        existing,
                    })
                }
            },
        }
    }

    fn finish(
        &self,
        value: String,
        outcome: NormalizeOutcome,
        raw: &str,
    ) -> (String, NormalizeOutcome) {
        // Document values are PII; only lengths leave this module.
        debug!(
            "event=document_normalize module=document status=ok outcome={} policy={} raw_len={} stored_len={}",
            outcome.as_str(),
            self.policy.as_str(),
            raw.chars().count(),
            value.chars().count()
        );
        (value, outcome)
    }
}

//! Patient record domain model.
//!
//! # Responsibility
//! - Define the tenant-owned patient record and its opaque profile payload.
//! - Provide structural validation used before every write.
//!
//! # Invariants
//! - Every patient belongs to exactly one tenant.
//! - `document` is `""` when no CPF is on file; blank values may repeat.
//! - Non-blank `document` values are unique per tenant (enforced by storage).
//! - `profile` is carried verbatim; core logic never branches on it.

use crate::model::tenant::TenantId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable patient identifier.
pub type PatientId = Uuid;

pub const FULL_NAME_MAX_CHARS: usize = 255;

/// Structural validation failures for [`Patient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientValidationError {
    NilUuid,
    NilTenant,
    BlankFullName,
    FullNameTooLong { max: usize, actual: usize },
}

impl Display for PatientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "patient id must not be nil"),
            Self::NilTenant => write!(f, "patient tenant id must not be nil"),
            Self::BlankFullName => write!(f, "full name must not be blank"),
            Self::FullNameTooLong { max, actual } => {
                write!(f, "full name has {actual} chars, max is {max}")
            }
        }
    }
}

impl Error for PatientValidationError {}

/// Preferred channel for automatic appointment reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
    #[default]
    Whatsapp,
    Sms,
    Email,
    /// Patient opted out of reminders.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Brazilian postal code.
    pub cep: Option<String>,
    /// Street with number.
    pub street: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    /// Two-letter state code, e.g. `BA`.
    pub state: Option<String>,
}

/// Legal guardian, for minors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardian {
    pub name: Option<String>,
    /// Guardian CPF as typed; not normalized or unique.
    pub document: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insurance {
    /// Plan name; `Particular` means self-paying.
    pub name: String,
    pub holder: Option<String>,
    pub card_number: Option<String>,
    pub holder_document: Option<String>,
}

impl Default for Insurance {
    fn default() -> Self {
        Self {
            name: "Particular".to_string(),
            holder: None,
            card_number: None,
            holder_document: None,
        }
    }
}

/// Demographic and contact payload stored alongside a patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientProfile {
    pub mobile_phone: Option<String>,
    pub landline: Option<String>,
    pub email: Option<String>,
    pub reminder_channel: ReminderChannel,
    /// How the patient heard about the clinic.
    pub referral_source: Option<String>,
    pub occupation: Option<String>,
    pub gender: Option<Gender>,
    pub is_foreign: bool,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    /// State-issued RG number.
    pub rg: Option<String>,
    pub notes: Option<String>,
    /// Free-form label, e.g. private, insured, VIP.
    pub category: Option<String>,
    pub emergency_contact: EmergencyContact,
    pub address: Address,
    pub guardian: Guardian,
    pub insurance: Insurance,
}

/// Tenant-owned patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub tenant_id: TenantId,
    pub full_name: String,
    /// CPF as stored: canonical digits, caller-formatted, or `""`.
    #[serde(rename = "cpf")]
    pub document: String,
    pub profile: PatientProfile,
    pub active: bool,
}

impl Patient {
    /// Creates an active patient with a generated id and no document.
    pub fn new(tenant_id: TenantId, full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            full_name: full_name.into(),
            document: String::new(),
            profile: PatientProfile::default(),
            active: true,
        }
    }

    /// Creates a patient with a caller-provided id (imports).
    ///
    /// # Errors
    /// - Returns `NilUuid` when `id` is nil.
    pub fn with_id(
        id: PatientId,
        tenant_id: TenantId,
        full_name: impl Into<String>,
    ) -> Result<Self, PatientValidationError> {
        if id.is_nil() {
            return Err(PatientValidationError::NilUuid);
        }
        let mut patient = Self::new(tenant_id, full_name);
        patient.id = id;
        Ok(patient)
    }

    /// Sets the raw document value.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    /// Checks structural invariants required before persistence.
    ///
    /// Does not check the CPF itself; that is the explicit validation path.
    pub fn validate(&self) -> Result<(), PatientValidationError> {
        if self.id.is_nil() {
            return Err(PatientValidationError::NilUuid);
        }
        if self.tenant_id.is_nil() {
            return Err(PatientValidationError::NilTenant);
        }
        if self.full_name.trim().is_empty() {
            return Err(PatientValidationError::BlankFullName);
        }
        let actual = self.full_name.chars().count();
        if actual > FULL_NAME_MAX_CHARS {
            return Err(PatientValidationError::FullNameTooLong {
                max: FULL_NAME_MAX_CHARS,
                actual,
            });
        }
        Ok(())
    }

    /// Returns whether a document is on file.
    pub fn has_document(&self) -> bool {
        !self.document.trim().is_empty()
    }
}

/// Read model returned by storage, with storage-assigned timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub patient: Patient,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

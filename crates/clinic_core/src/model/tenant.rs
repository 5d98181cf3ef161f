//! Tenant (clinic) domain model.
//!
//! # Responsibility
//! - Define the organizational scope that owns patient records.
//! - Validate display names and URL-safe slugs before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `slug` is unique across all tenants (enforced by storage).
//! - Tenants are never hard-deleted while they own patients.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable tenant identifier.
pub type TenantId = Uuid;

pub const TENANT_NAME_MAX_CHARS: usize = 120;
pub const TENANT_SLUG_MAX_CHARS: usize = 80;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

/// Tenant field validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantValidationError {
    BlankName,
    NameTooLong { max: usize, actual: usize },
    InvalidSlug(String),
}

impl Display for TenantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "tenant name must not be blank"),
            Self::NameTooLong { max, actual } => {
                write!(f, "tenant name has {actual} chars, max is {max}")
            }
            Self::InvalidSlug(slug) => write!(
                f,
                "invalid tenant slug `{slug}`; expected lowercase letters, digits and single hyphens"
            ),
        }
    }
}

impl Error for TenantValidationError {}

/// Persisted tenant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Display name shown to users.
    pub name: String,
    /// URL-safe unique key.
    pub slug: String,
    pub active: bool,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

/// Trims and checks a tenant display name.
pub fn normalize_tenant_name(name: &str) -> Result<String, TenantValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TenantValidationError::BlankName);
    }
    let actual = trimmed.chars().count();
    if actual > TENANT_NAME_MAX_CHARS {
        return Err(TenantValidationError::NameTooLong {
            max: TENANT_NAME_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Checks that `slug` is non-empty, short enough and URL-safe.
pub fn validate_slug(slug: &str) -> Result<(), TenantValidationError> {
    if slug.len() > TENANT_SLUG_MAX_CHARS || !SLUG_RE.is_match(slug) {
        return Err(TenantValidationError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Derives a slug from a display name.
///
/// Accented Latin letters are folded to ASCII; any other run of
/// non-alphanumerics becomes one hyphen. Returns `None` when nothing
/// usable remains.
pub fn slugify(name: &str) -> Option<String> {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect();
    let joined = SLUG_SEPARATOR_RE.replace_all(&folded, "-");
    let mut slug = joined.trim_matches('-').to_string();
    if slug.len() > TENANT_SLUG_MAX_CHARS {
        slug.truncate(TENANT_SLUG_MAX_CHARS);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

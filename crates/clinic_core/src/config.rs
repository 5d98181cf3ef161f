//! Runtime configuration for registry hosts.
//!
//! # Responsibility
//! - Resolve database, logging, collision-policy and bootstrap settings
//!   from environment variables.
//! - Reject malformed values up front instead of at first use.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Set-but-invalid variables are errors, never silently ignored.

use crate::document::normalizer::CollisionPolicy;
use crate::logging::default_log_level;
use crate::model::tenant::{normalize_tenant_name, validate_slug};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "CLINIC_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "CLINIC_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CLINIC_LOG_DIR";
pub const ENV_COLLISION_POLICY: &str = "CLINIC_DOCUMENT_COLLISION_POLICY";
pub const ENV_INITIAL_SLUG: &str = "INITIAL_CLINIC_SLUG";
pub const ENV_INITIAL_NAME: &str = "INITIAL_CLINIC_NAME";

const DEFAULT_DB_PATH: &str = "clinic.sqlite3";
const DEFAULT_INITIAL_SLUG: &str = "default";
const DEFAULT_INITIAL_NAME: &str = "Default Clinic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.key, self.message)
    }
}

impl Error for ConfigError {}

/// Tenant created by the provisioning bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialTenant {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub collision_policy: CollisionPolicy,
    pub initial_tenant: InitialTenant,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            collision_policy: CollisionPolicy::default(),
            initial_tenant: InitialTenant {
                slug: DEFAULT_INITIAL_SLUG.to_string(),
                name: DEFAULT_INITIAL_NAME.to_string(),
            },
        }
    }
}

impl RegistryConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level.to_ascii_lowercase();
        }

        if let Some(dir) = read(ENV_LOG_DIR) {
            let path = PathBuf::from(dir);
            if !path.is_absolute() {
                return Err(ConfigError {
                    key: ENV_LOG_DIR,
                    message: format!("must be an absolute path, got `{}`", path.display()),
                });
            }
            config.log_dir = Some(path);
        }

        if let Some(policy) = read(ENV_COLLISION_POLICY) {
            config.collision_policy = policy.parse().map_err(|message| ConfigError {
                key: ENV_COLLISION_POLICY,
                message,
            })?;
        }

        if let Some(slug) = read(ENV_INITIAL_SLUG) {
            validate_slug(&slug).map_err(|err| ConfigError {
                key: ENV_INITIAL_SLUG,
                message: err.to_string(),
            })?;
            config.initial_tenant.slug = slug;
        }

        if let Some(name) = read(ENV_INITIAL_NAME) {
            config.initial_tenant.name = normalize_tenant_name(&name).map_err(|err| ConfigError {
                key: ENV_INITIAL_NAME,
                message: err.to_string(),
            })?;
        }

        Ok(config)
    }
}

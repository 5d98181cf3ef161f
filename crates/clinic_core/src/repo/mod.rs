//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must run structural validation before persistence.
//! - Repositories only accept connections bootstrapped by `open_db*`.
//! - Constraint failures surface as semantic `RepoError` variants.

pub mod error;
pub mod patient_repo;
pub mod tenant_repo;

use crate::db::migrations::latest_version;
use crate::db::EXTRACT_DIGITS_SQL_FN;
use error::{RepoError, RepoResult};
use rusqlite::Connection;

/// Rejects connections that skipped migrations or function registration.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    conn.query_row(&format!("SELECT {EXTRACT_DIGITS_SQL_FN}('0');"), [], |_| Ok(()))
        .map_err(|_| RepoError::MissingSqlFunction(EXTRACT_DIGITS_SQL_FN))?;
    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

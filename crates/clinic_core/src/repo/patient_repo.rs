//! Patient repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide tenant-scoped CRUD over `patients` storage.
//! - Answer the digit-level collision lookup used by the save-time normalizer.
//!
//! # Invariants
//! - Write paths call `Patient::validate()` before SQL mutations.
//! - Writes persist `document` exactly as given; choosing that value is the
//!   normalizer's job, not the repository's.
//! - The partial unique index on `(tenant_id, document)` is reported as
//!   `RepoError::UniquenessViolation`.
//! - Updates never move a patient to another tenant.

use crate::db::EXTRACT_DIGITS_SQL_FN;
use crate::document::cpf::extract_digits;
use crate::document::normalizer::DocumentLookup;
use crate::model::patient::{Patient, PatientId, PatientProfile, PatientRecord};
use crate::model::tenant::TenantId;
use crate::repo::error::{constraint_kind, ConstraintKind, RepoError, RepoResult};
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PATIENT_SELECT_SQL: &str = "SELECT
    id,
    tenant_id,
    full_name,
    document,
    profile_json,
    active,
    created_at,
    updated_at
FROM patients";

/// Query options for listing patients of one tenant.
#[derive(Debug, Clone)]
pub struct PatientListQuery {
    pub tenant_id: TenantId,
    pub include_inactive: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl PatientListQuery {
    /// Active patients of `tenant_id`, unpaginated.
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            include_inactive: false,
            limit: None,
            offset: 0,
        }
    }
}

/// Repository interface for patient persistence.
pub trait PatientRepository: DocumentLookup {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId>;
    fn update_patient(&self, patient: &Patient) -> RepoResult<()>;
    fn get_patient(&self, id: PatientId) -> RepoResult<Option<PatientRecord>>;
    /// Ordered by `full_name ASC, id ASC`.
    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<PatientRecord>>;
    /// Finds patients in `tenant_id` whose stored document has the digits of
    /// `raw`, whatever formatting either side uses.
    fn find_by_document(&self, tenant_id: TenantId, raw: &str) -> RepoResult<Vec<PatientRecord>>;
}

/// SQLite-backed patient repository.
pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientRepository<'conn> {
    /// Constructs a repository from a connection opened via `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId> {
        patient.validate()?;
        let profile_json = encode_profile(&patient.profile)?;

        self.conn
            .execute(
                "INSERT INTO patients (
                    id,
                    tenant_id,
                    full_name,
                    document,
                    profile_json,
                    active
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    patient.id.to_string(),
                    patient.tenant_id.to_string(),
                    patient.full_name.trim(),
                    patient.document.as_str(),
                    profile_json,
                    bool_to_int(patient.active),
                ],
            )
            .map_err(|err| map_write_error(err, patient))?;

        Ok(patient.id)
    }

    fn update_patient(&self, patient: &Patient) -> RepoResult<()> {
        patient.validate()?;
        let profile_json = encode_profile(&patient.profile)?;

        let changed = self
            .conn
            .execute(
                "UPDATE patients
                 SET
                    full_name = ?1,
                    document = ?2,
                    profile_json = ?3,
                    active = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?5
                   AND tenant_id = ?6;",
                params![
                    patient.full_name.trim(),
                    patient.document.as_str(),
                    profile_json,
                    bool_to_int(patient.active),
                    patient.id.to_string(),
                    patient.tenant_id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, patient))?;

        if changed == 0 {
            return Err(RepoError::NotFound(patient.id));
        }

        Ok(())
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Option<PatientRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATIENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_patient_row(row)?));
        }
        Ok(None)
    }

    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<PatientRecord>> {
        let mut sql = format!("{PATIENT_SELECT_SQL} WHERE tenant_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(query.tenant_id.to_string())];

        if !query.include_inactive {
            sql.push_str(" AND active = 1");
        }

        sql.push_str(" ORDER BY full_name ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }

    fn find_by_document(&self, tenant_id: TenantId, raw: &str) -> RepoResult<Vec<PatientRecord>> {
        let digits = extract_digits(raw);
        if digits.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "{PATIENT_SELECT_SQL}
             WHERE tenant_id = ?1
               AND document <> ''
               AND {EXTRACT_DIGITS_SQL_FN}(document) = ?2
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![tenant_id.to_string(), digits])?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }
}

impl DocumentLookup for SqlitePatientRepository<'_> {
    fn find_document_collision(
        &self,
        tenant_id: TenantId,
        canonical: &str,
        exclude: PatientId,
    ) -> RepoResult<Option<PatientId>> {
        if canonical.is_empty() {
            return Ok(None);
        }

        // Exact match first so the unique index can answer the common case.
        let found: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT id
                     FROM patients
                     WHERE tenant_id = ?1
                       AND id <> ?3
                       AND document <> ''
                       AND (document = ?2 OR {EXTRACT_DIGITS_SQL_FN}(document) = ?2)
                     ORDER BY (document = ?2) DESC, created_at ASC, id ASC
                     LIMIT 1;"
                ),
                params![tenant_id.to_string(), canonical, exclude.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        found
            .map(|text| parse_uuid(&text, "patients.id"))
            .transpose()
    }
}

fn map_write_error(err: rusqlite::Error, patient: &Patient) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::Unique) => {
            warn!(
                "event=patient_write module=repo status=rejected reason=uniqueness_violation tenant_id={}",
                patient.tenant_id
            );
            RepoError::UniquenessViolation {
                tenant_id: patient.tenant_id,
            }
        }
        Some(ConstraintKind::ForeignKey) => RepoError::TenantNotFound(patient.tenant_id),
        Some(ConstraintKind::PrimaryKey) => {
            RepoError::InvalidData(format!("patient id already exists: {}", patient.id))
        }
        _ => err.into(),
    }
}

fn encode_profile(profile: &PatientProfile) -> RepoResult<String> {
    serde_json::to_string(profile)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode patient profile: {err}")))
}

fn parse_uuid(text: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<PatientRecord> {
    let id_text: String = row.get("id")?;
    let tenant_text: String = row.get("tenant_id")?;
    let profile_text: String = row.get("profile_json")?;
    let profile: PatientProfile = serde_json::from_str(&profile_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid profile json for patient `{id_text}`: {err}"
        ))
    })?;

    let patient = Patient {
        id: parse_uuid(&id_text, "patients.id")?,
        tenant_id: parse_uuid(&tenant_text, "patients.tenant_id")?,
        full_name: row.get("full_name")?,
        document: row.get("document")?,
        profile,
        active: int_to_bool(row.get("active")?, "patients.active")?,
    };
    patient.validate()?;

    Ok(PatientRecord {
        patient,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

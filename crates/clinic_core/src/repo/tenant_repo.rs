//! Tenant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist clinics (tenants) and resolve them by id or slug.
//! - Provide the idempotent get-or-create used by provisioning.
//!
//! # Invariants
//! - Slugs are validated before SQL and unique across all tenants.
//! - Deleting a tenant that still owns patients fails with `TenantInUse`;
//!   the foreign key uses `ON DELETE RESTRICT`.

use crate::model::tenant::{normalize_tenant_name, validate_slug, Tenant, TenantId};
use crate::repo::error::{constraint_kind, ConstraintKind, RepoError, RepoResult};
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const TENANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    slug,
    active,
    created_at,
    updated_at
FROM tenants";

/// Repository interface for tenant operations.
pub trait TenantRepository {
    /// Creates one active tenant and returns the stored row.
    fn create_tenant(&self, name: &str, slug: &str) -> RepoResult<Tenant>;
    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<Tenant>>;
    fn get_tenant_by_slug(&self, slug: &str) -> RepoResult<Option<Tenant>>;
    /// Ordered by `name ASC, slug ASC`.
    fn list_tenants(&self, include_inactive: bool) -> RepoResult<Vec<Tenant>>;
    /// Renames and/or (de)activates one tenant.
    fn update_tenant(&self, id: TenantId, name: &str, active: bool) -> RepoResult<Tenant>;
    /// Hard-deletes one tenant that owns no patients.
    fn delete_tenant(&self, id: TenantId) -> RepoResult<()>;
    /// Returns the tenant with `slug`, creating it when missing.
    ///
    /// The boolean is `true` when this call created the row.
    fn get_or_create_by_slug(&self, slug: &str, name: &str) -> RepoResult<(Tenant, bool)>;
}

/// SQLite-backed tenant repository.
pub struct SqliteTenantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTenantRepository<'conn> {
    /// Constructs a repository from a connection opened via `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn require_tenant(&self, id: TenantId) -> RepoResult<Tenant> {
        self.get_tenant(id)?.ok_or(RepoError::TenantNotFound(id))
    }
}

impl TenantRepository for SqliteTenantRepository<'_> {
    fn create_tenant(&self, name: &str, slug: &str) -> RepoResult<Tenant> {
        let name = normalize_tenant_name(name)?;
        validate_slug(slug)?;
        let id = Uuid::new_v4();

        self.conn
            .execute(
                "INSERT INTO tenants (id, name, slug, active) VALUES (?1, ?2, ?3, 1);",
                params![id.to_string(), name, slug],
            )
            .map_err(|err| match constraint_kind(&err) {
                Some(ConstraintKind::Unique) => RepoError::SlugTaken(slug.to_string()),
                _ => err.into(),
            })?;

        info!("event=tenant_create module=repo status=ok tenant_id={id} slug={slug}");
        self.require_tenant(id)
    }

    fn get_tenant(&self, id: TenantId) -> RepoResult<Option<Tenant>> {
        self.conn
            .query_row(
                &format!("{TENANT_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_tenant_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn get_tenant_by_slug(&self, slug: &str) -> RepoResult<Option<Tenant>> {
        self.conn
            .query_row(
                &format!("{TENANT_SELECT_SQL} WHERE slug = ?1;"),
                [slug],
                |row| Ok(parse_tenant_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_tenants(&self, include_inactive: bool) -> RepoResult<Vec<Tenant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TENANT_SELECT_SQL}
             WHERE (?1 = 1 OR active = 1)
             ORDER BY name ASC, slug ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_inactive)])?;
        let mut tenants = Vec::new();
        while let Some(row) = rows.next()? {
            tenants.push(parse_tenant_row(row)?);
        }
        Ok(tenants)
    }

    fn update_tenant(&self, id: TenantId, name: &str, active: bool) -> RepoResult<Tenant> {
        let name = normalize_tenant_name(name)?;
        let changed = self.conn.execute(
            "UPDATE tenants
             SET
                name = ?1,
                active = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![name, bool_to_int(active), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::TenantNotFound(id));
        }
        self.require_tenant(id)
    }

    fn delete_tenant(&self, id: TenantId) -> RepoResult<()> {
        let owns_patients: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE tenant_id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if owns_patients {
            return Err(RepoError::TenantInUse(id));
        }

        // The foreign key still guards writers racing the check above.
        let changed = self
            .conn
            .execute("DELETE FROM tenants WHERE id = ?1;", [id.to_string()])
            .map_err(|err| match constraint_kind(&err) {
                Some(ConstraintKind::ForeignKey) => RepoError::TenantInUse(id),
                _ => err.into(),
            })?;

        if changed == 0 {
            return Err(RepoError::TenantNotFound(id));
        }

        info!("event=tenant_delete module=repo status=ok tenant_id={id}");
        Ok(())
    }

    fn get_or_create_by_slug(&self, slug: &str, name: &str) -> RepoResult<(Tenant, bool)> {
        if let Some(existing) = self.get_tenant_by_slug(slug)? {
            return Ok((existing, false));
        }

        match self.create_tenant(name, slug) {
            Ok(created) => Ok((created, true)),
            // Another writer created the slug between lookup and insert.
            Err(RepoError::SlugTaken(_)) => self
                .get_tenant_by_slug(slug)?
                .map(|tenant| (tenant, false))
                .ok_or_else(|| RepoError::SlugTaken(slug.to_string())),
            Err(err) => Err(err),
        }
    }
}

fn parse_tenant_row(row: &Row<'_>) -> RepoResult<Tenant> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in tenants.id"))
    })?;

    Ok(Tenant {
        id,
        name: row.get("name")?,
        slug: row.get("slug")?,
        active: int_to_bool(row.get("active")?, "tenants.active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

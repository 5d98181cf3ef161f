//! Tenant provisioning and maintenance service.
//!
//! # Responsibility
//! - Create tenants with derived or explicit slugs.
//! - Provide the idempotent initial-tenant bootstrap.
//!
//! # Invariants
//! - Bootstrap never creates a second tenant for an existing slug.
//! - Tenant deletion is refused while patient records exist.

use crate::model::tenant::{slugify, Tenant, TenantId, TenantValidationError};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::tenant_repo::TenantRepository;
use log::info;

/// Result of an idempotent provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantProvisioning {
    pub tenant: Tenant,
    /// `false` when the slug already existed.
    pub created: bool,
}

/// Tenant service facade.
pub struct TenantService<R: TenantRepository> {
    repo: R,
}

impl<R: TenantRepository> TenantService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one tenant; the slug is derived from `name` when not given.
    pub fn create_tenant(&self, name: &str, slug: Option<&str>) -> RepoResult<Tenant> {
        let slug = match slug {
            Some(value) => value.trim().to_string(),
            None => slugify(name).ok_or_else(|| {
                RepoError::TenantValidation(TenantValidationError::InvalidSlug(name.to_string()))
            })?,
        };
        self.repo.create_tenant(name, &slug)
    }

    /// Ensures a tenant with `slug` exists, creating it with `name` if not.
    pub fn ensure_initial_tenant(&self, slug: &str, name: &str) -> RepoResult<TenantProvisioning> {
        let (tenant, created) = self.repo.get_or_create_by_slug(slug, name)?;
        info!(
            "event=tenant_bootstrap module=service status=ok slug={} created={}",
            tenant.slug, created
        );
        Ok(TenantProvisioning { tenant, created })
    }

    pub fn get_tenant(&self, id: TenantId) -> RepoResult<Option<Tenant>> {
        self.repo.get_tenant(id)
    }

    pub fn get_tenant_by_slug(&self, slug: &str) -> RepoResult<Option<Tenant>> {
        self.repo.get_tenant_by_slug(slug)
    }

    pub fn list_tenants(&self, include_inactive: bool) -> RepoResult<Vec<Tenant>> {
        self.repo.list_tenants(include_inactive)
    }

    pub fn rename_tenant(&self, id: TenantId, name: &str) -> RepoResult<Tenant> {
        let current = self.require(id)?;
        self.repo.update_tenant(id, name, current.active)
    }

    pub fn set_active(&self, id: TenantId, active: bool) -> RepoResult<Tenant> {
        let current = self.require(id)?;
        self.repo.update_tenant(id, &current.name, active)
    }

    /// Deletes an empty tenant.
    ///
    /// # Errors
    /// - `TenantInUse` while the tenant owns patient records.
    pub fn delete_tenant(&self, id: TenantId) -> RepoResult<()> {
        self.repo.delete_tenant(id)
    }

    fn require(&self, id: TenantId) -> RepoResult<Tenant> {
        self.repo
            .get_tenant(id)?
            .ok_or(RepoError::TenantNotFound(id))
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use fiscoerp_core::TenantId;
use fiscoerp_fiscal::{EmissionRecord, EmissionUpdate, ReferenceId};
use fiscoerp_sales::SaleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A record already exists for this reference id.
    #[error("emission record already exists: {0}")]
    Conflict(String),

    #[error("emission record not found: {0}")]
    NotFound(String),

    /// The backend could not serve the request.
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// Tenant-scoped store of Emission Records keyed by reference id.
///
/// Records are never deleted. `update` merges a transition patch with the
/// same rules the aggregate uses (`EmissionRecord::merge`), so the stored
/// record and the in-memory aggregate never diverge.
#[async_trait]
pub trait EmissionRegistry: Send + Sync {
    /// `createEmissionRecord(referenceId, saleId)`.
    async fn create(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        sale_id: SaleId,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError>;

    /// `updateEmissionRecord(referenceId, {status, message?, ...})`.
    async fn update(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        update: &EmissionUpdate,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError>;

    /// `getEmissionRecord(referenceId)`; `None` is NotFound.
    async fn get(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<Option<EmissionRecord>, RegistryError>;

    /// Every record ever created for a sale, oldest first.
    async fn find_by_sale(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<Vec<EmissionRecord>, RegistryError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<EmissionRecord>, RegistryError>;
}

#[async_trait]
impl<R> EmissionRegistry for Arc<R>
where
    R: EmissionRegistry + ?Sized,
{
    async fn create(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        sale_id: SaleId,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError> {
        (**self).create(tenant_id, reference, sale_id, at).await
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        update: &EmissionUpdate,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError> {
        (**self).update(tenant_id, reference, update, at).await
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<Option<EmissionRecord>, RegistryError> {
        (**self).get(tenant_id, reference).await
    }

    async fn find_by_sale(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<Vec<EmissionRecord>, RegistryError> {
        (**self).find_by_sale(tenant_id, sale_id).await
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<EmissionRecord>, RegistryError> {
        (**self).list(tenant_id).await
    }
}

//! Inputs the emission consumes: the sale and the tenant's company data.
//!
//! Both live in the ERP's registries, outside this workspace.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use fiscoerp_core::TenantId;
use fiscoerp_parties::Emitter;
use fiscoerp_sales::{Sale, SaleId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("fiscal data source error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait FiscalDataSource: Send + Sync {
    async fn sale(&self, tenant_id: TenantId, sale_id: SaleId) -> Result<Option<Sale>, SourceError>;

    /// Company registration (emitente) for the tenant.
    async fn emitter(&self, tenant_id: TenantId) -> Result<Option<Emitter>, SourceError>;
}

#[async_trait]
impl<S> FiscalDataSource for Arc<S>
where
    S: FiscalDataSource + ?Sized,
{
    async fn sale(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<Option<Sale>, SourceError> {
        (**self).sale(tenant_id, sale_id).await
    }

    async fn emitter(&self, tenant_id: TenantId) -> Result<Option<Emitter>, SourceError> {
        (**self).emitter(tenant_id).await
    }
}

/// In-memory source for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryFiscalSource {
    sales: RwLock<HashMap<(TenantId, SaleId), Sale>>,
    emitters: RwLock<HashMap<TenantId, Emitter>>,
}

impl InMemoryFiscalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the sale under its own `tenant_id`.
    pub fn insert_sale(&self, sale: Sale) {
        if let Ok(mut sales) = self.sales.write() {
            sales.insert((sale.tenant_id, sale.id), sale);
        }
    }

    pub fn set_emitter(&self, tenant_id: TenantId, emitter: Emitter) {
        if let Ok(mut emitters) = self.emitters.write() {
            emitters.insert(tenant_id, emitter);
        }
    }
}

fn poisoned() -> SourceError {
    SourceError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl FiscalDataSource for InMemoryFiscalSource {
    async fn sale(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<Option<Sale>, SourceError> {
        let sales = self.sales.read().map_err(|_| poisoned())?;
        Ok(sales.get(&(tenant_id, sale_id)).cloned())
    }

    async fn emitter(&self, tenant_id: TenantId) -> Result<Option<Emitter>, SourceError> {
        let emitters = self.emitters.read().map_err(|_| poisoned())?;
        Ok(emitters.get(&tenant_id).cloned())
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fiscoerp_core::TenantId;
use fiscoerp_fiscal::{EmissionRecord, EmissionUpdate, ReferenceId};
use fiscoerp_sales::SaleId;

use super::r#trait::{EmissionRegistry, RegistryError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    tenant_id: TenantId,
    reference: ReferenceId,
}

/// In-memory tenant-isolated registry.
///
/// Intended for tests/dev and the demo binary. Not durable.
#[derive(Debug, Default)]
pub struct InMemoryEmissionRegistry {
    records: RwLock<HashMap<RecordKey, EmissionRecord>>,
}

impl InMemoryEmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RegistryError {
    RegistryError::Backend("registry lock poisoned".to_string())
}

#[async_trait]
impl EmissionRegistry for InMemoryEmissionRegistry {
    async fn create(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        sale_id: SaleId,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let key = RecordKey {
            tenant_id,
            reference,
        };
        if records.contains_key(&key) {
            return Err(RegistryError::Conflict(reference.to_string()));
        }

        let record = EmissionRecord::pending(tenant_id, reference, sale_id, at);
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        update: &EmissionUpdate,
        at: DateTime<Utc>,
    ) -> Result<EmissionRecord, RegistryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(&RecordKey {
                tenant_id,
                reference,
            })
            .ok_or_else(|| RegistryError::NotFound(reference.to_string()))?;

        record.merge(update, at);
        Ok(record.clone())
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<Option<EmissionRecord>, RegistryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .get(&RecordKey {
                tenant_id,
                reference,
            })
            .cloned())
    }

    async fn find_by_sale(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<Vec<EmissionRecord>, RegistryError> {
        let mut found: Vec<EmissionRecord> = self
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|r| r.sale_id == sale_id)
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<EmissionRecord>, RegistryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .iter()
            .filter_map(|(k, v)| (k.tenant_id == tenant_id).then(|| v.clone()))
            .collect())
    }
}

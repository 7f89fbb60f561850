use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fiscoerp_core::money::round_money;
use fiscoerp_core::{AggregateId, TenantId};
use fiscoerp_parties::Customer;

/// Sale identifier (tenant-scoped via `tenant_id`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub AggregateId);

impl SaleId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sale line item: one product or service with quantity and unit value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_code: String,
    pub description: String,
    /// NCM classification; the mapper falls back to a generic code.
    #[serde(default)]
    pub ncm: Option<String>,
    /// CFOP override; the mapper defaults to an in-state sale.
    #[serde(default)]
    pub cfop: Option<String>,
    /// Commercial unit (UN, KG, CX...).
    pub unit: String,
    pub quantity: Decimal,
    pub unit_value: Decimal,
    /// Gross value as stored on the sale, if any. Must match
    /// `quantity * unit_value` rounded to cents.
    #[serde(default)]
    pub gross_value: Option<Decimal>,
}

impl SaleItem {
    /// `quantity * unit_value`, rounded to cents. `None` when the product
    /// does not fit in a `Decimal`.
    pub fn computed_gross(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_value).map(round_money)
    }
}

/// A confirmed sale ready for fiscal emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub tenant_id: TenantId,
    pub customer: Customer,
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub freight: Decimal,
    #[serde(default)]
    pub insurance: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    /// Total as recorded on the sale (valor total).
    pub total: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl Sale {
    /// Sum of the items' computed gross values.
    pub fn products_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.computed_gross()?))
    }

    /// Total implied by items, freight, insurance and discount.
    pub fn expected_total(&self) -> Option<Decimal> {
        self.products_total()?
            .checked_add(self.freight)?
            .checked_add(self.insurance)?
            .checked_sub(self.discount)
            .map(round_money)
    }
}

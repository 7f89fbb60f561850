use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::tax_id::TaxId;

/// Buyer as recorded on the sale's customer registry entry.
///
/// Only `name` is required; the document mapper substitutes placeholders for
/// whatever address data is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<TaxId>,
    #[serde(default)]
    pub state_registration: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: None,
            state_registration: None,
            address: Address::default(),
            phone: None,
            email: None,
        }
    }

    pub fn with_tax_id(mut self, tax_id: TaxId) -> Self {
        self.tax_id = Some(tax_id);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }
}

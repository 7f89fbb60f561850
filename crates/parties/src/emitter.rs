use serde::{Deserialize, Serialize};

use fiscoerp_core::{DomainError, DomainResult};

use crate::address::{Address, non_blank};
use crate::tax_id::TaxId;

/// The issuing company (emitente), supplied once per tenant.
///
/// Treated as read-only for the duration of an emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emitter {
    /// Razão social.
    pub legal_name: String,
    /// Nome fantasia.
    #[serde(default)]
    pub trade_name: Option<String>,
    pub cnpj: TaxId,
    /// Inscrição estadual.
    pub state_registration: String,
    /// Inscrição municipal.
    #[serde(default)]
    pub municipal_registration: Option<String>,
    pub address: Address,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Emitter {
    /// Check that every field the provider requires for the emitter is present.
    ///
    /// Reports all missing fields at once so the operator can fix the company
    /// registration in one pass.
    pub fn validate(&self) -> DomainResult<()> {
        let mut missing: Vec<&'static str> = Vec::new();

        if self.legal_name.trim().is_empty() {
            missing.push("legal_name");
        }
        if !self.cnpj.is_cnpj() {
            return Err(DomainError::validation("emitter tax id must be a CNPJ"));
        }
        if self.state_registration.trim().is_empty() {
            missing.push("state_registration");
        }

        let a = &self.address;
        let required = [
            ("address.street", &a.street),
            ("address.number", &a.number),
            ("address.district", &a.district),
            ("address.municipality", &a.municipality),
            ("address.state", &a.state),
        ];
        for (name, value) in required {
            if non_blank(value).is_none() {
                missing.push(name);
            }
        }
        if a.postal_code_digits().is_none() {
            missing.push("address.postal_code");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "emitter is missing mandatory fields: {}",
                missing.join(", ")
            )))
        }
    }
}

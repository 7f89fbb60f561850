//! Local workflow state vs. remote provider status.
//!
//! The two are separate types on purpose: `EmissionStatus` is what this
//! system believes about an emission attempt, `ProviderStatus` is what the
//! provider last reported. `ProviderStatus::outcome` is the only bridge.

use serde::{Deserialize, Serialize};

/// Workflow state of an Emission Record.
///
/// ```text
/// pendente -> emitindo -> emitida -> cancelada
///                      -> erro -> pendente (retry)
///                      -> contingencia -> emitindo (resubmit / reconcile)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmissionStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "emitindo")]
    Emitting,
    /// Authorized by SEFAZ.
    #[serde(rename = "emitida")]
    Issued,
    #[serde(rename = "erro")]
    Error,
    /// Outcome unknown: the provider could not be reached.
    #[serde(rename = "contingencia")]
    Contingency,
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl EmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmissionStatus::Pending => "pendente",
            EmissionStatus::Emitting => "emitindo",
            EmissionStatus::Issued => "emitida",
            EmissionStatus::Error => "erro",
            EmissionStatus::Contingency => "contingencia",
            EmissionStatus::Cancelled => "cancelada",
        }
    }

    /// Whether artifacts (XML/DANFE) exist on the provider side.
    pub fn has_artifacts(&self) -> bool {
        matches!(self, EmissionStatus::Issued | EmissionStatus::Cancelled)
    }

    /// Whether a sale with a record in this state still holds a live document
    /// (or one that may exist).
    pub fn blocks_new_emission(&self) -> bool {
        !matches!(self, EmissionStatus::Cancelled)
    }
}

impl core::fmt::Display for EmissionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string reported by the provider (`status` field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderStatus {
    ProcessandoAutorizacao,
    Autorizado,
    ErroAutorizacao,
    Denegado,
    Cancelado,
    /// Anything this client does not know yet. Kept verbatim.
    Unknown(String),
}

/// What a provider status means for the local workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOutcome {
    Authorized,
    Rejected,
    /// No final answer yet; ask again later via status lookup.
    Processing,
    Cancelled,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderStatus::ProcessandoAutorizacao => "processando_autorizacao",
            ProviderStatus::Autorizado => "autorizado",
            ProviderStatus::ErroAutorizacao => "erro_autorizacao",
            ProviderStatus::Denegado => "denegado",
            ProviderStatus::Cancelado => "cancelado",
            ProviderStatus::Unknown(s) => s,
        }
    }

    /// Unknown statuses are treated as "still processing": they never count
    /// as success or failure until a later lookup says otherwise.
    pub fn outcome(&self) -> ProviderOutcome {
        match self {
            ProviderStatus::Autorizado => ProviderOutcome::Authorized,
            ProviderStatus::ErroAutorizacao | ProviderStatus::Denegado => ProviderOutcome::Rejected,
            ProviderStatus::Cancelado => ProviderOutcome::Cancelled,
            ProviderStatus::ProcessandoAutorizacao | ProviderStatus::Unknown(_) => {
                ProviderOutcome::Processing
            }
        }
    }
}

impl From<String> for ProviderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "processando_autorizacao" => ProviderStatus::ProcessandoAutorizacao,
            "autorizado" => ProviderStatus::Autorizado,
            "erro_autorizacao" => ProviderStatus::ErroAutorizacao,
            "denegado" => ProviderStatus::Denegado,
            "cancelado" => ProviderStatus::Cancelado,
            _ => ProviderStatus::Unknown(value),
        }
    }
}

impl From<ProviderStatus> for String {
    fn from(value: ProviderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_strings_map_to_outcomes() {
        let cases = [
            ("autorizado", ProviderOutcome::Authorized),
            ("erro_autorizacao", ProviderOutcome::Rejected),
            ("denegado", ProviderOutcome::Rejected),
            ("processando_autorizacao", ProviderOutcome::Processing),
            ("cancelado", ProviderOutcome::Cancelled),
        ];
        for (raw, outcome) in cases {
            let status = ProviderStatus::from(raw.to_string());
            assert_eq!(status.outcome(), outcome, "{raw}");
            assert_eq!(status.as_str(), raw);
        }
    }

    #[test]
    fn unknown_provider_status_is_kept_and_not_final() {
        let status: ProviderStatus = serde_json::from_str("\"em_digitacao\"").unwrap();
        assert_eq!(status, ProviderStatus::Unknown("em_digitacao".to_string()));
        assert_eq!(status.outcome(), ProviderOutcome::Processing);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"em_digitacao\"");
    }

    #[test]
    fn emission_status_serializes_in_portuguese() {
        assert_eq!(serde_json::to_string(&EmissionStatus::Issued).unwrap(), "\"emitida\"");
        assert_eq!(
            serde_json::from_str::<EmissionStatus>("\"contingencia\"").unwrap(),
            EmissionStatus::Contingency
        );
        assert_eq!(EmissionStatus::Emitting.to_string(), "emitindo");
    }
}

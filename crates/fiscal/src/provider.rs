//! Provider response contract and artifact kinds.

use serde::{Deserialize, Serialize};

use crate::status::{ProviderOutcome, ProviderStatus};

/// Status record returned by submit, status lookup and cancellation.
///
/// Only `status` is guaranteed; everything else appears as the document
/// progresses (e.g. `chave_nfe` once authorized).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub status: ProviderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_sefaz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mensagem_sefaz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chave_nfe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caminho_xml_nota_fiscal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caminho_danfe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caminho_xml_cancelamento: Option<String>,
}

impl ProviderResult {
    /// A bare result with only a status, mostly useful in tests.
    pub fn with_status(status: ProviderStatus) -> Self {
        Self {
            reference: None,
            status,
            status_sefaz: None,
            mensagem_sefaz: None,
            chave_nfe: None,
            numero: None,
            serie: None,
            caminho_xml_nota_fiscal: None,
            caminho_danfe: None,
            caminho_xml_cancelamento: None,
        }
    }

    pub fn outcome(&self) -> ProviderOutcome {
        self.status.outcome()
    }

    /// Human-readable message: SEFAZ's when present, else the raw status.
    pub fn message(&self) -> String {
        match (&self.status_sefaz, &self.mensagem_sefaz) {
            (Some(code), Some(msg)) => format!("{code} - {msg}"),
            (None, Some(msg)) => msg.clone(),
            _ => self.status.as_str().to_string(),
        }
    }
}

/// Downloadable artifact of an issued document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Authorized NF-e XML.
    Xml,
    /// DANFE.
    Pdf,
}

impl ArtifactKind {
    /// Endpoint suffix (`/v2/nfe/{ref}.xml`).
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Xml => "xml",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Xml => "application/xml",
            ArtifactKind::Pdf => "application/pdf",
        }
    }
}

impl core::str::FromStr for ArtifactKind {
    type Err = fiscoerp_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(ArtifactKind::Xml),
            "pdf" => Ok(ArtifactKind::Pdf),
            other => Err(fiscoerp_core::DomainError::validation(format!(
                "artifact kind must be xml or pdf, got '{other}'"
            ))),
        }
    }
}

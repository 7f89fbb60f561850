//! Typed client for the Focus NFe API (NF-e endpoints, API v2).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/v2/nfe?ref={ref}` | Submit a document |
//! | GET    | `/v2/nfe/{ref}` | Current status |
//! | DELETE | `/v2/nfe/{ref}` | Cancel (`{justificativa}`) |
//! | GET    | `/v2/nfe/{ref}.xml` / `.pdf` | Artifact download |
//!
//! No business logic lives here. Non-2xx answers become
//! `FocusError::Provider`, missing answers `FocusError::Transport`.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fiscoerp_fiscal::{
    ArtifactKind, EmissionRequest, ProviderResult, ReferenceId, validate_justification,
};

use crate::config::{ConfigError, FocusConfig, FocusEnvironment, check_token};
use crate::error::FocusError;

const API_PREFIX: &str = "v2/nfe";

#[derive(Debug, Serialize)]
struct CancelRequest<'a> {
    justificativa: &'a str,
}

/// Error body shape: `{codigo, mensagem}`, sometimes with `erros[]`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    mensagem: Option<String>,
    #[serde(default)]
    erros: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    mensagem: Option<String>,
}

/// Client for the Focus NFe API.
#[derive(Debug, Clone)]
pub struct FocusClient {
    http: reqwest::Client,
    base_url: String,
    environment: FocusEnvironment,
}

impl FocusClient {
    /// Build a client; every request carries `Authorization: Basic base64(token:)`.
    pub fn new(config: FocusConfig) -> Result<Self, FocusError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let token_var = config.environment.token_var();
                check_token(config.environment, &config.token)?;
                let mut headers = HeaderMap::new();
                let mut auth = HeaderValue::from_str(&basic_auth(&config.token))
                    .map_err(|_| ConfigError::InvalidToken(token_var))?;
                auth.set_sensitive(true);
                headers.insert(AUTHORIZATION, auth);
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
                headers
            })
            .build()
            .map_err(|e| FocusError::Transport {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            environment: config.environment,
        })
    }

    pub fn environment(&self) -> FocusEnvironment {
        self.environment
    }

    /// Submit a document. `reference` is the provider's idempotency key.
    ///
    /// Calls `POST {base_url}/v2/nfe?ref={reference}`.
    pub async fn submit(
        &self,
        reference: &ReferenceId,
        request: &EmissionRequest,
    ) -> Result<ProviderResult, FocusError> {
        let endpoint = format!("POST /v2/nfe?ref={reference}");
        let encoded: String =
            url::form_urlencoded::byte_serialize(reference.to_string().as_bytes()).collect();
        let url = format!("{}/{}?ref={}", self.base_url, API_PREFIX, encoded);

        debug!(%reference, items = request.items.len(), "submitting NF-e");
        let resp = self.send(&endpoint, self.http.post(&url).json(request)).await?;
        decode(&endpoint, resp).await
    }

    /// Current provider status for `reference`.
    ///
    /// Calls `GET {base_url}/v2/nfe/{reference}`.
    pub async fn fetch_status(
        &self,
        reference: &ReferenceId,
    ) -> Result<ProviderResult, FocusError> {
        let endpoint = format!("GET /v2/nfe/{reference}");
        let url = format!("{}/{}/{}", self.base_url, API_PREFIX, reference);

        let resp = self.send(&endpoint, self.http.get(&url)).await?;
        decode(&endpoint, resp).await
    }

    /// Cancel an authorized document.
    ///
    /// The justification is checked before any request: fewer than 15 (or
    /// more than 255) characters fail with `FocusError::Validation`.
    ///
    /// Calls `DELETE {base_url}/v2/nfe/{reference}` with `{justificativa}`.
    pub async fn cancel(
        &self,
        reference: &ReferenceId,
        justification: &str,
    ) -> Result<ProviderResult, FocusError> {
        let justificativa = validate_justification(justification)?;

        let endpoint = format!("DELETE /v2/nfe/{reference}");
        let url = format!("{}/{}/{}", self.base_url, API_PREFIX, reference);
        let body = CancelRequest {
            justificativa: &justificativa,
        };

        let resp = self.send(&endpoint, self.http.delete(&url).json(&body)).await?;
        decode(&endpoint, resp).await
    }

    /// Download the authorized XML or the DANFE, unmodified.
    ///
    /// Calls `GET {base_url}/v2/nfe/{reference}.{xml|pdf}`.
    pub async fn download_artifact(
        &self,
        reference: &ReferenceId,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, FocusError> {
        let endpoint = format!("GET /v2/nfe/{reference}.{}", kind.extension());
        let url = format!("{}/{}/{}.{}", self.base_url, API_PREFIX, reference, kind.extension());

        let request = self.http.get(&url).header(ACCEPT, kind.content_type());
        let resp = self.send(&endpoint, request).await?;
        let bytes = resp.bytes().await.map_err(|e| FocusError::Transport {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        debug!(%reference, kind = kind.extension(), size = bytes.len(), "artifact downloaded");
        Ok(bytes.to_vec())
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FocusError> {
        let resp = request.send().await.map_err(|e| {
            warn!(endpoint, timeout = e.is_timeout(), error = %e, "Focus NFe unreachable");
            FocusError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            debug!(endpoint, http_status = status.as_u16(), "Focus NFe responded");
            return Ok(resp);
        }

        let body = resp
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
        let (code, message) = provider_message(status, &body);
        warn!(
            endpoint,
            http_status = status.as_u16(),
            code = ?code,
            %message,
            "Focus NFe rejected request"
        );

        Err(FocusError::Provider {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            code,
            message,
        })
    }
}

async fn decode(endpoint: &str, resp: reqwest::Response) -> Result<ProviderResult, FocusError> {
    resp.json().await.map_err(|e| FocusError::Decode {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

fn basic_auth(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{token}:")))
}

/// The provider's own message when present, else the HTTP status text.
fn provider_message(status: reqwest::StatusCode, body: &str) -> (Option<String>, String) {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let details: Vec<String> = parsed
        .erros
        .into_iter()
        .filter_map(|e| e.mensagem)
        .filter(|m| !m.trim().is_empty())
        .collect();

    let message = match parsed.mensagem.filter(|m| !m.trim().is_empty()) {
        Some(msg) => msg,
        None if !details.is_empty() => details.join("; "),
        None => format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ),
    };
    (parsed.codigo, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn basic_auth_uses_empty_password() {
        // base64("token123:")
        assert_eq!(basic_auth("token123"), "Basic dG9rZW4xMjM6");
    }

    #[test]
    fn client_refuses_token_mangled_after_config() {
        let mut config = FocusConfig::new(FocusEnvironment::Homologation, "token123").unwrap();
        config.token = "token\r\n123".to_string();
        let err = FocusClient::new(config).unwrap_err();
        assert!(matches!(
            err,
            FocusError::Config(ConfigError::InvalidToken("FOCUS_NFE_TOKEN_HOMOLOGACAO"))
        ));
    }

    #[test]
    fn provider_message_prefers_mensagem() {
        let (code, msg) = provider_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"codigo":"requisicao_invalida","mensagem":"CFOP inválido"}"#,
        );
        assert_eq!(code.as_deref(), Some("requisicao_invalida"));
        assert_eq!(msg, "CFOP inválido");
    }

    #[test]
    fn provider_message_joins_field_errors() {
        let (_, msg) = provider_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"erros":[{"campo":"cfop","mensagem":"CFOP inválido"},{"mensagem":"NCM inválido"}]}"#,
        );
        assert_eq!(msg, "CFOP inválido; NCM inválido");
    }

    #[test]
    fn provider_message_falls_back_to_status_text() {
        let (code, msg) = provider_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(code, None);
        assert_eq!(msg, "HTTP 502 Bad Gateway");
    }
}

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fiscoerp_fiscal::ReferenceId;
use fiscoerp_infra::EmissionError;

pub fn emission_error_to_response(err: EmissionError) -> axum::response::Response {
    let reference = err.reference();
    match err {
        EmissionError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        EmissionError::InvalidState(msg) => json_error(StatusCode::CONFLICT, "invalid_state", msg),
        EmissionError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        err @ EmissionError::Provider { .. } => reference_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "provider_rejected",
            err.to_string(),
            reference,
        ),
        err @ EmissionError::Transport { .. } => reference_error(
            StatusCode::GATEWAY_TIMEOUT,
            "provider_unreachable",
            err.to_string(),
            reference,
        ),
        EmissionError::Registry(e) => {
            tracing::error!("emission registry failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "registry_error", e.to_string())
        }
        EmissionError::Source(e) => {
            tracing::error!("fiscal data source failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "source_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Like `json_error`, plus the emission reference so the caller can retry
/// or reconcile it.
fn reference_error(
    status: StatusCode,
    code: &'static str,
    message: String,
    reference: Option<ReferenceId>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message,
            "reference": reference.map(|r| r.to_string()),
        })),
    )
        .into_response()
}

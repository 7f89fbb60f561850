use serde::Deserialize;

use fiscoerp_fiscal::EmissionRecord;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RequestEmissionRequest {
    pub sale_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelEmissionRequest {
    pub justificativa: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn emission_to_json(record: &EmissionRecord) -> serde_json::Value {
    serde_json::json!({
        "reference": record.reference.to_string(),
        "sale_id": record.sale_id.to_string(),
        "status": record.status.as_str(),
        "provider_status": record.provider_status.clone().map(String::from),
        "message": record.message,
        "access_key": record.access_key,
        "number": record.number,
        "series": record.series,
        "has_artifacts": record.status.has_artifacts(),
        "attempts": record.attempts,
        "version": record.version,
        "created_at": record.created_at.to_rfc3339(),
        "updated_at": record.updated_at.to_rfc3339(),
    })
}

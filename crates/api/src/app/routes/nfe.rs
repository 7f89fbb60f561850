use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use fiscoerp_core::AggregateId;
use fiscoerp_fiscal::{ArtifactKind, ReferenceId};
use fiscoerp_sales::SaleId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(request_emission).get(list_emissions))
        .route("/:reference", get(get_emission))
        .route("/:reference/retry", post(retry_emission))
        .route("/:reference/reconcile", post(reconcile_emission))
        .route("/:reference/cancel", post(cancel_emission))
        .route("/:reference/xml", get(download_xml))
        .route("/:reference/pdf", get(download_pdf))
}

fn parse_reference(raw: &str) -> Result<ReferenceId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "invalid emission reference",
        )
    })
}

pub async fn request_emission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::RequestEmissionRequest>,
) -> axum::response::Response {
    let sale_id: AggregateId = match body.sale_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sale id");
        }
    };

    match services
        .emissions
        .request_emission(tenant.tenant_id(), SaleId::new(sale_id))
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(dto::emission_to_json(&record))).into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn list_emissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.emissions.list(tenant.tenant_id()).await {
        Ok(records) => {
            let items: Vec<_> = records.iter().map(dto::emission_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn get_emission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(reference): Path<String>,
) -> axum::response::Response {
    let reference = match parse_reference(&reference) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.emissions.get(tenant.tenant_id(), reference).await {
        Ok(record) => (StatusCode::OK, Json(dto::emission_to_json(&record))).into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn retry_emission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(reference): Path<String>,
) -> axum::response::Response {
    let reference = match parse_reference(&reference) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.emissions.retry_emission(tenant.tenant_id(), reference).await {
        Ok(record) => (StatusCode::OK, Json(dto::emission_to_json(&record))).into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn reconcile_emission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(reference): Path<String>,
) -> axum::response::Response {
    let reference = match parse_reference(&reference) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services
        .emissions
        .reconcile_emission(tenant.tenant_id(), reference)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::emission_to_json(&record))).into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn cancel_emission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(reference): Path<String>,
    Json(body): Json<dto::CancelEmissionRequest>,
) -> axum::response::Response {
    let reference = match parse_reference(&reference) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services
        .emissions
        .cancel_emission(tenant.tenant_id(), reference, &body.justificativa)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::emission_to_json(&record))).into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

pub async fn download_xml(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    reference: Path<String>,
) -> axum::response::Response {
    download(services, tenant, reference, ArtifactKind::Xml).await
}

pub async fn download_pdf(
    services: Extension<Arc<AppServices>>,
    tenant: Extension<TenantContext>,
    reference: Path<String>,
) -> axum::response::Response {
    download(services, tenant, reference, ArtifactKind::Pdf).await
}

async fn download(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(reference): Path<String>,
    kind: ArtifactKind,
) -> axum::response::Response {
    let reference = match parse_reference(&reference) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services
        .emissions
        .download_artifact(tenant.tenant_id(), reference, kind)
        .await
    {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, kind.content_type())],
            bytes,
        )
            .into_response(),
        Err(e) => errors::emission_error_to_response(e),
    }
}

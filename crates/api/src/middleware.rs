use axum::{http::HeaderMap, http::StatusCode, middleware::Next, response::Response};

use fiscoerp_core::TenantId;

use crate::app::errors::json_error;
use crate::context::TenantContext;

/// Header carrying the tenant id. Authentication happens upstream.
pub const TENANT_HEADER: &str = "x-tenant-id";

pub async fn tenant_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let tenant_id = match extract_tenant(req.headers()) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    req.extensions_mut().insert(TenantContext::new(tenant_id));
    next.run(req).await
}

fn extract_tenant(headers: &HeaderMap) -> Result<TenantId, Response> {
    let missing = || {
        json_error(
            StatusCode::BAD_REQUEST,
            "missing_tenant",
            "X-Tenant-Id header is required",
        )
    };

    let value = headers.get(TENANT_HEADER).ok_or_else(missing)?;
    let value = value.to_str().map_err(|_| missing())?.trim();
    if value.is_empty() {
        return Err(missing());
    }

    value.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_tenant",
            "X-Tenant-Id must be a UUID",
        )
    })
}

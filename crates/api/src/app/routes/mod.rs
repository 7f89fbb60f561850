use axum::Router;

pub mod nfe;
pub mod system;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    Router::new().nest("/fiscal/nfe", nfe::router())
}

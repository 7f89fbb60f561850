use std::sync::Arc;

use anyhow::Context as _;

use fiscoerp_api::app::services::{self, SeedData};
use fiscoerp_focus::FocusConfig;
use fiscoerp_infra::EmissionServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fiscoerp_observability::init();

    let focus = FocusConfig::from_env().context("Focus NFe configuration")?;

    let seed = match std::env::var("FISCOERP_SEED_FILE") {
        Ok(path) => SeedData::load(std::path::Path::new(&path))?,
        Err(_) => {
            tracing::warn!("FISCOERP_SEED_FILE not set; no sales or emitters loaded");
            SeedData::default()
        }
    };

    let services = services::build_services(
        focus,
        Arc::new(seed.into_source()),
        EmissionServiceConfig::default(),
    )?;
    let app = fiscoerp_api::app::build_app(Arc::new(services));

    let addr = std::env::var("FISCOERP_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

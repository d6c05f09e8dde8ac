//! Visual governance auditor service.

use std::sync::Arc;

use anyhow::Context;

use phenoguard_server::api::auditor::{router, AuditorState};
use phenoguard_server::config::{ServiceConfig, DEFAULT_AUDITOR_PORT};
use phenoguard_vlm::{MockVisionClient, VisualPiiAuditor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    phenoguard_server::init_tracing();

    let config = ServiceConfig::from_env(DEFAULT_AUDITOR_PORT);
    // Only the mock client ships; a provider client plugs in through VisionClient.
    let auditor = VisualPiiAuditor::new(
        config.vlm_provider,
        config.vlm_api_key.clone(),
        Arc::new(MockVisionClient),
    );

    let app = router(AuditorState::new(auditor));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model = %config.vlm_provider, "Governance auditor listening");
    axum::serve(listener, app).await?;
    Ok(())
}

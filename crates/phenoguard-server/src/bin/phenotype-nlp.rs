//! Phenotype NLP service.

use anyhow::Context;

use phenoguard_core::phenotype::VteExtractor;
use phenoguard_server::api::phenotype::{router, PhenotypeState};
use phenoguard_server::config::{ServiceConfig, DEFAULT_NLP_PORT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    phenoguard_server::init_tracing();

    let config = ServiceConfig::from_env(DEFAULT_NLP_PORT);
    let extractor = VteExtractor::new(config.extractor_config());
    let db = config
        .open_database()
        .context("failed to open findings database")?;

    let app = router(PhenotypeState::new(extractor, db));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model = %config.nlp_model, "Phenotype NLP service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

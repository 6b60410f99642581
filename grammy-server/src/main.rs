// Binary-only modules (not part of the library)
mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use grammy_llm::LlmConfig;
use grammy_server::{llm_checker, router, AppState};

use crate::cli::Args;
use crate::logging::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = LlmConfig::from_env()
        .context("set GRAMMY_LLM_API_KEY (or OPENAI_API_KEY) to run the server")?;
    let checker = llm_checker(config).context("failed to build LLM client")?;

    let app = router(AppState::new(Arc::new(checker)));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

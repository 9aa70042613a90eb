//! Crossrank CLI entrypoint.
//!
//! Reads one JSON request from stdin, reranks it with the backend described
//! by the `CROSSRANK_*` environment, and prints the ranked results as JSON.
//!
//! ```text
//! {"query": "...", "documents": ["...", "..."], "top_k": 3}
//! ```
//!
//! `--health-check` only probes the configured backend and exits non-zero
//! when it is not ready.

use std::io::Read;

use anyhow::Context;
use mimalloc::MiMalloc;
use serde::Deserialize;

use crossrank::{RerankContext, Reranker, RerankerConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Deserialize)]
struct RerankRequest {
    query: String,
    documents: Vec<String>,
    #[serde(default)]
    top_k: usize,
    /// Overrides `CROSSRANK_THRESHOLD` when present.
    #[serde(default)]
    threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = RerankerConfig::from_env()?;
    tracing::info!(
        strategy = config.strategy.as_str(),
        model = %config.model_name,
        "Crossrank starting"
    );

    let reranker = Reranker::from_config(&config).context("failed to build reranker")?;

    if std::env::args().any(|arg| arg == "--health-check") {
        let healthy = reranker.health().await;
        reranker.close()?;
        return match healthy {
            Ok(()) => {
                println!("ok");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Health check failed");
                std::process::exit(1);
            }
        };
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read request from stdin")?;
    let request: RerankRequest =
        serde_json::from_str(&input).context("request is not valid JSON")?;

    let ctx = RerankContext::with_timeout(config.timeout);
    let threshold = request.threshold.unwrap_or(config.threshold);

    let results = reranker
        .rerank_with_threshold(
            &ctx,
            &request.query,
            request.documents.as_slice(),
            request.top_k,
            threshold,
        )
        .await?;

    tracing::info!(
        documents = request.documents.len(),
        returned = results.len(),
        "Rerank complete"
    );

    println!("{}", serde_json::to_string_pretty(&results)?);

    reranker.close()?;
    Ok(())
}

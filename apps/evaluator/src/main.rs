mod config;
mod db;
mod dispatch;
mod errors;
mod llm_client;
mod models;
mod ports;
mod queue;
mod routes;
mod state;
mod workflow;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{apply_schema, create_pool};
use crate::dispatch::DispatchGate;
use crate::llm_client::LlmClient;
use crate::ports::portfolio::GithubPortfolioAnalyzer;
use crate::ports::resume::LlmResumeExtractor;
use crate::ports::store::PgStore;
use crate::queue::{JobRunner, PgJobQueue, QueueWorker, WorkerConfig};
use crate::routes::build_router;
use crate::state::AppState;
use crate::workflow::WorkflowExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; a missing required variable stops startup here
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting evaluator v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db).await?;

    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let store = Arc::new(PgStore::new(db.clone()));
    let resumes = Arc::new(LlmResumeExtractor::new(llm.clone()));
    let portfolios = Arc::new(
        GithubPortfolioAnalyzer::new(
            llm,
            config.github_api_url.clone(),
            config.github_token.clone(),
        )
        .context("failed to build GitHub client")?,
    );

    let executor = Arc::new(WorkflowExecutor::new(
        resumes,
        portfolios,
        store.clone(),
        config.stage_timeout,
    ));
    info!("Workflow ready (stage timeout {:?})", config.stage_timeout);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let queue = Arc::new(PgJobQueue::new(db));
    let runner =
        JobRunner::new(queue.clone(), store.clone(), executor).with_shutdown(shutdown_rx.clone());
    let gate = DispatchGate::new(runner.clone(), config.dispatch_mode);
    info!("Dispatch mode: {}", config.dispatch_mode);

    let worker = QueueWorker::new(
        runner,
        WorkerConfig {
            idle_backoff_min: config.queue_poll_min,
            idle_backoff_max: config.queue_poll_max,
        },
    );
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let state = AppState {
        repo: store,
        queue,
        gate,
        upload_dir: config.resume_upload_dir.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped; waiting for queue worker");
    shutdown_tx.send(true).ok();
    worker_handle.await.context("queue worker task failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

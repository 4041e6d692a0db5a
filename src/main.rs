use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use diet_core::constants::{DEFAULT_DATASET_PATH, DEFAULT_MODEL_PATH, DEFAULT_TABLES_PATH};
use diet_core::{CoreConfig, ServiceContext, model_mode_from_env_value};

/// Main entry point for the diet inference service
///
/// Resolves configuration, loads the model and feature tables, then serves the REST API.
/// Any startup failure exits before the listener is bound.
///
/// # Environment Variables
/// - `DIET_MODEL_PATH`: classifier artifact (default: "model/ayur_model.json")
/// - `DIET_MODEL_MODE`: "estimator" or "pipeline" (default: "estimator")
/// - `DIET_DATASET_PATH`: reference dataset CSV (default: "model/reference_dataset.csv")
/// - `DIET_TABLES_PATH`: persisted feature tables (default: "model/feature_tables.yaml")
/// - `DIET_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ayurdiet_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("diet_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::new(
        env_path("DIET_MODEL_PATH", DEFAULT_MODEL_PATH),
        model_mode_from_env_value(std::env::var("DIET_MODEL_MODE").ok())?,
        env_path("DIET_DATASET_PATH", DEFAULT_DATASET_PATH),
        env_path("DIET_TABLES_PATH", DEFAULT_TABLES_PATH),
    )?;
    let ctx = Arc::new(ServiceContext::initialise(&cfg)?);

    let rest_addr = std::env::var("DIET_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    tracing::info!("++ Starting diet inference REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(AppState { ctx })).await?;

    Ok(())
}

fn env_path(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
        .into()
}

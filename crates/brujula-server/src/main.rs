//! Interactive La Brújula dashboard over HTTP.

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use brujula_core::loader::SchemaPolicy;
use brujula_core::{Dashboard, DashboardConfig};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brujula-server", about = "Serve the La Brújula territorial dashboard")]
struct Args {
    /// JSON configuration file (every field optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consolidated GeoJSON feature collection
    #[arg(long)]
    data: Option<PathBuf>,

    /// Narrative sidecar with metrics and conclusions
    #[arg(long)]
    narrative: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<String>,

    /// Skip absent score columns instead of refusing to start
    #[arg(long)]
    lenient: bool,
}

impl Args {
    fn into_config(self) -> Result<DashboardConfig> {
        let mut config = DashboardConfig::load_or_default(self.config.as_deref()).context("loading configuration")?;
        if let Some(data) = self.data {
            config.data = data;
        }
        if let Some(narrative) = self.narrative {
            config.narrative = Some(narrative);
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if self.lenient {
            config.schema = SchemaPolicy::Lenient;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config()?;
    let bind = config.bind.clone();
    let data = config.data.clone();

    let (dashboard, report) =
        Dashboard::open(config).with_context(|| format!("loading dashboard data from {}", data.display()))?;
    if report.dropped_features > 0 || !report.missing_columns.is_empty() {
        warn!(
            dropped = report.dropped_features,
            missing_columns = report.missing_columns.len(),
            "serving with an incomplete feature table"
        );
    }
    for (scale, rows) in dashboard.scale_counts() {
        info!(scale = %scale, rows, "scale ready");
    }

    let app = routes::router(Arc::new(dashboard));
    let listener = tokio::net::TcpListener::bind(&bind).await.with_context(|| format!("binding {bind}"))?;
    info!("listening on http://{bind}");

    tokio::select! {
        r = axum::serve(listener, app) => { r.context("server error")?; },
        _ = signal::ctrl_c() => { info!("shutdown signal received"); }
    }
    Ok(())
}

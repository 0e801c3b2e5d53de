//! Static reports over the La Brújula feature table: a self-contained HTML
//! page, the JSON view model for one selection, or a data check.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use brujula_core::loader::{LoadReport, SchemaPolicy};
use brujula_core::render::render_page;
use brujula_core::{Dashboard, DashboardConfig, ViewRequest};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "report", about = "Render or check La Brújula dashboard data without a server")]
struct Cli {
    /// JSON configuration file (every field optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Consolidated GeoJSON feature collection
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Narrative sidecar with metrics and conclusions
    #[arg(long, global = true)]
    narrative: Option<PathBuf>,

    /// Skip absent score columns instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the HTML page for one selection
    Page {
        #[arg(short, long, default_value = "brujula.html")]
        out: PathBuf,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Print the JSON view model for one selection
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Validate the data file and print row counts per scale
    Check,
}

#[derive(Args, Debug, Default)]
struct SelectionArgs {
    /// Scale key (e.g. municipio-santa-maria)
    #[arg(long)]
    scale: Option<String>,
    #[arg(long)]
    locality: Option<String>,
    /// Dimension key or "consolidated"
    #[arg(long)]
    tab: Option<String>,
    /// rights | public-works | social-organization | norms
    #[arg(long)]
    indicator: Option<String>,
    /// Variable code to map (e.g. op-b3)
    #[arg(long)]
    variable: Option<String>,
    /// Base map name
    #[arg(long)]
    tile: Option<String>,
}

impl From<SelectionArgs> for ViewRequest {
    fn from(a: SelectionArgs) -> Self {
        ViewRequest {
            scale: a.scale,
            locality: a.locality,
            tab: a.tab,
            indicator: a.indicator,
            variable: a.variable,
            tile: a.tile,
        }
    }
}

// ── Check output ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CheckOutput<'a> {
    data: String,
    load: &'a LoadReport,
    scales: Vec<ScaleCount>,
}

#[derive(Serialize)]
struct ScaleCount {
    key: String,
    rows: usize,
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::load_or_default(cli.config.as_deref()).context("loading configuration")?;
    if let Some(data) = cli.data {
        config.data = data;
    }
    if let Some(narrative) = cli.narrative {
        config.narrative = Some(narrative);
    }
    if cli.lenient {
        config.schema = SchemaPolicy::Lenient;
    }
    let data = config.data.clone();

    let (dashboard, load) =
        Dashboard::open(config).with_context(|| format!("loading dashboard data from {}", data.display()))?;

    match cli.command {
        Command::Page { out, selection } => {
            let view = dashboard.view(&selection.into());
            let html = render_page(&view, &dashboard.page_context());
            fs::write(&out, html).with_context(|| format!("writing {}", out.display()))?;
            info!(out = %out.display(), rows = view.rows, "page written");
        }
        Command::Summary { selection } => {
            let view = dashboard.view(&selection.into());
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Check => {
            let scales = dashboard
                .scale_counts()
                .into_iter()
                .map(|(key, rows)| ScaleCount { key, rows })
                .collect();
            let output = CheckOutput { data: data.display().to_string(), load: &load, scales };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn selection_flags_map_onto_request() {
        let cli = Cli::try_parse_from([
            "report", "--lenient", "page", "--out", "x.html", "--scale", "localidades", "--variable", "op-b3",
        ])
        .unwrap();
        assert!(cli.lenient);
        let Command::Page { out, selection } = cli.command else { panic!("expected page") };
        assert_eq!(out, PathBuf::from("x.html"));
        let request: ViewRequest = selection.into();
        assert_eq!(request.scale.as_deref(), Some("localidades"));
        assert_eq!(request.variable.as_deref(), Some("op-b3"));
        assert_eq!(request.tab, None);
    }

    #[test]
    fn check_takes_no_selection() {
        let cli = Cli::try_parse_from(["report", "check", "--data", "d.geojson"]).unwrap();
        assert!(matches!(cli.command, Command::Check));
        assert_eq!(cli.data, Some(PathBuf::from("d.geojson")));
    }
}

//! CLI entry point for the GTFS-RT mock editor.
//!
//! Provides subcommands for inspecting a feed (header, entity counts,
//! estimated operating region) and for applying an edit script to its
//! alerts to produce a mock feed for tests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gtfs_rt_mocker::{
    assembler, cluster, codec,
    fetch::{BasicClient, fetch_bytes},
    geocode,
    model::incrementality_label,
    output::{InspectRecord, append_record, print_json},
    script::{self, EditOp},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_mocker")]
#[command(about = "Inspect GTFS-RT feeds and build edited mock feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a feed and report its header, entity counts, and fleet center
    Inspect {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to append the inspection record to (JSON log otherwise)
        #[arg(short, long)]
        output: Option<String>,

        /// Reverse-geocode the estimated fleet center to a place label
        #[arg(long, default_value_t = false)]
        region: bool,
    },
    /// Apply a JSON edit script to a feed's alerts and write the mock feed
    Edit {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// JSON edit script to apply to the alert entities
        #[arg(short, long)]
        script: String,

        /// File to write the re-encoded mock feed to
        #[arg(short, long, default_value = "mock.pb")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_rt_mocker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_mocker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            source,
            output,
            region,
        } => inspect(&source, output.as_deref(), region).await?,
        Commands::Edit {
            source,
            script,
            output,
        } => edit(&source, &script, &output).await?,
    }

    Ok(())
}

async fn inspect(source: &str, output: Option<&str>, region: bool) -> Result<()> {
    let bytes = fetcher(source).await?;
    let feed = codec::decode(&bytes)?;

    info!(
        gtfs_version = %feed.header.gtfs_version,
        feed_timestamp = feed.header.timestamp,
        entities = feed.entities.len(),
        vehicles = feed.summary.vehicles,
        trip_updates = feed.summary.trip_updates,
        alerts = feed.summary.alerts,
        "Feed decoded"
    );
    if let Some(value) = feed.header.incrementality {
        info!(
            incrementality = incrementality_label(value).unwrap_or("unknown"),
            raw = value,
            "Header incrementality"
        );
    }

    let positions = cluster::extract_positions(&feed.entities);
    let center = cluster::robust_center(&positions);
    match center {
        Some(c) => info!(
            lat = c.lat,
            lon = c.lon,
            samples = positions.len(),
            "Estimated fleet center"
        ),
        None => info!("No usable vehicle positions, skipping center estimate"),
    }

    let region_label = match (region, center) {
        (true, Some(c)) => {
            let client = BasicClient::new();
            match geocode::reverse_geocode(&client, c.lat, c.lon).await {
                Ok(label) => label,
                Err(e) => {
                    warn!(error = %e, "Reverse geocoding failed");
                    None
                }
            }
        }
        _ => None,
    };
    if let Some(ref label) = region_label {
        info!(region = %label, "Operating region");
    }

    let record = InspectRecord::from_feed(source, &feed)
        .with_center(center)
        .with_region(region_label);
    match output {
        Some(path) => append_record(path, &record)?,
        None => print_json(&record)?,
    }

    Ok(())
}

async fn edit(source: &str, script_path: &str, output: &str) -> Result<()> {
    let bytes = fetcher(source).await?;
    let feed = codec::decode(&bytes)?;

    let script_text = std::fs::read_to_string(script_path)
        .with_context(|| format!("reading edit script {script_path}"))?;
    let ops: Vec<EditOp> = serde_json::from_str(&script_text).context("parsing edit script")?;

    let alerts: Vec<_> = feed
        .entities
        .iter()
        .filter(|e| e.alert.is_some())
        .cloned()
        .collect();
    info!(alerts = alerts.len(), ops = ops.len(), "Applying edit script");

    let edited = script::apply(&alerts, &ops)?;
    let mock = assembler::assemble(&feed, edited);
    let encoded = codec::encode(&mock);

    std::fs::write(output, &encoded).with_context(|| format!("writing {output}"))?;
    info!(
        path = output,
        bytes = encoded.len(),
        vehicles = mock.summary.vehicles,
        trip_updates = mock.summary.trip_updates,
        alerts = mock.summary.alerts,
        "Mock feed written"
    );

    Ok(())
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };
    Ok(bytes)
}

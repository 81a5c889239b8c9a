use std::sync::Arc;

use clap::Parser;
use tracing::Level;

use courtcast_api::HttpConferenceApi;
use courtcast_hub::ServerConfig;
use courtcast_telemetry::{init_telemetry, TelemetryConfig};

/// Real-time event hub for remote court hearings.
#[derive(Parser, Debug)]
#[command(name = "courtcast", version, about)]
struct Cli {
    /// Port to listen on (0 picks a free port)
    #[arg(long, default_value_t = 9290)]
    port: u16,

    /// Base URL of the conference details API
    #[arg(long, default_value = "http://localhost:9300/api")]
    conference_api_url: String,

    /// Group name back-office connections join
    #[arg(long, default_value = "hearing-officers")]
    officers_group: String,

    /// Per-client send queue capacity
    #[arg(long, default_value_t = 256)]
    max_send_queue: usize,

    /// Log verbosity
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit human-readable logs instead of JSON lines
    #[arg(long)]
    plain_logs: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = init_telemetry(TelemetryConfig {
        log_level: cli.log_level,
        module_levels: Vec::new(),
        json_output: !cli.plain_logs,
    });

    tracing::info!(
        conference_api_url = %cli.conference_api_url,
        officers_group = %cli.officers_group,
        "Starting courtcast hub"
    );

    let api = Arc::new(HttpConferenceApi::new(cli.conference_api_url));

    let config = ServerConfig {
        port: cli.port,
        max_send_queue: cli.max_send_queue,
        officers_group: cli.officers_group,
        ..Default::default()
    };

    let handle = courtcast_hub::start(config, api)
        .await
        .expect("Failed to start server");

    tracing::info!(port = handle.port, "Courtcast hub ready");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}

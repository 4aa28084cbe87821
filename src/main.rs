//! Fan-out Relay — real-time broadcast chat server
//!
//! Clients connect over WebSocket, every inbound message is rebroadcast to
//! every connected client, and membership changes are announced as a live
//! online count.
//!
//! Usage:
//!   fanout-relay                                 # Default port 8080
//!   fanout-relay --port 9000                     # Custom port
//!   fanout-relay --hostname 0.0.0.0              # Listen on all interfaces
//!   fanout-relay --send-timeout-ms 5000          # Bound each broadcast write

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use relay_hub::HubConfig;
use relay_protocol::WELCOME_TEXT;
use relay_transport::{TransportConfig, TransportServer};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fanout-relay", about = "Fan-out Relay — broadcast chat over WebSocket")]
struct Cli {
    /// Port to listen on (0 for OS-assigned)
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Hostname to bind to
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// WebSocket URL advertised by the home page (defaults to the bind address)
    #[arg(long)]
    public_url: Option<String>,

    /// Maximum concurrent connections (unlimited if not set)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Write deadline for each broadcast send, in milliseconds
    #[arg(long)]
    send_timeout_ms: Option<u64>,

    /// Private greeting sent to each new connection
    #[arg(long, default_value = WELCOME_TEXT)]
    welcome: String,

    /// Enable permissive CORS
    #[arg(long)]
    enable_cors: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    if let Some(ref log_path) = cli.log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match std::fs::OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .init();
                eprintln!("Logging to {}", log_path.display());
                return;
            }
            Err(e) => eprintln!("Failed to open log file {}: {e}", log_path.display()),
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        public_url: cli.public_url.clone(),
        enable_cors: cli.enable_cors,
        max_connections: cli.max_connections,
        hub: HubConfig {
            welcome_text: cli.welcome.clone(),
            send_timeout: cli.send_timeout_ms.map(Duration::from_millis),
        },
    };

    let mut transport = match TransportServer::start(config).await {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to start relay: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("  Fan-out Relay");
    println!();
    println!("  Page:       http://{}:{}/", cli.hostname, transport.port());
    println!("  Socket:     {}", transport.endpoint());
    match cli.send_timeout_ms {
        Some(ms) => println!("  Send limit: {ms} ms"),
        None => println!("  Send limit: none (a stalled client blocks broadcasts)"),
    }
    println!();
    println!("  Press Ctrl+C to stop.");
    println!();

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
    }

    println!();
    println!("  Shutting down...");
    transport.stop().await;
    println!("  Server stopped.");
}

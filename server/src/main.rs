use clap::Parser;
use log::info;
use server::config::{load_track, ServerConfig};
use server::simulation::SimulationServer;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of vehicles that must connect before the race starts
    #[arg(short = 'n', long)]
    vehicles: Option<usize>,

    /// Countdown in seconds before the go signal
    #[arg(short, long)]
    countdown: Option<u64>,

    /// ASCII track map ('#' border, '.' track, '1'-'3' sectors); defaults to the built-in ring
    #[arg(short, long)]
    track: Option<PathBuf>,

    /// Pixels per map character
    #[arg(long, default_value = "1")]
    track_scale: u32,

    /// JSON configuration file; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(vehicles) = args.vehicles {
        config.vehicles = vehicles;
    }
    if let Some(countdown) = args.countdown {
        config.countdown_secs = countdown;
    }

    let track = load_track(args.track.as_deref(), args.track_scale, &config.vehicle)?;
    info!(
        "Starting race for {} vehicles on {}",
        config.vehicles,
        config.address()
    );

    let mut server = SimulationServer::bind(config, Arc::new(track)).await?;

    // Handle shutdown gracefully
    let outcome = tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    };
    outcome?;

    Ok(())
}

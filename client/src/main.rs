use clap::{Parser, ValueEnum};
use client::connection::RaceClient;
use client::policy::{Policy, RandomDriver, WallFollower};
use client::run_episode;
use log::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    Wall,
    Random,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Session id announced to the server
    #[arg(short, long, default_value = "0")]
    id: String,

    /// Number of episodes to drive
    #[arg(short, long, default_value = "1")]
    episodes: u32,

    /// Actions per episode before giving up on a crash
    #[arg(short, long, default_value = "1000")]
    max_steps: u32,

    /// Driving policy
    #[arg(short, long, value_enum, default_value = "wall")]
    policy: PolicyKind,

    /// Seed for the random policy
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut policy: Box<dyn Policy> = match args.policy {
        PolicyKind::Wall => Box::new(WallFollower::default()),
        PolicyKind::Random => Box::new(RandomDriver::new(args.seed)),
    };

    info!("Connecting to: {}", args.server);
    let mut client = RaceClient::connect(&args.server, &args.id).await?;

    let mut best = f64::NEG_INFINITY;
    for episode in 1..=args.episodes {
        let report = run_episode(&mut client, policy.as_mut(), args.max_steps).await?;
        best = best.max(report.reward);
        info!("Episode {}/{} done", episode, args.episodes);
    }
    info!("Best episode reward: {:.2}", best);

    client.close().await?;
    Ok(())
}

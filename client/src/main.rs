use clap::Parser;
use client::network::Client;
use log::info;
use shared::DummyColor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Number of dummies requested by the batch key
    #[arg(short = 'b', long, default_value = "10")]
    batch: u32,

    /// Color for spawned dummies as "r,g,b" (0..1), random when omitted
    #[arg(short = 'c', long)]
    color: Option<DummyColor>,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: 1 spawn one dummy, 2 spawn a batch of {}, 3 delete own dummies", args.batch);
    info!("          O toggle overlay, Escape to quit");

    let mut client = Client::new(&args.server, args.batch, args.color, args.width, args.height).await?;

    client.run().await?;

    Ok(())
}

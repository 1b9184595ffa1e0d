use clap::Parser;
use log::{info, warn};
use server::network::Server;
use server::spawner::{DummySpawner, DummyTemplate};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (simulation updates per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value = "32")]
    max_clients: usize,

    /// Path to the dummy template JSON file
    #[arg(long, default_value = "dummy_template.json")]
    template: PathBuf,

    /// Maximum number of dummies a single spawn request may create
    #[arg(long, default_value = "100")]
    max_spawn_per_request: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let template = match DummyTemplate::load(&args.template) {
        Ok(template) => Some(template),
        Err(e) => {
            warn!(
                "Could not load dummy template from {}: {}",
                args.template.display(),
                e
            );
            warn!("Spawn requests will be ignored until a template is configured");
            None
        }
    };

    let spawner = DummySpawner::new(template, args.max_spawn_per_request);

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate as f32);

    info!("Starting server on {} at {}Hz", address, args.tick_rate);

    let mut server = Server::new(&address, tick_duration, args.max_clients, spawner).await?;
    server.run().await?;

    Ok(())
}

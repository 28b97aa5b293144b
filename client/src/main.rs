use clap::Parser;
use client::network;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Delay before reconnecting after the connection drops, in milliseconds
    #[arg(short = 'r', long, default_value = "2000")]
    reconnect_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Server: {}", args.server);

    let reconnect_delay = Duration::from_millis(args.reconnect_ms);
    let mut client = network::Client::new(&args.server, reconnect_delay)?;
    info!("Endpoint: {}", client.endpoint());

    client.run().await?;

    Ok(())
}

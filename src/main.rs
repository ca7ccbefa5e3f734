use clap::{Parser, Subcommand};
use pylon::cmd::{consume, produce};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the synthetic event producer.
    Produce,
    /// Runs the multi-topic consumer.
    Consume(consume::ConsumeArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Produce => produce::execute().await?,
        Commands::Consume(args) => consume::execute(args).await?,
    }

    Ok(())
}

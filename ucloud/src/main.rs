use clap::Parser;
use tracing_subscriber::EnvFilter;
use ucloud::cli::Cli;
use ucloud::diagnostics::error_chain;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("ucloud-cdn: {}", error_chain(&e));
        std::process::exit(1);
    }
}

use clap::Parser;
use snipsync::cli::Snipsync;
use snipsync::commands::handle_command;
use snipsync::Config;
use std::process;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SNIPSYNC_LOG";

fn main() {
    let args = Snipsync::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(handle_command(args.commands, config)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

//! devreg CLI - signed-request harness for the device registration API

use clap::Parser;

mod cli;
mod output;

use cli::{Cli, Commands, GlobalOptions};
use devreg::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug output; otherwise honour RUST_LOG, defaulting to warn
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Register { profile_id } => cli::device::register(&opts, &profile_id).await,
        Commands::Logout { profile_id } => cli::device::logout(&opts, &profile_id).await,
        Commands::Status => cli::status::run(&opts).await,
        Commands::Version => {
            println!("devreg version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

mod cli;
mod commands;

use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.global.debug { "debug" } else { "warn" };
    // Flushes the log file on drop
    let _log_guard = match &cli.global.log_dir {
        Some(dir) => match procreg::util::init_file_logging(dir, level) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            procreg::util::init_logging(level);
            None
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Summary(args) => commands::summary::execute(args, &cli.global).await,
        Commands::Report(args) => commands::report::execute(args, &cli.global).await,
        Commands::Complete(args) => commands::complete::execute(args, &cli.global).await,
        Commands::List(args) => commands::list::execute(args, &cli.global).await,
        Commands::Replay(args) => commands::replay::execute(args, &cli.global).await,
    }
}

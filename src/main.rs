//! Booking pipeline entry point

use booking_pipeline::cli::{cmd_ingest, cmd_process, cmd_run, cmd_train, Cli, Commands};
use booking_pipeline::config::paths::LOG_DIR;
use booking_pipeline::logging;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.root.join(LOG_DIR);
    if let Err(e) = logging::init(&log_dir) {
        logging::init_stdout();
        tracing::warn!(error = %e, "File logging unavailable, logging to stdout only");
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            cmd_run(&cli)?;
        }
        Commands::Ingest => {
            cmd_ingest(&cli)?;
        }
        Commands::Process => {
            cmd_process(&cli)?;
        }
        Commands::Train => {
            cmd_train(&cli)?;
        }
    }

    Ok(())
}

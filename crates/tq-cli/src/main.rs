use tq_core::{config, logging};

mod cli;

use crate::cli::CliCommand;

fn main() {
    // A broken config is reported by the command itself; logging still starts.
    let filter = config::load_or_init().ok().and_then(|cfg| cfg.log_filter);
    if let Err(err) = logging::init_logging(filter.as_deref()) {
        logging::init_logging_stderr(filter.as_deref());
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("tq error: {:#}", err);
        std::process::exit(1);
    }
}

//! CLI for inspecting and pruning a tunequeue queue directory.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tq_core::config;

use commands::{run_cancel, run_clean, run_clear, run_config, run_parse, run_status};

/// Top-level CLI for tunequeue.
#[derive(Debug, Parser)]
#[command(name = "tq")]
#[command(about = "tunequeue: persistent download queue maintenance", long_about = None)]
pub struct Cli {
    /// Queue directory to operate on instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    pub queue_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show every item in the queue.
    Status {
        /// Print the raw snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Remove one item; a running item is flagged for cancellation.
    Cancel {
        /// Item id, e.g. `album_302127_9`.
        uuid: String,
    },

    /// Remove every item and empty the queue order.
    Clear,

    /// Remove completed items. Failed and partial ones stay.
    Clean,

    /// Show how a link would be classified.
    Parse {
        /// Catalog link or URI.
        link: String,
    },

    /// Show the config file location and effective values.
    Config,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let queue_dir = match cli.queue_dir {
            Some(dir) => dir,
            None => cfg.queue_dir()?,
        };

        match cli.command {
            CliCommand::Status { json } => run_status(&queue_dir, json)?,
            CliCommand::Cancel { uuid } => run_cancel(&queue_dir, &uuid)?,
            CliCommand::Clear => run_clear(&queue_dir)?,
            CliCommand::Clean => run_clean(&queue_dir)?,
            CliCommand::Parse { link } => run_parse(&link)?,
            CliCommand::Config => run_config(&cfg, &queue_dir)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

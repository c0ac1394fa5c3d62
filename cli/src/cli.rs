//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_FILE;

/// Provision a Linode with a boot/swap/system disk layout and boot it into rescue mode
#[derive(Parser)]
#[command(
    name = "linode-prep",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file
    #[arg(
        long,
        global = true,
        env = "LINODE_PREP_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also disabled when `NO_COLOR` is set)
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a Linode, its disks and config profile, then reboot into rescue mode
    Create(commands::create::CreateArgs),

    /// Show the resolved configuration without contacting Linode
    Plan(commands::plan::PlanArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Flags shared by every command.
    #[must_use]
    pub fn app_flags(&self) -> AppFlags {
        AppFlags {
            config: self.config.clone(),
            no_color: self.no_color,
            quiet: self.quiet,
            json: self.json,
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, app: &AppContext) -> Result<()> {
        match self.command {
            Command::Create(args) => commands::create::run(&args, app).await,
            Command::Plan(args) => commands::plan::run(&args, app),
            Command::Version => {
                commands::version::run(app.is_json());
                Ok(())
            }
        }
    }
}

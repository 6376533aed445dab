pub mod daemon_path;
pub mod dashboard;
pub mod output;
pub mod process;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use daemon_path::to_daemon_path;
use dashboard::{process_dashboard_command, DashboardCommand};
use process::kill_running_daemons;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::start_daemon,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tabwatch", version, long_about = None)]
#[command(about = "Daemon and cli for tracking time spent on websites", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Display the productivity dashboard for a time window")]
    Dashboard {
        #[command(flatten)]
        command: DashboardCommand,
    },
    #[command(
        about = "Run the daemon directly in the current console, reading extension messages from stdin. The browser normally starts tabwatch-daemon itself"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop a currently running daemon.")]
    Stop {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let application_dir = create_application_default_path()?;
    enable_logging(CLI_PREFIX, &application_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Stop {} => {
            let cli_name = env::current_exe().expect("Can't operate without an executable");
            kill_running_daemons(&to_daemon_path(cli_name));
            Ok(())
        }
        Commands::Serve { dir } => {
            let dir = dir.unwrap_or(application_dir);
            start_daemon(dir).await?;
            Ok(())
        }
        Commands::Dashboard { command } => process_dashboard_command(command).await,
    }
}

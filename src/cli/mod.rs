pub mod actions;
pub mod daemon_path;
pub mod process;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::{
    config::WorkdayConfig,
    monitor::start_monitor,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Workday", version, long_about = None)]
#[command(about = "Track your work day: sessions, breaks, idle time, and the daily target", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the work day, detecting the work location")]
    Start {
        #[arg(long, help = "Override the detected work location")]
        location: Option<String>,
        #[arg(long, help = "Start time as HH:MM. Defaults to now")]
        at: Option<String>,
    },
    #[command(about = "Finish the work day and print the summary")]
    Finish,
    #[command(about = "Take a break")]
    Break {
        #[arg(long, help = "What the break is for")]
        note: Option<String>,
    },
    #[command(about = "Recompute and display today's summary")]
    Status,
    #[command(about = "Set the manual adjustment added on top of tracked time")]
    Adjust {
        #[arg(help = "Adjustment as HH:MM")]
        value: String,
    },
    #[command(about = "Starts the monitoring daemon for the application")]
    Init,
    #[command(
        about = "Run the monitor directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve,
    #[command(about = "Stop the currently running daemon.")]
    Stop {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let config = WorkdayConfig::load_or_default(&app_dir)?;

    match args.commands {
        Commands::Start { location, at } => {
            actions::start_work(&app_dir, &config, location, at).await
        }
        Commands::Finish => actions::finish_work(&app_dir, &config).await,
        Commands::Break { note } => actions::take_break(&app_dir, &config, note).await,
        Commands::Status => actions::show_status(&app_dir, &config).await,
        Commands::Adjust { value } => actions::adjust(&app_dir, &config, &value).await,
        Commands::Init => process::restart_daemon(),
        Commands::Serve => start_monitor(app_dir, config).await,
        Commands::Stop {} => {
            let daemon = daemon_path::to_daemon_path(env::current_exe()?);
            process::kill_previous_daemons(&daemon);
            Ok(())
        }
    }
}

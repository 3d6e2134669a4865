pub mod presets;
pub mod process;
pub mod settings;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use presets::{process_preset_command, PresetCommand, PresetOutcome};
use process::{current_executable, kill_previous_servers, restart_server, running_servers};
use settings::{is_known_timezone, print_status, SetCommand};
use sysinfo::System;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    notification::GenericNotifier,
    scheduler::{start_service, ReminderScheduler, DEFAULT_POLL_INTERVAL},
    settings::{
        entities::Settings,
        store::{JsonSettingsStore, SettingsStore},
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX, SERVICE_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "clock-reminder", version, long_about = None)]
#[command(about = "Reminds you to clock in and clock out", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/clock-reminder, ~/Library/Application Support/clock-reminder or %APPDATA%\\clock-reminder"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Enable reminders and start the background service")]
    Start,
    #[command(about = "Disable reminders and stop the background service")]
    Stop,
    #[command(about = "Show a test notification right away")]
    Test,
    #[command(about = "Change clock-in/clock-out times, time format or timezone")]
    Set {
        #[command(flatten)]
        command: SetCommand,
    },
    #[command(about = "Show current settings and the reminder day counter")]
    Status,
    #[command(about = "Save, load or list presets")]
    Preset {
        #[command(subcommand)]
        command: PresetCommand,
    },
    #[command(
        about = "Run the service directly in current console. Used for starting the service internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
            help = "Seconds between checks, at most 60"
        )]
        poll_interval: u64,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Serve { .. } => SERVICE_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    let store = JsonSettingsStore::new(app_dir.clone())?;

    match args.commands {
        Commands::Serve { poll_interval } => {
            start_service(app_dir, Duration::from_secs(poll_interval)).await
        }
        Commands::Start => {
            modify_settings(&app_dir, &store, |settings| {
                settings.validate()?;
                settings.running = true;
                Ok(())
            })
            .await?;
            println!("Reminders started");
            Ok(())
        }
        Commands::Stop => {
            modify_settings(&app_dir, &store, |settings| {
                settings.running = false;
                Ok(())
            })
            .await?;
            println!("Reminders stopped");
            Ok(())
        }
        Commands::Test => {
            let (sender, _receiver) = mpsc::channel(1);
            let scheduler = ReminderScheduler::new(
                store.load().await,
                Arc::new(store),
                Arc::new(GenericNotifier::new()),
                Arc::new(DefaultClock),
                sender,
            );
            scheduler.test_notify().await?;
            println!("Test notification sent");
            Ok(())
        }
        Commands::Set { command } => {
            if command.is_empty() {
                bail!("Nothing to change, see `clock-reminder set --help`");
            }
            let settings =
                modify_settings(&app_dir, &store, |settings| Ok(command.apply(settings)?)).await?;
            if !is_known_timezone(&settings.timezone) {
                warn!("Unknown timezone {:?}", settings.timezone);
                println!(
                    "Timezone {:?} is unknown, reminders will use local time",
                    settings.timezone
                );
            }
            print_status(&settings, settings.running, DefaultClock.now_in(&settings.timezone));
            Ok(())
        }
        Commands::Status => {
            let settings = store.load().await;
            let system = System::new_all();
            let alive = !running_servers(&system, &current_executable()?)?.is_empty();
            print_status(&settings, alive, DefaultClock.now_in(&settings.timezone));
            Ok(())
        }
        Commands::Preset { command } => {
            if let PresetOutcome::Apply { name, preset } =
                process_preset_command(command, &store).await?
            {
                modify_settings(&app_dir, &store, |settings| {
                    preset.apply_to(settings);
                    Ok(settings.validate()?)
                })
                .await?;
                println!("Preset '{name}' loaded");
            }
            Ok(())
        }
    }
}

/// Settings are owned by the service while it runs, so it is stopped before they are read and
/// started again afterwards if reminders are enabled. Nothing is saved when `change` fails.
async fn modify_settings(
    app_dir: &Path,
    store: &JsonSettingsStore,
    change: impl FnOnce(&mut Settings) -> Result<()>,
) -> Result<Settings> {
    let (settings, outcome) = change_stopped(
        store,
        || kill_previous_servers(&current_executable()?),
        change,
    )
    .await?;

    if settings.running {
        restart_server(app_dir)?;
        info!("Service restarted");
    }
    outcome.map(|()| settings)
}

/// Runs `stop_service` first so whatever the service persists on exit is part of what `change`
/// sees. Returns the settings in effect afterwards together with the outcome of `change`.
async fn change_stopped(
    store: &impl SettingsStore,
    stop_service: impl FnOnce() -> Result<()>,
    change: impl FnOnce(&mut Settings) -> Result<()>,
) -> Result<(Settings, Result<()>)> {
    stop_service()?;
    let current = store.load().await;

    let mut updated = current.clone();
    let outcome = change(&mut updated);
    if outcome.is_err() {
        return Ok((current, outcome));
    }
    store.save(&updated).await;
    Ok((updated, outcome))
}

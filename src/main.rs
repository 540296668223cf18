use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use matrix_sdk::ruma::{OwnedRoomId, OwnedUserId, RoomId, UserId};
use roomwatch_matrix::{Room, RoomConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod dry_run;
mod replay;

use dry_run::DryRunApi;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Room settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a JSON-lines event log into a room and print its final state
    Replay {
        /// Room the events belong to
        #[arg(long, value_parser = parse_room_id)]
        room_id: OwnedRoomId,

        /// File with one client-server event per line
        events: PathBuf,

        /// Override the message age filter (ms, 0 disables it)
        #[arg(long)]
        max_age: Option<u64>,

        /// Include every delivered message in the printed summary
        #[arg(long)]
        messages: bool,
    },

    /// Issue one room command against a dry-run API that only logs it
    Send {
        /// Room to address
        #[arg(long, value_parser = parse_room_id)]
        room_id: OwnedRoomId,

        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand)]
enum Action {
    /// Rename the room
    Name { name: String },
    /// Change the room topic
    Topic { topic: String },
    /// Send a text message
    Text { body: String },
    /// Send a notice
    Notice { body: String },
    /// Invite a user
    Invite {
        #[arg(value_parser = parse_user_id)]
        user_id: OwnedUserId,
    },
    /// Leave the room
    Leave,
}

fn parse_room_id(value: &str) -> std::result::Result<OwnedRoomId, String> {
    RoomId::parse(value).map_err(|e| e.to_string())
}

fn parse_user_id(value: &str) -> std::result::Result<OwnedUserId, String> {
    UserId::parse(value).map_err(|e| e.to_string())
}

fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "roomwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = init_logging(cli.log_dir.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => RoomConfig::load(path)
            .with_context(|| format!("Failed to load room config {}", path.display()))?,
        None => RoomConfig::default(),
    };

    match cli.command {
        Commands::Replay { room_id, events, max_age, messages } => {
            if let Some(max_age) = max_age {
                config.max_message_age_ms = max_age;
            }
            let mut room = Room::with_config(room_id, Arc::new(DryRunApi::default()), &config);

            let file = std::fs::File::open(&events)
                .with_context(|| format!("Failed to open event log {}", events.display()))?;
            let summary = replay::run(&mut room, std::io::BufReader::new(file), messages)?;

            let output = serde_json::json!({
                "state": room.snapshot(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Send { room_id, action } => {
            let api = Arc::new(DryRunApi::default());
            let room = Room::with_config(room_id, api.clone(), &config);

            match action {
                Action::Name { name } => println!("{}", room.set_name(&name).await?),
                Action::Topic { topic } => println!("{}", room.set_topic(&topic).await?),
                Action::Text { body } => println!("{}", room.send_text(&body).await?),
                Action::Notice { body } => println!("{}", room.send_notice(&body).await?),
                Action::Invite { user_id } => room.invite(&user_id).await?,
                Action::Leave => room.leave().await?,
            }

            tracing::info!(requests = api.requests(), "Dry run complete");
        }
    }

    Ok(())
}

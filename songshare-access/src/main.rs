//! songshare - command-line front end for the access workflow
//!
//! Applies access-loss events against a songshare database, or prints the
//! plan they would produce with `--dry-run`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songshare_access::{store, AccessService, Plan};
use songshare_common::config::{database_path, resolve_root_folder, TomlConfig};
use songshare_common::db::init_database;
use tracing::info;
use uuid::Uuid;

/// Command-line arguments for songshare
#[derive(Parser, Debug)]
#[command(name = "songshare")]
#[command(about = "Keep private songbooks intact when shared songs become inaccessible")]
#[command(version)]
struct Args {
    /// Root folder containing the songshare database
    #[arg(short, long, env = "SONGSHARE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to ~/.config/songshare/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// A member leaves (or is removed from) a group
    LeaveGroup {
        /// Membership being deleted
        #[arg(long)]
        membership: Uuid,

        /// Print the plan as JSON without committing it
        #[arg(long)]
        dry_run: bool,
    },
    /// An admin removes a song from a group's shared library
    RemoveSong {
        /// Song share being deleted
        #[arg(long)]
        share: Uuid,

        /// Print the plan as JSON without committing it
        #[arg(long)]
        dry_run: bool,
    },
    /// List a user's notifications
    Notifications {
        #[arg(long)]
        user: Uuid,

        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Config outcome is logged once the subscriber exists
    let (config, config_source) = TomlConfig::locate(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    config_source.log();

    info!(
        "Starting songshare v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = database_path(&root_folder, &config);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let service = AccessService::new(pool);

    match args.command {
        Command::LeaveGroup { membership, dry_run: true } => {
            let plan = service
                .plan_leave_group(membership)
                .await
                .context("Failed to plan group departure")?;
            print_plan(&plan)?;
        }
        Command::LeaveGroup { membership, dry_run: false } => {
            let outcome = service
                .leave_group(membership)
                .await
                .context("Failed to leave group")?;
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
        }
        Command::RemoveSong { share, dry_run: true } => {
            let plan = service
                .plan_remove_song(share)
                .await
                .context("Failed to plan song removal")?;
            print_plan(&plan)?;
        }
        Command::RemoveSong { share, dry_run: false } => {
            let outcome = service
                .remove_song_from_group(share)
                .await
                .context("Failed to remove song from group")?;
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
        }
        Command::Notifications { user, unread } => {
            let notifications = store::list_notifications(service.pool(), user, unread)
                .await
                .context("Failed to load notifications")?;
            println!("{}", serde_json::to_string_pretty(&notifications)?);
        }
    }

    Ok(())
}

fn print_plan(plan: &Plan) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(plan)?);
    Ok(())
}

//! pairchat - terminal client for private two-party chat rooms
//!
//! Signs in against the chat service, lists your chats and joins a room
//! with live updates.

mod api;
mod auth;
mod config;
mod error;
mod live;
mod models;
mod room;
mod router;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use models::{ChatId, UserId};

#[derive(Parser)]
#[command(name = "pairchat")]
#[command(about = "Terminal client for private two-party chat rooms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Chat service base URL (overrides config)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Live endpoint template, e.g. ws://host:9000/ws/{chat_id} (overrides config)
    #[arg(long, global = true)]
    ws_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Show current authentication status
    Status,

    /// List your chats
    Chats,

    /// List users you can start a chat with
    Users,

    /// Start a chat with another user
    NewChat {
        /// User id (from `users` output)
        user_id: UserId,
    },

    /// Print the message history of a chat
    History {
        /// Chat id (from `chats` output)
        chat_id: ChatId,
    },

    /// Join a chat room with live updates
    Room {
        /// Chat id (from `chats` output)
        chat_id: ChatId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = config::Config::load()?.with_overrides(cli.server_url, cli.ws_url);

    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Signing in as {}...", email);
            auth::login(&config, &email, password).await?;
        }
        Commands::Logout => {
            auth::logout().await?;
        }
        Commands::Status => {
            auth::status(&config).await?;
        }
        Commands::Chats => {
            tracing::debug!("Fetching chats...");
            api::list_chats(&config).await?;
        }
        Commands::Users => {
            api::list_users(&config).await?;
        }
        Commands::NewChat { user_id } => {
            api::new_chat(&config, user_id).await?;
        }
        Commands::History { chat_id } => {
            room::show_history(&config, chat_id).await?;
        }
        Commands::Room { chat_id } => {
            room::run(&config, chat_id).await?;
        }
    }

    Ok(())
}

//! Session credentials and the entry gates for chat routes.

pub mod guard;
pub mod session;
pub mod tokens;

use anyhow::{Context, Result};

pub use guard::{authorize, Access, RoomPass};
pub use session::{Session, SessionContext};
pub use tokens::{StoredToken, TokenStore};

use crate::api::client::ChatClient;
use crate::config::Config;

/// Log in with email and password and persist the issued token.
pub async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password().await?,
    };

    let client = ChatClient::new(&config.server_url, None);
    let outcome = crate::api::login(&client, email, &password).await?;

    // Overrides from the command line are not persisted.
    let mut stored = Config::load()?;
    stored.set_access_token(StoredToken::from_jwt(outcome.token));
    stored.set_user(outcome.user.clone());
    stored.save()?;

    println!("{}", outcome.message);
    println!("Signed in as {} (id {}).", outcome.user.email, outcome.user.id);
    Ok(())
}

async fn prompt_password() -> Result<String> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Password: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Clear stored credentials
pub async fn logout() -> Result<()> {
    let mut config = Config::load()?;
    config.clear_tokens();
    config.save()?;
    println!("Logged out.");
    Ok(())
}

/// Display current auth status
pub async fn status(config: &Config) -> Result<()> {
    println!("Server:    {}", config.server_url);
    println!("Live:      {}", config.ws_url);

    match config.get_access_token() {
        Some(token) if !token.is_expired() => {
            println!("Token:     valid");
            if let Some(exp) = token.expires_at {
                println!("  expires_at: {}", exp);
            }
        }
        Some(_) => println!("Token:     expired"),
        None => println!("Token:     none"),
    }

    match config.get_user() {
        Some(user) => println!("User:      {} (id {})", user.email, user.id),
        None => println!("User:      none"),
    }

    Ok(())
}

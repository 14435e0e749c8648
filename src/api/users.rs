//! Users endpoints: login and the user directory

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::client::ChatClient;
use crate::error::StoreError;
use crate::models::{UserId, UserInfo};

#[derive(Debug, Deserialize)]
struct LoginResponse {
    message: String,
    token: Option<String>,
    user: Option<UserRecord>,
}

/// Server's `UserWithoutPassword`; the id is optional on the wire.
#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Option<UserId>,
    email: String,
}

/// Successful login: the issued token and who it belongs to.
#[derive(Debug)]
pub struct LoginOutcome {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

pub async fn login(client: &ChatClient, email: &str, password: &str) -> Result<LoginOutcome> {
    let body = serde_json::json!({ "email": email, "password": password });

    let resp = match client.post("users/login", &body).await {
        Ok(resp) => resp,
        Err(StoreError::Unauthorized) => bail!("Invalid email or password."),
        Err(e) => return Err(e).context("Login request failed"),
    };

    let login: LoginResponse = resp.json().await.context("Failed to parse login response")?;
    parse_login(login)
}

/// Everyone with an account, as returned by `GET users`.
pub async fn list_users_data(client: &ChatClient) -> Result<Vec<UserInfo>, StoreError> {
    let records: Vec<UserRecord> = client.get_json("users").await?;
    Ok(known_users(records))
}

pub async fn get_user(client: &ChatClient, id: UserId) -> Result<UserInfo, StoreError> {
    let record: UserRecord = client.get_json(&format!("users/{}", id)).await?;
    Ok(UserInfo {
        id: record.id.unwrap_or(id),
        email: record.email,
    })
}

/// Directory entries without an id cannot be chatted with and are skipped.
fn known_users(records: Vec<UserRecord>) -> Vec<UserInfo> {
    records
        .into_iter()
        .filter_map(|r| match r.id {
            Some(id) => Some(UserInfo { id, email: r.email }),
            None => {
                tracing::debug!("Skipping user {} without id", r.email);
                None
            }
        })
        .collect()
}

pub fn print_users(users: &[UserInfo], me: UserId) {
    println!("\nUsers:");
    println!("{:-<60}", "");

    let others: Vec<_> = users.iter().filter(|u| u.id != me).collect();
    if others.is_empty() {
        println!("  (no other users)");
        return;
    }
    for user in others {
        println!("{:>6}  {}", user.id, user.email);
    }
    println!();
    println!("Start a chat with `pairchat new-chat <id>`.");
}

fn parse_login(login: LoginResponse) -> Result<LoginOutcome> {
    let token = login.token.context("Login response missing 'token'")?;
    let user = login.user.context("Login response missing 'user'")?;
    let id = user.id.context("Login response missing user id")?;

    Ok(LoginOutcome {
        message: login.message,
        token,
        user: UserInfo {
            id,
            email: user.email,
        },
    })
}

//! User-related models

use serde::{Deserialize, Serialize};

use super::UserId;

/// Logged-in user profile (server's `UserWithoutPassword`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
}

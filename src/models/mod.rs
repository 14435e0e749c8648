//! Data models for chats, messages and users

mod chat;
mod ids;
mod message;
mod user;

pub use chat::*;
pub use ids::*;
pub use message::*;
pub use user::*;

//! Chat room the bot reads commands from and reports into.

mod webex;

pub use webex::{DEFAULT_API_URL, Room, WebexClient};

use std::future::Future;

use serde::Deserialize;

use crate::error::GatewayError;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub person_email: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
}

/// Messaging API used by the bot.
pub trait MessagingGateway: Send + Sync {
    /// Latest message in the room, if the room has any.
    fn poll_latest_message(
        &self,
    ) -> impl Future<Output = Result<Option<Message>, GatewayError>> + Send;

    /// Post a plain text message.
    fn post_text(&self, text: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Upload a file with a caption.
    fn post_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

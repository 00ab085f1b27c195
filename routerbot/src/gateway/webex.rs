//! Webex messages API.

use log::debug;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Message, MessagingGateway};
use crate::error::GatewayError;

/// Public Webex API endpoint.
pub const DEFAULT_API_URL: &str = "https://webexapis.com/v1";

#[derive(Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextMessage<'a> {
    room_id: &'a str,
    text: &'a str,
}

/// A Webex room, as listed by `GET /rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub room_type: String,
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Bearer-token client bound to one room.
pub struct WebexClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    room_id: String,
}

impl WebexClient {
    pub fn new(
        base_url: impl Into<String>,
        token: SecretString,
        room_id: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("routerbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            room_id: room_id.into(),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check(resp: &reqwest::Response) -> Result<(), GatewayError> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GatewayError::Status {
                status: status.as_u16(),
            })
        }
    }

    /// Rooms visible to the token, most recently active first.
    pub async fn list_rooms(&self, max: u32) -> Result<Vec<Room>, GatewayError> {
        let resp = self
            .http
            .get(self.url("rooms"))
            .bearer_auth(self.token.expose_secret())
            .query(&[("max", max.to_string())])
            .send()
            .await?;
        Self::check(&resp)?;

        Ok(resp.json::<Items<Room>>().await?.items)
    }
}

impl MessagingGateway for WebexClient {
    async fn poll_latest_message(&self) -> Result<Option<Message>, GatewayError> {
        let resp = self
            .http
            .get(self.url("messages"))
            .bearer_auth(self.token.expose_secret())
            .query(&[("roomId", self.room_id.as_str()), ("max", "1")])
            .send()
            .await?;
        Self::check(&resp)?;

        let messages = resp.json::<Items<Message>>().await?;
        Ok(messages.items.into_iter().next())
    }

    async fn post_text(&self, text: &str) -> Result<(), GatewayError> {
        debug!("Posting {:?}", text);
        let resp = self
            .http
            .post(self.url("messages"))
            .bearer_auth(self.token.expose_secret())
            .json(&TextMessage {
                room_id: &self.room_id,
                text,
            })
            .send()
            .await?;
        Self::check(&resp)
    }

    async fn post_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<(), GatewayError> {
        debug!("Uploading {} ({} bytes)", filename, bytes.len());
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/plain")?;
        let form = Form::new()
            .text("roomId", self.room_id.clone())
            .text("text", caption.to_string())
            .part("files", part);

        let resp = self
            .http
            .post(self.url("messages"))
            .bearer_auth(self.token.expose_secret())
            .multipart(form)
            .send()
            .await?;
        Self::check(&resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = WebexClient::new(
            "https://webexapis.com/v1/",
            SecretString::from("token".to_string()),
            "room",
        )
        .unwrap();
        assert_eq!(client.url("messages"), "https://webexapis.com/v1/messages");
    }

    #[test]
    fn test_message_json() {
        let items: Items<Message> = serde_json::from_str(
            r#"{"items": [{"id": "m1", "roomId": "r1", "text": "/66070315 restconf",
                "personEmail": "op@example.com", "created": "2026-10-19T08:00:00.000Z"}]}"#,
        )
        .unwrap();
        assert_eq!(items.items[0].text, "/66070315 restconf");
        assert_eq!(items.items[0].person_email.as_deref(), Some("op@example.com"));
    }

    #[test]
    fn test_message_without_text() {
        let message: Message = serde_json::from_str(r#"{"id": "m2"}"#).unwrap();
        assert!(message.text.is_empty());
    }
}

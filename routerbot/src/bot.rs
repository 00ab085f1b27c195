//! The polling loop.
//!
//! One message is handled completely, device calls and replies included,
//! before the room is polled again.

use std::time::Duration;

use log::{debug, info, warn};

use crate::device::{DeviceCli, InterfaceLifecycle};
use crate::dispatch::{Dispatcher, Reply, Session};
use crate::error::GatewayError;
use crate::export::BatchRunner;
use crate::gateway::MessagingGateway;

/// Polls the room and answers commands addressed to the operator.
pub struct Bot<G, R, N, C, B> {
    gateway: G,
    dispatcher: Dispatcher<R, N, C, B>,
    session: Session,
    last_seen: Option<String>,
    poll_interval: Duration,
}

impl<G, R, N, C, B> Bot<G, R, N, C, B>
where
    G: MessagingGateway,
    R: InterfaceLifecycle,
    N: InterfaceLifecycle,
    C: DeviceCli,
    B: BatchRunner,
{
    pub fn new(gateway: G, dispatcher: Dispatcher<R, N, C, B>, poll_interval: Duration) -> Self {
        Self {
            gateway,
            dispatcher,
            session: Session::new(),
            last_seen: None,
            poll_interval,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mark the room's current latest message as handled, so a restart does
    /// not replay the last command.
    pub async fn prime(&mut self) -> Result<(), GatewayError> {
        if let Some(message) = self.gateway.poll_latest_message().await? {
            debug!("Skipping message {} posted before start", message.id);
            self.last_seen = Some(message.id);
        }
        Ok(())
    }

    /// Poll once and handle the latest message if it is new.
    pub async fn tick(&mut self) -> Result<Option<Reply>, GatewayError> {
        let Some(message) = self.gateway.poll_latest_message().await? else {
            return Ok(None);
        };
        if self.last_seen.as_deref() == Some(message.id.as_str()) {
            return Ok(None);
        }
        self.last_seen = Some(message.id.clone());

        let reply = self
            .dispatcher
            .dispatch(&mut self.session, &message.text, &self.gateway)
            .await?;

        if let Some(Reply::Text(ref text)) = reply {
            info!("Replying to {}: {}", message.id, text);
            self.gateway.post_text(text).await?;
        }
        Ok(reply)
    }

    /// Poll forever. Gateway failures end the current cycle only.
    pub async fn run(&mut self) {
        info!(
            "Polling every {:?} for /{} commands",
            self.poll_interval,
            self.dispatcher.operator_id()
        );
        if let Err(e) = self.prime().await {
            warn!("Initial poll failed: {}", e);
        }

        loop {
            tokio::time::sleep(self.poll_interval).await;
            if let Err(e) = self.tick().await {
                warn!("{}", e);
            }
        }
    }
}

//! russh client session shared by the CLI driver and NETCONF.

use std::sync::Arc;

use log::debug;
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::SshConfig;
use crate::error::{Result, TransportError};

/// An authenticated SSH connection. Opened per device operation and closed
/// before the operation returns.
pub struct SshTransport {
    session: Handle<AcceptHostKey>,
    config: SshConfig,
}

impl SshTransport {
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let handler = AcceptHostKey {
            host: config.host.clone(),
        };
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        debug!("Connecting to {}", config.socket_addr());
        let connecting = client::connect(client_config, (config.host.as_str(), config.port), handler);
        let mut session = match tokio::time::timeout(config.timeout, connecting).await {
            Err(_) => return Err(TransportError::Timeout(config.timeout).into()),
            Ok(Err(e)) => return Err(TransportError::Ssh(e).into()),
            Ok(Ok(session)) => session,
        };

        if !authenticate(&mut session, &config).await? {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(Self { session, config })
    }

    /// Session channel with a PTY and a login shell, for the CLI driver.
    pub async fn open_shell(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        let (width, height) = (self.config.terminal_width, self.config.terminal_height);
        channel
            .request_pty(true, "vt100", width, height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    /// Session channel bound to a subsystem such as `netconf`.
    pub async fn open_subsystem(&self, name: &str) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        if channel.request_subsystem(true, name).await.is_err() {
            return Err(TransportError::SubsystemRejected {
                name: name.to_string(),
            }
            .into());
        }
        Ok(channel)
    }

    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Returns whether the server accepted the credentials.
async fn authenticate(session: &mut Handle<AcceptHostKey>, config: &SshConfig) -> Result<bool> {
    let outcome = session
        .authenticate_password(config.username.as_str(), config.password.expose_secret())
        .await
        .map_err(TransportError::Ssh)?;
    Ok(outcome.success())
}

/// Client handler that trusts whatever host key the router presents.
struct AcceptHostKey {
    host: String,
}

impl client::Handler for AcceptHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        debug!("Accepting host key of {}", self.host);
        Ok(true)
    }
}

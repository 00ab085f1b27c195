//! NETCONF 1.0 session over the SSH `netconf` subsystem.
//!
//! Messages are framed with the `]]>]]>` end-of-message marker.

use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace, warn};
use memchr::memmem;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::xml::RpcReply;
use crate::error::{NetconfError, Result};
use crate::transport::{SshConfig, SshTransport};

const END_OF_MESSAGE: &[u8] = b"]]>]]>";

const CLIENT_HELLO: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">"#,
    "<capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities>",
    "</hello>"
);

/// An open NETCONF session.
pub struct NetconfSession {
    transport: SshTransport,
    channel: Channel<Msg>,
    buffer: BytesMut,
    message_id: u64,
    timeout: Duration,
}

impl NetconfSession {
    /// Connect, open the subsystem and exchange hellos.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let timeout = config.timeout;
        let host = config.socket_addr();
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_subsystem("netconf").await?;

        let mut session = Self {
            transport,
            channel,
            buffer: BytesMut::new(),
            message_id: 0,
            timeout,
        };

        let server_hello = session.read_message().await?;
        trace!("Server hello: {}", server_hello);
        session.write_message(CLIENT_HELLO).await?;
        debug!("NETCONF session open on {}", host);

        Ok(session)
    }

    async fn write_message(&mut self, xml: &str) -> Result<()> {
        let mut frame = Vec::with_capacity(xml.len() + END_OF_MESSAGE.len());
        frame.extend_from_slice(xml.as_bytes());
        frame.extend_from_slice(END_OF_MESSAGE);
        self.channel
            .data(frame.as_slice())
            .await
            .map_err(NetconfError::from)?;
        Ok(())
    }

    async fn read_message(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(pos) = memmem::find(&self.buffer, END_OF_MESSAGE) {
                let message = self.buffer.split_to(pos);
                let _ = self.buffer.split_to(END_OF_MESSAGE.len());
                return Ok(String::from_utf8_lossy(&message).into_owned());
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| NetconfError::Timeout(self.timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => self.buffer.extend_from_slice(&data),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(NetconfError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Send one RPC and parse its reply.
    pub async fn rpc(&mut self, operation: &str) -> Result<RpcReply> {
        self.message_id += 1;
        let request = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rpc message-id="{}" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">{}</rpc>"#,
            self.message_id, operation
        );

        trace!("RPC {}: {}", self.message_id, operation);
        self.write_message(&request).await?;
        let reply = self.read_message().await?;
        Ok(RpcReply::parse(&reply)?)
    }

    /// `<get-config>` on the running datastore.
    pub async fn get_config(&mut self, filter: &str) -> Result<RpcReply> {
        self.rpc(&format!(
            "<get-config><source><running/></source>{filter}</get-config>"
        ))
        .await
    }

    /// `<get>` for state data.
    pub async fn get(&mut self, filter: &str) -> Result<RpcReply> {
        self.rpc(&format!("<get>{filter}</get>")).await
    }

    /// `<edit-config>` on the running datastore.
    pub async fn edit_config(&mut self, config: &str) -> Result<RpcReply> {
        self.rpc(&format!(
            "<edit-config><target><running/></target>{config}</edit-config>"
        ))
        .await
    }

    /// Close the session politely, then the connection.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.rpc("<close-session/>").await {
            warn!("close-session failed: {}", e);
        }
        let _ = self.channel.close().await;
        self.transport.close().await
    }
}

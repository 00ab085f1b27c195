//! Loopback lifecycle over NETCONF.
//!
//! Every operation opens its own session and closes it before returning,
//! whatever the outcome.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::session::NetconfSession;
use super::xml::{self, RpcReply};
use crate::device::credentials::RouterCredentials;
use crate::device::interface::{InterfaceState, LoopbackInterface, OperStatus};
use crate::device::lifecycle::InterfaceLifecycle;
use crate::device::outcome::{FailureKind, TransportResult};
use crate::error::{Error, Result};
use crate::transport::SshConfig;

const CONFIG_INTERFACE: &str = "rpc-reply/data/interfaces/interface";
const STATE_INTERFACE: &str = "rpc-reply/data/interfaces-state/interface";

/// NETCONF client for the operator loopback.
pub struct NetconfClient {
    credentials: RouterCredentials,
    iface: LoopbackInterface,
    port: u16,
    timeout: Duration,
}

impl NetconfClient {
    /// `port` is the NETCONF SSH port (830 on IOS-XE); `timeout` bounds the
    /// connect and each RPC reply.
    pub fn new(
        iface: LoopbackInterface,
        credentials: RouterCredentials,
        port: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            iface,
            port,
            timeout,
        }
    }

    fn ssh_config(&self, ip: &str) -> SshConfig {
        SshConfig::with_password(
            ip,
            self.port,
            self.credentials.username.clone(),
            self.credentials.password.clone(),
            self.timeout,
        )
    }

    /// Run `op` on a fresh session, closing it on every path.
    async fn with_session<T, F, Fut>(&self, ip: &str, op: F) -> Result<T>
    where
        F: FnOnce(NetconfSession) -> Fut,
        Fut: Future<Output = (NetconfSession, Result<T>)>,
    {
        let session = NetconfSession::connect(self.ssh_config(ip)).await?;
        let (session, result) = op(session).await;
        if let Err(e) = session.close().await {
            debug!("NETCONF close on {} failed: {}", ip, e);
        }
        result
    }

    async fn edit(&self, ip: &str, config: String) -> Result<RpcReply> {
        self.with_session(ip, |mut session| async move {
            let result = session.edit_config(&config).await;
            (session, result)
        })
        .await
    }
}

fn failure_kind(err: &Error) -> FailureKind {
    warn!("NETCONF call failed: {}", err);
    if err.is_unreachable() {
        FailureKind::Unreachable
    } else {
        FailureKind::Protocol
    }
}

/// Map an edit-config reply: `<ok/>` means applied. `data-exists` and
/// `data-missing` keep their meaning; any other `<rpc-error>` is a refusal.
fn edit_outcome(reply: Result<RpcReply>, success: TransportResult) -> TransportResult {
    match reply {
        Ok(reply) if reply.is_ok() => success,
        Ok(reply) if reply.has_error_tag("data-exists") => TransportResult::AlreadyExists,
        Ok(reply) if reply.has_error_tag("data-missing") => TransportResult::NotFound,
        Ok(reply) => {
            debug!("edit-config refused: {:?}", reply.errors());
            FailureKind::Rejected.into()
        }
        Err(e) => failure_kind(&e).into(),
    }
}

/// Whether a get-config reply holds the interface.
fn presence(config: &RpcReply) -> std::result::Result<bool, FailureKind> {
    if config.has_errors() {
        return Err(FailureKind::Rejected);
    }
    Ok(config.contains(CONFIG_INTERFACE))
}

/// Combine the configuration and state replies. A missing `<enabled>` leaf
/// reads as disabled; a missing `<oper-status>` as unknown.
fn interface_state(
    name: String,
    config: &RpcReply,
    state: &RpcReply,
) -> std::result::Result<InterfaceState, FailureKind> {
    if !presence(config)? {
        return Ok(InterfaceState::absent(name));
    }

    let admin_enabled = config
        .text(&format!("{CONFIG_INTERFACE}/enabled"))
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let oper_status = state
        .text(&format!("{STATE_INTERFACE}/oper-status"))
        .map(OperStatus::from_yang)
        .unwrap_or(OperStatus::Unknown);

    Ok(InterfaceState {
        name,
        exists: true,
        admin_enabled,
        oper_status,
    })
}

impl InterfaceLifecycle for NetconfClient {
    async fn exists(&self, ip: &str) -> std::result::Result<bool, FailureKind> {
        let filter = xml::config_filter(&self.iface.config_name());
        let reply = self
            .with_session(ip, |mut session| async move {
                let result = session.get_config(&filter).await;
                (session, result)
            })
            .await
            .map_err(|e| failure_kind(&e))?;
        presence(&reply)
    }

    async fn create_interface(&self, ip: &str) -> TransportResult {
        let reply = self.edit(ip, xml::create_config(&self.iface)).await;
        edit_outcome(reply, TransportResult::Created)
    }

    async fn delete_interface(&self, ip: &str) -> TransportResult {
        let reply = self
            .edit(ip, xml::delete_config(&self.iface.config_name()))
            .await;
        edit_outcome(reply, TransportResult::Deleted)
    }

    async fn apply_enabled(&self, ip: &str, enabled: bool) -> TransportResult {
        let reply = self
            .edit(ip, xml::enabled_config(&self.iface.config_name(), enabled))
            .await;
        let success = if enabled {
            TransportResult::Enabled
        } else {
            TransportResult::Disabled
        };
        edit_outcome(reply, success)
    }

    async fn read_state(&self, ip: &str) -> std::result::Result<InterfaceState, FailureKind> {
        let name = self.iface.config_name();
        let config_filter = xml::config_filter(&name);
        let state_filter = xml::state_filter(&name);

        let (config, state) = self
            .with_session(ip, |mut session| async move {
                let config = match session.get_config(&config_filter).await {
                    Ok(reply) => reply,
                    Err(e) => return (session, Err(e)),
                };
                let state = session.get(&state_filter).await;
                (session, state.map(|state| (config, state)))
            })
            .await
            .map_err(|e| failure_kind(&e))?;

        interface_state(name, &config, &state)
    }
}

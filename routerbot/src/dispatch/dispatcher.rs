//! Routes parsed commands to the device layer and decides the reply.

use std::collections::HashSet;

use log::{debug, info};

use super::command::{self, Command};
use super::session::Session;
use crate::device::outcome::{
    self, NO_COMMAND_FOUND, NO_IP_SPECIFIED, NO_METHOD_SPECIFIED, SUMMARY_FAILED, SummaryStyle,
    UNKNOWN_COMMAND,
};
use crate::device::{DeviceCli, InterfaceLifecycle, LoopbackInterface, TransportMethod, Verb};
use crate::error::GatewayError;
use crate::export::{BatchRunner, Exporter};
use crate::gateway::MessagingGateway;

/// What the dispatcher wants done after handling a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Post this text.
    Text(String),
    /// Already posted; nothing more to send.
    Delivered,
}

/// A router address and whether commands may reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterIdentity {
    pub ip: String,
    /// Whether `ip` is on the allow-list.
    pub allowed: bool,
}

/// Routers the gated commands may target.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    ips: HashSet<String>,
}

impl AllowList {
    /// Addresses are compared as written; no normalization is done.
    pub fn new<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ips: ips.into_iter().map(Into::into).collect(),
        }
    }

    /// Look `ip` up. Unknown addresses are reported, not rejected.
    pub fn identify(&self, ip: &str) -> RouterIdentity {
        RouterIdentity {
            ip: ip.to_string(),
            allowed: self.ips.contains(ip),
        }
    }
}

/// Command dispatcher over the two lifecycle transports, the CLI and the
/// export job.
pub struct Dispatcher<R, N, C, B> {
    iface: LoopbackInterface,
    allow_list: AllowList,
    restconf: R,
    netconf: N,
    cli: C,
    exporter: Exporter<B>,
    summary_style: SummaryStyle,
}

impl<R, N, C, B> Dispatcher<R, N, C, B>
where
    R: InterfaceLifecycle,
    N: InterfaceLifecycle,
    C: DeviceCli,
    B: BatchRunner,
{
    /// Replies to lifecycle verbs name `iface`; the summary uses the
    /// GigabitEthernet style until [`with_summary_style`](Self::with_summary_style).
    pub fn new(
        iface: LoopbackInterface,
        allow_list: AllowList,
        restconf: R,
        netconf: N,
        cli: C,
        exporter: Exporter<B>,
    ) -> Self {
        Self {
            iface,
            allow_list,
            restconf,
            netconf,
            cli,
            exporter,
            summary_style: SummaryStyle::default(),
        }
    }

    /// How `gigabit_status` replies are rendered.
    pub fn with_summary_style(mut self, style: SummaryStyle) -> Self {
        self.summary_style = style;
        self
    }

    /// The ID messages must be addressed to, as in `/66070315 ...`.
    pub fn operator_id(&self) -> &str {
        self.iface.operator_id()
    }

    /// Handle one chat message.
    ///
    /// `Ok(None)` means the message was not addressed to this operator. An
    /// error is returned only when posting to `gateway` itself failed.
    pub async fn dispatch<G: MessagingGateway>(
        &self,
        session: &mut Session,
        text: &str,
        gateway: &G,
    ) -> Result<Option<Reply>, GatewayError> {
        let Some(command) = command::parse(self.operator_id(), text) else {
            return Ok(None);
        };
        debug!("Dispatching {:?}", command);

        let reply = match command {
            Command::SetMethod(method) => {
                session.method = Some(method);
                info!("Transport method set to {}", method);
                Reply::Text(outcome::method_selected(method))
            }
            Command::MissingIp => Reply::Text(NO_IP_SPECIFIED.to_string()),
            Command::MissingCommand => Reply::Text(NO_COMMAND_FOUND.to_string()),
            Command::Unknown { .. } => Reply::Text(UNKNOWN_COMMAND.to_string()),

            Command::BannerSet { ip, text } => {
                let applied = self.cli.banner_set(&ip, &text).await;
                Reply::Text(outcome::banner_set_reply(applied))
            }
            Command::BannerRead { ip } => {
                Reply::Text(outcome::banner_reply(self.cli.banner_read(&ip).await))
            }

            Command::Summary { ip } => {
                if !self.permitted(&ip) {
                    return Ok(Some(Reply::Text(NO_IP_SPECIFIED.to_string())));
                }
                let text = match self.cli.interface_status_summary(&ip).await {
                    Ok(summary) => summary.render(self.summary_style),
                    Err(kind) => {
                        debug!("Summary from {} failed: {:?}", ip, kind);
                        SUMMARY_FAILED.to_string()
                    }
                };
                Reply::Text(text)
            }

            Command::Export { ip } => {
                if !self.permitted(&ip) {
                    return Ok(Some(Reply::Text(NO_IP_SPECIFIED.to_string())));
                }
                self.exporter.export_config(&ip, gateway).await?;
                Reply::Delivered
            }

            Command::Lifecycle { ip, verb } => {
                if !self.permitted(&ip) {
                    return Ok(Some(Reply::Text(NO_IP_SPECIFIED.to_string())));
                }
                let Some(method) = session.method else {
                    return Ok(Some(Reply::Text(NO_METHOD_SPECIFIED.to_string())));
                };
                Reply::Text(self.lifecycle(method, verb, &ip).await)
            }
        };

        Ok(Some(reply))
    }

    fn permitted(&self, ip: &str) -> bool {
        let router = self.allow_list.identify(ip);
        if !router.allowed {
            info!("Refusing command for {}: not allow-listed", router.ip);
        }
        router.allowed
    }

    async fn lifecycle(&self, method: TransportMethod, verb: Verb, ip: &str) -> String {
        let result = match method {
            TransportMethod::Restconf => self.restconf.run(verb, ip).await,
            TransportMethod::Netconf => self.netconf.run(verb, ip).await,
        };
        info!("{:?} {} via {}: {:?}", verb, ip, method, result);
        outcome::render_with_method(verb, &result, &self.iface, method)
    }
}

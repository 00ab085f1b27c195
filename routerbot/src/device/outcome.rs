//! Result vocabulary shared by every transport, and the chat replies it maps to.
//!
//! Drivers never build reply text. They return a [`TransportResult`] and the
//! functions here render it, so every transport answers with the same words.

use super::interface::{LoopbackInterface, OperStatus};
use super::lifecycle::TransportMethod;

/// No router address in the message, or the address is not allowed.
pub const NO_IP_SPECIFIED: &str = "Error: No IP specified";
/// Lifecycle verb sent before `restconf` or `netconf` was chosen.
pub const NO_METHOD_SPECIFIED: &str = "Error: No method specified";
/// An address with nothing after it.
pub const NO_COMMAND_FOUND: &str = "Error: No command found";
/// An address followed by a verb nobody handles.
pub const UNKNOWN_COMMAND: &str = "Error: No command or unknown command";
/// Banner accepted by the router.
pub const MOTD_SET_OK: &str = "Ok: success";
/// Banner refused, or the router could not be reached.
pub const MOTD_SET_FAILED: &str = "Error: failed to configure MOTD";
/// Banner read found nothing.
pub const NO_MOTD: &str = "Error: No MOTD Configured";
/// Interface summary could not be collected.
pub const SUMMARY_FAILED: &str = "Error: Cannot retrieve interface status";
/// Backup job failed or did not finish.
pub const EXPORT_FAILED: &str = "Error: Ansible";
/// Caption of the uploaded running-config.
pub const EXPORT_CAPTION: &str = "show running config";

/// Interface lifecycle verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Delete,
    Enable,
    Disable,
    Status,
}

impl Verb {
    /// Parse a chat token, case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "create" => Some(Self::Create),
            "delete" => Some(Self::Delete),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// Why a transport call did not produce an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connect failure, timeout or dropped session.
    Unreachable,
    /// Malformed or unexpected reply.
    Protocol,
    /// The device answered and refused (HTTP error status, `<rpc-error>`).
    Rejected,
}

/// Outcome of one lifecycle operation on one transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportResult {
    Created,
    AlreadyExists,
    Deleted,
    NotFound,
    Enabled,
    Disabled,
    StatusReport {
        admin_enabled: bool,
        oper: OperStatus,
    },
    TransportError {
        kind: FailureKind,
    },
}

impl From<FailureKind> for TransportResult {
    fn from(kind: FailureKind) -> Self {
        Self::TransportError { kind }
    }
}

/// Render a lifecycle result without a method suffix.
pub fn render(verb: Verb, result: &TransportResult, iface: &LoopbackInterface) -> String {
    let name = iface.display_name();

    match result {
        TransportResult::Created => format!("Interface {name} is created successfully"),
        TransportResult::Deleted => format!("Interface {name} is deleted successfully"),
        TransportResult::Enabled => format!("Interface {name} is enabled successfully"),
        TransportResult::Disabled => format!("Interface {name} is shutdowned successfully"),
        TransportResult::StatusReport {
            admin_enabled,
            oper,
        } => match (admin_enabled, oper) {
            (true, OperStatus::Up) => format!("Interface {name} is enabled"),
            (false, _) => format!("Interface {name} is disabled"),
            (true, oper) => format!("Interface {name} admin=up, oper={oper}"),
        },
        TransportResult::AlreadyExists
        | TransportResult::NotFound
        | TransportResult::TransportError { .. } => refusal(verb, &name),
    }
}

/// Render a lifecycle result with the suffix naming the transport used.
pub fn render_with_method(
    verb: Verb,
    result: &TransportResult,
    iface: &LoopbackInterface,
    method: TransportMethod,
) -> String {
    let text = render(verb, result, iface);
    match verb {
        Verb::Status => format!("{text} (checked by {})", method.label()),
        _ => format!("{text} using {}", method.label()),
    }
}

fn refusal(verb: Verb, name: &str) -> String {
    match verb {
        Verb::Create => format!("Cannot create: Interface {name}"),
        Verb::Delete => format!("Cannot delete: Interface {name}"),
        Verb::Enable => format!("Cannot enable: Interface {name}"),
        Verb::Disable => format!("Cannot shutdown: Interface {name}"),
        Verb::Status => format!("No Interface {name}"),
    }
}

/// Reply for a `set_method` command.
pub fn method_selected(method: TransportMethod) -> String {
    format!("Ok: {}", method.label())
}

/// Reply when the export artifact is missing.
pub fn artifact_missing(filename: &str) -> String {
    format!("Error: File {filename} not found")
}

/// Reply for a banner read.
pub fn banner_reply(banner: Option<String>) -> String {
    banner.unwrap_or_else(|| NO_MOTD.to_string())
}

/// Reply for a banner write.
pub fn banner_set_reply(applied: bool) -> String {
    if applied { MOTD_SET_OK } else { MOTD_SET_FAILED }.to_string()
}

/// Classification of one `show ip interface brief` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
    AdminDown,
}

impl LinkState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::AdminDown => "administratively down",
        }
    }
}

/// How the interface summary is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    /// GigabitEthernet interfaces only.
    #[default]
    Gigabit,
    /// GigabitEthernet list plus a Loopback tally.
    Dual,
}

/// Up/down/admin-down counts for one interface family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub up: usize,
    pub down: usize,
    pub admin_down: usize,
}

impl Tally {
    fn record(&mut self, state: LinkState) {
        match state {
            LinkState::Up => self.up += 1,
            LinkState::Down => self.down += 1,
            LinkState::AdminDown => self.admin_down += 1,
        }
    }

    fn render(&self) -> String {
        format!(
            "{} up, {} down, {} administratively down",
            self.up, self.down, self.admin_down
        )
    }
}

/// Classified interfaces, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSummary {
    pub gigabit: Vec<(String, LinkState)>,
    pub gigabit_tally: Tally,
    pub loopback_tally: Tally,
}

impl InterfaceSummary {
    /// Add one row. Families other than GigabitEthernet and Loopback are ignored.
    /// Count one interface. Only GigabitEthernet interfaces are listed;
    /// loopbacks are tallied for the dual style and everything else ignored.
    pub fn record(&mut self, name: &str, state: LinkState) {
        if name.starts_with("GigabitEthernet") {
            self.gigabit.push((name.to_string(), state));
            self.gigabit_tally.record(state);
        } else if name.starts_with("Loopback") {
            self.loopback_tally.record(state);
        }
    }

    /// One-line reply: the GigabitEthernet listing followed by the counts.
    pub fn render(&self, style: SummaryStyle) -> String {
        let listing = self
            .gigabit
            .iter()
            .map(|(name, state)| format!("{name} {}", state.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut text = format!("{listing} -> {}", self.gigabit_tally.render());
        if style == SummaryStyle::Dual {
            text.push_str("; Loopback: ");
            text.push_str(&self.loopback_tally.render());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface() -> LoopbackInterface {
        LoopbackInterface::new("66070315").unwrap()
    }

    #[test]
    fn test_success_templates() {
        let iface = iface();
        assert_eq!(
            render(Verb::Create, &TransportResult::Created, &iface),
            "Interface loopback 66070315 is created successfully"
        );
        assert_eq!(
            render(Verb::Disable, &TransportResult::Disabled, &iface),
            "Interface loopback 66070315 is shutdowned successfully"
        );
    }

    #[test]
    fn test_refusals_follow_the_verb() {
        let iface = iface();
        let unreachable = TransportResult::from(FailureKind::Unreachable);
        assert_eq!(
            render(Verb::Create, &TransportResult::AlreadyExists, &iface),
            "Cannot create: Interface loopback 66070315"
        );
        assert_eq!(
            render(Verb::Disable, &TransportResult::NotFound, &iface),
            "Cannot shutdown: Interface loopback 66070315"
        );
        assert_eq!(
            render(Verb::Delete, &unreachable, &iface),
            "Cannot delete: Interface loopback 66070315"
        );
        assert_eq!(
            render(Verb::Status, &unreachable, &iface),
            "No Interface loopback 66070315"
        );
    }

    #[test]
    fn test_status_templates() {
        let iface = iface();
        let report = |admin_enabled, oper| TransportResult::StatusReport {
            admin_enabled,
            oper,
        };
        assert_eq!(
            render(Verb::Status, &report(true, OperStatus::Up), &iface),
            "Interface loopback 66070315 is enabled"
        );
        assert_eq!(
            render(Verb::Status, &report(false, OperStatus::Up), &iface),
            "Interface loopback 66070315 is disabled"
        );
        assert_eq!(
            render(Verb::Status, &report(true, OperStatus::Unknown), &iface),
            "Interface loopback 66070315 admin=up, oper=unknown"
        );
    }

    #[test]
    fn test_method_suffixes() {
        let iface = iface();
        assert_eq!(
            render_with_method(
                Verb::Status,
                &TransportResult::NotFound,
                &iface,
                TransportMethod::Restconf
            ),
            "No Interface loopback 66070315 (checked by Restconf)"
        );
        assert_eq!(
            render_with_method(
                Verb::Create,
                &TransportResult::Created,
                &iface,
                TransportMethod::Netconf
            ),
            "Interface loopback 66070315 is created successfully using Netconf"
        );
    }

    #[test]
    fn test_summary_render() {
        let mut summary = InterfaceSummary::default();
        summary.record("GigabitEthernet1", LinkState::Up);
        summary.record("GigabitEthernet2", LinkState::AdminDown);
        summary.record("GigabitEthernet3", LinkState::Down);
        summary.record("Loopback0", LinkState::Up);
        summary.record("Tunnel1", LinkState::Down);

        assert_eq!(
            summary.render(SummaryStyle::Gigabit),
            "GigabitEthernet1 up, GigabitEthernet2 administratively down, GigabitEthernet3 down \
             -> 1 up, 1 down, 1 administratively down"
        );
        assert!(
            summary
                .render(SummaryStyle::Dual)
                .ends_with("; Loopback: 1 up, 0 down, 0 administratively down")
        );
    }

    #[test]
    fn test_banner_replies() {
        assert_eq!(banner_reply(None), NO_MOTD);
        assert_eq!(banner_reply(Some("Welcome".into())), "Welcome");
        assert_eq!(banner_set_reply(false), MOTD_SET_FAILED);
    }
}

//! Chat command grammar.
//!
//! A command is `/{operator_id}` followed by whitespace and a tail. Anything
//! else is not addressed to this bot and parses to `None`.

use crate::device::{TransportMethod, Verb};

/// One parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `restconf` / `netconf`
    SetMethod(TransportMethod),
    /// No router address where one is needed.
    MissingIp,
    /// A router address and nothing else.
    MissingCommand,
    /// `<ip> motd <text>`; words joined with single spaces.
    BannerSet { ip: String, text: String },
    /// `<ip> motd`
    BannerRead { ip: String },
    /// `<ip> gigabit_status`
    Summary { ip: String },
    /// `<ip> showrun`; the reply is the uploaded file itself.
    Export { ip: String },
    /// `<ip> create|delete|enable|disable|status`
    Lifecycle { ip: String, verb: Verb },
    /// A router address followed by an unrecognized verb.
    Unknown { ip: String },
}

impl Command {
    /// Router address the command targets, if any.
    pub fn ip(&self) -> Option<&str> {
        match self {
            Self::BannerSet { ip, .. }
            | Self::BannerRead { ip }
            | Self::Summary { ip }
            | Self::Export { ip }
            | Self::Lifecycle { ip, .. }
            | Self::Unknown { ip } => Some(ip),
            Self::SetMethod(_) | Self::MissingIp | Self::MissingCommand => None,
        }
    }
}

/// Parse `text` addressed to `operator_id`.
pub fn parse(operator_id: &str, text: &str) -> Option<Command> {
    let rest = text.trim_start().strip_prefix('/')?.strip_prefix(operator_id)?;

    // `/660703150` is somebody else.
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let tail = rest.trim();
    if tail.is_empty() {
        return None;
    }

    let (first, after_first) = split_token(tail);
    if after_first.is_empty() {
        return Some(single_token(first));
    }

    if !is_ipv4_like(first) {
        return Some(Command::MissingIp);
    }

    let ip = first.to_string();
    let (verb, args) = split_token(after_first);

    let command = match verb.to_ascii_lowercase().as_str() {
        "motd" if args.is_empty() => Command::BannerRead { ip },
        "motd" => Command::BannerSet {
            ip,
            text: args.split_whitespace().collect::<Vec<_>>().join(" "),
        },
        "gigabit_status" | "gi-status" | "gigabit" => Command::Summary { ip },
        "showrun" | "show-run" => Command::Export { ip },
        other => match Verb::from_token(other) {
            Some(verb) => Command::Lifecycle { ip, verb },
            None => Command::Unknown { ip },
        },
    };
    Some(command)
}

fn single_token(token: &str) -> Command {
    if token.eq_ignore_ascii_case("showrun") {
        return Command::MissingIp;
    }
    if let Some(method) = TransportMethod::from_token(token) {
        return Command::SetMethod(method);
    }
    if is_ipv4_like(token) {
        return Command::MissingCommand;
    }
    Command::MissingIp
}

/// Dotted-quad shape: exactly three dots. Octets are not validated.
pub fn is_ipv4_like(token: &str) -> bool {
    token.matches('.').count() == 3
}

/// First whitespace-delimited token and the trimmed remainder.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim()),
        None => (text, ""),
    }
}

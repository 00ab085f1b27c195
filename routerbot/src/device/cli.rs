//! Interface summary and MOTD banner over an interactive CLI session.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use textfsm_rust::Template;

use super::credentials::RouterCredentials;
use super::outcome::{FailureKind, InterfaceSummary, LinkState};
use crate::driver::{Driver, DriverBuilder, GenericDriver};
use crate::error::Result;

const SHOW_IP_INTERFACE_BRIEF: &str = "show ip interface brief";
const SHOW_BANNER_SECTION: &str = "show running-config | section banner motd";
const SHOW_BANNER: &str = "show banner motd";

const IP_INTERFACE_BRIEF_TEMPLATE: &str =
    include_str!("../../templates/cisco_ios_show_ip_interface_brief.textfsm");

/// Banner delimiters tried in order; the first one absent from the text wins.
const BANNER_DELIMITERS: &[char] = &['#', '$', '%', '@', '~', '|', '&', '*', '+', '!'];

/// Router operations that only the CLI offers.
pub trait DeviceCli: Send + Sync {
    /// Classify every interface from `show ip interface brief`.
    fn interface_status_summary(
        &self,
        ip: &str,
    ) -> impl Future<Output = std::result::Result<InterfaceSummary, FailureKind>> + Send;

    /// Current MOTD banner, `None` when unset, unreadable or ambiguous.
    fn banner_read(&self, ip: &str) -> impl Future<Output = Option<String>> + Send;

    /// Configure the MOTD banner. Returns whether the router accepted it.
    fn banner_set(&self, ip: &str, text: &str) -> impl Future<Output = bool> + Send;
}

/// [`DeviceCli`] over SSH, one session per call.
pub struct CliDevice {
    credentials: RouterCredentials,
    port: u16,
    timeout: Duration,
}

impl CliDevice {
    /// `timeout` bounds the connect and every prompt wait of a session.
    pub fn new(credentials: RouterCredentials, port: u16, timeout: Duration) -> Self {
        Self {
            credentials,
            port,
            timeout,
        }
    }

    fn driver(&self, ip: &str) -> Result<GenericDriver> {
        let mut builder = DriverBuilder::new(ip)
            .port(self.port)
            .username(self.credentials.username.clone())
            .password(self.credentials.password.clone())
            .timeout(self.timeout);
        if let Some(ref secret) = self.credentials.enable_secret {
            builder = builder.enable_secret(secret.clone());
        }
        builder.build()
    }

    /// Run `op` on a freshly opened driver, closing it on every path.
    async fn with_driver<T, F, Fut>(&self, ip: &str, op: F) -> Result<T>
    where
        F: FnOnce(GenericDriver) -> Fut,
        Fut: Future<Output = (GenericDriver, Result<T>)>,
    {
        let mut driver = self.driver(ip)?;

        let result = match driver.open().await {
            Ok(()) => {
                let (returned, result) = op(driver).await;
                driver = returned;
                result
            }
            Err(e) => Err(e),
        };

        if let Err(e) = driver.close().await {
            debug!("CLI close on {} failed: {}", ip, e);
        }
        result
    }
}

impl DeviceCli for CliDevice {
    async fn interface_status_summary(
        &self,
        ip: &str,
    ) -> std::result::Result<InterfaceSummary, FailureKind> {
        let response = self
            .with_driver(ip, |mut driver| async move {
                let result = driver.send_command(SHOW_IP_INTERFACE_BRIEF).await;
                (driver, result)
            })
            .await
            .map_err(|e| {
                warn!("Interface summary from {} failed: {}", ip, e);
                if e.is_unreachable() {
                    FailureKind::Unreachable
                } else {
                    FailureKind::Protocol
                }
            })?;

        if !response.is_success() {
            return Err(FailureKind::Rejected);
        }
        Ok(summarize(&response.result))
    }

    async fn banner_read(&self, ip: &str) -> Option<String> {
        let outputs = self
            .with_driver(ip, |mut driver| async move {
                let section = match driver.send_command(SHOW_BANNER_SECTION).await {
                    Ok(response) => response,
                    Err(e) => return (driver, Err(e)),
                };
                if section.is_success() {
                    return (driver, Ok((Some(section.result), None)));
                }
                let plain = driver.send_command(SHOW_BANNER).await;
                (driver, plain.map(|r| (None, r.is_success().then_some(r.result))))
            })
            .await;

        match outputs {
            Ok((Some(config), _)) => extract_banner(&config),
            Ok((None, Some(plain))) => non_empty(plain.trim()),
            Ok((None, None)) => None,
            Err(e) => {
                warn!("Banner read from {} failed: {}", ip, e);
                None
            }
        }
    }

    async fn banner_set(&self, ip: &str, text: &str) -> bool {
        let Some(delimiter) = choose_delimiter(text) else {
            debug!("No free banner delimiter for {:?}", text);
            return false;
        };
        let block = format!("banner motd {delimiter}\n{text}\n{delimiter}");

        let result = self
            .with_driver(ip, |mut driver| async move {
                let result = driver.send_config(&[block.as_str()]).await;
                (driver, result)
            })
            .await;

        match result {
            Ok(responses) => !responses.is_empty() && responses.iter().all(|r| r.is_success()),
            Err(e) => {
                warn!("Banner set on {} failed: {}", ip, e);
                false
            }
        }
    }
}

/// Classify one row. Admin-down wins over everything, then up, then down.
pub fn classify(status: &str, protocol: &str) -> LinkState {
    let status = status.to_ascii_lowercase();
    let protocol = protocol.to_ascii_lowercase();

    if status.contains("administratively") {
        LinkState::AdminDown
    } else if status == "up" && (protocol == "up" || protocol.is_empty()) {
        LinkState::Up
    } else {
        LinkState::Down
    }
}

/// Build the summary, preferring TextFSM and falling back to column parsing.
pub fn summarize(output: &str) -> InterfaceSummary {
    let rows = match parse_with_textfsm(output) {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            debug!("TextFSM found no rows, parsing columns");
            parse_columns(output)
        }
    };

    let mut summary = InterfaceSummary::default();
    for (name, state) in rows {
        summary.record(&name, state);
    }
    summary
}

fn parse_with_textfsm(output: &str) -> Option<Vec<(String, LinkState)>> {
    let template = match Template::parse_str(IP_INTERFACE_BRIEF_TEMPLATE) {
        Ok(template) => template,
        Err(e) => {
            warn!("Interface template does not compile: {}", e);
            return None;
        }
    };

    let mut parser = template.parser();
    let records: Vec<HashMap<String, String>> = match parser.parse_text_to_dicts(output) {
        Ok(records) => records,
        Err(e) => {
            debug!("TextFSM parse failed: {}", e);
            return None;
        }
    };

    let field = |record: &HashMap<String, String>, key: &str| {
        record.get(key).cloned().unwrap_or_default()
    };

    Some(
        records
            .iter()
            .map(|record| {
                let state = classify(&field(record, "status"), &field(record, "proto"));
                (field(record, "intf"), state)
            })
            .filter(|(name, _)| !name.is_empty())
            .collect(),
    )
}

/// Raw column parsing: the protocol is the last column and the status the
/// one before it, unless the row says `administratively down`.
fn parse_columns(output: &str) -> Vec<(String, LinkState)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Interface"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 3 {
                return None;
            }
            let protocol = cols[cols.len() - 1];
            let status = if line.contains("administratively") {
                "administratively down"
            } else {
                cols[cols.len() - 2]
            };
            Some((cols[0].to_string(), classify(status, protocol)))
        })
        .collect()
}

/// Text between the first two occurrences of the `banner motd` delimiter.
///
/// The delimiter is the `^C` caret form or the single character right after
/// the keyword.
pub fn extract_banner(config: &str) -> Option<String> {
    const KEYWORD: &str = "banner motd";

    let start = config.find(KEYWORD)? + KEYWORD.len();
    let rest = config[start..].trim_start_matches([' ', '\t']);

    let delimiter: &str = if rest.starts_with("^C") {
        "^C"
    } else {
        let ch = rest.chars().next().filter(|c| !c.is_whitespace())?;
        &rest[..ch.len_utf8()]
    };

    let body = &rest[delimiter.len()..];
    let end = body.find(delimiter)?;
    non_empty(body[..end].trim())
}

/// First delimiter character that does not occur in `text`.
pub fn choose_delimiter(text: &str) -> Option<char> {
    BANNER_DELIMITERS.iter().copied().find(|d| !text.contains(*d))
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::outcome::SummaryStyle;

    const BRIEF: &str = "\
Interface              IP-Address      OK? Method Status                Protocol
GigabitEthernet1       10.0.15.61      YES DHCP   up                    up
GigabitEthernet2       unassigned      YES unset  administratively down down
GigabitEthernet3       unassigned      YES unset  down                  down
Loopback66070315       172.3.15.1      YES manual up                    up
";

    #[test]
    fn test_classify() {
        assert_eq!(classify("up", "up"), LinkState::Up);
        assert_eq!(classify("up", ""), LinkState::Up);
        assert_eq!(classify("up", "down"), LinkState::Down);
        assert_eq!(classify("down", "down"), LinkState::Down);
        assert_eq!(classify("administratively down", "up"), LinkState::AdminDown);
    }

    #[test]
    fn test_parse_columns() {
        let rows = parse_columns(BRIEF);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], ("GigabitEthernet1".to_string(), LinkState::Up));
        assert_eq!(rows[1], ("GigabitEthernet2".to_string(), LinkState::AdminDown));
        assert_eq!(rows[2], ("GigabitEthernet3".to_string(), LinkState::Down));
    }

    #[test]
    fn test_summarize_gigabit() {
        assert_eq!(
            summarize(BRIEF).render(SummaryStyle::Gigabit),
            "GigabitEthernet1 up, GigabitEthernet2 administratively down, GigabitEthernet3 down \
             -> 1 up, 1 down, 1 administratively down"
        );
    }

    #[test]
    fn test_summarize_dual_counts_loopbacks() {
        assert!(
            summarize(BRIEF)
                .render(SummaryStyle::Dual)
                .ends_with("; Loopback: 1 up, 0 down, 0 administratively down")
        );
    }

    #[test]
    fn test_extract_banner_caret_form() {
        assert_eq!(
            extract_banner("banner motd ^C Welcome ^C").as_deref(),
            Some("Welcome")
        );
        assert_eq!(
            extract_banner("banner motd ^C\nAuthorized access only\n^C\n").as_deref(),
            Some("Authorized access only")
        );
    }

    #[test]
    fn test_extract_banner_single_char() {
        assert_eq!(
            extract_banner("banner motd #Lab R3#").as_deref(),
            Some("Lab R3")
        );
    }

    #[test]
    fn test_extract_banner_absent_or_ambiguous() {
        assert_eq!(extract_banner("hostname R3\n"), None);
        assert_eq!(extract_banner("banner motd ^C unterminated"), None);
        assert_eq!(extract_banner("banner motd ^C ^C"), None);
        assert_eq!(extract_banner("banner motd"), None);
    }

    #[test]
    fn test_choose_delimiter() {
        assert_eq!(choose_delimiter("Welcome"), Some('#'));
        assert_eq!(choose_delimiter("Room #3"), Some('$'));
        assert_eq!(choose_delimiter("#$%@~|&*+!"), None);
    }
}

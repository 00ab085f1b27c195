//! Configuration loading.
//!
//! Defaults, then an optional TOML file, then the process environment
//! (unprefixed, e.g. `STUDENT_ID`, `ROUTER_PASS`). Environment wins.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::warn;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::device::outcome::SummaryStyle;
use crate::device::{LoopbackInterface, RetryPolicy, RouterCredentials};
use crate::error::ConfigError;
use crate::gateway::DEFAULT_API_URL;

/// Environment variable naming the TOML file.
pub const CONFIG_PATH_ENV: &str = "ROUTERBOT_CONFIG";

/// TOML file read when `ROUTERBOT_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "routerbot.toml";

/// Keys whose environment value is taken as written. `Env` parses values,
/// which turns `ROUTER_PASS=007` into the number 7.
const VERBATIM_ENV_KEYS: &[&str] = &[
    "WEBEX_TOKEN",
    "WEBEX_ROOM_ID",
    "WEBEX_API_URL",
    "STUDENT_ID",
    "ROUTER_USER",
    "ROUTER_PASS",
    "ROUTER_ENABLE",
    "ROUTER_NAME",
    "ALLOWED_IPS",
    "ANSIBLE_DIR",
    "SUMMARY_STYLE",
];

/// Keys parsed as numbers by `Env`.
const NUMERIC_ENV_KEYS: &[&str] = &[
    "RESTCONF_PORT",
    "RESTCONF_TIMEOUT",
    "RESTCONF_RETRIES",
    "RESTCONF_BACKOFF",
    "NETCONF_PORT",
    "NETCONF_TIMEOUT",
    "SSH_PORT",
    "SSH_TIMEOUT",
    "ANSIBLE_TIMEOUT",
    "POLL_INTERVAL",
];

/// Settings as loaded, before validation. Durations are in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(
        default,
        deserialize_with = "opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub webex_token: Option<String>,
    #[serde(
        default,
        deserialize_with = "opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub webex_room_id: Option<String>,
    pub webex_api_url: String,

    #[serde(
        default,
        deserialize_with = "opt_string_like",
        skip_serializing_if = "Option::is_none"
    )]
    pub student_id: Option<String>,

    #[serde(deserialize_with = "string_like")]
    pub router_user: String,
    #[serde(deserialize_with = "string_like")]
    pub router_pass: String,
    #[serde(default, deserialize_with = "string_like")]
    pub router_enable: String,
    #[serde(deserialize_with = "string_like")]
    pub router_name: String,
    #[serde(deserialize_with = "ip_list")]
    pub allowed_ips: Vec<String>,

    pub restconf_port: u16,
    pub restconf_timeout: f64,
    pub restconf_retries: u32,
    pub restconf_backoff: f64,

    pub netconf_port: u16,
    pub netconf_timeout: f64,

    pub ssh_port: u16,
    pub ssh_timeout: f64,

    pub ansible_dir: PathBuf,
    pub ansible_timeout: f64,

    pub poll_interval: f64,
    pub summary_style: SummaryStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webex_token: None,
            webex_room_id: None,
            webex_api_url: DEFAULT_API_URL.to_string(),
            student_id: None,
            router_user: "admin".to_string(),
            router_pass: "cisco".to_string(),
            router_enable: String::new(),
            router_name: "CSR-1000V".to_string(),
            allowed_ips: (61..=65).map(|host| format!("10.0.15.{host}")).collect(),
            restconf_port: 443,
            restconf_timeout: 8.0,
            restconf_retries: 3,
            restconf_backoff: 1.5,
            netconf_port: 830,
            netconf_timeout: 10.0,
            ssh_port: 22,
            ssh_timeout: 30.0,
            ansible_dir: PathBuf::from("ansible"),
            ansible_timeout: 300.0,
            poll_interval: 1.0,
            summary_style: SummaryStyle::Gigabit,
        }
    }
}

impl Settings {
    /// The figment these settings are extracted from.
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::raw().only(NUMERIC_ENV_KEYS));

        for key in VERBATIM_ENV_KEYS {
            match std::env::var(key) {
                Ok(value) => {
                    figment = figment.merge(Serialized::default(&key.to_ascii_lowercase(), value));
                }
                Err(std::env::VarError::NotUnicode(_)) => {
                    warn!("Ignoring {}: not valid UTF-8", key);
                }
                Err(std::env::VarError::NotPresent) => {}
            }
        }
        figment
    }

    /// Load from `path` (or `ROUTERBOT_CONFIG`, or `routerbot.toml`) and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        Self::from_figment(Self::figment(&path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Webex settings; `require_room` for anything that reads or posts
    /// messages.
    pub fn webex(&self, require_room: bool) -> Result<WebexSettings, ConfigError> {
        let token = required(&self.webex_token, "WEBEX_TOKEN")?;
        let room_id = match (&self.webex_room_id, require_room) {
            (Some(room), _) if !room.trim().is_empty() => Some(room.trim().to_string()),
            (_, true) => return Err(missing("WEBEX_ROOM_ID")),
            (_, false) => None,
        };

        Ok(WebexSettings {
            token: SecretString::from(token),
            room_id,
            api_url: self.webex_api_url.clone(),
        })
    }

    /// Validate everything the bot needs to handle commands.
    pub fn bot(&self) -> Result<BotConfig, ConfigError> {
        let operator_id = required(&self.student_id, "STUDENT_ID")?;
        let iface = LoopbackInterface::new(operator_id.clone())?;

        let mut credentials = RouterCredentials::new(
            self.router_user.clone(),
            SecretString::from(self.router_pass.clone()),
        );
        if !self.router_enable.is_empty() {
            credentials =
                credentials.with_enable_secret(SecretString::from(self.router_enable.clone()));
        }

        if self.restconf_retries == 0 {
            return Err(ConfigError::Validation {
                field: "RESTCONF_RETRIES".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.restconf_backoff < 1.0 {
            return Err(ConfigError::Validation {
                field: "RESTCONF_BACKOFF".to_string(),
                reason: "must be at least 1.0".to_string(),
            });
        }

        Ok(BotConfig {
            operator_id,
            iface,
            credentials,
            router_name: self.router_name.clone(),
            allowed_ips: self.allowed_ips.clone(),
            restconf_port: self.restconf_port,
            retry: RetryPolicy {
                attempts: self.restconf_retries,
                base_delay: seconds(self.restconf_backoff, "RESTCONF_BACKOFF")?,
                multiplier: self.restconf_backoff,
                timeout: seconds(self.restconf_timeout, "RESTCONF_TIMEOUT")?,
            },
            netconf_port: self.netconf_port,
            netconf_timeout: seconds(self.netconf_timeout, "NETCONF_TIMEOUT")?,
            ssh_port: self.ssh_port,
            ssh_timeout: seconds(self.ssh_timeout, "SSH_TIMEOUT")?,
            ansible_dir: self.ansible_dir.clone(),
            ansible_timeout: seconds(self.ansible_timeout, "ANSIBLE_TIMEOUT")?,
            poll_interval: seconds(self.poll_interval, "POLL_INTERVAL")?,
            summary_style: self.summary_style,
        })
    }
}

/// Messaging API settings.
#[derive(Debug, Clone)]
pub struct WebexSettings {
    pub token: SecretString,
    pub room_id: Option<String>,
    pub api_url: String,
}

/// Validated bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub operator_id: String,
    pub iface: LoopbackInterface,
    pub credentials: RouterCredentials,
    pub router_name: String,
    pub allowed_ips: Vec<String>,
    pub restconf_port: u16,
    pub retry: RetryPolicy,
    pub netconf_port: u16,
    pub netconf_timeout: Duration,
    pub ssh_port: u16,
    pub ssh_timeout: Duration,
    pub ansible_dir: PathBuf,
    pub ansible_timeout: Duration,
    pub poll_interval: Duration,
    pub summary_style: SummaryStyle,
}

fn missing(field: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        reason: "is required".to_string(),
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| missing(field))
}

fn seconds(value: f64, field: &str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Validation {
        field: field.to_string(),
        reason: format!("{value} is not a valid number of seconds"),
    })
}

/// A TOML file may write `student_id = 66070315`; IDs and passwords are
/// still strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringLike {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl From<StringLike> for String {
    fn from(value: StringLike) -> Self {
        match value {
            StringLike::Str(s) => s,
            StringLike::Int(n) => n.to_string(),
            StringLike::UInt(n) => n.to_string(),
            StringLike::Float(n) => n.to_string(),
            StringLike::Bool(b) => b.to_string(),
        }
    }
}

fn string_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringLike::deserialize(deserializer).map(String::from)
}

fn opt_string_like<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringLike>::deserialize(deserializer)?.map(String::from))
}

/// `ALLOWED_IPS` as a comma-separated string or a TOML array.
fn ip_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IpList {
        Joined(String),
        Items(Vec<String>),
    }

    let items = match IpList::deserialize(deserializer)? {
        IpList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        IpList::Items(items) => items,
    };
    Ok(items
        .into_iter()
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_figment(figment()).unwrap();
        assert_eq!(settings.router_name, "CSR-1000V");
        assert_eq!(settings.allowed_ips.len(), 5);
        assert_eq!(settings.allowed_ips[0], "10.0.15.61");
        assert_eq!(settings.restconf_port, 443);
        assert_eq!(settings.summary_style, SummaryStyle::Gigabit);
    }

    #[test]
    fn test_numeric_operator_id() {
        let settings = Settings::from_figment(
            figment()
                .merge(Serialized::default("student_id", 66070315))
                .merge(Serialized::default("router_pass", 12345)),
        )
        .unwrap();
        let bot = settings.bot().unwrap();
        assert_eq!(bot.operator_id, "66070315");
        assert_eq!(bot.iface.config_name(), "Loopback66070315");
        assert_eq!(settings.router_pass, "12345");
    }

    #[test]
    fn test_env_credentials_keep_their_text() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("STUDENT_ID", "066070315");
            jail.set_env("ROUTER_USER", "0100");
            jail.set_env("ROUTER_PASS", "007");
            jail.set_env("ROUTER_ENABLE", "1.50");
            jail.set_env("RESTCONF_PORT", "8443");

            let settings = Settings::load(Some(Path::new("absent.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(settings.student_id.as_deref(), Some("066070315"));
            assert_eq!(settings.router_user, "0100");
            assert_eq!(settings.router_pass, "007");
            assert_eq!(settings.router_enable, "1.50");
            assert_eq!(settings.restconf_port, 8443);

            let bot = settings.bot().map_err(|e| e.to_string())?;
            assert_eq!(bot.operator_id, "066070315");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "routerbot.toml",
                r#"
                    student_id = 66070315
                    router_pass = "from-file"
                    allowed_ips = ["10.0.15.61"]
                "#,
            )?;
            jail.set_env("ROUTER_PASS", "from-env");
            jail.set_env("ALLOWED_IPS", "10.0.15.62,10.0.15.63");

            let settings = Settings::load(Some(Path::new("routerbot.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(settings.student_id.as_deref(), Some("66070315"));
            assert_eq!(settings.router_pass, "from-env");
            assert_eq!(settings.allowed_ips, vec!["10.0.15.62", "10.0.15.63"]);
            Ok(())
        });
    }

    #[test]
    fn test_allowed_ips_from_string() {
        let settings = Settings::from_figment(
            figment().merge(Serialized::default("allowed_ips", "10.0.15.61, 10.0.15.62,")),
        )
        .unwrap();
        assert_eq!(settings.allowed_ips, vec!["10.0.15.61", "10.0.15.62"]);
    }

    #[test]
    fn test_missing_operator_id() {
        let settings = Settings::from_figment(figment()).unwrap();
        let err = settings.bot().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "STUDENT_ID"));
    }

    #[test]
    fn test_webex_room_requirement() {
        let settings = Settings::from_figment(
            figment().merge(Serialized::default("webex_token", "abc")),
        )
        .unwrap();
        assert!(settings.webex(false).unwrap().room_id.is_none());
        assert!(settings.webex(true).is_err());
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = Settings::from_figment(
            figment()
                .merge(Serialized::default("student_id", "66070315"))
                .merge(Serialized::default("restconf_backoff", 2.0)),
        )
        .unwrap();
        let retry = settings.bot().unwrap().retry;
        assert_eq!(retry.attempts, 3);
        assert_eq!(retry.base_delay, Duration::from_secs(2));
        assert_eq!(retry.multiplier, 2.0);
    }

    #[test]
    fn test_summary_style_from_string() {
        let settings = Settings::from_figment(
            figment().merge(Serialized::default("summary_style", "dual")),
        )
        .unwrap();
        assert_eq!(settings.summary_style, SummaryStyle::Dual);
    }
}

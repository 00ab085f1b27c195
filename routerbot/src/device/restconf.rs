//! RESTCONF (YANG over HTTPS) lifecycle driver.
//!
//! Talks to `ietf-interfaces` on IOS-XE. Requests that never get an answer
//! (connect failure, timeout) are retried with exponential backoff; any HTTP
//! status is final and mapped straight to a [`TransportResult`].

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::credentials::RouterCredentials;
use super::interface::{InterfaceState, LoopbackInterface, OperStatus};
use super::lifecycle::InterfaceLifecycle;
use super::outcome::{FailureKind, TransportResult};
use crate::error::RestconfError;

const YANG_JSON: &str = "application/yang-data+json";
const SOFTWARE_LOOPBACK: &str = "iana-if-type:softwareLoopback";

/// Retry schedule for RESTCONF requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub attempts: u32,
    /// Wait before the second attempt.
    pub base_delay: Duration,
    /// Factor applied to the wait before each further attempt.
    pub multiplier: f64,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(1500),
            multiplier: 1.5,
            timeout: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following one that waited `previous`.
    pub fn next_delay(&self, previous: Duration) -> Duration {
        if previous.is_zero() {
            self.base_delay
        } else {
            previous.mul_f64(self.multiplier)
        }
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    #[serde(rename = "ietf-interfaces:interface")]
    interface: T,
}

#[derive(Serialize)]
struct InterfaceConfig {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type")]
    if_type: &'static str,
    enabled: bool,
    #[serde(rename = "ietf-ip:ipv4", skip_serializing_if = "Option::is_none")]
    ipv4: Option<Ipv4Config>,
}

#[derive(Serialize)]
struct Ipv4Config {
    address: Vec<Ipv4Address>,
}

#[derive(Serialize)]
struct Ipv4Address {
    ip: String,
    netmask: &'static str,
}

/// Device replies carry either a single interface or a one-element list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(items) => items.into_iter().next(),
        }
    }
}

#[derive(Deserialize)]
struct InterfaceReply {
    #[serde(rename = "ietf-interfaces:interface")]
    interface: Option<OneOrMany<InterfaceLeaves>>,
}

#[derive(Deserialize, Default)]
struct InterfaceLeaves {
    enabled: Option<bool>,
    #[serde(rename = "oper-status")]
    oper_status: Option<String>,
}

/// RESTCONF client for the operator loopback.
pub struct RestconfClient {
    http: reqwest::Client,
    scheme: String,
    port: u16,
    credentials: RouterCredentials,
    iface: LoopbackInterface,
    retry: RetryPolicy,
}

impl RestconfClient {
    /// Build a client for HTTPS on `port`. Router certificates are
    /// self-signed, so certificate checks are off.
    pub fn new(
        iface: LoopbackInterface,
        credentials: RouterCredentials,
        port: u16,
        retry: RetryPolicy,
    ) -> Result<Self, RestconfError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .user_agent(concat!("routerbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            scheme: "https".to_string(),
            port,
            credentials,
            iface,
            retry,
        })
    }

    /// Use another URL scheme (plain `http` for lab setups and tests).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    fn config_root(&self, ip: &str) -> String {
        format!(
            "{}://{}:{}/restconf/data/ietf-interfaces:interfaces",
            self.scheme, ip, self.port
        )
    }

    fn config_url(&self, ip: &str) -> String {
        format!("{}/interface={}", self.config_root(ip), self.iface.config_name())
    }

    fn state_url(&self, ip: &str) -> String {
        format!(
            "{}://{}:{}/restconf/data/ietf-interfaces:interfaces-state/interface={}",
            self.scheme,
            ip,
            self.port,
            self.iface.config_name()
        )
    }

    fn full_config(&self) -> Envelope<InterfaceConfig> {
        Envelope {
            interface: InterfaceConfig {
                name: self.iface.config_name(),
                description: Some(self.iface.description()),
                if_type: SOFTWARE_LOOPBACK,
                enabled: true,
                ipv4: Some(Ipv4Config {
                    address: vec![Ipv4Address {
                        ip: self.iface.ipv4_address(),
                        netmask: self.iface.netmask(),
                    }],
                }),
            },
        }
    }

    fn enabled_patch(&self, enabled: bool) -> Envelope<InterfaceConfig> {
        Envelope {
            interface: InterfaceConfig {
                name: self.iface.config_name(),
                description: None,
                if_type: SOFTWARE_LOOPBACK,
                enabled,
                ipv4: None,
            },
        }
    }

    /// Send one request, retrying only when no answer came back.
    async fn request<T: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&T>,
    ) -> Result<reqwest::Response, RestconfError> {
        let payload = body.map(serde_json::to_vec).transpose()?;
        let mut delay = Duration::ZERO;
        let mut attempt = 1;

        loop {
            let mut req = self
                .http
                .request(method.clone(), url)
                .basic_auth(
                    &self.credentials.username,
                    Some(self.credentials.password.expose_secret()),
                )
                .header(ACCEPT, YANG_JSON)
                .timeout(self.retry.timeout);
            if let Some(ref payload) = payload {
                req = req.header(CONTENT_TYPE, YANG_JSON).body(payload.clone());
            }

            debug!("{} {} (attempt {})", method, url, attempt);
            match req.send().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let err = RestconfError::from(e);
                    if !err.is_transient() || attempt >= self.retry.attempts {
                        return Err(err);
                    }
                    delay = self.retry.next_delay(delay);
                    warn!("{} {} failed ({}), retrying in {:?}", method, url, err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RestconfError> {
        self.request::<()>(Method::GET, url, None).await
    }

    async fn read_leaves(resp: reqwest::Response) -> Result<InterfaceLeaves, RestconfError> {
        let bytes = resp.bytes().await?;
        let reply: InterfaceReply = serde_json::from_slice(&bytes)?;
        Ok(reply
            .interface
            .and_then(OneOrMany::into_first)
            .unwrap_or_default())
    }

    async fn write(
        &self,
        method: Method,
        url: &str,
        body: &Envelope<InterfaceConfig>,
    ) -> Result<StatusCode, RestconfError> {
        Ok(self.request(method, url, Some(body)).await?.status())
    }
}

fn failure_kind(err: &RestconfError) -> FailureKind {
    warn!("RESTCONF call failed: {}", err);
    if err.is_transient() {
        FailureKind::Unreachable
    } else {
        FailureKind::Protocol
    }
}

fn rejected(status: StatusCode) -> TransportResult {
    debug!("RESTCONF rejected with {}", status);
    FailureKind::Rejected.into()
}

impl InterfaceLifecycle for RestconfClient {
    async fn exists(&self, ip: &str) -> Result<bool, FailureKind> {
        let status = self
            .get(&self.config_url(ip))
            .await
            .map_err(|e| failure_kind(&e))?
            .status();

        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => {
                debug!("Presence check answered {}", s);
                Err(FailureKind::Rejected)
            }
        }
    }

    async fn create_interface(&self, ip: &str) -> TransportResult {
        let body = self.full_config();

        match self.write(Method::POST, &self.config_root(ip), &body).await {
            Ok(s) if s.is_success() => return TransportResult::Created,
            Ok(StatusCode::CONFLICT) => return TransportResult::AlreadyExists,
            Ok(s) => debug!("POST answered {}, falling back to PUT", s),
            Err(e) => return failure_kind(&e).into(),
        }

        match self.write(Method::PUT, &self.config_url(ip), &body).await {
            Ok(s) if s.is_success() => TransportResult::Created,
            Ok(StatusCode::CONFLICT) => TransportResult::AlreadyExists,
            Ok(s) => rejected(s),
            Err(e) => failure_kind(&e).into(),
        }
    }

    async fn delete_interface(&self, ip: &str) -> TransportResult {
        match self
            .request::<()>(Method::DELETE, &self.config_url(ip), None)
            .await
        {
            Ok(resp) if resp.status().is_success() => TransportResult::Deleted,
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => TransportResult::NotFound,
            Ok(resp) => rejected(resp.status()),
            Err(e) => failure_kind(&e).into(),
        }
    }

    async fn apply_enabled(&self, ip: &str, enabled: bool) -> TransportResult {
        let body = self.enabled_patch(enabled);

        match self.write(Method::PATCH, &self.config_url(ip), &body).await {
            Ok(s) if s.is_success() && enabled => TransportResult::Enabled,
            Ok(s) if s.is_success() => TransportResult::Disabled,
            Ok(StatusCode::NOT_FOUND) => TransportResult::NotFound,
            Ok(s) => rejected(s),
            Err(e) => failure_kind(&e).into(),
        }
    }

    async fn read_state(&self, ip: &str) -> Result<InterfaceState, FailureKind> {
        let name = self.iface.config_name();

        let resp = self
            .get(&self.config_url(ip))
            .await
            .map_err(|e| failure_kind(&e))?;
        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Ok(InterfaceState::absent(name)),
            s => {
                debug!("Config read answered {}", s);
                return Err(FailureKind::Rejected);
            }
        }
        let admin_enabled = Self::read_leaves(resp)
            .await
            .map_err(|e| failure_kind(&e))?
            .enabled
            .unwrap_or(false);

        let resp = self
            .get(&self.state_url(ip))
            .await
            .map_err(|e| failure_kind(&e))?;
        let oper_status = if resp.status().is_success() {
            match Self::read_leaves(resp).await {
                Ok(leaves) => leaves
                    .oper_status
                    .as_deref()
                    .map(OperStatus::from_yang)
                    .unwrap_or(OperStatus::Unknown),
                Err(e) => {
                    debug!("Unreadable state reply: {}", e);
                    OperStatus::Unknown
                }
            }
        } else {
            OperStatus::Unknown
        };

        Ok(InterfaceState {
            name,
            exists: true,
            admin_enabled,
            oper_status,
        })
    }
}

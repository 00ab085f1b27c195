//! Error types for routerbot.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong below the chat layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("RESTCONF error: {0}")]
    Restconf(#[from] RestconfError),

    #[error("NETCONF error: {0}")]
    Netconf(#[from] NetconfError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns `true` when the failure means the device could not be reached
    /// (connect, timeout, dropped session) rather than a protocol-level refusal.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => !matches!(e, TransportError::AuthenticationFailed { .. }),
            Self::Channel(e) => matches!(e, ChannelError::Closed | ChannelError::PatternTimeout(_)),
            Self::Restconf(e) => e.is_transient(),
            Self::Netconf(NetconfError::Closed | NetconfError::Timeout(_)) => true,
            _ => false,
        }
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    #[error("Subsystem '{name}' rejected by server")]
    SubsystemRejected { name: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, PTY reads).
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    #[error("Channel closed")]
    Closed,

    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Driver not connected - call open() first")]
    NotConnected,

    #[error("Driver already connected")]
    AlreadyConnected,

    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// RESTCONF client errors.
#[derive(Error, Debug)]
pub enum RestconfError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Body(#[from] serde_json::Error),
}

impl RestconfError {
    /// Returns `true` if the request never got an answer and is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Body(_) => false,
        }
    }
}

/// NETCONF session errors.
#[derive(Error, Debug)]
pub enum NetconfError {
    #[error("NETCONF session closed")]
    Closed,

    /// No complete message within the timeout
    #[error("No NETCONF reply within {0:?}")]
    Timeout(Duration),

    #[error("Malformed reply: {0}")]
    Xml(String),

    #[error("Channel SSH error: {0}")]
    Ssh(#[from] russh::Error),
}

impl From<quick_xml::Error> for NetconfError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Messaging gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Messaging API replied with a non-success status
    #[error("Incorrect reply from messaging API. Status code: {status}")]
    Status { status: u16 },
}

/// Config export job errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Job could not be started
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! SSH connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// Where and how to connect. Terminal size only matters for PTY shells.
///
/// Routers are reached with password authentication and their host keys
/// are not checked; lab images regenerate them on every rebuild.
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    /// 22 for the CLI, 830 for NETCONF.
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Connect timeout; also the read timeout of sessions built on top.
    pub timeout: Duration,
    pub terminal_width: u32,
    pub terminal_height: u32,
}

impl SshConfig {
    /// Config with a wide terminal so `show` output is not wrapped.
    pub fn with_password(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password,
            timeout,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// `host:port`, for logs.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

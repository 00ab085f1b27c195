//! CLI driver construction.

use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{DriverError, Result};
use crate::platform::{PlatformDefinition, cisco_iosxe};
use crate::transport::SshConfig;

/// Builds a [`GenericDriver`] for one router.
///
/// ```rust,no_run
/// use routerbot::driver::{Driver, DriverBuilder};
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), routerbot::Error> {
/// let mut driver = DriverBuilder::new("10.0.15.61")
///     .username("admin")
///     .password(SecretString::from("cisco".to_string()))
///     .build()?;
/// driver.open().await?;
/// let response = driver.send_command("show ip interface brief").await?;
/// println!("{}", response.result);
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: String,
    password: Option<SecretString>,
    timeout: Duration,
    enable_secret: Option<SecretString>,
    platform: Option<PlatformDefinition>,
}

impl DriverBuilder {
    /// SSH on port 22, 30 s timeout, Cisco IOS-XE.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: String::new(),
            password: None,
            timeout: Duration::from_secs(30),
            enable_secret: None,
            platform: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    /// Secret sent at the `enable` password prompt. Without one the login
    /// password is tried.
    pub fn enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }

    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Connect timeout, and the longest wait for any prompt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The driver is returned closed; `open()` connects.
    pub fn build(self) -> Result<GenericDriver> {
        if self.username.is_empty() {
            return Err(invalid("username is required"));
        }
        let Some(password) = self.password else {
            return Err(invalid("password is required"));
        };

        let ssh = SshConfig::with_password(self.host, self.port, self.username, password, self.timeout);
        let platform = self.platform.unwrap_or_else(cisco_iosxe::platform);
        GenericDriver::new(ssh, platform, self.enable_secret)
    }
}

fn invalid(message: &str) -> crate::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;

    #[test]
    fn test_build_requires_username() {
        let result = DriverBuilder::new("10.0.15.61").build();
        assert!(matches!(
            result,
            Err(crate::Error::Driver(DriverError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn test_build_requires_password() {
        let result = DriverBuilder::new("10.0.15.61").username("admin").build();
        assert!(matches!(
            result,
            Err(crate::Error::Driver(DriverError::InvalidConfig { ref message })) if message.contains("password")
        ));
    }

    #[test]
    fn test_build_defaults_to_iosxe() {
        let driver = DriverBuilder::new("10.0.15.61")
            .username("admin")
            .password(SecretString::from("cisco".to_string()))
            .build()
            .unwrap();
        assert_eq!(driver.platform().name, cisco_iosxe::PLATFORM_NAME);
        assert!(!driver.is_open());
        assert!(driver.current_privilege().is_none());
    }
}

//! Router login credentials shared by every transport.

use secrecy::SecretString;

/// Username, password and optional enable secret for the managed routers.
#[derive(Debug, Clone)]
pub struct RouterCredentials {
    pub username: String,
    /// Login password; also answers the `enable` prompt when no enable
    /// secret is set.
    pub password: SecretString,
    pub enable_secret: Option<SecretString>,
}

impl RouterCredentials {
    /// Credentials without an enable secret.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            enable_secret: None,
        }
    }

    /// Secret for privileged exec, when it differs from the login password.
    pub fn with_enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }
}

//! PTY-shell driver steered by a platform definition.

use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::Driver;
use super::privilege::PrivilegeManager;
use super::response::Response;
use crate::channel::PtyChannel;
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// How many bytes of the buffer tail are searched for a prompt.
const PROMPT_SEARCH_DEPTH: usize = 1000;

/// Open SSH connection plus its shell channel.
struct Connection {
    transport: SshTransport,
    channel: PtyChannel,
}

/// Driver that runs commands on a PTY shell, guided by a platform definition.
pub struct GenericDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    enable_secret: Option<SecretString>,
    connection: Option<Connection>,
    privilege_manager: PrivilegeManager,
    timeout: Duration,
    prompt_pattern: Regex,
}

impl GenericDriver {
    /// Nothing is connected until [`Driver::open`].
    pub fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        enable_secret: Option<SecretString>,
    ) -> Result<Self> {
        if platform.get_privilege(&platform.default_privilege).is_none() {
            return Err(PlatformError::InvalidDefinition {
                message: format!(
                    "default privilege '{}' is not defined",
                    platform.default_privilege
                ),
            }
            .into());
        }

        let prompt_pattern = Self::build_combined_pattern(&platform)?;
        let privilege_manager = PrivilegeManager::new(platform.privilege_levels.clone());

        Ok(Self {
            timeout: ssh_config.timeout,
            ssh_config,
            platform,
            enable_secret,
            connection: None,
            privilege_manager,
            prompt_pattern,
        })
    }

    /// One regex matching the prompt of any privilege level.
    fn build_combined_pattern(platform: &PlatformDefinition) -> Result<Regex> {
        let combined = platform
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.prompt.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        Regex::new(&combined).map_err(|e| {
            PlatformError::InvalidDefinition {
                message: format!("prompt patterns do not combine: {e}"),
            }
            .into()
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    fn channel(&mut self) -> Result<&mut PtyChannel> {
        self.connection
            .as_mut()
            .map(|conn| &mut conn.channel)
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    /// Password answered at an escalation prompt: the enable secret when
    /// set, the login password otherwise.
    fn escalation_secret(&self) -> &SecretString {
        match &self.enable_secret {
            Some(secret) if !secret.expose_secret().is_empty() => secret,
            _ => &self.ssh_config.password,
        }
    }

    /// Read until a prompt and record the privilege level it belongs to.
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let timeout = self.timeout;
        let pattern = self.prompt_pattern.clone();
        let data = self.channel()?.read_until(&pattern, timeout).await?;

        let output = String::from_utf8_lossy(&data).into_owned();
        let prompt = last_line(&output).to_string();

        if let Err(e) = self.privilege_manager.observe_prompt(&prompt) {
            debug!("Prompt {:?} does not match a known level: {}", prompt, e);
        }

        Ok((output, prompt))
    }

    /// Send input and wait for the prompt, producing a checked response.
    async fn exchange(&mut self, lines: &[&str], command: &str) -> Result<Response> {
        let start = Instant::now();

        let channel = self.channel()?;
        for line in lines {
            channel.send(line).await?;
        }

        let (raw, prompt) = self.read_until_prompt().await?;
        let result = self.platform.normalize_output(&raw, command);
        let response = Response::new(command, result, prompt, start.elapsed());

        match self.platform.detect_failure(&response.result) {
            Some(pattern) => {
                debug!("Command {:?} failed: {}", command, pattern);
                let pattern = pattern.to_string();
                Ok(response.with_failure(pattern))
            }
            None => Ok(response),
        }
    }

    async fn run_on_open_commands(&mut self) -> Result<()> {
        for cmd in self.platform.on_open_commands.clone() {
            self.send_command(&cmd).await?;
        }
        Ok(())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(self.ssh_config.clone()).await?;
        let shell = transport.open_shell().await?;
        self.connection = Some(Connection {
            transport,
            channel: PtyChannel::new(shell, PROMPT_SEARCH_DEPTH),
        });

        let (_, prompt) = self.read_until_prompt().await?;
        debug!("Initial prompt on {}: {:?}", self.ssh_config.host, prompt);

        let default = self.platform.default_privilege.clone();
        self.acquire_privilege(&default).await?;
        self.run_on_open_commands().await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(Connection { transport, channel }) = self.connection.take() {
            let channel_result = channel.close().await;
            transport.close().await?;
            channel_result?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.exchange(&[command], command).await
    }

    async fn send_config(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        self.acquire_privilege("configuration").await?;

        let mut responses = Vec::with_capacity(commands.len());
        for item in commands {
            let lines: Vec<&str> = item.lines().collect();
            let echo = lines.first().copied().unwrap_or_default();
            let response = self.exchange(&lines, echo).await?;
            let failed = !response.is_success();
            responses.push(response);
            if failed {
                break;
            }
        }

        let default = self.platform.default_privilege.clone();
        self.acquire_privilege(&default).await?;
        Ok(responses)
    }

    async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        if self.privilege_manager.current() == Some(target) {
            return Ok(());
        }

        for step in self.privilege_manager.plan(target)? {
            trace!("Privilege step {:?} -> {}", step.command, step.target);
            self.channel()?.send(&step.command).await?;

            if let Some(password_prompt) = step.password_prompt {
                let timeout = self.timeout;
                let either = Regex::new(&format!(
                    "(?:{})|(?:{})",
                    password_prompt.as_str(),
                    self.prompt_pattern.as_str()
                ))
                .map_err(crate::error::ChannelError::from)?;

                let data = self.channel()?.read_until(&either, timeout).await?;
                let text = String::from_utf8_lossy(&data);

                if password_prompt.is_match(last_line(&text).as_bytes()) {
                    let secret = self.escalation_secret().expose_secret().to_string();
                    self.channel()?.send(&secret).await?;
                    self.read_until_prompt().await?;
                } else if let Err(e) = self
                    .privilege_manager
                    .observe_prompt(last_line(&text))
                {
                    debug!("Unrecognized prompt after {:?}: {}", step.command, e);
                }
            } else {
                self.read_until_prompt().await?;
            }

            if self.privilege_manager.current() != Some(step.target.as_str()) {
                return Err(DriverError::PrivilegeAcquisitionFailed {
                    target: step.target,
                }
                .into());
            }
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn current_privilege(&self) -> Option<&str> {
        self.privilege_manager.current()
    }
}

/// Last non-empty line of the output, trimmed; the prompt lives there.
fn last_line(output: &str) -> &str {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

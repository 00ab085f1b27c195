//! SSH transport layer wrapping russh.
//!
//! Handles connection setup, password authentication and channel creation. Both the CLI driver (PTY shell) and the NETCONF session
//! (`netconf` subsystem) sit on top of [`SshTransport`].

pub mod config;
mod ssh;

pub use config::SshConfig;
pub use ssh::SshTransport;

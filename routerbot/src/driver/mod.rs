//! CLI driver for interactive router sessions.
//!
//! The driver opens a PTY shell over SSH, settles on the platform's default
//! privilege level and then runs commands, waiting for the prompt after each.

mod builder;
mod generic;
mod privilege;
mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::{PrivilegeManager, Step};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// A prompt-driven CLI session with a router.
///
/// Command failures reported by the router (`% Invalid input` and friends)
/// are not errors; they come back as a [`Response`] with a failure message.
/// Errors mean the session itself broke.
pub trait Driver: Send {
    /// Connect, log in and reach the default privilege level.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run one command in the current mode.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Enter configuration mode, apply `commands` and go back to the default
    /// level. Stops at the first command the router rejects.
    ///
    /// An item spanning several lines (a `banner motd` block, for instance)
    /// is written line by line and the prompt is awaited once, after its
    /// last line.
    fn send_config(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send;

    /// Move to the named privilege level.
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;

    fn is_open(&self) -> bool;

    fn current_privilege(&self) -> Option<&str>;
}

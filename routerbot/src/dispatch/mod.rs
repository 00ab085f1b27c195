//! Chat command handling: grammar, per-loop session state and routing.

pub mod command;
mod dispatcher;
mod session;

#[cfg(test)]
pub(crate) mod fakes;

pub use command::Command;
pub use dispatcher::{AllowList, Dispatcher, Reply, RouterIdentity};
pub use session::Session;

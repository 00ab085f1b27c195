//! Device operations on the managed router.
//!
//! The loopback lifecycle runs over RESTCONF or NETCONF behind
//! [`InterfaceLifecycle`]; summary and banner work goes over the CLI
//! behind [`DeviceCli`]. Drivers report [`TransportResult`]s and the
//! [`outcome`] module turns them into chat replies.

pub mod cli;
mod credentials;
mod interface;
mod lifecycle;
pub mod netconf;
pub mod outcome;
pub mod restconf;

pub use cli::{CliDevice, DeviceCli};
pub use credentials::RouterCredentials;
pub use interface::{InterfaceState, LoopbackInterface, OperStatus};
pub use lifecycle::{InterfaceLifecycle, TransportMethod};
pub use netconf::NetconfClient;
pub use outcome::{FailureKind, TransportResult, Verb};
pub use restconf::{RestconfClient, RetryPolicy};

//! # routerbot
//!
//! Chat-driven router automation.
//!
//! The bot polls a Webex room for commands addressed to one operator ID and
//! runs them against Cisco IOS-XE routers:
//!
//! - loopback create/delete/enable/disable/status over RESTCONF or NETCONF
//! - interface summary and MOTD banner over an SSH CLI session
//! - running-config backup through `ansible-playbook`, uploaded to the room
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use routerbot::device::{
//!     CliDevice, LoopbackInterface, NetconfClient, RestconfClient, RetryPolicy,
//!     RouterCredentials,
//! };
//! use routerbot::dispatch::{AllowList, Dispatcher, Session};
//! use routerbot::export::{AnsibleRunner, Exporter};
//! use routerbot::gateway::{DEFAULT_API_URL, WebexClient};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let iface = LoopbackInterface::new("66070315")?;
//!     let creds = RouterCredentials::new("admin", SecretString::from("cisco".to_string()));
//!     let timeout = Duration::from_secs(10);
//!
//!     let dispatcher = Dispatcher::new(
//!         iface.clone(),
//!         AllowList::new(["10.0.15.61"]),
//!         RestconfClient::new(iface.clone(), creds.clone(), 443, RetryPolicy::default())?,
//!         NetconfClient::new(iface.clone(), creds.clone(), 830, timeout),
//!         CliDevice::new(creds.clone(), 22, timeout),
//!         Exporter::new(AnsibleRunner::new(
//!             "ansible",
//!             "66070315",
//!             "CSR-1000V",
//!             creds,
//!             timeout,
//!         )),
//!     );
//!
//!     let gateway = WebexClient::new(
//!         DEFAULT_API_URL,
//!         SecretString::from("token".to_string()),
//!         "room-id",
//!     )?;
//!     let mut session = Session::new();
//!     let reply = dispatcher
//!         .dispatch(&mut session, "/66070315 restconf", &gateway)
//!         .await?;
//!     println!("{reply:?}");
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod channel;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod export;
pub mod gateway;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use bot::Bot;
pub use config::{BotConfig, Settings};
pub use device::{InterfaceLifecycle, LoopbackInterface, TransportMethod, TransportResult};
pub use dispatch::{Dispatcher, Reply, Session};
pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::{Error, Result};
pub use gateway::{MessagingGateway, WebexClient};
pub use platform::{PlatformDefinition, PrivilegeLevel};
pub use transport::SshConfig;

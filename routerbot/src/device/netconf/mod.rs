//! NETCONF lifecycle driver.

mod client;
mod session;
pub mod xml;

pub use client::NetconfClient;
pub use session::NetconfSession;

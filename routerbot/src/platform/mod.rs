//! Platform definitions for the managed routers.
//!
//! A platform describes prompts, privilege levels, failure markers and the
//! commands to run right after login.

pub mod cisco_iosxe;
mod definition;
mod privilege_level;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;

//! Cisco IOS-XE platform definition.
//!
//! Privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//! - `configuration` - Global and sub-configuration modes with `(config*)#` prompt
//!
//! ```text
//! CSR1kv>                   # exec
//! CSR1kv#                   # privilege_exec
//! CSR1kv(config)#           # configuration
//! CSR1kv(config-if)#        # configuration (interface sub-mode)
//! ```

use super::{PlatformDefinition, PrivilegeLevel};

/// Platform name for Cisco IOS-XE.
pub const PLATFORM_NAME: &str = "cisco_iosxe";

/// Create the Cisco IOS-XE platform definition.
pub fn platform() -> PlatformDefinition {
    // The patterns are literals; compilation cannot fail.
    let exec = PrivilegeLevel::root("exec", r"(?m)^[\w.\-@()/: ]{1,63}>\s?$")
        .expect("valid exec prompt pattern");

    let privilege_exec = PrivilegeLevel::child(
        "privilege_exec",
        r"(?m)^[\w.\-@/: ]{1,63}#\s?$",
        "exec",
        "enable",
        "disable",
    )
    .and_then(|level| level.requiring_password(r"(?mi)^\s*password:\s?$"))
    .expect("valid privilege_exec patterns")
    .excluding("(config");

    let configuration = PrivilegeLevel::child(
        "configuration",
        r"(?m)^[\w.\-@/: ]{1,63}\(config[\w.\-@/:+]{0,32}\)#\s?$",
        "privilege_exec",
        "configure terminal",
        "end",
    )
    .expect("valid configuration prompt pattern");

    PlatformDefinition::new(PLATFORM_NAME)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
}

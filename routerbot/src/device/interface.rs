//! The operator's loopback interface and its observed state.

use std::fmt;

use crate::error::ConfigError;

/// Netmask of every operator loopback.
pub const LOOPBACK_NETMASK: &str = "255.255.255.0";

/// The loopback interface owned by one operator, `Loopback{operator_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackInterface {
    operator_id: String,
}

impl LoopbackInterface {
    /// The operator ID must be all digits and at least three long; the last
    /// three digits pick the loopback address.
    pub fn new(operator_id: impl Into<String>) -> Result<Self, ConfigError> {
        let operator_id = operator_id.into();
        if operator_id.len() < 3 || !operator_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Validation {
                field: "STUDENT_ID".to_string(),
                reason: format!("'{operator_id}' must be at least three digits"),
            });
        }
        Ok(Self { operator_id })
    }

    /// The operator ID this loopback was derived from.
    pub fn operator_id(&self) -> &str {
        &self.operator_id
    }

    /// Name as configured on the device, e.g. `Loopback66070315`.
    pub fn config_name(&self) -> String {
        format!("Loopback{}", self.operator_id)
    }

    /// Name as shown in chat replies, e.g. `loopback 66070315`.
    pub fn display_name(&self) -> String {
        format!("loopback {}", self.operator_id)
    }

    /// `172.{d1}.{d2d3}.1` from the last three digits of the operator ID.
    pub fn ipv4_address(&self) -> String {
        let last3 = &self.operator_id[self.operator_id.len() - 3..];
        let second: u32 = last3[..1].parse().unwrap_or_default();
        let third: u32 = last3[1..].parse().unwrap_or_default();
        format!("172.{second}.{third}.1")
    }

    /// Always a /24.
    pub fn netmask(&self) -> &'static str {
        LOOPBACK_NETMASK
    }

    /// Interface description written on create.
    pub fn description(&self) -> String {
        format!("Student {} loopback", self.operator_id)
    }
}

/// Operational status as reported by the state plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperStatus {
    Up,
    Down,
    Unknown,
}

impl OperStatus {
    /// Map an `ietf-interfaces` `oper-status` value. Every non-up state
    /// other than `unknown` (dormant, lowerLayerDown, ...) counts as down.
    pub fn from_yang(value: &str) -> Self {
        match value.trim() {
            "up" => Self::Up,
            "" | "unknown" => Self::Unknown,
            _ => Self::Down,
        }
    }
}

impl fmt::Display for OperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Unknown => "unknown",
        })
    }
}

/// Live view of the loopback, computed per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceState {
    pub name: String,
    pub exists: bool,
    pub admin_enabled: bool,
    pub oper_status: OperStatus,
}

impl InterfaceState {
    /// State of an interface the device does not have.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            admin_enabled: false,
            oper_status: OperStatus::Unknown,
        }
    }
}

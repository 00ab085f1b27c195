use crate::device::TransportMethod;

/// Per-loop chat state. Starts with no transport method selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Set by a bare `restconf` / `netconf` message; lifecycle verbs need it.
    pub method: Option<TransportMethod>,
}

impl Session {
    /// A session with no method chosen yet.
    pub fn new() -> Self {
        Self::default()
    }
}

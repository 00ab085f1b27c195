//! Interface lifecycle operations shared by the structured transports.

use std::fmt;
use std::future::Future;

use super::interface::InterfaceState;
use super::outcome::{FailureKind, TransportResult, Verb};

/// Transport used for lifecycle commands, chosen per chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMethod {
    Restconf,
    Netconf,
}

impl TransportMethod {
    /// Parse a chat token, case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "restconf" => Some(Self::Restconf),
            "netconf" => Some(Self::Netconf),
            _ => None,
        }
    }

    /// Label used in chat replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::Restconf => "Restconf",
            Self::Netconf => "Netconf",
        }
    }
}

impl fmt::Display for TransportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Create/delete/enable/disable/status of the operator loopback on a router.
///
/// Implementors provide the raw device calls; the guarded operations check
/// presence first so that a create on an existing interface (or a change to
/// a missing one) never issues a mutating call. Failures come back as
/// [`TransportResult::TransportError`], never as errors.
pub trait InterfaceLifecycle: Send + Sync {
    /// Whether the loopback is configured on the router.
    fn exists(&self, ip: &str) -> impl Future<Output = Result<bool, FailureKind>> + Send;

    /// Configure the loopback. Called only when it is absent.
    fn create_interface(&self, ip: &str) -> impl Future<Output = TransportResult> + Send;

    /// Remove the loopback. Called only when it is present.
    fn delete_interface(&self, ip: &str) -> impl Future<Output = TransportResult> + Send;

    /// Set the admin state. Called only when the loopback is present.
    fn apply_enabled(&self, ip: &str, enabled: bool)
    -> impl Future<Output = TransportResult> + Send;

    /// Read admin and oper state from the configuration and state planes.
    fn read_state(
        &self,
        ip: &str,
    ) -> impl Future<Output = Result<InterfaceState, FailureKind>> + Send;

    fn create(&self, ip: &str) -> impl Future<Output = TransportResult> + Send {
        async move {
            match self.exists(ip).await {
                Ok(true) => TransportResult::AlreadyExists,
                Ok(false) => self.create_interface(ip).await,
                Err(kind) => kind.into(),
            }
        }
    }

    fn delete(&self, ip: &str) -> impl Future<Output = TransportResult> + Send {
        async move {
            match self.exists(ip).await {
                Ok(true) => self.delete_interface(ip).await,
                Ok(false) => TransportResult::NotFound,
                Err(kind) => kind.into(),
            }
        }
    }

    fn set_enabled(&self, ip: &str, enabled: bool) -> impl Future<Output = TransportResult> + Send {
        async move {
            match self.exists(ip).await {
                Ok(true) => self.apply_enabled(ip, enabled).await,
                Ok(false) => TransportResult::NotFound,
                Err(kind) => kind.into(),
            }
        }
    }

    fn status(&self, ip: &str) -> impl Future<Output = TransportResult> + Send {
        async move {
            match self.read_state(ip).await {
                Ok(state) if state.exists => TransportResult::StatusReport {
                    admin_enabled: state.admin_enabled,
                    oper: state.oper_status,
                },
                Ok(_) => TransportResult::NotFound,
                Err(kind) => kind.into(),
            }
        }
    }

    /// Run one verb.
    fn run(&self, verb: Verb, ip: &str) -> impl Future<Output = TransportResult> + Send {
        async move {
            match verb {
                Verb::Create => self.create(ip).await,
                Verb::Delete => self.delete(ip).await,
                Verb::Enable => self.set_enabled(ip, true).await,
                Verb::Disable => self.set_enabled(ip, false).await,
                Verb::Status => self.status(ip).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::device::OperStatus;

    /// In-memory router recording every mutating call.
    #[derive(Default)]
    struct FakeRouter {
        present: Mutex<HashSet<String>>,
        mutations: Mutex<Vec<&'static str>>,
    }

    impl FakeRouter {
        fn mutations(&self) -> Vec<&'static str> {
            self.mutations.lock().unwrap().clone()
        }
    }

    impl InterfaceLifecycle for FakeRouter {
        async fn exists(&self, ip: &str) -> Result<bool, FailureKind> {
            Ok(self.present.lock().unwrap().contains(ip))
        }

        async fn create_interface(&self, ip: &str) -> TransportResult {
            self.mutations.lock().unwrap().push("create");
            self.present.lock().unwrap().insert(ip.to_string());
            TransportResult::Created
        }

        async fn delete_interface(&self, ip: &str) -> TransportResult {
            self.mutations.lock().unwrap().push("delete");
            self.present.lock().unwrap().remove(ip);
            TransportResult::Deleted
        }

        async fn apply_enabled(&self, _ip: &str, enabled: bool) -> TransportResult {
            self.mutations.lock().unwrap().push("enabled");
            if enabled {
                TransportResult::Enabled
            } else {
                TransportResult::Disabled
            }
        }

        async fn read_state(&self, ip: &str) -> Result<InterfaceState, FailureKind> {
            if self.present.lock().unwrap().contains(ip) {
                Ok(InterfaceState {
                    name: "Loopback66070315".into(),
                    exists: true,
                    admin_enabled: true,
                    oper_status: OperStatus::Up,
                })
            } else {
                Ok(InterfaceState::absent("Loopback66070315"))
            }
        }
    }

    #[tokio::test]
    async fn test_create_delete_create() {
        let router = FakeRouter::default();
        let ip = "10.0.15.61";

        assert_eq!(router.run(Verb::Create, ip).await, TransportResult::Created);
        assert_eq!(router.run(Verb::Delete, ip).await, TransportResult::Deleted);
        assert_eq!(router.run(Verb::Create, ip).await, TransportResult::Created);
    }

    #[tokio::test]
    async fn test_create_existing_does_not_mutate() {
        let router = FakeRouter::default();
        let ip = "10.0.15.61";

        router.create(ip).await;
        assert_eq!(router.create(ip).await, TransportResult::AlreadyExists);
        assert_eq!(router.mutations(), vec!["create"]);
    }

    #[tokio::test]
    async fn test_missing_interface() {
        let router = FakeRouter::default();
        let ip = "10.0.15.62";

        assert_eq!(router.delete(ip).await, TransportResult::NotFound);
        assert_eq!(router.set_enabled(ip, false).await, TransportResult::NotFound);
        assert_eq!(router.status(ip).await, TransportResult::NotFound);
        assert!(router.mutations().is_empty());
    }

    #[test]
    fn test_method_tokens() {
        assert_eq!(
            TransportMethod::from_token("RESTCONF"),
            Some(TransportMethod::Restconf)
        );
        assert_eq!(TransportMethod::from_token("netconf"), Some(TransportMethod::Netconf));
        assert_eq!(TransportMethod::from_token("cli"), None);
        assert_eq!(TransportMethod::Netconf.to_string(), "Netconf");
    }
}

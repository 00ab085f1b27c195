//! In-memory collaborators for dispatcher and bot tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::device::outcome::{FailureKind, InterfaceSummary, LinkState, TransportResult};
use crate::device::{DeviceCli, InterfaceLifecycle, InterfaceState, OperStatus};
use crate::error::{ExportError, GatewayError};
use crate::export::{BatchRunner, JobOutcome};
use crate::gateway::{Message, MessagingGateway};

/// Router keyed by IP; the value is the admin state of the loopback.
#[derive(Default)]
pub struct FakeRouter {
    loopbacks: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeRouter {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl InterfaceLifecycle for FakeRouter {
    async fn exists(&self, ip: &str) -> Result<bool, FailureKind> {
        Ok(self.loopbacks.lock().unwrap().contains_key(ip))
    }

    async fn create_interface(&self, ip: &str) -> TransportResult {
        self.calls.lock().unwrap().push("create");
        self.loopbacks.lock().unwrap().insert(ip.to_string(), true);
        TransportResult::Created
    }

    async fn delete_interface(&self, ip: &str) -> TransportResult {
        self.calls.lock().unwrap().push("delete");
        self.loopbacks.lock().unwrap().remove(ip);
        TransportResult::Deleted
    }

    async fn apply_enabled(&self, ip: &str, enabled: bool) -> TransportResult {
        self.calls
            .lock()
            .unwrap()
            .push(if enabled { "enable" } else { "disable" });
        self.loopbacks.lock().unwrap().insert(ip.to_string(), enabled);
        if enabled {
            TransportResult::Enabled
        } else {
            TransportResult::Disabled
        }
    }

    async fn read_state(&self, ip: &str) -> Result<InterfaceState, FailureKind> {
        Ok(match self.loopbacks.lock().unwrap().get(ip) {
            Some(&enabled) => InterfaceState {
                name: "Loopback66070315".into(),
                exists: true,
                admin_enabled: enabled,
                oper_status: if enabled { OperStatus::Up } else { OperStatus::Down },
            },
            None => InterfaceState::absent("Loopback66070315"),
        })
    }
}

#[derive(Default)]
pub struct FakeCli {
    pub fail_summary: bool,
    banner: Mutex<Option<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeCli {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl DeviceCli for FakeCli {
    async fn interface_status_summary(&self, _ip: &str) -> Result<InterfaceSummary, FailureKind> {
        self.calls.lock().unwrap().push("summary");
        if self.fail_summary {
            return Err(FailureKind::Unreachable);
        }
        let mut summary = InterfaceSummary::default();
        summary.record("GigabitEthernet1", LinkState::Up);
        summary.record("GigabitEthernet2", LinkState::AdminDown);
        Ok(summary)
    }

    async fn banner_read(&self, _ip: &str) -> Option<String> {
        self.calls.lock().unwrap().push("banner_read");
        self.banner.lock().unwrap().clone()
    }

    async fn banner_set(&self, _ip: &str, text: &str) -> bool {
        self.calls.lock().unwrap().push("banner_set");
        *self.banner.lock().unwrap() = Some(text.to_string());
        true
    }
}

/// Batch job that always exits with status 1.
#[derive(Default)]
pub struct FakeRunner {
    runs: AtomicUsize,
}

impl FakeRunner {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl BatchRunner for FakeRunner {
    fn artifact_name(&self) -> &str {
        "show_run_66070315_CSR-1000V.txt"
    }

    async fn run(&self, _ip: &str) -> Result<JobOutcome, ExportError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(JobOutcome {
            exit_code: Some(1),
            artifact: None,
        })
    }
}

/// Gateway serving queued poll results and recording every post.
#[derive(Default)]
pub struct RecordingGateway {
    inbox: Mutex<VecDeque<Result<Option<Message>, u16>>>,
    posts: Mutex<Vec<String>>,
}

impl RecordingGateway {
    /// Next poll returns `text` with message id `id`.
    pub fn queue(&self, id: &str, text: &str) {
        self.inbox.lock().unwrap().push_back(Ok(Some(Message {
            id: id.to_string(),
            text: text.to_string(),
            person_email: None,
            created: None,
        })));
    }

    /// Next poll fails with this HTTP status.
    pub fn queue_failure(&self, status: u16) {
        self.inbox.lock().unwrap().push_back(Err(status));
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

impl MessagingGateway for RecordingGateway {
    async fn poll_latest_message(&self) -> Result<Option<Message>, GatewayError> {
        match self.inbox.lock().unwrap().pop_front() {
            Some(Ok(message)) => Ok(message),
            Some(Err(status)) => Err(GatewayError::Status { status }),
            None => Ok(None),
        }
    }

    async fn post_text(&self, text: &str) -> Result<(), GatewayError> {
        self.posts.lock().unwrap().push(format!("text:{text}"));
        Ok(())
    }

    async fn post_file(
        &self,
        filename: &str,
        _bytes: Vec<u8>,
        caption: &str,
    ) -> Result<(), GatewayError> {
        self.posts
            .lock()
            .unwrap()
            .push(format!("file:{filename}:{caption}"));
        Ok(())
    }
}

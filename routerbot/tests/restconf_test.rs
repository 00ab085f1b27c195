// Integration tests for `RestconfClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use routerbot::device::outcome::{FailureKind, TransportResult};
use routerbot::device::{
    InterfaceLifecycle, LoopbackInterface, OperStatus, RestconfClient, RetryPolicy,
    RouterCredentials,
};

const ROOT: &str = "/restconf/data/ietf-interfaces:interfaces";
const IFACE: &str = "/restconf/data/ietf-interfaces:interfaces/interface=Loopback66070315";
const STATE: &str = "/restconf/data/ietf-interfaces:interfaces-state/interface=Loopback66070315";

// ── Helpers ─────────────────────────────────────────────────────────

fn retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 2,
        base_delay: Duration::from_millis(10),
        multiplier: 1.5,
        timeout: Duration::from_secs(2),
    }
}

fn client_with(port: u16, retry: RetryPolicy) -> RestconfClient {
    RestconfClient::new(
        LoopbackInterface::new("66070315").unwrap(),
        RouterCredentials::new("admin", SecretString::from("cisco".to_string())),
        port,
        retry,
    )
    .unwrap()
    .with_scheme("http")
}

fn client_on(port: u16) -> RestconfClient {
    client_with(port, retry())
}

async fn setup() -> (MockServer, RestconfClient) {
    let server = MockServer::start().await;
    let client = client_on(server.address().port());
    (server, client)
}

async fn mount_presence(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "ietf-interfaces:interface": { "name": "Loopback66070315", "enabled": true }
        })))
        .mount(server)
        .await;
}

const IP: &str = "127.0.0.1";

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_full_config() {
    let (server, client) = setup().await;
    mount_presence(&server, 404).await;

    Mock::given(method("POST"))
        .and(path(ROOT))
        .and(header("content-type", "application/yang-data+json"))
        .and(body_partial_json(json!({
            "ietf-interfaces:interface": {
                "name": "Loopback66070315",
                "type": "iana-if-type:softwareLoopback",
                "enabled": true,
                "ietf-ip:ipv4": { "address": [{ "ip": "172.3.15.1", "netmask": "255.255.255.0" }] }
            }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.create(IP).await, TransportResult::Created);
}

#[tokio::test]
async fn test_create_existing_sends_no_write() {
    let (server, client) = setup().await;
    mount_presence(&server, 200).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client.create(IP).await, TransportResult::AlreadyExists);
}

#[tokio::test]
async fn test_create_falls_back_to_put() {
    let (server, client) = setup().await;
    mount_presence(&server, 404).await;

    Mock::given(method("POST"))
        .and(path(ROOT))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.create(IP).await, TransportResult::Created);
}

#[tokio::test]
async fn test_create_conflict_is_already_exists() {
    let (server, client) = setup().await;
    mount_presence(&server, 404).await;

    Mock::given(method("POST"))
        .and(path(ROOT))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    assert_eq!(client.create(IP).await, TransportResult::AlreadyExists);
}

#[tokio::test]
async fn test_delete() {
    let (server, client) = setup().await;
    mount_presence(&server, 200).await;

    Mock::given(method("DELETE"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.delete(IP).await, TransportResult::Deleted);
}

#[tokio::test]
async fn test_disable_missing_interface() {
    let (server, client) = setup().await;
    mount_presence(&server, 404).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client.set_enabled(IP, false).await, TransportResult::NotFound);
}

#[tokio::test]
async fn test_disable_patches_enabled_leaf() {
    let (server, client) = setup().await;
    mount_presence(&server, 200).await;

    Mock::given(method("PATCH"))
        .and(path(IFACE))
        .and(body_partial_json(json!({
            "ietf-interfaces:interface": { "name": "Loopback66070315", "enabled": false }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.set_enabled(IP, false).await, TransportResult::Disabled);
}

#[tokio::test]
async fn test_server_error_is_rejected_without_retry() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(
        client.delete(IP).await,
        TransportResult::TransportError {
            kind: FailureKind::Rejected
        }
    );
}

#[tokio::test]
async fn test_client_error_on_write_is_not_retried() {
    let (server, client) = setup().await;
    mount_presence(&server, 200).await;

    Mock::given(method("PATCH"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(
        client.set_enabled(IP, true).await,
        TransportResult::TransportError {
            kind: FailureKind::Rejected
        }
    );
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_reads_both_planes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ietf-interfaces:interface": [{ "name": "Loopback66070315", "enabled": true }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ietf-interfaces:interface": { "name": "Loopback66070315", "oper-status": "down" }
        })))
        .mount(&server)
        .await;

    assert_eq!(
        client.status(IP).await,
        TransportResult::StatusReport {
            admin_enabled: true,
            oper: OperStatus::Down
        }
    );
}

#[tokio::test]
async fn test_status_unknown_oper_when_state_missing() {
    let (server, client) = setup().await;
    mount_presence(&server, 200).await;

    Mock::given(method("GET"))
        .and(path(STATE))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(
        client.status(IP).await,
        TransportResult::StatusReport {
            admin_enabled: true,
            oper: OperStatus::Unknown
        }
    );
}

#[tokio::test]
async fn test_status_without_enabled_leaf_reads_disabled() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ietf-interfaces:interface": { "name": "Loopback66070315" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ietf-interfaces:interface": { "name": "Loopback66070315", "oper-status": "down" }
        })))
        .mount(&server)
        .await;

    assert_eq!(
        client.status(IP).await,
        TransportResult::StatusReport {
            admin_enabled: false,
            oper: OperStatus::Down
        }
    );
}

#[tokio::test]
async fn test_status_never_created() {
    let (server, client) = setup().await;
    mount_presence(&server, 404).await;

    assert_eq!(client.status(IP).await, TransportResult::NotFound);
}

// ── Reachability ────────────────────────────────────────────────────

#[tokio::test]
async fn test_timeouts_are_retried_up_to_attempts() {
    let server = MockServer::start().await;
    let client = client_with(
        server.address().port(),
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            timeout: Duration::from_millis(200),
        },
    );

    Mock::given(method("GET"))
        .and(path(IFACE))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    assert_eq!(
        client.status(IP).await,
        TransportResult::TransportError {
            kind: FailureKind::Unreachable
        }
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.url.path() == IFACE));
}

#[tokio::test]
async fn test_unreachable_router() {
    // Bind and release a port so nothing listens on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_on(port);

    assert_eq!(
        client.create(IP).await,
        TransportResult::TransportError {
            kind: FailureKind::Unreachable
        }
    );
}

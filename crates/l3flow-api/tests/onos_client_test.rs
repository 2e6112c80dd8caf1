#![allow(clippy::unwrap_used)]
// Integration tests for `OnosClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use url::Url;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use l3flow_api::onos::models::{
    CriterionBody, FlowRuleRequest, InstructionBody, SelectorBody, TreatmentBody,
};
use l3flow_api::{BasicAuth, Error, OnosClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn karaf() -> BasicAuth {
    BasicAuth {
        username: "karaf".into(),
        password: "karaf".to_string().into(),
    }
}

fn api_root(server: &MockServer) -> Url {
    Url::parse(&format!("{}/onos/v1", server.uri())).unwrap()
}

async fn setup() -> (MockServer, OnosClient) {
    let server = MockServer::start().await;
    let client = OnosClient::with_client(reqwest::Client::new(), api_root(&server), Some(karaf()));
    (server, client)
}

fn tcp_rule(device: &str) -> FlowRuleRequest {
    FlowRuleRequest {
        priority: 4000,
        timeout: 30,
        is_permanent: false,
        device_id: device.into(),
        treatment: TreatmentBody {
            instructions: vec![InstructionBody::Output { port: "5".into() }],
        },
        selector: SelectorBody {
            criteria: vec![
                CriterionBody::InPort { port: "3".into() },
                CriterionBody::EthType {
                    eth_type: "0x0800".into(),
                },
                CriterionBody::Ipv4Src {
                    ip: "10.0.0.1/32".into(),
                },
                CriterionBody::Ipv4Dst {
                    ip: "10.0.0.2/32".into(),
                },
                CriterionBody::IpProto { protocol: 6 },
            ],
        },
    }
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    let body = json!({
        "devices": [{
            "id": "of:0000000000000001",
            "type": "SWITCH",
            "available": true,
            "role": "MASTER",
            "mfr": "Nicira, Inc.",
            "hw": "Open vSwitch",
            "sw": "2.17.9",
            "serial": "None",
            "driver": "ovs",
            "chassisId": "1",
            "lastUpdate": "1718000000000",
            "humanReadableLastUpdate": "connected 4m ago",
            "annotations": {
                "channelId": "192.168.71.10:53412",
                "managementAddress": "192.168.71.10",
                "protocol": "OF_13"
            }
        }]
    });

    Mock::given(method("GET"))
        .and(path("/onos/v1/devices"))
        .and(basic_auth("karaf", "karaf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "of:0000000000000001");
    assert!(devices[0].available);
    assert_eq!(devices[0].role.as_deref(), Some("MASTER"));
    assert_eq!(devices[0].annotations.protocol.as_deref(), Some("OF_13"));
    assert_eq!(
        devices[0].annotations.management_address.as_deref(),
        Some("192.168.71.10")
    );
}

#[tokio::test]
async fn test_list_hosts() {
    let (server, client) = setup().await;

    let body = json!({
        "hosts": [{
            "id": "AE:96:D1:27:79:73/None",
            "mac": "AE:96:D1:27:79:73",
            "vlan": "None",
            "innerVlan": "None",
            "outerTpid": "0x0000",
            "configured": false,
            "suspended": false,
            "ipAddresses": ["192.168.71.138"],
            "locations": [{"elementId": "of:0000000000000001", "port": "4"}]
        }]
    });

    Mock::given(method("GET"))
        .and(path("/onos/v1/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let hosts = client.list_hosts().await.unwrap();

    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].mac, "AE:96:D1:27:79:73");
    assert_eq!(hosts[0].outer_tpid.as_deref(), Some("0x0000"));
    assert_eq!(hosts[0].ip_addresses, vec!["192.168.71.138".to_string()]);
    assert_eq!(hosts[0].locations[0].element_id, "of:0000000000000001");
    assert_eq!(hosts[0].locations[0].port, "4");
}

#[tokio::test]
async fn test_poll_packets_mixed_payloads() {
    let (server, client) = setup().await;

    let body = json!({
        "packets": [
            {
                "deviceId": "of:01",
                "port": 3,
                "ipv4Packet": {"source": "10.0.0.1", "destination": "10.0.0.2", "protocol": 6}
            },
            {"deviceId": "of:01", "port": "7"}
        ]
    });

    Mock::given(method("GET"))
        .and(path("/onos/v1/packets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let packets = client.poll_packets().await.unwrap();

    assert_eq!(packets.len(), 2);
    let ipv4 = packets[0].ipv4_packet.as_ref().unwrap();
    assert_eq!(ipv4.destination, "10.0.0.2");
    assert_eq!(ipv4.protocol, Some(6));
    assert_eq!(packets[1].port, "7");
    assert!(packets[1].ipv4_packet.is_none());
}

#[tokio::test]
async fn test_empty_envelope_yields_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/onos/v1/packets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client.poll_packets().await.unwrap().is_empty());
}

// ── Flows ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_install_flow_sends_rule_body() {
    let (server, client) = setup().await;

    let expected = json!({
        "priority": 4000,
        "timeout": 30,
        "isPermanent": false,
        "deviceId": "of:01",
        "treatment": {"instructions": [{"type": "OUTPUT", "port": "5"}]},
        "selector": {"criteria": [
            {"type": "IN_PORT", "port": "3"},
            {"type": "ETH_TYPE", "ethType": "0x0800"},
            {"type": "IPV4_SRC", "ip": "10.0.0.1/32"},
            {"type": "IPV4_DST", "ip": "10.0.0.2/32"},
            {"type": "IP_PROTO", "protocol": 6}
        ]}
    });

    Mock::given(method("POST"))
        .and(path("/onos/v1/flows/of:01"))
        .and(basic_auth("karaf", "karaf"))
        .and(body_json(&expected))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", "/onos/v1/flows/of:01/54043196455147472"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.install_flow("of:01", &tcp_rule("of:01")).await.unwrap();

    assert_eq!(ack.status, 201);
    assert_eq!(
        ack.location.as_deref(),
        Some("/onos/v1/flows/of:01/54043196455147472")
    );
}

#[tokio::test]
async fn test_install_flow_accepts_200() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/onos/v1/flows/of:01"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ack = assert_ok!(client.install_flow("of:01", &tcp_rule("of:01")).await);
    assert_eq!(ack.status, 200);
    assert!(ack.location.is_none());
}

#[tokio::test]
async fn test_install_flow_rejects_other_2xx() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/onos/v1/flows/of:01"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = assert_err!(client.install_flow("of:01", &tcp_rule("of:01")).await);
    assert!(matches!(err, Error::Status { status: 204, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_install_flow_bad_request_keeps_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/onos/v1/flows/of:01"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid criterion"))
        .mount(&server)
        .await;

    let result = client.install_flow("of:01", &tcp_rule("of:01")).await;

    match result {
        Err(Error::Status { status, body, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "Invalid criterion");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_clear_flows_accepts_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/onos/v1/flows/of:0000000000000002"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client.clear_flows("of:0000000000000002").await);
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/onos/v1/devices"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    assert!(
        matches!(result, Err(Error::Authentication { status: 401 })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/onos/v1/packets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.poll_packets().await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_malformed_body_reports_deserialization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/onos/v1/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client.list_hosts().await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("not json")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_controller_hits_call_deadline() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: Duration::from_millis(100),
        ..TransportConfig::default()
    };
    let client = OnosClient::new(api_root(&server), Some(karaf()), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/onos/v1/packets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"packets": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.poll_packets().await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let root = Url::parse("http://127.0.0.1:1/onos/v1").unwrap();
    let client = OnosClient::with_client(reqwest::Client::new(), root, None);

    let err = client.list_devices().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient());
}

//! Diagnostic snapshot: ordering and partial-failure tolerance.

use std::time::Duration;

use corelib::HashRing;

use super::helpers::*;
use crate::diagnostics::Diagnostics;

#[tokio::test]
async fn test_snapshot_reports_every_node() {
    let nodes = InMemoryNodes::new();
    let ring = HashRing::new(TEST_RING_SIZE).unwrap();
    for (i, addr) in ["http://a", "http://b", "http://c"].iter().enumerate() {
        nodes.spawn(addr);
        ring.add(*addr, format!("n{}", i));
    }
    let keys = distinct_slot_keys(30);
    place(&nodes, &ring, &keys);

    let diagnostics = Diagnostics::new(nodes.clone(), Duration::from_secs(1));
    let info = diagnostics.snapshot(&ring).await;

    assert_eq!(info.size, TEST_RING_SIZE);
    assert_eq!(info.nodes.len(), 3);
    assert!(info.nodes.windows(2).all(|w| w[0].key < w[1].key));

    let mut total = 0;
    for node in &info.nodes {
        assert_eq!(node.key, ring.position_for(&node.addr));
        assert_eq!(node.slots, Some(TEST_CAPACITY));
        let held = node.keys.as_ref().unwrap();
        assert_eq!(node.filled, Some(held.len()));
        total += held.len();
    }
    assert_eq!(total, 30);
}

#[tokio::test]
async fn test_failing_node_omits_optional_fields() {
    let nodes = InMemoryNodes::new();
    let ring = HashRing::new(TEST_RING_SIZE).unwrap();
    nodes.spawn("http://up");
    nodes.spawn("http://down");
    ring.add("http://up", "up");
    ring.add("http://down", "down");
    nodes.inject("http://down", Fault::Stats);
    nodes.inject("http://down", Fault::Fetch);

    let info = Diagnostics::new(nodes.clone(), Duration::from_secs(1))
        .snapshot(&ring)
        .await;

    let down = info.nodes.iter().find(|n| n.addr == "http://down").unwrap();
    assert_eq!(down.node_id.as_str(), "down");
    assert_eq!(down.slots, None);
    assert_eq!(down.filled, None);
    assert_eq!(down.keys, None);

    let up = info.nodes.iter().find(|n| n.addr == "http://up").unwrap();
    assert_eq!(up.slots, Some(TEST_CAPACITY));
    assert_eq!(up.filled, Some(0));
}

#[tokio::test]
async fn test_hanging_node_times_out() {
    let nodes = InMemoryNodes::new();
    let ring = HashRing::new(TEST_RING_SIZE).unwrap();
    nodes.spawn("http://slow");
    ring.add("http://slow", "slow");
    nodes.inject("http://slow", Fault::Hang);

    let info = Diagnostics::new(nodes.clone(), Duration::from_millis(50))
        .snapshot(&ring)
        .await;

    assert_eq!(info.nodes.len(), 1);
    assert_eq!(info.nodes[0].slots, None);
    assert_eq!(info.nodes[0].keys, None);
}

#[tokio::test]
async fn test_empty_ring_snapshot() {
    let nodes = InMemoryNodes::new();
    let ring = HashRing::new(64).unwrap();
    let info = Diagnostics::new(nodes.clone(), Duration::from_secs(1))
        .snapshot(&ring)
        .await;
    assert_eq!(info.size, 64);
    assert!(info.nodes.is_empty());
}

#[test]
fn test_node_info_json_shape() {
    let info = crate::protocol::NodeInfo {
        node_id: "n1".into(),
        addr: "http://a".to_string(),
        key: 7,
        keys: None,
        slots: Some(100),
        filled: Some(3),
    };
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"nodeID": "n1", "addr": "http://a", "key": 7, "slots": 100, "filled": 3})
    );
}

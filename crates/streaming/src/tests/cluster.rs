//! Cluster membership: routing, migration scheduling, shutdown.

use corelib::NodeId;

use super::helpers::*;
use crate::cluster::{Cluster, ClusterConfig};
use crate::error::StreamingError;

fn cluster(nodes: &std::sync::Arc<InMemoryNodes>) -> Cluster {
    let config = ClusterConfig {
        ring_size: TEST_RING_SIZE,
        ..ClusterConfig::default()
    };
    Cluster::empty(nodes.clone(), &config).unwrap()
}

#[tokio::test]
async fn test_route_on_empty_ring() {
    let nodes = InMemoryNodes::new();
    let cluster = cluster(&nodes);
    assert!(matches!(cluster.route("k"), Err(StreamingError::NoNodes)));
}

#[tokio::test]
async fn test_add_returns_position() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    let cluster = cluster(&nodes);
    let position = cluster.add_node("http://a", "a");
    assert_eq!(position, cluster.ring().position_for("http://a"));
    assert_eq!(cluster.route("anything").unwrap(), "http://a");
}

#[tokio::test]
async fn test_first_join_schedules_nothing() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    let cluster = cluster(&nodes);
    cluster.add_node("http://a", "a");
    assert_eq!(cluster.migration_stats().submitted, 0);
}

#[tokio::test]
async fn test_second_join_schedules_one_migration() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    nodes.spawn("http://b");
    let cluster = cluster(&nodes);
    cluster.add_node("http://a", "a");
    cluster.add_node("http://b", "b");
    cluster.wait_for_migrations().await;

    let stats = cluster.migration_stats();
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(nodes.ops()[0], Op::Fetch("http://a".to_string()));
}

#[tokio::test]
async fn test_remove_last_node_schedules_nothing() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    let cluster = cluster(&nodes);
    cluster.add_node("http://a", "a");
    let departure = cluster.remove_node(&NodeId::from("a")).unwrap();
    assert!(departure.successor.is_none());
    assert_eq!(cluster.migration_stats().submitted, 0);
    assert!(cluster.route("k").is_err());
}

#[tokio::test]
async fn test_remove_unknown_node_is_noop() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    let cluster = cluster(&nodes);
    cluster.add_node("http://a", "a");
    assert!(cluster.remove_node(&NodeId::from("ghost")).is_none());
    assert_eq!(cluster.ring().len(), 1);
    assert_eq!(cluster.migration_stats().submitted, 0);
}

#[tokio::test]
async fn test_membership_survives_shutdown() {
    let nodes = InMemoryNodes::new();
    nodes.spawn("http://a");
    nodes.spawn("http://b");
    let cluster = cluster(&nodes);
    cluster.add_node("http://a", "a");
    cluster.shutdown().await;

    // The queue is closed but the ring still accepts membership changes.
    cluster.add_node("http://b", "b");
    assert_eq!(cluster.ring().len(), 2);
    assert_eq!(cluster.migration_stats().submitted, 0);
    // Nothing pending, so this returns at once.
    cluster.wait_for_migrations().await;
}

#[tokio::test]
async fn test_shutdown_drains_queue() {
    let nodes = InMemoryNodes::new();
    let addrs: Vec<String> = (0..4).map(|i| format!("http://n{}", i)).collect();
    for a in &addrs {
        nodes.spawn(a);
    }
    let cluster = cluster(&nodes);
    cluster.add_node(addrs[0].clone(), "n0");
    let keys = distinct_slot_keys(100);
    place(&nodes, cluster.ring(), &keys);
    for (i, a) in addrs.iter().enumerate().skip(1) {
        cluster.add_node(a.clone(), format!("n{}", i));
    }

    cluster.shutdown().await;

    let stats = cluster.migration_stats();
    assert_eq!(stats.pending(), 0);
    assert_converged(&nodes, cluster.ring(), &keys);
}

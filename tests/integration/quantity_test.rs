//! Integration tests for suggested quantities.

use serde_json::{Value, json};

use candlepin_core::types::PoolId;
use candlepin_rules::request::QuantityRequest;
use candlepin_rules::{SuggestedQuantity, suggested_quantities, suggested_quantity};

use crate::helpers::{consumer, entitlement, pool};

fn request(body: Value) -> QuantityRequest {
    QuantityRequest::from_json(&body.to_string()).unwrap()
}

fn socket_stack_pool(id: &str) -> Value {
    pool(
        id,
        "P",
        &[],
        &[("stacking_id", "S"), ("multi-entitlement", "yes"), ("sockets", "2")],
    )
}

#[test]
fn test_four_socket_consumer_needs_two() {
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "4")], &["P"]),
        "pool": socket_stack_pool("a"),
    }));
    let suggested = suggested_quantity(req.require_pool().unwrap(), &req.consumer, &req.valid_entitlements);
    assert_eq!(
        suggested,
        SuggestedQuantity {
            suggested: 2,
            increment: 1
        }
    );
}

#[test]
fn test_held_entitlements_count_towards_stack() {
    let p = socket_stack_pool("a");
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "8")], &["P"]),
        "pool": p,
        "validEntitlements": [entitlement("e1", &p, 2, -30, 30)],
    }));
    let suggested = suggested_quantity(req.require_pool().unwrap(), &req.consumer, &req.valid_entitlements);
    assert_eq!(suggested.suggested, 2);
}

#[test]
fn test_many_pools_on_the_wire() {
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "4")], &["P"]),
        "pools": [socket_stack_pool("a"), pool("b", "P", &[], &[])],
    }));
    let all = suggested_quantities(&req.pools, &req.consumer, &req.valid_entitlements);
    assert_eq!(all[&PoolId::from("a")].suggested, 2);
    assert_eq!(all[&PoolId::from("b")].suggested, 1);

    let wire = serde_json::to_value(&all).unwrap();
    assert_eq!(wire["a"], json!({"suggested": 2, "increment": 1}));
}

#[test]
fn test_missing_pool_is_reported() {
    let req = request(json!({"consumer": consumer(&[], &[])}));
    assert!(req.require_pool().is_err());
}

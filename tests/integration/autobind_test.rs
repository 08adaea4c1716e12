//! Integration tests for auto-attach pool selection.

use serde_json::{Value, json};

use candlepin_core::config::{AutobindConfig, ComplianceConfig};
use candlepin_core::types::PoolId;
use candlepin_entity::Pool;
use candlepin_rules::autobind::has_no_product_overlap;
use candlepin_rules::request::{AutobindRequest, ComplianceRequest};
use candlepin_rules::{AutobindRules, ComplianceRules};

use crate::helpers::{self, consumer, entitlement, pool};

fn select(body: Value) -> std::collections::BTreeMap<PoolId, i64> {
    let request = AutobindRequest::from_json(&body.to_string()).unwrap();
    AutobindRules::new(AutobindConfig::default()).select_pools(&request)
}

fn socket_stack_pool(id: &str, quantity: i64) -> Value {
    let mut p = pool(
        id,
        "P",
        &[],
        &[("stacking_id", "S"), ("multi-entitlement", "yes"), ("sockets", "2")],
    );
    p["quantity"] = json!(quantity);
    p
}

#[test]
fn test_stack_needs_two_entitlements_for_four_sockets() {
    let selected = select(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "4")], &["P"]),
        "pools": [socket_stack_pool("a", 5), socket_stack_pool("b", 5)],
        "products": ["P"],
    }));

    assert!(!selected.is_empty());
    assert_eq!(selected.values().sum::<i64>(), 2);
}

#[test]
fn test_superset_pool_preferred_over_overlapping_pair() {
    let a = pool("a", "MKT-A", &["X", "Y"], &[]);
    let b = pool("b", "MKT-B", &["X"], &[]);

    let pools: Vec<Pool> = serde_json::from_value(json!([a.clone(), b.clone()])).unwrap();
    let refs: Vec<&Pool> = pools.iter().collect();
    assert!(!has_no_product_overlap(&refs));

    let selected = select(json!({
        "consumer": consumer(&[], &["X", "Y"]),
        "pools": [a, b],
        "products": ["X", "Y"],
    }));
    assert_eq!(selected.len(), 1);
    assert_eq!(selected.get(&PoolId::from("a")), Some(&1));
}

#[test]
fn test_owner_default_service_level_filters_pools() {
    let premium = pool("premium", "P", &[], &[("support_level", "Premium")]);
    let standard = pool("standard", "P", &[], &[("support_level", "Standard")]);

    let selected = select(json!({
        "consumer": consumer(&[], &["P"]),
        "pools": [standard, premium],
        "products": ["P"],
        "owner": {"key": "acme", "defaultServiceLevel": "premium"},
    }));
    assert_eq!(selected.keys().collect::<Vec<_>>(), vec![&PoolId::from("premium")]);
}

#[test]
fn test_exempt_service_level_always_allowed() {
    let self_support = pool("self", "P", &[], &[("support_level", "Self-Support")]);
    let mut physical = consumer(&[], &["P"]);
    physical["serviceLevel"] = json!("Premium");

    let selected = select(json!({
        "consumer": physical,
        "pools": [self_support],
        "products": ["P"],
        "exemptList": ["self-support"],
    }));
    assert_eq!(selected.get(&PoolId::from("self")), Some(&1));
}

#[test]
fn test_partial_stack_is_extended() {
    let stack_pool = socket_stack_pool("a", 10);
    let eight_sockets = consumer(&[("cpu.cpu_socket(s)", "8")], &["P"]);

    let compliance_request = ComplianceRequest::from_json(
        &json!({
            "consumer": eight_sockets,
            "entitlements": [entitlement("e1", &stack_pool, 1, -30, 30)],
            "ondate": helpers::day(0),
        })
        .to_string(),
    )
    .unwrap();
    let status = ComplianceRules::new(ComplianceConfig::default()).status_on_date(
        &compliance_request.consumer,
        &compliance_request.entitlements,
        compliance_request.ondate(),
    );
    assert!(!status.partial_stacks.is_empty());

    let selected = select(json!({
        "consumer": eight_sockets,
        "pools": [stack_pool],
        "products": ["P"],
        "compliance": status,
    }));
    assert_eq!(selected.get(&PoolId::from("a")), Some(&3));
}

#[test]
fn test_nothing_selected_when_already_compliant() {
    let p = pool("a", "P", &[], &[]);
    let physical = consumer(&[], &["P"]);
    let compliance_request = ComplianceRequest::from_json(
        &json!({
            "consumer": physical,
            "entitlements": [entitlement("e1", &p, 1, -30, 30)],
            "ondate": helpers::day(0),
        })
        .to_string(),
    )
    .unwrap();
    let status = ComplianceRules::default().status_on_date(
        &compliance_request.consumer,
        &compliance_request.entitlements,
        compliance_request.ondate(),
    );

    let selected = select(json!({
        "consumer": physical,
        "pools": [p],
        "products": ["P"],
        "compliance": status,
    }));
    assert!(selected.is_empty());
}

//! Integration tests for compliance status and stack coverage.

use chrono::Duration;
use serde_json::json;

use candlepin_core::config::ComplianceConfig;
use candlepin_core::types::{ProductId, StackId};
use candlepin_entity::StatusLabel;
use candlepin_rules::compliance::stack_coverage_of;
use candlepin_rules::request::ComplianceRequest;
use candlepin_rules::{ComplianceRules, is_stack_compliant};

use crate::helpers::{self, base, consumer, entitlement, pool};

fn request(body: serde_json::Value) -> ComplianceRequest {
    ComplianceRequest::from_json(&body.to_string()).unwrap()
}

fn status_for(req: &ComplianceRequest) -> candlepin_entity::ComplianceStatus {
    ComplianceRules::new(ComplianceConfig::default()).get_status(
        &req.consumer,
        &req.entitlements,
        req.ondate(),
        req.calculate_compliant_until,
        req.calculate_product_compliance_date_ranges,
    )
}

fn stacked_pool(id: &str, attrs: &[(&str, &str)]) -> serde_json::Value {
    let mut all = vec![("stacking_id", "S"), ("multi-entitlement", "yes")];
    all.extend_from_slice(attrs);
    pool(id, "P", &[], &all)
}

#[test]
fn test_compliant_until_is_one_second_past_last_entitlement() {
    let p = pool("pool-1", "P", &[], &[]);
    let req = request(json!({
        "consumer": consumer(&[], &["P"]),
        "entitlements": [entitlement("e1", &p, 1, -30, 10)],
        "ondate": helpers::day(0),
    }));

    let status = status_for(&req);
    assert_eq!(status.status, Some(StatusLabel::Valid));
    assert_eq!(
        status.compliant_until,
        Some(base() + Duration::days(10) + Duration::seconds(1))
    );
}

#[test]
fn test_compliant_until_can_be_disabled_per_request() {
    let p = pool("pool-1", "P", &[], &[]);
    let req = request(json!({
        "consumer": consumer(&[], &["P"]),
        "entitlements": [entitlement("e1", &p, 1, -30, 10)],
        "ondate": helpers::day(0),
        "calculateCompliantUntil": false,
    }));
    assert!(status_for(&req).compliant_until.is_none());
}

#[test]
fn test_status_is_idempotent() {
    let stacked = stacked_pool("pool-s", &[("sockets", "2")]);
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "8")], &["P", "Q"]),
        "entitlements": [entitlement("e1", &stacked, 1, -30, 30)],
        "ondate": helpers::day(0),
    }));

    let first = serde_json::to_value(status_for(&req)).unwrap();
    let second = serde_json::to_value(status_for(&req)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_compliant_and_partial_maps_never_share_a_product() {
    let regular = pool("pool-r", "P", &[], &[]);
    let stacked = stacked_pool("pool-s", &[("sockets", "2")]);
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "8")], &["P"]),
        "entitlements": [
            entitlement("e1", &regular, 1, -30, 30),
            entitlement("e2", &stacked, 1, -30, 30),
        ],
        "ondate": helpers::day(0),
    }));

    let status = status_for(&req);
    assert!(status.compliant_products.contains_key(&ProductId::from("P")));
    for key in status.partially_compliant_products.keys() {
        assert!(!status.compliant_products.contains_key(key));
    }
    assert!(status.partial_stacks.contains_key(&StackId::from("S")));
}

#[test]
fn test_partial_stack_status_on_the_wire() {
    let stacked = stacked_pool("pool-s", &[("sockets", "2")]);
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "8")], &["P"]),
        "entitlements": [entitlement("e1", &stacked, 1, -30, 30)],
        "ondate": helpers::day(0),
    }));

    let value = serde_json::to_value(status_for(&req)).unwrap();
    assert_eq!(value["status"], "partial");
    assert!(value["partiallyCompliantProducts"]["P"].is_array());
    assert_eq!(value["reasons"][0]["key"], "SOCKETS");
}

#[test]
fn test_adding_to_a_stack_never_lowers_coverage() {
    let stacked = stacked_pool("pool-s", &[("sockets", "2"), ("cores", "4")]);
    let req = request(json!({
        "consumer": consumer(
            &[("cpu.cpu_socket(s)", "4"), ("cpu.core(s)_per_socket", "1")],
            &["P"]
        ),
        "entitlements": [
            entitlement("e1", &stacked, 1, -30, 30),
            entitlement("e2", &stacked, 1, -30, 30),
        ],
        "ondate": helpers::day(0),
    }));
    let stack = StackId::from("S");

    let one = stack_coverage_of(&req.consumer, &stack, &req.entitlements[..1]);
    let two = stack_coverage_of(&req.consumer, &stack, &req.entitlements);
    assert!(!one.covered);
    assert!(two.covered);
    assert!(two.percentage >= one.percentage);
}

#[test]
fn test_stack_without_enforced_attributes_is_covered() {
    let stacked = stacked_pool("pool-s", &[]);
    let req = request(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "64")], &["P"]),
        "entitlements": [entitlement("e1", &stacked, 1, -30, 30)],
        "stackId": "S",
    }));
    let stack = req.stack_id.clone().unwrap();
    assert!(is_stack_compliant(&req.consumer, &stack, &req.entitlements));
}

#[test]
fn test_unlimited_guest_limit_dominates() {
    let limited = stacked_pool("pool-s", &[("guest_limit", "2")]);
    let unlimited = pool("pool-u", "Q", &[], &[("guest_limit", "-1")]);
    let guests: Vec<serde_json::Value> = (0..5)
        .map(|i| {
            json!({
                "guestId": format!("g{i}"),
                "attributes": {"virtWhoType": "libvirt", "active": "1"}
            })
        })
        .collect();

    let only_limited = request(json!({
        "consumer": consumer(&[], &["P"]),
        "entitlements": [entitlement("e1", &limited, 1, -30, 30)],
        "guestIds": guests,
    }));
    let stack = StackId::from("S");
    assert_eq!(only_limited.consumer.active_guest_count(), 5);
    assert!(!is_stack_compliant(&only_limited.consumer, &stack, &only_limited.entitlements));

    let with_unlimited = request(json!({
        "consumer": consumer(&[], &["P"]),
        "entitlements": [
            entitlement("e1", &limited, 1, -30, 30),
            entitlement("e2", &unlimited, 1, -30, 30),
        ],
        "guestIds": guests,
    }));
    assert!(is_stack_compliant(&with_unlimited.consumer, &stack, &with_unlimited.entitlements));
}

#[test]
fn test_inverted_entitlement_is_rejected() {
    let p = pool("pool-1", "P", &[], &[]);
    let body = json!({
        "consumer": consumer(&[], &["P"]),
        "entitlements": [entitlement("e1", &p, 1, 10, -10)],
    });
    assert!(ComplianceRequest::from_json(&body.to_string()).is_err());
}

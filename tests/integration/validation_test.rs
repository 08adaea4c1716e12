//! Integration tests for pre-entitlement validation, pool types and
//! activation keys.

use serde_json::{Value, json};

use candlepin_core::types::PoolId;
use candlepin_rules::arch::architecture_matches;
use candlepin_rules::request::{ActivationKeyRequest, PoolTypeRequest, ValidationRequest};
use candlepin_rules::{EntitlementRules, PoolType, PoolTypeResult, ValidationResult, validate_key_pool};

use crate::helpers::{self, base, consumer, pool, with_pool_attr};

fn validate(body: Value) -> ValidationResult {
    let request = ValidationRequest::from_json(&body.to_string()).unwrap();
    EntitlementRules::default().validate_pool(&request, base()).unwrap()
}

fn guest() -> Value {
    consumer(&[("virt.is_guest", "true"), ("virt.uuid", "guest-1")], &["P"])
}

#[test]
fn test_physical_only_pool_blocks_guest_bind() {
    let physical_only = with_pool_attr(pool("p", "P", &[], &[]), "physical_only", "true");

    let bind = validate(json!({
        "consumer": guest(),
        "pool": physical_only,
        "quantity": 1,
        "caller": "bind",
    }));
    assert_eq!(bind.errors, vec!["rulefailed.physical.only"]);

    let listing = validate(json!({
        "consumer": guest(),
        "pool": physical_only,
        "caller": "list_pools",
    }));
    assert!(listing.errors.is_empty());
    assert_eq!(listing.warnings, vec!["rulewarning.physical.only"]);
}

#[test]
fn test_x86_pool_accepts_i686_consumer() {
    assert!(architecture_matches(Some("X86"), Some("I686"), "system"));

    let x86 = pool("p", "P", &[], &[("arch", "X86")]);
    let result = validate(json!({
        "consumer": consumer(&[("uname.machine", "i686")], &["P"]),
        "pool": x86,
        "caller": "bind",
    }));
    assert!(result.warnings.is_empty());
    assert!(result.errors.is_empty());
}

#[test]
fn test_quantity_two_on_single_entitlement_pool() {
    let result = validate(json!({
        "consumer": consumer(&[], &["P"]),
        "pool": pool("p", "P", &[], &[]),
        "quantity": 2,
        "caller": "bind",
    }));
    assert_eq!(
        result.errors,
        vec!["rulefailed.pool.does.not.support.multi-entitlement"]
    );
}

#[test]
fn test_errors_and_warnings_accumulate() {
    let p = with_pool_attr(
        pool("p", "P", &[], &[("sockets", "2"), ("arch", "ppc64")]),
        "virt_only",
        "true",
    );
    let result = validate(json!({
        "consumer": consumer(&[("cpu.cpu_socket(s)", "4"), ("uname.machine", "x86_64")], &["P"]),
        "pool": p,
        "quantity": 2,
        "caller": "best_pools",
    }));
    assert_eq!(
        result.errors,
        vec![
            "rulefailed.pool.does.not.support.multi-entitlement",
            "rulefailed.virt.only",
        ]
    );
    assert_eq!(
        result.warnings,
        vec![
            "rulewarning.architecture.mismatch",
            "rulewarning.unsupported.number.of.sockets",
        ]
    );
}

#[test]
fn test_batch_and_list_keyed_by_pool() {
    let single = pool("single", "P", &[], &[]);
    let multi = pool("multi", "P", &[], &[("multi-entitlement", "yes")]);
    let body = json!({
        "consumer": consumer(&[], &["P"]),
        "poolQuantities": [
            {"pool": single, "quantity": 2},
            {"pool": multi, "quantity": 2},
        ],
        "pools": [single, multi],
        "caller": "bind",
    });
    let request = ValidationRequest::from_json(&body.to_string()).unwrap();
    let rules = EntitlementRules::default();

    let batch = rules.validate_pools_batch(&request, base());
    assert!(batch[&PoolId::from("single")].has_errors());
    assert!(batch[&PoolId::from("multi")].is_successful());

    let list = rules.validate_pools_list(&request, base());
    assert_eq!(list.len(), 2);
    assert!(list.values().all(ValidationResult::is_successful));

    let wire = serde_json::to_value(&batch).unwrap();
    assert_eq!(
        wire["single"]["errors"][0],
        "rulefailed.pool.does.not.support.multi-entitlement"
    );
    assert!(wire["multi"]["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_negative_batch_quantity_is_rejected() {
    let body = json!({
        "consumer": consumer(&[], &["P"]),
        "poolQuantities": [{"pool": pool("p", "P", &[], &[]), "quantity": -1}],
    });
    assert!(ValidationRequest::from_json(&body.to_string()).is_err());
}

#[test]
fn test_unmapped_guest_pool_for_newborn_guest() {
    let mut newborn = guest();
    newborn["created"] = json!(helpers::day(0));
    let unmapped = with_pool_attr(pool("p", "P", &[], &[]), "unmapped_guests_only", "true");

    let result = validate(json!({
        "consumer": newborn,
        "pool": unmapped,
        "caller": "bind",
    }));
    assert!(result.is_successful());

    let old_guest = validate(json!({
        "consumer": guest(),
        "pool": unmapped,
        "caller": "bind",
    }));
    assert_eq!(
        old_guest.errors,
        vec!["virt.guest.cannot.use.unmapped.guest.pool.not.new"]
    );
}

#[test]
fn test_pool_type_envelope() {
    let body = json!({
        "pool": pool("p", "P", &[], &[("stacking_id", "S"), ("multi-entitlement", "yes")]),
    });
    let request = PoolTypeRequest::from_json(&body.to_string()).unwrap();
    let result = PoolTypeResult::from(&request.pool);
    assert_eq!(result.raw_pool_type, PoolType::Stackable);
    assert_eq!(
        serde_json::to_value(result).unwrap(),
        json!({"rawPoolType": "stackable"})
    );
}

#[test]
fn test_activation_key_envelope() {
    let p = pool("p", "P", &[], &[]);
    let body = json!({
        "key": {"id": "key-1", "name": "default", "pools": [{"pool": p, "quantity": null}]},
        "pool": p,
        "quantity": 2,
    });
    let request = ActivationKeyRequest::from_json(&body.to_string()).unwrap();
    let result = validate_key_pool(&request);
    assert_eq!(
        result.errors,
        vec!["rulefailed.invalid.nonmultient.quantity", "rulefailed.already.exists"]
    );
}

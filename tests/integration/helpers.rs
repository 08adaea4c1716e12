//! Shared fixture builders for integration tests.
//!
//! Fixtures are built as JSON so every test also exercises the request
//! envelopes the host application sends.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

/// The instant every scenario is evaluated on.
pub fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// `base()` shifted by whole days, as a wire timestamp.
pub fn day(offset: i64) -> String {
    (base() + Duration::days(offset)).to_rfc3339()
}

/// Name/value attribute list.
pub fn attrs(pairs: &[(&str, &str)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect(),
    )
}

/// A pool of quantity 10 valid for a year around `base()`.
pub fn pool(id: &str, product: &str, provided: &[&str], product_attrs: &[(&str, &str)]) -> Value {
    let provided: Vec<Value> = provided.iter().map(|p| json!({"productId": p})).collect();
    json!({
        "id": id,
        "productId": product,
        "providedProducts": provided,
        "productAttributes": attrs(product_attrs),
        "attributes": [],
        "quantity": 10,
        "consumed": 0,
        "startDate": day(-365),
        "endDate": day(365),
    })
}

/// Add a pool-level attribute to a pool fixture.
pub fn with_pool_attr(mut pool: Value, name: &str, value: &str) -> Value {
    if let Some(list) = pool["attributes"].as_array_mut() {
        list.push(json!({"name": name, "value": value}));
    }
    pool
}

/// A system consumer with the given facts and installed products.
pub fn consumer(facts: &[(&str, &str)], installed: &[&str]) -> Value {
    let facts: serde_json::Map<String, Value> = facts
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let installed: Vec<Value> = installed.iter().map(|p| json!({"productId": p})).collect();
    json!({
        "uuid": "consumer-1",
        "type": {"label": "system", "manifest": false},
        "facts": facts,
        "installedProducts": installed,
        "created": day(-100),
    })
}

/// An entitlement from `pool` active between two day offsets.
pub fn entitlement(id: &str, pool: &Value, quantity: i64, start: i64, end: i64) -> Value {
    json!({
        "id": id,
        "pool": pool,
        "quantity": quantity,
        "startDate": day(start),
        "endDate": day(end),
    })
}

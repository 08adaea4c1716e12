//! Consumers: registered systems, hypervisors and distributors.

use std::collections::BTreeMap;

use candlepin_core::types::attribute::facts;
use candlepin_core::types::{ProductId, SyspurposeAttribute};
use candlepin_core::util::equals_ignore_case;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::guest::GuestId;
use crate::serde_util;

/// The type of a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerType {
    /// Type label, e.g. `system`, `hypervisor`, `candlepin`.
    pub label: String,
    /// Whether consumers of this type export manifests (distributors).
    #[serde(default)]
    pub manifest: bool,
}

impl ConsumerType {
    pub fn new(label: impl Into<String>, manifest: bool) -> Self {
        Self {
            label: label.into(),
            manifest,
        }
    }
}

impl Default for ConsumerType {
    fn default() -> Self {
        Self::new("system", false)
    }
}

/// A product installed on a consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledProduct {
    pub product_id: ProductId,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl InstalledProduct {
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
            version: None,
            arch: None,
        }
    }
}

/// A capability declared by a distributor's host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
}

/// A registered consumer snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    /// Consumer UUID.
    #[serde(default)]
    pub uuid: String,
    /// Owning user name.
    #[serde(default)]
    pub username: Option<String>,
    /// Consumer type.
    #[serde(default, rename = "type")]
    pub consumer_type: ConsumerType,
    /// Reported facts.
    #[serde(default, deserialize_with = "serde_util::lenient_string_map")]
    pub facts: BTreeMap<String, String>,
    /// Installed products.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub installed_products: Vec<InstalledProduct>,
    /// Requested service level.
    #[serde(default)]
    pub service_level: Option<String>,
    /// System purpose role.
    #[serde(default)]
    pub role: Option<String>,
    /// System purpose add-ons.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub add_ons: Vec<String>,
    /// System purpose usage.
    #[serde(default)]
    pub usage: Option<String>,
    /// Capabilities declared by a distributor.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub capabilities: Vec<Capability>,
    /// Registration time.
    #[serde(default, deserialize_with = "serde_util::option_timestamp")]
    pub created: Option<DateTime<Utc>>,
    /// Guests reported for this consumer when it is a host.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub guest_ids: Vec<GuestId>,
}

impl Consumer {
    /// Return a fact value.
    pub fn fact(&self, name: &str) -> Option<&str> {
        self.facts.get(name).map(String::as_str)
    }

    /// Return a fact value only when it is non-empty.
    pub fn non_empty_fact(&self, name: &str) -> Option<&str> {
        self.fact(name).filter(|v| !v.is_empty())
    }

    /// Whether the consumer reports itself as a virtual guest.
    pub fn is_guest(&self) -> bool {
        equals_ignore_case(self.non_empty_fact(facts::IS_VIRT_GUEST), Some("true"))
    }

    pub fn is_manifest(&self) -> bool {
        self.consumer_type.manifest
    }

    /// Whether a distributor declared the named capability.
    pub fn is_capable(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == capability)
    }

    /// Whether the consumer registered less than `window` before `now`.
    pub fn is_newborn(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.created {
            Some(created) => now < created + window,
            None => false,
        }
    }

    /// Number of guests that count against a `guest_limit`.
    pub fn active_guest_count(&self) -> i64 {
        self.guest_ids.iter().filter(|g| g.is_active()).count() as i64
    }

    pub fn installed_product_ids(&self) -> Vec<ProductId> {
        self.installed_products
            .iter()
            .map(|p| p.product_id.clone())
            .collect()
    }

    /// The values the consumer asked for on a system purpose dimension.
    pub fn specified_values(&self, attr: SyspurposeAttribute) -> Vec<String> {
        let single = |value: &Option<String>| -> Vec<String> {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| vec![v.clone()])
                .unwrap_or_default()
        };
        match attr {
            SyspurposeAttribute::Products => self
                .installed_products
                .iter()
                .map(|p| p.product_id.as_str().to_string())
                .collect(),
            SyspurposeAttribute::Addons => self.add_ons.clone(),
            SyspurposeAttribute::Roles => single(&self.role),
            SyspurposeAttribute::Usage => single(&self.usage),
            SyspurposeAttribute::SupportLevel => single(&self.service_level),
        }
    }

    /// Set a fact.
    pub fn with_fact(mut self, name: &str, value: &str) -> Self {
        self.facts.insert(name.to_string(), value.to_string());
        self
    }

    /// Add an installed product.
    pub fn with_installed_product(mut self, product_id: &str) -> Self {
        self.installed_products.push(InstalledProduct::new(product_id));
        self
    }
}

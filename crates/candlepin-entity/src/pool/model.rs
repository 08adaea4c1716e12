//! The enriched, read-only pool view used by every rule.

use std::sync::OnceLock;

use candlepin_core::types::attribute::names;
use candlepin_core::types::{PoolId, ProductId, StackId, SyspurposeAttribute};
use candlepin_core::util::{equals_ignore_case, parse_int, split_list};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attribute::{Attribute, ProvidedProduct};
use crate::serde_util;

/// A quantity of entitlements available from a subscription.
///
/// Pool-level attributes and product-level attributes are kept separate;
/// [`Pool::attribute`] prefers the pool level while
/// [`Pool::product_attribute`] prefers the product level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Pool identifier.
    pub id: PoolId,
    /// Top-level (marketing) product.
    pub product_id: ProductId,
    /// Top-level product name.
    #[serde(default)]
    pub product_name: Option<String>,
    /// Engineering products provided by the pool.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub provided_products: Vec<ProvidedProduct>,
    /// Product granted to guests of a host that binds this pool.
    #[serde(default)]
    pub derived_product_id: Option<ProductId>,
    /// Products provided to guests through the derived product.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub derived_provided_products: Vec<ProvidedProduct>,
    /// Pool-level attributes.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub attributes: Vec<Attribute>,
    /// Attributes of the top-level product.
    #[serde(default, deserialize_with = "serde_util::null_as_empty")]
    pub product_attributes: Vec<Attribute>,
    /// Total quantity; negative means unlimited.
    #[serde(default)]
    pub quantity: i64,
    /// Quantity already consumed.
    #[serde(default)]
    pub consumed: i64,
    /// Subscription start.
    #[serde(default = "serde_util::distant_past", deserialize_with = "serde_util::timestamp")]
    pub start_date: DateTime<Utc>,
    /// Subscription end.
    #[serde(default = "serde_util::distant_future", deserialize_with = "serde_util::timestamp")]
    pub end_date: DateTime<Utc>,
    /// Only this user may consume from the pool.
    #[serde(default)]
    pub restricted_to_username: Option<String>,
    /// Upstream subscription identifier.
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Whether the pool is shared from another organisation.
    #[serde(default)]
    pub has_shared_ancestor: bool,

    #[serde(skip)]
    product_list: OnceLock<Vec<ProductId>>,
    #[serde(skip)]
    derived_product_list: OnceLock<Vec<ProductId>>,
}

fn find_attribute_in<'a>(name: &str, attrs: &'a [Attribute]) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .and_then(Attribute::effective_value)
}

impl Pool {
    /// Create an unlimited pool for a product with no attributes.
    pub fn new(id: impl Into<PoolId>, product_id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            product_name: None,
            provided_products: Vec::new(),
            derived_product_id: None,
            derived_provided_products: Vec::new(),
            attributes: Vec::new(),
            product_attributes: Vec::new(),
            quantity: -1,
            consumed: 0,
            start_date: serde_util::distant_past(),
            end_date: serde_util::distant_future(),
            restricted_to_username: None,
            subscription_id: None,
            has_shared_ancestor: false,
            product_list: OnceLock::new(),
            derived_product_list: OnceLock::new(),
        }
    }

    /// Look up an attribute, preferring the pool level over the product.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute_in(name, &self.attributes)
            .or_else(|| find_attribute_in(name, &self.product_attributes))
    }

    /// Look up an attribute, preferring the product level over the pool.
    pub fn product_attribute(&self, name: &str) -> Option<&str> {
        find_attribute_in(name, &self.product_attributes)
            .or_else(|| find_attribute_in(name, &self.attributes))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn has_product_attribute(&self, name: &str) -> bool {
        self.product_attribute(name).is_some()
    }

    /// Parse a product attribute as an integer.
    pub fn product_attribute_int(&self, name: &str) -> Option<i64> {
        self.product_attribute(name).and_then(parse_int)
    }

    /// Whether the pool's main or provided products include `product_id`.
    pub fn provides(&self, product_id: &str) -> bool {
        self.product_id == product_id
            || self
                .provided_products
                .iter()
                .any(|p| p.product_id == product_id)
    }

    /// The main product followed by every provided product.
    pub fn products(&self) -> &[ProductId] {
        self.product_list.get_or_init(|| {
            std::iter::once(self.product_id.clone())
                .chain(self.provided_products.iter().map(|p| p.product_id.clone()))
                .collect()
        })
    }

    /// Whether the pool carries derived product information.
    pub fn has_derived(&self) -> bool {
        self.derived_product_id.is_some()
    }

    /// The derived product followed by the derived provided products, or
    /// nothing when the pool has no derived product.
    pub fn derived_products(&self) -> &[ProductId] {
        self.derived_product_list.get_or_init(|| match &self.derived_product_id {
            Some(derived) => std::iter::once(derived.clone())
                .chain(
                    self.derived_provided_products
                        .iter()
                        .map(|p| p.product_id.clone()),
                )
                .collect(),
            None => Vec::new(),
        })
    }

    pub fn is_unlimited(&self) -> bool {
        self.quantity < 0
    }

    /// Remaining quantity. Meaningless for unlimited pools.
    pub fn available(&self) -> i64 {
        self.quantity - self.consumed
    }

    /// The instance multiplier, defaulting to 1 when unset or unparsable.
    pub fn instance_multiplier(&self) -> i64 {
        self.attribute(names::INSTANCE_MULTIPLIER)
            .and_then(parse_int)
            .filter(|m| *m != 0)
            .unwrap_or(1)
    }

    /// Whether more than one entitlement may be taken by a consumer.
    pub fn is_multi_ent(&self) -> bool {
        equals_ignore_case(
            self.product_attribute(names::MULTI_ENTITLEMENT),
            Some("yes"),
        )
    }

    /// Whether the product declares a stacking id at all, regardless of its
    /// value.
    pub fn is_stacked(&self) -> bool {
        self.product_attributes
            .iter()
            .any(|a| a.name == names::STACKING_ID)
    }

    pub fn stacking_id(&self) -> Option<StackId> {
        self.product_attribute(names::STACKING_ID).map(StackId::from)
    }

    pub fn is_virt_only(&self) -> bool {
        equals_ignore_case(self.product_attribute(names::VIRT_ONLY), Some("true"))
    }

    /// Whether the pool is restricted to the guests of one host.
    pub fn is_host_specific(&self) -> bool {
        self.attribute(names::REQUIRES_HOST).is_some()
    }

    /// Whether any attribute flag named `name` reads `true`.
    pub fn is_flag_set(&self, name: &str) -> bool {
        equals_ignore_case(self.attribute(name), Some("true"))
    }

    /// Values the pool offers for a system purpose dimension.
    pub fn syspurpose_values(&self, attr: SyspurposeAttribute) -> Vec<String> {
        let Some(name) = attr.product_attribute() else {
            let products = if self.has_derived() {
                self.derived_products()
            } else {
                self.products()
            };
            return products.iter().map(|p| p.as_str().to_string()).collect();
        };

        match self.product_attribute(name) {
            Some(value) if !value.is_empty() => {
                if attr.is_list() {
                    split_list(value)
                } else {
                    vec![value.to_string()]
                }
            }
            _ => Vec::new(),
        }
    }

    /// Add a pool-level attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a product-level attribute.
    pub fn with_product_attribute(mut self, name: &str, value: &str) -> Self {
        self.product_attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a provided product.
    pub fn with_provided_product(mut self, product_id: &str) -> Self {
        self.provided_products.push(ProvidedProduct::new(product_id));
        self.product_list = OnceLock::new();
        self
    }
}

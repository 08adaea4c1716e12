//! Structured reasons explaining why something is not covered.

use std::collections::BTreeMap;

use candlepin_core::types::{EntitlementId, ProductId, StackId};
use serde::{Deserialize, Serialize};

/// Reason key for an installed product with no entitlement.
pub const NOT_COVERED: &str = "NOTCOVERED";
/// Reason key for an entitlement from an unmapped-guest pool.
pub const UNMAPPED_GUEST: &str = "UNMAPPEDGUEST";

/// What a coverage reason refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonSource {
    /// A named stack.
    Stack(StackId),
    /// A single entitlement, which may be hypothetical.
    Entitlement(Option<EntitlementId>),
}

/// A reason for a non-valid status.
///
/// `key` is symbolic so the host application can localise it; `message`
/// mirrors the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReason {
    pub key: String,
    pub message: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ComplianceReason {
    fn keyed(key: String, attributes: BTreeMap<String, String>) -> Self {
        Self {
            message: key.clone(),
            key,
            attributes,
        }
    }

    /// A reason for an attribute the source does not cover.
    ///
    /// `has` is the consumer's value and `covered` what the source provides.
    pub fn attribute(attribute: &str, source: &ReasonSource, has: String, covered: String) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("has".to_string(), has);
        attributes.insert("covered".to_string(), covered);
        match source {
            ReasonSource::Stack(stack_id) => {
                attributes.insert("stack_id".to_string(), stack_id.to_string());
            }
            ReasonSource::Entitlement(Some(ent_id)) => {
                attributes.insert("entitlement_id".to_string(), ent_id.to_string());
            }
            ReasonSource::Entitlement(None) => {}
        }
        Self::keyed(attribute.to_uppercase(), attributes)
    }

    /// A reason for an installed product without any entitlement.
    pub fn not_covered(product_id: &ProductId) -> Self {
        let attributes = BTreeMap::from([("product_id".to_string(), product_id.to_string())]);
        Self::keyed(NOT_COVERED.to_string(), attributes)
    }

    /// A reason for an entitlement drawn from an unmapped-guest pool.
    pub fn unmapped_guest(entitlement_id: Option<&EntitlementId>) -> Self {
        let mut attributes = BTreeMap::new();
        if let Some(id) = entitlement_id {
            attributes.insert("entitlement_id".to_string(), id.to_string());
        }
        Self::keyed(UNMAPPED_GUEST.to_string(), attributes)
    }

    /// The attribute this reason is about, lowercased, when it names one.
    pub fn attribute_key(&self) -> String {
        self.key.to_lowercase()
    }
}

//! Attribute and provided-product records carried on pools.

use candlepin_core::types::ProductId;
use serde::{Deserialize, Serialize};

use crate::serde_util;

/// A single name/value attribute from a pool or its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value; numbers and booleans are read as their string form.
    #[serde(default, deserialize_with = "serde_util::lenient_string")]
    pub value: Option<String>,
}

impl Attribute {
    /// Create an attribute from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// The value, or `None` when it is missing or zero.
    ///
    /// A value of `0` means "not set" rather than a limit of zero.
    pub fn effective_value(&self) -> Option<&str> {
        match self.value.as_deref() {
            None | Some("0") => None,
            Some(v) => Some(v),
        }
    }
}

/// A product provided by a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedProduct {
    /// Product identifier.
    pub product_id: ProductId,
    /// Product display name.
    #[serde(default)]
    pub product_name: Option<String>,
}

impl ProvidedProduct {
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: None,
        }
    }
}

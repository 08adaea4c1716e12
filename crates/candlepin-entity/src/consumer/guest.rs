//! Guests reported for a hypervisor consumer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::serde_util;

/// A guest id reported by virt-who for a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestId {
    /// The guest's virtualization UUID.
    #[serde(default)]
    pub guest_id: String,
    /// Hypervisor-reported attributes such as `virtWhoType` and `active`.
    #[serde(default, deserialize_with = "serde_util::lenient_string_map")]
    pub attributes: BTreeMap<String, String>,
}

impl GuestId {
    /// Whether the guest counts against a `guest_limit`.
    ///
    /// Only libvirt-reported guests whose `active` attribute is `"1"` are
    /// active; `0` is inactive and `-1` is an error.
    pub fn is_active(&self) -> bool {
        self.attributes.get("virtWhoType").map(String::as_str) == Some("libvirt")
            && self.attributes.get("active").map(String::as_str) == Some("1")
    }
}

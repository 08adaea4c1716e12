//! Architecture matching between product arch strings and consumer facts.

use candlepin_core::types::ConsumerTypeLabel;

const SEPARATOR: char = ',';
const X86_FAMILY: [&str; 3] = ["I386", "I586", "I686"];

/// Whether a comma separated product arch string admits the consumer's
/// machine architecture.
///
/// Consumers that are not of type `system` and report no architecture pass
/// unconditionally. `X86` implies the `I386`/`I586`/`I686` family and `ALL`
/// matches anything. A missing arch string places no restriction.
pub fn architecture_matches(
    product_arch: Option<&str>,
    consumer_arch: Option<&str>,
    consumer_type: &str,
) -> bool {
    let consumer_arch = consumer_arch.filter(|a| !a.is_empty());
    if consumer_arch.is_none() && !ConsumerTypeLabel::System.matches(consumer_type) {
        return true;
    }

    let Some(product_arch) = product_arch else {
        return true;
    };

    let mut supported: Vec<String> = product_arch
        .to_uppercase()
        .split(SEPARATOR)
        .map(|a| a.trim().to_string())
        .collect();
    if supported.iter().any(|a| a == "X86") {
        supported.extend(X86_FAMILY.iter().map(|a| a.to_string()));
    }

    if supported.iter().any(|a| a == "ALL") {
        return true;
    }

    match consumer_arch {
        Some(arch) => {
            let arch = arch.to_uppercase();
            supported.iter().any(|a| *a == arch)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x86_implies_i686() {
        assert!(architecture_matches(Some("X86"), Some("i686"), "system"));
        assert!(architecture_matches(Some("x86"), Some("I386"), "system"));
        assert!(!architecture_matches(Some("X86"), Some("x86_64"), "system"));
    }

    #[test]
    fn test_comma_separated_list() {
        assert!(architecture_matches(Some("ppc64,x86_64"), Some("x86_64"), "system"));
        assert!(architecture_matches(Some("ppc64, s390x"), Some("s390x"), "system"));
        assert!(!architecture_matches(Some("ppc64,s390x"), Some("ia64"), "system"));
    }

    #[test]
    fn test_all_matches_anything() {
        assert!(architecture_matches(Some("ALL"), Some("aarch64"), "system"));
        assert!(architecture_matches(Some("all"), None, "system"));
    }

    #[test]
    fn test_missing_consumer_arch() {
        assert!(architecture_matches(Some("x86_64"), None, "candlepin"));
        assert!(!architecture_matches(Some("x86_64"), None, "system"));
        assert!(!architecture_matches(Some("x86_64"), Some(""), "system"));
    }

    #[test]
    fn test_no_product_arch_is_unrestricted() {
        assert!(architecture_matches(None, Some("x86_64"), "system"));
        assert!(architecture_matches(None, None, "system"));
    }
}

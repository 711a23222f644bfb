//! # Metal Keys
//!
//! The same physical metal reaches the system in several notations:
//! the invoice says `Gold 22.00`, the catalog says `Gold 22`, a form sends
//! `Gold 22.0`. All of them must land on one key or the ledger silently
//! splits one pool into several.
//!
//! ```text
//! ("Gold", 22.00) ──┐
//! ("Gold", 22.0)  ──┼──► normalize ──► MetalKey { "Gold", 22 }
//! ("Gold", 22)    ──┘
//!
//! ("gold", 22)    ──────► normalize ──► MetalKey { "gold", 22 }   (different key)
//! ```
//!
//! Metal type comparison is case-sensitive; that matches how the catalog
//! and supplier invoices are keyed in practice.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

/// Normalized `(metal type, purity)` identity.
///
/// Constructed only through [`MetalKey::new`] (which [`normalize`] wraps),
/// so two keys are equal exactly when the metal types match and the
/// purities are numerically equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub struct MetalKey {
    metal_type: String,
    #[ts(as = "String")]
    purity: Decimal,
}

impl MetalKey {
    /// Builds a normalized key.
    pub fn new(metal_type: impl Into<String>, purity: Decimal) -> Self {
        MetalKey {
            metal_type: metal_type.into(),
            purity: purity.normalize(),
        }
    }

    /// The metal type exactly as supplied.
    pub fn metal_type(&self) -> &str {
        &self.metal_type
    }

    /// The purity with trailing fractional zeros removed.
    pub fn purity(&self) -> Decimal {
        self.purity
    }
}

/// Wire shape of a key; deserialization re-normalizes.
#[derive(Deserialize)]
struct MetalKeyParts {
    metal_type: String,
    purity: Decimal,
}

impl<'de> Deserialize<'de> for MetalKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts = MetalKeyParts::deserialize(deserializer)?;
        Ok(MetalKey::new(parts.metal_type, parts.purity))
    }
}

impl fmt::Display for MetalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.metal_type, self.purity)
    }
}

/// Canonicalizes a `(metal type, purity)` pair.
///
/// ## Example
/// ```rust
/// use karat_core::metal::normalize;
/// use rust_decimal::Decimal;
///
/// let a = normalize("Gold", Decimal::new(2200, 2)); // 22.00
/// let b = normalize("Gold", Decimal::new(22, 0));   // 22
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "Gold 22");
/// ```
pub fn normalize(metal_type: &str, purity: Decimal) -> MetalKey {
    MetalKey::new(metal_type, purity)
}

/// True when both keys identify the same metal pool.
pub fn matches(a: &MetalKey, b: &MetalKey) -> bool {
    a == b
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_trailing_zero_variants_are_one_key() {
        let variants = [dec!(22), dec!(22.0), dec!(22.00), dec!(22.000)];
        let keys: HashSet<MetalKey> = variants.iter().map(|p| normalize("Gold", *p)).collect();
        assert_eq!(keys.len(), 1);

        assert_eq!(normalize("Gold", dec!(22.500)), normalize("Gold", dec!(22.5)));
        assert_eq!(normalize("Silver", dec!(92.50)).purity().to_string(), "92.5");
    }

    #[test]
    fn test_different_metal_or_purity_differ() {
        assert_ne!(normalize("Gold", dec!(22)), normalize("Silver", dec!(22)));
        assert_ne!(normalize("Gold", dec!(22)), normalize("Gold", dec!(18)));
        assert_ne!(normalize("Gold", dec!(22.5)), normalize("Gold", dec!(22.05)));
    }

    #[test]
    fn test_metal_type_is_case_sensitive_and_unchanged() {
        let upper = normalize("Gold", dec!(22));
        let lower = normalize("gold", dec!(22));
        assert!(!matches(&upper, &lower));
        assert_eq!(lower.metal_type(), "gold");
    }

    #[test]
    fn test_matches_is_an_equivalence() {
        let a = normalize("Gold", dec!(22));
        let b = normalize("Gold", dec!(22.0));
        let c = normalize("Gold", dec!(22.00));

        assert!(matches(&a, &a));
        assert_eq!(matches(&a, &b), matches(&b, &a));
        assert!(matches(&a, &b) && matches(&b, &c) && matches(&a, &c));
    }

    #[test]
    fn test_display_uses_normalized_purity() {
        assert_eq!(normalize("Gold", dec!(22.00)).to_string(), "Gold 22");
        assert_eq!(normalize("Platinum", dec!(95.0)).to_string(), "Platinum 95");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let key: MetalKey =
            serde_json::from_str(r#"{"metal_type":"Gold","purity":"22.00"}"#).unwrap();
        assert_eq!(key, normalize("Gold", dec!(22)));
        assert_eq!(key.purity().to_string(), "22");
    }

    #[test]
    fn test_key_orders_by_metal_then_purity() {
        let mut keys = vec![
            normalize("Silver", dec!(92.5)),
            normalize("Gold", dec!(22)),
            normalize("Gold", dec!(18)),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["Gold 18", "Gold 22", "Silver 92.5"]);
    }
}

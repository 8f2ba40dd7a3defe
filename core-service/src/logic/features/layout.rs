//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the transaction feature schema.**
//!
//! ## Rules
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The order below is the order the scoring models were trained with and
//! the order values are serialized in for the audit fingerprint.

use crc32fast::Hasher;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact model-input order
pub const FEATURE_LAYOUT: &[&str] = &[
    "amount",             // 0: Transaction amount
    "is_qr",              // 1: 1 if initiated by QR scan
    "device_changed",     // 2: 1 if device differs from the usual one
    "location_velocity",  // 3: Location changes in the recent window
    "failed_auth_24h",    // 4: Failed authentications in 24h
    "amount_zscore",      // 5: Rolling z-score of amount for the payer
    "is_night",           // 6: 1 if hour in [0, 4]
    "beneficiary_is_new", // 7: 1 if beneficiary added < 10 minutes ago
    "txn_velocity_24h",   // 8: Payer transactions in the recent window
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 9;

/// Features that must be exactly 0 or 1
pub const BINARY_FEATURES: &[&str] = &["is_qr", "device_changed", "is_night", "beneficiary_is_new"];

/// Features that must be non-negative
pub const NON_NEGATIVE_FEATURES: &[&str] = &[
    "amount",
    "location_velocity",
    "failed_auth_24h",
    "txn_velocity_24h",
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Model metadata key a scoring model may use to declare the layout it was trained on
pub const LAYOUT_HASH_METADATA_KEY: &str = "feature_layout_hash";

/// CRC32 over the layout version and feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Check a declared layout hash (hex, optional `0x`) against the current layout
pub fn check_layout_hash(declared: &str) -> Result<(), String> {
    let digits = declared.trim().trim_start_matches("0x");
    let declared_hash = u32::from_str_radix(digits, 16)
        .map_err(|_| format!("unparseable feature layout hash '{}'", declared))?;

    if declared_hash != layout_hash() {
        return Err(format!(
            "model trained on feature layout {:08x}, runtime layout is v{} ({:08x})",
            declared_hash,
            FEATURE_VERSION,
            layout_hash()
        ));
    }
    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

pub fn is_binary(name: &str) -> bool {
    BINARY_FEATURES.contains(&name)
}

pub fn is_non_negative(name: &str) -> bool {
    NON_NEGATIVE_FEATURES.contains(&name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 9);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("amount"), Some(0));
        assert_eq!(feature_index("is_qr"), Some(1));
        assert_eq!(feature_index("beneficiary_is_new"), Some(7));
        assert_eq!(feature_index("txn_velocity_24h"), Some(8));
        assert_eq!(feature_index("nonexistent"), None);
    }

    #[test]
    fn test_flag_sets_are_in_layout() {
        for name in BINARY_FEATURES.iter().chain(NON_NEGATIVE_FEATURES) {
            assert!(feature_index(name).is_some(), "{} missing from layout", name);
        }
    }

    #[test]
    fn test_check_layout_hash() {
        let current = format!("{:08x}", layout_hash());
        assert!(check_layout_hash(&current).is_ok());
        assert!(check_layout_hash(&format!("0x{}", current.to_uppercase())).is_ok());
        assert!(check_layout_hash(&format!("{:08x}", layout_hash() ^ 1)).is_err());
        assert!(check_layout_hash("not-hex").is_err());
    }
}

//! # Validation Module
//!
//! Input normalization and validation utilities for Resale POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer (out of scope here)                                │
//! │  ├── Shape checks, deserialization                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + ledger rules                                   │
//! │  ├── Format normalization (month, IMEI, phone)                         │
//! │  └── Business rule validation                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / foreign keys                                           │
//! │  └── Partial unique indexes over active rows (authoritative)           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum stored IMEI length.
pub const MAX_IMEI_LEN: usize = 40;

// =============================================================================
// Month Normalization
// =============================================================================

/// Normalizes a salary month to `YYYY-MM`.
///
/// ## Example
/// ```rust
/// use resale_core::validation::normalize_month;
///
/// assert_eq!(normalize_month(" 2026-03 ").unwrap(), "2026-03");
/// assert!(normalize_month("2026-13").is_err());
/// assert!(normalize_month("2026/03").is_err());
/// ```
pub fn normalize_month(month: &str) -> CoreResult<String> {
    let trimmed = month.trim();
    let bytes = trimmed.as_bytes();

    let well_formed = bytes.len() == 7
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5].is_ascii_digit()
        && bytes[6].is_ascii_digit();

    if well_formed {
        let mm = (bytes[5] - b'0') * 10 + (bytes[6] - b'0');
        if (1..=12).contains(&mm) {
            return Ok(trimmed.to_string());
        }
    }

    Err(CoreError::InvalidMonth {
        value: trimmed.to_string(),
    })
}

// =============================================================================
// IMEI Validation
// =============================================================================

/// Validates and trims an IMEI.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 40 characters
pub fn validate_imei(imei: &str) -> ValidationResult<String> {
    let imei = imei.trim();

    if imei.is_empty() {
        return Err(ValidationError::Required {
            field: "imei".to_string(),
        });
    }

    if imei.len() > MAX_IMEI_LEN {
        return Err(ValidationError::TooLong {
            field: "imei".to_string(),
            max: MAX_IMEI_LEN,
        });
    }

    Ok(imei.to_string())
}

// =============================================================================
// Phone Normalization
// =============================================================================

/// Normalizes an optional phone number for storage.
///
/// Local numbers entered with the 998 country code are canonicalized to
/// `+998…`; a bare country code or an empty/digit-free entry collapses to
/// `None`. Anything else is kept as typed.
pub fn normalize_optional_phone(phone_number: Option<&str>) -> Option<String> {
    let trimmed = phone_number?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits == "998" {
        return None;
    }

    if digits.starts_with("998") {
        return Some(format!("+{digits}"));
    }

    Some(trimmed.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_month() {
        assert_eq!(normalize_month("2026-01").unwrap(), "2026-01");
        assert_eq!(normalize_month("2026-12").unwrap(), "2026-12");
        assert_eq!(normalize_month("  2026-07  ").unwrap(), "2026-07");
    }

    #[test]
    fn test_normalize_month_rejects_bad_input() {
        for bad in ["2026-13", "2026-00", "2026-1", "26-01", "2026/01", "", "march"] {
            assert!(
                matches!(normalize_month(bad), Err(CoreError::InvalidMonth { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_validate_imei() {
        assert_eq!(validate_imei(" 356938035643809 ").unwrap(), "356938035643809");
        assert!(validate_imei("").is_err());
        assert!(validate_imei("   ").is_err());
        assert!(validate_imei(&"9".repeat(41)).is_err());
    }

    #[test]
    fn test_normalize_optional_phone() {
        assert_eq!(normalize_optional_phone(None), None);
        assert_eq!(normalize_optional_phone(Some("")), None);
        assert_eq!(normalize_optional_phone(Some("  ")), None);
        assert_eq!(normalize_optional_phone(Some("998")), None);
        assert_eq!(normalize_optional_phone(Some("no digits")), None);
        assert_eq!(
            normalize_optional_phone(Some("998 90 123 45 67")),
            Some("+998901234567".to_string())
        );
        assert_eq!(
            normalize_optional_phone(Some("+998901234567")),
            Some("+998901234567".to_string())
        );
        // Foreign-format numbers are kept as typed
        assert_eq!(
            normalize_optional_phone(Some("+1 555 0100")),
            Some("+1 555 0100".to_string())
        );
    }
}

//! # Voucher Code Generation
//!
//! Produces human-readable voucher codes in the shape `XXX-XXX-XXX`.
//!
//! ## Uniqueness Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Generate-and-Check Loop                               │
//! │                                                                         │
//! │  generate_voucher_code()  ──►  "WQR-JHF-TU9"                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Store lookup by code                                                  │
//! │       │                                                                 │
//! │       ├── free  ──► INSERT (UNIQUE index on code is the real guard)    │
//! │       │                                                                 │
//! │       └── taken ──► regenerate, up to MAX_CODE_ATTEMPTS, then fail     │
//! │                     closed with an internal error                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generator itself makes no uniqueness promise. With 32 characters and
//! 9 positions the space is ~3.5 × 10¹³, so collisions are rare but real.
//! The caller owns the retry loop; the database UNIQUE constraint is the
//! source of truth.
//!
//! Codes are display/lookup identifiers, not secrets, so a non-cryptographic
//! RNG is sufficient.

use rand::Rng;

// =============================================================================
// Alphabet & Shape
// =============================================================================

/// Source alphabet. Excludes visually ambiguous characters: no `0`/`O` and
/// no `1`/`I`, so codes survive being read over a counter or a phone call.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of hyphen-joined segments.
const SEGMENTS: usize = 3;

/// Characters per segment.
const SEGMENT_LEN: usize = 3;

/// Upper bound on generate-and-check iterations before the caller gives up.
pub const MAX_CODE_ATTEMPTS: u32 = 10;

// =============================================================================
// Generation
// =============================================================================

/// Generates a candidate voucher code, e.g. `"WQR-JHF-TU9"`.
///
/// Uniqueness is NOT guaranteed here; see the module docs.
pub fn generate_voucher_code() -> String {
    let mut rng = rand::thread_rng();
    let mut segments = Vec::with_capacity(SEGMENTS);

    for _ in 0..SEGMENTS {
        let segment: String = (0..SEGMENT_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        segments.push(segment);
    }

    segments.join("-")
}

/// Normalizes caller input before any comparison or storage: trims
/// whitespace and uppercases, so `" wqr-jhf-tu9 "` matches `"WQR-JHF-TU9"`.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Checks the `XXX-XXX-XXX` shape against the restricted alphabet.
pub fn is_valid_code_format(code: &str) -> bool {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != SEGMENTS {
        return false;
    }
    parts.iter().all(|part| {
        part.len() == SEGMENT_LEN && part.bytes().all(|b| CODE_ALPHABET.contains(&b))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_match_shape() {
        for _ in 0..500 {
            let code = generate_voucher_code();
            assert_eq!(code.len(), 11, "code {code} has wrong length");
            assert!(is_valid_code_format(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_chars() {
        for banned in [b'0', b'O', b'1', b'I'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
        assert_eq!(CODE_ALPHABET.len(), 32);
    }

    #[test]
    fn test_generated_codes_never_contain_ambiguous_chars() {
        for _ in 0..500 {
            let code = generate_voucher_code();
            assert!(!code.contains(['0', 'O', '1', 'I']), "ambiguous char in {code}");
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  wqr-jhf-tu9 "), "WQR-JHF-TU9");
        assert_eq!(normalize_code("ABC-DEF-GHJ"), "ABC-DEF-GHJ");
    }

    #[test]
    fn test_format_rejects_wrong_shapes() {
        assert!(!is_valid_code_format("ABCDEFGHJ"));
        assert!(!is_valid_code_format("AB-CDE-FGH"));
        assert!(!is_valid_code_format("ABC-DEF"));
        assert!(!is_valid_code_format("AB0-DEF-GHJ")); // 0 not in alphabet
        assert!(!is_valid_code_format("abc-def-ghj")); // lowercase not in alphabet
        assert!(is_valid_code_format("ABC-DEF-GHJ"));
    }
}

#![forbid(unsafe_code)]

//! Result codes identifying why a popup completed.
//!
//! Codes form a total order that matches their numeric values, so
//! "affirmative or higher" is expressed as `code >= ResultCode::Affirmative`.
//!
//! # Invariants
//!
//! - `Custom(1)` is the first custom slot and carries numeric code 2: custom
//!   buttons start numbering after affirmative (1) and negative (0).
//! - `from_code(x.code()) == Some(x)` for every representable code.

/// Why a popup was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultCode {
    /// Completion was cancelled (Escape, close control, or programmatic).
    Cancelled,
    /// Negative outcome ("No").
    Negative,
    /// Affirmative outcome ("Yes" / "OK" / "Save" / "Crop").
    Affirmative,
    /// Custom button outcome; slot `n` starts at 1.
    Custom(u8),
}

impl ResultCode {
    /// Numeric code carried by result-bearing controls.
    pub const fn code(self) -> i32 {
        match self {
            Self::Cancelled => -1,
            Self::Negative => 0,
            Self::Affirmative => 1,
            Self::Custom(n) => 1 + n as i32,
        }
    }

    /// Parse a numeric control code back into a result.
    ///
    /// Returns `None` for codes outside the representable range.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Cancelled),
            0 => Some(Self::Negative),
            1 => Some(Self::Affirmative),
            2..=256 => Some(Self::Custom((code - 1) as u8)),
            _ => None,
        }
    }

    /// Result bound to the custom button at `index` (zero-based).
    ///
    /// The first custom button maps to `Custom(1)`, numeric code 2.
    pub fn for_custom_index(index: usize) -> Self {
        let slot = (index + 1).min(u8::MAX as usize) as u8;
        Self::Custom(slot)
    }

    /// Whether this result counts as affirmative-or-higher for value
    /// resolution (text and crop payloads are only produced then).
    pub fn is_positive(self) -> bool {
        self >= Self::Affirmative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes() {
        assert_eq!(ResultCode::Cancelled.code(), -1);
        assert_eq!(ResultCode::Negative.code(), 0);
        assert_eq!(ResultCode::Affirmative.code(), 1);
        assert_eq!(ResultCode::Custom(1).code(), 2);
        assert_eq!(ResultCode::Custom(9).code(), 10);
    }

    #[test]
    fn custom_index_starts_after_negative_and_affirmative() {
        assert_eq!(ResultCode::for_custom_index(0), ResultCode::Custom(1));
        assert_eq!(ResultCode::for_custom_index(0).code(), 2);
        assert_eq!(ResultCode::for_custom_index(3).code(), 5);
    }

    #[test]
    fn roundtrip_from_code() {
        for code in [-1, 0, 1, 2, 5, 10] {
            let parsed = ResultCode::from_code(code).expect("in range");
            assert_eq!(parsed.code(), code);
        }
        assert_eq!(ResultCode::from_code(-2), None);
        assert_eq!(ResultCode::from_code(9999), None);
    }

    #[test]
    fn order_matches_codes() {
        assert!(ResultCode::Cancelled < ResultCode::Negative);
        assert!(ResultCode::Negative < ResultCode::Affirmative);
        assert!(ResultCode::Affirmative < ResultCode::Custom(1));
        assert!(ResultCode::Custom(1) < ResultCode::Custom(2));
    }

    #[test]
    fn positivity() {
        assert!(ResultCode::Affirmative.is_positive());
        assert!(ResultCode::Custom(4).is_positive());
        assert!(!ResultCode::Negative.is_positive());
        assert!(!ResultCode::Cancelled.is_positive());
    }
}

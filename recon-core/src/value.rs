use serde::{Deserialize, Serialize};

/// Reserved identifier for samples outside the valid response region.
pub const OUT_OF_SPACE_ID: u32 = 999_999;

/// A discrete point in stimulus parameter space.
///
/// Out-of-space is ordinary data, not an error: it corresponds to the
/// participant pointing outside the response surface, and it flows through the
/// normal preview path rendered with the neutral placeholder asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    InSpace(u32),
    OutOfSpace,
}

impl ParamValue {
    pub fn from_raw(n: u32) -> ParamValue {
        if n == OUT_OF_SPACE_ID {
            ParamValue::OutOfSpace
        } else {
            ParamValue::InSpace(n)
        }
    }

    /// Fixed-width zero-padded identifier used for asset lookup and records.
    pub fn identifier(&self) -> String {
        match self {
            ParamValue::InSpace(v) => format!("{v:06}"),
            ParamValue::OutOfSpace => format!("{OUT_OF_SPACE_ID:06}"),
        }
    }

    /// Parse an identifier back into a value. Inverse of [`identifier`].
    ///
    /// [`identifier`]: ParamValue::identifier
    pub fn from_identifier(id: &str) -> Option<ParamValue> {
        id.parse::<u32>().ok().map(Self::from_raw)
    }

    pub fn is_out_of_space(&self) -> bool {
        matches!(self, ParamValue::OutOfSpace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_zero_padded() {
        assert_eq!(ParamValue::InSpace(42).identifier(), "000042");
        assert_eq!(ParamValue::OutOfSpace.identifier(), "999999");
    }

    #[test]
    fn identifier_round_trips() {
        for raw in [0u32, 9, 42, 359, 99_999, OUT_OF_SPACE_ID] {
            let value = ParamValue::from_raw(raw);
            assert_eq!(ParamValue::from_identifier(&value.identifier()), Some(value));
        }
    }

    #[test]
    fn garbage_identifier_is_rejected() {
        assert_eq!(ParamValue::from_identifier("oops"), None);
        assert_eq!(ParamValue::from_identifier(""), None);
    }
}

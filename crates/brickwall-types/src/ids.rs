//! Strongly-typed identifiers.
//!
//! [`BrickId`] names one brick of the wall by its grid coordinate and is the
//! only identifier that crosses the wire. [`SessionId`] is server-side only
//! and tags a connected client in logs and in the hub's session table.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier for one connected client session.
    SessionId
}

/// Why a string could not be read as a [`BrickId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrickIdError {
    /// The string is not of the form `{col}_{row}`.
    #[error("malformed brick id: {0:?}")]
    Malformed(String),
}

/// Identifier of one brick, rendered as `"{col}_{row}"`.
///
/// Every brick has exactly one textual form: both coordinates are plain
/// unsigned decimals without sign, padding or leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String")]
#[ts(export, export_to = "bindings/")]
pub struct BrickId(String);

impl BrickId {
    /// Build the id of the brick at `(col, row)`.
    pub fn new(col: u16, row: u16) -> Self {
        Self(format!("{col}_{row}"))
    }

    /// Parse a client-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`BrickIdError::Malformed`] if `raw` is not a canonical
    /// `{col}_{row}` pair of `u16` values.
    pub fn parse(raw: &str) -> Result<Self, BrickIdError> {
        let malformed = || BrickIdError::Malformed(raw.to_owned());
        let (col, row) = raw.split_once('_').ok_or_else(malformed)?;
        let col = parse_coordinate(col).ok_or_else(malformed)?;
        let row = parse_coordinate(row).ok_or_else(malformed)?;
        Ok(Self::new(col, row))
    }

    /// The id as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse one coordinate, rejecting anything `u16::from_str` would accept
/// that is not the canonical rendering (`+3`, `03`).
fn parse_coordinate(part: &str) -> Option<u16> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for BrickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BrickId {
    type Err = BrickIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BrickId {
    type Error = BrickIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BrickId> for String {
    fn from(id: BrickId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brick_id_renders_col_then_row() {
        assert_eq!(BrickId::new(3, 4).as_str(), "3_4");
        assert_eq!(BrickId::new(0, 11).to_string(), "0_11");
    }

    #[test]
    fn parse_accepts_canonical_ids() {
        assert_eq!(BrickId::parse("3_4"), Ok(BrickId::new(3, 4)));
        assert_eq!(BrickId::parse("0_0"), Ok(BrickId::new(0, 0)));
        assert_eq!(BrickId::parse("19_11"), Ok(BrickId::new(19, 11)));
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for raw in [
            "", "_", "3", "3_", "_4", "3_4_5", "a_b", "-1_2", "+1_2", "03_4", "3_04", " 3_4",
            "3 _4", "70000_1",
        ] {
            assert!(BrickId::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<BrickId, _> = serde_json::from_str("\"3_4\"");
        assert_eq!(ok.ok(), Some(BrickId::new(3, 4)));

        let bad: Result<BrickId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());

        let wrong_type: Result<BrickId, _> = serde_json::from_str("34");
        assert!(wrong_type.is_err());
    }

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.into_inner().to_string());
    }
}

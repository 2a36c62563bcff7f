//! Strongly-typed identifiers.
//!
//! Chat and message identifiers are assigned by the transport and are plain
//! integers; callback query identifiers are opaque transport strings. Turn
//! identifiers are generated locally as ULIDs so log lines belonging to one
//! processed update can be correlated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Generates an ID wrapper around a transport-assigned integer.
macro_rules! define_int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw transport value.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw transport value.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_int_id!(
    /// Identifier of a user's chat. One session exists per user id.
    UserId
);

define_int_id!(
    /// Identifier of a delivered message, needed to edit it later.
    MessageId
);

/// Opaque identifier of a callback query, used to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackQueryId(String);

impl CallbackQueryId {
    /// Wraps a raw callback query id.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackQueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one processed update, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Ulid);

impl TurnId {
    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn_{}", self.0)
    }
}

impl FromStr for TurnId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid_str = s.strip_prefix("turn_").unwrap_or(s);
        Ulid::from_str(ulid_str).map(Self).map_err(|e| ParseIdError {
            id_type: "TurnId",
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parses_negative_group_ids() {
        let id: UserId = "-100200300".parse().expect("should parse");
        assert_eq!(id.get(), -100_200_300);
        assert_eq!(id.to_string(), "-100200300");
    }

    #[test]
    fn parse_invalid_message_id() {
        let err = "abc".parse::<MessageId>().unwrap_err();
        assert_eq!(err.id_type, "MessageId");
    }

    #[test]
    fn turn_id_display_format() {
        let id = TurnId::new();
        assert!(id.to_string().starts_with("turn_"));
    }

    #[test]
    fn turn_id_parse_with_and_without_prefix() {
        let id = TurnId::new();
        let parsed: TurnId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);

        let raw: TurnId = id.as_ulid().to_string().parse().expect("should parse");
        assert_eq!(id, raw);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&MessageId::new(42)).expect("serialize");
        assert_eq!(json, "42");

        let callback: CallbackQueryId = serde_json::from_str("\"cb-1\"").expect("deserialize");
        assert_eq!(callback.as_str(), "cb-1");
    }

    #[test]
    fn user_ids_hash_by_value() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(UserId::new(1));
        set.insert(UserId::new(2));
        set.insert(UserId::new(1));

        assert_eq!(set.len(), 2);
    }
}

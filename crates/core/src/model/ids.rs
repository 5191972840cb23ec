use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse {kind} from string")]
pub struct ParseIdError {
    kind: &'static str,
}

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value.
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
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
                s.parse::<u64>().map($name::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

id_newtype!(
    /// Unique identifier for one timed exam attempt.
    AttemptId
);
id_newtype!(
    /// Unique identifier for a question within an exam set.
    QuestionId
);
id_newtype!(
    /// Identifier of the result record produced by a successful submission.
    ///
    /// Only used to route to the results view; the session never reads it back.
    ResultId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_id_displays_bare_value() {
        assert_eq!(AttemptId::new(42).to_string(), "42");
    }

    #[test]
    fn question_id_parses_from_string() {
        let id: QuestionId = "123".parse().unwrap();
        assert_eq!(id, QuestionId::new(123));
    }

    #[test]
    fn invalid_id_string_is_rejected() {
        assert!("not-a-number".parse::<AttemptId>().is_err());
        assert!("-5".parse::<ResultId>().is_err());
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", QuestionId::new(7)), "QuestionId(7)");
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from the raw value.
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

id_type!(
    /// Unique identifier for a user.
    UserId
);
id_type!(
    /// Unique identifier for a course.
    CourseId
);
id_type!(
    /// Unique identifier for a lesson.
    LessonId
);
id_type!(
    /// Unique identifier for a quiz question.
    QuestionId
);
id_type!(
    /// Unique identifier for a quiz choice.
    ChoiceId
);
id_type!(
    /// Unique identifier for a quiz result (one attempt).
    ResultId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prints_raw_value() {
        assert_eq!(UserId::new(42).to_string(), "42");
        assert_eq!(LessonId::new(7).to_string(), "7");
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", CourseId::new(3)), "CourseId(3)");
    }

    #[test]
    fn from_str_round_trips() {
        let id: ResultId = "123".parse().unwrap();
        assert_eq!(id, ResultId::new(123));
        assert_eq!(id.to_string().parse::<ResultId>().unwrap(), id);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("not-a-number".parse::<QuestionId>().is_err());
        assert!("-1".parse::<ChoiceId>().is_err());
    }
}

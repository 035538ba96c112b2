//! Typed identifiers and batch request parameters.
//!
//! Schedule records refer to subjects, teachers and classes only through
//! these newtypes. Expanding a reference to its record goes through the
//! catalog, never through inspecting the shape of a value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrows the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

entity_id!(
    /// Subject identifier (e.g. "math", "literature").
    SubjectId
);
entity_id!(
    /// Teacher identifier.
    TeacherId
);
entity_id!(
    /// Class (homeroom group) identifier, e.g. "12A1".
    ClassId
);

/// An academic year such as `2024-2025`.
///
/// Always spans two consecutive calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: u16,
}

impl AcademicYear {
    /// Academic year starting in `start` and ending in `start + 1`.
    pub fn starting(start: u16) -> Self {
        Self { start }
    }

    /// First calendar year.
    pub fn start_year(&self) -> u16 {
        self.start
    }

    /// Second calendar year.
    pub fn end_year(&self) -> u16 {
        self.start.saturating_add(1)
    }
}

impl FromStr for AcademicYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, second) = s
            .split_once('-')
            .ok_or_else(|| format!("academic year '{s}' is not in YYYY-YYYY form"))?;
        let parse = |part: &str| -> Result<u16, String> {
            if part.len() != 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("academic year '{s}' is not in YYYY-YYYY form"));
            }
            part.parse::<u16>()
                .map_err(|e| format!("academic year '{s}': {e}"))
        };
        let start = parse(first)?;
        let end = parse(second)?;
        if start.checked_add(1) != Some(end) {
            return Err(format!(
                "academic year '{s}' must span consecutive years"
            ));
        }
        Ok(Self { start })
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.to_string()
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", self.start, self.end_year())
    }
}

/// Semester number within an academic year (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Semester(u8);

impl Semester {
    /// Creates a semester, rejecting zero.
    pub fn new(number: u8) -> Result<Self, String> {
        if number == 0 {
            return Err("semester numbers start at 1".to_string());
        }
        Ok(Self(number))
    }

    /// The semester number.
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Semester {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Semester> for u8 {
    fn from(semester: Semester) -> Self {
        semester.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

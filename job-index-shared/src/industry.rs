//! The closed set of industries a job can belong to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Industry of a job posting.
///
/// Stored and indexed by its variant name (`"Software"`, `"Finance"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    Software,
    Manufacturing,
    Marketing,
    Education,
    Retail,
    Healthcare,
    Finance,
}

impl Industry {
    /// Every industry, in declaration order.
    pub const ALL: [Industry; 7] = [
        Industry::Software,
        Industry::Manufacturing,
        Industry::Marketing,
        Industry::Education,
        Industry::Retail,
        Industry::Healthcare,
        Industry::Finance,
    ];

    /// The stored and indexed representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Software => "Software",
            Industry::Manufacturing => "Manufacturing",
            Industry::Marketing => "Marketing",
            Industry::Education => "Education",
            Industry::Retail => "Retail",
            Industry::Healthcare => "Healthcare",
            Industry::Finance => "Finance",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name a known industry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown industry: {0:?}")]
pub struct ParseIndustryError(pub String);

impl FromStr for Industry {
    type Err = ParseIndustryError;

    /// Exact match first, then a case-insensitive match on the trimmed input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(industry) = Self::ALL.iter().find(|i| i.as_str() == s) {
            return Ok(*industry);
        }

        let trimmed = s.trim();
        Self::ALL
            .iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| ParseIndustryError(s.to_string()))
    }
}

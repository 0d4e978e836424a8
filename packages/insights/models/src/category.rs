//! Demographic outlier categories and winsorized classification buckets.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Demographic category of an outlier record.
///
/// Categories arrive from the warehouse as `SCREAMING_SNAKE_CASE` strings.
/// Unrecognized categories are preserved in [`Category::Other`] so rows
/// survive round-trips, but they never produce a summary clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(into = "String", from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Language spoken at home.
    Language,
    /// Religious identification.
    Religion,
    /// Dwelling type (apartment, single family, ...).
    DwellingType,
    /// Ethnic background.
    EthnicGroup,
    /// Age bracket, encoded as `_`-delimited tokens with numeric bounds.
    AgeGroup,
    /// Net worth bracket.
    NetWorth,
    /// Income bracket.
    Income,
    /// Educational attainment.
    Education,
    /// Any category without a phrasing rule.
    #[strum(default)]
    Other(String),
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_str(&value).unwrap_or(Self::Other(value))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.to_string()
    }
}

/// Winsorized classification of how a tract's value compares to the
/// national baseline. Ordinal: `ExtremelyLow < ... < ExtremelyHigh`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
pub enum WinsorizedBucket {
    /// Far below the national baseline.
    #[strum(serialize = "Extremely Low")]
    ExtremelyLow,
    #[strum(serialize = "Very Low")]
    VeryLow,
    #[strum(serialize = "Low")]
    Low,
    /// In line with the national baseline.
    #[strum(serialize = "Average")]
    Average,
    #[strum(serialize = "High")]
    High,
    #[strum(serialize = "Very High")]
    VeryHigh,
    /// Far above the national baseline.
    #[strum(serialize = "Extremely High")]
    ExtremelyHigh,
}

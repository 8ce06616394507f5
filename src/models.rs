// src/models.rs
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The persisted CPI series: monthly readings keyed "YYYY-MM" and fiscal-year
/// averages keyed by the year the fiscal year ends in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    #[serde(default)]
    pub monthly: BTreeMap<String, f64>,
    #[serde(default)]
    pub yearly: BTreeMap<String, f64>,
    #[serde(default)]
    pub metadata: Metadata,
    // Anything else in the file is carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One scrape of the indicator table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedObservation {
    pub last_value: f64,
    pub previous_value: f64,
    pub reference_period: String,
}

/// A calendar month. Renders as "YYYY-MM", the key format of `monthly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Period { year, month }
    }

    pub fn previous(&self) -> Period {
        if self.month == 1 {
            Period::new(self.year - 1, 12)
        } else {
            Period::new(self.year, self.month - 1)
        }
    }

    /// Fiscal years run July through June and are labeled by the year they end in.
    pub fn fiscal_year(&self) -> i32 {
        if self.month >= 7 {
            self.year + 1
        } else {
            self.year
        }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

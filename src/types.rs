use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a captured table: the visible text of each cell, in order.
pub type RawRow = Vec<String>;

/// A table as captured by a page source. Rows and cells keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    /// Index of the table this one is nested in, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows, parent: None }
    }

    pub fn nested_in(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds a table from string literals; handy for fixtures.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            parent: None,
        }
    }

    /// Concatenated visible text of every cell, one row per line.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rate category a table (and its records) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// The vendor's buy/sell board.
    OurRates,
    /// Buy-only rates for metal customers sell to the vendor.
    CustomerSell,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OurRates => "OurRates",
            Category::CustomerSell => "CustomerSell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OurRates" => Some(Category::OurRates),
            "CustomerSell" => Some(Category::CustomerSell),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a category quotes both buy and sell, or buy only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sides {
    TwoSided,
    OneSided,
}

impl Sides {
    /// Label plus buy, and sell when two-sided.
    pub fn min_cells(&self) -> usize {
        match self {
            Sides::TwoSided => 3,
            Sides::OneSided => 2,
        }
    }
}

/// Canonical output unit of an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    pub vendor_id: String,
    pub category: Category,
    pub detail_name: String,
    pub we_buy: Decimal,
    pub we_sell: Option<Decimal>,
    pub purity: Option<String>,
}

/// Every record produced from one page fetch for one vendor.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionBatch {
    vendor_id: String,
    extracted_at: DateTime<Utc>,
    records: Vec<RateRecord>,
}

impl ExtractionBatch {
    pub fn new(vendor_id: impl Into<String>, records: Vec<RateRecord>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            extracted_at: Utc::now(),
            records,
        }
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one category, in extraction order.
    pub fn for_category(&self, category: Category) -> Vec<RateRecord> {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub record_count: usize,
    pub reason: Option<String>,
}

impl ExtractionOutcome {
    pub fn succeeded(record_count: usize) -> Self {
        Self { success: true, record_count, reason: None }
    }

    pub fn failed(record_count: usize, reason: impl Into<String>) -> Self {
        Self { success: false, record_count, reason: Some(reason.into()) }
    }
}

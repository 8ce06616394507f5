// src/services/extractor.rs
//! Pulls the latest/previous readings out of an indicator summary table.
//!
//! Columns are resolved by header text, not position, so a reshuffled table
//! still reads correctly.
use log::debug;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::models::ScrapedObservation;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    #[error("could not find a table with 'last', 'previous' and 'reference' columns")]
    TableNotFound,
    #[error("could not find a row labelled '{0}'")]
    RowNotFound(String),
    #[error("malformed {column} value '{text}'")]
    MalformedValue { column: &'static str, text: String },
}

/// Header positions of the three columns we read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub last: usize,
    pub previous: usize,
    pub reference: usize,
}

impl ColumnMapping {
    fn max_index(&self) -> usize {
        self.last.max(self.previous).max(self.reference)
    }

    /// Resolve columns from header labels. Matching is case-insensitive and
    /// by substring; each header cell is assigned to at most one column.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Option<Self> {
        let (mut last, mut previous, mut reference) = (None, None, None);

        for (i, header) in headers.iter().enumerate() {
            let text = header.as_ref().to_lowercase();
            if text.contains("last") {
                last.get_or_insert(i);
            } else if text.contains("previous") {
                previous.get_or_insert(i);
            } else if text.contains("reference") {
                reference.get_or_insert(i);
            }
        }

        Some(ColumnMapping {
            last: last?,
            previous: previous?,
            reference: reference?,
        })
    }
}

struct Selectors {
    table: Selector,
    thead: Selector,
    header_cell: Selector,
    row: Selector,
    data_cell: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |s: &str| Selector::parse(s).expect("static selector is valid");
        Selectors {
            table: parse("table"),
            thead: parse("thead"),
            header_cell: parse("th"),
            row: parse("tr"),
            data_cell: parse("td"),
        }
    }
}

fn cell_text(el: ElementRef) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_value(column: &'static str, text: &str) -> Result<f64, ExtractionError> {
    let malformed = || ExtractionError::MalformedValue {
        column,
        text: text.to_string(),
    };

    let value = text.replace(',', "").parse::<f64>().map_err(|_| malformed())?;
    if !value.is_finite() {
        return Err(malformed());
    }
    Ok(value)
}

/// Header labels of a table: the `th` cells of its `thead`, or failing that
/// of its first row.
fn table_headers(table: ElementRef, sel: &Selectors) -> Vec<String> {
    let header_row = table
        .select(&sel.thead)
        .next()
        .or_else(|| table.select(&sel.row).next());

    match header_row {
        Some(row) => row.select(&sel.header_cell).map(cell_text).collect(),
        None => Vec::new(),
    }
}

/// Find every table that has all three columns, with its mapping.
pub fn find_indicator_tables(document: &Html) -> Vec<(ElementRef<'_>, ColumnMapping)> {
    let sel = Selectors::new();
    document
        .select(&sel.table)
        .filter_map(|table| {
            let headers = table_headers(table, &sel);
            ColumnMapping::from_headers(&headers).map(|mapping| (table, mapping))
        })
        .collect()
}

/// Extract the indicator named `indicator` from `html`.
pub fn extract_observation(html: &str, indicator: &str) -> Result<ScrapedObservation, ExtractionError> {
    let document = Html::parse_document(html);
    let sel = Selectors::new();

    let tables = find_indicator_tables(&document);
    if tables.is_empty() {
        return Err(ExtractionError::TableNotFound);
    }

    for (table, mapping) in tables {
        debug!("Column mapping: {:?}", mapping);

        for row in table.select(&sel.row) {
            let cells: Vec<String> = row.select(&sel.data_cell).map(cell_text).collect();
            if cells.len() <= mapping.max_index() {
                continue;
            }
            if !cells[0].contains(indicator) {
                continue;
            }

            debug!("Matched row: {:?}", cells);
            return Ok(ScrapedObservation {
                last_value: parse_value("last", &cells[mapping.last])?,
                previous_value: parse_value("previous", &cells[mapping.previous])?,
                reference_period: cells[mapping.reference].clone(),
            });
        }
    }

    Err(ExtractionError::RowNotFound(indicator.to_string()))
}

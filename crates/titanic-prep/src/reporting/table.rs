//! Plain-text tables for the stage reports.
//!
//! Layout follows the familiar dataframe printout: an index column padded on
//! the left, then one right-aligned column per header separated by two
//! spaces.

use crate::utils::series_cells;
use polars::prelude::*;
use serde::Serialize;

const COLUMN_GAP: &str = "  ";
const SERIES_GAP: &str = "    ";

/// A table of preformatted cells with a row index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextTable {
    index: Vec<String>,
    headers: Vec<String>,
    /// `columns[c][row]`
    columns: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(index: Vec<String>) -> Self {
        Self {
            index,
            headers: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Table whose index is the row position `0..rows`.
    pub fn with_row_numbers(rows: usize) -> Self {
        Self::new((0..rows).map(|i| i.to_string()).collect())
    }

    /// The first `rows` rows of `df`, every column rendered as text.
    pub fn from_frame_head(df: &DataFrame, rows: usize) -> PolarsResult<Self> {
        let head = df.head(Some(rows));
        let mut table = Self::with_row_numbers(head.height());
        for column in head.get_columns() {
            let series = column.as_materialized_series();
            table.push_column(series.name().as_str(), series_cells(series)?);
        }
        Ok(table)
    }

    /// Append a column. Short columns are padded with empty cells.
    pub fn push_column(&mut self, header: impl Into<String>, cells: Vec<String>) {
        self.headers.push(header.into());
        self.columns.push(cells);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Cell at `(row, column)`, if present.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let c = self.headers.iter().position(|h| h == column)?;
        self.columns[c].get(row).map(String::as_str)
    }

    pub fn render(&self) -> String {
        let index_width = self.index.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .headers
            .iter()
            .zip(&self.columns)
            .map(|(header, cells)| {
                cells
                    .iter()
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.index.len() + 1);

        let mut header_line = " ".repeat(index_width);
        for (header, width) in self.headers.iter().zip(&widths) {
            header_line.push_str(COLUMN_GAP);
            header_line.push_str(&format!("{header:>width$}"));
        }
        lines.push(header_line.trim_end().to_string());

        for (row, label) in self.index.iter().enumerate() {
            let mut line = format!("{label:<index_width$}");
            for (cells, width) in self.columns.iter().zip(&widths) {
                let cell = cells.get(row).map(String::as_str).unwrap_or("");
                line.push_str(COLUMN_GAP);
                line.push_str(&format!("{cell:>width$}"));
            }
            lines.push(line.trim_end().to_string());
        }

        lines.join("\n")
    }
}

/// Render label/value pairs one per line, labels left-aligned and values
/// right-aligned, like a printed series.
pub fn render_series<L, V>(rows: &[(L, V)]) -> String
where
    L: AsRef<str>,
    V: AsRef<str>,
{
    let label_width = rows
        .iter()
        .map(|(l, _)| l.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    let value_width = rows
        .iter()
        .map(|(_, v)| v.as_ref().chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(label, value)| {
            let (label, value) = (label.as_ref(), value.as_ref());
            format!("{label:<label_width$}{SERIES_GAP}{value:>value_width$}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Outlier handler stage.
//!
//! Bounds come from the unfiltered column: `Q1 - k * IQR` and `Q3 + k * IQR`
//! with linear-interpolation quartiles and `k = iqr_multiplier` (1.5 by
//! default). A row is kept only when every checked column holds a value
//! inside its own bounds, so a missing value also drops the row. Missing
//! values are not counted as outliers of their column.

use super::{percentage, two_column_grid};
use crate::charts::{Figure, Panel};
use crate::config::PrepConfig;
use crate::dataset::{self, non_null, numeric_values};
use crate::error::{PrepError, Result};
use crate::reporting::ArtifactWriter;
use crate::stats;
use crate::utils::sanitize_filename;
use polars::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use tracing::{debug, info};

pub const REPORT_FILE: &str = "outlier_analysis_results.txt";

/// IQR fences of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// `None` when there are no values.
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let q1 = stats::quantile(values, 0.25)?;
        let q3 = stats::quantile(values, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub bounds: IqrBounds,
    pub count: usize,
    /// Share of all rows, missing values included in the denominator.
    pub percentage: f64,
    #[serde(skip)]
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowAccounting {
    pub before: usize,
    pub after: usize,
    pub removed: usize,
    /// Removed rows with a missing value in a checked column.
    pub with_missing: usize,
}

impl RowAccounting {
    pub fn percent_removed(&self) -> f64 {
        percentage(self.removed, self.before)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierAnalysis {
    pub columns: Vec<ColumnOutliers>,
    pub rows: RowAccounting,
    /// Row mask: `true` for retained rows.
    #[serde(skip)]
    pub keep: Vec<bool>,
    #[serde(skip)]
    pub cleaned: DataFrame,
    #[serde(skip)]
    pub whisker: f64,
}

/// Compute bounds for every configured column and filter the table.
pub fn analyze(df: &DataFrame, config: &PrepConfig) -> Result<OutlierAnalysis> {
    let features = &config.numerical_features;
    dataset::require_columns(df, features)?;

    let total = df.height();
    let mut keep = vec![true; total];
    let mut missing = vec![false; total];
    let mut columns = Vec::with_capacity(features.len());

    for feature in features {
        let values = numeric_values(df, feature)?;
        let bounds = IqrBounds::from_values(&non_null(&values), config.iqr_multiplier)
            .ok_or_else(|| {
                PrepError::InsufficientData(format!(
                    "column '{feature}' has no values to compute quartiles"
                ))
            })?;

        let mut count = 0;
        for (row, value) in values.iter().enumerate() {
            match value {
                Some(v) if bounds.contains(*v) => {}
                Some(_) => {
                    count += 1;
                    keep[row] = false;
                }
                None => {
                    missing[row] = true;
                    keep[row] = false;
                }
            }
        }
        debug!(
            "{}: {} outliers outside [{:.2}, {:.2}]",
            feature, count, bounds.lower, bounds.upper
        );

        columns.push(ColumnOutliers {
            column: feature.clone(),
            bounds,
            count,
            percentage: percentage(count, total),
            values,
        });
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let cleaned = df.filter(&mask)?;
    let after = cleaned.height();
    let rows = RowAccounting {
        before: total,
        after,
        removed: total - after,
        with_missing: missing.iter().filter(|m| **m).count(),
    };

    Ok(OutlierAnalysis {
        columns,
        rows,
        keep,
        cleaned,
        whisker: config.iqr_multiplier,
    })
}

impl OutlierAnalysis {
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("Outlier Analysis Results\n");
        out.push_str("======================\n\n");
        for c in &self.columns {
            let _ = writeln!(out, "{}:", c.column);
            let _ = writeln!(
                out,
                "  - Outliers: {} ({:.2}% of data)",
                c.count, c.percentage
            );
            let _ = writeln!(out, "  - Lower bound: {:.2}", c.bounds.lower);
            let _ = writeln!(out, "  - Upper bound: {:.2}\n", c.bounds.upper);
        }
        let rows = &self.rows;
        let _ = writeln!(out, "Total rows before outlier removal: {}", rows.before);
        let _ = writeln!(out, "Total rows after outlier removal: {}", rows.after);
        let _ = writeln!(
            out,
            "Rows removed: {} ({:.2}% of data)",
            rows.removed,
            rows.percent_removed()
        );
        if rows.with_missing > 0 {
            let _ = writeln!(
                out,
                "Rows removed for missing values: {}",
                rows.with_missing
            );
        }
        out
    }

    /// Boxplots, scatter plots with bounds, and one before/after histogram
    /// pair per column.
    pub fn figures(&self) -> Vec<(String, Figure)> {
        let (rows, cols) = two_column_grid(self.columns.len());
        let size = (1500, 500 * rows as u32);

        let boxplots = self
            .columns
            .iter()
            .map(|c| Panel::BoxPlot {
                title: format!("Boxplot of {}", c.column),
                x_desc: c.column.clone(),
                values: non_null(&c.values),
                whisker: self.whisker,
            })
            .collect();
        let scatters = self
            .columns
            .iter()
            .map(|c| Panel::OutlierScatter {
                title: format!("Outliers in {}", c.column),
                y_desc: c.column.clone(),
                values: c.values.clone(),
                lower: c.bounds.lower,
                upper: c.bounds.upper,
            })
            .collect();

        let mut figures = vec![
            (
                "outliers_boxplots".to_string(),
                Figure::grid(size, rows, cols, boxplots),
            ),
            (
                "outliers_scatter".to_string(),
                Figure::grid(size, rows, cols, scatters),
            ),
        ];

        for c in &self.columns {
            let retained: Vec<f64> = c
                .values
                .iter()
                .zip(&self.keep)
                .filter_map(|(v, keep)| if *keep { *v } else { None })
                .collect();
            let panels = vec![
                Panel::Histogram {
                    title: format!("{} Before Outlier Removal", c.column),
                    x_desc: c.column.clone(),
                    values: non_null(&c.values),
                },
                Panel::Histogram {
                    title: format!("{} After Outlier Removal", c.column),
                    x_desc: c.column.clone(),
                    values: retained,
                },
            ];
            figures.push((
                format!("outlier_removal_{}", sanitize_filename(&c.column)),
                Figure::grid((1200, 500), 1, 2, panels),
            ));
        }
        figures
    }

    pub fn details(&self) -> serde_json::Value {
        json!({
            "columns": self.columns,
            "rows_before": self.rows.before,
            "rows_after": self.rows.after,
            "rows_removed": self.rows.removed,
            "rows_removed_percent": self.rows.percent_removed(),
            "rows_with_missing": self.rows.with_missing,
        })
    }
}

/// Load the input, filter outliers, and write the cleaned table, report
/// and charts.
pub fn run(config: &PrepConfig, writer: &mut ArtifactWriter) -> Result<serde_json::Value> {
    let df = dataset::load_table(config.input())?;
    let mut analysis = analyze(&df, config)?;
    info!(
        "Rows removed: {} ({:.2}% of data)",
        analysis.rows.removed,
        analysis.rows.percent_removed()
    );

    writer.write_table(&config.cleaned_output_path(), &mut analysis.cleaned)?;
    writer.write_report(REPORT_FILE, &analysis.render_report())?;
    for (stem, figure) in analysis.figures() {
        writer.save_figure(&stem, &figure)?;
    }
    Ok(analysis.details())
}

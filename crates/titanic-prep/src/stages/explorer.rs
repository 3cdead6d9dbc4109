//! Explorer stage: shape, head, column types, describe table and null counts,
//! plus four diagnostic charts.

use super::two_column_grid;
use crate::charts::{BarGroup, Figure, Panel};
use crate::config::PrepConfig;
use crate::dataset::{self, category_values, non_null, numeric_values};
use crate::error::Result;
use crate::reporting::{ArtifactWriter, TextTable, render_series};
use crate::stats::{ColumnDescription, CrossTab, value_counts};
use crate::utils::{MISSING_MARKER, dtype_name, is_numeric_dtype};
use polars::prelude::*;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

pub const REPORT_FILE: &str = "exploration_results.txt";

/// Name, dtype and non-null count of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exploration {
    pub shape: (usize, usize),
    pub head_rows: usize,
    pub head: TextTable,
    pub columns: Vec<ColumnInfo>,
    /// One entry per numeric column, in table order.
    pub description: Vec<ColumnDescription>,
    pub null_counts: Vec<(String, usize)>,
    #[serde(skip)]
    pub figures: Vec<(String, Figure)>,
}

/// Profile the table and build the diagnostic charts.
pub fn analyze(df: &DataFrame, config: &PrepConfig) -> Result<Exploration> {
    let target = config.target_column.as_str();
    dataset::require_columns(df, &[target])?;
    dataset::require_columns(df, &config.categorical_features)?;
    dataset::require_columns(df, &config.numerical_features)?;

    let mut columns = Vec::with_capacity(df.width());
    let mut description = Vec::new();
    let mut null_counts = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().to_string();
        let nulls = dataset::missing_mask(df, &name)?
            .iter()
            .filter(|m| **m)
            .count();

        if is_numeric_dtype(series.dtype()) {
            let values = non_null(&numeric_values(df, &name)?);
            description.push(ColumnDescription::from_values(name.as_str(), &values));
        }
        columns.push(ColumnInfo {
            name: name.clone(),
            dtype: dtype_name(series.dtype()),
            non_null: series.len() - nulls,
        });
        null_counts.push((name, nulls));
    }
    debug!(
        "Described {} numeric column(s) of {}",
        description.len(),
        df.width()
    );

    let figures = vec![
        ("missing_values".to_string(), missing_values_figure(df)?),
        (
            "survival_distribution".to_string(),
            target_distribution_figure(df, target)?,
        ),
        (
            "categorical_features".to_string(),
            categorical_figure(df, config)?,
        ),
        (
            "numerical_features".to_string(),
            numerical_figure(df, config)?,
        ),
    ];

    Ok(Exploration {
        shape: df.shape(),
        head_rows: config.head_rows,
        head: TextTable::from_frame_head(df, config.head_rows)?,
        columns,
        description,
        null_counts,
        figures,
    })
}

fn missing_values_figure(df: &DataFrame) -> Result<Figure> {
    let mut columns = Vec::with_capacity(df.width());
    let mut missing = Vec::with_capacity(df.width());
    for name in df.get_column_names() {
        missing.push(dataset::missing_mask(df, name)?);
        columns.push(name.to_string());
    }
    Ok(Figure::single(
        (1000, 600),
        Panel::MissingHeatmap {
            title: "Missing Values in Titanic Dataset".to_string(),
            columns,
            missing,
        },
    ))
}

fn target_distribution_figure(df: &DataFrame, target: &str) -> Result<Figure> {
    let counts = value_counts(&category_values(df, target)?);
    Ok(Figure::single(
        (800, 600),
        Panel::Bars {
            title: "Survival Distribution".to_string(),
            x_desc: format!("{target} (0 = No, 1 = Yes)"),
            y_desc: "Count".to_string(),
            labels: counts.iter().map(|(label, _)| label.clone()).collect(),
            groups: vec![BarGroup {
                name: None,
                values: counts.iter().map(|(_, n)| *n as f64).collect(),
            }],
        },
    ))
}

fn categorical_figure(df: &DataFrame, config: &PrepConfig) -> Result<Figure> {
    let target = config.target_column.as_str();
    let hues = category_values(df, target)?;
    let mut panels = Vec::with_capacity(config.categorical_features.len());
    for feature in &config.categorical_features {
        let table = CrossTab::new(&category_values(df, feature)?, &hues);
        let groups = table
            .hues
            .iter()
            .enumerate()
            .map(|(hi, hue)| BarGroup {
                name: Some(format!("{target} = {hue}")),
                values: table.counts.iter().map(|row| row[hi] as f64).collect(),
            })
            .collect();
        panels.push(Panel::Bars {
            title: format!("{feature} Distribution by {target}"),
            x_desc: feature.clone(),
            y_desc: "Count".to_string(),
            labels: table.categories.clone(),
            groups,
        });
    }
    let (rows, cols) = two_column_grid(panels.len());
    Ok(Figure::grid((1500, 500 * rows as u32), rows, cols, panels))
}

fn numerical_figure(df: &DataFrame, config: &PrepConfig) -> Result<Figure> {
    let mut panels = Vec::with_capacity(config.numerical_features.len());
    for feature in &config.numerical_features {
        panels.push(Panel::Histogram {
            title: format!("{feature} Distribution"),
            x_desc: feature.clone(),
            values: non_null(&numeric_values(df, feature)?),
        });
    }
    let (rows, cols) = two_column_grid(panels.len());
    Ok(Figure::grid((1500, 500 * rows as u32), rows, cols, panels))
}

impl Exploration {
    /// The describe table: statistics as rows, numeric columns as columns.
    pub fn describe_table(&self) -> TextTable {
        let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
        let mut table = TextTable::new(labels.iter().map(|s| s.to_string()).collect());
        for description in &self.description {
            let cells = description
                .rows()
                .iter()
                .map(|(_, value)| match value {
                    Some(v) => format!("{v:.6}"),
                    None => MISSING_MARKER.to_string(),
                })
                .collect();
            table.push_column(description.column.as_str(), cells);
        }
        table
    }

    fn column_types_table(&self) -> TextTable {
        let mut table = TextTable::new(self.columns.iter().map(|c| c.name.clone()).collect());
        table.push_column(
            "Non-Null Count",
            self.columns
                .iter()
                .map(|c| format!("{} non-null", c.non_null))
                .collect(),
        );
        table.push_column(
            "Dtype",
            self.columns.iter().map(|c| c.dtype.clone()).collect(),
        );
        table
    }

    pub fn render_report(&self) -> String {
        let nulls: Vec<(&str, String)> = self
            .null_counts
            .iter()
            .map(|(name, n)| (name.as_str(), n.to_string()))
            .collect();

        let mut out = String::new();
        out.push_str(&format!(
            "Dataset shape: ({}, {})\n\n",
            self.shape.0, self.shape.1
        ));
        out.push_str(&format!("First {} rows of the dataset:\n", self.head_rows));
        out.push_str(&self.head.render());
        out.push_str("\n\nColumn types:\n");
        out.push_str(&self.column_types_table().render());
        out.push_str("\n\nSummary statistics:\n");
        out.push_str(&self.describe_table().render());
        out.push_str("\n\nNull values count:\n");
        out.push_str(&render_series(&nulls));
        out.push('\n');
        out
    }

    pub fn details(&self) -> serde_json::Value {
        json!({
            "shape": [self.shape.0, self.shape.1],
            "columns": self.columns,
            "description": self.description,
            "null_counts": self
                .null_counts
                .iter()
                .map(|(column, nulls)| json!({ "column": column, "nulls": nulls }))
                .collect::<Vec<_>>(),
        })
    }
}

/// Load the input, explore it and write the report and charts.
pub fn run(config: &PrepConfig, writer: &mut ArtifactWriter) -> Result<serde_json::Value> {
    let df = dataset::load_table(config.input())?;
    let exploration = analyze(&df, config)?;
    info!(
        "Dataset shape: {:?}, {} column(s) with nulls",
        exploration.shape,
        exploration.null_counts.iter().filter(|(_, n)| *n > 0).count()
    );

    writer.write_report(REPORT_FILE, &exploration.render_report())?;
    for (stem, figure) in &exploration.figures {
        writer.save_figure(stem, figure)?;
    }
    Ok(exploration.details())
}

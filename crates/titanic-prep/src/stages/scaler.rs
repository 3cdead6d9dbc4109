//! Scaler stage: standardization and min-max normalization.

use crate::charts::{Figure, Panel};
use crate::config::{PrepConfig, ZeroVariancePolicy};
use crate::dataset::{self, non_null, numeric_values};
use crate::error::{PrepError, Result};
use crate::reporting::{ArtifactWriter, TextTable};
use crate::stats;
use crate::utils::{format_float_column, sanitize_filename};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write as _;
use tracing::{info, warn};

pub const REPORT_FILE: &str = "scaling_results.txt";

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score): (x - mean) / std, population std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
}

impl ScalerType {
    fn spread_name(&self) -> &'static str {
        match self {
            ScalerType::Standard => "standard deviation",
            ScalerType::MinMax => "range",
        }
    }
}

/// Fitted parameters of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    /// Mean or observed min.
    pub center: f64,
    /// Population std or observed max.
    pub bound: f64,
    /// Divisor applied after centering.
    pub scale: f64,
    /// The column had zero spread and `scale` was replaced by 1.
    pub degenerate: bool,
}

impl ScalerParams {
    /// Center then divide by the scale.
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.center) / self.scale
    }
}

/// Feature scaler fitted over a fixed list of columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
}

impl Scaler {
    /// Fit over the non-null values of each column.
    pub fn fit<S: AsRef<str>>(
        scaler_type: ScalerType,
        df: &DataFrame,
        columns: &[S],
        policy: ZeroVariancePolicy,
    ) -> Result<Self> {
        let params = columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                let values = non_null(&numeric_values(df, column)?);
                Self::compute_params(scaler_type, column, &values, policy)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            scaler_type,
            params,
        })
    }

    fn compute_params(
        scaler_type: ScalerType,
        column: &str,
        values: &[f64],
        policy: ZeroVariancePolicy,
    ) -> Result<ScalerParams> {
        let insufficient =
            || PrepError::InsufficientData(format!("column '{column}' has no values to scale"));

        let (center, bound, spread) = match scaler_type {
            ScalerType::Standard => {
                let mean = stats::mean(values).ok_or_else(insufficient)?;
                let std = stats::std_dev(values, 0).ok_or_else(insufficient)?;
                (mean, std, std)
            }
            ScalerType::MinMax => {
                let (min, max) = stats::min_max(values).ok_or_else(insufficient)?;
                (min, max, max - min)
            }
        };

        let degenerate = !(spread.is_finite() && spread > 0.0);
        if degenerate {
            match policy {
                ZeroVariancePolicy::Reject => {
                    return Err(PrepError::DegenerateDistribution {
                        column: column.to_string(),
                        statistic: scaler_type.spread_name().to_string(),
                    });
                }
                ZeroVariancePolicy::UnitScale => warn!(
                    "{} of {} is zero; scaling by 1",
                    scaler_type.spread_name(),
                    column
                ),
            }
        }

        Ok(ScalerParams {
            column: column.to_string(),
            center,
            bound,
            scale: if degenerate { 1.0 } else { spread },
            degenerate,
        })
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    /// Copy of `df` with every fitted column replaced by its scaled version.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for params in &self.params {
            let scaled: Vec<Option<f64>> = numeric_values(df, &params.column)?
                .into_iter()
                .map(|v| v.map(|v| params.apply(v)))
                .collect();
            result.with_column(Series::new(params.column.as_str().into(), scaled))?;
        }
        Ok(result)
    }
}

/// Original, standardized and min-max values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledColumn {
    pub column: String,
    pub original: Vec<Option<f64>>,
    pub standardized: Vec<Option<f64>>,
    pub min_max: Vec<Option<f64>>,
}

impl ScaledColumn {
    fn variants(&self) -> [&[Option<f64>]; 3] {
        [
            self.original.as_slice(),
            self.standardized.as_slice(),
            self.min_max.as_slice(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Scaling {
    pub standard: Scaler,
    pub min_max: Scaler,
    pub head_rows: usize,
    #[serde(skip)]
    pub columns: Vec<ScaledColumn>,
}

/// Fit both scalers over the configured numerical columns.
pub fn analyze(df: &DataFrame, config: &PrepConfig) -> Result<Scaling> {
    let features = &config.numerical_features;
    dataset::require_columns(df, features)?;

    let policy = config.zero_variance_policy;
    let standard = Scaler::fit(ScalerType::Standard, df, features, policy)?;
    let min_max = Scaler::fit(ScalerType::MinMax, df, features, policy)?;
    let standardized = standard.transform(df)?;
    let normalized = min_max.transform(df)?;

    let columns = features
        .iter()
        .map(|feature| {
            Ok(ScaledColumn {
                column: feature.clone(),
                original: numeric_values(df, feature)?,
                standardized: numeric_values(&standardized, feature)?,
                min_max: numeric_values(&normalized, feature)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Scaling {
        standard,
        min_max,
        head_rows: config.head_rows,
        columns,
    })
}

impl Scaling {
    /// First rows of every column before and after both scalings.
    pub fn comparison_table(&self) -> TextTable {
        let rows = self
            .columns
            .first()
            .map_or(0, |c| c.original.len())
            .min(self.head_rows);
        let mut table = TextTable::with_row_numbers(rows);
        for (variant, suffix) in ["Original", "Standardized", "MinMax"].iter().enumerate() {
            for column in &self.columns {
                let shown = &column.variants()[variant][..rows];
                table.push_column(
                    format!("{}_{suffix}", column.column),
                    format_float_column(shown),
                );
            }
        }
        table
    }

    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("Numerical Feature Scaling Results\n");
        out.push_str("================================\n\n");
        out.push_str("1. Standardization (Z-score normalization)\n");
        out.push_str("Parameters:\n");
        for p in self.standard.params() {
            let _ = write!(
                out,
                "{}: mean = {:.4}, std = {:.4}",
                p.column, p.center, p.scale
            );
            if p.degenerate {
                out.push_str(" (zero variance, scale set to 1)");
            }
            out.push('\n');
        }
        out.push_str("\n2. Min-Max Normalization\n");
        out.push_str("Parameters:\n");
        for p in self.min_max.params() {
            let _ = write!(
                out,
                "{}: min = {:.4}, max = {:.4}",
                p.column, p.center, p.bound
            );
            if p.degenerate {
                out.push_str(" (constant column, range set to 1)");
            }
            out.push('\n');
        }
        let _ = write!(out, "\nFirst {} rows comparison:\n", self.head_rows);
        out.push_str(&self.comparison_table().render());
        out.push('\n');
        out
    }

    /// One original / standardized / min-max histogram triple per column.
    pub fn figures(&self) -> Vec<(String, Figure)> {
        self.columns
            .iter()
            .map(|c| {
                let stem = format!("scaled_{}", sanitize_filename(&c.column));
                let panels = vec![
                    Panel::Histogram {
                        title: format!("Original {}", c.column),
                        x_desc: c.column.clone(),
                        values: non_null(&c.original),
                    },
                    Panel::Histogram {
                        title: format!("Standardized {}", c.column),
                        x_desc: format!("{} (z-score)", c.column),
                        values: non_null(&c.standardized),
                    },
                    Panel::Histogram {
                        title: format!("Min-Max Normalized {}", c.column),
                        x_desc: format!("{} (min-max)", c.column),
                        values: non_null(&c.min_max),
                    },
                ];
                (stem, Figure::grid((1500, 500), 1, 3, panels))
            })
            .collect()
    }

    pub fn details(&self) -> serde_json::Value {
        json!({
            "standardization": self.standard.params(),
            "min_max": self.min_max.params(),
            "degenerate_columns": self
                .standard
                .params()
                .iter()
                .filter(|p| p.degenerate)
                .map(|p| p.column.as_str())
                .collect::<Vec<_>>(),
        })
    }
}

/// Load the input, fit both scalers and write the report and charts.
pub fn run(config: &PrepConfig, writer: &mut ArtifactWriter) -> Result<serde_json::Value> {
    let df = dataset::load_table(config.input())?;
    let scaling = analyze(&df, config)?;
    for p in scaling.standard.params() {
        info!("{}: mean = {:.4}, std = {:.4}", p.column, p.center, p.scale);
    }

    writer.write_report(REPORT_FILE, &scaling.render_report())?;
    for (stem, figure) in scaling.figures() {
        writer.save_figure(&stem, &figure)?;
    }
    Ok(scaling.details())
}

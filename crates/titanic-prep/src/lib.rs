//! Passenger-table preprocessing pipeline.
//!
//! Four independent stages turn the Titanic passenger table into reports,
//! charts and a cleaned table:
//!
//! - **Explorer**: shape, first rows, column types, describe table, null
//!   counts, missing-value heatmap and distribution charts
//! - **Encoder**: label and one-hot encoding of one categorical column
//! - **Scaler**: standardization (population std) and min-max normalization
//! - **Outlier Handler**: IQR bounds per column, row filtering and the
//!   cleaned CSV
//!
//! Every stage reloads the source file, so stages can run in any order or on
//! their own. Analysis is separated from writing: each stage module exposes
//! an `analyze` function over a loaded [`polars::prelude::DataFrame`] and a
//! `run` function that also writes the artifacts.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use titanic_prep::{PrepConfig, StageKind, run_all, run_stage};
//!
//! let config = PrepConfig::builder()
//!     .input_path("titanic.csv")
//!     .output_dir("out")
//!     .build()?;
//!
//! // One stage
//! let summary = run_stage(StageKind::Outliers, &config)?;
//! println!("{}", summary.report_path.display());
//!
//! // All four, in order
//! for summary in run_all(&config)? {
//!     println!("{}: {} files", summary.stage, summary.artifacts.len());
//! }
//! ```
//!
//! # Analysis only
//!
//! ```rust,ignore
//! use titanic_prep::{PrepConfig, dataset, stages::outliers};
//!
//! let config = PrepConfig::default();
//! let df = dataset::load_table(config.input())?;
//! let analysis = outliers::analyze(&df, &config)?;
//! assert_eq!(analysis.rows.before, analysis.rows.after + analysis.rows.removed);
//! ```

pub mod charts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod reporting;
pub mod stages;
pub mod stats;
pub mod utils;

// Re-exports for convenient access
pub use charts::{Figure, Panel, RenderOptions};
pub use config::{
    ConfigValidationError, ImageFormat, PrepConfig, PrepConfigBuilder, ZeroVariancePolicy,
};
pub use error::{PrepError, Result as PrepResult};
pub use reporting::{ArtifactWriter, TextTable};
pub use stages::encoder::CategoryEncoding;
pub use stages::outliers::{IqrBounds, RowAccounting};
pub use stages::scaler::{Scaler, ScalerParams, ScalerType};
pub use stages::{StageKind, StageSummary, run_all, run_stage};

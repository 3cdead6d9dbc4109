//! The four pipeline stages.
//!
//! Each stage is split in two: an `analyze` function that takes the loaded
//! table and configuration and returns a plain result value, and a `run`
//! function that reloads the input, analyzes it and writes the report and
//! charts through an [`ArtifactWriter`]. Stages never share in-memory
//! state; each run starts from the source file.

pub mod encoder;
pub mod explorer;
pub mod outliers;
pub mod scaler;

use crate::config::PrepConfig;
use crate::error::Result;
use crate::reporting::ArtifactWriter;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Identifies a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Explore,
    Encode,
    Scale,
    Outliers,
}

impl StageKind {
    /// All stages in pipeline order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Explore,
        StageKind::Encode,
        StageKind::Scale,
        StageKind::Outliers,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::Explore => "Explorer",
            StageKind::Encode => "Encoder",
            StageKind::Scale => "Scaler",
            StageKind::Outliers => "Outlier Handler",
        }
    }

    /// File name of the text report this stage writes.
    pub fn report_file_name(&self) -> &'static str {
        match self {
            StageKind::Explore => explorer::REPORT_FILE,
            StageKind::Encode => encoder::REPORT_FILE,
            StageKind::Scale => scaler::REPORT_FILE,
            StageKind::Outliers => outliers::REPORT_FILE,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a stage run produced.
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub stage: StageKind,
    pub report_path: PathBuf,
    /// Every file written, report included.
    pub artifacts: Vec<PathBuf>,
    /// Stage-specific figures (shape, mapping, parameters, row accounting).
    pub details: serde_json::Value,
}

/// Run one stage from the source file to its artifacts.
pub fn run_stage(kind: StageKind, config: &PrepConfig) -> Result<StageSummary> {
    info!("Running stage: {}", kind);
    let mut writer = ArtifactWriter::new(config);
    writer.prepare()?;

    let details = match kind {
        StageKind::Explore => explorer::run(config, &mut writer)?,
        StageKind::Encode => encoder::run(config, &mut writer)?,
        StageKind::Scale => scaler::run(config, &mut writer)?,
        StageKind::Outliers => outliers::run(config, &mut writer)?,
    };

    let summary = StageSummary {
        stage: kind,
        report_path: config.report_path(kind.report_file_name()),
        artifacts: writer.written().to_vec(),
        details,
    };
    info!(
        "{} completed: {} artifact(s) written",
        kind,
        summary.artifacts.len()
    );
    Ok(summary)
}

/// Run the four stages in order. The first failing stage aborts the run;
/// files written by earlier stages stay on disk.
pub fn run_all(config: &PrepConfig) -> Result<Vec<StageSummary>> {
    StageKind::ALL
        .iter()
        .map(|&kind| run_stage(kind, config))
        .collect()
}

/// `rows / total` as a percentage, 0 for an empty table.
pub(crate) fn percentage(rows: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        rows as f64 / total as f64 * 100.0
    }
}

/// Chart grid shape holding `panels` cells two per row.
pub(crate) fn two_column_grid(panels: usize) -> (usize, usize) {
    (panels.div_ceil(2).max(1), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<&str> = StageKind::ALL.iter().map(|k| k.display_name()).collect();
        assert_eq!(names, ["Explorer", "Encoder", "Scaler", "Outlier Handler"]);
        assert_eq!(StageKind::Scale.report_file_name(), "scaling_results.txt");
    }

    #[test]
    fn test_stage_kind_serializes_snake_case() {
        let json = serde_json::to_string(&StageKind::Outliers).unwrap();
        assert_eq!(json, "\"outliers\"");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn test_two_column_grid() {
        assert_eq!(two_column_grid(4), (2, 2));
        assert_eq!(two_column_grid(3), (2, 2));
        assert_eq!(two_column_grid(2), (1, 2));
        assert_eq!(two_column_grid(0), (1, 2));
    }
}

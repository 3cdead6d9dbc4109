use crate::charts::{Figure, RenderOptions};
use crate::config::PrepConfig;
use crate::dataset;
use crate::error::{PrepError, Result};
use polars::prelude::DataFrame;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes a stage's reports, charts and tables under the configured output
/// directory and remembers every path it produced.
#[derive(Debug)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    visualizations_dir: PathBuf,
    render: RenderOptions,
    extension: &'static str,
    written: Vec<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(config: &PrepConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            visualizations_dir: config.visualizations_dir(),
            render: RenderOptions::from_config(config),
            extension: config.image_format.extension(),
            written: Vec::new(),
        }
    }

    /// Create the output and chart directories. Safe to call repeatedly.
    pub fn prepare(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.visualizations_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                PrepError::from(e).with_context(format!("creating {}", dir.display()))
            })?;
        }
        Ok(())
    }

    pub fn write_report(&mut self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let mut file = File::create(&path)?;
        file.write_all(contents.as_bytes())?;
        info!("Report saved: {}", path.display());
        Ok(self.record(path))
    }

    /// Save a figure as `<stem>.<ext>` in the chart directory.
    pub fn save_figure(&mut self, stem: &str, figure: &Figure) -> Result<PathBuf> {
        let path = self
            .visualizations_dir
            .join(format!("{stem}.{}", self.extension));
        figure.save(&path, &self.render)?;
        info!("Chart saved: {}", path.display());
        Ok(self.record(path))
    }

    /// Write a table as CSV to `path`, creating its parent directory.
    pub fn write_table(&mut self, path: &Path, df: &mut DataFrame) -> Result<PathBuf> {
        dataset::write_table(df, path)?;
        Ok(self.record(path.to_path_buf()))
    }

    /// Every path written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn record(&mut self, path: PathBuf) -> PathBuf {
        self.written.push(path.clone());
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Panel;
    use crate::config::ImageFormat;

    fn config_in(dir: &Path) -> PrepConfig {
        PrepConfig::builder()
            .output_dir(dir)
            .image_format(ImageFormat::Svg)
            .build()
            .unwrap()
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(&config_in(dir.path()));
        writer.prepare().unwrap();
        writer.prepare().unwrap();
        assert!(dir.path().join("visualizations").is_dir());
    }

    #[test]
    fn test_writes_are_recorded_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(&config_in(dir.path()));
        writer.prepare().unwrap();

        let report = writer.write_report("report.txt", "hello\n").unwrap();
        let figure = Figure::single(
            (400, 300),
            Panel::Histogram {
                title: "Fare Distribution".to_string(),
                x_desc: "Fare".to_string(),
                values: vec![7.25, 8.05, 71.28],
            },
        );
        let chart = writer.save_figure("fare", &figure).unwrap();

        assert_eq!(std::fs::read_to_string(&report).unwrap(), "hello\n");
        assert_eq!(chart, dir.path().join("visualizations").join("fare.svg"));
        assert_eq!(writer.written(), [report, chart]);
    }

    #[test]
    fn test_write_table_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut writer = ArtifactWriter::new(&config);
        let mut df = polars::df!["Fare" => [7.25f64, 8.05]].unwrap();

        let path = writer
            .write_table(&config.cleaned_output_path(), &mut df)
            .unwrap();
        assert_eq!(path, dir.path().join("titanic_cleaned.csv"));
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Fare\n"));
        assert_eq!(writer.written(), [path]);
    }
}

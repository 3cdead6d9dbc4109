//! Configuration for the preprocessing stages.
//!
//! Every field defaults to the conventional Titanic layout, so
//! `PrepConfig::default()` reproduces the fixed, parameterless runs.
//! Use [`PrepConfig::builder()`] to point the stages at other paths or columns.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What the scaler does with a column whose spread is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZeroVariancePolicy {
    /// Divide by 1 instead of 0 and flag the column in the report.
    #[default]
    UnitScale,
    /// Abort the stage with a degenerate-distribution error.
    Reject,
}

/// Image format of the saved charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageFormat {
    /// Scalable vector graphics; needs no system fonts.
    Svg,
    /// Raster PNG (requires the `png` feature and a TrueType font).
    #[default]
    Png,
}

impl ImageFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Configuration shared by all four stages.
///
/// # Example
///
/// ```rust,ignore
/// use titanic_prep::config::{PrepConfig, ZeroVariancePolicy};
///
/// let config = PrepConfig::builder()
///     .input_path("data/titanic.csv")
///     .output_dir("out")
///     .zero_variance_policy(ZeroVariancePolicy::Reject)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Source table.
    /// Default: "titanic.csv"
    pub input_path: PathBuf,

    /// Directory receiving the text reports and the cleaned table.
    /// Default: "."
    pub output_dir: PathBuf,

    /// Name of the chart directory, created under `output_dir`.
    /// Default: "visualizations"
    pub visualizations_dir_name: String,

    /// File name of the outlier-filtered table, written under `output_dir`.
    /// Default: "titanic_cleaned.csv"
    pub cleaned_file_name: String,

    /// Binary target column.
    /// Default: "Survived"
    pub target_column: String,

    /// Categorical columns broken down by target in the exploration charts.
    /// Default: ["Pclass", "Sex"]
    pub categorical_features: Vec<String>,

    /// Categorical column the encoder works on.
    /// Default: "Sex"
    pub encode_column: String,

    /// Numerical columns used by the explorer, scaler and outlier handler.
    /// Default: ["Age", "Fare", "Siblings/Spouses Aboard", "Parents/Children Aboard"]
    pub numerical_features: Vec<String>,

    /// Number of leading rows shown in the reports.
    /// Default: 5
    pub head_rows: usize,

    /// Multiplier applied to the IQR when deriving outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Handling of constant columns during scaling.
    /// Default: UnitScale
    pub zero_variance_policy: ZeroVariancePolicy,

    /// Chart file format.
    /// Default: Png
    pub image_format: ImageFormat,

    /// TrueType font used to label PNG charts. When unset, well-known
    /// system font locations are searched.
    /// Default: None
    pub font_path: Option<PathBuf>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("titanic.csv"),
            output_dir: PathBuf::from("."),
            visualizations_dir_name: "visualizations".to_string(),
            cleaned_file_name: "titanic_cleaned.csv".to_string(),
            target_column: "Survived".to_string(),
            categorical_features: vec!["Pclass".to_string(), "Sex".to_string()],
            encode_column: "Sex".to_string(),
            numerical_features: default_numerical_features(),
            head_rows: 5,
            iqr_multiplier: 1.5,
            zero_variance_policy: ZeroVariancePolicy::default(),
            image_format: ImageFormat::default(),
            font_path: None,
        }
    }
}

fn default_numerical_features() -> Vec<String> {
    ["Age", "Fare", "Siblings/Spouses Aboard", "Parents/Children Aboard"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl PrepConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PrepConfigBuilder {
        PrepConfigBuilder::default()
    }

    /// Directory the charts are written to.
    pub fn visualizations_dir(&self) -> PathBuf {
        self.output_dir.join(&self.visualizations_dir_name)
    }

    /// Path of the outlier-filtered table.
    pub fn cleaned_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.cleaned_file_name)
    }

    /// Path of a text report inside the output directory.
    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Source table path.
    pub fn input(&self) -> &Path {
        &self.input_path
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.numerical_features.is_empty() {
            return Err(ConfigValidationError::EmptyColumnList(
                "numerical_features".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.numerical_features {
            if column.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(
                    "numerical_features".to_string(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(ConfigValidationError::DuplicateColumn(column.clone()));
            }
        }

        for (field, value) in [
            ("target_column", &self.target_column),
            ("encode_column", &self.encode_column),
            ("visualizations_dir_name", &self.visualizations_dir_name),
            ("cleaned_file_name", &self.cleaned_file_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        if self.head_rows == 0 {
            return Err(ConfigValidationError::InvalidHeadRows(self.head_rows));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must name at least one column")]
    EmptyColumnList(String),

    #[error("'{0}' contains an empty name")]
    EmptyColumnName(String),

    #[error("Column '{0}' is listed more than once")]
    DuplicateColumn(String),

    #[error("Invalid head row count: {0} (must be at least 1)")]
    InvalidHeadRows(usize),

    #[error("Invalid IQR multiplier: {0} (must be finite and positive)")]
    InvalidIqrMultiplier(f64),
}

impl From<ConfigValidationError> for crate::error::PrepError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::PrepError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PrepConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PrepConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    visualizations_dir_name: Option<String>,
    cleaned_file_name: Option<String>,
    target_column: Option<String>,
    categorical_features: Option<Vec<String>>,
    encode_column: Option<String>,
    numerical_features: Option<Vec<String>>,
    head_rows: Option<usize>,
    iqr_multiplier: Option<f64>,
    zero_variance_policy: Option<ZeroVariancePolicy>,
    image_format: Option<ImageFormat>,
    font_path: Option<PathBuf>,
}

impl PrepConfigBuilder {
    /// Set the source table path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the directory receiving reports, charts and the cleaned table.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the chart directory name (created under the output directory).
    pub fn visualizations_dir_name(mut self, name: impl Into<String>) -> Self {
        self.visualizations_dir_name = Some(name.into());
        self
    }

    /// Set the file name of the outlier-filtered table.
    pub fn cleaned_file_name(mut self, name: impl Into<String>) -> Self {
        self.cleaned_file_name = Some(name.into());
        self
    }

    /// Set the binary target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the categorical columns charted by the explorer.
    pub fn categorical_features<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_features = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the column the encoder works on.
    pub fn encode_column(mut self, column: impl Into<String>) -> Self {
        self.encode_column = Some(column.into());
        self
    }

    /// Set the numerical columns.
    pub fn numerical_features<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numerical_features = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of leading rows shown in the reports.
    pub fn head_rows(mut self, rows: usize) -> Self {
        self.head_rows = Some(rows);
        self
    }

    /// Set the IQR multiplier for outlier bounds.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set how constant columns are scaled.
    pub fn zero_variance_policy(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance_policy = Some(policy);
        self
    }

    /// Set the chart file format.
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = Some(format);
        self
    }

    /// Set the TrueType font used for PNG charts.
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PrepConfig` or an error if validation fails.
    pub fn build(self) -> Result<PrepConfig, ConfigValidationError> {
        let defaults = PrepConfig::default();
        let config = PrepConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            visualizations_dir_name: self
                .visualizations_dir_name
                .unwrap_or(defaults.visualizations_dir_name),
            cleaned_file_name: self.cleaned_file_name.unwrap_or(defaults.cleaned_file_name),
            target_column: self.target_column.unwrap_or(defaults.target_column),
            categorical_features: self
                .categorical_features
                .unwrap_or(defaults.categorical_features),
            encode_column: self.encode_column.unwrap_or(defaults.encode_column),
            numerical_features: self
                .numerical_features
                .unwrap_or(defaults.numerical_features),
            head_rows: self.head_rows.unwrap_or(defaults.head_rows),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            zero_variance_policy: self.zero_variance_policy.unwrap_or_default(),
            image_format: self.image_format.unwrap_or_default(),
            font_path: self.font_path,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PrepConfig::default();
        assert_eq!(config.input_path, PathBuf::from("titanic.csv"));
        assert_eq!(config.target_column, "Survived");
        assert_eq!(config.encode_column, "Sex");
        assert_eq!(config.numerical_features.len(), 4);
        assert_eq!(config.head_rows, 5);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.zero_variance_policy, ZeroVariancePolicy::UnitScale);
        assert_eq!(config.image_format, ImageFormat::Png);
    }

    #[test]
    fn test_builder_defaults_validate() {
        let config = PrepConfig::builder().build().unwrap();
        assert_eq!(config.cleaned_file_name, "titanic_cleaned.csv");
        assert_eq!(
            config.visualizations_dir(),
            PathBuf::from(".").join("visualizations")
        );
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PrepConfig::builder()
            .input_path("data/train.csv")
            .output_dir("out")
            .numerical_features(["Age", "Fare"])
            .zero_variance_policy(ZeroVariancePolicy::Reject)
            .head_rows(3)
            .build()
            .unwrap();

        assert_eq!(config.input(), Path::new("data/train.csv"));
        assert_eq!(config.numerical_features, vec!["Age", "Fare"]);
        assert_eq!(config.zero_variance_policy, ZeroVariancePolicy::Reject);
        assert_eq!(config.head_rows, 3);
        assert_eq!(
            config.cleaned_output_path(),
            PathBuf::from("out").join("titanic_cleaned.csv")
        );
    }

    #[test]
    fn test_validation_empty_numerical_features() {
        let result = PrepConfig::builder()
            .numerical_features(Vec::<String>::new())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnList(_)
        ));
    }

    #[test]
    fn test_validation_duplicate_column() {
        let result = PrepConfig::builder()
            .numerical_features(["Age", "Age"])
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::DuplicateColumn(ref c) if c == "Age"
        ));
    }

    #[test]
    fn test_validation_invalid_iqr_multiplier() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = PrepConfig::builder().iqr_multiplier(bad).build();
            assert!(matches!(
                result.unwrap_err(),
                ConfigValidationError::InvalidIqrMultiplier(_)
            ));
        }
    }

    #[test]
    fn test_validation_zero_head_rows() {
        let result = PrepConfig::builder().head_rows(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidHeadRows(0)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "input_path": "passengers.csv",
            "output_dir": "results",
            "visualizations_dir_name": "plots",
            "cleaned_file_name": "clean.csv",
            "target_column": "Survived",
            "categorical_features": ["Sex"],
            "encode_column": "Sex",
            "numerical_features": ["Age"],
            "head_rows": 10,
            "iqr_multiplier": 3.0,
            "zero_variance_policy": "Reject",
            "image_format": "Svg",
            "font_path": null
        }"#;

        let config: PrepConfig = serde_json::from_str(json).expect("valid config JSON");
        assert!(config.validate().is_ok());
        assert_eq!(config.visualizations_dir(), PathBuf::from("results/plots"));
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.zero_variance_policy, ZeroVariancePolicy::Reject);
    }
}

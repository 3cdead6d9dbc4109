//! Encoder stage: label and one-hot encoding of one categorical column.

use crate::charts::{BarGroup, Figure, Panel};
use crate::config::PrepConfig;
use crate::dataset::{self, category_values, numeric_values};
use crate::error::{PrepError, Result};
use crate::reporting::{ArtifactWriter, TextTable, render_series};
use crate::stats::CrossTab;
use polars::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const REPORT_FILE: &str = "encoding_results.txt";

/// Sorted distinct values of a categorical column; a value's position is its
/// label code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEncoding {
    pub column: String,
    pub classes: Vec<String>,
}

impl CategoryEncoding {
    /// Collect the distinct non-null values in lexical order.
    pub fn fit(column: impl Into<String>, values: &[Option<String>]) -> Result<Self> {
        let column = column.into();
        let classes: Vec<String> = values
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.is_empty() {
            return Err(PrepError::InsufficientData(format!(
                "column '{column}' has no non-null values to encode"
            )));
        }
        debug!("Fitted {} classes for {}", classes.len(), column);
        Ok(Self { column, classes })
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// Label code per row; missing or unseen values stay null.
    pub fn label_codes(&self, values: &[Option<String>]) -> Vec<Option<i64>> {
        values
            .iter()
            .map(|v| v.as_deref().and_then(|v| self.code(v)).map(|c| c as i64))
            .collect()
    }

    pub fn label_column_name(&self) -> String {
        format!("{}_Label", self.column)
    }

    /// `<column>_<value>` for every class, in code order.
    pub fn indicator_names(&self) -> Vec<String> {
        self.classes
            .iter()
            .map(|class| format!("{}_{}", self.column, class))
            .collect()
    }

    /// One 0/1 column per class. A row with a missing category is all zeros.
    pub fn one_hot(&self, values: &[Option<String>]) -> Vec<Vec<i32>> {
        let codes = self.label_codes(values);
        (0..self.classes.len())
            .map(|class| {
                codes
                    .iter()
                    .map(|code| i32::from(*code == Some(class as i64)))
                    .collect()
            })
            .collect()
    }

    /// The mapping as a dict literal, e.g. `{'female': 0, 'male': 1}`.
    pub fn mapping_text(&self) -> String {
        let pairs: Vec<String> = self
            .classes
            .iter()
            .enumerate()
            .map(|(code, class)| format!("'{class}': {code}"))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }

    /// Axis label spelling out the codes, e.g. `Sex (0=female, 1=male)`.
    pub fn axis_label(&self) -> String {
        let pairs: Vec<String> = self
            .classes
            .iter()
            .enumerate()
            .map(|(code, class)| format!("{code}={class}"))
            .collect();
        format!("{} ({})", self.column, pairs.join(", "))
    }
}

/// Share of positive target values among the rows of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    pub rows: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Encoding {
    pub encoding: CategoryEncoding,
    pub target_column: String,
    pub target_rates: Vec<CategoryRate>,
    pub head_rows: usize,
    /// Encoded column, its label column and the indicators, first rows only.
    pub head: TextTable,
    /// Source table plus the label column and one indicator per class.
    #[serde(skip)]
    pub augmented: DataFrame,
    #[serde(skip)]
    pub figure: Figure,
}

/// Encode the configured column and build the comparison chart.
pub fn analyze(df: &DataFrame, config: &PrepConfig) -> Result<Encoding> {
    let column = config.encode_column.as_str();
    let target = config.target_column.as_str();
    dataset::require_columns(df, &[column, target])?;

    let values = category_values(df, column)?;
    let outcomes = numeric_values(df, target)?;
    let encoding = CategoryEncoding::fit(column, &values)?;

    let label_name = encoding.label_column_name();
    let indicator_names = encoding.indicator_names();
    let mut augmented = df.clone();
    augmented.with_column(Series::new(
        label_name.as_str().into(),
        encoding.label_codes(&values),
    ))?;
    for (name, indicator) in indicator_names.iter().zip(encoding.one_hot(&values)) {
        augmented.with_column(Series::new(name.as_str().into(), indicator))?;
    }

    let mut shown = vec![column.to_string(), label_name.clone()];
    shown.extend(indicator_names.iter().cloned());
    let head = TextTable::from_frame_head(&augmented.select(shown)?, config.head_rows)?;

    let target_rates = target_rates(&encoding, &values, &outcomes);
    let figure = comparison_figure(&encoding, &augmented, target, &target_rates)?;

    Ok(Encoding {
        encoding,
        target_column: target.to_string(),
        target_rates,
        head_rows: config.head_rows,
        head,
        augmented,
        figure,
    })
}

/// Mean target value per class over rows where both values are present.
fn target_rates(
    encoding: &CategoryEncoding,
    values: &[Option<String>],
    outcomes: &[Option<f64>],
) -> Vec<CategoryRate> {
    let mut sums = vec![0.0f64; encoding.classes.len()];
    let mut rows = vec![0usize; encoding.classes.len()];
    for (value, outcome) in values.iter().zip(outcomes) {
        if let (Some(value), Some(outcome)) = (value, outcome)
            && let Some(code) = encoding.code(value)
        {
            sums[code] += outcome;
            rows[code] += 1;
        }
    }
    encoding
        .classes
        .iter()
        .enumerate()
        .map(|(code, class)| CategoryRate {
            category: class.clone(),
            rows: rows[code],
            rate: if rows[code] == 0 {
                0.0
            } else {
                sums[code] / rows[code] as f64
            },
        })
        .collect()
}

fn comparison_figure(
    encoding: &CategoryEncoding,
    augmented: &DataFrame,
    target: &str,
    rates: &[CategoryRate],
) -> Result<Figure> {
    let column = encoding.column.as_str();
    let codes = category_values(augmented, &encoding.label_column_name())?;
    let table = CrossTab::new(&codes, &category_values(augmented, target)?);
    let groups = table
        .hues
        .iter()
        .enumerate()
        .map(|(hi, hue)| BarGroup {
            name: Some(format!("{target} = {hue}")),
            values: table.counts.iter().map(|row| row[hi] as f64).collect(),
        })
        .collect();

    let by_code = Panel::Bars {
        title: format!("{column} (Label Encoded) vs Survival"),
        x_desc: encoding.axis_label(),
        y_desc: "Count".to_string(),
        labels: table.categories.clone(),
        groups,
    };
    let by_class = Panel::Bars {
        title: format!("Survival Rate by {column}"),
        x_desc: column.to_string(),
        y_desc: "Survival Rate".to_string(),
        labels: rates.iter().map(|r| r.category.clone()).collect(),
        groups: vec![BarGroup {
            name: None,
            values: rates.iter().map(|r| r.rate).collect(),
        }],
    };
    Ok(Figure::grid((1200, 500), 1, 2, vec![by_code, by_class]))
}

impl Encoding {
    pub fn render_report(&self) -> String {
        let column = &self.encoding.column;
        let rates: Vec<(&str, String)> = self
            .target_rates
            .iter()
            .map(|r| (r.category.as_str(), format!("{:.6}", r.rate)))
            .collect();

        let mut out = String::new();
        out.push_str("Categorical Feature Encoding Results\n");
        out.push_str("===================================\n\n");
        out.push_str(&format!("1. Label Encoding for '{column}' column\n"));
        out.push_str(&format!("Mapping: {}\n\n", self.encoding.mapping_text()));
        out.push_str(&format!("2. One-Hot Encoding for '{column}' column\n"));
        out.push_str(&format!(
            "Created columns: {}\n\n",
            self.encoding.indicator_names().join(", ")
        ));
        out.push_str(&format!(
            "Mean {} by {column}:\n",
            self.target_column
        ));
        out.push_str(&render_series(&rates));
        out.push_str(&format!(
            "\n\nFirst {} rows after encoding:\n",
            self.head_rows
        ));
        out.push_str(&self.head.render());
        out.push('\n');
        out
    }

    pub fn details(&self) -> serde_json::Value {
        json!({
            "column": self.encoding.column,
            "mapping": self
                .encoding
                .classes
                .iter()
                .enumerate()
                .map(|(code, class)| json!({ "value": class, "code": code }))
                .collect::<Vec<_>>(),
            "label_column": self.encoding.label_column_name(),
            "indicator_columns": self.encoding.indicator_names(),
            "target_rates": self.target_rates,
            "augmented_shape": [self.augmented.height(), self.augmented.width()],
        })
    }
}

/// Load the input, encode it and write the report and chart.
pub fn run(config: &PrepConfig, writer: &mut ArtifactWriter) -> Result<serde_json::Value> {
    let df = dataset::load_table(config.input())?;
    let encoding = analyze(&df, config)?;
    info!(
        "Label encoding mapping: {}",
        encoding.encoding.mapping_text()
    );

    writer.write_report(REPORT_FILE, &encoding.render_report())?;
    writer.save_figure("encoded_features", &encoding.figure)?;
    Ok(encoding.details())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn passengers() -> DataFrame {
        df![
            "Survived" => [0i64, 1, 0, 1],
            "Sex" => [Some("male"), Some("female"), Some("male"), None],
            "Age" => [22.0f64, 38.0, 26.0, 35.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_label_codes_follow_sorted_classes() {
        let values = labels(&["male", "female", "male"]);
        let encoding = CategoryEncoding::fit("Sex", &values).unwrap();
        assert_eq!(encoding.classes, ["female", "male"]);
        assert_eq!(encoding.label_codes(&values), [Some(1), Some(0), Some(1)]);
        assert_eq!(encoding.mapping_text(), "{'female': 0, 'male': 1}");
        assert_eq!(encoding.axis_label(), "Sex (0=female, 1=male)");
    }

    #[test]
    fn test_one_hot_exclusive() {
        let values = labels(&["male", "female", "male"]);
        let encoding = CategoryEncoding::fit("Sex", &values).unwrap();
        let indicators = encoding.one_hot(&values);
        assert_eq!(encoding.indicator_names(), ["Sex_female", "Sex_male"]);
        assert_eq!(indicators, [vec![0, 1, 0], vec![1, 0, 1]]);
        for row in 0..values.len() {
            assert_eq!(indicators.iter().map(|col| col[row]).sum::<i32>(), 1);
        }
    }

    #[test]
    fn test_codes_are_a_bijection() {
        let values = labels(&["S", "C", "Q", "S", "C"]);
        let encoding = CategoryEncoding::fit("Embarked", &values).unwrap();
        let mut codes: Vec<i64> = encoding.label_codes(&values).into_iter().flatten().collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes, [0, 1, 2]);
    }

    #[test]
    fn test_fit_rejects_all_null_column() {
        let err = CategoryEncoding::fit("Sex", &[None, None]).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_null_category_gets_no_code() {
        let values = vec![Some("male".to_string()), None];
        let encoding = CategoryEncoding::fit("Sex", &values).unwrap();
        assert_eq!(encoding.label_codes(&values), [Some(0), None]);
        assert_eq!(encoding.one_hot(&values), [vec![1, 0]]);
    }

    #[test]
    fn test_analyze_augments_table() {
        let encoding = analyze(&passengers(), &PrepConfig::default()).unwrap();
        let augmented = &encoding.augmented;
        assert_eq!(augmented.width(), 3 + 3);

        let label = augmented.column("Sex_Label").unwrap();
        assert_eq!(label.null_count(), 1);
        let male = augmented.column("Sex_male").unwrap().as_materialized_series().i32().unwrap();
        assert_eq!(male.into_iter().collect::<Vec<_>>(), [Some(1), Some(0), Some(1), Some(0)]);

        let rates: Vec<(&str, f64)> = encoding
            .target_rates
            .iter()
            .map(|r| (r.category.as_str(), r.rate))
            .collect();
        assert_eq!(rates, [("female", 1.0), ("male", 0.0)]);
    }

    #[test]
    fn test_report_layout() {
        let encoding = analyze(&passengers(), &PrepConfig::default()).unwrap();
        let report = encoding.render_report();
        let expected_head = "Categorical Feature Encoding Results\n\
                             ===================================\n\
                             \n\
                             1. Label Encoding for 'Sex' column\n\
                             Mapping: {'female': 0, 'male': 1}\n\
                             \n\
                             2. One-Hot Encoding for 'Sex' column\n\
                             Created columns: Sex_female, Sex_male\n";
        assert!(report.starts_with(expected_head));
        assert!(report.contains("Mean Survived by Sex:\nfemale    1.000000\nmale      0.000000\n"));
        assert!(report.contains("First 5 rows after encoding:\n"));
        assert!(report.contains("Sex_Label  Sex_female  Sex_male"));
    }

    #[test]
    fn test_missing_encode_column() {
        let df = passengers().drop("Sex").unwrap();
        let err = analyze(&df, &PrepConfig::default()).unwrap_err();
        assert!(err.is_schema_error());
    }
}

//! Descriptive statistics with pinned conventions.
//!
//! * Quantiles use linear interpolation between closest ranks
//!   (position `(n - 1) * q` over the sorted values), Hyndman-Fan type 7,
//!   computed with polars' [`QuantileMethod::Linear`].
//! * [`std_dev`] takes an explicit `ddof`: describe tables use 1 (sample),
//!   standardization uses 0 (population).
//! * Callers pass the present values only; missing cells (null or NaN) are
//!   dropped by [`crate::dataset::numeric_values`].

use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Upper limit on histogram bins, whatever the spread of the data.
const MAX_BINS: usize = 10_000;

fn float_chunked(values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice(PlSmallStr::EMPTY, values)
}

/// Sort values ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation quantile.
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    float_chunked(values)
        .quantile(q.clamp(0.0, 1.0), QuantileMethod::Linear)
        .ok()
        .flatten()
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    float_chunked(values).mean()
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// Returns `None` when there are not more than `ddof` values.
pub fn std_dev(values: &[f64], ddof: u8) -> Option<f64> {
    if values.len() <= ddof as usize {
        return None;
    }
    float_chunked(values).std(ddof)
}

/// Smallest and largest value, `None` when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// One column of a describe table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnDescription {
    /// Describe the non-null values of a column (sample std, ddof = 1).
    pub fn from_values(column: impl Into<String>, values: &[f64]) -> Self {
        let bounds = min_max(values);
        Self {
            column: column.into(),
            count: values.len(),
            mean: mean(values),
            std: std_dev(values, 1),
            min: bounds.map(|(lo, _)| lo),
            q25: quantile(values, 0.25),
            median: quantile(values, 0.5),
            q75: quantile(values, 0.75),
            max: bounds.map(|(_, hi)| hi),
        }
    }

    /// Statistics in describe-table row order, paired with their labels.
    pub fn rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// Order category labels: numerically when every label parses as a number,
/// lexically otherwise.
pub fn sort_labels(labels: &mut [String]) {
    let all_numeric = labels.iter().all(|l| l.parse::<f64>().is_ok());
    if all_numeric {
        labels.sort_by(|a, b| {
            let a = a.parse::<f64>().unwrap_or(f64::NAN);
            let b = b.parse::<f64>().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        labels.sort();
    }
}

/// Distinct non-null labels in display order.
pub fn distinct_labels(values: &[Option<String>]) -> Vec<String> {
    let mut labels: Vec<String> = values
        .iter()
        .flatten()
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    sort_labels(&mut labels);
    labels
}

/// Occurrences of each distinct label, in display order.
pub fn value_counts(values: &[Option<String>]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    distinct_labels(values)
        .into_iter()
        .map(|label| {
            let count = counts.get(label.as_str()).copied().unwrap_or(0);
            (label, count)
        })
        .collect()
}

/// Contingency table of a category column against a hue column.
///
/// Rows where either value is missing are skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub categories: Vec<String>,
    pub hues: Vec<String>,
    /// `counts[category][hue]`
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn new(categories: &[Option<String>], hues: &[Option<String>]) -> Self {
        let category_labels = distinct_labels(categories);
        let hue_labels = distinct_labels(hues);
        let mut counts = vec![vec![0usize; hue_labels.len()]; category_labels.len()];

        for (category, hue) in categories.iter().zip(hues) {
            if let (Some(category), Some(hue)) = (category, hue)
                && let Some(ci) = category_labels.iter().position(|c| c == category)
                && let Some(hi) = hue_labels.iter().position(|h| h == hue)
            {
                counts[ci][hi] += 1;
            }
        }

        Self {
            categories: category_labels,
            hues: hue_labels,
            counts,
        }
    }
}

/// Histogram bin edges using the `auto` rule: the finer of the
/// Sturges and Freedman-Diaconis bin widths.
pub fn auto_bin_edges(values: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = min_max(values) else {
        return vec![0.0, 1.0];
    };
    if !lo.is_finite() || !hi.is_finite() {
        return vec![0.0, 1.0];
    }
    if lo == hi {
        return vec![lo - 0.5, hi + 0.5];
    }

    let n = values.len() as f64;
    let range = hi - lo;
    let sturges_width = range / (n.log2() + 1.0);
    let iqr = quantile(values, 0.75).unwrap_or(hi) - quantile(values, 0.25).unwrap_or(lo);
    let fd_width = 2.0 * iqr * n.powf(-1.0 / 3.0);

    let width = if fd_width > 0.0 {
        sturges_width.min(fd_width)
    } else {
        sturges_width
    };
    let bins = ((range / width).ceil() as usize).clamp(1, MAX_BINS);
    let step = range / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + step * i as f64).collect();
    edges[bins] = hi;
    edges
}

/// Count values into the bins delimited by `edges`. The last bin is closed
/// on the right so the maximum lands in it.
pub fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let bins = edges.len() - 1;
    let mut counts = vec![0usize; bins];
    for &v in values {
        if v < edges[0] || v > edges[bins] {
            continue;
        }
        let idx = edges[1..]
            .iter()
            .position(|&edge| v < edge)
            .unwrap_or(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Gaussian kernel density estimate evaluated on `points` evenly spaced
/// positions across the data range, with Scott's bandwidth
/// (`std * n^(-1/5)`, sample std).
///
/// Returns an empty curve when fewer than two distinct values exist.
pub fn gaussian_kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let Some((lo, hi)) = min_max(values) else {
        return Vec::new();
    };
    let Some(std) = std_dev(values, 1) else {
        return Vec::new();
    };
    if std == 0.0 || lo == hi || points < 2 {
        return Vec::new();
    }

    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum();
            (x, density * norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ==================== quantile tests ====================

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!(approx(quantile(&values, 0.25).unwrap(), 2.25));
        assert!(approx(quantile(&values, 0.75).unwrap(), 4.75));
        assert!(approx(quantile(&values, 0.5).unwrap(), 3.5));
    }

    #[test]
    fn test_quantile_extremes_and_unsorted_input() {
        let values = [9.0, 1.0, 5.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(9.0));
        assert_eq!(quantile(&values, 0.5), Some(5.0));
    }

    #[test]
    fn test_quantile_empty() {
        assert_eq!(quantile(&[], 0.5), None);
    }

    // ==================== mean / std tests ====================

    #[test]
    fn test_std_dev_ddof() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(std_dev(&values, 1).unwrap(), 2.5f64.sqrt()));
        assert!(approx(std_dev(&values, 0).unwrap(), 2.0f64.sqrt()));
    }

    #[test]
    fn test_std_dev_too_few_values() {
        assert_eq!(std_dev(&[5.0], 1), None);
        assert_eq!(std_dev(&[5.0], 0), Some(0.0));
        assert_eq!(std_dev(&[], 0), None);
    }

    #[test]
    fn test_describe_column() {
        let description = ColumnDescription::from_values("Age", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(description.count, 4);
        assert_eq!(description.min, Some(1.0));
        assert_eq!(description.max, Some(4.0));
        assert!(approx(description.mean.unwrap(), 2.5));
        assert!(approx(description.q25.unwrap(), 1.75));
        assert!(approx(description.median.unwrap(), 2.5));
        assert_eq!(description.rows()[0], ("count", Some(4.0)));
    }

    #[test]
    fn test_describe_empty_column() {
        let description = ColumnDescription::from_values("Age", &[]);
        assert_eq!(description.count, 0);
        assert_eq!(description.mean, None);
        assert_eq!(description.std, None);
    }

    // ==================== label tests ====================

    #[test]
    fn test_sort_labels_numeric_aware() {
        let mut labels = vec!["10".to_string(), "2".to_string(), "1".to_string()];
        sort_labels(&mut labels);
        assert_eq!(labels, vec!["1", "2", "10"]);

        let mut words = vec!["male".to_string(), "female".to_string()];
        sort_labels(&mut words);
        assert_eq!(words, vec!["female", "male"]);
    }

    #[test]
    fn test_value_counts_skip_nulls() {
        let values = vec![
            Some("male".to_string()),
            None,
            Some("female".to_string()),
            Some("male".to_string()),
        ];
        assert_eq!(
            value_counts(&values),
            vec![("female".to_string(), 1), ("male".to_string(), 2)]
        );
    }

    #[test]
    fn test_crosstab() {
        let sex = vec![
            Some("male".to_string()),
            Some("female".to_string()),
            Some("male".to_string()),
            None,
        ];
        let survived = vec![
            Some("0".to_string()),
            Some("1".to_string()),
            Some("1".to_string()),
            Some("1".to_string()),
        ];
        let table = CrossTab::new(&sex, &survived);
        assert_eq!(table.categories, vec!["female", "male"]);
        assert_eq!(table.hues, vec!["0", "1"]);
        assert_eq!(table.counts, vec![vec![0, 1], vec![1, 1]]);
    }

    // ==================== histogram tests ====================

    #[test]
    fn test_auto_bin_edges_cover_range() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let edges = auto_bin_edges(&values);
        assert!(edges.len() >= 2);
        assert!(approx(edges[0], 0.0));
        assert!(approx(*edges.last().unwrap(), 99.0));

        let counts = bin_counts(&values, &edges);
        assert_eq!(counts.iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_auto_bin_edges_constant_values() {
        let edges = auto_bin_edges(&[3.0, 3.0, 3.0]);
        assert_eq!(edges, vec![2.5, 3.5]);
        assert_eq!(bin_counts(&[3.0, 3.0, 3.0], &edges), vec![3]);
    }

    #[test]
    fn test_auto_bin_edges_bounded_for_tight_core() {
        // A tiny IQR against a huge range would ask for billions of bins.
        let mut values: Vec<f64> = (0..100).map(|i| 1.0 + f64::from(i) * 1e-9).collect();
        values.push(1e9);
        let edges = auto_bin_edges(&values);
        assert_eq!(edges.len(), MAX_BINS + 1);
        assert_eq!(bin_counts(&values, &edges).iter().sum::<usize>(), values.len());

        assert_eq!(auto_bin_edges(&[1.0, f64::INFINITY]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_gaussian_kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let curve = gaussian_kde(&values, 400);
        assert_eq!(curve.len(), 400);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        // Curve is restricted to the data range, so some tail mass is cut off.
        assert!(area > 0.8 && area < 1.05, "area = {area}");
    }

    #[test]
    fn test_gaussian_kde_degenerate() {
        assert!(gaussian_kde(&[1.0, 1.0], 10).is_empty());
        assert!(gaussian_kde(&[], 10).is_empty());
    }
}

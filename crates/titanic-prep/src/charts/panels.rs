//! Drawing routines for each [`Panel`] kind.

use super::{BarGroup, DrawResult, Panel};
use crate::stats;
use plotters::coord::Shift;
use plotters::prelude::*;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 18);

/// Tab10 palette, first four entries.
const PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];
const INLIER_COLOR: RGBColor = RGBColor(31, 119, 180);
const OUTLIER_COLOR: RGBColor = RGBColor(214, 39, 40);
const BOUND_COLOR: RGBColor = RGBColor(44, 160, 44);
// viridis endpoints
const PRESENT_COLOR: RGBColor = RGBColor(68, 1, 84);
const MISSING_COLOR: RGBColor = RGBColor(253, 231, 37);

const KDE_POINTS: usize = 200;

fn palette(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// Widen a degenerate or empty range so the coordinate mapping stays finite.
fn padded_range(lo: f64, hi: f64, pad_fraction: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span <= 0.0 {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    (lo - span * pad_fraction, hi + span * pad_fraction)
}

/// Label of the category centred on `x`. Category `i` sits at `x = i`, so
/// tick positions between categories get no label.
fn label_at(labels: &[String], x: f64) -> String {
    let slot = x.round();
    if slot < 0.0 || (x - slot).abs() > 1e-6 {
        return String::new();
    }
    labels.get(slot as usize).cloned().unwrap_or_default()
}

pub(super) fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
) -> DrawResult<(), DB> {
    match panel {
        Panel::Histogram {
            title,
            x_desc,
            values,
        } => draw_histogram(area, title, x_desc, values),
        Panel::Bars {
            title,
            x_desc,
            y_desc,
            labels,
            groups,
        } => draw_bars(area, title, x_desc, y_desc, labels, groups),
        Panel::MissingHeatmap {
            title,
            columns,
            missing,
        } => draw_missing_heatmap(area, title, columns, missing),
        Panel::BoxPlot {
            title,
            x_desc,
            values,
            whisker,
        } => draw_boxplot(area, title, x_desc, values, *whisker),
        Panel::OutlierScatter {
            title,
            y_desc,
            values,
            lower,
            upper,
        } => draw_outlier_scatter(area, title, y_desc, values, *lower, *upper),
    }
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    values: &[f64],
) -> DrawResult<(), DB> {
    let edges = stats::auto_bin_edges(values);
    let counts = stats::bin_counts(values, &edges);
    let (x_lo, x_hi) = padded_range(edges[0], edges[edges.len() - 1], 0.02);
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_lo..x_hi, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()?;

    let color = palette(0);
    chart.draw_series(edges.windows(2).zip(&counts).map(|(edge, &count)| {
        Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], color.mix(0.6).filled())
    }))?;
    chart.draw_series(edges.windows(2).zip(&counts).map(|(edge, &count)| {
        Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], WHITE.stroke_width(1))
    }))?;

    // density scaled to counts: n * bin width
    if edges.len() >= 2 {
        let scale = values.len() as f64 * (edges[1] - edges[0]);
        let curve = stats::gaussian_kde(values, KDE_POINTS);
        if !curve.is_empty() {
            chart.draw_series(LineSeries::new(
                curve.into_iter().map(|(x, density)| (x, density * scale)),
                color.stroke_width(2),
            ))?;
        }
    }

    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    groups: &[BarGroup],
) -> DrawResult<(), DB> {
    let slots = labels.len().max(1);
    let y_max = groups
        .iter()
        .flat_map(|g| g.values.iter().copied())
        .fold(0.0f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.15 } else { 1.0 };
    let formatter = |x: &f64| label_at(labels, *x);

    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..slots as f64 - 0.5, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&formatter)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    let group_count = groups.len().max(1);
    let width = 0.8 / group_count as f64;
    for (gi, group) in groups.iter().enumerate() {
        let color = palette(gi);
        let series = chart.draw_series(group.values.iter().enumerate().map(|(li, &value)| {
            let x0 = li as f64 - 0.4 + gi as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, value)], color.filled())
        }))?;
        if let Some(name) = &group.name {
            series
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if groups.iter().any(|g| g.name.is_some()) {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    Ok(())
}

fn draw_missing_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    columns: &[String],
    missing: &[Vec<bool>],
) -> DrawResult<(), DB> {
    let n_cols = columns.len().max(1);
    let n_rows = missing.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let formatter = |x: &f64| label_at(columns, *x);
    let right = n_cols as f64 - 0.5;

    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(10)
        .build_cartesian_2d(-0.5f64..right, 0f64..n_rows as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(n_cols)
        .x_label_formatter(&formatter)
        .draw()?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(-0.5, 0.0), (right, n_rows as f64)],
        PRESENT_COLOR.filled(),
    )))?;

    // Row 0 is drawn at the top; each contiguous run of missing cells is one
    // rectangle.
    let top = n_rows as f64;
    let mut runs = Vec::new();
    for (ci, column) in missing.iter().enumerate() {
        let mut start = None;
        for (ri, &is_missing) in column.iter().chain(std::iter::once(&false)).enumerate() {
            match (is_missing, start) {
                (true, None) => start = Some(ri),
                (false, Some(s)) => {
                    runs.push((ci, s, ri));
                    start = None;
                }
                _ => {}
            }
        }
    }
    chart.draw_series(runs.into_iter().map(|(ci, start, end)| {
        Rectangle::new(
            [
                (ci as f64 - 0.5, top - start as f64),
                (ci as f64 + 0.5, top - end as f64),
            ],
            MISSING_COLOR.filled(),
        )
    }))?;

    Ok(())
}

fn draw_boxplot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    values: &[f64],
    whisker: f64,
) -> DrawResult<(), DB> {
    let sorted = stats::sorted(values);
    let (lo, hi) = stats::min_max(&sorted).unwrap_or((0.0, 1.0));
    let (x_lo, x_hi) = padded_range(lo, hi, 0.05);

    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(x_lo..x_hi, 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc(x_desc)
        .draw()?;

    let (Some(q1), Some(median), Some(q3)) = (
        stats::quantile(&sorted, 0.25),
        stats::quantile(&sorted, 0.5),
        stats::quantile(&sorted, 0.75),
    ) else {
        return Ok(());
    };

    let iqr = q3 - q1;
    let fence_lo = q1 - whisker * iqr;
    let fence_hi = q3 + whisker * iqr;
    let whisker_lo = sorted.iter().copied().find(|&v| v >= fence_lo).unwrap_or(q1);
    let whisker_hi = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= fence_hi)
        .unwrap_or(q3);

    let color = palette(0);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(q1, 0.3), (q3, 0.7)],
        color.mix(0.6).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(q1, 0.3), (q3, 0.7)],
        BLACK.stroke_width(1),
    )))?;
    chart.draw_series([
        PathElement::new(vec![(median, 0.3), (median, 0.7)], BLACK.stroke_width(2)),
        PathElement::new(vec![(whisker_lo, 0.5), (q1, 0.5)], BLACK.stroke_width(1)),
        PathElement::new(vec![(q3, 0.5), (whisker_hi, 0.5)], BLACK.stroke_width(1)),
        PathElement::new(vec![(whisker_lo, 0.4), (whisker_lo, 0.6)], BLACK.stroke_width(1)),
        PathElement::new(vec![(whisker_hi, 0.4), (whisker_hi, 0.6)], BLACK.stroke_width(1)),
    ])?;
    chart.draw_series(
        sorted
            .iter()
            .filter(|&&v| v < fence_lo || v > fence_hi)
            .map(|&v| Circle::new((v, 0.5), 3, BLACK.stroke_width(1))),
    )?;

    Ok(())
}

fn draw_outlier_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    y_desc: &str,
    values: &[Option<f64>],
    lower: f64,
    upper: f64,
) -> DrawResult<(), DB> {
    let present: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect();
    let data_range = stats::min_max(&present.iter().map(|(_, v)| *v).collect::<Vec<_>>());
    let (lo, hi) = match data_range {
        Some((lo, hi)) => (lo.min(lower), hi.max(upper)),
        None => (lower, upper),
    };
    let (y_lo, y_hi) = padded_range(lo, hi, 0.05);
    let x_hi = values.len().max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Index")
        .y_desc(y_desc)
        .draw()?;

    let is_outlier = |v: f64| v < lower || v > upper;
    let inlier_style = INLIER_COLOR.mix(0.5).filled();
    let outlier_style = OUTLIER_COLOR.mix(0.5).filled();

    chart
        .draw_series(
            present
                .iter()
                .filter(|(_, v)| !is_outlier(*v))
                .map(|&(x, y)| Circle::new((x, y), 2, inlier_style)),
        )?
        .label("Within bounds")
        .legend(move |(x, y)| Circle::new((x + 5, y), 3, inlier_style));

    let outlier_count = present.iter().filter(|(_, v)| is_outlier(*v)).count();
    let outlier_series = chart.draw_series(
        present
            .iter()
            .filter(|(_, v)| is_outlier(*v))
            .map(|&(x, y)| Circle::new((x, y), 2, outlier_style)),
    )?;
    if outlier_count > 0 {
        outlier_series
            .label("Outlier")
            .legend(move |(x, y)| Circle::new((x + 5, y), 3, outlier_style));
    }

    for (name, bound) in [("Lower", lower), ("Upper", upper)] {
        chart
            .draw_series(LineSeries::new(
                vec![(0.0, bound), (x_hi, bound)],
                BOUND_COLOR.stroke_width(2),
            ))?
            .label(format!("{name} bound: {bound:.2}"))
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 15, y)], BOUND_COLOR.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

//! Chart rendering.
//!
//! Stages describe a chart as a [`Figure`]: a grid of [`Panel`] values that
//! only hold data. Rendering is done here with `plotters`, so the stage code
//! never touches a drawing backend and figures can be inspected in tests
//! without writing any file.

mod panels;

use crate::config::{ImageFormat, PrepConfig};
use crate::error::{PrepError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One named series of bars. `values[i]` belongs to the i-th label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGroup {
    pub name: Option<String>,
    pub values: Vec<f64>,
}

/// A single chart inside a figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Panel {
    /// Histogram with `auto` bins and a KDE overlay.
    Histogram {
        title: String,
        x_desc: String,
        values: Vec<f64>,
    },
    /// Vertical bars per label; several groups are drawn side by side.
    Bars {
        title: String,
        x_desc: String,
        y_desc: String,
        labels: Vec<String>,
        groups: Vec<BarGroup>,
    },
    /// Cell grid marking missing values, one column per table column.
    MissingHeatmap {
        title: String,
        columns: Vec<String>,
        /// `missing[column][row]`
        missing: Vec<Vec<bool>>,
    },
    /// Horizontal box plot with whiskers at `whisker` times the IQR.
    BoxPlot {
        title: String,
        x_desc: String,
        values: Vec<f64>,
        whisker: f64,
    },
    /// Values against row index; points outside the bounds are highlighted
    /// and both bounds are drawn as horizontal lines.
    OutlierScatter {
        title: String,
        y_desc: String,
        values: Vec<Option<f64>>,
        lower: f64,
        upper: f64,
    },
}

/// A grid of panels saved as one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub size: (u32, u32),
    pub grid: (usize, usize),
    pub panels: Vec<Panel>,
}

impl Figure {
    /// A figure of `size` pixels holding a single panel.
    pub fn single(size: (u32, u32), panel: Panel) -> Self {
        Self {
            size,
            grid: (1, 1),
            panels: vec![panel],
        }
    }

    /// A figure of `size` pixels split into `rows` x `cols` cells, filled row
    /// by row. Cells without a panel stay blank.
    pub fn grid(size: (u32, u32), rows: usize, cols: usize, panels: Vec<Panel>) -> Self {
        Self {
            size,
            grid: (rows, cols),
            panels,
        }
    }

    /// Render the figure to `path` (the extension is not altered).
    pub fn save(&self, path: &Path, options: &RenderOptions) -> Result<()> {
        let plot_err = |reason: String| PrepError::Plot {
            path: path.to_path_buf(),
            reason,
        };

        match options.format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, self.size).into_drawing_area();
                self.draw_on(&root).map_err(|e| plot_err(e.to_string()))?;
            }
            #[cfg(feature = "png")]
            ImageFormat::Png => {
                fonts::ensure_font(options.font_path.as_deref()).map_err(plot_err)?;
                let root = BitMapBackend::new(path, self.size).into_drawing_area();
                self.draw_on(&root).map_err(|e| plot_err(e.to_string()))?;
            }
            #[cfg(not(feature = "png"))]
            ImageFormat::Png => {
                return Err(PrepError::InvalidConfig(
                    "PNG output requires building with the `png` feature".to_string(),
                ));
            }
        }

        debug!("Rendered {} panel(s) to {}", self.panels.len(), path.display());
        Ok(())
    }

    fn draw_on<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<(), DB> {
        root.fill(&WHITE)?;
        let cells = root.split_evenly(self.grid);
        for (cell, panel) in cells.iter().zip(&self.panels) {
            panels::draw_panel(cell, panel)?;
        }
        root.present()?;
        Ok(())
    }
}

pub(crate) type DrawResult<T, DB> =
    std::result::Result<T, DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// How and where figures are written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: ImageFormat,
    pub font_path: Option<PathBuf>,
}

impl RenderOptions {
    pub fn from_config(config: &PrepConfig) -> Self {
        Self {
            format: config.image_format,
            font_path: config.font_path.clone(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            font_path: None,
        }
    }
}

#[cfg(feature = "png")]
mod fonts {
    //! Font registration for the `ab_glyph` text renderer.

    use plotters::style::FontStyle;
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;

    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    /// Register a TrueType font as `sans-serif` once per process.
    pub fn ensure_font(explicit: Option<&Path>) -> Result<(), String> {
        REGISTERED
            .get_or_init(|| {
                let path = explicit
                    .map(Path::to_path_buf)
                    .or_else(|| SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.exists()))
                    .ok_or("no TrueType font found; pass a font path")?;
                let bytes = std::fs::read(&path).map_err(|e| e.to_string())?;
                let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                plotters::style::register_font("sans-serif", FontStyle::Normal, bytes)
                    .map_err(|_| format!("{} is not a valid TrueType font", path.display()))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg() -> RenderOptions {
        RenderOptions {
            format: ImageFormat::Svg,
            font_path: None,
        }
    }

    fn sample_figure() -> Figure {
        Figure::grid(
            (800, 600),
            2,
            2,
            vec![
                Panel::Histogram {
                    title: "Age Distribution".to_string(),
                    x_desc: "Age".to_string(),
                    values: vec![22.0, 38.0, 26.0, 35.0, 35.0, 54.0, 2.0, 27.0],
                },
                Panel::Bars {
                    title: "Sex Distribution by Survival".to_string(),
                    x_desc: "Sex".to_string(),
                    y_desc: "Count".to_string(),
                    labels: vec!["female".to_string(), "male".to_string()],
                    groups: vec![
                        BarGroup {
                            name: Some("Survived = 0".to_string()),
                            values: vec![1.0, 4.0],
                        },
                        BarGroup {
                            name: Some("Survived = 1".to_string()),
                            values: vec![3.0, 0.0],
                        },
                    ],
                },
                Panel::BoxPlot {
                    title: "Boxplot of Fare".to_string(),
                    x_desc: "Fare".to_string(),
                    values: vec![7.25, 71.28, 7.92, 53.1, 8.05, 512.33],
                    whisker: 1.5,
                },
                Panel::OutlierScatter {
                    title: "Outliers in Fare".to_string(),
                    y_desc: "Fare".to_string(),
                    values: vec![Some(7.25), None, Some(512.33), Some(8.05)],
                    lower: -20.0,
                    upper: 90.0,
                },
            ],
        )
    }

    #[test]
    fn test_save_svg_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.svg");
        sample_figure().save(&path, &svg()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
        assert!(content.contains("Age Distribution"));
        assert!(content.contains("Outliers in Fare"));
    }

    #[test]
    fn test_png_is_default_format() {
        assert_eq!(RenderOptions::default().format, ImageFormat::Png);
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_save_png_or_report_missing_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        match sample_figure().save(&path, &RenderOptions::default()) {
            Ok(()) => {
                let bytes = std::fs::read(&path).unwrap();
                assert!(bytes.starts_with(b"\x89PNG"));
            }
            Err(err) => assert_eq!(err.error_code(), "PLOT_ERROR"),
        }
    }

    #[test]
    fn test_save_missing_heatmap_and_empty_histogram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.svg");
        let figure = Figure::grid(
            (600, 400),
            1,
            2,
            vec![
                Panel::MissingHeatmap {
                    title: "Missing Values".to_string(),
                    columns: vec!["Age".to_string(), "Fare".to_string()],
                    missing: vec![vec![false, true, true], vec![false, false, false]],
                },
                Panel::Histogram {
                    title: "Empty".to_string(),
                    x_desc: "Age".to_string(),
                    values: vec![],
                },
            ],
        );
        figure.save(&path, &svg()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("chart.svg");
        let err = sample_figure().save(&path, &svg()).unwrap_err();
        assert_eq!(err.error_code(), "PLOT_ERROR");
    }
}

//! Report output.
//!
//! [`TextTable`] and [`render_series`] format the tables embedded in the
//! text reports; [`ArtifactWriter`] puts reports, charts and the cleaned
//! table on disk and keeps the list of paths for the stage summary.

mod artifacts;
mod table;

pub use artifacts::ArtifactWriter;
pub use table::{TextTable, render_series};

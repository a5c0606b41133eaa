//! # lh-viz
//!
//! Reporting artifacts for lanham: the model comparison table, per-model
//! text summaries and the JSON artifacts behind the point plots and the
//! coefficient plot. Drawing lives in `lh-viz-render`.

#![warn(missing_docs)]

#[allow(missing_docs)]
pub mod coefficients;
pub mod comparison;
pub mod meta;
pub mod pointplot;
pub mod summary;

pub use coefficients::{coefficient_artifact, CoefficientArtifact, CoefficientEntry};
pub use comparison::{comparison_table, render_text, ComparisonArtifact, StarThresholds};
pub use meta::ArtifactMeta;
pub use pointplot::{point_plot, standard_point_plots, CiMethod, Level, PointPlotArtifact, PointPlotSpec};
pub use summary::regression_summary;

use lh_data::features::TREATED_X_POST_X_SPENDING;
use lh_data::features::{POST_X_SPENDING, TREATED_X_POST, TREATED_X_SPENDING};
use lh_data::ColumnMap;

/// Title of the comparison table.
pub const COMPARISON_TITLE: &str =
    "Table Comparison: Original Paper Replication & Original Contributions";

/// Comparison rows, triple interaction first.
pub fn default_regressor_order(columns: &ColumnMap) -> Vec<String> {
    vec![
        TREATED_X_POST_X_SPENDING.to_string(),
        columns.post.clone(),
        TREATED_X_POST.to_string(),
        TREATED_X_SPENDING.to_string(),
        POST_X_SPENDING.to_string(),
        columns.spending.clone(),
    ]
}

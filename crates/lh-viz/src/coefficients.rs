//! Coefficient plot artifact: one regressor's estimate across several fits.
//!
//! Used to put the triple-interaction estimate of every specification on one
//! canvas, each with a symmetric ±1.96·SE whisker.

use lh_core::Result;
use lh_inference::FittedModel;
use serde::{Deserialize, Serialize};

use crate::meta::ArtifactMeta;

/// Half-width multiplier of the plotted interval.
pub const WHISKER_Z: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientArtifact {
    pub schema_version: String,
    pub meta: ArtifactMeta,
    pub regressor: String,
    pub entries: Vec<CoefficientEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientEntry {
    pub label: String,
    pub outcome: String,
    pub estimate: f64,
    pub std_error: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Collect `regressor` from every model that estimated it.
///
/// Models where the regressor was omitted are skipped.
pub fn coefficient_artifact(
    models: &[FittedModel],
    regressor: &str,
    title: &str,
) -> Result<CoefficientArtifact> {
    let entries = models
        .iter()
        .filter_map(|m| {
            m.coefficient(regressor).map(|c| CoefficientEntry {
                label: format!("{} {}", m.label, m.outcome),
                outcome: m.outcome.clone(),
                estimate: c.estimate,
                std_error: c.std_error,
                lower: c.estimate - WHISKER_Z * c.std_error,
                upper: c.estimate + WHISKER_Z * c.std_error,
            })
        })
        .collect();
    Ok(CoefficientArtifact {
        schema_version: "lanham_coefficients_v0".to_string(),
        meta: ArtifactMeta::new(title)?,
        regressor: regressor.to_string(),
        entries,
    })
}

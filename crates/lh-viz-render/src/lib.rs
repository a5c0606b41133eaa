//! # lh-viz-render
//!
//! SVG rendering for lanham plot artifacts: faceted point plots and the
//! coefficient plot. Artifacts arrive as JSON, so anything written by
//! `lh-viz` can be re-rendered later with a different theme.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use config::VizConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an artifact JSON to an SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    let svg = match kind {
        "point_plot" | "pointplot" => {
            let art: lh_viz::PointPlotArtifact = serde_json::from_str(artifact_json)?;
            plots::point::render(&art, config)?
        }
        "coefficients" => {
            let art: lh_viz::CoefficientArtifact = serde_json::from_str(artifact_json)?;
            plots::coefficients::render(&art, config)?
        }
        other => return Err(RenderError::UnknownKind(other.to_string())),
    };
    Ok(svg)
}

/// Render a point-plot artifact directly.
pub fn render_point_plot(artifact: &lh_viz::PointPlotArtifact, config: &VizConfig) -> Result<String> {
    plots::point::render(artifact, config)
}

/// Render a coefficient artifact directly.
pub fn render_coefficients(artifact: &lh_viz::CoefficientArtifact, config: &VizConfig) -> Result<String> {
    plots::coefficients::render(artifact, config)
}

/// Render an artifact JSON to a file. Only `.svg` is supported.
pub fn render_to_file(
    artifact_json: &str,
    kind: &str,
    path: &std::path::Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
    if !ext.eq_ignore_ascii_case("svg") {
        return Err(RenderError::UnknownKind(format!("format: {ext}")));
    }
    let svg = render_svg(artifact_json, kind, config)?;
    output::svg::save_svg(&svg, path)
}

//! Analysis configuration for `lanham run` (YAML or JSON).

use anyhow::{Context, Result};
use lh_data::PrepareConfig;
use lh_inference::{CollinearityPolicy, FitOptions, Inference};
use lh_viz::{CiMethod, StarThresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Survey extract (`.csv` or `.parquet`).
    pub input: Option<PathBuf>,
    /// Output directory for this run.
    pub out_dir: PathBuf,

    /// Allow writing into a non-empty `out_dir` (overwrites known filenames).
    pub overwrite: bool,

    /// Column names, subgroup filter, sentinels and the part-time rule.
    #[serde(flatten)]
    pub prepare: PrepareConfig,

    pub regression: RegressionConfig,
    pub viz: VizSection,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: None,
            out_dir: PathBuf::from("lanham_out"),
            overwrite: false,
            prepare: PrepareConfig::default(),
            regression: RegressionConfig::default(),
            viz: VizSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Comparison-table row order. Defaults to triple interaction first.
    pub order: Option<Vec<String>>,
    pub stars: StarThresholds,
    /// Decimal places in text tables.
    pub precision: usize,
    pub collinearity: CollinearityPolicy,
    pub inference: Inference,
    /// Confidence level of the coefficient intervals.
    pub confidence: f64,
    /// Worker threads for the four fits. Use 1 for sequential fitting.
    pub threads: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            order: None,
            stars: StarThresholds::default(),
            precision: 5,
            collinearity: CollinearityPolicy::Drop,
            inference: Inference::Normal,
            confidence: 0.95,
            threads: 1,
        }
    }
}

impl RegressionConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            collinearity: self.collinearity,
            inference: self.inference,
            confidence: self.confidence,
            ..FitOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CiKind {
    #[default]
    Normal,
    Bootstrap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizSection {
    /// Skip plots entirely when false.
    pub enabled: bool,
    pub ci: CiKind,
    /// Bootstrap resamples per group.
    pub n_boot: usize,
    pub seed: u64,
    pub confidence: f64,
    /// Renderer theme: `whitegrid`, `ticks` or `paper`.
    pub theme: String,
    /// Optional YAML file with renderer overrides.
    pub style: Option<PathBuf>,
}

impl Default for VizSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ci: CiKind::Normal,
            n_boot: 1000,
            seed: 0,
            confidence: 0.95,
            theme: "whitegrid".to_string(),
            style: None,
        }
    }
}

impl VizSection {
    pub fn ci_method(&self) -> CiMethod {
        match self.ci {
            CiKind::Normal => CiMethod::Normal,
            CiKind::Bootstrap => CiMethod::Bootstrap { n_boot: self.n_boot, seed: self.seed },
        }
    }

    /// Theme preset plus the optional style file, merged.
    pub fn render_config(&self) -> Result<lh_viz_render::config::VizConfig> {
        let overrides = match &self.style {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading style file {}", path.display()))?,
            ),
            None => None,
        };
        Ok(lh_viz_render::config::resolve_config(Some(self.theme.as_str()), overrides.as_deref())?)
    }
}

pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg: AnalysisConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    };
    Ok(cfg)
}

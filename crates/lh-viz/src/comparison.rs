//! Side-by-side comparison table of several fitted models.
//!
//! One column per model, one row pair (estimate with significance stars,
//! standard error in parentheses) per selected regressor, and a footer with
//! fit statistics. Fixed-effect levels never appear, and neither do omitted
//! regressors.

use serde::{Deserialize, Serialize};

use lh_core::{Error, Result};
use lh_inference::FittedModel;

use crate::meta::ArtifactMeta;

/// Significance thresholds, strictest first. A p-value strictly below the
/// i-th smallest threshold earns one more star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarThresholds {
    /// Ascending p-value cut-offs.
    pub levels: Vec<f64>,
}

impl Default for StarThresholds {
    fn default() -> Self {
        Self { levels: vec![0.01, 0.05, 0.10] }
    }
}

impl StarThresholds {
    /// Stars for a p-value (`""` for NaN or non-significant).
    pub fn stars(&self, p: f64) -> String {
        if p.is_nan() {
            return String::new();
        }
        "*".repeat(self.levels.iter().filter(|&&t| p < t).count())
    }

    /// Legend line such as `* p<.1, ** p<.05, *** p<.01`.
    pub fn legend(&self) -> String {
        let mut sorted = self.levels.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{} p<{}", "*".repeat(i + 1), fmt_threshold(*t)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fmt_threshold(t: f64) -> String {
    let s = format!("{}", t);
    s.strip_prefix('0').map(str::to_string).unwrap_or(s)
}

/// One model column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelColumn {
    /// Column header.
    pub label: String,
    /// Dependent variable.
    pub outcome: String,
    /// Estimation sample.
    pub sample: String,
    /// R².
    pub r_squared: f64,
    /// Adjusted R².
    pub adj_r_squared: f64,
    /// Observations used.
    pub n_obs: usize,
    /// Clusters.
    pub n_clusters: usize,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Point estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Significance stars.
    pub stars: String,
}

/// One regressor row; `cells[j]` is `None` when model `j` lacks the regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Regressor name.
    pub regressor: String,
    /// Per-model cells.
    pub cells: Vec<Option<Cell>>,
}

/// The comparison table as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Model columns.
    pub models: Vec<ModelColumn>,
    /// Regressor rows, in display order.
    pub rows: Vec<ComparisonRow>,
    /// Star legend.
    pub star_legend: String,
}

/// Build the comparison table.
///
/// Rows are the entries of `regressor_order` that some model estimated, in
/// that order.
pub fn comparison_table(
    models: &[FittedModel],
    title: &str,
    regressor_order: &[String],
    stars: &StarThresholds,
) -> Result<ComparisonArtifact> {
    if models.is_empty() {
        return Err(Error::Validation("comparison table needs at least one model".into()));
    }
    let rows: Vec<ComparisonRow> = regressor_order
        .iter()
        .filter(|name| models.iter().any(|m| m.coefficient(name).is_some()))
        .map(|name| ComparisonRow {
            regressor: name.clone(),
            cells: models
                .iter()
                .map(|m| {
                    m.coefficient(name).map(|c| Cell {
                        estimate: c.estimate,
                        std_error: c.std_error,
                        p_value: c.p_value,
                        stars: stars.stars(c.p_value),
                    })
                })
                .collect(),
        })
        .collect();

    Ok(ComparisonArtifact {
        schema_version: "lanham_comparison_v0".to_string(),
        meta: ArtifactMeta::new(title)?,
        models: models
            .iter()
            .map(|m| ModelColumn {
                label: m.label.clone(),
                outcome: m.outcome.clone(),
                sample: m.sample.clone(),
                r_squared: m.r_squared,
                adj_r_squared: m.adj_r_squared,
                n_obs: m.n_obs,
                n_clusters: m.n_clusters,
            })
            .collect(),
        rows,
        star_legend: stars.legend(),
    })
}

/// Fixed-width text rendering with `precision` decimals.
pub fn render_text(artifact: &ComparisonArtifact, precision: usize) -> String {
    let mut header = vec![String::new()];
    header.extend(artifact.models.iter().map(|m| m.label.clone()));

    let mut body: Vec<Vec<String>> = vec![
        std::iter::once(String::new())
            .chain(artifact.models.iter().map(|m| m.outcome.clone()))
            .collect(),
    ];
    for row in &artifact.rows {
        let mut est = vec![row.regressor.clone()];
        let mut se = vec![String::new()];
        for cell in &row.cells {
            match cell {
                Some(c) => {
                    est.push(format!("{:.*}{}", precision, c.estimate, c.stars));
                    se.push(format!("({:.*})", precision, c.std_error));
                }
                None => {
                    est.push(String::new());
                    se.push(String::new());
                }
            }
        }
        body.push(est);
        body.push(se);
    }

    let footer: Vec<Vec<String>> = vec![
        stat_row("R-squared", &artifact.models, |m| format!("{:.*}", precision, m.r_squared)),
        stat_row("R-squared Adj.", &artifact.models, |m| format!("{:.*}", precision, m.adj_r_squared)),
        stat_row("N", &artifact.models, |m| m.n_obs.to_string()),
        stat_row("Clusters", &artifact.models, |m| m.n_clusters.to_string()),
    ];

    let n_cols = header.len();
    let mut widths = vec![0usize; n_cols];
    for line in std::iter::once(&header).chain(&body).chain(&footer) {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let total: usize = widths.iter().sum::<usize>() + 2 * (n_cols - 1);

    let fmt_line = |line: &[String]| -> String {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(j, (c, w))| if j == 0 { format!("{:<w$}", c, w = *w) } else { format!("{:>w$}", c, w = *w) })
            .collect();
        cells.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&artifact.meta.title);
    out.push('\n');
    out.push_str(&"=".repeat(total));
    out.push('\n');
    out.push_str(&fmt_line(&header));
    out.push('\n');
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for line in &body {
        out.push_str(&fmt_line(line));
        out.push('\n');
    }
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for line in &footer {
        out.push_str(&fmt_line(line));
        out.push('\n');
    }
    out.push_str(&"=".repeat(total));
    out.push('\n');
    out.push_str("Standard errors in parentheses.\n");
    out.push_str(&artifact.star_legend);
    out.push('\n');
    out
}

fn stat_row(name: &str, models: &[ModelColumn], f: impl Fn(&ModelColumn) -> String) -> Vec<String> {
    std::iter::once(name.to_string()).chain(models.iter().map(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_inference::{Coefficient, Inference};

    fn coef(name: &str, estimate: f64, std_error: f64, p_value: f64) -> Coefficient {
        Coefficient {
            name: name.into(),
            estimate,
            std_error,
            statistic: estimate / std_error,
            p_value,
            ci_lower: estimate - 1.96 * std_error,
            ci_upper: estimate + 1.96 * std_error,
        }
    }

    fn model(label: &str, coefs: Vec<Coefficient>) -> FittedModel {
        FittedModel {
            label: label.into(),
            outcome: "emp".into(),
            sample: "all".into(),
            coefficients: coefs,
            omitted: vec![],
            fixed_effects: vec!["statefip".into(), "age".into()],
            cluster_variable: "statefip".into(),
            n_obs: 1000,
            n_excluded: 0,
            n_clusters: 48,
            df_absorbed: 90,
            df_resid: 904,
            r_squared: 0.1234567,
            adj_r_squared: 0.02,
            r_squared_within: 0.01,
            rss: 1.0,
            inference: Inference::Normal,
            confidence: 0.95,
            converged: true,
            vcov: vec![],
        }
    }

    #[test]
    fn star_boundaries_are_strict() {
        let s = StarThresholds::default();
        assert_eq!(s.stars(0.009), "***");
        assert_eq!(s.stars(0.01), "**");
        assert_eq!(s.stars(0.049), "**");
        assert_eq!(s.stars(0.05), "*");
        assert_eq!(s.stars(0.0999), "*");
        assert_eq!(s.stars(0.10), "");
        assert_eq!(s.stars(f64::NAN), "");
        assert_eq!(s.legend(), "* p<.1, ** p<.05, *** p<.01");
    }

    #[test]
    fn rows_follow_order_and_skip_absent() {
        let a = model("(1)", vec![coef("post", 0.5, 0.1, 0.0001), coef("triple", 1.0, 0.5, 0.04)]);
        let b = model("(2)", vec![coef("post", -0.2, 0.3, 0.5)]);
        let order: Vec<String> = ["triple", "spending", "post"].iter().map(|s| s.to_string()).collect();
        let art = comparison_table(&[a, b], "Comparison", &order, &StarThresholds::default()).unwrap();
        let names: Vec<&str> = art.rows.iter().map(|r| r.regressor.as_str()).collect();
        assert_eq!(names, vec!["triple", "post"]);
        assert_eq!(art.rows[0].cells[1], None);
        assert_eq!(art.rows[0].cells[0].as_ref().unwrap().stars, "**");
        assert_eq!(art.rows[1].cells[0].as_ref().unwrap().stars, "***");
    }

    #[test]
    fn text_rendering() {
        let a = model("(1)", vec![coef("triple", 0.0123456, 0.004, 0.002)]);
        let order = vec!["triple".to_string()];
        let art = comparison_table(&[a], "Table Comparison", &order, &StarThresholds::default()).unwrap();
        let text = render_text(&art, 5);
        assert!(text.starts_with("Table Comparison\n"));
        assert!(text.contains("0.01235***"));
        assert!(text.contains("(0.00400)"));
        assert!(text.contains("R-squared"));
        assert!(text.contains("0.12346"));
        assert!(text.contains("1000"));
        assert!(text.trim_end().ends_with("*** p<.01"));
    }

    #[test]
    fn empty_model_list_is_rejected() {
        assert!(comparison_table(&[], "t", &[], &StarThresholds::default()).is_err());
    }
}

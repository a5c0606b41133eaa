//! Faceted point-plot artifacts: group means with confidence intervals.
//!
//! Rows are grouped by facet (spending quartile) × x (period) × hue
//! (treated vs control). Each group contributes one point: its mean outcome
//! and an interval. Rows missing the outcome or any grouping value are left
//! out of that plot only.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use lh_core::{Error, Result};
use lh_data::features::{quantile_linear_sorted, PART_TIME, SPENDING_QUARTILE};
use lh_data::{ColumnMap, Table};
use lh_inference::SampleFilter;

use crate::meta::ArtifactMeta;

/// How group intervals are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CiMethod {
    /// `mean ± z·s/√n`.
    #[default]
    Normal,
    /// Percentile interval of `n_boot` resampled means.
    Bootstrap {
        /// Resamples per group.
        n_boot: usize,
        /// RNG seed.
        seed: u64,
    },
}

/// A labelled value of a numeric grouping column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Cell value.
    pub value: f64,
    /// Display label.
    pub label: String,
}

impl Level {
    fn new(value: f64, label: &str) -> Self {
        Self { value, label: label.to_string() }
    }
}

/// What to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPlotSpec {
    /// Figure title.
    pub title: String,
    /// Numeric outcome column.
    pub outcome: String,
    /// Text column with one panel per value.
    pub facet: String,
    /// Panel order. Empty means sorted distinct values.
    pub facet_order: Vec<String>,
    /// Numeric column on the x axis.
    pub x: String,
    /// x-axis title.
    pub x_title: String,
    /// x-axis categories, left to right.
    pub x_levels: Vec<Level>,
    /// Numeric column split into coloured series.
    pub hue: String,
    /// Legend title.
    pub hue_title: String,
    /// Series, in legend order.
    pub hue_levels: Vec<Level>,
    /// Rows eligible for the plot.
    pub sample: SampleFilter,
    /// Colour palette name understood by the renderer.
    pub palette: String,
}

/// One group mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEstimate {
    /// Index into `x_labels`.
    pub x: usize,
    /// Rows in the group.
    pub n: usize,
    /// Group mean.
    pub mean: f64,
    /// Lower interval bound.
    pub ci_lower: f64,
    /// Upper interval bound.
    pub ci_upper: f64,
}

/// Points sharing one hue level inside a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Hue label.
    pub hue: String,
    /// Points for the x levels that have data, left to right.
    pub points: Vec<PointEstimate>,
}

/// One facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// Facet value.
    pub facet: String,
    /// One series per hue level.
    pub series: Vec<Series>,
}

/// Plot data handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPlotArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance, including the title.
    pub meta: ArtifactMeta,
    /// Outcome column (y-axis label).
    pub outcome: String,
    /// Facet column (panel titles).
    pub facet_name: String,
    /// x-axis title.
    pub x_title: String,
    /// x-axis category labels.
    pub x_labels: Vec<String>,
    /// Legend title.
    pub hue_title: String,
    /// Hue labels in legend order.
    pub hue_labels: Vec<String>,
    /// Palette name.
    pub palette: String,
    /// Interval method.
    pub ci: CiMethod,
    /// Interval confidence level.
    pub confidence: f64,
    /// Panels in display order.
    pub panels: Vec<Panel>,
    /// Sample rows left out for missing or unmatched values.
    pub n_excluded: usize,
}

/// Group the table and compute every point of `spec`.
pub fn point_plot(
    table: &Table,
    spec: &PointPlotSpec,
    ci: CiMethod,
    confidence: f64,
) -> Result<PointPlotArtifact> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::Validation(format!("confidence must lie in (0, 1), got {}", confidence)));
    }
    if spec.x_levels.is_empty() || spec.hue_levels.is_empty() {
        return Err(Error::Validation(format!("plot '{}' has no x or hue levels", spec.title)));
    }
    if let CiMethod::Bootstrap { n_boot, .. } = ci {
        if n_boot < 2 {
            return Err(Error::Validation(format!("bootstrap needs at least 2 resamples, got {}", n_boot)));
        }
    }

    let in_sample = spec.sample.mask(table)?;
    let y = table.numeric(&spec.outcome)?;
    let facet = table.text(&spec.facet)?;
    let x = table.numeric(&spec.x)?;
    let hue = table.numeric(&spec.hue)?;

    let facet_order: Vec<String> = if spec.facet_order.is_empty() {
        let mut v: Vec<String> = facet.iter().flatten().cloned().collect();
        v.sort();
        v.dedup();
        v
    } else {
        spec.facet_order.clone()
    };
    let facet_index: HashMap<&str, usize> =
        facet_order.iter().enumerate().map(|(i, f)| (f.as_str(), i)).collect();
    let level_of = |levels: &[Level], v: f64| levels.iter().position(|l| l.value == v);

    let (n_x, n_hue) = (spec.x_levels.len(), spec.hue_levels.len());
    let mut groups: Vec<Vec<f64>> = vec![Vec::new(); facet_order.len() * n_hue * n_x];
    let mut n_excluded = 0usize;
    for i in (0..table.n_rows()).filter(|&i| in_sample[i]) {
        let cell = (|| {
            let f = *facet_index.get(facet[i].as_deref()?)?;
            let xi = level_of(&spec.x_levels, x[i]?)?;
            let hi = level_of(&spec.hue_levels, hue[i]?)?;
            Some(((f * n_hue + hi) * n_x + xi, y[i]?))
        })();
        match cell {
            Some((g, v)) => groups[g].push(v),
            None => n_excluded += 1,
        }
    }
    if n_excluded > 0 {
        tracing::debug!(plot = %spec.title, n_excluded, "rows left out of plot");
    }

    let z = Normal::new(0.0, 1.0)
        .map_err(|e| Error::Computation(format!("normal distribution: {}", e)))?
        .inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let mut rng = match ci {
        CiMethod::Bootstrap { seed, .. } => Some(StdRng::seed_from_u64(seed)),
        CiMethod::Normal => None,
    };

    let mut panels = Vec::with_capacity(facet_order.len());
    for (f, name) in facet_order.iter().enumerate() {
        let mut series = Vec::with_capacity(n_hue);
        for (hi, h) in spec.hue_levels.iter().enumerate() {
            let mut points = Vec::new();
            for xi in 0..n_x {
                let values = &groups[(f * n_hue + hi) * n_x + xi];
                if values.is_empty() {
                    continue;
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let (lo, hi_bound) = match (ci, rng.as_mut()) {
                    (CiMethod::Bootstrap { n_boot, .. }, Some(r)) => {
                        bootstrap_interval(values, n_boot, confidence, r)
                    }
                    _ => normal_interval(values, mean, z),
                };
                points.push(PointEstimate { x: xi, n: values.len(), mean, ci_lower: lo, ci_upper: hi_bound });
            }
            series.push(Series { hue: h.label.clone(), points });
        }
        panels.push(Panel { facet: name.clone(), series });
    }

    Ok(PointPlotArtifact {
        schema_version: "lanham_point_plot_v0".to_string(),
        meta: ArtifactMeta::new(&spec.title)?,
        outcome: spec.outcome.clone(),
        facet_name: spec.facet.clone(),
        x_title: spec.x_title.clone(),
        x_labels: spec.x_levels.iter().map(|l| l.label.clone()).collect(),
        hue_title: spec.hue_title.clone(),
        hue_labels: spec.hue_levels.iter().map(|l| l.label.clone()).collect(),
        palette: spec.palette.clone(),
        ci,
        confidence,
        panels,
        n_excluded,
    })
}

/// Zero width for singleton groups.
fn normal_interval(values: &[f64], mean: f64, z: f64) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (mean, mean);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let half = z * (var / n as f64).sqrt();
    (mean - half, mean + half)
}

fn bootstrap_interval(values: &[f64], n_boot: usize, confidence: f64, rng: &mut StdRng) -> (f64, f64) {
    let n = values.len();
    let mut means: Vec<f64> = (0..n_boot)
        .map(|_| (0..n).map(|_| values[rng.gen_range(0..n)]).sum::<f64>() / n as f64)
        .collect();
    means.sort_by(f64::total_cmp);
    let alpha = 1.0 - confidence;
    (quantile_linear_sorted(&means, alpha / 2.0), quantile_linear_sorted(&means, 1.0 - alpha / 2.0))
}

/// The four plots mirroring the four regressions.
pub fn standard_point_plots(columns: &ColumnMap, quartile_labels: &[String; 4]) -> Vec<PointPlotSpec> {
    let employed = SampleFilter::Equals { column: columns.employed.clone(), value: 1.0 };
    let plot = |title: &str, outcome: &str, sample: &SampleFilter, palette: &str| PointPlotSpec {
        title: title.to_string(),
        outcome: outcome.to_string(),
        facet: SPENDING_QUARTILE.to_string(),
        facet_order: quartile_labels.to_vec(),
        x: columns.post.clone(),
        x_title: "Period".to_string(),
        x_levels: vec![Level::new(0.0, "1940 (Pre)"), Level::new(1.0, "1950 (Post)")],
        hue: columns.treated.clone(),
        hue_title: "Group".to_string(),
        hue_levels: vec![Level::new(0.0, "Control"), Level::new(1.0, "Treated (Mothers)")],
        sample: sample.clone(),
        palette: palette.to_string(),
    };
    vec![
        plot(
            "DiDiD: Employment Probability by Lanham Spending Quartile",
            &columns.employed,
            &SampleFilter::All,
            "Set1",
        ),
        plot("DiDiD: Weekly Hours by Lanham Spending Quartile", &columns.hours, &SampleFilter::All, "Set1"),
        plot("DiDiD: Part-Time Probability (Workers Only)", PART_TIME, &employed, "Set2"),
        plot("DiDiD: Weekly Hours (Workers Only)", &columns.hours, &employed, "Set2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lh_data::Column;

    fn toy() -> Table {
        // facet A: control pre {1,3}, control post {5}, treated pre {2,4,6}; facet B: treated post {10}
        Table::from_columns(vec![
            (
                "y".into(),
                Column::Numeric(vec![Some(1.0), Some(3.0), Some(5.0), Some(2.0), Some(4.0), Some(6.0), Some(10.0), None, Some(7.0)]),
            ),
            (
                SPENDING_QUARTILE.into(),
                Column::Text(
                    ["A", "A", "A", "A", "A", "A", "B", "B"]
                        .iter()
                        .map(|s| Some(s.to_string()))
                        .chain(std::iter::once(None))
                        .collect(),
                ),
            ),
            (
                "post".into(),
                Column::Numeric(vec![Some(0.0), Some(0.0), Some(1.0), Some(0.0), Some(0.0), Some(0.0), Some(1.0), Some(1.0), Some(0.0)]),
            ),
            (
                "treated".into(),
                Column::Numeric(vec![Some(0.0), Some(0.0), Some(0.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(0.0)]),
            ),
            ("emp".into(), Column::Numeric(vec![Some(1.0); 9])),
        ])
        .unwrap()
    }

    fn spec() -> PointPlotSpec {
        let mut s = standard_point_plots(&ColumnMap::default(), &["A", "B", "C", "D"].map(String::from))
            .remove(0);
        s.outcome = "y".into();
        s.facet_order = vec!["A".into(), "B".into()];
        s
    }

    #[test]
    fn group_means_and_normal_intervals() {
        let art = point_plot(&toy(), &spec(), CiMethod::Normal, 0.95).unwrap();
        assert_eq!(art.panels.len(), 2);
        assert_eq!(art.n_excluded, 2);
        assert_eq!(art.x_labels, vec!["1940 (Pre)", "1950 (Post)"]);

        let control = &art.panels[0].series[0];
        assert_eq!(control.hue, "Control");
        assert_eq!(control.points.len(), 2);
        let pre = &control.points[0];
        assert_eq!((pre.x, pre.n), (0, 2));
        assert_relative_eq!(pre.mean, 2.0);
        // s = √2, se = 1
        assert_relative_eq!(pre.ci_upper - pre.mean, 1.959963984540054, epsilon = 1e-9);
        let post = &control.points[1];
        assert_eq!((post.x, post.n), (1, 1));
        assert_eq!((post.ci_lower, post.ci_upper), (5.0, 5.0));

        let treated = &art.panels[0].series[1];
        assert_eq!(treated.points.len(), 1);
        assert_relative_eq!(treated.points[0].mean, 4.0);

        let b = &art.panels[1];
        assert!(b.series[0].points.is_empty());
        assert_eq!(b.series[1].points[0].x, 1);
    }

    #[test]
    fn bootstrap_is_seeded_and_brackets_mean() {
        let ci = CiMethod::Bootstrap { n_boot: 500, seed: 3 };
        let a = point_plot(&toy(), &spec(), ci, 0.95).unwrap();
        let b = point_plot(&toy(), &spec(), ci, 0.95).unwrap();
        assert_eq!(a.panels, b.panels);
        let p = &a.panels[0].series[1].points[0];
        assert!(p.ci_lower <= p.mean && p.mean <= p.ci_upper);
        assert!(p.ci_lower >= 2.0 && p.ci_upper <= 6.0);
    }

    #[test]
    fn rejects_bad_confidence() {
        assert!(point_plot(&toy(), &spec(), CiMethod::Normal, 1.0).is_err());
        assert!(point_plot(&toy(), &spec(), CiMethod::Bootstrap { n_boot: 1, seed: 0 }, 0.9).is_err());
    }

    #[test]
    fn standard_plots_mirror_regressions() {
        let specs = standard_point_plots(&ColumnMap::default(), &lh_data::features::default_quartile_labels());
        let outcomes: Vec<&str> = specs.iter().map(|s| s.outcome.as_str()).collect();
        assert_eq!(outcomes, vec!["emp", "HRSWORK1", "part_time", "HRSWORK1"]);
        assert_eq!(specs[2].sample, SampleFilter::Equals { column: "emp".into(), value: 1.0 });
        assert_eq!(specs[0].palette, "Set1");
        assert_eq!(specs[3].palette, "Set2");
        assert_eq!(specs[1].facet_order[3], "Q4: High Spending");
    }
}

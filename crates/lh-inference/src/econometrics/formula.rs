//! Regression specifications and their translation into complete-case designs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lh_core::{Error, Result};
use lh_data::features::{
    POST_X_SPENDING, TREATED_X_POST, TREATED_X_POST_X_SPENDING, TREATED_X_SPENDING,
};
use lh_data::{Column, ColumnMap, Table};

use super::ols::{FeDesign, FixedEffect};

/// Right-hand side shared by every specification: slopes, absorbed fixed
/// effects and the clustering variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DididFormula {
    /// Slope regressors, in reporting order.
    pub regressors: Vec<String>,
    /// Categorical variables absorbed as fixed effects.
    pub fixed_effects: Vec<String>,
    /// Clustering variable.
    pub cluster: String,
}

impl DididFormula {
    /// `spending + post + treated×post + treated×spending + post×spending +
    /// treated×post×spending + FE(state) + FE(age)`, clustered by state.
    pub fn new(columns: &ColumnMap) -> Self {
        Self {
            regressors: vec![
                columns.spending.clone(),
                columns.post.clone(),
                TREATED_X_POST.to_string(),
                TREATED_X_SPENDING.to_string(),
                POST_X_SPENDING.to_string(),
                TREATED_X_POST_X_SPENDING.to_string(),
            ],
            fixed_effects: vec![columns.state.clone(), columns.age.clone()],
            cluster: columns.state.clone(),
        }
    }

    /// Printable formula for an outcome.
    pub fn describe(&self, outcome: &str) -> String {
        let mut terms = self.regressors.clone();
        terms.extend(self.fixed_effects.iter().map(|fe| format!("C({})", fe)));
        format!("{} ~ {} | cluster({})", outcome, terms.join(" + "), self.cluster)
    }
}

/// Rows a specification is estimated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleFilter {
    /// Every row.
    All,
    /// Rows where a numeric column equals a value (missing never matches).
    Equals {
        /// Column tested.
        column: String,
        /// Required value.
        value: f64,
    },
}

impl SampleFilter {
    /// Short description, e.g. `all` or `emp == 1`.
    pub fn describe(&self) -> String {
        match self {
            SampleFilter::All => "all".to_string(),
            SampleFilter::Equals { column, value } => format!("{} == {}", column, value),
        }
    }

    /// Boolean row mask over `table`.
    pub fn mask(&self, table: &Table) -> Result<Vec<bool>> {
        match self {
            SampleFilter::All => Ok(vec![true; table.n_rows()]),
            SampleFilter::Equals { column, value } => {
                Ok(table.numeric(column)?.iter().map(|c| *c == Some(*value)).collect())
            }
        }
    }
}

/// One regression: outcome, sample and right-hand side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSpec {
    /// Column header in comparison tables.
    pub label: String,
    /// Dependent variable.
    pub outcome: String,
    /// Estimation sample.
    pub sample: SampleFilter,
    /// Regressors, fixed effects and cluster.
    pub formula: DididFormula,
}

/// Map the cells of a categorical column to 0-based levels in order of first
/// appearance. Missing cells map to `None`.
fn encode_levels(col: &Column) -> Vec<Option<usize>> {
    match col {
        Column::Numeric(v) => {
            let mut seen: HashMap<u64, usize> = HashMap::new();
            v.iter()
                .map(|c| {
                    c.map(|x| {
                        let next = seen.len();
                        // +0.0 folds -0.0 into 0.0
                        *seen.entry((x + 0.0).to_bits()).or_insert(next)
                    })
                })
                .collect()
        }
        Column::Text(v) => {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            v.iter()
                .map(|c| {
                    c.as_deref().map(|s| {
                        let next = seen.len();
                        *seen.entry(s).or_insert(next)
                    })
                })
                .collect()
        }
    }
}

/// Re-index levels observed in `rows` to `0..k`.
fn compact(levels: &[Option<usize>], rows: &[usize]) -> Vec<usize> {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    rows.iter()
        .filter_map(|&i| levels[i])
        .map(|l| {
            let next = remap.len();
            *remap.entry(l).or_insert(next)
        })
        .collect()
}

/// Build the complete-case design for `spec`.
///
/// Rows outside the sample are ignored. Rows inside it with a missing
/// outcome, regressor, fixed-effect or cluster value are dropped for this fit
/// only and counted in `n_excluded`.
pub fn design_from_table(table: &Table, spec: &RegressionSpec) -> Result<FeDesign> {
    let f = &spec.formula;
    table.require_columns(
        std::iter::once(spec.outcome.as_str())
            .chain(f.regressors.iter().map(String::as_str))
            .chain(f.fixed_effects.iter().map(String::as_str))
            .chain(std::iter::once(f.cluster.as_str())),
    )?;

    let in_sample = spec.sample.mask(table)?;
    let y = table.numeric(&spec.outcome)?;
    let xs: Vec<&[Option<f64>]> =
        f.regressors.iter().map(|r| table.numeric(r)).collect::<Result<_>>()?;
    let fe_levels: Vec<Vec<Option<usize>>> =
        f.fixed_effects.iter().map(|name| table.column(name).map(encode_levels)).collect::<Result<_>>()?;
    let cluster_levels = encode_levels(table.column(&f.cluster)?);

    let mut rows = Vec::new();
    let mut n_sample = 0usize;
    for i in 0..table.n_rows() {
        if !in_sample[i] {
            continue;
        }
        n_sample += 1;
        let complete = y[i].is_some()
            && xs.iter().all(|x| x[i].is_some())
            && fe_levels.iter().all(|l| l[i].is_some())
            && cluster_levels[i].is_some();
        if complete {
            rows.push(i);
        }
    }
    let n_excluded = n_sample - rows.len();
    if rows.is_empty() {
        return Err(Error::Validation(format!(
            "model '{}': no complete rows in sample '{}' ({} rows excluded)",
            spec.label,
            spec.sample.describe(),
            n_excluded
        )));
    }
    tracing::debug!(model = %spec.label, n_sample, n_excluded, "listwise deletion");

    let pick = |v: &[Option<f64>]| -> Vec<f64> { rows.iter().filter_map(|&i| v[i]).collect() };
    Ok(FeDesign {
        label: spec.label.clone(),
        sample: spec.sample.describe(),
        outcome: spec.outcome.clone(),
        y: pick(y),
        regressors: f.regressors.clone(),
        x: xs.iter().map(|x| pick(x)).collect(),
        fixed_effects: f
            .fixed_effects
            .iter()
            .zip(&fe_levels)
            .map(|(name, levels)| FixedEffect { name: name.clone(), levels: compact(levels, &rows) })
            .collect(),
        cluster_variable: f.cluster.clone(),
        clusters: compact(&cluster_levels, &rows),
        n_excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let n = |v: &[Option<f64>]| Column::Numeric(v.to_vec());
        Table::from_columns(vec![
            ("y".into(), n(&[Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)])),
            ("x".into(), n(&[Some(0.5), Some(1.0), Some(1.5), None, Some(2.5)])),
            ("emp".into(), n(&[Some(1.0), Some(1.0), Some(0.0), Some(1.0), None])),
            (
                "state".into(),
                Column::Text(vec![Some("OH".into()), Some("OH".into()), Some("TX".into()), Some("TX".into()), Some("NY".into())]),
            ),
            ("age".into(), n(&[Some(30.0), Some(31.0), Some(30.0), Some(-0.0), Some(0.0)])),
        ])
        .unwrap()
    }

    fn spec(sample: SampleFilter) -> RegressionSpec {
        RegressionSpec {
            label: "m".into(),
            outcome: "y".into(),
            sample,
            formula: DididFormula {
                regressors: vec!["x".into()],
                fixed_effects: vec!["state".into(), "age".into()],
                cluster: "state".into(),
            },
        }
    }

    #[test]
    fn listwise_deletion_counts_exclusions() {
        let d = design_from_table(&table(), &spec(SampleFilter::All)).unwrap();
        assert_eq!(d.y, vec![1.0, 3.0, 5.0]);
        assert_eq!(d.x, vec![vec![0.5, 1.5, 2.5]]);
        assert_eq!(d.n_excluded, 2);
        assert_eq!(d.clusters, vec![0, 1, 2]);
        assert_eq!(d.fixed_effects[1].levels, vec![0, 0, 1]);
    }

    #[test]
    fn subsample_excludes_outside_rows_silently() {
        let s = SampleFilter::Equals { column: "emp".into(), value: 1.0 };
        let d = design_from_table(&table(), &spec(s)).unwrap();
        assert_eq!(d.y, vec![1.0]);
        assert_eq!(d.n_excluded, 2);
        assert_eq!(d.sample, "emp == 1");
    }

    #[test]
    fn negative_zero_is_zero_level() {
        let levels = encode_levels(&Column::Numeric(vec![Some(-0.0), Some(0.0), None, Some(2.0)]));
        assert_eq!(levels, vec![Some(0), Some(0), None, Some(1)]);
    }

    #[test]
    fn absent_column_is_fatal() {
        let mut s = spec(SampleFilter::All);
        s.formula.regressors.push("treated_x_post".into());
        assert!(matches!(
            design_from_table(&table(), &s),
            Err(Error::MissingColumn(c)) if c == "treated_x_post"
        ));
    }

    #[test]
    fn formula_description() {
        let f = DididFormula::new(&ColumnMap::default());
        assert_eq!(f.regressors.len(), 6);
        assert_eq!(f.regressors[5], TREATED_X_POST_X_SPENDING);
        assert_eq!(
            f.describe("emp"),
            "emp ~ rlanham_012 + post + treated_x_post + treated_x_spending + post_x_spending + \
             treated_x_post_x_spending + C(statefip) + C(age) | cluster(statefip)"
        );
    }
}

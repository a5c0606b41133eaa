//! Triple-difference (DiDiD) specifications and the regression runner.
//!
//! The coefficient of interest is the one on `treated × post × spending`: the
//! extra change in the treated-vs-control gap after the policy, per unit of
//! state spending.

use rayon::prelude::*;

use lh_core::{Error, Result};
use lh_data::features::PART_TIME;
use lh_data::{ColumnMap, Table};

use super::formula::{design_from_table, DididFormula, RegressionSpec, SampleFilter};
use super::ols::{fit_fe_ols, FitOptions};
use crate::result::FittedModel;

/// The standard set of four specifications.
pub struct DididSpecification;

impl DididSpecification {
    /// Employment and hours on the full sample, then part-time status and
    /// hours on employed respondents only.
    pub fn standard(columns: &ColumnMap) -> Vec<RegressionSpec> {
        let formula = DididFormula::new(columns);
        let employed =
            SampleFilter::Equals { column: columns.employed.clone(), value: 1.0 };
        let spec = |label: &str, outcome: &str, sample: &SampleFilter| RegressionSpec {
            label: label.to_string(),
            outcome: outcome.to_string(),
            sample: sample.clone(),
            formula: formula.clone(),
        };
        vec![
            spec("(1)", &columns.employed, &SampleFilter::All),
            spec("(2)", &columns.hours, &SampleFilter::All),
            spec("(3)", PART_TIME, &employed),
            spec("(4)", &columns.hours, &employed),
        ]
    }
}

/// Build the design for `spec` and fit it.
pub fn run_specification(
    table: &Table,
    spec: &RegressionSpec,
    opts: &FitOptions,
) -> Result<FittedModel> {
    let design = design_from_table(table, spec)?;
    fit_fe_ols(&design, opts)
}

/// Fit every specification, on up to `threads` worker threads.
///
/// Results come back in specification order. The first failing fit aborts
/// the run.
pub fn run_specifications(
    table: &Table,
    specs: &[RegressionSpec],
    opts: &FitOptions,
    threads: usize,
) -> Result<Vec<FittedModel>> {
    if threads <= 1 {
        return specs.iter().map(|s| run_specification(table, s, opts)).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Computation(format!("failed to start worker pool: {}", e)))?;
    pool.install(|| specs.par_iter().map(|s| run_specification(table, s, opts)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_specifications() {
        let specs = DididSpecification::standard(&ColumnMap::default());
        assert_eq!(specs.len(), 4);
        let outcomes: Vec<&str> = specs.iter().map(|s| s.outcome.as_str()).collect();
        assert_eq!(outcomes, vec!["emp", "HRSWORK1", "part_time", "HRSWORK1"]);
        assert_eq!(specs[0].sample, SampleFilter::All);
        assert_eq!(specs[2].sample, SampleFilter::Equals { column: "emp".into(), value: 1.0 });
        assert!(specs.iter().all(|s| s.formula.cluster == "statefip"));
    }
}

//! Fitted-model records.
//!
//! A [`FittedModel`] is produced once per fit and never mutated afterwards;
//! the summary renderer and the CLI only read it.

use serde::{Deserialize, Serialize};

use crate::econometrics::collinear::Omitted;

/// Reference distribution for test statistics and intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inference {
    /// Standard normal (z statistics).
    #[default]
    Normal,
    /// Student-t with `G − 1` degrees of freedom (t statistics).
    StudentT,
}

impl Inference {
    /// Column header for the test statistic.
    pub fn statistic_label(self) -> &'static str {
        match self {
            Inference::Normal => "z",
            Inference::StudentT => "t",
        }
    }
}

/// One estimated slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Regressor name.
    pub name: String,
    /// Point estimate.
    pub estimate: f64,
    /// Cluster-robust standard error.
    pub std_error: f64,
    /// `estimate / std_error`.
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Lower confidence bound.
    pub ci_lower: f64,
    /// Upper confidence bound.
    pub ci_upper: f64,
}

/// Result of one fixed-effects OLS fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    /// Short label used as the column header in comparison tables.
    pub label: String,
    /// Dependent variable.
    pub outcome: String,
    /// Description of the estimation sample.
    pub sample: String,
    /// Identified slopes, in formula order.
    pub coefficients: Vec<Coefficient>,
    /// Regressors dropped for collinearity.
    pub omitted: Vec<Omitted>,
    /// Absorbed fixed-effect variables.
    pub fixed_effects: Vec<String>,
    /// Clustering variable.
    pub cluster_variable: String,
    /// Observations used.
    pub n_obs: usize,
    /// Sample rows dropped for missing values.
    pub n_excluded: usize,
    /// Distinct clusters.
    pub n_clusters: usize,
    /// Rank absorbed by the fixed effects (constant included).
    pub df_absorbed: usize,
    /// `n_obs − slopes − df_absorbed`.
    pub df_resid: usize,
    /// R² against the raw outcome.
    pub r_squared: f64,
    /// Adjusted R².
    pub adj_r_squared: f64,
    /// R² of the fixed-effect-residualised regression.
    pub r_squared_within: f64,
    /// Residual sum of squares.
    pub rss: f64,
    /// Reference distribution used for p-values.
    pub inference: Inference,
    /// Confidence level of the intervals.
    pub confidence: f64,
    /// Whether fixed-effect absorption converged for every column.
    pub converged: bool,
    /// Cluster-robust covariance of `coefficients`, row-major.
    pub vcov: Vec<Vec<f64>>,
}

impl FittedModel {
    /// Look up a coefficient by regressor name.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Whether `name` was dropped for collinearity.
    pub fn is_omitted(&self, name: &str) -> bool {
        self.omitted.iter().any(|o| o.name == name)
    }
}

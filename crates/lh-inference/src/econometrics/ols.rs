//! OLS with absorbed fixed effects and cluster-robust inference.
//!
//! The fixed effects are swept out of the outcome and every regressor with
//! [`FixedEffectsSolver`]; by Frisch–Waugh–Lovell the slopes of the swept
//! regression equal those of the dummy-variable regression, so no dummy
//! columns are ever materialised.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use lh_core::{Error, Result};

use super::cluster::cluster_robust_vcov;
use super::collinear::{select_regressors, CollinearityPolicy};
use super::hdfe::{Absorbed, FixedEffectsSolver};
use crate::result::{Coefficient, FittedModel, Inference};

/// Estimation settings shared by every fit of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Handling of unidentifiable regressors.
    pub collinearity: CollinearityPolicy,
    /// Reference distribution for p-values and intervals.
    pub inference: Inference,
    /// Confidence level of the coefficient intervals.
    pub confidence: f64,
    /// Relative tolerance of fixed-effect absorption.
    pub absorb_tol: f64,
    /// Maximum absorption sweeps.
    pub absorb_max_iter: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            collinearity: CollinearityPolicy::Drop,
            inference: Inference::Normal,
            confidence: 0.95,
            absorb_tol: 1e-10,
            absorb_max_iter: 10_000,
        }
    }
}

/// A categorical fixed effect encoded as 0-based levels.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedEffect {
    /// Source column.
    pub name: String,
    /// Level of each observation.
    pub levels: Vec<usize>,
}

/// Complete-case design for one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FeDesign {
    /// Model label.
    pub label: String,
    /// Estimation sample description.
    pub sample: String,
    /// Dependent variable name.
    pub outcome: String,
    /// Outcome values.
    pub y: Vec<f64>,
    /// Regressor names, in formula order.
    pub regressors: Vec<String>,
    /// Regressor columns (one `Vec` per regressor, each of length `y.len()`).
    pub x: Vec<Vec<f64>>,
    /// Fixed effects to absorb. Empty means intercept only.
    pub fixed_effects: Vec<FixedEffect>,
    /// Clustering variable name.
    pub cluster_variable: String,
    /// 0-based cluster of each observation.
    pub clusters: Vec<usize>,
    /// Sample rows dropped for missing values.
    pub n_excluded: usize,
}

impl FeDesign {
    fn validate(&self) -> Result<()> {
        let n = self.y.len();
        if n == 0 {
            return Err(Error::Validation(format!("model '{}' has no observations", self.label)));
        }
        if self.x.len() != self.regressors.len() {
            return Err(Error::Validation(format!(
                "{} regressor names but {} columns",
                self.regressors.len(),
                self.x.len()
            )));
        }
        let bad_len = self
            .x
            .iter()
            .map(Vec::len)
            .chain(self.fixed_effects.iter().map(|fe| fe.levels.len()))
            .chain(std::iter::once(self.clusters.len()))
            .any(|len| len != n);
        if bad_len {
            return Err(Error::Validation(format!(
                "model '{}': every column must have {} observations",
                self.label, n
            )));
        }
        Ok(())
    }
}

fn centered_ss(v: &[f64]) -> f64 {
    let mean = v.iter().sum::<f64>() / v.len() as f64;
    v.iter().map(|x| (x - mean) * (x - mean)).sum()
}

/// Fit `y ~ x + FE` by OLS with one-way cluster-robust covariance.
pub fn fit_fe_ols(design: &FeDesign, opts: &FitOptions) -> Result<FittedModel> {
    design.validate()?;
    if !(opts.confidence > 0.0 && opts.confidence < 1.0) {
        return Err(Error::Validation(format!("confidence must be in (0, 1), got {}", opts.confidence)));
    }
    let n = design.y.len();

    let groups: Vec<Vec<usize>> = if design.fixed_effects.is_empty() {
        vec![vec![0; n]]
    } else {
        design.fixed_effects.iter().map(|fe| fe.levels.clone()).collect()
    };
    let solver = FixedEffectsSolver::new(groups)?
        .with_tol(opts.absorb_tol)
        .with_max_iter(opts.absorb_max_iter);
    let df_absorbed = solver.absorbed_rank();

    let y_abs = solver.absorb(&design.y)?;
    let x_abs: Vec<Absorbed> =
        design.x.par_iter().map(|col| solver.absorb(col)).collect::<Result<Vec<_>>>()?;
    let converged = y_abs.converged && x_abs.iter().all(|a| a.converged);
    if !converged {
        tracing::warn!(model = %design.label, "fixed-effect absorption hit the iteration limit");
    }

    // Collinearity screen on the full residualised cross-product.
    let p_all = design.regressors.len();
    let xtx_all = DMatrix::from_fn(p_all, p_all, |a, b| {
        x_abs[a].values.iter().zip(&x_abs[b].values).map(|(u, v)| u * v).sum::<f64>()
    });
    let raw_ss: Vec<f64> = design.x.iter().map(|c| centered_ss(c)).collect();
    let selection = select_regressors(&design.regressors, &raw_ss, &xtx_all, opts.collinearity)?;
    let kept = &selection.kept;
    let p = kept.len();
    if p == 0 {
        return Err(Error::Validation(format!(
            "model '{}': no regressor survives the collinearity screen",
            design.label
        )));
    }
    let k_total = p + df_absorbed;
    if n <= k_total {
        return Err(Error::Validation(format!(
            "model '{}': residual degrees of freedom not positive (N = {}, K = {})",
            design.label, n, k_total
        )));
    }

    let x_mat = DMatrix::from_fn(n, p, |i, j| x_abs[kept[j]].values[i]);
    let y_vec = DVector::from_column_slice(&y_abs.values);
    let xtx = DMatrix::from_fn(p, p, |a, b| xtx_all[(kept[a], kept[b])]);
    let xty = x_mat.transpose() * &y_vec;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| {
        Error::Singular(format!("model '{}': X'X is singular after absorbing fixed effects", design.label))
    })?;
    let beta = &xtx_inv * &xty;
    let resid = &y_vec - &x_mat * &beta;
    let rss: f64 = resid.iter().map(|r| r * r).sum();

    let tss = centered_ss(&design.y);
    let tss_within: f64 = y_abs.values.iter().map(|v| v * v).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
    let r_squared_within = if tss_within > 0.0 { 1.0 - rss / tss_within } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / (n - k_total) as f64;

    let cov = cluster_robust_vcov(&x_mat, &resid, &xtx_inv, &design.clusters, df_absorbed)?;
    let se = cov.standard_errors();
    let reference = Reference::new(opts.inference, cov.n_clusters)?;
    let crit = reference.critical_value(opts.confidence);

    let coefficients: Vec<Coefficient> = kept
        .iter()
        .enumerate()
        .map(|(j, &col)| {
            let estimate = beta[j];
            let std_error = se[j];
            let statistic = if std_error > 0.0 { estimate / std_error } else { f64::NAN };
            Coefficient {
                name: design.regressors[col].clone(),
                estimate,
                std_error,
                statistic,
                p_value: reference.two_sided_p(statistic),
                ci_lower: estimate - crit * std_error,
                ci_upper: estimate + crit * std_error,
            }
        })
        .collect();

    tracing::info!(
        model = %design.label,
        n_obs = n,
        n_excluded = design.n_excluded,
        clusters = cov.n_clusters,
        omitted = selection.omitted.len(),
        r_squared,
        "model fitted"
    );

    Ok(FittedModel {
        label: design.label.clone(),
        outcome: design.outcome.clone(),
        sample: design.sample.clone(),
        coefficients,
        omitted: selection.omitted,
        fixed_effects: design.fixed_effects.iter().map(|fe| fe.name.clone()).collect(),
        cluster_variable: design.cluster_variable.clone(),
        n_obs: n,
        n_excluded: design.n_excluded,
        n_clusters: cov.n_clusters,
        df_absorbed,
        df_resid: n - k_total,
        r_squared,
        adj_r_squared,
        r_squared_within,
        rss,
        inference: opts.inference,
        confidence: opts.confidence,
        converged,
        vcov: (0..p).map(|a| (0..p).map(|b| cov.vcov[(a, b)]).collect()).collect(),
    })
}

enum Reference {
    Normal(Normal),
    StudentT(StudentsT),
}

impl Reference {
    fn new(inference: Inference, n_clusters: usize) -> Result<Self> {
        match inference {
            Inference::Normal => Normal::new(0.0, 1.0)
                .map(Reference::Normal)
                .map_err(|e| Error::Computation(e.to_string())),
            Inference::StudentT => StudentsT::new(0.0, 1.0, n_clusters.saturating_sub(1) as f64)
                .map(Reference::StudentT)
                .map_err(|e| Error::Computation(e.to_string())),
        }
    }

    fn sf(&self, x: f64) -> f64 {
        match self {
            Reference::Normal(d) => d.sf(x),
            Reference::StudentT(d) => d.sf(x),
        }
    }

    fn two_sided_p(&self, stat: f64) -> f64 {
        if stat.is_finite() { (2.0 * self.sf(stat.abs())).min(1.0) } else { f64::NAN }
    }

    fn critical_value(&self, confidence: f64) -> f64 {
        let q = 1.0 - (1.0 - confidence) / 2.0;
        match self {
            Reference::Normal(d) => d.inverse_cdf(q),
            Reference::StudentT(d) => d.inverse_cdf(q),
        }
    }
}

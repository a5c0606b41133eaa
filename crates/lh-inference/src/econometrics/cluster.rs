//! One-way cluster-robust covariance (Liang–Zeger sandwich).
//!
//! `V = c · (X'X)⁻¹ (Σ_g X_g' e_g e_g' X_g) (X'X)⁻¹` with the small-sample
//! factor `c = G/(G−1) · (N−1)/(N−K)`, where `K` counts the estimated slope
//! coefficients plus the rank absorbed by fixed effects. This matches the
//! default cluster correction of Stata's `reg ..., cluster()` and statsmodels'
//! `cov_type="cluster"` on the equivalent dummy-variable regression.
//!
//! # References
//!
//! - Liang & Zeger (1986), "Longitudinal data analysis using generalized
//!   linear models." *Biometrika*.
//! - Cameron & Miller (2015), "A Practitioner's Guide to Cluster-Robust
//!   Inference." *Journal of Human Resources*.

use nalgebra::{DMatrix, DVector};

use lh_core::{Error, Result};

/// Cluster-robust covariance and the bookkeeping behind it.
#[derive(Debug, Clone)]
pub struct ClusterCovariance {
    /// `p × p` covariance of the slope coefficients.
    pub vcov: DMatrix<f64>,
    /// Number of distinct clusters `G`.
    pub n_clusters: usize,
    /// Small-sample factor applied to the sandwich.
    pub correction: f64,
}

impl ClusterCovariance {
    /// Standard errors (square roots of the diagonal, clipped at zero).
    pub fn standard_errors(&self) -> Vec<f64> {
        (0..self.vcov.nrows()).map(|j| self.vcov[(j, j)].max(0.0).sqrt()).collect()
    }
}

/// Group observation indices by 0-based cluster id.
pub(crate) fn cluster_members(cluster_ids: &[usize]) -> Vec<Vec<usize>> {
    let n_groups = cluster_ids.iter().copied().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_groups];
    for (i, &c) in cluster_ids.iter().enumerate() {
        members[c].push(i);
    }
    members.retain(|m| !m.is_empty());
    members
}

/// Sandwich covariance for OLS slopes on (possibly fixed-effect-residualised) data.
///
/// `x` is the `n × p` design actually used for estimation, `xtx_inv` its
/// `(X'X)⁻¹`, `cluster_ids` 0-based cluster labels and `df_absorbed` the
/// rank of any absorbed fixed effects (0 when none).
pub fn cluster_robust_vcov(
    x: &DMatrix<f64>,
    residuals: &DVector<f64>,
    xtx_inv: &DMatrix<f64>,
    cluster_ids: &[usize],
    df_absorbed: usize,
) -> Result<ClusterCovariance> {
    let n = x.nrows();
    let p = x.ncols();
    if residuals.len() != n || cluster_ids.len() != n {
        return Err(Error::Validation(format!(
            "residuals ({}) and cluster ids ({}) must have {} entries",
            residuals.len(),
            cluster_ids.len(),
            n
        )));
    }

    let members = cluster_members(cluster_ids);
    let g = members.len();
    if g < 2 {
        return Err(Error::Computation(format!(
            "cluster-robust covariance needs at least 2 clusters, found {}",
            g
        )));
    }

    let mut meat = DMatrix::<f64>::zeros(p, p);
    let mut score = DVector::<f64>::zeros(p);
    for indices in &members {
        score.fill(0.0);
        for &i in indices {
            let e_i = residuals[i];
            for j in 0..p {
                score[j] += x[(i, j)] * e_i;
            }
        }
        meat.ger(1.0, &score, &score, 1.0);
    }

    let n_f = n as f64;
    let k_f = (p + df_absorbed) as f64;
    let g_f = g as f64;
    if n_f <= k_f {
        return Err(Error::Computation(format!(
            "no residual degrees of freedom: N = {}, K = {}",
            n,
            p + df_absorbed
        )));
    }
    let correction = (g_f / (g_f - 1.0)) * ((n_f - 1.0) / (n_f - k_f));

    let vcov = (xtx_inv * &meat) * xtx_inv * correction;
    Ok(ClusterCovariance { vcov, n_clusters: g, correction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
        let xtx_inv = (x.transpose() * x).try_inverse().unwrap();
        let beta = &xtx_inv * x.transpose() * y;
        let resid = y - x * beta;
        (xtx_inv, resid)
    }

    #[test]
    fn single_regressor_closed_form() {
        // x = 1, so the sandwich reduces to c · Σ_g (Σ e)² / n²
        let x = DMatrix::from_element(4, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, 3.0, 2.0, 6.0]);
        let (xtx_inv, resid) = ols(&x, &y);
        let cov = cluster_robust_vcov(&x, &resid, &xtx_inv, &[0, 0, 1, 1], 0).unwrap();
        // residuals: -2, 0, -1, 3 → cluster sums -2, 2
        let c = 2.0 * 3.0 / 3.0;
        assert_relative_eq!(cov.correction, c, epsilon = 1e-12);
        assert_relative_eq!(cov.vcov[(0, 0)], c * 8.0 / 16.0, epsilon = 1e-12);
        assert_eq!(cov.n_clusters, 2);
    }

    #[test]
    fn absorbed_rank_enters_correction() {
        let x = DMatrix::from_row_slice(6, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 7.0]);
        let y = DVector::from_vec(vec![1.1, 2.3, 2.9, 4.2, 4.8, 7.3]);
        let (xtx_inv, resid) = ols(&x, &y);
        let a = cluster_robust_vcov(&x, &resid, &xtx_inv, &[0, 0, 1, 1, 2, 2], 0).unwrap();
        let b = cluster_robust_vcov(&x, &resid, &xtx_inv, &[0, 0, 1, 1, 2, 2], 2).unwrap();
        assert_relative_eq!(b.correction / a.correction, 5.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_single_cluster() {
        let x = DMatrix::from_element(3, 1, 1.0);
        let r = DVector::from_vec(vec![0.1, -0.1, 0.0]);
        let inv = DMatrix::from_element(1, 1, 1.0 / 3.0);
        assert!(cluster_robust_vcov(&x, &r, &inv, &[5, 5, 5], 0).is_err());
        assert!(cluster_robust_vcov(&x, &r, &inv, &[0, 1], 0).is_err());
    }

    #[test]
    fn members_skip_unused_ids() {
        let m = cluster_members(&[3, 0, 3, 0, 7]);
        assert_eq!(m, vec![vec![1, 3], vec![0, 2], vec![4]]);
    }
}

//! Detection of regressors that cannot be identified alongside the fixed
//! effects or the regressors before them.

use serde::{Deserialize, Serialize};

use lh_core::{Error, Result};

/// A regressor whose demeaned sum of squares is at most this fraction of its
/// raw centered sum of squares is treated as absorbed by the fixed effects.
pub const ABSORBED_TOL: f64 = 1e-9;

/// Relative pivot tolerance for linear dependence among residualised regressors.
pub const PIVOT_TOL: f64 = 1e-10;

/// What to do with a regressor that cannot be identified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollinearityPolicy {
    /// Omit it and record it in the fitted model.
    #[default]
    Drop,
    /// Fail the fit.
    Error,
}

/// Why a regressor was omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmissionReason {
    /// Constant within fixed-effect groups (e.g. a state-level measure under
    /// state fixed effects).
    AbsorbedByFixedEffects,
    /// A linear combination of earlier regressors.
    LinearlyDependent,
}

impl OmissionReason {
    /// Human-readable reason.
    pub fn describe(self) -> &'static str {
        match self {
            OmissionReason::AbsorbedByFixedEffects => "absorbed by the fixed effects",
            OmissionReason::LinearlyDependent => "a linear combination of earlier regressors",
        }
    }
}

/// A regressor dropped from the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Omitted {
    /// Regressor name.
    pub name: String,
    /// Why it was dropped.
    pub reason: OmissionReason,
}

/// Indices of identifiable regressors, in input order, and the omitted ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Indices into the input regressors that enter the fit.
    pub kept: Vec<usize>,
    /// Regressors left out.
    pub omitted: Vec<Omitted>,
}

/// Select identifiable regressors.
///
/// `raw_centered_ss[j]` is `Σ (x_j − x̄_j)²` of the original column, `xtx` the
/// cross-product matrix of the residualised columns. Regressors are examined
/// in order; each is kept unless it is absorbed by the fixed effects or its
/// squared distance to the span of the kept ones falls below
/// [`PIVOT_TOL`] times its own sum of squares (a sequential Cholesky pivot).
pub fn select_regressors(
    names: &[String],
    raw_centered_ss: &[f64],
    xtx: &nalgebra::DMatrix<f64>,
    policy: CollinearityPolicy,
) -> Result<Selection> {
    let p = names.len();
    if raw_centered_ss.len() != p || xtx.nrows() != p || xtx.ncols() != p {
        return Err(Error::Validation(format!(
            "regressor metadata mismatch: {} names, {} sums of squares, {}x{} cross-product",
            p,
            raw_centered_ss.len(),
            xtx.nrows(),
            xtx.ncols()
        )));
    }

    let mut kept: Vec<usize> = Vec::with_capacity(p);
    // Row-major lower-triangular Cholesky factor of the kept block.
    let mut chol: Vec<Vec<f64>> = Vec::with_capacity(p);
    let mut omitted = Vec::new();

    for j in 0..p {
        let ss = xtx[(j, j)];
        let reason = if !ss.is_finite() || ss <= 0.0 || ss <= ABSORBED_TOL * raw_centered_ss[j] {
            Some(OmissionReason::AbsorbedByFixedEffects)
        } else {
            // Solve L·w = X̃_kept' x̃_j, then d = x̃_j'x̃_j − |w|².
            let mut w = Vec::with_capacity(kept.len());
            for (r, &kr) in kept.iter().enumerate() {
                let dot: f64 = (0..r).map(|c| chol[r][c] * w[c]).sum();
                w.push((xtx[(kr, j)] - dot) / chol[r][r]);
            }
            let d = ss - w.iter().map(|v| v * v).sum::<f64>();
            if d <= PIVOT_TOL * ss {
                Some(OmissionReason::LinearlyDependent)
            } else {
                w.push(d.sqrt());
                chol.push(w);
                kept.push(j);
                None
            }
        };

        if let Some(reason) = reason {
            if policy == CollinearityPolicy::Error {
                return Err(Error::Collinear { column: names[j].clone(), reason: reason.describe().into() });
            }
            tracing::warn!(regressor = %names[j], reason = reason.describe(), "regressor omitted");
            omitted.push(Omitted { name: names[j].clone(), reason });
        }
    }

    Ok(Selection { kept, omitted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn gram(cols: &[Vec<f64>]) -> DMatrix<f64> {
        let n = cols[0].len();
        let x = DMatrix::from_fn(n, cols.len(), |i, j| cols[j][i]);
        x.transpose() * x
    }

    fn names(k: usize) -> Vec<String> {
        (0..k).map(|j| format!("x{}", j)).collect()
    }

    #[test]
    fn keeps_independent_columns() {
        let cols = vec![vec![1.0, -1.0, 0.0, 0.0], vec![0.0, 1.0, -1.0, 0.0]];
        let sel = select_regressors(&names(2), &[2.0, 2.0], &gram(&cols), CollinearityPolicy::Drop)
            .unwrap();
        assert_eq!(sel.kept, vec![0, 1]);
        assert!(sel.omitted.is_empty());
    }

    #[test]
    fn drops_later_dependent_column() {
        let a = vec![1.0, -1.0, 2.0, -2.0];
        let b = vec![0.5, 0.5, -0.5, -0.5];
        let c: Vec<f64> = a.iter().zip(&b).map(|(x, y)| 2.0 * x - 3.0 * y).collect();
        let sel = select_regressors(
            &names(3),
            &[10.0, 1.0, 50.0],
            &gram(&[a, b, c]),
            CollinearityPolicy::Drop,
        )
        .unwrap();
        assert_eq!(sel.kept, vec![0, 1]);
        assert_eq!(sel.omitted[0].name, "x2");
        assert_eq!(sel.omitted[0].reason, OmissionReason::LinearlyDependent);
    }

    #[test]
    fn absorbed_column_is_named() {
        let cols = vec![vec![1.0, -1.0, 0.5, -0.5], vec![1e-9, -1e-9, 0.0, 0.0]];
        let sel = select_regressors(&names(2), &[2.5, 8.0], &gram(&cols), CollinearityPolicy::Drop)
            .unwrap();
        assert_eq!(sel.kept, vec![0]);
        assert_eq!(sel.omitted[0].reason, OmissionReason::AbsorbedByFixedEffects);

        let err = select_regressors(&names(2), &[2.5, 8.0], &gram(&cols), CollinearityPolicy::Error)
            .unwrap_err();
        assert!(matches!(err, Error::Collinear { column, .. } if column == "x1"));
    }
}

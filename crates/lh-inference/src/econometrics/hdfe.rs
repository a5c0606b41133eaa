//! Fixed-effects absorption via the Method of Alternating Projections (MAP).
//!
//! Sweeping out group means one dimension at a time converges to the
//! projection onto the orthogonal complement of the span of all fixed-effect
//! dummies, so a regression on the swept data yields the same slope
//! coefficients as one with every dummy column included. One sweep is exact
//! for a single dimension.
//!
//! # References
//!
//! - Gaure (2013), "OLS with multiple high dimensional category variables."
//!   *Computational Statistics & Data Analysis*.
//! - Correia (2017), "Linear Models with High-Dimensional Fixed Effects:
//!   An Efficient and Feasible Estimator." Working paper.

use std::collections::HashSet;

use lh_core::{Error, Result};

/// Default convergence tolerance, relative to the vector's scale.
const DEFAULT_TOL: f64 = 1e-10;

/// Maximum MAP sweeps.
const DEFAULT_MAX_ITER: usize = 10_000;

/// Absorbs one or more categorical fixed effects from data vectors.
///
/// Each dimension is a `Vec<usize>` mapping observation `i` to a 0-based
/// level. Levels need not be contiguous in use, but empty levels are ignored.
#[derive(Debug, Clone)]
pub struct FixedEffectsSolver {
    n: usize,
    group_of: Vec<Vec<usize>>,
    n_levels: Vec<usize>,
    group_indices: Vec<Vec<Vec<usize>>>,
    tol: f64,
    max_iter: usize,
}

/// Outcome of absorbing the fixed effects from one vector.
#[derive(Debug, Clone)]
pub struct Absorbed {
    /// Residual after removing the fixed effects.
    pub values: Vec<f64>,
    /// Sweeps performed.
    pub iterations: usize,
    /// Whether the group means fell below tolerance.
    pub converged: bool,
}

impl FixedEffectsSolver {
    /// Build a solver from per-dimension level assignments of equal length.
    pub fn new(groups: Vec<Vec<usize>>) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::Validation("at least one fixed-effect dimension required".into()));
        }
        let n = groups[0].len();
        if n == 0 {
            return Err(Error::Validation("fixed effects need at least one observation".into()));
        }
        for (d, g) in groups.iter().enumerate() {
            if g.len() != n {
                return Err(Error::Validation(format!(
                    "fixed-effect dimension {} has length {}, expected {}",
                    d,
                    g.len(),
                    n
                )));
            }
        }

        let mut n_levels = Vec::with_capacity(groups.len());
        let mut group_indices = Vec::with_capacity(groups.len());
        for g in &groups {
            let nl = g.iter().copied().max().map_or(0, |m| m + 1);
            let mut idx: Vec<Vec<usize>> = vec![Vec::new(); nl];
            for (i, &gi) in g.iter().enumerate() {
                idx[gi].push(i);
            }
            n_levels.push(idx.iter().filter(|v| !v.is_empty()).count());
            group_indices.push(idx);
        }

        Ok(Self {
            n,
            group_of: groups,
            n_levels,
            group_indices,
            tol: DEFAULT_TOL,
            max_iter: DEFAULT_MAX_ITER,
        })
    }

    /// Set the relative convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the maximum number of sweeps.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Number of fixed-effect dimensions.
    pub fn n_dimensions(&self) -> usize {
        self.group_of.len()
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.n
    }

    /// Non-empty levels per dimension.
    pub fn levels(&self) -> &[usize] {
        &self.n_levels
    }

    /// Remove all fixed effects from `v`.
    ///
    /// Non-convergence is not an error: the last iterate is returned with
    /// `converged == false`.
    pub fn absorb(&self, v: &[f64]) -> Result<Absorbed> {
        if v.len() != self.n {
            return Err(Error::Validation(format!(
                "vector length ({}) != number of observations ({})",
                v.len(),
                self.n
            )));
        }
        let mut resid = v.to_vec();

        if self.group_of.len() == 1 {
            self.demean_dim(&mut resid, 0);
            return Ok(Absorbed { values: resid, iterations: 1, converged: true });
        }

        let scale = v.iter().fold(0.0_f64, |m, x| m.max(x.abs())).max(1.0);
        let threshold = self.tol * scale;
        for iter in 1..=self.max_iter {
            for d in 0..self.group_of.len() {
                self.demean_dim(&mut resid, d);
            }
            if self.max_group_mean_abs(&resid) < threshold {
                return Ok(Absorbed { values: resid, iterations: iter, converged: true });
            }
        }
        Ok(Absorbed { values: resid, iterations: self.max_iter, converged: false })
    }

    /// Remove all fixed effects from `v`, discarding convergence details.
    pub fn partial_out(&self, v: &[f64]) -> Result<Vec<f64>> {
        let out = self.absorb(v)?;
        if !out.converged {
            tracing::warn!(iterations = out.iterations, "fixed-effect absorption did not converge");
        }
        Ok(out.values)
    }

    /// Rank of the span of all fixed-effect dummies, constant included.
    ///
    /// - 1-way: number of levels.
    /// - 2-way: `n_levels_0 + n_levels_1 − connected components` (exact, via
    ///   union-find on the bipartite level graph).
    /// - k-way (k > 2): `Σ n_levels − (k − 1) · components`, an upper bound
    ///   (within a component every dimension's dummies sum to the same
    ///   indicator; further redundancies are not detected).
    pub fn absorbed_rank(&self) -> usize {
        let k = self.group_of.len();
        if k == 1 {
            return self.n_levels[0];
        }
        let total_levels: usize = self.n_levels.iter().sum();
        total_levels.saturating_sub(self.count_connected_components() * (k - 1))
    }

    fn demean_dim(&self, v: &mut [f64], d: usize) {
        for group_obs in &self.group_indices[d] {
            if group_obs.is_empty() {
                continue;
            }
            let mean = group_obs.iter().map(|&i| v[i]).sum::<f64>() / group_obs.len() as f64;
            for &i in group_obs {
                v[i] -= mean;
            }
        }
    }

    fn max_group_mean_abs(&self, v: &[f64]) -> f64 {
        let mut max_val = 0.0_f64;
        for dim in &self.group_indices {
            for group_obs in dim {
                if group_obs.is_empty() {
                    continue;
                }
                let mean = group_obs.iter().map(|&i| v[i]).sum::<f64>() / group_obs.len() as f64;
                max_val = max_val.max(mean.abs());
            }
        }
        max_val
    }

    /// Connected components of the graph whose nodes are levels (across all
    /// dimensions) and whose edges link the levels an observation belongs to.
    fn count_connected_components(&self) -> usize {
        let offsets: Vec<usize> = self
            .group_indices
            .iter()
            .scan(0, |acc, dim| {
                let start = *acc;
                *acc += dim.len();
                Some(start)
            })
            .collect();
        let total: usize = self.group_indices.iter().map(Vec::len).sum();

        let mut parent: Vec<usize> = (0..total).collect();
        let mut rank = vec![0u8; total];
        for i in 0..self.n {
            let a = offsets[0] + self.group_of[0][i];
            for d in 1..self.group_of.len() {
                uf_union(&mut parent, &mut rank, a, offsets[d] + self.group_of[d][i]);
            }
        }

        let mut roots = HashSet::new();
        for (d, dim) in self.group_indices.iter().enumerate() {
            for (g, obs) in dim.iter().enumerate() {
                if !obs.is_empty() {
                    roots.insert(uf_find(&mut parent, offsets[d] + g));
                }
            }
        }
        roots.len()
    }
}

fn uf_find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn uf_union(parent: &mut [usize], rank: &mut [u8], a: usize, b: usize) {
    let ra = uf_find(parent, a);
    let rb = uf_find(parent, b);
    if ra == rb {
        return;
    }
    match rank[ra].cmp(&rank[rb]) {
        std::cmp::Ordering::Less => parent[ra] = rb,
        std::cmp::Ordering::Greater => parent[rb] = ra,
        std::cmp::Ordering::Equal => {
            parent[rb] = ra;
            rank[ra] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dim_exact_one_pass() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 0, 1, 1, 1]]).unwrap();
        let r = solver.absorb(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
        assert!(r.converged);
        assert_eq!(r.iterations, 1);
        let expected = [-1.0, 0.0, 1.0, -10.0, 0.0, 10.0];
        for (got, want) in r.values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn two_way_additive_effects_vanish() {
        // state × age grid, y = state effect + age effect
        let state = vec![0, 0, 0, 1, 1, 1];
        let age = vec![0, 1, 2, 0, 1, 2];
        let solver = FixedEffectsSolver::new(vec![state, age]).unwrap();
        let y = [6.0, 7.0, 8.0, 11.0, 12.0, 13.0];
        let r = solver.partial_out(&y).unwrap();
        for (i, ri) in r.iter().enumerate() {
            assert!(ri.abs() < 1e-8, "resid[{}] = {}", i, ri);
        }
    }

    #[test]
    fn two_way_unbalanced_group_means_vanish() {
        let state = vec![0, 0, 0, 1, 1];
        let age = vec![0, 1, 2, 1, 2];
        let solver = FixedEffectsSolver::new(vec![state, age]).unwrap();
        let r = solver.partial_out(&[10.0, 20.0, 30.0, 25.0, 35.0]).unwrap();
        assert!(((r[0] + r[1] + r[2]) / 3.0).abs() < 1e-8);
        assert!(((r[3] + r[4]) / 2.0).abs() < 1e-8);
        assert!(((r[1] + r[3]) / 2.0).abs() < 1e-8);
        // age 0 is a singleton
        assert!(r[0].abs() < 1e-8);
    }

    #[test]
    fn projection_is_idempotent() {
        let state = vec![0, 0, 1, 1, 2, 2, 2];
        let age = vec![0, 1, 0, 2, 1, 2, 0];
        let solver = FixedEffectsSolver::new(vec![state, age]).unwrap();
        let v = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.6];
        let once = solver.partial_out(&v).unwrap();
        let twice = solver.partial_out(&once).unwrap();
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn rank_one_way_counts_levels() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1, 2, 2]]).unwrap();
        assert_eq!(solver.absorbed_rank(), 3);
    }

    #[test]
    fn rank_two_way_connected() {
        let state = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        let age = vec![0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3];
        let solver = FixedEffectsSolver::new(vec![state, age]).unwrap();
        assert_eq!(solver.absorbed_rank(), 6);
    }

    #[test]
    fn rank_two_way_disconnected() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1], vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(solver.absorbed_rank(), 4);
    }

    #[test]
    fn unused_levels_are_ignored() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 4, 4]]).unwrap();
        assert_eq!(solver.levels(), &[2]);
        assert_eq!(solver.absorbed_rank(), 2);
    }

    #[test]
    fn validation_errors() {
        assert!(FixedEffectsSolver::new(vec![]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![]]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![0, 1], vec![0]]).is_err());
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1]]).unwrap();
        assert!(solver.partial_out(&[1.0, 2.0]).is_err());
    }
}

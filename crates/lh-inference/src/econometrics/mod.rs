//! Fixed-effects regression for the triple-difference design.
//!
//! - [`hdfe`]: fixed-effect absorption by alternating projections.
//! - [`collinear`]: identification screen for regressors.
//! - [`cluster`]: one-way cluster-robust covariance.
//! - [`ols`]: the estimator itself.
//! - [`formula`] / [`didid`]: specifications, complete-case designs and the runner.

pub mod cluster;
pub mod collinear;
pub mod didid;
pub mod formula;
pub mod hdfe;
pub mod ols;

pub use cluster::{cluster_robust_vcov, ClusterCovariance};
pub use collinear::{CollinearityPolicy, OmissionReason, Omitted};
pub use didid::{run_specification, run_specifications, DididSpecification};
pub use formula::{design_from_table, DididFormula, RegressionSpec, SampleFilter};
pub use hdfe::FixedEffectsSolver;
pub use ols::{fit_fe_ols, FeDesign, FitOptions, FixedEffect};

//! # lh-inference
//!
//! Estimation for lanham: OLS with absorbed state and age fixed effects,
//! state-clustered standard errors and the four triple-difference
//! specifications.

#![warn(missing_docs)]

pub mod econometrics;
pub mod result;

pub use econometrics::{
    design_from_table, fit_fe_ols, run_specification, run_specifications, CollinearityPolicy,
    DididFormula, DididSpecification, FeDesign, FitOptions, RegressionSpec, SampleFilter,
};
pub use result::{Coefficient, FittedModel, Inference};

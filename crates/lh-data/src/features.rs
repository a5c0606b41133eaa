//! Derived indicators: part-time flag, spending median split, triple-difference
//! interaction terms and spending quartiles.
//!
//! Every builder is a pure function of columns already in the table and adds
//! (or replaces) exactly one output column. Missing inputs propagate to missing
//! outputs; nothing here removes rows.

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::table::{Column, Table};

/// Name of the `treated × post` column.
pub const TREATED_X_POST: &str = "treated_x_post";
/// Name of the `treated × spending` column.
pub const TREATED_X_SPENDING: &str = "treated_x_spending";
/// Name of the `post × spending` column.
pub const POST_X_SPENDING: &str = "post_x_spending";
/// Name of the `treated × post × spending` column (the DiDiD coefficient).
pub const TREATED_X_POST_X_SPENDING: &str = "treated_x_post_x_spending";
/// Default name of the part-time indicator.
pub const PART_TIME: &str = "part_time";
/// Default name of the spending median-split label.
pub const HIGH_SPENDING: &str = "high_spending";
/// Default name of the spending quartile label.
pub const SPENDING_QUARTILE: &str = "spending_quartile";

/// Parse a text column to numeric in place.
///
/// Unparseable cells become missing. A numeric column is left untouched.
/// Returns how many non-missing cells could not be parsed.
pub fn coerce_numeric(table: &mut Table, column: &str) -> Result<usize> {
    let col = table.column(column)?;
    let Column::Text(cells) = col else {
        return Ok(0);
    };
    let mut failed = 0usize;
    let parsed: Vec<Option<f64>> = cells
        .iter()
        .map(|c| {
            let s = c.as_deref()?;
            match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => Some(x),
                _ => {
                    failed += 1;
                    None
                }
            }
        })
        .collect();
    table.insert_column(column, Column::Numeric(parsed))?;
    if failed > 0 {
        tracing::debug!(column, failed, "unparseable cells coerced to missing");
    }
    Ok(failed)
}

/// What the part-time indicator is for a row whose hours are missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingHoursPolicy {
    /// Indicator is missing; the row drops out of part-time fits.
    #[default]
    Missing,
    /// Indicator is 0 (not part-time).
    Zero,
}

/// Inclusive hours range defining part-time work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartTimeRule {
    /// Lower bound (inclusive).
    pub min_hours: f64,
    /// Upper bound (inclusive).
    pub max_hours: f64,
    /// Treatment of missing hours.
    pub missing: MissingHoursPolicy,
}

impl Default for PartTimeRule {
    fn default() -> Self {
        Self { min_hours: 1.0, max_hours: 34.0, missing: MissingHoursPolicy::Missing }
    }
}

impl PartTimeRule {
    /// Indicator for one hours value.
    pub fn classify(&self, hours: Option<f64>) -> Option<f64> {
        match hours {
            Some(h) if h >= self.min_hours && h <= self.max_hours => Some(1.0),
            Some(_) => Some(0.0),
            None => match self.missing {
                MissingHoursPolicy::Missing => None,
                MissingHoursPolicy::Zero => Some(0.0),
            },
        }
    }
}

/// Add a 0/1 part-time indicator computed from a numeric hours column.
pub fn add_part_time(table: &mut Table, hours: &str, name: &str, rule: &PartTimeRule) -> Result<()> {
    if rule.min_hours > rule.max_hours {
        return Err(Error::Validation(format!(
            "part-time range is empty: [{}, {}]",
            rule.min_hours, rule.max_hours
        )));
    }
    let values: Vec<Option<f64>> = table.numeric(hours)?.iter().map(|h| rule.classify(*h)).collect();
    table.insert_column(name, Column::Numeric(values))
}

/// Linear-interpolation quantile of sorted data.
///
/// Matches the default `linear` method of numpy/pandas.
pub fn quantile_linear_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let i = pos.floor() as usize;
    let j = pos.ceil() as usize;
    if i == j {
        return sorted[i];
    }
    let t = pos - i as f64;
    (1.0 - t) * sorted[i] + t * sorted[j]
}

fn sorted_present(cells: &[Option<f64>]) -> Vec<f64> {
    let mut v: Vec<f64> = cells.iter().flatten().copied().collect();
    v.sort_by(f64::total_cmp);
    v
}

/// Median of the non-missing cells, `None` if all are missing.
pub fn median(cells: &[Option<f64>]) -> Option<f64> {
    let sorted = sorted_present(cells);
    if sorted.is_empty() {
        None
    } else {
        Some(quantile_linear_sorted(&sorted, 0.5))
    }
}

/// Label each row `high` if its value is strictly above the sample median,
/// `low` otherwise. Returns the median.
pub fn add_median_split(
    table: &mut Table,
    column: &str,
    name: &str,
    high: &str,
    low: &str,
) -> Result<f64> {
    let cells = table.numeric(column)?;
    let m = median(cells)
        .ok_or_else(|| Error::Validation(format!("column '{}' has no non-missing values", column)))?;
    let labels: Vec<Option<String>> = cells
        .iter()
        .map(|c| c.map(|x| if x > m { high.to_string() } else { low.to_string() }))
        .collect();
    table.insert_column(name, Column::Text(labels))?;
    Ok(m)
}

/// Add the element-wise product of numeric columns. Missing in any factor gives missing.
pub fn add_product(table: &mut Table, name: &str, factors: &[&str]) -> Result<()> {
    if factors.len() < 2 {
        return Err(Error::Validation(format!(
            "interaction '{}' needs at least two factors, got {}",
            name,
            factors.len()
        )));
    }
    let mut out: Vec<Option<f64>> = table.numeric(factors[0])?.to_vec();
    for f in &factors[1..] {
        let cells = table.numeric(f)?;
        for (acc, c) in out.iter_mut().zip(cells) {
            *acc = match (*acc, *c) {
                (Some(a), Some(b)) => Some(a * b),
                _ => None,
            };
        }
    }
    table.insert_column(name, Column::Numeric(out))
}

/// Source columns of the triple-difference design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DididColumns {
    /// Treated-group indicator.
    pub treated: String,
    /// Post-period indicator.
    pub post: String,
    /// Continuous state spending.
    pub spending: String,
}

/// Add the two- and three-way interactions between treated, post and spending.
pub fn add_didid_interactions(table: &mut Table, cols: &DididColumns) -> Result<()> {
    let (t, p, s) = (cols.treated.as_str(), cols.post.as_str(), cols.spending.as_str());
    table.require_columns([t, p, s])?;
    add_product(table, TREATED_X_POST, &[t, p])?;
    add_product(table, TREATED_X_SPENDING, &[t, s])?;
    add_product(table, POST_X_SPENDING, &[p, s])?;
    add_product(table, TREATED_X_POST_X_SPENDING, &[t, p, s])
}

/// Quartile boundaries `[min, q25, q50, q75, max]` of the non-missing cells.
///
/// Fails when there are no values or two boundaries coincide, since a
/// duplicated boundary leaves a bin empty or ambiguous.
pub fn quartile_edges(cells: &[Option<f64>]) -> Result<[f64; 5]> {
    let sorted = sorted_present(cells);
    if sorted.is_empty() {
        return Err(Error::Validation("cannot compute quartiles of an empty column".into()));
    }
    let mut edges = [0.0; 5];
    for (k, e) in edges.iter_mut().enumerate() {
        *e = quantile_linear_sorted(&sorted, k as f64 / 4.0);
    }
    if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::Validation(format!(
            "quartile boundaries are not distinct (duplicate edge {}); too few distinct values",
            w[0]
        )));
    }
    Ok(edges)
}

/// Quartile index (0..4) for a value, bins `[e0,e1], (e1,e2], (e2,e3], (e3,e4]`.
pub fn quartile_of(edges: &[f64; 5], x: f64) -> usize {
    edges[1..4].iter().position(|&e| x <= e).unwrap_or(3)
}

/// Default quartile labels.
pub fn default_quartile_labels() -> [String; 4] {
    ["Q1: Low Spending", "Q2: Medium-Low", "Q3: Medium-High", "Q4: High Spending"].map(String::from)
}

/// Add a quartile label column for a numeric column. Returns the boundaries.
pub fn add_quartiles(
    table: &mut Table,
    column: &str,
    name: &str,
    labels: &[String; 4],
) -> Result<[f64; 5]> {
    let cells = table.numeric(column)?;
    let edges = quartile_edges(cells)?;
    let binned: Vec<Option<String>> =
        cells.iter().map(|c| c.map(|x| labels[quartile_of(&edges, x)].clone())).collect();
    table.insert_column(name, Column::Text(binned))?;
    tracing::debug!(column, ?edges, "quartile boundaries");
    Ok(edges)
}

//! Load-to-features pipeline: subgroup filter, sentinel cleanup, numeric
//! coercion and every derived indicator the regressions and plots need.

use lh_core::Result;
use serde::{Deserialize, Serialize};

use crate::clean::{filter_subgroup, replace_sentinels, Sentinels, SubgroupFilter};
use crate::features::{
    add_didid_interactions, add_median_split, add_part_time, add_quartiles, coerce_numeric,
    default_quartile_labels, DididColumns, PartTimeRule, HIGH_SPENDING, PART_TIME,
    SPENDING_QUARTILE,
};
use crate::table::Table;

/// Names of the source columns in the survey extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Race code (subgroup filter).
    pub race: String,
    /// Usual weekly hours worked.
    pub hours: String,
    /// State identifier (fixed effect and cluster).
    pub state: String,
    /// Age in years (fixed effect).
    pub age: String,
    /// Employment flag.
    pub employed: String,
    /// Treated-group indicator.
    pub treated: String,
    /// Post-period indicator.
    pub post: String,
    /// Continuous state spending.
    pub spending: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            race: "race".into(),
            hours: "HRSWORK1".into(),
            state: "statefip".into(),
            age: "age".into(),
            employed: "emp".into(),
            treated: "treated".into(),
            post: "post".into(),
            spending: "rlanham_012".into(),
        }
    }
}

impl ColumnMap {
    /// Columns entering the interaction terms.
    pub fn didid(&self) -> DididColumns {
        DididColumns {
            treated: self.treated.clone(),
            post: self.post.clone(),
            spending: self.spending.clone(),
        }
    }

    fn all(&self) -> [&str; 8] {
        [
            &self.race,
            &self.hours,
            &self.state,
            &self.age,
            &self.employed,
            &self.treated,
            &self.post,
            &self.spending,
        ]
    }

    /// Columns that must be numeric for the regressions.
    fn numeric(&self) -> [&str; 5] {
        [&self.hours, &self.employed, &self.treated, &self.post, &self.spending]
    }
}

/// Labels for the spending median split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitLabels {
    /// Label for values above the median.
    pub high: String,
    /// Label for values at or below the median.
    pub low: String,
}

impl Default for SplitLabels {
    fn default() -> Self {
        Self { high: "High Spending".into(), low: "Low Spending".into() }
    }
}

/// Everything [`prepare`] needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Source column names.
    pub columns: ColumnMap,
    /// Rows to keep.
    pub subgroup: SubgroupFilter,
    /// Markers normalised to missing.
    pub sentinels: Sentinels,
    /// Part-time definition.
    pub part_time: PartTimeRule,
    /// Median-split labels.
    pub split_labels: SplitLabels,
    /// Spending quartile labels, lowest first.
    pub quartile_labels: [String; 4],
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            subgroup: SubgroupFilter::excluding("race", &["2"]),
            sentinels: Sentinels::default(),
            part_time: PartTimeRule::default(),
            split_labels: SplitLabels::default(),
            quartile_labels: default_quartile_labels(),
        }
    }
}

/// Bookkeeping from one [`prepare`] pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareReport {
    /// Rows in the loaded table.
    pub rows_loaded: usize,
    /// Rows after the subgroup filter.
    pub rows_kept: usize,
    /// Sentinel cells replaced by missing.
    pub sentinels_replaced: usize,
    /// Hours cells that were present but not numeric.
    pub hours_unparseable: usize,
    /// Rows with missing hours after cleaning.
    pub hours_missing: usize,
    /// Sample median of spending.
    pub spending_median: f64,
    /// Spending quartile boundaries, once [`add_plot_features`] has run.
    pub spending_quartiles: Option<[f64; 5]>,
}

/// Analysis-ready table plus bookkeeping.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Filtered table with derived columns appended.
    pub table: Table,
    /// What happened along the way.
    pub report: PrepareReport,
}

/// Filter, clean and derive features from a loaded survey extract.
pub fn prepare(raw: &Table, cfg: &PrepareConfig) -> Result<Prepared> {
    let cols = &cfg.columns;
    raw.require_columns(cols.all())?;

    let mut table = filter_subgroup(raw, &cfg.subgroup)?;
    let sentinels_replaced = replace_sentinels(&mut table, &cfg.sentinels);

    let mut hours_unparseable = 0;
    for name in cols.numeric() {
        let failed = coerce_numeric(&mut table, name)?;
        if name == cols.hours {
            hours_unparseable = failed;
        }
    }
    let hours_missing = table.column(&cols.hours)?.n_missing();

    add_part_time(&mut table, &cols.hours, PART_TIME, &cfg.part_time)?;
    let spending_median = add_median_split(
        &mut table,
        &cols.spending,
        HIGH_SPENDING,
        &cfg.split_labels.high,
        &cfg.split_labels.low,
    )?;
    add_didid_interactions(&mut table, &cols.didid())?;

    let report = PrepareReport {
        rows_loaded: raw.n_rows(),
        rows_kept: table.n_rows(),
        sentinels_replaced,
        hours_unparseable,
        hours_missing,
        spending_median,
        spending_quartiles: None,
    };
    tracing::info!(
        rows_kept = report.rows_kept,
        sentinels = report.sentinels_replaced,
        hours_missing = report.hours_missing,
        spending_median = report.spending_median,
        "features built"
    );
    Ok(Prepared { table, report })
}

/// Add the spending quartile column the faceted plots group by.
///
/// Separate from [`prepare`]: spending is constant within a state, so with
/// few states the quartile edges coincide and this fails while every
/// regression is still estimable.
pub fn add_plot_features(prepared: &mut Prepared, cfg: &PrepareConfig) -> Result<()> {
    let edges = add_quartiles(
        &mut prepared.table,
        &cfg.columns.spending,
        SPENDING_QUARTILE,
        &cfg.quartile_labels,
    )?;
    prepared.report.spending_quartiles = Some(edges);
    Ok(())
}

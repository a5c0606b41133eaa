//! Subgroup filtering and sentinel normalisation.

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::table::{Column, Table};

/// Row predicate on one categorical column.
///
/// A row is kept when its cell matches none of `exclude` and, if `include` is
/// non-empty, matches one of `include`. Values are written as strings: a
/// numeric cell matches a value that parses to the same number (`"2"` matches
/// `2.0`), a text cell matches on trimmed equality. Missing cells match nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubgroupFilter {
    /// Column holding the subgroup code (e.g. race).
    pub column: String,
    /// Values whose rows are dropped.
    pub exclude: Vec<String>,
    /// If non-empty, only rows with one of these values are kept.
    pub include: Vec<String>,
}

impl SubgroupFilter {
    /// Filter dropping rows where `column` equals any of `values`.
    pub fn excluding(column: &str, values: &[&str]) -> Self {
        Self {
            column: column.to_string(),
            exclude: values.iter().map(|v| v.to_string()).collect(),
            include: Vec::new(),
        }
    }

    fn keeps(&self, col: &Column, i: usize) -> bool {
        let matches_any = |values: &[String]| values.iter().any(|v| cell_matches(col, i, v));
        if matches_any(&self.exclude) {
            return false;
        }
        self.include.is_empty() || matches_any(&self.include)
    }
}

fn cell_matches(col: &Column, i: usize, value: &str) -> bool {
    let value = value.trim();
    match col {
        Column::Numeric(v) => match (v[i], value.parse::<f64>()) {
            (Some(x), Ok(target)) => x == target,
            _ => false,
        },
        Column::Text(v) => v[i].as_deref().is_some_and(|s| s.trim() == value),
    }
}

/// Keep the rows of the subgroup of interest.
///
/// Returns a table with a subset of rows and the same columns. Applying the
/// same filter to its own output is a no-op.
pub fn filter_subgroup(table: &Table, filter: &SubgroupFilter) -> Result<Table> {
    let col = table.column(&filter.column)?;
    let mask: Vec<bool> = (0..table.n_rows()).map(|i| filter.keeps(col, i)).collect();
    let out = table.filter_rows(&mask)?;
    tracing::info!(
        column = %filter.column,
        rows_in = table.n_rows(),
        rows_kept = out.n_rows(),
        "subgroup filter applied"
    );
    if out.n_rows() == 0 {
        return Err(Error::Validation(format!(
            "subgroup filter on '{}' removed every row",
            filter.column
        )));
    }
    Ok(out)
}

/// "Not applicable" markers to normalise to missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    /// Text markers, compared after trimming (default `["N/A"]`).
    pub text: Vec<String>,
    /// Numeric codes (e.g. `999`).
    pub codes: Vec<f64>,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self { text: vec!["N/A".to_string()], codes: Vec::new() }
    }
}

/// Replace every sentinel cell, in every column, with missing.
///
/// Returns the number of cells replaced.
pub fn replace_sentinels(table: &mut Table, sentinels: &Sentinels) -> usize {
    let names: Vec<String> = table.column_names().to_vec();
    let mut replaced = 0usize;
    for name in &names {
        let Ok(col) = table.column_mut(name) else { continue };
        match col {
            Column::Text(cells) => {
                for cell in cells.iter_mut() {
                    if cell.as_deref().is_some_and(|s| sentinels.text.iter().any(|m| m == s.trim())) {
                        *cell = None;
                        replaced += 1;
                    }
                }
            }
            Column::Numeric(cells) => {
                if sentinels.codes.is_empty() {
                    continue;
                }
                for cell in cells.iter_mut() {
                    if cell.is_some_and(|x| sentinels.codes.contains(&x)) {
                        *cell = None;
                        replaced += 1;
                    }
                }
            }
        }
    }
    tracing::debug!(replaced, "sentinel cells set to missing");
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Table {
        Table::from_columns(vec![
            ("race".into(), Column::Numeric(vec![Some(1.0), Some(2.0), Some(1.0), None, Some(3.0)])),
            (
                "hours".into(),
                Column::Text(vec![
                    Some("40".into()),
                    Some("N/A".into()),
                    Some(" N/A ".into()),
                    Some("12".into()),
                    None,
                ]),
            ),
            ("code".into(), Column::Numeric(vec![Some(999.0), Some(1.0), None, Some(999.0), Some(2.0)])),
        ])
        .unwrap()
    }

    #[test]
    fn excludes_numeric_code() {
        let t = survey();
        let f = filter_subgroup(&t, &SubgroupFilter::excluding("race", &["2"])).unwrap();
        assert_eq!(f.n_rows(), 4);
        assert!(f.numeric("race").unwrap().iter().all(|r| *r != Some(2.0)));
        assert_eq!(f.n_cols(), t.n_cols());
    }

    #[test]
    fn filter_is_idempotent() {
        let t = survey();
        let filter = SubgroupFilter::excluding("race", &["2"]);
        let once = filter_subgroup(&t, &filter).unwrap();
        let twice = filter_subgroup(&once, &filter).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn include_list_drops_missing() {
        let t = survey();
        let filter = SubgroupFilter { column: "race".into(), exclude: vec![], include: vec!["1".into()] };
        let f = filter_subgroup(&t, &filter).unwrap();
        assert_eq!(f.n_rows(), 2);
    }

    #[test]
    fn text_labels_match() {
        let t = Table::from_columns(vec![(
            "race".into(),
            Column::Text(vec![Some("White".into()), Some("Black".into())]),
        )])
        .unwrap();
        let f = filter_subgroup(&t, &SubgroupFilter::excluding("race", &["Black"])).unwrap();
        assert_eq!(f.text("race").unwrap(), &[Some("White".to_string())]);
    }

    #[test]
    fn absent_column_is_fatal() {
        let t = survey();
        let err = filter_subgroup(&t, &SubgroupFilter::excluding("RACE", &["2"])).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "RACE"));
    }

    #[test]
    fn sentinels_across_columns() {
        let mut t = survey();
        let s = Sentinels { text: vec!["N/A".into()], codes: vec![999.0] };
        let n = replace_sentinels(&mut t, &s);
        assert_eq!(n, 4);
        assert_eq!(t.column("hours").unwrap().n_missing(), 3);
        assert_eq!(t.column("code").unwrap().n_missing(), 3);
        assert_eq!(t.column("race").unwrap().n_missing(), 1);
    }
}

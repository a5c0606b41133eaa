//! Column-oriented in-memory table.
//!
//! A [`Table`] is the unit every pipeline stage consumes and produces. Cells
//! are `Option`s: `None` is the single missing-value marker, whatever the
//! source file used (empty CSV field, Parquet null, `"N/A"` sentinel).

use lh_core::{Error, Result};

/// A single typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric cells (integers, floats and booleans are all widened to `f64`).
    Numeric(Vec<Option<f64>>),
    /// Text / categorical cells.
    Text(Vec<Option<String>>),
}

impl Column {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether cell `i` is missing.
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            Column::Numeric(v) => v[i].is_none(),
            Column::Text(v) => v[i].is_none(),
        }
    }

    /// Number of missing cells.
    pub fn n_missing(&self) -> usize {
        match self {
            Column::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// `"numeric"` or `"text"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Numeric(_) => "numeric",
            Column::Text(_) => "text",
        }
    }

    fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table from `(name, column)` pairs.
    ///
    /// Fails if two columns share a name or lengths differ.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut table = Table::default();
        for (name, col) in columns {
            if table.has_column(&name) {
                return Err(Error::Validation(format!("duplicate column name '{}'", name)));
            }
            table.insert_column(&name, col)?;
        }
        Ok(table)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(name, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Borrow a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        let idx = self.index_of(name)?;
        Ok(&self.columns[idx])
    }

    /// Mutably borrow a column by name.
    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        let idx = self.index_of(name)?;
        Ok(&mut self.columns[idx])
    }

    /// Borrow the cells of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Text(_) => Err(Error::ColumnType {
                column: name.to_string(),
                expected: "numeric".into(),
            }),
        }
    }

    /// Borrow the cells of a text column.
    pub fn text(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            Column::Numeric(_) => {
                Err(Error::ColumnType { column: name.to_string(), expected: "text".into() })
            }
        }
    }

    /// Insert a column, replacing any existing column of the same name in place.
    pub fn insert_column(&mut self, name: &str, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(Error::Validation(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows
            )));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// New table holding only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        }
    }

    /// New table holding the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.n_rows {
            return Err(Error::Validation(format!(
                "row mask has length {}, table has {} rows",
                mask.len(),
                self.n_rows
            )));
        }
        let rows: Vec<usize> = mask.iter().enumerate().filter(|(_, &m)| m).map(|(i, _)| i).collect();
        Ok(self.take_rows(&rows))
    }

    /// Fail with [`Error::MissingColumn`] naming the first absent column.
    pub fn require_columns<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.index_of(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("a".into(), Column::Numeric(vec![Some(1.0), None, Some(3.0)])),
            ("b".into(), Column::Text(vec![Some("x".into()), Some("y".into()), None])),
        ])
        .unwrap()
    }

    #[test]
    fn shape_and_lookup() {
        let t = sample();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.numeric("a").unwrap()[2], Some(3.0));
        assert!(t.text("a").is_err());
        assert!(matches!(t.column("zzz"), Err(Error::MissingColumn(name)) if name == "zzz"));
        assert_eq!(t.column("a").unwrap().n_missing(), 1);
    }

    #[test]
    fn rejects_ragged_and_duplicate_columns() {
        let ragged = Table::from_columns(vec![
            ("a".into(), Column::Numeric(vec![Some(1.0)])),
            ("b".into(), Column::Numeric(vec![Some(1.0), Some(2.0)])),
        ]);
        assert!(ragged.is_err());

        let dup = Table::from_columns(vec![
            ("a".into(), Column::Numeric(vec![Some(1.0)])),
            ("a".into(), Column::Numeric(vec![Some(2.0)])),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut t = sample();
        t.insert_column("a", Column::Numeric(vec![Some(9.0); 3])).unwrap();
        assert_eq!(t.column_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.numeric("a").unwrap()[1], Some(9.0));
    }

    #[test]
    fn filter_and_take() {
        let t = sample();
        let f = t.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(f.n_rows(), 2);
        assert_eq!(f.numeric("a").unwrap(), &[Some(1.0), Some(3.0)]);
        assert!(t.filter_rows(&[true]).is_err());

        let r = t.take_rows(&[2, 0]);
        assert_eq!(r.text("b").unwrap(), &[None, Some("x".to_string())]);
    }
}

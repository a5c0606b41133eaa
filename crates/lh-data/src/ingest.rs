//! Survey extract ingestion (CSV / Parquet → [`Table`]) and export.
//!
//! Parquet goes through Arrow record batches; categorical (dictionary-encoded)
//! string columns keep their labels. CSV is read with the standalone `csv`
//! crate: a column is numeric only if every non-empty field parses as `f64`,
//! so free-text columns such as an hours field containing `"N/A"` arrive as
//! text and are coerced later by the feature builder.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray, StringBuilder};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::table::{Column, Table};

/// Error type for file ingestion and export.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet read/write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("unsupported file extension '.{0}' (expected .parquet, .pq, .csv, .tsv or .txt)")]
    UnsupportedFormat(String),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("{0} contains no data rows")]
    Empty(String),

    #[error(transparent)]
    Table(#[from] lh_core::Error),
}

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    /// Delimited text with a header row.
    Delimited(u8),
    /// Apache Parquet.
    Parquet,
}

impl TabularFormat {
    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Ok(Self::Parquet),
            "csv" | "txt" => Ok(Self::Delimited(b',')),
            "tsv" => Ok(Self::Delimited(b'\t')),
            _ => Err(IngestError::UnsupportedFormat(ext)),
        }
    }
}

/// Read a CSV/TSV/Parquet survey extract into a [`Table`].
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    let table = match TabularFormat::from_path(path)? {
        TabularFormat::Parquet => {
            let batches = read_parquet_batches(path)?;
            table_from_batches(&batches)?
        }
        TabularFormat::Delimited(delimiter) => read_delimited(path, delimiter)?,
    };
    if table.n_rows() == 0 {
        return Err(IngestError::Empty(path.display().to_string()));
    }
    tracing::info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "survey extract loaded"
    );
    Ok(table)
}

/// Write a [`Table`] as CSV/TSV or Parquet (format inferred from the extension).
pub fn write_table(table: &Table, path: &Path) -> Result<(), IngestError> {
    match TabularFormat::from_path(path)? {
        TabularFormat::Parquet => {
            let batch = table_to_batch(table)?;
            write_parquet(path, &batch)
        }
        TabularFormat::Delimited(delimiter) => write_delimited(table, path, delimiter),
    }
}

// ---------------------------------------------------------------------------
// Parquet / Arrow
// ---------------------------------------------------------------------------

/// Read a Parquet file into Arrow record batches.
pub fn read_parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, IngestError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;
    let batches: Result<Vec<_>, _> = reader.collect();
    Ok(batches?)
}

/// Convert Arrow record batches (sharing one schema) into a [`Table`].
pub fn table_from_batches(batches: &[RecordBatch]) -> Result<Table, IngestError> {
    let Some(first) = batches.first() else {
        return Ok(Table::default());
    };
    let schema = first.schema();
    let mut columns = Vec::with_capacity(schema.fields().len());
    for (j, field) in schema.fields().iter().enumerate() {
        let arrays: Vec<&ArrayRef> = batches.iter().map(|b| b.column(j)).collect();
        columns.push((field.name().clone(), column_from_arrays(field.name(), &arrays)?));
    }
    Ok(Table::from_columns(columns)?)
}

fn is_string_type(dt: &DataType) -> bool {
    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, value) => is_string_type(value),
        _ => false,
    }
}

fn is_numeric_type(dt: &DataType) -> bool {
    dt.is_numeric() || matches!(dt, DataType::Boolean | DataType::Null)
}

fn column_from_arrays(name: &str, arrays: &[&ArrayRef]) -> Result<Column, IngestError> {
    let Some(first) = arrays.first() else {
        return Ok(Column::Numeric(Vec::new()));
    };
    let dt = first.data_type().clone();

    if is_string_type(&dt) {
        let mut out = Vec::new();
        for arr in arrays {
            let utf8 = cast(arr, &DataType::Utf8)?;
            let strings = utf8.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
                IngestError::UnsupportedType { column: name.to_string(), data_type: dt.to_string() }
            })?;
            out.extend(strings.iter().map(|v| v.map(str::to_string)));
        }
        Ok(Column::Text(out))
    } else if is_numeric_type(&dt) {
        let mut out = Vec::new();
        for arr in arrays {
            let floats = cast(arr, &DataType::Float64)?;
            let floats = floats.as_any().downcast_ref::<Float64Array>().ok_or_else(|| {
                IngestError::UnsupportedType { column: name.to_string(), data_type: dt.to_string() }
            })?;
            out.extend(floats.iter().map(|v| v.filter(|x| !x.is_nan())));
        }
        Ok(Column::Numeric(out))
    } else {
        Err(IngestError::UnsupportedType { column: name.to_string(), data_type: dt.to_string() })
    }
}

/// Convert a [`Table`] into a single Arrow record batch (Float64 / Utf8 columns).
pub fn table_to_batch(table: &Table) -> Result<RecordBatch, IngestError> {
    let n = table.n_rows();
    let mut fields = Vec::with_capacity(table.n_cols());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.n_cols());
    for (name, col) in table.iter() {
        match col {
            Column::Numeric(v) => {
                let mut b = Float64Builder::with_capacity(n);
                for cell in v {
                    b.append_option(*cell);
                }
                fields.push(Field::new(name, DataType::Float64, true));
                arrays.push(Arc::new(b.finish()));
            }
            Column::Text(v) => {
                let mut b = StringBuilder::with_capacity(n, n * 8);
                for cell in v {
                    b.append_option(cell.as_deref());
                }
                fields.push(Field::new(name, DataType::Utf8, true));
                arrays.push(Arc::new(b.finish()));
            }
        }
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), IngestError> {
    let props = WriterProperties::builder().set_compression(Compression::SNAPPY).build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn read_delimited(path: &Path, delimiter: u8) -> Result<Table, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (j, field) in record.iter().enumerate() {
            raw[j].push(field.trim().to_string());
        }
    }

    let columns = headers.into_iter().zip(raw).map(|(name, cells)| (name, infer_column(cells)));
    Ok(Table::from_columns(columns.collect())?)
}

/// Numeric if every non-empty field parses as `f64`, otherwise text. Empty fields are missing.
fn infer_column(cells: Vec<String>) -> Column {
    let all_numeric = cells.iter().all(|s| s.is_empty() || s.parse::<f64>().is_ok());
    if all_numeric {
        Column::Numeric(cells.iter().map(|s| s.parse::<f64>().ok().filter(|x| !x.is_nan())).collect())
    } else {
        Column::Text(cells.into_iter().map(|s| if s.is_empty() { None } else { Some(s) }).collect())
    }
}

fn write_delimited(table: &Table, path: &Path, delimiter: u8) -> Result<(), IngestError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    wtr.write_record(table.column_names())?;
    let columns: Vec<&Column> = table.iter().map(|(_, c)| c).collect();
    let mut row = Vec::with_capacity(columns.len());
    for i in 0..table.n_rows() {
        row.clear();
        for col in &columns {
            row.push(match col {
                Column::Numeric(v) => v[i].map(|x| x.to_string()).unwrap_or_default(),
                Column::Text(v) => v[i].clone().unwrap_or_default(),
            });
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_numeric_with_blanks() {
        let col = infer_column(vec!["1".into(), "".into(), "2.5".into()]);
        assert_eq!(col, Column::Numeric(vec![Some(1.0), None, Some(2.5)]));
    }

    #[test]
    fn infer_mixed_as_text() {
        let col = infer_column(vec!["40".into(), "N/A".into(), "".into()]);
        assert_eq!(col, Column::Text(vec![Some("40".into()), Some("N/A".into()), None]));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(TabularFormat::from_path(Path::new("a.CSV")).unwrap(), TabularFormat::Delimited(b','));
        assert_eq!(TabularFormat::from_path(Path::new("a.tsv")).unwrap(), TabularFormat::Delimited(b'\t'));
        assert_eq!(TabularFormat::from_path(Path::new("a.pq")).unwrap(), TabularFormat::Parquet);
        assert!(matches!(
            TabularFormat::from_path(Path::new("a.dta")),
            Err(IngestError::UnsupportedFormat(ext)) if ext == "dta"
        ));
    }

    #[test]
    fn dictionary_strings_keep_labels() {
        use arrow::array::DictionaryArray;
        use arrow::datatypes::Int8Type;

        let dict: DictionaryArray<Int8Type> =
            vec![Some("white"), Some("black"), None, Some("white")].into_iter().collect();
        let arr: ArrayRef = Arc::new(dict);
        let col = column_from_arrays("race", &[&arr]).unwrap();
        assert_eq!(
            col,
            Column::Text(vec![Some("white".into()), Some("black".into()), None, Some("white".into())])
        );
    }

    #[test]
    fn batch_conversion_preserves_cells() {
        let table = Table::from_columns(vec![
            ("x".into(), Column::Numeric(vec![Some(1.0), None])),
            ("s".into(), Column::Text(vec![None, Some("b".into())])),
        ])
        .unwrap();
        let batch = table_to_batch(&table).unwrap();
        assert_eq!(batch.num_rows(), 2);
        let back = table_from_batches(&[batch]).unwrap();
        assert_eq!(back, table);
    }
}

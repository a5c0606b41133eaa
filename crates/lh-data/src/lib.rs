//! # lh-data
//!
//! Survey extract handling for lanham: file ingestion (CSV / Parquet),
//! subgroup filtering, sentinel cleanup and the derived indicators the
//! triple-difference regressions and plots consume.

#![warn(missing_docs)]

pub mod clean;
pub mod features;
#[allow(missing_docs)]
pub mod ingest;
pub mod pipeline;
pub mod simulate;
pub mod table;

pub use clean::{filter_subgroup, replace_sentinels, Sentinels, SubgroupFilter};
pub use features::{
    add_didid_interactions, add_median_split, add_part_time, add_product, add_quartiles,
    coerce_numeric, quartile_edges, DididColumns, MissingHoursPolicy, PartTimeRule,
};
pub use ingest::{read_table, write_table, IngestError, TabularFormat};
pub use pipeline::{add_plot_features, prepare, ColumnMap, PrepareConfig, PrepareReport, Prepared};
pub use simulate::{generate, SimulationConfig};
pub use table::{Column, Table};

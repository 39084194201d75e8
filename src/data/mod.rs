//! Tabular data collaborators: CSV ingestion, a descriptive report and
//! encoding of a table into a numeric feature matrix and label vector.

mod encode;
mod loader;
mod report;

pub use encode::{encode_features, encode_labels, EncodedFeatures, LabelEncoding};
pub use loader::{load_table, CsvLoader};
pub use report::{describe, DatasetReport};

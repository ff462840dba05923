//! Utility functions and types

pub mod data_loader;

pub use data_loader::{column_values, load_csv, split_features_label, write_csv, LABEL_COLUMN};

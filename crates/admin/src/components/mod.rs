//! Reusable view components for admin templates.

pub mod data_table;

pub use data_table::{DataTable, PageLink, SortHeader, TableColumn};

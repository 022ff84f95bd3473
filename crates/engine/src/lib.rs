pub mod cell;
pub mod code;
pub mod columns;
pub mod error;
pub mod status;
pub mod store;

pub use cell::CellValue;
pub use code::CodeValue;
pub use columns::{ColumnNames, Field, Slot, Year};
pub use error::StoreError;
pub use status::StatusCode;
pub use store::{RecordStore, RowIndex};

// Reader/Writer for record stores: Excel, ODS and CSV

pub mod csv;
pub mod error;
pub mod sheet;
pub mod split;
pub mod workbook;
pub mod xlsx;

pub use error::IoError;
pub use sheet::RawSheet;
pub use split::split_by_discipline;
pub use workbook::{load, FileFormat, LoadedWorkbook};

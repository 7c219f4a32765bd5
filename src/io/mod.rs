//! Upload ingestion into an in-memory table.

mod reader;
mod table;


pub use reader::{load_table, read_table, Upload, UploadFormat};
pub use table::{Cell, RawTable};
pub(crate) use table::integral_float;

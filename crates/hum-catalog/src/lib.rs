//! HumSearch catalog file format library
//!
//! The persisted catalog is an ordered list of records, one per song.
//! JSON files hold the bare list; BSON files wrap it in a versioned
//! document since BSON cannot store a top-level array.

pub mod error;
pub mod format;
pub mod catalog_file;

pub use error::CatalogFormatError;
pub use format::{CatalogFormat, CatalogRecord, DEFAULT_TEMPO, VERSION};
pub use catalog_file::CatalogFile;

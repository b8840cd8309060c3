pub mod errors;
pub mod formats;
pub mod model;

pub use errors::ParserError;
pub use formats::{detect_kind, parse_as, parse_source_file, required_columns};
pub use model::{RawProductionRow, RawSalesRow, SourceFile, SourceKind};

#[cfg(test)]
mod tests;

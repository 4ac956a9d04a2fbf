pub mod classify;
pub mod digest;
pub mod league;
pub mod parser;

use crate::error::{AppError, Result};
use crate::types::Digest;

pub use classify::Tables;
pub use parser::RowFormat;

/// Run the full core pipeline over one input batch with the canonical
/// threshold tables: parse rows, classify, deduplicate, render.
///
/// Malformed rows are dropped silently; an empty Digest is a normal
/// outcome, not an error.
pub fn parse_and_classify(raw_input: &str, format: RowFormat) -> Digest {
    parse_and_classify_with(raw_input, format, &Tables::canonical())
}

/// Same pipeline with caller-supplied threshold tables.
pub fn parse_and_classify_with(raw_input: &str, format: RowFormat, tables: &Tables) -> Digest {
    let mut builder = digest::DigestBuilder::new();
    for record in parser::parse_rows(raw_input, format) {
        builder.push(classify::classify(record, tables));
    }
    builder.finish()
}

/// Decode an uploaded slate body. The only batch-level failure the core
/// surfaces: undecodable bytes produce no partial Digest.
pub fn decode_input(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| AppError::InputEncoding)
}

mod reader;
pub mod schema;
mod share;
mod types;
mod writer;

pub use reader::PackReader;
pub use schema::{upgrade, validate, validate_document};
pub use share::{decode, encode, parse_share_url, share_url};
pub use types::*;
pub use writer::PackWriter;

/// File extension used for pack documents
pub const PACK_FILE_EXTENSION: &str = "extpack";

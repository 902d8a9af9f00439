//! Race card input handling

pub mod parser;

// Re-export commonly used types
pub use parser::{normalize_text, read_text_file, EntryParser, LineMatch};

// nanotune-core/src/parser/mod.rs

pub mod notation;

pub use notation::{is_instrument_id, parse, scan_tokens, ParsedPart, HEADER_LEN};

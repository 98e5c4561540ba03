// src/process/mod.rs

pub mod filter;
pub mod fuzzy;
pub mod parse;

pub use filter::{filter_records, FilterCriteria, NAME_MATCH_THRESHOLD};
pub use parse::{parse_block, parse_bytes, parse_records, STATUS_MIN_LINES};

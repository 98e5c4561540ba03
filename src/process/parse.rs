// src/process/parse.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use crate::record::{CompanyRecord, UNKNOWN};

/// A block needs strictly more lines than this before its second-to-last
/// line is read as the status.
pub const STATUS_MIN_LINES: usize = 6;

/// One or more lines that are empty or whitespace only.
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("blank-line regex should parse"));

/// Split raw text into trimmed, non-empty blocks.
pub fn split_blocks(text: &str) -> Vec<&str> {
    BLANK_LINES
        .split(text)
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect()
}

/// Parse a single block by positional offset. Never fails.
///
/// Only the block as a whole is trimmed; interior lines keep their spacing
/// apart from a trailing `\r`.
pub fn parse_block(block: &str) -> CompanyRecord {
    let lines: Vec<&str> = block.trim().lines().collect();
    let at = |i: usize| {
        lines
            .get(i)
            .map(|s| s.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    let status = if lines.len() > STATUS_MIN_LINES {
        at(lines.len() - 2)
    } else {
        UNKNOWN.to_string()
    };
    let contact = match lines.last() {
        Some(last) if last.contains('@') => last.to_string(),
        _ => UNKNOWN.to_string(),
    };

    CompanyRecord {
        name: at(0),
        employees: at(1),
        category: at(2),
        location: at(3),
        id: at(4),
        status,
        contact,
        registration_number: None,
    }
}

/// Parse every block of `text`, preserving input order.
#[instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn parse_records(text: &str) -> Vec<CompanyRecord> {
    let records: Vec<CompanyRecord> = split_blocks(text).into_iter().map(parse_block).collect();
    debug!(count = records.len(), "parsed company records");
    records
}

/// Parse an uploaded file body; invalid UTF-8 is replaced rather than rejected.
pub fn parse_bytes(bytes: &[u8]) -> Vec<CompanyRecord> {
    parse_records(&String::from_utf8_lossy(bytes))
}

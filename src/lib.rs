//! Company research pipeline: parse an uploaded company list, filter it by
//! fuzzy name and location, enrich it from a company registry, export it.

pub mod config;
pub mod export;
pub mod fetch;
pub mod process;
pub mod record;

pub use record::{CompanyRecord, UNKNOWN};

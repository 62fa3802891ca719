pub mod address;
pub mod phone;
pub mod record;

pub use address::split_city_state_zip;
pub use phone::{format_phone_number, rank_and_filter};
pub use record::{flatten, FlattenedRow, FlattenedTable};

use crate::error::{Result, ScraperError};
use chrono::NaiveDate;

/// Zero-pad a user-typed `M/D/YYYY` date to `MM/DD/YYYY`.
pub fn format_date(date: &str) -> Result<String> {
    parse_user_date(date).map(|d| d.format("%m/%d/%Y").to_string())
}

/// Parse the `M/D/YYYY` dates the CLI accepts.
pub fn parse_user_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%m/%d/%Y")
        .map_err(|e| ScraperError::Parse(format!("expected MM/DD/YYYY, got '{}': {}", date, e)))
}

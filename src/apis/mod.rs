pub mod butler;
pub mod legacy;
pub mod warren;

use crate::constants::{BUTLER_COUNTY, WARREN_COUNTY};
use crate::types::SiteAdapter;

pub use butler::ButlerCountyCourt;
pub use legacy::{LegacyClient, Obituary};
pub use warren::WarrenCountyCourt;

/// Adapter for a county name, case-insensitive.
pub fn create_adapter(county: &str) -> Option<Box<dyn SiteAdapter>> {
    match county.trim() {
        c if c.eq_ignore_ascii_case(BUTLER_COUNTY) => Some(Box::new(ButlerCountyCourt::new())),
        c if c.eq_ignore_ascii_case(WARREN_COUNTY) => Some(Box::new(WarrenCountyCourt::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_adapter() {
        assert_eq!(create_adapter("butler").unwrap().county(), BUTLER_COUNTY);
        assert_eq!(create_adapter(" Warren ").unwrap().county(), WARREN_COUNTY);
        assert!(create_adapter("Clermont").is_none());
    }
}

/// County names as they appear in the `county` output column and on the CLI.
pub const BUTLER_COUNTY: &str = "Butler";
pub const WARREN_COUNTY: &str = "Warren";

// Butler County probate court (record search PHP app)
pub const BUTLER_BASE_URL: &str = "https://probatecourt.bcohio.gov";
pub const BUTLER_SEARCH_URL: &str = "https://probatecourt.bcohio.gov/recordSearch.php";
pub const BUTLER_ACCEPT_URL: &str =
    "https://probatecourt.bcohio.gov/recordSearch.php?k=acceptAgreementsearchForm0909";
pub const BUTLER_AGENCY: &str = "0909";
pub const BUTLER_CASE_TYPE: &str = "PE";
pub const BUTLER_BLOCK_SIZE: &str = "100";

// Warren County probate court (cgi search)
pub const WARREN_BASE_URL: &str = "http://probate.co.warren.oh.us";
pub const WARREN_SEARCH_URL: &str = "http://probate.co.warren.oh.us/cgi-bin/search.cgi";
pub const WARREN_CASE_URL_PREFIX: &str = "http://probate.co.warren.oh.us/cgi-bin/";
pub const WARREN_AGENCY: &str = "8303";
pub const WARREN_BLOCK_SIZE: &str = "250";

// ExactDial people search
pub const EXACTDIAL_ORIGIN: &str = "https://app.exactdial.com";
pub const EXACTDIAL_LOGIN_URL: &str = "https://app.exactdial.com/public/login";
pub const EXACTDIAL_HOME_URL: &str = "https://app.exactdial.com/public/home";
pub const EXACTDIAL_SEARCH_URL: &str = "https://app.exactdial.com/public/doSearch";
pub const EXACTDIAL_RESULT_URL: &str = "https://app.exactdial.com/public/getSearchResult";

// PropStream property data
pub const PROPSTREAM_SUGGESTIONS_URL: &str =
    "https://app.propstream.com/eqbackend/resource/auth/ps4/property/suggestionsnew";
pub const PROPSTREAM_PROPERTY_URL: &str =
    "https://app.propstream.com/eqbackend/resource/auth/ps4/property";
pub const PROPSTREAM_REFERER: &str = "https://app.propstream.com/search";

// legacy.com local obituary listings
pub const LEGACY_SUBREGION_URL: &str =
    "https://www.legacy.com/api/_frontend/localmarket/united-states/ohio/subregion";
pub const LEGACY_REFERER: &str = "https://www.legacy.com/us/obituaries/local/ohio/butler-county";
pub const LEGACY_PAGE_LIMIT: u64 = 50;
pub const LEGACY_COUNTIES: [&str; 5] = ["Butler", "Clermont", "Hamilton", "Montgomery", "Warren"];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0";
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Cell text the court sites use for an empty label.
pub const NON_BREAKING_SPACE: char = '\u{a0}';

// Wide enrichment columns
pub const MAX_RELATIVES: usize = 3;
pub const MAX_PHONES_PER_RELATIVE: usize = 2;
pub const MAX_RANKED_PHONES: usize = 3;
pub const MOBILE_IDENTIFIER: &str = "M";

/// Get all supported county names
pub fn get_supported_counties() -> Vec<&'static str> {
    vec![BUTLER_COUNTY, WARREN_COUNTY]
}

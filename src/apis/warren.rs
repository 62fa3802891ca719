use crate::constants::{
    WARREN_AGENCY, WARREN_BASE_URL, WARREN_BLOCK_SIZE, WARREN_CASE_URL_PREFIX, WARREN_COUNTY,
    WARREN_SEARCH_URL,
};
use crate::error::{Result, ScraperError};
use crate::extract::extract_fields;
use crate::extract::html::{rows_from_bold_labels, select_first, select_first_in, selector, text_of};
use crate::session::HttpSession;
use crate::types::{CaseLink, CaseRecord, RawPage, SearchCriteria, SiteAdapter};
use scraper::Html;
use tracing::{info, instrument};

const NO_MATCHES: &str = "No Matches Displayed";
const CASE_TYPE_MARKER: &str = "Case Type: ";
const ESTATE: &str = "Estate";

/// Warren County probate court cgi search. No handshake; cookies are optional.
pub struct WarrenCountyCourt;

impl Default for WarrenCountyCourt {
    fn default() -> Self {
        Self::new()
    }
}

impl WarrenCountyCourt {
    pub fn new() -> Self {
        Self
    }

    /// `Case Type: Estate` → `Some("Estate")`.
    fn case_type(cell_text: &str) -> Option<&str> {
        cell_text
            .split_once(CASE_TYPE_MARKER)
            .map(|(_, rest)| rest.trim_end())
    }
}

#[async_trait::async_trait]
impl SiteAdapter for WarrenCountyCourt {
    fn county(&self) -> &'static str {
        WARREN_COUNTY
    }

    #[instrument(skip_all, fields(filed_on = %criteria.filed_on))]
    async fn fetch_page(&self, session: &HttpSession, criteria: &SearchCriteria) -> Result<RawPage> {
        let month = criteria.filed_on.format("%m").to_string();
        let day = criteria.filed_on.format("%d").to_string();
        let year = criteria.filed_on.format("%Y").to_string();

        let form = [
            ("name", ""),
            ("casenum", ""),
            ("fmonth", month.as_str()),
            ("fday", day.as_str()),
            ("fyear", year.as_str()),
            ("block", WARREN_BLOCK_SIZE),
            ("file_type", "4"),
            ("search_type", "9"),
            ("submit", "Search"),
            ("agency_num", WARREN_AGENCY),
        ];
        let referer = format!("{}/search.php", WARREN_BASE_URL);

        session
            .post_form(
                WARREN_SEARCH_URL,
                &form,
                &[("Origin", WARREN_BASE_URL), ("Referer", referer.as_str())],
            )
            .await
    }

    fn parse_page(&self, page: &RawPage) -> Result<Vec<CaseLink>> {
        let document = Html::parse_document(&page.body);

        let summary = select_first_in(&document, "#cl_body > p > span > b")?
            .map(text_of)
            .ok_or_else(|| ScraperError::MissingField("result summary".into()))?;
        if summary.contains(NO_MATCHES) {
            return Ok(Vec::new());
        }
        info!("Total matches: {}", summary);

        let table = select_first_in(&document, "#cl_body > table")?
            .ok_or_else(|| ScraperError::MissingField("results table".into()))?;

        let rows = selector("tr")?;
        let mut links = Vec::new();
        for tr in table.select(&rows) {
            let Some(last_td) = select_first(tr, "td:last-child")? else {
                continue;
            };
            let text = last_td.text().collect::<String>();
            if Self::case_type(&text) != Some(ESTATE) {
                continue;
            }
            if let Some(href) = select_first(last_td, "a:nth-child(2)")?.and_then(|a| a.value().attr("href")) {
                links.push(CaseLink {
                    url: format!("{}{}", WARREN_CASE_URL_PREFIX, href),
                });
            }
        }

        info!("Found {} estate cases", links.len());
        Ok(links)
    }

    async fn fetch_case_page(&self, session: &HttpSession, link: &CaseLink) -> Result<RawPage> {
        session
            .get(
                &link.url,
                &[("Origin", WARREN_BASE_URL), ("Referer", WARREN_SEARCH_URL)],
            )
            .await
    }

    /// The first labelled row is the decedent, the second the fiduciary.
    fn parse_case(&self, page: &RawPage) -> Result<CaseRecord> {
        let document = Html::parse_document(&page.body);
        let table = select_first_in(&document, "#cl_body > table")?
            .ok_or_else(|| ScraperError::MissingField(format!("case table on {}", page.url)))?;

        let tr = selector("tr")?;
        let mut people = Vec::new();
        for row in table.select(&tr) {
            let rows = rows_from_bold_labels(row)?;
            if !rows.is_empty() {
                people.push(extract_fields(&rows));
            }
        }

        let mut people = people.into_iter();
        let decedent = people
            .next()
            .ok_or_else(|| ScraperError::MissingField(format!("decedent section on {}", page.url)))?;
        let fiduciary = people.next().unwrap_or_default();

        Ok(CaseRecord::new(page.url.clone(), decedent, fiduciary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_type() {
        assert_eq!(WarrenCountyCourt::case_type("2024 ES 0412 Case Type: Estate  "), Some("Estate"));
        assert_eq!(WarrenCountyCourt::case_type("Case Type: Guardianship"), Some("Guardianship"));
        assert_eq!(WarrenCountyCourt::case_type("no type"), None);
    }

    #[test]
    fn test_no_matches() {
        let page = RawPage::new(
            WARREN_SEARCH_URL,
            r#"<div id="cl_body"><p><span><b>No Matches Displayed</b></span></p></div>"#,
        );
        assert!(WarrenCountyCourt::new().parse_page(&page).unwrap().is_empty());
    }

    #[test]
    fn test_case_without_labels_is_an_error() {
        let page = RawPage::new(
            "http://probate.co.warren.oh.us/cgi-bin/x",
            r#"<div id="cl_body"><table><tr><td>nothing</td></tr></table></div>"#,
        );
        assert!(WarrenCountyCourt::new().parse_case(&page).is_err());
    }
}

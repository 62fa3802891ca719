use crate::constants::{
    BUTLER_ACCEPT_URL, BUTLER_AGENCY, BUTLER_BASE_URL, BUTLER_BLOCK_SIZE, BUTLER_CASE_TYPE,
    BUTLER_COUNTY, BUTLER_SEARCH_URL,
};
use crate::error::{Result, ScraperError};
use crate::extract::extract_fields;
use crate::extract::html::{rows_from_column_table, select_first, select_first_in, selector, text_of};
use crate::session::HttpSession;
use crate::types::{CaseLink, CaseRecord, PersonInfo, RawPage, SearchCriteria, SiteAdapter};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

static K_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<input type="hidden" name="k" id="k" value="([^"]*)""#).unwrap());

const DECEDENT_TABLE: &str = "#caseInformation tr:nth-child(2) > td > div > table";
const FIDUCIARY_TABLE: &str = "#caseInformation tr:nth-child(4) > td > div > table";

/// Butler County probate court record search.
///
/// The site hands out a session cookie on the first visit and a form token
/// `k` on the agreement page; both must accompany every search.
pub struct ButlerCountyCourt;

impl Default for ButlerCountyCourt {
    fn default() -> Self {
        Self::new()
    }
}

impl ButlerCountyCourt {
    pub fn new() -> Self {
        Self
    }

    /// The hidden `k` input on the agreement page.
    pub fn extract_form_token(body: &str) -> Option<String> {
        K_TOKEN.captures(body).map(|c| c[1].to_string())
    }

    fn match_count(document: &Html) -> Result<usize> {
        let count = select_first_in(document, "#matchCount")?
            .ok_or_else(|| ScraperError::MissingField("#matchCount".into()))?;
        let text = text_of(count);
        text.split_whitespace()
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| ScraperError::Parse(format!("unreadable match count '{}'", text)))
    }
}

#[async_trait::async_trait]
impl SiteAdapter for ButlerCountyCourt {
    fn county(&self) -> &'static str {
        BUTLER_COUNTY
    }

    #[instrument(skip_all)]
    async fn handshake(&self, session: &HttpSession) -> Result<Option<String>> {
        // First hit sets PHPSESSID and the bot-check cookie
        session.get(BUTLER_SEARCH_URL, &[]).await?;

        let agreement = session
            .get(BUTLER_ACCEPT_URL, &[("Referer", BUTLER_SEARCH_URL)])
            .await?;
        let token = Self::extract_form_token(&agreement.body);
        if token.is_none() {
            warn!("Agreement page carried no form token; searches will likely come back empty");
        }
        Ok(token)
    }

    async fn fetch_page(&self, session: &HttpSession, criteria: &SearchCriteria) -> Result<RawPage> {
        let month = criteria.filed_on.format("%m").to_string();
        let day = criteria.filed_on.format("%d").to_string();
        let year = criteria.filed_on.format("%Y").to_string();
        let token = criteria.token.clone().unwrap_or_default();

        let form = [
            ("searchName", ""),
            ("searchCase", ""),
            ("searchFMonth", month.as_str()),
            ("searchFDay", day.as_str()),
            ("searchFYear", year.as_str()),
            ("searchAgency[]", BUTLER_AGENCY),
            ("searchCaseType[]", BUTLER_CASE_TYPE),
            ("searchBlock", BUTLER_BLOCK_SIZE),
            ("searchType", "mainSearch"),
            ("k", token.as_str()),
        ];

        session
            .post_form(
                BUTLER_SEARCH_URL,
                &form,
                &[("Referer", BUTLER_ACCEPT_URL), ("Origin", BUTLER_BASE_URL)],
            )
            .await
    }

    fn parse_page(&self, page: &RawPage) -> Result<Vec<CaseLink>> {
        let document = Html::parse_document(&page.body);
        let total = Self::match_count(&document)?;
        info!("Total matches: {}", total);
        if total == 0 {
            return Ok(Vec::new());
        }

        let results = selector("#searchResults > div")?;
        let mut links = Vec::new();
        for child in document.select(&results) {
            match select_first(child, "div.caseInfo > a.caseLink.icon")?
                .and_then(|a| a.value().attr("href"))
            {
                Some(href) => links.push(CaseLink {
                    url: format!("{}{}", BUTLER_BASE_URL, href),
                }),
                None => debug!("Result entry without a case link"),
            }
        }
        Ok(links)
    }

    async fn fetch_case_page(&self, session: &HttpSession, link: &CaseLink) -> Result<RawPage> {
        session.get(&link.url, &[("Referer", BUTLER_SEARCH_URL)]).await
    }

    fn parse_case(&self, page: &RawPage) -> Result<CaseRecord> {
        let document = Html::parse_document(&page.body);

        let read = |css: &str| -> Result<Option<PersonInfo>> {
            match select_first_in(&document, css)? {
                Some(table) => Ok(Some(extract_fields(&rows_from_column_table(table)?))),
                None => Ok(None),
            }
        };

        match (read(DECEDENT_TABLE)?, read(FIDUCIARY_TABLE)?) {
            (None, None) => Err(ScraperError::MissingField(format!(
                "case information tables on {}",
                page.url
            ))),
            (decedent, fiduciary) => Ok(CaseRecord::new(
                page.url.clone(),
                decedent.unwrap_or_default(),
                fiduciary.unwrap_or_default(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_token() {
        let body = r#"<form><input type="hidden" name="k" id="k" value="abc123XYZ"></form>"#;
        assert_eq!(ButlerCountyCourt::extract_form_token(body), Some("abc123XYZ".to_string()));
        assert_eq!(ButlerCountyCourt::extract_form_token("<form></form>"), None);
    }

    #[test]
    fn test_zero_matches() {
        let page = RawPage::new(BUTLER_SEARCH_URL, r#"<div id="matchCount">0 matches</div>"#);
        assert!(ButlerCountyCourt::new().parse_page(&page).unwrap().is_empty());
    }

    #[test]
    fn test_missing_match_count_is_an_error() {
        let page = RawPage::new(BUTLER_SEARCH_URL, "<html><body>Service unavailable</body></html>");
        assert!(ButlerCountyCourt::new().parse_page(&page).is_err());
    }

    #[test]
    fn test_case_page_without_tables_is_an_error() {
        let page = RawPage::new("https://probatecourt.bcohio.gov/x", "<html></html>");
        assert!(matches!(
            ButlerCountyCourt::new().parse_case(&page),
            Err(ScraperError::MissingField(_))
        ));
    }
}

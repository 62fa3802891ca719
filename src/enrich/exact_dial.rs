use crate::config::ExactDialCredentials;
use crate::constants::{
    EXACTDIAL_HOME_URL, EXACTDIAL_LOGIN_URL, EXACTDIAL_ORIGIN, EXACTDIAL_RESULT_URL,
    EXACTDIAL_SEARCH_URL, NON_BREAKING_SPACE,
};
use crate::error::{Result, ScraperError};
use crate::extract::html::{select_first_in, selector};
use crate::normalize::rank_and_filter;
use crate::session::HttpSession;
use crate::types::{PhoneEntry, RankedPhone, Relative};
use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{info, instrument};

const EMAIL_LABEL: &str = "Email Address:";

/// Who to look up. Empty strings are sent as blank form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonQuery {
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub zip: String,
    pub county: String,
}

impl PersonQuery {
    /// Split a court-style name. `"SMITH, JOHN Q"` and `"JOHN Q SMITH"` both
    /// give first `JOHN`, last `SMITH`.
    pub fn with_name(full_name: &str) -> Option<Self> {
        let (first, last) = match full_name.split_once(',') {
            Some((last, rest)) => (rest.split_whitespace().next()?, last.trim()),
            None => {
                let mut parts = full_name.split_whitespace();
                let first = parts.next()?;
                (first, parts.last()?)
            }
        };
        if last.is_empty() {
            return None;
        }
        Some(Self {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Self::default()
        })
    }
}

/// Logged-in ExactDial session. Borrows the batch's HTTP session.
pub struct ExactDialClient<'s> {
    session: &'s HttpSession,
    token: String,
}

impl<'s> ExactDialClient<'s> {
    #[instrument(skip_all)]
    pub async fn login(session: &'s HttpSession, credentials: &ExactDialCredentials) -> Result<Self> {
        let login_page = session.get(EXACTDIAL_LOGIN_URL, &[]).await?;
        let token = extract_token(&login_page.body)
            .ok_or_else(|| ScraperError::MissingField("csrf-token on login page".into()))?;

        let form = [
            ("_token", token.as_str()),
            ("email", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let home = session
            .post_form(
                EXACTDIAL_LOGIN_URL,
                &form,
                &[("origin", EXACTDIAL_ORIGIN), ("referer", EXACTDIAL_LOGIN_URL)],
            )
            .await?;

        if home.url != EXACTDIAL_HOME_URL {
            return Err(ScraperError::Api {
                message: format!("ExactDial login was not accepted (landed on {})", home.url),
            });
        }

        let token = extract_token(&home.body).unwrap_or(token);
        info!("Logged into ExactDial");
        Ok(Self { session, token })
    }

    /// The person's own contact details plus their relatives' phone numbers.
    #[instrument(skip(self), fields(last_name = %query.last_name))]
    pub async fn search(&mut self, query: &PersonQuery) -> Result<SearchResult> {
        let form = [
            ("_token", self.token.as_str()),
            ("firstName", query.first_name.as_str()),
            ("lastName", query.last_name.as_str()),
            ("address", query.address.as_str()),
            ("city", query.city.as_str()),
            ("state", query.state.as_str()),
            ("nicknamesearch", "on"),
            ("middleName", ""),
            ("phonenumber", ""),
            ("zip", query.zip.as_str()),
            ("county", query.county.as_str()),
            ("dob", ""),
            ("ageMin", ""),
            ("ageMax", ""),
            ("hid_search_type", "1"),
            ("hid_redirect", "home"),
        ];
        let search = self
            .session
            .post_form(
                EXACTDIAL_SEARCH_URL,
                &form,
                &[("origin", EXACTDIAL_ORIGIN), ("referer", EXACTDIAL_HOME_URL)],
            )
            .await?;

        let search_id = extract_search_id(&search.body)
            .ok_or_else(|| ScraperError::MissingField("search reference id".into()))?;
        if let Some(token) = extract_token(&search.body) {
            self.token = token;
        }

        let form = [
            ("getSearchResult", "1"),
            ("all_data", "1"),
            ("record_no", "0"),
            ("search_ref_id", search_id.as_str()),
            ("_token", self.token.as_str()),
        ];
        let result = self
            .session
            .post_form(
                EXACTDIAL_RESULT_URL,
                &form,
                &[
                    ("origin", EXACTDIAL_ORIGIN),
                    ("referer", EXACTDIAL_HOME_URL),
                    ("x-requested-with", "XMLHttpRequest"),
                ],
            )
            .await?;

        Ok(SearchResult {
            contact: parse_person_contact(&result.body)?,
            relatives: parse_relatives(&result.body)?,
        })
    }
}

/// Everything one people search yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub contact: PersonContact,
    pub relatives: Vec<Relative>,
}

/// The searched person's own ranked mobile numbers and email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonContact {
    pub phones: Vec<RankedPhone>,
    pub email: String,
}

/// `<meta name="csrf-token" content="...">`
pub fn extract_token(html: &str) -> Option<String> {
    attr_of(html, r#"meta[name="csrf-token"]"#, "content")
}

/// `<input id="common_hidden_search_id" value="...">`
pub fn extract_search_id(html: &str) -> Option<String> {
    attr_of(html, "input#common_hidden_search_id", "value")
}

fn attr_of(html: &str, css: &str, attr: &str) -> Option<String> {
    let document = Html::parse_document(html);
    select_first_in(&document, css)
        .ok()
        .flatten()
        .and_then(|el| el.value().attr(attr).map(str::to_string))
}

fn remove_parentheses(s: &str) -> String {
    s.replace(['(', ')'], "")
}

fn child_divs<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "div")
}

/// Relatives from a search result. The relatives column alternates a name
/// block (`IDENT - NAME`) and a block of phone rows (`IDENT NUMBER DATE`),
/// after a leading heading div.
pub fn parse_relatives(html: &str) -> Result<Vec<Relative>> {
    let document = Html::parse_document(html);
    let column = selector("div.res_main_row_middle > div.col_last")?;
    let Some(column) = document.select(&column).next() else {
        info!("No result found");
        return Ok(Vec::new());
    };

    let blocks: Vec<ElementRef> = child_divs(column).skip(1).collect();
    let relatives = blocks
        .chunks(2)
        .map(|pair| {
            let heading = remove_parentheses(&pair[0].text().collect::<String>());
            let (identifier, name) = match heading.split_once('-') {
                Some((identifier, name)) => (identifier.trim().to_string(), name.trim().to_string()),
                None => (heading.trim().to_string(), String::new()),
            };
            let phones = pair
                .get(1)
                .map(|block| child_divs(*block).map(parse_phone_row).collect())
                .unwrap_or_default();
            Relative {
                identifier,
                name,
                phones,
            }
        })
        .collect();
    Ok(relatives)
}

/// The searched person's own phones (middle column, after its heading) and
/// the `Email Address:` line. No result block means no phones and no email.
pub fn parse_person_contact(html: &str) -> Result<PersonContact> {
    let document = Html::parse_document(html);
    let Some(column) = select_first_in(&document, "div.res_main_row_middle > div.col_middle")? else {
        info!("No result found");
        return Ok(PersonContact::default());
    };

    let phones = rank_and_filter(child_divs(column).skip(1).map(parse_phone_row).collect());

    let email = select_first_in(
        &document,
        "div.result_block_main > div > div.res_main_row_top > div.col_last > div:nth-child(2)",
    )?
    .and_then(|div| {
        div.text()
            .collect::<String>()
            .split_once(EMAIL_LABEL)
            .map(|(_, email)| email.trim().to_string())
    })
    .unwrap_or_default();

    Ok(PersonContact { phones, email })
}

fn parse_phone_row(row: ElementRef) -> PhoneEntry {
    let text = row.text().collect::<String>().replace(NON_BREAKING_SPACE, " ");
    let mut tokens = text.split_whitespace().map(remove_parentheses);
    PhoneEntry {
        identifier: tokens.next().unwrap_or_default(),
        number: tokens.next().unwrap_or_default(),
        date: tokens.next().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_court_names() {
        let q = PersonQuery::with_name("SMITH, JOHN Q").unwrap();
        assert_eq!((q.first_name.as_str(), q.last_name.as_str()), ("JOHN", "SMITH"));

        let q = PersonQuery::with_name("Mary Ann Jones").unwrap();
        assert_eq!((q.first_name.as_str(), q.last_name.as_str()), ("Mary", "Jones"));

        assert!(PersonQuery::with_name("Cher").is_none());
        assert!(PersonQuery::with_name("   ").is_none());
    }

    #[test]
    fn test_tokens() {
        let html = r#"<html><head><meta name="csrf-token" content="tok-1"></head>
            <body><input type="hidden" id="common_hidden_search_id" value="9981"></body></html>"#;
        assert_eq!(extract_token(html), Some("tok-1".to_string()));
        assert_eq!(extract_search_id(html), Some("9981".to_string()));
        assert_eq!(extract_token("<html></html>"), None);
    }

    #[test]
    fn test_no_result_block() {
        assert!(parse_relatives("<div>nothing</div>").unwrap().is_empty());
        assert_eq!(parse_person_contact("<div>nothing</div>").unwrap(), PersonContact::default());
    }

    #[test]
    fn test_contact_without_email_line() {
        let html = r#"<div class="res_main_row_middle"><div class="col_middle">
            <div>Phones</div>
            <div>M 513-555-0300 01/2024</div>
        </div></div>"#;
        let contact = parse_person_contact(html).unwrap();
        assert_eq!(contact.phones.len(), 1);
        assert_eq!(contact.email, "");
    }

    #[test]
    fn test_relative_without_phone_block() {
        let html = r#"<div class="res_main_row_middle"><div class="col_last">
            <div>Relatives</div>
            <div>(R1) - DAVID SMITH-JONES</div>
        </div></div>"#;
        let relatives = parse_relatives(html).unwrap();
        assert_eq!(relatives.len(), 1);
        assert_eq!(relatives[0].identifier, "R1");
        assert_eq!(relatives[0].name, "DAVID SMITH-JONES");
        assert!(relatives[0].phones.is_empty());
    }
}

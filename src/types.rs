use crate::error::Result;
use crate::session::HttpSession;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// Label → value mapping for one party on a case (decedent or fiduciary).
///
/// Labels keep the order they appear in on the page. Values are optional
/// because derived fields such as `Zip` may be absent while the label itself
/// is still reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonInfo(IndexMap<String, Option<String>>);

impl PersonInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: Option<String>) {
        self.0.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn remove(&mut self, label: &str) -> Option<Option<String>> {
        self.0.shift_remove(label)
    }

    /// Moves `from` to `to` at the end, keeping the value. No-op when `from` is absent.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.0.shift_remove(from) {
            self.0.insert(to.to_string(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PersonInfo {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// One probate case as scraped from a county court site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    pub decedent_info: PersonInfo,
    pub fiduciary_info: PersonInfo,
}

impl CaseRecord {
    pub fn new(url: impl Into<String>, decedent_info: PersonInfo, fiduciary_info: PersonInfo) -> Self {
        Self {
            url: url.into(),
            case_number: None,
            county: None,
            decedent_info,
            fiduciary_info,
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    /// Top-level scalar columns, in output order. Absent ones are skipped.
    pub fn scalar_columns(&self) -> Vec<(&'static str, &str)> {
        let mut columns = vec![("url", self.url.as_str())];
        if let Some(case_number) = &self.case_number {
            columns.push(("case_number", case_number.as_str()));
        }
        if let Some(county) = &self.county {
            columns.push(("county", county.as_str()));
        }
        columns
    }
}

/// A phone number row as shown by the people-search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEntry {
    pub identifier: String,
    pub number: String,
    pub date: String,
}

/// A mobile number that survived ranking. The type identifier is gone by then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPhone {
    pub number: String,
    pub date: String,
}

/// A relative listed on a people-search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relative {
    pub identifier: String,
    pub name: String,
    pub phones: Vec<PhoneEntry>,
}

/// What to ask a court site for: cases filed on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub filed_on: NaiveDate,
    /// Site-issued form token from the session handshake, if the site uses one.
    pub token: Option<String>,
}

/// A fetched page body together with where it ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawPage {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }
}

/// Absolute URL of one case detail page found on a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseLink {
    pub url: String,
}

/// Core trait that every county court source implements.
///
/// Markup knowledge lives entirely behind this trait; the normalizer only
/// ever sees `CaseRecord`s.
#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    /// County label attached to every record this adapter produces
    fn county(&self) -> &'static str;

    /// Session setup run once per batch (cookies, agreement pages, form tokens).
    async fn handshake(&self, _session: &HttpSession) -> Result<Option<String>> {
        Ok(None)
    }

    /// Submit the search form for `criteria` and return the results page.
    async fn fetch_page(&self, session: &HttpSession, criteria: &SearchCriteria) -> Result<RawPage>;

    /// Case links listed on a results page. An empty result set is `Ok(vec![])`.
    fn parse_page(&self, page: &RawPage) -> Result<Vec<CaseLink>>;

    fn has_next_page(&self, _page: &RawPage) -> bool {
        false
    }

    async fn fetch_case_page(&self, session: &HttpSession, link: &CaseLink) -> Result<RawPage>;

    /// Turn a case detail page into a record.
    fn parse_case(&self, page: &RawPage) -> Result<CaseRecord>;
}

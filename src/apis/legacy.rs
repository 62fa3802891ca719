use crate::constants::{LEGACY_COUNTIES, LEGACY_PAGE_LIMIT, LEGACY_REFERER, LEGACY_SUBREGION_URL};
use crate::error::Result;
use crate::session::HttpSession;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// One page of the local-market obituary listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObituaryPage {
    #[serde(default)]
    pub total_record_count: u64,
    #[serde(default)]
    pub obituaries: Vec<RawObituary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObituary {
    pub person_id: Value,
    #[serde(default)]
    pub name: RawName,
    #[serde(default)]
    pub location: RawLocation,
    #[serde(default)]
    pub links: RawLinks,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLocation {
    pub city: Option<FullName>,
    pub state: Option<FullName>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullName {
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinks {
    pub obituary_url: Option<Href>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Href {
    pub href: Option<String>,
}

/// An obituary as written to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obituary {
    #[serde(rename = "personId")]
    pub person_id: Value,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub full_name: Option<String>,
    pub city: Option<String>,
    pub county: String,
    pub state: Option<String>,
    pub details_url: Option<String>,
}

impl Obituary {
    pub fn from_raw(raw: RawObituary, county: &str) -> Self {
        let full_name = |n: Option<FullName>| n.and_then(|n| n.full_name);
        Self {
            person_id: raw.person_id,
            first_name: raw.name.first_name,
            last_name: raw.name.last_name,
            middle_name: raw.name.middle_name,
            full_name: raw.name.full_name,
            city: full_name(raw.location.city),
            county: county.to_string(),
            state: full_name(raw.location.state),
            details_url: raw.links.obituary_url.and_then(|u| u.href),
        }
    }
}

/// Pages needed to cover `total` records at the fixed page size.
pub fn page_count(total: u64) -> u64 {
    total.div_ceil(LEGACY_PAGE_LIMIT)
}

/// The last month ending `today`: one month back plus a day, through today.
pub fn date_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_months(Months::new(1))
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .unwrap_or(today);
    (start, today)
}

/// Listing query. The first page carries no offset.
pub fn listing_query(window: (NaiveDate, NaiveDate), page: u64) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("endDate", window.1.format("%Y-%m-%d").to_string()),
        ("startDate", window.0.format("%Y-%m-%d").to_string()),
        ("limit", LEGACY_PAGE_LIMIT.to_string()),
        ("noticeType", "obituary".to_string()),
        ("sortBy", "date".to_string()),
    ];
    if page >= 2 {
        query.push(("offset", ((page - 1) * LEGACY_PAGE_LIMIT).to_string()));
    }
    query
}

/// Canonical county name, if legacy.com lists it.
pub fn listed_county(county: &str) -> Option<&'static str> {
    LEGACY_COUNTIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(county.trim()))
}

/// Obituary listings behind a Cloudflare clearance cookie.
pub struct LegacyClient<'s> {
    session: &'s HttpSession,
    cookie: String,
    base_url: String,
    window: (NaiveDate, NaiveDate),
}

impl<'s> LegacyClient<'s> {
    pub fn new(session: &'s HttpSession, cf_clearance: &str, today: NaiveDate) -> Self {
        Self {
            session,
            cookie: format!("cf_clearance={}", cf_clearance),
            base_url: LEGACY_SUBREGION_URL.to_string(),
            window: date_window(today),
        }
    }

    /// Point the client at another subregion root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn county_url(&self, county: &str) -> String {
        format!("{}/{}-county", self.base_url, county.to_lowercase())
    }

    async fn fetch_page(&self, url: &str, page: u64) -> Result<Option<ObituaryPage>> {
        let headers = [("cookie", self.cookie.as_str()), ("referer", LEGACY_REFERER)];
        let query = listing_query(self.window, page);
        match self.session.get_json(url, &query, &headers).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    /// Every obituary in the window for one county. `None` when the county
    /// is not listed or any page is refused.
    #[instrument(skip(self))]
    pub async fn collect_county(&self, county: &str) -> Result<Option<Vec<Obituary>>> {
        let Some(county) = listed_county(county) else {
            warn!("Base URL not found for {}", county);
            return Ok(None);
        };
        let url = self.county_url(county);

        let Some(first) = self.fetch_page(&url, 1).await? else {
            warn!("Error fetching obituaries for {}", county);
            return Ok(None);
        };
        let pages = page_count(first.total_record_count);
        info!("Total records for {}: {} ({} pages)", county, first.total_record_count, pages);

        let mut obituaries: Vec<Obituary> = first
            .obituaries
            .into_iter()
            .map(|raw| Obituary::from_raw(raw, county))
            .collect();

        for page in 2..=pages {
            self.session.pause().await;
            let Some(next) = self.fetch_page(&url, page).await? else {
                warn!("Error fetching obituaries for {} on page {}", county, page);
                return Ok(None);
            };
            obituaries.extend(next.obituaries.into_iter().map(|raw| Obituary::from_raw(raw, county)));
        }
        Ok(Some(obituaries))
    }

    /// All listed counties in turn; refused counties contribute nothing.
    pub async fn collect_all(&self, counties: &[&str]) -> Result<Vec<Obituary>> {
        let mut all = Vec::new();
        for county in counties {
            if let Some(obituaries) = self.collect_county(county).await? {
                all.extend(obituaries);
            }
        }
        info!("Collected {} obituaries", all.len());
        Ok(all)
    }
}

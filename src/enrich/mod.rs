pub mod exact_dial;
pub mod propstream;

pub use exact_dial::{ExactDialClient, PersonContact, PersonQuery, SearchResult};
pub use propstream::PropStreamClient;

use crate::constants::{MAX_PHONES_PER_RELATIVE, MAX_RANKED_PHONES, MAX_RELATIVES};
use crate::normalize::record::DECEDENT_PREFIX;
use crate::normalize::{rank_and_filter, FlattenedRow, FlattenedTable};
use crate::types::Relative;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

/// Wide phone columns for up to three relatives, two ranked mobiles each.
///
/// Every slot is present; slots with no relative or no number are `null`.
pub fn phone_columns(relatives: &[Relative]) -> Map<String, Value> {
    let mut columns = Map::new();
    for k in 0..MAX_RELATIVES {
        let ranked = relatives
            .get(k)
            .map(|r| rank_and_filter(r.phones.clone()))
            .unwrap_or_default();
        for j in 0..MAX_PHONES_PER_RELATIVE {
            let column = format!("relative_{}_phone_number_{}", k + 1, j + 1);
            let (number, date) = match ranked.get(j) {
                Some(phone) => (Value::from(phone.number.clone()), Value::from(phone.date.clone())),
                None => (Value::Null, Value::Null),
            };
            columns.insert(format!("{}_last_used_date", column), date);
            columns.insert(column, number);
        }
    }
    columns
}

/// The decedent's own ranked mobiles and email, as wide columns. Missing
/// slots are `null`; a missing email is an empty string.
pub fn contact_columns(contact: &PersonContact) -> Map<String, Value> {
    let mut columns = Map::new();
    for j in 0..MAX_RANKED_PHONES {
        let column = format!("decedent_phone_number_{}", j + 1);
        let (number, date) = match contact.phones.get(j) {
            Some(phone) => (Value::from(phone.number.clone()), Value::from(phone.date.clone())),
            None => (Value::Null, Value::Null),
        };
        columns.insert(format!("{}_last_used_date", column), date);
        columns.insert(column, number);
    }
    columns.insert("decedent_email".to_string(), Value::from(contact.email.clone()));
    columns
}

/// People-search query for a flattened row's decedent.
pub fn query_for_row(row: &FlattenedRow) -> Option<PersonQuery> {
    let cell = |label: &str| {
        row.get(&format!("{}{}", DECEDENT_PREFIX, label))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    let name = ["Name", "Decedent"]
        .into_iter()
        .map(cell)
        .find(|name| !name.is_empty())?;

    let mut query = PersonQuery::with_name(&name)?;
    query.address = cell("Address");
    query.city = cell("City");
    query.state = cell("State");
    query.zip = cell("Zip");
    query.county = row
        .get("county")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(query)
}

/// Look up each decedent, then add their own contact columns and their
/// relatives' phone columns to the table.
///
/// A failed lookup leaves that row's phone columns `null`.
#[instrument(skip_all, fields(rows = table.len()))]
pub async fn enrich_phones(client: &mut ExactDialClient<'_>, table: &mut FlattenedTable) -> usize {
    let mut enriched = 0;
    for i in 0..table.len() {
        let query = table.rows.get(i).and_then(query_for_row);
        let found = match query {
            Some(query) => match client.search(&query).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("People search failed for row {}: {}", i, e);
                    SearchResult::default()
                }
            },
            None => {
                warn!("Row {} has no usable decedent name", i);
                SearchResult::default()
            }
        };
        if !found.relatives.is_empty() || !found.contact.phones.is_empty() {
            enriched += 1;
        }
        let columns = contact_columns(&found.contact)
            .into_iter()
            .chain(phone_columns(&found.relatives));
        for (column, value) in columns {
            table.set(i, &column, value);
        }
    }
    info!("Added phone numbers to {}/{} rows", enriched, table.len());
    enriched
}

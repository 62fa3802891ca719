use crate::constants::{MAX_RANKED_PHONES, MOBILE_IDENTIFIER};
use crate::types::{PhoneEntry, RankedPhone};
use chrono::NaiveDate;

const DAY_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%m-%d-%Y"];
const MONTH_FORMATS: [&str; 3] = ["%m/%Y", "%Y-%m", "%m-%Y"];

/// `(513) 555-0100` → `513-555-0100`. A textual rewrite, not a parser.
pub fn format_phone_number(raw: &str) -> String {
    raw.replace(['(', ')'], "").replace(' ', "-")
}

/// Best-effort date parse for "last seen" columns. Month-only dates land on the 1st.
pub fn parse_last_seen(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .or_else(|| {
            MONTH_FORMATS.iter().find_map(|fmt| {
                // chrono needs a day to build a NaiveDate
                NaiveDate::parse_from_str(&format!("{}/01", date), &format!("{}/%d", fmt)).ok()
            })
        })
}

/// Keep mobile numbers only, newest first, at most three.
///
/// Missing or unparseable dates rank below every real date. The sort is
/// stable, so ties keep their input order.
pub fn rank_and_filter(entries: Vec<PhoneEntry>) -> Vec<RankedPhone> {
    let mut mobiles: Vec<(Option<NaiveDate>, PhoneEntry)> = entries
        .into_iter()
        .filter(|entry| entry.identifier == MOBILE_IDENTIFIER)
        .map(|entry| (parse_last_seen(&entry.date), entry))
        .collect();

    // None < Some(_), so a descending sort leaves undated entries last
    mobiles.sort_by(|a, b| b.0.cmp(&a.0));

    mobiles
        .into_iter()
        .take(MAX_RANKED_PHONES)
        .map(|(_, entry)| RankedPhone {
            number: entry.number,
            date: entry.date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(identifier: &str, number: &str, date: &str) -> PhoneEntry {
        PhoneEntry {
            identifier: identifier.to_string(),
            number: number.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("(513) 555-0100"), "513-555-0100");
        assert_eq!(format_phone_number("513-555-0100"), "513-555-0100");
        assert_eq!(format_phone_number("(513)"), "513");
    }

    #[test]
    fn test_parse_last_seen_shapes() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(parse_last_seen("05/01/2023"), Some(expected));
        assert_eq!(parse_last_seen("2023-05-01"), Some(expected));
        assert_eq!(parse_last_seen("05/2023"), Some(expected));
        assert_eq!(parse_last_seen("2023-05"), Some(expected));
        assert_eq!(parse_last_seen(""), None);
        assert_eq!(parse_last_seen("last spring"), None);
        assert_eq!(parse_last_seen("13/45/2023"), None);
    }

    #[test]
    fn test_five_mobiles_keep_newest_three() {
        let entries = vec![
            entry("M", "513-555-0001", "01/15/2020"),
            entry("M", "513-555-0002", "03/10/2024"),
            entry("M", "513-555-0003", "07/04/2021"),
            entry("M", "513-555-0004", "12/01/2023"),
            entry("M", "513-555-0005", "02/28/2019"),
        ];

        let ranked = rank_and_filter(entries);
        let numbers: Vec<&str> = ranked.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, vec!["513-555-0002", "513-555-0004", "513-555-0003"]);

        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert!(json.get("identifier").is_none());
    }

    #[test]
    fn test_only_mobiles_survive() {
        let entries = vec![
            entry("L", "513-555-0001", "01/15/2024"),
            entry("M", "513-555-0002", "01/15/2020"),
            entry("", "513-555-0003", ""),
        ];
        let ranked = rank_and_filter(entries);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].number, "513-555-0002");
    }

    #[test]
    fn test_empty_and_malformed_dates_sort_last() {
        let entries = vec![
            entry("M", "undated", ""),
            entry("M", "garbled", "sometime"),
            entry("M", "dated", "06/2018"),
        ];
        let ranked = rank_and_filter(entries);
        let numbers: Vec<&str> = ranked.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, vec!["dated", "undated", "garbled"]);
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let entries = vec![
            entry("M", "first", "01/01/2022"),
            entry("M", "second", "01/01/2022"),
            entry("M", "third", "2022-01-01"),
        ];
        let ranked = rank_and_filter(entries);
        let numbers: Vec<&str> = ranked.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(numbers, vec!["first", "second", "third"]);
    }
}

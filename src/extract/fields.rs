use crate::constants::NON_BREAKING_SPACE;
use crate::normalize::{format_phone_number, split_city_state_zip};
use crate::types::PersonInfo;

pub const CITY_STATE_ZIP: &str = "City/State/ZIP";
const PHONE_NUMBER: &str = "Phone Number";
const TELEPHONE: &str = "Telephone";
const FIDUCIARY_NUMBERED: &str = "Fiduciary #1";
const FIDUCIARY: &str = "Fiduciary 1";

/// One label/value cell pair. Either side can be missing from the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCell {
    pub label: Option<String>,
    pub value: Option<String>,
}

impl LabelCell {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            value: Some(value.into()),
        }
    }
}

/// A table row holding up to two label/value pairs side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<LabelCell>,
}

impl TableRow {
    pub fn new(cells: Vec<LabelCell>) -> Self {
        Self { cells }
    }

    pub fn single(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(vec![LabelCell::new(label, value)])
    }

    fn is_placeholder(&self) -> bool {
        self.cells.iter().all(|c| is_placeholder(c.label.as_deref()))
    }
}

/// A label cell with nothing but `&nbsp;` (or nothing at all) in it.
pub fn is_placeholder(label: Option<&str>) -> bool {
    match label {
        None => true,
        Some(l) => l.trim_matches(|c: char| c == NON_BREAKING_SPACE || c.is_whitespace()).is_empty(),
    }
}

/// Build a party's label → value mapping from its table rows.
///
/// Missing cells drop only their own field. After collection the keys lose
/// one trailing `:`, `City/State/ZIP` gains derived `City`, `State` and
/// `Zip` siblings, `Phone Number` becomes a formatted `Telephone`, and
/// `Fiduciary #1` becomes `Fiduciary 1`.
pub fn extract_fields(rows: &[TableRow]) -> PersonInfo {
    let mut info = PersonInfo::new();

    for row in rows.iter().filter(|r| !r.is_placeholder()) {
        for cell in row.cells.iter().take(2) {
            let (Some(label), Some(value)) = (cell.label.as_deref(), cell.value.as_ref()) else {
                continue;
            };
            if is_placeholder(Some(label)) {
                continue;
            }
            let key = label.strip_suffix(':').unwrap_or(label);
            info.insert(key, Some(value.clone()));
        }
    }

    if info.contains(CITY_STATE_ZIP) {
        add_city_state_zip(&mut info);
    }

    if let Some(phone) = info.remove(PHONE_NUMBER) {
        info.insert(TELEPHONE, phone.map(|p| format_phone_number(&p)));
    }

    info.rename(FIDUCIARY_NUMBERED, FIDUCIARY);
    info
}

/// Add `City`, `State` and `Zip` next to the composite field, which stays.
pub fn add_city_state_zip(info: &mut PersonInfo) {
    let (city, state, zip) = split_city_state_zip(info.get(CITY_STATE_ZIP));
    info.insert("City", city);
    info.insert("State", state);
    info.insert("Zip", zip);
}

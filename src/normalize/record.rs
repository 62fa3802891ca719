use crate::error::NormalizeError;
use crate::types::{CaseRecord, PersonInfo};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

pub const DECEDENT_PREFIX: &str = "decedent_info.";
pub const FIDUCIARY_PREFIX: &str = "fiduciary_info.";

/// One output row: column name → value, `null` where a record lacks the column.
pub type FlattenedRow = Map<String, Value>;

/// The flattened batch. Every row carries every column in `columns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlattenedRow>,
}

impl FlattenedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in column order, ready to serialize as JSON records.
    pub fn records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let ordered: Vec<(String, Value)> = self
                    .columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect();
                Value::Object(ordered.into_iter().collect())
            })
            .collect()
    }

    /// Rebuild a table from JSON records, columns in first-seen order.
    pub fn from_rows(rows: Vec<FlattenedRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.extend(Self {
                columns: row.keys().cloned().collect(),
                rows: vec![row],
            });
        }
        table
    }

    /// Set one cell, adding the column (null everywhere else) if it is new.
    pub fn set(&mut self, row: usize, column: &str, value: Value) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
            for r in &mut self.rows {
                r.insert(column.to_string(), Value::Null);
            }
        }
        if let Some(r) = self.rows.get_mut(row) {
            r.insert(column.to_string(), value);
        }
    }

    /// Append another table, widening both to the union of their columns.
    pub fn extend(&mut self, other: FlattenedTable) {
        let mut seen: HashSet<String> = self.columns.iter().cloned().collect();
        for column in other.columns {
            if seen.insert(column.clone()) {
                self.columns.push(column);
            }
        }
        self.rows.extend(other.rows);
        for row in &mut self.rows {
            for column in &self.columns {
                row.entry(column.clone()).or_insert(Value::Null);
            }
        }
    }
}

/// One side of the join: shared key values plus that side's prefixed cells.
struct Projection {
    key: Vec<Option<String>>,
    cells: Vec<(String, Value)>,
}

/// Flatten decedent/fiduciary sub-records into one row per case.
///
/// Each record is projected twice, once per party, with the shared scalar
/// columns carried unprefixed; the projections are then inner-joined on
/// those shared columns. Rows whose keys repeat are paired in order of
/// appearance so the output stays one row per record. A projection that
/// finds no partner is an integrity fault and fails the whole batch.
pub fn flatten(records: &[CaseRecord]) -> Result<FlattenedTable, NormalizeError> {
    let shared = shared_columns(records);

    let decedent: Vec<Projection> = records
        .iter()
        .map(|r| project(r, &shared, &r.decedent_info, DECEDENT_PREFIX))
        .collect();
    let fiduciary: Vec<Projection> = records
        .iter()
        .map(|r| project(r, &shared, &r.fiduciary_info, FIDUCIARY_PREFIX))
        .collect();

    join(records, &shared, &decedent, &fiduciary)
}

fn join(
    records: &[CaseRecord],
    shared: &[String],
    left: &[Projection],
    right: &[Projection],
) -> Result<FlattenedTable, NormalizeError> {
    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    let left_cells = left.iter().flat_map(|p| p.cells.iter().map(|(name, _)| name));
    let right_cells = right.iter().flat_map(|p| p.cells.iter().map(|(name, _)| name));
    for name in left_cells.chain(shared.iter()).chain(right_cells) {
        if seen.insert(name.as_str()) {
            columns.push(name.clone());
        }
    }

    // Right side indexed by key; each key holds its row positions, first match on top
    let mut right_index: HashMap<&[Option<String>], Vec<usize>> = HashMap::new();
    for (i, projection) in right.iter().enumerate().rev() {
        right_index.entry(projection.key.as_slice()).or_default().push(i);
    }

    let mut rows = Vec::with_capacity(left.len());
    for (i, l) in left.iter().enumerate() {
        let r = right_index
            .get_mut(l.key.as_slice())
            .and_then(|queue| queue.pop())
            .map(|j| &right[j])
            .ok_or_else(|| NormalizeError::JoinKeyMismatch {
                record: i,
                url: records[i].url.clone(),
            })?;

        let mut row = FlattenedRow::new();
        for column in &columns {
            row.insert(column.clone(), Value::Null);
        }
        for (name, value) in l.cells.iter().chain(r.cells.iter()) {
            row.insert(name.clone(), value.clone());
        }
        for (name, value) in shared.iter().zip(l.key.iter()) {
            row.insert(name.clone(), value.clone().map(Value::String).unwrap_or(Value::Null));
        }
        rows.push(row);
    }

    Ok(FlattenedTable { columns, rows })
}

/// Union of scalar column names across the batch, in first-seen order.
fn shared_columns(records: &[CaseRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in record.scalar_columns() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn project(record: &CaseRecord, shared: &[String], info: &PersonInfo, prefix: &str) -> Projection {
    let scalars = record.scalar_columns();
    let key = shared
        .iter()
        .map(|name| {
            scalars
                .iter()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, v)| v.to_string())
        })
        .collect();

    let cells = info
        .iter()
        .map(|(label, value)| {
            let value = value.clone().map(Value::String).unwrap_or(Value::Null);
            (format!("{}{}", prefix, label), value)
        })
        .collect();

    Projection { key, cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, decedent: &[(&str, &str)], fiduciary: &[(&str, &str)]) -> CaseRecord {
        CaseRecord::new(
            url,
            decedent.iter().copied().collect(),
            fiduciary.iter().copied().collect(),
        )
    }

    fn sample() -> Vec<CaseRecord> {
        vec![
            record(
                "https://court.test/case/1",
                &[("Name", "JOHN SMITH"), ("City", "Hamilton")],
                &[("Name", "MARY SMITH"), ("Telephone", "513-555-0100")],
            ),
            record(
                "https://court.test/case/2",
                &[("Name", "ANN LEE"), ("Date of Death", "09/01/2024")],
                &[("Name", "BOB LEE")],
            ),
        ]
    }

    #[test]
    fn test_one_row_per_record() {
        let table = flatten(&sample()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["decedent_info.Name"], "JOHN SMITH");
        assert_eq!(table.rows[0]["fiduciary_info.Name"], "MARY SMITH");
        assert_eq!(table.rows[1]["url"], "https://court.test/case/2");
    }

    #[test]
    fn test_every_row_has_the_column_union() {
        let table = flatten(&sample()).unwrap();
        let expected: HashSet<&str> = [
            "decedent_info.Name",
            "decedent_info.City",
            "decedent_info.Date of Death",
            "url",
            "fiduciary_info.Name",
            "fiduciary_info.Telephone",
        ]
        .into_iter()
        .collect();

        for row in &table.rows {
            let keys: HashSet<&str> = row.keys().map(String::as_str).collect();
            assert_eq!(keys, expected);
        }
        assert_eq!(table.rows[1]["fiduciary_info.Telephone"], Value::Null);
        assert_eq!(table.rows[0]["decedent_info.Date of Death"], Value::Null);
    }

    #[test]
    fn test_column_order_decedent_shared_fiduciary() {
        let records = vec![record("u1", &[("Name", "A")], &[("Name", "B")]).with_county("Warren")];
        let table = flatten(&records).unwrap();
        assert_eq!(
            table.columns,
            vec!["decedent_info.Name", "url", "county", "fiduciary_info.Name"]
        );
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let records = sample();
        assert_eq!(flatten(&records).unwrap(), flatten(&records).unwrap());
    }

    #[test]
    fn test_duplicate_urls_stay_one_to_one() {
        let records = vec![
            record("same", &[("Name", "A")], &[("Name", "FA")]),
            record("same", &[("Name", "B")], &[("Name", "FB")]),
        ];
        let table = flatten(&records).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["fiduciary_info.Name"], "FA");
        assert_eq!(table.rows[1]["fiduciary_info.Name"], "FB");
    }

    #[test]
    fn test_partial_county_renders_null() {
        let records = vec![
            record("u1", &[], &[]).with_county("Butler"),
            record("u2", &[], &[]),
        ];
        let table = flatten(&records).unwrap();
        assert_eq!(table.rows[0]["county"], "Butler");
        assert_eq!(table.rows[1]["county"], Value::Null);
    }

    #[test]
    fn test_diverging_key_is_reported() {
        let records = sample();
        let shared = shared_columns(&records);
        let left: Vec<Projection> = records
            .iter()
            .map(|r| project(r, &shared, &r.decedent_info, DECEDENT_PREFIX))
            .collect();
        let mut right: Vec<Projection> = records
            .iter()
            .map(|r| project(r, &shared, &r.fiduciary_info, FIDUCIARY_PREFIX))
            .collect();
        right[1].key = vec![Some("https://court.test/elsewhere".to_string())];

        let err = join(&records, &shared, &left, &right).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::JoinKeyMismatch {
                record: 1,
                url: "https://court.test/case/2".to_string()
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        let table = flatten(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_records_follow_column_order() {
        let table = flatten(&sample()).unwrap();
        let records = table.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].as_object().unwrap().len(), table.columns.len());
    }

    #[test]
    fn test_extend_widens_columns() {
        let mut butler = flatten(&[record("u1", &[("Name", "A")], &[]).with_county("Butler")]).unwrap();
        let warren = flatten(&[record("u2", &[("Case", "2024 ES 1")], &[]).with_county("Warren")]).unwrap();
        butler.extend(warren);

        assert_eq!(butler.len(), 2);
        assert_eq!(butler.rows[0]["decedent_info.Case"], Value::Null);
        assert_eq!(butler.rows[1]["decedent_info.Name"], Value::Null);
        assert_eq!(butler.rows[1]["county"], "Warren");
    }

    #[test]
    fn test_from_rows_and_set() {
        let rows: Vec<FlattenedRow> = vec![
            serde_json::from_str(r#"{"url": "u1", "decedent_info.Name": "A"}"#).unwrap(),
            serde_json::from_str(r#"{"url": "u2", "county": "Warren"}"#).unwrap(),
        ];
        let mut table = FlattenedTable::from_rows(rows);
        assert_eq!(table.columns, vec!["url", "decedent_info.Name", "county"]);
        assert_eq!(table.rows[1]["decedent_info.Name"], Value::Null);

        table.set(0, "relative_1_phone_number_1", Value::from("513-555-0100"));
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows[0]["relative_1_phone_number_1"], "513-555-0100");
        assert_eq!(table.rows[1]["relative_1_phone_number_1"], Value::Null);
    }
}

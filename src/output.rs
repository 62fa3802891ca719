use crate::error::Result;
use crate::normalize::{FlattenedRow, FlattenedTable};
use chrono::NaiveDate;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// `09-03-2024` for a single day, `09-01-2024_to_09-07-2024` for a range.
pub fn file_stem(start: NaiveDate, end: NaiveDate) -> String {
    let start_s = start.format("%m-%d-%Y").to_string();
    if start == end {
        start_s
    } else {
        format!("{}_to_{}", start_s, end.format("%m-%d-%Y"))
    }
}

/// Write the table as a JSON array of records, columns in table order.
pub fn write_json(table: &FlattenedTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json_content = serde_json::to_string_pretty(&table.records())?;
    fs::write(path, json_content)?;
    info!("💾 Saved {} records to {}", table.len(), path.display());
    Ok(())
}

/// Read back a JSON records file written by [`write_json`].
pub fn read_json(path: &Path) -> Result<FlattenedTable> {
    let content = fs::read_to_string(path)?;
    let rows: Vec<FlattenedRow> = serde_json::from_str(&content)?;
    Ok(FlattenedTable::from_rows(rows))
}

/// Write `<dir>/<stem>.json`, plus `<stem>.csv` when asked. Returns the paths written.
pub fn persist(table: &FlattenedTable, dir: &Path, stem: &str, with_csv: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let json_path = dir.join(format!("{}.json", stem));
    write_json(table, &json_path)?;
    let mut written = vec![json_path];

    if with_csv {
        let csv_path = dir.join(format!("{}.csv", stem));
        let file = fs::File::create(&csv_path)?;
        write_csv(io::BufWriter::new(file), table)?;
        info!("💾 Saved CSV to {}", csv_path.display());
        written.push(csv_path);
    }
    Ok(written)
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_row<W: Write>(w: &mut W, cells: impl Iterator<Item = String>) -> io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            write!(w, ",")?;
        }
        first = false;
        if needs_quotes(&cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Header line then one line per row; nulls are empty cells.
pub fn write_csv<W: Write>(mut w: W, table: &FlattenedTable) -> Result<()> {
    write_row(&mut w, table.columns.iter().cloned())?;
    for row in &table.rows {
        write_row(&mut w, table.columns.iter().map(|c| cell_text(row.get(c))))?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> FlattenedTable {
        let rows: Vec<FlattenedRow> = vec![
            serde_json::from_value(json!({
                "decedent_info.Name": "DOE, JANE",
                "url": "https://court.test/1",
                "fiduciary_info.Telephone": null
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "decedent_info.Name": "Said \"Red\" Lee",
                "url": "https://court.test/2",
                "fiduciary_info.Telephone": "513-555-0100"
            }))
            .unwrap(),
        ];
        FlattenedTable::from_rows(rows)
    }

    #[test]
    fn test_file_stem() {
        let d = NaiveDate::from_ymd_opt(2024, 9, 3).unwrap();
        let e = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        assert_eq!(file_stem(d, d), "09-03-2024");
        assert_eq!(file_stem(d, e), "09-03-2024_to_09-10-2024");
    }

    #[test]
    fn test_csv_quoting_and_nulls() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "decedent_info.Name,url,fiduciary_info.Telephone");
        assert_eq!(lines[1], "\"DOE, JANE\",https://court.test/1,");
        assert_eq!(lines[2], "\"Said \"\"Red\"\" Lee\",https://court.test/2,513-555-0100");
    }

    #[test]
    fn test_persist_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let written = persist(&table(), dir.path(), "09-03-2024", true).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[1].ends_with("09-03-2024.csv"));

        let back = read_json(&written[0]).unwrap();
        assert_eq!(back, table());
    }
}

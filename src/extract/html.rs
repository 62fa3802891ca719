use super::fields::{LabelCell, TableRow};
use crate::error::{Result, ScraperError};
use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Parse(format!("bad selector '{}': {:?}", css, e)))
}

/// Concatenated text of an element, trimmed (including `&nbsp;`).
pub fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn select_first<'a>(root: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>> {
    Ok(root.select(&selector(css)?).next())
}

pub fn select_first_in<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>> {
    Ok(document.select(&selector(css)?).next())
}

/// Rows of a `th.column1 | td.column2 | th.column3 | td.column4` table.
pub fn rows_from_column_table(table: ElementRef) -> Result<Vec<TableRow>> {
    let tr = selector("tr")?;
    let columns = [
        (selector("th.column1")?, selector("td.column2")?),
        (selector("th.column3")?, selector("td.column4")?),
    ];

    let rows = table
        .select(&tr)
        .map(|row| {
            let cells = columns
                .iter()
                .map(|(label, value)| LabelCell {
                    label: row.select(label).next().map(raw_text),
                    value: row.select(value).next().map(text_of),
                })
                .collect();
            TableRow::new(cells)
        })
        .collect();
    Ok(rows)
}

/// `<b>Label:</b> value` pairs inside the `td.back-lt` cells of a row.
///
/// Only the row's own cells are read, not those of nested rows. The value
/// is the text node right after the `<b>`; anything else there leaves the
/// field out.
pub fn rows_from_bold_labels(row: ElementRef) -> Result<Vec<TableRow>> {
    let bold = selector("b")?;
    let cells = row.children().filter_map(ElementRef::wrap).filter(|td| {
        td.value().name() == "td" && td.value().classes().any(|c| c == "back-lt")
    });

    let mut rows = Vec::new();
    for td in cells {
        for b in td.select(&bold) {
            let label = b
                .text()
                .collect::<String>()
                .trim_matches(|c: char| c == ':' || c == ' ')
                .to_string();
            let value = b
                .next_sibling()
                .and_then(|node| node.value().as_text().map(|t| t.trim().to_string()));
            rows.push(TableRow::new(vec![LabelCell {
                label: Some(label),
                value,
            }]));
        }
    }
    Ok(rows)
}

// Labels keep their `&nbsp;` so placeholder cells stay recognisable.
fn raw_text(element: ElementRef) -> String {
    element.text().collect()
}

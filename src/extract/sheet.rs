//! Spreadsheet text via `calamine` (XLSX, XLS, and anything else it sniffs).
//!
//! Each sheet becomes a `--- Sheet: {name} ---` heading followed by an
//! aligned text table whose first row is the header.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::{NaiveDateTime, Timelike};

use super::ExtractError;

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let mut text = String::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExtractError::Spreadsheet(format!("sheet '{name}': {e}")))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        text.push_str(&format!("--- Sheet: {name} ---\n"));
        text.push_str(&render_table(&rows));
        text.push_str("\n\n");
    }
    Ok(text)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::DateTime(dt) if dt.is_duration() => cell.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => date_text(dt),
            None => cell
                .as_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| cell.to_string()),
        },
        other => other.to_string(),
    }
}

/// `2023-07-16` at midnight, `2023-07-16 09:30:00` otherwise.
fn date_text(dt: NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Right-aligned columns separated by a single space, one line per row.
pub(super) fn render_table(rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(empty sheet)".to_string();
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    format!("{cell:>w$}")
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// src/ingest/reader.rs
//! Raw table readers: CSV (primary) and spreadsheet workbooks (fallback).
//!
//! Both return `(header, rows)` with trimmed cells; rows with only empty cells are skipped.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

pub type RawTable = (Vec<String>, Vec<Vec<String>>);

pub fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {} as csv", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .context("reading csv header")?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    ensure_header(&header)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("reading csv row")?;
        // short rows are padded later; extra cells would shift data into the wrong column
        if record.len() > header.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(anyhow!(
                "line {line}: {} fields, header has {}",
                record.len(),
                header.len()
            ));
        }
        let values: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
        if values.iter().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(values);
    }
    Ok((header, rows))
}

/// First worksheet of any workbook calamine understands (xlsx, xls, ods).
pub fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening {} as workbook", path.display()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading worksheet '{sheet}'"))?;

    let mut it = range.rows();
    let header: Vec<String> = it
        .next()
        .ok_or_else(|| anyhow!("worksheet '{sheet}' is empty"))?
        .iter()
        .map(cell_to_string)
        .collect();
    ensure_header(&header)?;

    let rows = it
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|values| values.iter().any(|v| !v.is_empty()))
        .collect();
    Ok((header, rows))
}

fn ensure_header(header: &[String]) -> Result<()> {
    if header.iter().all(|h| h.is_empty()) {
        return Err(anyhow!("no header row"));
    }
    Ok(())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => ndt.date().to_string(),
            Some(ndt) => ndt.to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string().trim().to_string(),
    }
}

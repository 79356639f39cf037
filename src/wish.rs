//! Wish files: a sheet of tickets with `Num1..Num6` columns.
//!
//! The sheet is read whole, every row is checked, and the file is replaced
//! with `Result`/`Details` filled in. `.xlsx` files go through calamine and
//! rust_xlsxwriter, anything else is treated as CSV.

use crate::matcher::{CandidateSet, Draw, TierSummary, summarize};
use crate::reports::{SummaryFormat, format_summary};
use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

pub const RESULT_COLUMN: &str = "Result";
pub const DETAILS_COLUMN: &str = "Details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishFormat {
    Csv,
    Xlsx,
}

impl WishFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => WishFormat::Xlsx,
            _ => WishFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn from_xlsx(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Header plus data rows. Rows are never wider than the header.
#[derive(Debug)]
struct Sheet {
    name: Option<String>,
    /// Top-left cell of the used range; `(0, 0)` for CSV.
    origin: (u32, u16),
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    fn column_or_append(&mut self, name: &str) -> usize {
        self.column(name).unwrap_or_else(|| {
            self.headers.push(name.to_string());
            self.headers.len() - 1
        })
    }
}

fn read_csv_sheet(path: &Path) -> Result<Sheet> {
    // Not flexible: a row wider than the header would lose cells on rewrite.
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("wish row {}: unreadable", i + 1))?;
        rows.push(record.iter().map(|f| Cell::Text(f.to_string())).collect());
    }

    Ok(Sheet {
        name: None,
        origin: (0, 0),
        headers,
        rows,
    })
}

fn read_xlsx_sheet(path: &Path) -> Result<Sheet> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("cannot open {}", path.display()))?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("{}: workbook has no sheets", path.display()))?;
    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("{}: cannot read sheet {}", path.display(), name))?;

    let origin = match range.start() {
        Some((row, col)) => (row, u16::try_from(col).context("sheet starts past the last column")?),
        None => (0, 0),
    };

    let mut cells = range.rows();
    let headers: Vec<String> = cells
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Cell>> = cells
        .map(|row| row.iter().map(Cell::from_xlsx).collect())
        .collect();

    Ok(Sheet {
        name: Some(name),
        origin,
        headers,
        rows,
    })
}

fn write_csv_sheet(sheet: &Sheet, out: &mut NamedTempFile) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx_sheet(sheet: &Sheet, out: &mut NamedTempFile) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = &sheet.name {
        worksheet.set_name(name)?;
    }

    let (top, left) = sheet.origin;
    let position = |row: usize, col: usize| -> Result<(u32, u16)> {
        let row = u32::try_from(row)
            .ok()
            .and_then(|r| r.checked_add(top))
            .context("too many rows")?;
        let col = u16::try_from(col)
            .ok()
            .and_then(|c| c.checked_add(left))
            .context("too many columns")?;
        Ok((row, col))
    };

    for (c, header) in sheet.headers.iter().enumerate() {
        let (row, col) = position(0, c)?;
        worksheet.write_string(row, col, header)?;
    }
    for (r, cells) in sheet.rows.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            let (row, col) = position(r + 1, c)?;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    out.write_all(&workbook.save_to_buffer()?)?;
    Ok(())
}

/// Writes next to `path` and renames over it, so a failed write leaves the old file.
fn replace_sheet(path: &Path, format: WishFormat, sheet: &Sheet) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut out = NamedTempFile::new_in(dir)
        .with_context(|| format!("cannot create a temporary file in {}", dir.display()))?;

    match format {
        WishFormat::Csv => write_csv_sheet(sheet, &mut out)?,
        WishFormat::Xlsx => write_xlsx_sheet(sheet, &mut out)?,
    }

    out.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct WishOutcome {
    /// 1-based data row, header excluded.
    pub row: usize,
    pub candidate: CandidateSet,
    pub summary: TierSummary,
    pub result: String,
    pub details: String,
}

/// Checks every wish row against `draws` and rewrites the file with
/// `Result`/`Details` filled in. Other columns are kept as they were.
/// Blank rows are carried over unchecked. Any bad row aborts before writing.
pub fn check_wish_file(
    path: &Path,
    draws: &[Draw],
    format: &SummaryFormat,
) -> Result<Vec<WishOutcome>> {
    let file_format = WishFormat::from_path(path);
    let mut sheet = match file_format {
        WishFormat::Csv => read_csv_sheet(path)?,
        WishFormat::Xlsx => read_xlsx_sheet(path)?,
    };

    let number_columns = (1..=6)
        .map(|i| {
            let name = format!("Num{}", i);
            sheet
                .column(&name)
                .with_context(|| format!("{}: missing column {}", path.display(), name))
        })
        .collect::<Result<Vec<_>>>()?;
    let result_idx = sheet.column_or_append(RESULT_COLUMN);
    let details_idx = sheet.column_or_append(DETAILS_COLUMN);
    let width = sheet.headers.len();

    let mut outcomes = Vec::new();
    for (i, cells) in sheet.rows.iter_mut().enumerate() {
        let row = i + 1;
        if cells.iter().all(Cell::is_blank) {
            continue;
        }

        let numbers = number_columns
            .iter()
            .map(|&idx| {
                let cell = cells.get(idx);
                cell.and_then(Cell::as_integer).with_context(|| {
                    let raw = cell.map(Cell::to_string).unwrap_or_default();
                    format!("wish row {}: '{}' is not a number", row, raw)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let candidate = CandidateSet::new(numbers)
            .with_context(|| format!("wish row {}: invalid numbers", row))?;

        let summary = summarize(&candidate, draws);
        let (result, details) = format_summary(&summary, format);

        if cells.len() < width {
            cells.resize(width, Cell::Empty);
        }
        cells[result_idx] = Cell::Text(result.clone());
        cells[details_idx] = Cell::Text(details.clone());

        outcomes.push(WishOutcome {
            row,
            candidate,
            summary,
            result,
            details,
        });
    }

    replace_sheet(path, file_format, &sheet)?;

    info!(path = %path.display(), rows = outcomes.len(), "updated wish file");
    Ok(outcomes)
}

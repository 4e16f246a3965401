/// In-memory workbook access
///
/// Uploaded workbooks never touch the filesystem: the raw bytes are handed to
/// calamine through a cursor and every sheet is materialized up front, so the
/// rest of the pipeline works on plain grids.
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::conversion_error::ConversionError;

/// Latest serial Excel can represent (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const TEXT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];
const TEXT_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// A named sheet and its cells
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    range: Range<Data>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    /// Cell at an absolute (row, col) position; `None` outside the used area
    pub fn cell(&self, row: usize, col: usize) -> Option<&Data> {
        let row = u32::try_from(row).ok()?;
        let col = u32::try_from(col).ok()?;
        self.range.get_value((row, col))
    }

    /// Number of rows counted from row 0, including leading empty rows
    pub fn height(&self) -> usize {
        self.range.end().map(|(row, _)| row as usize + 1).unwrap_or(0)
    }

    /// Number of columns counted from column 0
    pub fn width(&self) -> usize {
        self.range.end().map(|(_, col)| col as usize + 1).unwrap_or(0)
    }

    /// Trimmed text of a label cell, `None` if blank or `nan`
    pub fn label(&self, row: usize, col: usize) -> Option<String> {
        let text = match self.cell(row, col)? {
            Data::String(s) => s.trim().to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
            Data::Float(f) => f.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTimeIso(s) => s.trim().to_string(),
            _ => return None,
        };

        if crate::readings::value::is_missing_marker(&text) {
            None
        } else {
            Some(text)
        }
    }

    /// Parse a date cell, `None` when the cell does not hold a recognizable date
    pub fn date(&self, row: usize, col: usize) -> Option<NaiveDate> {
        self.cell(row, col).and_then(parse_date_cell)
    }
}

/// A workbook whose sheets have all been read into memory
#[derive(Debug, Clone, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<SheetGrid>,
}

impl RawWorkbook {
    /// Read an `.xlsx` or `.xls` workbook from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConversionError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ConversionError::WorkbookOpen(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        debug!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ConversionError::WorkbookOpen(format!("sheet '{name}': {e}")))?;
            sheets.push(SheetGrid::new(name, range));
        }

        info!("Loaded workbook with {} sheets ({} bytes)", sheets.len(), bytes.len());
        Ok(Self { sheets })
    }

    pub fn from_sheets(sheets: Vec<SheetGrid>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Interpret a cell as a calendar date
///
/// Accepts typed date cells, Excel serial numbers and the textual formats
/// the sampling sheets are authored with. Time of day is dropped.
pub fn parse_date_cell(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(excel_date) => excel_date
            .as_datetime()
            .map(|dt| dt.date())
            .or_else(|| excel_serial_to_date(excel_date.as_f64())),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    TEXT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            TEXT_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch: 1899-12-30 (adjusted for Excel's off-by-one bug)
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial as i64))
}

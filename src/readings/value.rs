use calamine::Data;
use serde::{Serialize, Serializer};

/// Marker written for any measurement that was not reported
pub const NOT_REPORTED: &str = "NR";

/// Tokens the source sheets use for "no value", compared case-insensitively
/// after trimming. Mirrors the NA set of the pandas-based tooling the sheets
/// are exchanged with.
const MISSING_MARKERS: [&str; 17] = [
    "-",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "1.#IND",
    "1.#QNAN",
    "<NA>",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "None",
    "nan",
    "null",
];

/// Largest magnitude at which every integral f64 is exactly representable
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single measurement cell after normalization
///
/// Spreadsheet cells arrive as numbers, numeric text, dashes, blanks or free
/// text; each is folded into one of three cases.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Normalize a raw calamine cell. Never fails; anything that cannot be
    /// coerced into a number passes through as text.
    pub fn from_cell(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Missing,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => Self::from_number(*f),
            Data::String(s) => Self::from_text(s),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => CellValue::Text(datetime.to_string()),
                None => Self::from_number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }

    /// Normalize an optional cell, treating cells outside the sheet as missing
    pub fn from_optional_cell(cell: Option<&Data>) -> Self {
        cell.map(Self::from_cell).unwrap_or(CellValue::Missing)
    }

    pub fn from_number(value: f64) -> Self {
        if value.is_finite() {
            CellValue::Number(value)
        } else {
            CellValue::Missing
        }
    }

    /// Normalize free text: blanks and NA tokens are not reported, finite
    /// numeric text becomes a number, anything else is kept verbatim.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_marker(trimmed) {
            return CellValue::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => CellValue::Number(number),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// Whether trimmed text stands for "no value" in the source sheets
pub fn is_missing_marker(trimmed: &str) -> bool {
    trimmed.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|marker| marker.eq_ignore_ascii_case(trimmed))
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Missing => serializer.serialize_str(NOT_REPORTED),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

use chrono::NaiveDate;
use serde::Serialize;

use super::value::CellValue;

/// One main-readings row: a site's analytes on one sampling date
#[derive(Debug, Clone, PartialEq)]
pub struct MainObservation {
    pub date: NaiveDate,
    pub site: String,
    pub nitrate: CellValue,
    pub phosphate: CellValue,
    pub phosphorus: CellValue,
}

/// One E. coli row. Reshaping only emits rows with a reported value.
#[derive(Debug, Clone, PartialEq)]
pub struct EcoliObservation {
    pub date: NaiveDate,
    pub site: String,
    pub ecoli: CellValue,
}

/// A main observation with its nearest-date E. coli value attached
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub site: String,
    pub nitrate: CellValue,
    pub phosphate: CellValue,
    pub phosphorus: CellValue,
    pub ecoli: CellValue,
}

impl MergedRecord {
    pub fn from_main(observation: MainObservation, ecoli: CellValue) -> Self {
        Self {
            date: observation.date,
            site: observation.site,
            nitrate: observation.nitrate,
            phosphate: observation.phosphate,
            phosphorus: observation.phosphorus,
            ecoli,
        }
    }
}

// Output DTO, field order is the JSON key order
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub date: String,
    pub river: String,
    pub nitrate: CellValue,
    pub phosphate: CellValue,
    pub phosphorus: CellValue,
    pub ecoli: CellValue,
}

impl From<MergedRecord> for OutputRecord {
    fn from(record: MergedRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            river: record.site,
            nitrate: record.nitrate,
            phosphate: record.phosphate,
            phosphorus: record.phosphorus,
            ecoli: record.ecoli,
        }
    }
}

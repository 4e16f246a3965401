use tracing::{debug, info, instrument};

use super::classifier::WorkbookRole;
use super::layout::{reshape_ecoli_sheet, reshape_main_sheet};
use super::reporting_period::ReportingPeriod;
use super::workbook::{RawWorkbook, SheetGrid};
use crate::conversion_error::ConversionError;
use crate::readings::{EcoliObservation, MainObservation};

/// Sheets of the workbook that belong to the reporting period, in workbook order
pub fn select_sheets<'a>(
    workbook: &'a RawWorkbook,
    period: &ReportingPeriod,
    role: WorkbookRole,
) -> Result<Vec<&'a SheetGrid>, ConversionError> {
    let selected: Vec<&SheetGrid> = workbook
        .sheets
        .iter()
        .filter(|sheet| {
            let matches = period.matches(&sheet.name);
            if !matches {
                debug!("Skipping sheet '{}': outside reporting period", sheet.name);
            }
            matches
        })
        .collect();

    if selected.is_empty() {
        return Err(ConversionError::NoMatchingSheets {
            role,
            years: period.to_string(),
        });
    }

    Ok(selected)
}

/// Reshape every selected sheet with `reshape` and concatenate the results
fn aggregate<T>(
    workbook: &RawWorkbook,
    period: &ReportingPeriod,
    role: WorkbookRole,
    reshape: impl Fn(&SheetGrid) -> Result<Vec<T>, ConversionError>,
) -> Result<Vec<T>, ConversionError> {
    let sheets = select_sheets(workbook, period, role)?;

    let mut all_rows = Vec::new();
    for sheet in &sheets {
        let mut rows = reshape(sheet)?;
        info!("Parsed {} {} rows from sheet '{}'", rows.len(), role, sheet.name);
        all_rows.append(&mut rows);
    }

    info!(
        "Parsed {} sheets, total {} {} rows",
        sheets.len(),
        all_rows.len(),
        role
    );
    Ok(all_rows)
}

#[instrument(skip(workbook))]
pub fn aggregate_main(
    workbook: &RawWorkbook,
    period: &ReportingPeriod,
) -> Result<Vec<MainObservation>, ConversionError> {
    aggregate(workbook, period, WorkbookRole::Main, reshape_main_sheet)
}

#[instrument(skip(workbook))]
pub fn aggregate_ecoli(
    workbook: &RawWorkbook,
    period: &ReportingPeriod,
) -> Result<Vec<EcoliObservation>, ConversionError> {
    aggregate(workbook, period, WorkbookRole::Ecoli, reshape_ecoli_sheet)
}

use std::fmt;

use tracing::{debug, info, warn};

use super::workbook::RawWorkbook;
use crate::conversion_error::ConversionError;

/// Substring that marks the E. coli workbook's sheets
const ECOLI_SHEET_MARKER: &str = "coli";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkbookRole {
    /// Nitrate / phosphate / phosphorus readings
    Main,
    Ecoli,
}

impl fmt::Display for WorkbookRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbookRole::Main => write!(f, "main readings"),
            WorkbookRole::Ecoli => write!(f, "E. coli"),
        }
    }
}

/// Decide a workbook's role from its sheet names alone
pub fn classify(workbook: &RawWorkbook) -> WorkbookRole {
    let ecoli_sheet = workbook
        .sheet_names()
        .find(|name| name.to_lowercase().contains(ECOLI_SHEET_MARKER));

    match ecoli_sheet {
        Some(name) => {
            debug!("Sheet '{}' marks an E. coli workbook", name);
            WorkbookRole::Ecoli
        }
        None => WorkbookRole::Main,
    }
}

/// Order two workbooks as (main, E. coli), whichever order they arrived in
pub fn assign_roles(
    first: RawWorkbook,
    second: RawWorkbook,
) -> Result<(RawWorkbook, RawWorkbook), ConversionError> {
    let first_role = classify(&first);
    let second_role = classify(&second);

    if first_role == second_role {
        warn!("Both workbooks classified as {}", first_role);
        return Err(ConversionError::AmbiguousInput { role: first_role });
    }

    info!(
        "Classified workbooks: first = {}, second = {}",
        first_role, second_role
    );

    match first_role {
        WorkbookRole::Main => Ok((first, second)),
        WorkbookRole::Ecoli => Ok((second, first)),
    }
}

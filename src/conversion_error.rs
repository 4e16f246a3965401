use crate::importers::WorkbookRole;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Cannot tell the two workbooks apart: both look like {role} workbooks")]
    AmbiguousInput { role: WorkbookRole },

    #[error("No sheet in the {role} workbook matches the reporting period ({years})")]
    NoMatchingSheets { role: WorkbookRole, years: String },

    #[error("Malformed layout in sheet '{sheet}': {reason}")]
    MalformedLayout { sheet: String, reason: String },

    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Failed to serialize readings: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conversion failed: {0}")]
    Failed(String),
}

impl ConversionError {
    pub fn malformed(sheet: &str, reason: impl Into<String>) -> Self {
        ConversionError::MalformedLayout {
            sheet: sheet.to_string(),
            reason: reason.into(),
        }
    }
}

use tracing::debug;

use crate::conversion_error::ConversionError;
use crate::readings::{MergedRecord, OutputRecord};

/// Sort merged records by (date, site) and render them as a JSON array
///
/// The sort is stable, so duplicate (date, site) pairs keep merge order and
/// identical input always renders to identical text.
pub fn render_json(records: Vec<MergedRecord>) -> Result<String, ConversionError> {
    let mut output: Vec<OutputRecord> = records.into_iter().map(OutputRecord::from).collect();
    output.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.river.cmp(&b.river)));

    debug!("Rendering {} records", output.len());
    Ok(serde_json::to_string_pretty(&output)?)
}

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, info, instrument};

use crate::conversion_error::ConversionError;
use crate::importers::{aggregate_ecoli, aggregate_main, assign_roles, RawWorkbook, ReportingPeriod};
use crate::merge::merge_nearest;
use crate::serializer::render_json;

/// Converts a pair of uploaded workbooks into the merged JSON readings
///
/// Stateless apart from its reporting period; one instance can serve any
/// number of concurrent sessions.
#[derive(Debug, Clone, Default)]
pub struct ConversionService {
    reporting_period: ReportingPeriod,
}

impl ConversionService {
    pub fn new(reporting_period: ReportingPeriod) -> Self {
        Self { reporting_period }
    }

    /// Convert two workbooks, given in any order, into a JSON array
    ///
    /// Either returns the complete JSON text or a single error; unexpected
    /// failures inside the pipeline surface as `ConversionError::Failed`.
    #[instrument(skip_all, fields(first_bytes = first.len(), second_bytes = second.len()))]
    pub fn convert(&self, first: &[u8], second: &[u8]) -> Result<String, ConversionError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(first, second)));

        match outcome {
            Ok(Ok(json)) => {
                info!("Conversion succeeded ({} bytes of JSON)", json.len());
                Ok(json)
            }
            Ok(Err(e)) => {
                error!("Conversion failed: {}", e);
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Conversion aborted unexpectedly: {}", message);
                Err(ConversionError::Failed(message))
            }
        }
    }

    fn run_pipeline(&self, first: &[u8], second: &[u8]) -> Result<String, ConversionError> {
        let first = RawWorkbook::from_bytes(first)?;
        let second = RawWorkbook::from_bytes(second)?;
        let (main_workbook, ecoli_workbook) = assign_roles(first, second)?;

        let main = aggregate_main(&main_workbook, &self.reporting_period)?;
        let ecoli = aggregate_ecoli(&ecoli_workbook, &self.reporting_period)?;
        info!(
            "Reshaped {} main observations and {} E. coli observations",
            main.len(),
            ecoli.len()
        );

        let merged = merge_nearest(main, ecoli);
        render_json(merged)
    }
}

/// Convert two workbooks using the default reporting period
pub fn convert(first: &[u8], second: &[u8]) -> Result<String, ConversionError> {
    ConversionService::default().convert(first, second)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}

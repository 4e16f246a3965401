pub mod conversion_service;

pub use conversion_service::{convert, ConversionService};

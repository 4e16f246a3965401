pub mod api;
pub mod app;
pub mod config;
pub mod conversion_error;
pub mod importers;
pub mod merge;
pub mod readings;
pub mod serializer;
pub mod services;
pub mod uploads;

pub use conversion_error::ConversionError;
pub use services::convert;

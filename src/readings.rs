// Measurement types shared by the importers, the merger and the serializer

pub mod models;
pub mod value;

pub use models::{EcoliObservation, MainObservation, MergedRecord, OutputRecord};
pub use value::{CellValue, NOT_REPORTED};

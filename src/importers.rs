// Workbook importers: load uploaded bytes, classify, and reshape wide sheets

pub mod aggregator;
pub mod classifier;
pub mod layout;
pub mod reporting_period;
pub mod site_names;
pub mod workbook;

// Re-export commonly used items
pub use aggregator::{aggregate_ecoli, aggregate_main};
pub use classifier::{assign_roles, classify, WorkbookRole};
pub use layout::{unpivot, WideTableLayout, ECOLI_LAYOUT, MAIN_LAYOUT};
pub use reporting_period::ReportingPeriod;
pub use workbook::{RawWorkbook, SheetGrid};

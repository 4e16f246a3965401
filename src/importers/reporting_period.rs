use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Years whose sheets make up a report
pub const DEFAULT_REPORTING_YEARS: [u16; 2] = [2024, 2025];

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// The set of year filters used to pick sheets out of a workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingPeriod {
    years: Vec<u16>,
}

impl Default for ReportingPeriod {
    fn default() -> Self {
        Self::new(DEFAULT_REPORTING_YEARS)
    }
}

impl ReportingPeriod {
    pub fn new(years: impl IntoIterator<Item = u16>) -> Self {
        let mut years: Vec<u16> = years.into_iter().collect();
        years.sort_unstable();
        years.dedup();
        Self { years }
    }

    pub fn years(&self) -> &[u16] {
        &self.years
    }

    /// Whether a sheet name carries a 4-digit token for one of the years.
    /// "2024 Data" and "E.coli_2025" match; "20245" and "2023" do not.
    pub fn matches(&self, sheet_name: &str) -> bool {
        digit_runs()
            .find_iter(sheet_name)
            .filter(|token| token.as_str().len() == 4)
            .filter_map(|token| token.as_str().parse::<u16>().ok())
            .any(|year| self.years.contains(&year))
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let years: Vec<String> = self.years.iter().map(u16::to_string).collect();
        write!(f, "{}", years.join(", "))
    }
}

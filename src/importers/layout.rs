/// Blocked wide-table unpivot
///
/// Both source workbooks use the same authoring convention: dates run down
/// one column, a header row names the site above each group ("block") of
/// measurement columns, and an optional second header row labels the
/// analytes inside a block. A `WideTableLayout` describes where those rows
/// and columns sit; `unpivot` turns any such grid into one row per
/// (date, site) pair that has at least one reported value.
///
/// # Main readings sheet
/// ```text
/// Row 0: [ ] | Site A | Site A | Site A | Site B | ...
/// Row 1: [ ] | NO3    | PO4    | P      | NO3    | ...
/// Row 2+:date| value  | value  | value  | value  | ...
/// ```
///
/// # E. coli sheet
/// ```text
/// Row 0: [ ] | Site A | Site B | ...
/// Row 1+:date| value  | value  | ...
/// ```
use chrono::NaiveDate;
use tracing::{debug, warn};

use super::site_names::canonical_site_name;
use super::workbook::SheetGrid;
use crate::conversion_error::ConversionError;
use crate::readings::{CellValue, EcoliObservation, MainObservation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTableLayout {
    /// Row holding the site name above each block
    pub site_row: usize,
    /// Row holding analyte labels, if blocks are found by label
    pub label_row: Option<usize>,
    /// Label that starts a block (compared trimmed, case-insensitively)
    pub block_marker: Option<&'static str>,
    /// Number of value columns per block, starting at the block column
    pub block_width: usize,
    pub data_start_row: usize,
    pub date_col: usize,
}

/// Nitrate / phosphate / phosphorus triplets, one per site
pub const MAIN_LAYOUT: WideTableLayout = WideTableLayout {
    site_row: 0,
    label_row: Some(1),
    block_marker: Some("NO3"),
    block_width: 3,
    data_start_row: 2,
    date_col: 0,
};

/// One E. coli column per site
pub const ECOLI_LAYOUT: WideTableLayout = WideTableLayout {
    site_row: 0,
    label_row: None,
    block_marker: None,
    block_width: 1,
    data_start_row: 1,
    date_col: 0,
};

/// One unpivoted row: a block's values on one date
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    pub date: NaiveDate,
    pub site: String,
    pub values: Vec<CellValue>,
}

impl BlockRow {
    fn value(&self, index: usize) -> CellValue {
        self.values.get(index).cloned().unwrap_or(CellValue::Missing)
    }
}

struct Block {
    column: usize,
    site: String,
}

impl WideTableLayout {
    fn block_starts(&self, grid: &SheetGrid) -> Result<Vec<Block>, ConversionError> {
        let candidate_columns: Vec<usize> = match (self.label_row, self.block_marker) {
            (Some(label_row), Some(marker)) => {
                if label_row >= grid.height() {
                    return Err(ConversionError::malformed(
                        &grid.name,
                        format!("analyte label row {} is missing", label_row + 1),
                    ));
                }

                let columns: Vec<usize> = (0..grid.width())
                    .filter(|&col| col != self.date_col)
                    .filter(|&col| {
                        grid.label(label_row, col)
                            .is_some_and(|label| label.eq_ignore_ascii_case(marker))
                    })
                    .collect();

                if columns.is_empty() {
                    return Err(ConversionError::malformed(
                        &grid.name,
                        format!("no '{}' label found in row {}", marker, label_row + 1),
                    ));
                }
                columns
            }
            _ => (0..grid.width())
                .filter(|&col| col != self.date_col)
                .collect(),
        };

        let blocks = candidate_columns
            .into_iter()
            .filter_map(|column| match grid.label(self.site_row, column) {
                Some(site) => Some(Block { column, site }),
                None => {
                    debug!(
                        "Skipping block at column {} in sheet '{}': no site label",
                        column, grid.name
                    );
                    None
                }
            })
            .collect();

        Ok(blocks)
    }

    /// Rows with a parseable date, in sheet order
    fn date_rows(&self, grid: &SheetGrid) -> Result<Vec<(usize, NaiveDate)>, ConversionError> {
        if grid.height() <= self.data_start_row {
            return Err(ConversionError::malformed(
                &grid.name,
                format!(
                    "expected data from row {}, sheet has {} rows",
                    self.data_start_row + 1,
                    grid.height()
                ),
            ));
        }

        let rows: Vec<(usize, NaiveDate)> = (self.data_start_row..grid.height())
            .filter_map(|row| grid.date(row, self.date_col).map(|date| (row, date)))
            .collect();

        if rows.is_empty() {
            return Err(ConversionError::malformed(
                &grid.name,
                format!("no parseable dates in column {}", self.date_col + 1),
            ));
        }

        let skipped = grid.height() - self.data_start_row - rows.len();
        if skipped > 0 {
            debug!(
                "Skipped {} rows without a date in sheet '{}'",
                skipped, grid.name
            );
        }

        Ok(rows)
    }
}

/// Unpivot a wide grid into one row per (date, site) with any reported value
///
/// Output is ordered by block (left to right), then by date row (top to
/// bottom). Repeated site blocks produce repeated rows.
pub fn unpivot(grid: &SheetGrid, layout: &WideTableLayout) -> Result<Vec<BlockRow>, ConversionError> {
    let dates = layout.date_rows(grid)?;
    let blocks = layout.block_starts(grid)?;

    if blocks.is_empty() {
        warn!("Sheet '{}' has no labelled site columns", grid.name);
    }

    let mut rows = Vec::new();
    for block in &blocks {
        for &(row, date) in &dates {
            let values: Vec<CellValue> = (block.column..block.column + layout.block_width)
                .map(|col| CellValue::from_optional_cell(grid.cell(row, col)))
                .collect();

            if values.iter().all(CellValue::is_missing) {
                continue;
            }

            rows.push(BlockRow {
                date,
                site: block.site.clone(),
                values,
            });
        }
    }

    debug!(
        "Unpivoted sheet '{}': {} blocks x {} dates -> {} rows",
        grid.name,
        blocks.len(),
        dates.len(),
        rows.len()
    );
    Ok(rows)
}

/// Reshape one main readings sheet
pub fn reshape_main_sheet(grid: &SheetGrid) -> Result<Vec<MainObservation>, ConversionError> {
    let rows = unpivot(grid, &MAIN_LAYOUT)?;
    Ok(rows
        .into_iter()
        .map(|row| MainObservation {
            nitrate: row.value(0),
            phosphate: row.value(1),
            phosphorus: row.value(2),
            date: row.date,
            site: row.site,
        })
        .collect())
}

/// Reshape one E. coli sheet, with site labels canonicalized
pub fn reshape_ecoli_sheet(grid: &SheetGrid) -> Result<Vec<EcoliObservation>, ConversionError> {
    let rows = unpivot(grid, &ECOLI_LAYOUT)?;
    Ok(rows
        .into_iter()
        .map(|row| EcoliObservation {
            ecoli: row.value(0),
            date: row.date,
            site: canonical_site_name(&row.site).to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Range};

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn grid(name: &str, cells: &[&[Data]]) -> SheetGrid {
        let rows = cells.len() as u32;
        let cols = cells.iter().map(|row| row.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows - 1, cols - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        SheetGrid::new(name, range)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_main_sheet_triplets() {
        let sheet = grid(
            "2024",
            &[
                &[text("Date"), text("River A"), text("River A"), text("River A")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P")],
                &[text("2024-01-01"), Data::Float(1.5), text("-"), Data::Float(0.0)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].site, "River A");
        assert_eq!(rows[0].date, date(2024, 1, 1));
        assert_eq!(rows[0].nitrate, CellValue::Number(1.5));
        assert_eq!(rows[0].phosphate, CellValue::Missing);
        assert_eq!(rows[0].phosphorus, CellValue::Number(0.0));
    }

    #[test]
    fn test_main_sheet_marker_is_case_and_space_insensitive() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A"), Data::Empty, Data::Empty],
                &[Data::Empty, text(" no3 "), text("PO4"), text("P")],
                &[text("2024-01-01"), Data::Float(2.0), Data::Empty, Data::Empty],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nitrate, CellValue::Number(2.0));
    }

    #[test]
    fn test_rows_without_any_analyte_are_dropped() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A"), text("River A"), text("River A")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P")],
                &[text("2024-01-01"), text("-"), Data::Empty, text(" ")],
                &[text("2024-01-08"), Data::Empty, Data::Empty, Data::Float(0.3)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 1, 8));
        assert_eq!(rows[0].nitrate, CellValue::Missing);
        assert_eq!(rows[0].phosphorus, CellValue::Number(0.3));
    }

    #[test]
    fn test_truncated_block_at_sheet_edge() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A"), text("River A"), text("River A"), text("River B")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P"), text("NO3")],
                &[text("2024-01-01"), Data::Float(1.0), Data::Float(2.0), Data::Float(3.0), Data::Float(4.0)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].site, "River B");
        assert_eq!(rows[1].nitrate, CellValue::Number(4.0));
        assert_eq!(rows[1].phosphate, CellValue::Missing);
        assert_eq!(rows[1].phosphorus, CellValue::Missing);
    }

    #[test]
    fn test_blank_or_nan_site_skips_block() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("nan"), Data::Empty, Data::Empty, Data::Empty],
                &[Data::Empty, text("NO3"), text("PO4"), text("P"), text("NO3")],
                &[text("2024-01-01"), Data::Float(1.0), Data::Float(2.0), Data::Float(3.0), Data::Float(4.0)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unparseable_date_rows_are_skipped() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A")],
                &[Data::Empty, text("NO3")],
                &[text("2024-02-01"), Data::Float(1.0)],
                &[text("Average"), Data::Float(9.9)],
                &[Data::Empty, Data::Float(9.9)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 2, 1));
    }

    #[test]
    fn test_repeated_site_blocks_are_kept() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A"), Data::Empty, Data::Empty, text("River A")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P"), text("NO3")],
                &[text("2024-01-01"), Data::Float(1.0), Data::Empty, Data::Empty, Data::Float(2.0)],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.site == "River A" && r.date == date(2024, 1, 1)));
    }

    #[test]
    fn test_missing_marker_row_is_malformed() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("River A")],
                &[Data::Empty, text("Nitrate")],
                &[text("2024-01-01"), Data::Float(1.0)],
            ],
        );

        let err = reshape_main_sheet(&sheet).unwrap_err();
        match err {
            ConversionError::MalformedLayout { sheet, reason } => {
                assert_eq!(sheet, "2024");
                assert!(reason.contains("NO3"));
            }
            other => panic!("Expected MalformedLayout, got {other:?}"),
        }
    }

    #[test]
    fn test_no_dates_is_malformed() {
        let sheet = grid(
            "2024 coli",
            &[
                &[Data::Empty, text("River A")],
                &[text("n/a"), Data::Float(10.0)],
            ],
        );

        let err = reshape_ecoli_sheet(&sheet).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedLayout { .. }));
        assert!(err.to_string().contains("2024 coli"));
    }

    #[test]
    fn test_header_only_sheet_is_malformed() {
        let sheet = grid("2024", &[&[Data::Empty, text("River A")]]);
        assert!(matches!(
            reshape_main_sheet(&sheet),
            Err(ConversionError::MalformedLayout { .. })
        ));
    }

    #[test]
    fn test_ecoli_sheet_drops_missing_and_canonicalizes() {
        let sheet = grid(
            "2024 E.coli",
            &[
                &[text("Date"), text("Stratford St A"), text("River B")],
                &[text("2024-05-11"), Data::Float(45.0), text("-")],
                &[text("2024-05-18"), Data::Empty, Data::Float(120.0)],
            ],
        );

        let rows = reshape_ecoli_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].site, "Stratford St Andrew");
        assert_eq!(rows[0].date, date(2024, 5, 11));
        assert_eq!(rows[0].ecoli, CellValue::Number(45.0));
        assert_eq!(rows[1].site, "River B");
        assert_eq!(rows[1].date, date(2024, 5, 18));
    }

    #[test]
    fn test_main_sheet_na_tokens_are_not_reported() {
        let sheet = grid(
            "2024",
            &[
                &[Data::Empty, text("A"), text("A"), text("A")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P")],
                &[text("2024-05-10"), Data::Float(1.0), text("N/A"), Data::Empty],
                &[text("2024-05-20"), text("#N/A"), text("NA"), Data::Empty],
                &[text("2024-05-30"), text("null"), text("None"), text("n/a")],
            ],
        );

        let rows = reshape_main_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 5, 10));
        assert_eq!(rows[0].nitrate, CellValue::Number(1.0));
        assert_eq!(rows[0].phosphate, CellValue::Missing);
        assert_eq!(rows[0].phosphorus, CellValue::Missing);
    }

    #[test]
    fn test_ecoli_sheet_na_tokens_are_dropped() {
        let sheet = grid(
            "2024 E.coli",
            &[
                &[text("Date"), text("A")],
                &[text("2024-05-09"), text("N/A")],
                &[text("2024-05-12"), Data::Float(45.0)],
            ],
        );

        let rows = reshape_ecoli_sheet(&sheet).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2024, 5, 12));
        assert_eq!(rows[0].ecoli, CellValue::Number(45.0));
    }

    #[test]
    fn test_na_ecoli_reading_does_not_shadow_nearest_value() {
        let main = grid(
            "2024",
            &[
                &[Data::Empty, text("A"), text("A"), text("A")],
                &[Data::Empty, text("NO3"), text("PO4"), text("P")],
                &[text("2024-05-10"), Data::Float(1.0), text("N/A"), Data::Empty],
                &[text("2024-05-20"), text("#N/A"), text("NA"), Data::Empty],
            ],
        );
        let ecoli = grid(
            "2024 E.coli",
            &[
                &[text("Date"), text("A")],
                &[text("2024-05-09"), text("N/A")],
                &[text("2024-05-12"), Data::Float(45.0)],
            ],
        );

        let merged = crate::merge::merge_nearest(
            reshape_main_sheet(&main).unwrap(),
            reshape_ecoli_sheet(&ecoli).unwrap(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].date, date(2024, 5, 10));
        assert_eq!(merged[0].phosphate, CellValue::Missing);
        assert_eq!(merged[0].ecoli, CellValue::Number(45.0));
    }

    #[test]
    fn test_block_order_then_date_order() {
        let sheet = grid(
            "2024 coli",
            &[
                &[Data::Empty, text("B"), text("A")],
                &[text("2024-01-01"), Data::Float(1.0), Data::Float(2.0)],
                &[text("2024-01-02"), Data::Float(3.0), Data::Float(4.0)],
            ],
        );

        let rows = unpivot(&sheet, &ECOLI_LAYOUT).unwrap();
        let order: Vec<(&str, u32)> = rows
            .iter()
            .map(|r| (r.site.as_str(), chrono::Datelike::day(&r.date)))
            .collect();
        assert_eq!(order, vec![("B", 1), ("B", 2), ("A", 1), ("A", 2)]);
    }
}

// Shared fixtures: builds real .xlsx workbooks in memory in the layouts the
// field teams author (site header row, optional analyte label row, dates in
// the first column).
#![allow(dead_code)]

use rust_xlsxwriter::Workbook;

#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Num(f64),
    Blank,
}

pub use Cell::{Blank, Num, Text};

/// A sheet described row by row
pub struct SheetSpec<'a> {
    pub name: &'a str,
    pub rows: Vec<Vec<Cell<'a>>>,
}

/// Serialize sheets into .xlsx bytes
pub fn workbook_bytes(sheets: &[SheetSpec<'_>]) -> Vec<u8> {
    let mut workbook = Workbook::new();

    for spec in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(spec.name).expect("valid sheet name");

        for (row, cells) in spec.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);
                match cell {
                    Text(s) => {
                        worksheet.write_string(row, col, *s).expect("write string");
                    }
                    Num(n) => {
                        worksheet.write_number(row, col, *n).expect("write number");
                    }
                    Blank => {}
                }
            }
        }
    }

    workbook.save_to_buffer().expect("workbook serializes")
}

/// Main readings sheet: one NO3/PO4/P block per site
pub fn main_sheet<'a>(
    name: &'a str,
    sites: &[&'a str],
    rows: Vec<(Cell<'a>, Vec<Cell<'a>>)>,
) -> SheetSpec<'a> {
    let mut site_row = vec![Text("Date")];
    let mut label_row = vec![Blank];
    for site in sites {
        site_row.extend([Text(*site), Text(*site), Text(*site)]);
        label_row.extend([Text("NO3"), Text("PO4"), Text("P")]);
    }

    let mut grid = vec![site_row, label_row];
    for (date, values) in rows {
        let mut row = vec![date];
        row.extend(values);
        grid.push(row);
    }

    SheetSpec { name, rows: grid }
}

/// E. coli sheet: one column per site
pub fn ecoli_sheet<'a>(
    name: &'a str,
    sites: &[&'a str],
    rows: Vec<(Cell<'a>, Vec<Cell<'a>>)>,
) -> SheetSpec<'a> {
    let mut header = vec![Text("Date")];
    header.extend(sites.iter().map(|site| Text(*site)));

    let mut grid = vec![header];
    for (date, values) in rows {
        let mut row = vec![date];
        row.extend(values);
        grid.push(row);
    }

    SheetSpec { name, rows: grid }
}

/// A typical pair of workbooks: two sites in the main table, one of which
/// also has E. coli readings
pub fn sample_pair() -> (Vec<u8>, Vec<u8>) {
    let main = workbook_bytes(&[main_sheet(
        "2024",
        &["River Alde", "River Deben"],
        vec![
            (
                Text("2024-03-01"),
                vec![Num(1.2), Text("-"), Num(0.0), Num(3.4), Num(0.5), Blank],
            ),
            (
                Text("2024-03-15"),
                vec![Num(5.0), Num(0.25), Num(0.1), Blank, Blank, Blank],
            ),
        ],
    )]);

    let ecoli = workbook_bytes(&[ecoli_sheet(
        "2024 E.coli",
        &["River Alde"],
        vec![
            (Text("2024-03-02"), vec![Num(45.0)]),
            (Text("2024-03-14"), vec![Num(120.5)]),
        ],
    )]);

    (main, ecoli)
}

use std::path::PathBuf;

use clap::Parser;
use river_readings_service::config::parse_reporting_years;
use river_readings_service::importers::{classify, RawWorkbook, ReportingPeriod, WorkbookRole};
use river_readings_service::importers::layout::{reshape_ecoli_sheet, reshape_main_sheet};

#[derive(Parser)]
#[command(name = "examine-workbook")]
#[command(about = "Show how a readings workbook will be classified and reshaped", long_about = None)]
struct Cli {
    /// Path to an .xlsx or .xls workbook
    file: PathBuf,

    /// Sheet to print (default: first sheet in the reporting period)
    #[arg(long)]
    sheet: Option<String>,

    /// Number of rows to print
    #[arg(long, default_value = "20")]
    rows: usize,

    /// Number of columns to print
    #[arg(long, default_value = "10")]
    columns: usize,

    /// Reporting years, comma separated
    #[arg(long, env = "REPORTING_YEARS")]
    years: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let period = match &cli.years {
        Some(years) => parse_reporting_years(years)?,
        None => ReportingPeriod::default(),
    };

    println!("Opening workbook: {}", cli.file.display());
    let bytes = std::fs::read(&cli.file)?;
    let workbook = RawWorkbook::from_bytes(&bytes)?;

    let role = classify(&workbook);
    println!("Classified as: {role} workbook");
    println!("Reporting period: {period}");

    println!("\nSheet names:");
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        let marker = if period.matches(&sheet.name) { "*" } else { " " };
        println!(
            "  {marker} {i}: {} ({} rows x {} cols)",
            sheet.name,
            sheet.height(),
            sheet.width()
        );
    }
    println!("  (* = selected for conversion)");

    let sheet_name = match cli.sheet {
        Some(name) => name,
        None => match workbook.sheet_names().find(|name| period.matches(name)) {
            Some(name) => name.to_string(),
            None => {
                println!("\nNo sheet matches the reporting period");
                return Ok(());
            }
        },
    };

    let sheet = workbook
        .sheet(&sheet_name)
        .ok_or_else(|| format!("Sheet not found: {sheet_name}"))?;

    println!("\n\nExamining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));

    for row in 0..sheet.height().min(cli.rows) {
        print!("Row {:3}: ", row + 1);
        for col in 0..sheet.width().min(cli.columns) {
            match sheet.cell(row, col) {
                Some(cell) if !cell.to_string().is_empty() => print!("[{cell}] "),
                _ => print!("[empty] "),
            }
        }
        println!();
    }

    println!("\n{}", "=".repeat(100));
    let observations = match role {
        WorkbookRole::Main => reshape_main_sheet(sheet).map(|rows| rows.len()),
        WorkbookRole::Ecoli => reshape_ecoli_sheet(sheet).map(|rows| rows.len()),
    };
    match observations {
        Ok(count) => println!("Reshaped into {count} {role} observations"),
        Err(e) => println!("Reshaping failed: {e}"),
    }

    Ok(())
}

//! CSV rendering of trial balances.

use rust_decimal::Decimal;

use super::error::TrialBalanceError;
use super::types::{GroupedTrialBalance, TrialBalanceReport, TrialBalanceRow, TrialBalanceSummary};

const HEADER: [&str; 9] = [
    "Kode Akun",
    "Nama Akun",
    "Jenis",
    "Debet",
    "Kredit",
    "Penyesuaian Debet",
    "Penyesuaian Kredit",
    "Debet Disesuaikan",
    "Kredit Disesuaikan",
];

type CsvWriter = csv::Writer<Vec<u8>>;

/// Renders a flat trial balance: header, one line per account, totals.
pub fn render(report: &TrialBalanceReport) -> Result<String, TrialBalanceError> {
    let mut csv = writer();
    csv.write_record(HEADER)?;
    for row in &report.rows {
        write_row(&mut csv, row)?;
    }
    write_totals(&mut csv, "TOTAL", &report.summary)?;
    finish(csv)
}

/// Renders a grouped trial balance with a subtotal after each group.
pub fn render_grouped(report: &GroupedTrialBalance) -> Result<String, TrialBalanceError> {
    let mut csv = writer();
    csv.write_record(HEADER)?;
    for group in &report.groups {
        for row in &group.rows {
            write_row(&mut csv, row)?;
        }
        write_totals(&mut csv, &format!("Subtotal {}", group.label), &group.subtotal)?;
    }
    write_totals(&mut csv, "TOTAL", &report.summary)?;
    finish(csv)
}

fn writer() -> CsvWriter {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn write_row(csv: &mut CsvWriter, row: &TrialBalanceRow) -> Result<(), TrialBalanceError> {
    csv.write_record([
        row.account_code.clone(),
        row.account_name.clone(),
        row.account_type.label().to_string(),
        amount(row.debit),
        amount(row.credit),
        amount(row.debit_adjustment),
        amount(row.credit_adjustment),
        amount(row.debit_adjusted),
        amount(row.credit_adjusted),
    ])?;
    Ok(())
}

fn write_totals(
    csv: &mut CsvWriter,
    label: &str,
    summary: &TrialBalanceSummary,
) -> Result<(), TrialBalanceError> {
    csv.write_record([
        String::new(),
        label.to_string(),
        String::new(),
        amount(summary.total_debet),
        amount(summary.total_kredit),
        amount(summary.total_debet_adjusted - summary.total_debet),
        amount(summary.total_kredit_adjusted - summary.total_kredit),
        amount(summary.total_debet_adjusted),
        amount(summary.total_kredit_adjusted),
    ])?;
    Ok(())
}

fn finish(csv: CsvWriter) -> Result<String, TrialBalanceError> {
    let bytes = csv
        .into_inner()
        .map_err(|e| TrialBalanceError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TrialBalanceError::Export(e.to_string()))
}

fn amount(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

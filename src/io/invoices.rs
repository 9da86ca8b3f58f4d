//! CSV batch of extraction outcomes, one row per document.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::CsvIoError;
use crate::extraction::{ExtractedInvoice, ExtractionOutcome};

/// Column header of the invoice batch file.
pub const HEADER: &str = "source,reactive_energy_kwh,billing_months,power_factor_tangent,\
                          active_energy_kwh,supplier,invoice_date,error";

/// One CSV row. Empty cells deserialize to `None`.
#[derive(Debug, Deserialize)]
struct InvoiceRow {
    source: Option<String>,
    reactive_energy_kwh: Option<f64>,
    billing_months: Option<u32>,
    power_factor_tangent: Option<f64>,
    active_energy_kwh: Option<f64>,
    supplier: Option<String>,
    invoice_date: Option<String>,
    error: Option<String>,
}

impl From<InvoiceRow> for ExtractionOutcome {
    fn from(row: InvoiceRow) -> Self {
        let source = row.source.filter(|s| !s.is_empty());
        if let Some(reason) = row.error.filter(|e| !e.trim().is_empty()) {
            return Self::Failed { source, reason };
        }
        match row.reactive_energy_kwh {
            Some(reactive_energy_kwh) => Self::Extracted {
                source,
                invoice: ExtractedInvoice {
                    reactive_energy_kwh,
                    billing_months: row.billing_months,
                    power_factor_tangent: row.power_factor_tangent,
                    active_energy_kwh: row.active_energy_kwh,
                    supplier: row.supplier.filter(|s| !s.is_empty()),
                    invoice_date: row.invoice_date.filter(|s| !s.is_empty()),
                },
            },
            None => Self::Failed {
                source,
                reason: "reactive energy not found on invoice".to_string(),
            },
        }
    }
}

/// Reads extraction outcomes from a CSV file at the given path.
///
/// # Errors
///
/// Returns a `CsvIoError` if the file cannot be opened or a row is malformed.
pub fn read_invoices(path: &Path) -> Result<Vec<ExtractionOutcome>, CsvIoError> {
    let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    collect(reader)
}

/// Reads extraction outcomes from any reader.
///
/// A row with a non-empty `error` cell, or without reactive energy, becomes
/// [`ExtractionOutcome::Failed`].
///
/// # Errors
///
/// Returns a `CsvIoError` if a row is malformed.
pub fn read_invoices_from(reader: impl Read) -> Result<Vec<ExtractionOutcome>, CsvIoError> {
    collect(
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader),
    )
}

fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ExtractionOutcome>, CsvIoError> {
    let mut outcomes = Vec::new();
    for row in reader.deserialize::<InvoiceRow>() {
        outcomes.push(ExtractionOutcome::from(row?));
    }
    Ok(outcomes)
}

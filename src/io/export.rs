//! CSV export for calculation results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::CsvIoError;
use crate::recommend::CalculationResult;

/// Column header for the result export.
const HEADER: &str = "data_source,invoice_count,skipped_records,failed_extractions,\
                      reactive_energy_kwh,billing_months,tangent_used,has_photovoltaic,\
                      average_kvar,margin_applied,primary_kvar,alternate_kvar,\
                      reserve_factor,required_kvar,\
                      rating_kvar,model_name,unit_price,monthly_penalty,annual_penalty,\
                      horizon_savings,roi_years,beyond_catalog";

/// Exports calculation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per result. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns [`CsvIoError::Io`] if the file cannot be created and
/// [`CsvIoError::Csv`] if a row cannot be written.
pub fn export_results_csv(
    results: &[CalculationResult],
    path: &Path,
) -> Result<(), CsvIoError> {
    let file = File::create(path)?;
    write_results_csv(results, io::BufWriter::new(file))
}

/// Writes calculation results as CSV to any writer.
///
/// # Arguments
///
/// * `results` - Results to export, one row each
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns [`CsvIoError::Csv`] if a row cannot be written and
/// [`CsvIoError::Io`] if the final flush fails.
pub fn write_results_csv(
    results: &[CalculationResult],
    writer: impl Write,
) -> Result<(), CsvIoError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        let c = &r.calculation;
        wtr.write_record(&[
            r.data_source.to_string(),
            r.invoice_count.to_string(),
            r.skipped_records.to_string(),
            r.failed_extractions.to_string(),
            format!("{:.2}", r.input.reactive_energy_kwh),
            r.input.billing_months.to_string(),
            format!("{:.4}", c.tangent_used),
            r.input.has_photovoltaic.to_string(),
            format!("{:.4}", c.average_reactive_power_kvar),
            format!("{:.4}", c.margin_multiplier_applied),
            format!("{:.4}", c.primary_estimate_kvar),
            c.alternate_estimate_kvar
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            format!("{:.4}", c.reserve_factor),
            format!("{:.4}", c.required_kvar),
            r.rating_kvar.to_string(),
            r.recommendation.model_name.clone(),
            format!("{:.2}", r.recommendation.unit_price),
            format!("{:.2}", r.monthly_penalty),
            format!("{:.2}", r.annual_penalty),
            format!("{:.2}", r.horizon_savings),
            format!("{:.1}", r.roi_years),
            r.beyond_catalog.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::Recommender;
    use crate::types::MeteringRecord;

    fn results() -> Vec<CalculationResult> {
        let rec = Recommender::default();
        let inputs = [
            MeteringRecord::new(1000.0, 2).with_tangent(0.5),
            MeteringRecord::new(720.0, 1)
                .with_tangent(0.6)
                .with_active_power(50.0),
            MeteringRecord::new(90000.0, 1).with_tangent(1.2),
        ];
        inputs
            .iter()
            .map(|r| rec.compute(r).expect("compute should succeed"))
            .collect()
    }

    fn render(results: &[CalculationResult]) -> String {
        let mut buf = Vec::new();
        write_results_csv(results, &mut buf).expect("write should succeed");
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_is_first_line() {
        let output = render(&results());
        let first_line = output.lines().next().unwrap_or("");
        assert!(first_line.starts_with(
            "data_source,invoice_count,skipped_records,failed_extractions,"
        ));
        assert!(first_line.ends_with(",roi_years,beyond_catalog"));
    }

    #[test]
    fn row_count_matches_result_count() {
        let output = render(&results());
        // 1 header + 3 data rows
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn deterministic_output() {
        let rs = results();
        assert_eq!(render(&rs), render(&rs));
    }

    #[test]
    fn rows_parse_back() {
        let output = render(&results());
        let mut rdr = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        let headers = rdr.headers().cloned().expect("header should parse");
        let rating_col = headers
            .iter()
            .position(|h| h == "rating_kvar")
            .expect("rating column present");
        let alt_col = headers
            .iter()
            .position(|h| h == "alternate_kvar")
            .expect("alternate column present");
        let beyond_col = headers
            .iter()
            .position(|h| h == "beyond_catalog")
            .expect("beyond column present");

        let rows: Vec<csv::StringRecord> = rdr
            .records()
            .collect::<Result<_, _>>()
            .expect("rows should parse");
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][rating_col], "5");
        assert_eq!(&rows[1][rating_col], "15");
        assert_eq!(&rows[1][alt_col], "12.5000");
        assert_eq!(&rows[2][rating_col], "50");
        assert_eq!(&rows[2][beyond_col], "true");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.csv");
        export_results_csv(&results(), &path).expect("export should succeed");
        let text = std::fs::read_to_string(&path).expect("file should exist");
        assert_eq!(text, render(&results()));
    }

    #[test]
    fn export_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no-such-dir").join("results.csv");
        let err = export_results_csv(&results(), &path).unwrap_err();
        assert!(matches!(err, CsvIoError::Io(_)), "unexpected error: {err}");
    }
}

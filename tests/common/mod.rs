//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use kompensator::extraction::{ExtractedInvoice, ExtractionOutcome};
use kompensator::recommend::Recommender;
use kompensator::types::MeteringRecord;

/// Default tiered recommender with the LOPI LKD PRO catalog.
pub fn default_recommender() -> Recommender {
    Recommender::default()
}

/// 1000 kvarh over 2 months at tgφ 0.5: sizes to the smallest model.
pub fn reference_record() -> MeteringRecord {
    MeteringRecord::new(1000.0, 2).with_tangent(0.5)
}

/// One month at tgφ 0.6 with 50 kW measured: the formula estimate (12.5 kvar) wins.
pub fn formula_record() -> MeteringRecord {
    MeteringRecord::new(720.0, 1)
        .with_tangent(0.6)
        .with_active_power(50.0)
}

/// Two monthly invoices whose energy-weighted tgφ is 0.56.
pub fn two_invoices() -> Vec<MeteringRecord> {
    vec![
        MeteringRecord::new(800.0, 1).with_tangent(0.6),
        MeteringRecord::new(200.0, 1).with_tangent(0.4),
    ]
}

/// Successful extraction outcome.
pub fn extracted(source: &str, energy: f64, months: u32, tangent: Option<f64>) -> ExtractionOutcome {
    ExtractionOutcome::Extracted {
        source: Some(source.to_string()),
        invoice: ExtractedInvoice {
            reactive_energy_kwh: energy,
            billing_months: Some(months),
            power_factor_tangent: tangent,
            ..ExtractedInvoice::default()
        },
    }
}

/// Failed extraction outcome.
pub fn failed(source: &str) -> ExtractionOutcome {
    ExtractionOutcome::Failed {
        source: Some(source.to_string()),
        reason: "unreadable".to_string(),
    }
}

/// Path of a file under `samples/`.
pub fn sample(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(name)
}

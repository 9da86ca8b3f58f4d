//! Per-invoice records as delivered by the document extraction service.
//!
//! Extraction itself happens elsewhere; this module only holds the shape of
//! its output and the conversion into [`MeteringRecord`]s.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::MeteringRecord;

/// Fields read from one invoice. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    /// Inductive reactive energy on the invoice.
    pub reactive_energy_kwh: f64,
    /// Billing period length; treated as 1 when absent.
    #[serde(default)]
    pub billing_months: Option<u32>,
    /// tgφ printed on the invoice.
    #[serde(default)]
    pub power_factor_tangent: Option<f64>,
    /// Active energy on the invoice, used to derive tgφ when it is missing.
    #[serde(default)]
    pub active_energy_kwh: Option<f64>,
    /// Energy supplier name.
    #[serde(default)]
    pub supplier: Option<String>,
    /// Invoice date as printed.
    #[serde(default)]
    pub invoice_date: Option<String>,
}

impl ExtractedInvoice {
    /// tgφ from the invoice, or reactive / active energy when only that is known.
    pub fn tangent(&self) -> Option<f64> {
        self.power_factor_tangent
            .filter(|tg| tg.is_finite() && *tg > 0.0)
            .or_else(|| {
                self.active_energy_kwh
                    .filter(|a| a.is_finite() && *a > 0.0)
                    .map(|a| self.reactive_energy_kwh / a)
                    .filter(|tg| tg.is_finite() && *tg > 0.0)
            })
    }

    /// Converts to a metering record. PV is left unset; it is an installation
    /// property supplied at aggregation time.
    pub fn to_record(&self) -> MeteringRecord {
        MeteringRecord {
            reactive_energy_kwh: self.reactive_energy_kwh,
            billing_months: self.billing_months.unwrap_or(1),
            power_factor_tangent: self.tangent(),
            active_power_kw: None,
            has_photovoltaic: false,
        }
    }
}

/// Extraction result for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// The document was read.
    Extracted {
        /// Document label (file name).
        #[serde(default)]
        source: Option<String>,
        /// Extracted fields.
        invoice: ExtractedInvoice,
    },
    /// The document could not be read.
    Failed {
        /// Document label (file name).
        #[serde(default)]
        source: Option<String>,
        /// Human-readable reason.
        reason: String,
    },
}

impl ExtractionOutcome {
    /// Document label, if any.
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Extracted { source, .. } | Self::Failed { source, .. } => source.as_deref(),
        }
    }

    /// Returns `true` for [`ExtractionOutcome::Extracted`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted { .. })
    }
}

/// Extracted records plus a count of failed documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intake {
    /// One record per successfully read document, in input order.
    pub records: Vec<MeteringRecord>,
    /// Number of documents that failed extraction.
    pub failed: usize,
}

impl Intake {
    /// Total number of documents seen.
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failed
    }
}

/// Splits extraction outcomes into usable records and failures.
pub fn collect_records(outcomes: &[ExtractionOutcome]) -> Intake {
    let mut intake = Intake::default();
    for outcome in outcomes {
        match outcome {
            ExtractionOutcome::Extracted { invoice, .. } => {
                intake.records.push(invoice.to_record());
            }
            ExtractionOutcome::Failed { source, reason } => {
                warn!(
                    source = source.as_deref().unwrap_or("<unnamed>"),
                    reason = reason.as_str(),
                    "skipping failed invoice extraction"
                );
                intake.failed += 1;
            }
        }
    }
    intake
}

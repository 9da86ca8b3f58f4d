//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::catalog::CompensatorModel;
use crate::extraction::ExtractionOutcome;
use crate::recommend::CalculationResult;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Number of catalog models loaded.
    pub catalog_size: usize,
}

/// Catalog listing, ascending by rating.
#[derive(Debug, Serialize)]
pub struct CompensatorsResponse {
    /// Catalog models.
    pub compensators: Vec<CompensatorModel>,
}

/// Body of `POST /api/analyze-invoices`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeInvoicesRequest {
    /// One outcome per uploaded document.
    pub invoices: Vec<ExtractionOutcome>,
    /// Installation-level PV flag.
    #[serde(default)]
    pub has_photovoltaic: bool,
}

/// Aggregated result plus extraction counts.
#[derive(Debug, Serialize)]
pub struct AnalyzeInvoicesResponse {
    /// Documents that were read.
    pub succeeded: usize,
    /// Documents that failed extraction.
    pub failed: usize,
    /// Recommendation for the merged invoices.
    pub result: CalculationResult,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

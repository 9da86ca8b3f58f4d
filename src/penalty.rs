//! Reactive-energy penalty and payback estimation.

use serde::Serialize;

/// Tariff charged per kvarh of excess reactive energy (PLN, 2025 rates).
pub const PENALTY_RATE_PER_KVARH: f64 = 2.28;
/// Payback reported when the installation pays no penalty at all.
///
/// Stands for "never pays back"; a finite value keeps results serialisable.
pub const ROI_NEVER_YEARS: f64 = 999.0;
/// Horizon used for the cumulative savings figure.
pub const SAVINGS_HORIZON_YEARS: u32 = 5;

/// Tariff constants of the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffParams {
    /// Penalty per kvarh (PLN).
    pub penalty_rate_per_kvarh: f64,
    /// Sentinel payback when the annual penalty is zero.
    pub roi_never_years: f64,
    /// Years summed into [`PenaltyEstimate::horizon_savings`].
    pub savings_horizon_years: u32,
}

impl Default for TariffParams {
    fn default() -> Self {
        Self {
            penalty_rate_per_kvarh: PENALTY_RATE_PER_KVARH,
            roi_never_years: ROI_NEVER_YEARS,
            savings_horizon_years: SAVINGS_HORIZON_YEARS,
        }
    }
}

/// Penalty avoided by compensation and the resulting payback period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyEstimate {
    /// Average penalty per month (PLN).
    pub monthly_penalty: f64,
    /// `monthly_penalty × 12` (PLN).
    pub annual_penalty: f64,
    /// Savings over the configured horizon (PLN).
    pub horizon_savings: f64,
    /// Device price over annual penalty, one decimal, or the sentinel.
    pub roi_years: f64,
}

/// Estimates penalties for one (possibly aggregated) billing period.
///
/// # Arguments
///
/// * `tariff` - Tariff constants
/// * `reactive_energy_kwh` - Reactive energy billed in the period
/// * `billing_months` - Period length (>= 1, checked by the caller)
/// * `unit_price` - Price of the recommended device
///
/// # Examples
///
/// ```
/// use kompensator::penalty::{TariffParams, estimate};
///
/// let est = estimate(&TariffParams::default(), 1000.0, 2, 9000.0);
/// assert!((est.monthly_penalty - 1140.0).abs() < 1e-9);
/// assert_eq!(est.roi_years, 0.7);
/// ```
pub fn estimate(
    tariff: &TariffParams,
    reactive_energy_kwh: f64,
    billing_months: u32,
    unit_price: f64,
) -> PenaltyEstimate {
    let months = f64::from(billing_months.max(1));
    let monthly_penalty = reactive_energy_kwh * tariff.penalty_rate_per_kvarh / months;
    let annual_penalty = monthly_penalty * 12.0;
    let roi_years = if annual_penalty > 0.0 {
        round1(unit_price / annual_penalty)
    } else {
        tariff.roi_never_years
    };

    PenaltyEstimate {
        monthly_penalty,
        annual_penalty,
        horizon_savings: annual_penalty * f64::from(tariff.savings_horizon_years),
        roi_years,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

//! Metering input shared by the sizing, penalty and aggregation stages.

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

/// One observation period of electricity consumption.
///
/// Built by the caller from a manual form or from one extracted invoice.
/// Never mutated by the engine.
///
/// # Examples
///
/// ```
/// use kompensator::types::MeteringRecord;
///
/// let rec = MeteringRecord::new(1000.0, 2).with_tangent(0.5);
/// assert_eq!(rec.billing_months, 2);
/// assert_eq!(rec.power_factor_tangent, Some(0.5));
/// assert!(!rec.has_photovoltaic);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteringRecord {
    /// Inductive reactive energy consumed in the billing period (kvarh, billed as "kWh").
    pub reactive_energy_kwh: f64,
    /// Length of the billing period in months.
    pub billing_months: u32,
    /// Ratio of reactive to active energy (tgφ).
    #[serde(default)]
    pub power_factor_tangent: Option<f64>,
    /// Active power draw (kW), enables the formula-based estimate.
    #[serde(default)]
    pub active_power_kw: Option<f64>,
    /// Whether the installation has on-site photovoltaic generation.
    #[serde(default)]
    pub has_photovoltaic: bool,
}

impl MeteringRecord {
    /// Creates a record with no tangent, no active power and no PV.
    pub fn new(reactive_energy_kwh: f64, billing_months: u32) -> Self {
        Self {
            reactive_energy_kwh,
            billing_months,
            power_factor_tangent: None,
            active_power_kw: None,
            has_photovoltaic: false,
        }
    }

    /// Sets the power factor tangent.
    pub fn with_tangent(mut self, tangent: f64) -> Self {
        self.power_factor_tangent = Some(tangent);
        self
    }

    /// Sets the measured active power.
    pub fn with_active_power(mut self, kw: f64) -> Self {
        self.active_power_kw = Some(kw);
        self
    }

    /// Sets the photovoltaic flag.
    pub fn with_photovoltaic(mut self, has_pv: bool) -> Self {
        self.has_photovoltaic = has_pv;
        self
    }

    /// Checks the numeric domain of every field.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.reactive_energy_kwh.is_finite() || self.reactive_energy_kwh < 0.0 {
            return Err(CalcError::invalid(
                "reactive_energy_kwh",
                format!("must be finite and >= 0, got {}", self.reactive_energy_kwh),
            ));
        }
        if self.billing_months < 1 {
            return Err(CalcError::invalid("billing_months", "must be >= 1"));
        }
        if let Some(tg) = self.power_factor_tangent {
            if !tg.is_finite() || tg <= 0.0 {
                return Err(CalcError::invalid(
                    "power_factor_tangent",
                    format!("must be finite and > 0, got {tg}"),
                ));
            }
        }
        if let Some(p) = self.active_power_kw {
            if !p.is_finite() || p < 0.0 {
                return Err(CalcError::invalid(
                    "active_power_kw",
                    format!("must be finite and >= 0, got {p}"),
                ));
            }
        }
        Ok(())
    }

    /// Billing period length in hours for the given month length.
    pub fn period_hours(&self, hours_per_month: f64) -> f64 {
        f64::from(self.billing_months) * hours_per_month
    }
}

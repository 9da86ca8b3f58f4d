//! Required reactive power from one metering record.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{CalcError, Result};
use crate::types::MeteringRecord;

use super::margin::MarginTable;
use super::rounding::{is_beyond_catalog, round_to_standard};

/// Average month length in hours (30 days × 24 h).
pub const HOURS_PER_MONTH: f64 = 720.0;
/// tgφ the compensator should bring the installation down to.
pub const TARGET_TANGENT: f64 = 0.35;
/// Extra headroom for installations with photovoltaic generation.
pub const PV_MARGIN_FACTOR: f64 = 1.3;
/// tgφ assumed when none is known and defaulting is allowed.
pub const DEFAULT_TANGENT: f64 = 0.5;
/// Reserve factor that leaves the requirement unchanged.
pub const NO_RESERVE: f64 = 1.0;

/// What to do when a record carries no power factor tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTangentPolicy {
    /// Fail with [`CalcError::MissingInput`].
    #[default]
    Reject,
    /// Size the margin with [`SizingParams::default_tangent`].
    Default,
}

/// Calibration constants of the sizing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingParams {
    /// Hours in one billing month.
    pub hours_per_month: f64,
    /// Target tgφ for the formula-based estimate.
    pub target_tangent: f64,
    /// Margin scaling applied when the installation has PV.
    pub pv_margin_factor: f64,
    /// tgφ used under [`MissingTangentPolicy::Default`].
    pub default_tangent: f64,
    /// Handling of records without tgφ.
    pub missing_tangent: MissingTangentPolicy,
    /// Growth reserve applied to the larger of the two estimates.
    pub growth_reserve: f64,
    /// Extra reserve for PV installations, applied with `growth_reserve`.
    pub pv_reserve: f64,
}

impl Default for SizingParams {
    fn default() -> Self {
        Self {
            hours_per_month: HOURS_PER_MONTH,
            target_tangent: TARGET_TANGENT,
            pv_margin_factor: PV_MARGIN_FACTOR,
            default_tangent: DEFAULT_TANGENT,
            missing_tangent: MissingTangentPolicy::Reject,
            growth_reserve: NO_RESERVE,
            pv_reserve: NO_RESERVE,
        }
    }
}

/// Intermediate values of one sizing run, echoed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingCalculation {
    /// Mean reactive power over the billing period (kvar).
    pub average_reactive_power_kvar: f64,
    /// tgφ used for margin selection.
    pub tangent_used: f64,
    /// `true` when `tangent_used` is the configured default.
    pub tangent_defaulted: bool,
    /// Multiplier of the selected margin band.
    pub margin_multiplier: f64,
    /// Multiplier after PV scaling.
    pub margin_multiplier_applied: f64,
    /// Average reactive power times the applied multiplier (kvar).
    pub primary_estimate_kvar: f64,
    /// Active power used by the formula estimate, measured or derived (kW).
    pub active_power_kw: Option<f64>,
    /// `P × (tgφ − target)` when defined (kvar).
    pub alternate_estimate_kvar: Option<f64>,
    /// Reserve multiplier applied after picking the larger estimate.
    pub reserve_factor: f64,
    /// Larger of the two estimates times `reserve_factor`, before rounding (kvar).
    pub required_kvar: f64,
}

/// Sizing outcome: the calculation plus the rounded catalog rating.
#[derive(Debug, Clone, PartialEq)]
pub struct Sizing {
    /// Intermediate values.
    pub calculation: SizingCalculation,
    /// Catalog rating chosen for `calculation.required_kvar`.
    pub rating_kvar: u32,
    /// `true` when even the largest model is below the requirement.
    pub beyond_catalog: bool,
}

/// Turns one metering record into a required rating.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of concurrent calls.
#[derive(Debug, Clone)]
pub struct SizingEngine {
    params: SizingParams,
    margins: MarginTable,
    catalog: Catalog,
}

impl SizingEngine {
    /// Creates an engine from its parameters, margin table and catalog.
    pub fn new(params: SizingParams, margins: MarginTable, catalog: Catalog) -> Self {
        Self {
            params,
            margins,
            catalog,
        }
    }

    /// Calibration constants in use.
    pub fn params(&self) -> &SizingParams {
        &self.params
    }

    /// Margin table in use.
    pub fn margins(&self) -> &MarginTable {
        &self.margins
    }

    /// Catalog the ratings are rounded to.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Sizes a compensator for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::InvalidInput`] for out-of-domain fields and
    /// [`CalcError::MissingInput`] when tgφ is absent under
    /// [`MissingTangentPolicy::Reject`].
    pub fn size(&self, record: &MeteringRecord) -> Result<Sizing> {
        record.validate()?;

        let (tangent, defaulted) = match record.power_factor_tangent {
            Some(tg) => (tg, false),
            None => match self.params.missing_tangent {
                MissingTangentPolicy::Reject => {
                    return Err(CalcError::MissingInput {
                        field: "power_factor_tangent",
                    });
                }
                MissingTangentPolicy::Default => (self.params.default_tangent, true),
            },
        };

        let hours = record.period_hours(self.params.hours_per_month);
        let average = record.reactive_energy_kwh / hours;

        let margin = self.margins.multiplier_for(tangent);
        let applied = if record.has_photovoltaic {
            margin * self.params.pv_margin_factor
        } else {
            margin
        };
        let primary = average * applied;

        let active_power_kw = self.active_power(record, hours);
        let alternate = active_power_kw
            .zip(record.power_factor_tangent)
            .map(|(p, tg)| p * (tg - self.params.target_tangent));

        let larger = match alternate {
            Some(alt) if alt > 0.0 && alt > primary => alt,
            _ => primary,
        };
        let reserve_factor = if record.has_photovoltaic {
            self.params.growth_reserve * self.params.pv_reserve
        } else {
            self.params.growth_reserve
        };
        let required = larger * reserve_factor;

        let rating_kvar = round_to_standard(&self.catalog, required);
        let beyond_catalog = is_beyond_catalog(&self.catalog, required);
        if beyond_catalog {
            warn!(
                required_kvar = required,
                max_kvar = self.catalog.max_rating(),
                "requirement exceeds the largest catalog model"
            );
        }

        debug!(
            average_kvar = average,
            tangent,
            margin,
            applied,
            primary,
            ?alternate,
            reserve_factor,
            required,
            rating_kvar,
            "sized compensator"
        );

        Ok(Sizing {
            calculation: SizingCalculation {
                average_reactive_power_kvar: average,
                tangent_used: tangent,
                tangent_defaulted: defaulted,
                margin_multiplier: margin,
                margin_multiplier_applied: applied,
                primary_estimate_kvar: primary,
                active_power_kw,
                alternate_estimate_kvar: alternate,
                reserve_factor,
                required_kvar: required,
            },
            rating_kvar,
            beyond_catalog,
        })
    }

    /// Active power for the formula estimate.
    ///
    /// Measured power wins; otherwise it is derived from reactive energy and
    /// tgφ. `None` when the record has no tgφ of its own.
    fn active_power(&self, record: &MeteringRecord, hours: f64) -> Option<f64> {
        let tangent = record.power_factor_tangent.filter(|tg| *tg > 0.0)?;
        Some(
            record
                .active_power_kw
                .unwrap_or_else(|| (record.reactive_energy_kwh / tangent) / hours),
        )
    }
}

impl Default for SizingEngine {
    fn default() -> Self {
        Self::new(
            SizingParams::default(),
            MarginTable::default(),
            Catalog::default(),
        )
    }
}

//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::aggregate::DEFAULT_AGGREGATE_TANGENT;
use crate::catalog::{Catalog, CompensatorModel};
pub use crate::error::ConfigError;
use crate::penalty::{PENALTY_RATE_PER_KVARH, ROI_NEVER_YEARS, SAVINGS_HORIZON_YEARS, TariffParams};
use crate::recommend::Recommender;
use crate::sizing::engine::{
    DEFAULT_TANGENT, HOURS_PER_MONTH, NO_RESERVE, PV_MARGIN_FACTOR, TARGET_TANGENT,
};
use crate::sizing::margin::{DEFAULT_TIERS, FLAT_MULTIPLIER, REGULATORY_TANGENT_LIMIT};
use crate::sizing::{MarginTable, MarginTier, MissingTangentPolicy, SizingEngine, SizingParams};

/// PV factor of the flat preset: peak factor 10 instead of 6.
const FLAT_PV_MARGIN_FACTOR: f64 = 10.0 / 6.0;
/// Growth reserve of the flat preset (+20%).
const FLAT_GROWTH_RESERVE: f64 = 1.2;
/// PV reserve of the flat preset (+30%).
const FLAT_PV_RESERVE: f64 = 1.3;

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the tiered preset. Load from TOML with
/// [`EngineConfig::from_toml_file`] or use [`EngineConfig::tiered`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Sizing constants and margin policy.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Penalty tariff and payback settings.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Invoice aggregation settings.
    #[serde(default)]
    pub aggregation: AggregationConfig,
    /// Device catalog, ascending order not required.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CompensatorModel>,
}

/// Sizing constants and margin policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Hours in one billing month.
    pub hours_per_month: f64,
    /// tgφ the formula estimate compensates down to (< 0.4).
    pub target_tangent: f64,
    /// Margin scaling for PV installations (>= 1).
    pub pv_margin_factor: f64,
    /// `"reject"` or `"default"`.
    pub missing_tangent: MissingTangentPolicy,
    /// tgφ used when `missing_tangent = "default"`.
    pub default_tangent: f64,
    /// Margin bands, ascending by `from`.
    pub margin_tiers: Vec<MarginTier>,
    /// Multiplier on the larger estimate (>= 1).
    pub growth_reserve: f64,
    /// Further multiplier on the larger estimate for PV installations (>= 1).
    pub pv_reserve: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            hours_per_month: HOURS_PER_MONTH,
            target_tangent: TARGET_TANGENT,
            pv_margin_factor: PV_MARGIN_FACTOR,
            missing_tangent: MissingTangentPolicy::Reject,
            default_tangent: DEFAULT_TANGENT,
            margin_tiers: DEFAULT_TIERS.to_vec(),
            growth_reserve: NO_RESERVE,
            pv_reserve: NO_RESERVE,
        }
    }
}

/// Penalty tariff and payback settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Penalty per kvarh (PLN).
    pub penalty_rate_per_kvarh: f64,
    /// Payback reported when no penalty is paid.
    pub roi_never_years: f64,
    /// Horizon of the cumulative savings figure.
    pub savings_horizon_years: u32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            penalty_rate_per_kvarh: PENALTY_RATE_PER_KVARH,
            roi_never_years: ROI_NEVER_YEARS,
            savings_horizon_years: SAVINGS_HORIZON_YEARS,
        }
    }
}

/// Invoice aggregation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// tgφ assumed when no invoice carries one.
    pub default_tangent: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            default_tangent: DEFAULT_AGGREGATE_TANGENT,
        }
    }
}

fn default_catalog() -> Vec<CompensatorModel> {
    Catalog::lopi_lkd_pro().models().to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::tiered()
    }
}

impl EngineConfig {
    /// Tiered margin policy with the LOPI LKD PRO catalog.
    pub fn tiered() -> Self {
        Self {
            sizing: SizingConfig::default(),
            tariff: TariffConfig::default(),
            aggregation: AggregationConfig::default(),
            catalog: default_catalog(),
        }
    }

    /// Single-band policy of the earlier calculator.
    ///
    /// Peak factor 6 for every tgφ (10 with PV). The 20% growth reserve and the
    /// 30% PV reserve apply to the larger of the peak and formula estimates.
    pub fn flat() -> Self {
        Self {
            sizing: SizingConfig {
                pv_margin_factor: FLAT_PV_MARGIN_FACTOR,
                margin_tiers: vec![MarginTier::new(0.0, FLAT_MULTIPLIER)],
                growth_reserve: FLAT_GROWTH_RESERVE,
                pv_reserve: FLAT_PV_RESERVE,
                ..SizingConfig::default()
            },
            ..Self::tiered()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["tiered", "flat"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "tiered" => Ok(Self::tiered()),
            "flat" => Ok(Self::flat()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.sizing;

        if !(s.hours_per_month.is_finite() && s.hours_per_month > 0.0) {
            errors.push(ConfigError::new("sizing.hours_per_month", "must be > 0"));
        }
        if !(s.target_tangent > 0.0 && s.target_tangent < REGULATORY_TANGENT_LIMIT) {
            errors.push(ConfigError::new(
                "sizing.target_tangent",
                format!("must be in (0, {REGULATORY_TANGENT_LIMIT})"),
            ));
        }
        if !(s.pv_margin_factor.is_finite() && s.pv_margin_factor >= 1.0) {
            errors.push(ConfigError::new("sizing.pv_margin_factor", "must be >= 1"));
        }
        if !(s.default_tangent.is_finite() && s.default_tangent > 0.0) {
            errors.push(ConfigError::new("sizing.default_tangent", "must be > 0"));
        }
        if !(s.growth_reserve.is_finite() && s.growth_reserve >= 1.0) {
            errors.push(ConfigError::new("sizing.growth_reserve", "must be >= 1"));
        }
        if !(s.pv_reserve.is_finite() && s.pv_reserve >= 1.0) {
            errors.push(ConfigError::new("sizing.pv_reserve", "must be >= 1"));
        }
        if let Err(e) = MarginTable::new(s.margin_tiers.clone()) {
            errors.push(ConfigError::new("sizing.margin_tiers", e.to_string()));
        }

        let t = &self.tariff;
        if !(t.penalty_rate_per_kvarh.is_finite() && t.penalty_rate_per_kvarh >= 0.0) {
            errors.push(ConfigError::new(
                "tariff.penalty_rate_per_kvarh",
                "must be >= 0",
            ));
        }
        if !(t.roi_never_years.is_finite() && t.roi_never_years > 0.0) {
            errors.push(ConfigError::new(
                "tariff.roi_never_years",
                "must be finite and > 0",
            ));
        }

        let a = &self.aggregation;
        if !(a.default_tangent.is_finite() && a.default_tangent > 0.0) {
            errors.push(ConfigError::new("aggregation.default_tangent", "must be > 0"));
        }

        if let Err(e) = Catalog::new(self.catalog.clone()) {
            errors.push(ConfigError::new("catalog", e.to_string()));
        }

        errors
    }

    /// Builds the recommender described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, if any.
    pub fn build(&self) -> Result<Recommender, ConfigError> {
        if let Some(first) = self.validate().into_iter().next() {
            return Err(first);
        }
        let margins = MarginTable::new(self.sizing.margin_tiers.clone())
            .map_err(|e| ConfigError::new("sizing.margin_tiers", e.to_string()))?;
        let catalog = Catalog::new(self.catalog.clone())
            .map_err(|e| ConfigError::new("catalog", e.to_string()))?;
        let params = SizingParams {
            hours_per_month: self.sizing.hours_per_month,
            target_tangent: self.sizing.target_tangent,
            pv_margin_factor: self.sizing.pv_margin_factor,
            default_tangent: self.sizing.default_tangent,
            missing_tangent: self.sizing.missing_tangent,
            growth_reserve: self.sizing.growth_reserve,
            pv_reserve: self.sizing.pv_reserve,
        };
        let tariff = TariffParams {
            penalty_rate_per_kvarh: self.tariff.penalty_rate_per_kvarh,
            roi_never_years: self.tariff.roi_never_years,
            savings_horizon_years: self.tariff.savings_horizon_years,
        };
        Ok(Recommender::new(
            SizingEngine::new(params, margins, catalog),
            tariff,
            self.aggregation.default_tangent,
        ))
    }
}

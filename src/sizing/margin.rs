use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

/// Regulatory tgφ threshold above which reactive energy is penalised.
pub const REGULATORY_TANGENT_LIMIT: f64 = 0.4;

/// One band of the margin table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarginTier {
    /// Inclusive lower bound of tgφ for this band.
    pub from: f64,
    /// Multiplier applied to the average reactive power.
    pub multiplier: f64,
}

impl MarginTier {
    /// Creates a band.
    pub const fn new(from: f64, multiplier: f64) -> Self {
        Self { from, multiplier }
    }
}

/// Default tiered policy: headroom grows as tgφ moves above the 0.4 limit.
pub const DEFAULT_TIERS: &[MarginTier] = &[
    MarginTier::new(0.0, 6.0),
    MarginTier::new(0.4, 7.0),
    MarginTier::new(0.6, 8.0),
    MarginTier::new(0.8, 9.0),
    MarginTier::new(1.0, 10.0),
];

/// Single band of the earlier calculator: peak factor 6 for every tgφ.
pub const FLAT_MULTIPLIER: f64 = 6.0;

/// Ordered step function from tgφ to margin multiplier.
///
/// Bounds are strictly increasing and multipliers never decrease, so the
/// selected multiplier is monotonic in the tangent.
///
/// # Examples
///
/// ```
/// use kompensator::sizing::MarginTable;
///
/// let table = MarginTable::tiered();
/// assert_eq!(table.multiplier_for(0.3), 6.0);
/// assert_eq!(table.multiplier_for(0.4), 7.0);
/// assert_eq!(table.multiplier_for(0.65), 8.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MarginTable {
    tiers: Vec<MarginTier>,
}

impl MarginTable {
    /// Builds a table from bands given in ascending order of `from`.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Margin`] if the table is empty, a bound is
    /// negative or non-finite, bounds are not strictly increasing, a
    /// multiplier is not positive, or a multiplier is smaller than the one
    /// of the band below it.
    pub fn new(tiers: Vec<MarginTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(CalcError::Margin("at least one tier is required".into()));
        }
        for (i, t) in tiers.iter().enumerate() {
            if !t.from.is_finite() || t.from < 0.0 {
                return Err(CalcError::Margin(format!(
                    "tier {i}: bound must be finite and >= 0, got {}",
                    t.from
                )));
            }
            if !t.multiplier.is_finite() || t.multiplier <= 0.0 {
                return Err(CalcError::Margin(format!(
                    "tier {i}: multiplier must be finite and > 0, got {}",
                    t.multiplier
                )));
            }
        }
        for (i, w) in tiers.windows(2).enumerate() {
            if w[1].from <= w[0].from {
                return Err(CalcError::Margin(format!(
                    "tier {}: bound {} must be greater than {}",
                    i + 1,
                    w[1].from,
                    w[0].from
                )));
            }
            if w[1].multiplier < w[0].multiplier {
                return Err(CalcError::Margin(format!(
                    "tier {}: multiplier {} is lower than {}",
                    i + 1,
                    w[1].multiplier,
                    w[0].multiplier
                )));
            }
        }
        Ok(Self { tiers })
    }

    /// The default tiered policy ([`DEFAULT_TIERS`]).
    pub fn tiered() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }

    /// A single band applying `multiplier` at every tangent.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Margin`] if `multiplier` is not positive.
    pub fn flat(multiplier: f64) -> Result<Self> {
        Self::new(vec![MarginTier::new(0.0, multiplier)])
    }

    /// Bands in ascending order.
    pub fn tiers(&self) -> &[MarginTier] {
        &self.tiers
    }

    /// Multiplier of the highest band whose bound `tangent` meets or exceeds.
    ///
    /// A tangent below the first bound gets the first band.
    pub fn multiplier_for(&self, tangent: f64) -> f64 {
        self.tiers
            .iter()
            .rev()
            .find(|t| tangent >= t.from)
            .unwrap_or(&self.tiers[0])
            .multiplier
    }
}

impl Default for MarginTable {
    fn default() -> Self {
        Self::tiered()
    }
}

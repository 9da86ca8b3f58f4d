//! Merges per-invoice metering records into one equivalent record.

use tracing::{debug, warn};

use crate::error::{CalcError, Result};
use crate::types::MeteringRecord;

/// tgφ assumed for merged invoices when none of them carries one.
///
/// Has direct financial consequences: it drives both the margin band and the
/// formula estimate of the merged record.
pub const DEFAULT_AGGREGATE_TANGENT: f64 = 0.5;

/// Result of merging several invoices.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Equivalent record handed to the sizing engine.
    pub record: MeteringRecord,
    /// Records that contributed to the totals.
    pub used: usize,
    /// Records skipped as unusable.
    pub skipped: usize,
    /// `true` when no usable record had a tgφ and the default was applied.
    pub tangent_defaulted: bool,
}

/// Returns `true` if a record can contribute to totals.
///
/// Only energy and period matter here; a bad or missing tgφ only removes the
/// record from the numerator of the weighted tangent.
pub fn is_usable(record: &MeteringRecord) -> bool {
    record.reactive_energy_kwh.is_finite()
        && record.reactive_energy_kwh >= 0.0
        && record.billing_months >= 1
}

fn defined_tangent(record: &MeteringRecord) -> Option<f64> {
    record
        .power_factor_tangent
        .filter(|tg| tg.is_finite() && *tg > 0.0)
}

/// Merges records by summing energy and months and energy-weighting tgφ.
///
/// The weighted tangent is `Σ(tgφᵢ × Eᵢ) / Σ E` where the denominator is the
/// total energy of every usable record, with or without a tgφ. When that
/// weighting yields no positive value (all tgφ-bearing records have zero
/// energy) the plain mean of the known tangents is used instead.
///
/// PV presence belongs to the installation, so it comes from `has_photovoltaic`
/// rather than from the records. The merged record carries no active power.
///
/// # Arguments
///
/// * `records` - Per-invoice records, in any order
/// * `has_photovoltaic` - Installation-level PV flag
/// * `default_tangent` - tgφ used when no usable record has one
///
/// # Errors
///
/// Returns [`CalcError::NoValidRecords`] when `records` is empty or none of
/// them is usable.
///
/// # Examples
///
/// ```
/// use kompensator::aggregate::aggregate;
/// use kompensator::types::MeteringRecord;
///
/// let records = [
///     MeteringRecord::new(800.0, 2).with_tangent(0.6),
///     MeteringRecord::new(200.0, 1).with_tangent(0.4),
/// ];
/// let agg = aggregate(&records, false, 0.5).unwrap();
/// assert_eq!(agg.record.reactive_energy_kwh, 1000.0);
/// assert_eq!(agg.record.billing_months, 3);
/// assert!((agg.record.power_factor_tangent.unwrap() - 0.56).abs() < 1e-12);
/// ```
pub fn aggregate(
    records: &[MeteringRecord],
    has_photovoltaic: bool,
    default_tangent: f64,
) -> Result<Aggregate> {
    let mut total_energy = 0.0_f64;
    let mut total_months = 0_u32;
    let mut weighted_sum = 0.0_f64;
    let mut tangent_sum = 0.0_f64;
    let mut tangent_count = 0_usize;
    let mut used = 0_usize;

    for (i, r) in records.iter().enumerate() {
        if !is_usable(r) {
            warn!(
                index = i,
                reactive_energy_kwh = r.reactive_energy_kwh,
                billing_months = r.billing_months,
                "skipping unusable invoice record"
            );
            continue;
        }
        used += 1;
        total_energy += r.reactive_energy_kwh;
        total_months = total_months.saturating_add(r.billing_months);
        if let Some(tg) = defined_tangent(r) {
            weighted_sum += tg * r.reactive_energy_kwh;
            tangent_sum += tg;
            tangent_count += 1;
        }
    }

    if used == 0 {
        return Err(CalcError::NoValidRecords {
            attempted: records.len(),
            failed: records.len(),
        });
    }

    let (tangent, tangent_defaulted) = if tangent_count == 0 {
        (default_tangent, true)
    } else if total_energy > 0.0 && weighted_sum > 0.0 {
        (weighted_sum / total_energy, false)
    } else {
        // every tgφ-bearing record has zero energy: plain mean
        (tangent_sum / tangent_count as f64, false)
    };

    debug!(
        used,
        skipped = records.len() - used,
        total_energy,
        total_months,
        tangent,
        tangent_defaulted,
        "aggregated invoice records"
    );

    Ok(Aggregate {
        record: MeteringRecord {
            reactive_energy_kwh: total_energy,
            billing_months: total_months,
            power_factor_tangent: Some(tangent),
            active_power_kw: None,
            has_photovoltaic,
        },
        used,
        skipped: records.len() - used,
        tangent_defaulted,
    })
}

//! Recommendation assembly: sizing, catalog selection and payback in one result.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::aggregate::{self, DEFAULT_AGGREGATE_TANGENT};
use crate::catalog::{CompensatorModel, DeviceKind};
use crate::error::{CalcError, Result};
use crate::extraction::{self, ExtractionOutcome};
use crate::penalty::{self, TariffParams};
use crate::sizing::{Sizing, SizingCalculation, SizingEngine};
use crate::types::MeteringRecord;

/// Where the metering data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// One record typed in by the user.
    Manual,
    /// Several invoices merged into one record.
    Aggregated,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Aggregated => write!(f, "aggregated"),
        }
    }
}

/// The recommended catalog device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Rating of the device (a catalog rating).
    pub rating_kvar: u32,
    /// Switching technology.
    pub kind: DeviceKind,
    /// Commercial model name.
    pub model_name: String,
    /// Unit price (PLN).
    pub unit_price: f64,
}

impl From<&CompensatorModel> for Recommendation {
    fn from(m: &CompensatorModel) -> Self {
        Self {
            rating_kvar: m.rating_kvar,
            kind: m.kind,
            model_name: m.model_name.clone(),
            unit_price: m.unit_price,
        }
    }
}

/// Complete answer to one calculation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    /// Rating of the recommended device (kvar).
    pub rating_kvar: u32,
    /// Recommended device.
    pub recommendation: Recommendation,
    /// Payback in years, or the "never" sentinel.
    pub roi_years: f64,
    /// Estimated penalty per month (PLN).
    pub monthly_penalty: f64,
    /// Estimated penalty per year (PLN).
    pub annual_penalty: f64,
    /// Penalty avoided over `savings_horizon_years` (PLN).
    pub horizon_savings: f64,
    /// Horizon of `horizon_savings`.
    pub savings_horizon_years: u32,
    /// Requirement exceeds the largest catalog model.
    pub beyond_catalog: bool,
    /// Record the calculation was run on (the merged one when aggregated).
    pub input: MeteringRecord,
    /// Intermediate values.
    pub calculation: SizingCalculation,
    /// Manual entry or invoice aggregation.
    pub data_source: DataSource,
    /// Invoices behind the result (1 for manual entry).
    pub invoice_count: usize,
    /// Invoices among `invoice_count` skipped as unusable.
    pub skipped_records: usize,
    /// Extraction attempts that yielded no data; not part of `invoice_count`.
    pub failed_extractions: usize,
}

/// Entry point of the engine: both ingestion paths plus the catalog listing.
///
/// Immutable after construction; share it behind an `Arc` for concurrent use.
///
/// # Examples
///
/// ```
/// use kompensator::recommend::{DataSource, Recommender};
/// use kompensator::types::MeteringRecord;
///
/// let rec = Recommender::default();
/// let result = rec
///     .compute(&MeteringRecord::new(1000.0, 2).with_tangent(0.5))
///     .unwrap();
/// assert_eq!(result.rating_kvar, 5);
/// assert_eq!(result.data_source, DataSource::Manual);
/// assert_eq!(result.invoice_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Recommender {
    sizing: SizingEngine,
    tariff: TariffParams,
    aggregate_tangent: f64,
}

impl Recommender {
    /// Creates a recommender.
    ///
    /// # Arguments
    ///
    /// * `sizing` - Sizing engine (holds the catalog)
    /// * `tariff` - Penalty tariff constants
    /// * `aggregate_tangent` - tgφ assumed when no invoice carries one
    pub fn new(sizing: SizingEngine, tariff: TariffParams, aggregate_tangent: f64) -> Self {
        Self {
            sizing,
            tariff,
            aggregate_tangent,
        }
    }

    /// The sizing engine.
    pub fn sizing(&self) -> &SizingEngine {
        &self.sizing
    }

    /// Tariff constants.
    pub fn tariff(&self) -> &TariffParams {
        &self.tariff
    }

    /// Catalog listing, ascending by rating.
    pub fn list_devices(&self) -> &[CompensatorModel] {
        self.sizing.catalog().models()
    }

    /// Manual path: one record, `invoice_count = 1`.
    ///
    /// # Errors
    ///
    /// Propagates [`CalcError::InvalidInput`] and [`CalcError::MissingInput`]
    /// from the sizing engine.
    pub fn compute(&self, record: &MeteringRecord) -> Result<CalculationResult> {
        let sizing = self.sizing.size(record)?;
        Ok(self.assemble(sizing, record.clone(), DataSource::Manual, 1, 0, 0))
    }

    /// Aggregated path: merges `records`, then sizes the merged record.
    ///
    /// Unusable records are skipped but still counted in `invoice_count`;
    /// `skipped_records` says how many.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::NoValidRecords`] when no record is usable.
    pub fn compute_from_records(
        &self,
        records: &[MeteringRecord],
        has_photovoltaic: bool,
    ) -> Result<CalculationResult> {
        let agg = aggregate::aggregate(records, has_photovoltaic, self.aggregate_tangent)?;
        let sizing = self.sizing.size(&agg.record)?;
        Ok(self.assemble(
            sizing,
            agg.record,
            DataSource::Aggregated,
            records.len(),
            agg.skipped,
            0,
        ))
    }

    /// Aggregated path fed directly with extraction outcomes.
    ///
    /// `invoice_count` is the number of successfully extracted invoices,
    /// unusable ones included and reported in `skipped_records`. Failed
    /// extractions are reported in `failed_extractions` only, so
    /// `invoice_count + failed_extractions` equals the number of outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::NoValidRecords`] counting every outcome when
    /// nothing usable remains.
    pub fn compute_from_extractions(
        &self,
        outcomes: &[ExtractionOutcome],
        has_photovoltaic: bool,
    ) -> Result<CalculationResult> {
        let intake = extraction::collect_records(outcomes);
        let no_valid = |unusable: usize| CalcError::NoValidRecords {
            attempted: intake.attempted(),
            failed: intake.failed + unusable,
        };
        if intake.records.is_empty() {
            return Err(no_valid(0));
        }

        let agg = aggregate::aggregate(&intake.records, has_photovoltaic, self.aggregate_tangent)
            .map_err(|e| match e {
                CalcError::NoValidRecords { failed, .. } => no_valid(failed),
                other => other,
            })?;
        let sizing = self.sizing.size(&agg.record)?;
        Ok(self.assemble(
            sizing,
            agg.record,
            DataSource::Aggregated,
            intake.records.len(),
            agg.skipped,
            intake.failed,
        ))
    }

    fn assemble(
        &self,
        sizing: Sizing,
        input: MeteringRecord,
        data_source: DataSource,
        invoice_count: usize,
        skipped_records: usize,
        failed_extractions: usize,
    ) -> CalculationResult {
        let model = self.sizing.catalog().lookup(sizing.rating_kvar);
        let penalty = penalty::estimate(
            &self.tariff,
            input.reactive_energy_kwh,
            input.billing_months,
            model.unit_price,
        );

        info!(
            %data_source,
            invoice_count,
            required_kvar = sizing.calculation.required_kvar,
            model = model.model_name.as_str(),
            roi_years = penalty.roi_years,
            "compensator recommended"
        );

        CalculationResult {
            rating_kvar: model.rating_kvar,
            recommendation: Recommendation::from(model),
            roi_years: penalty.roi_years,
            monthly_penalty: penalty.monthly_penalty,
            annual_penalty: penalty.annual_penalty,
            horizon_savings: penalty.horizon_savings,
            savings_horizon_years: self.tariff.savings_horizon_years,
            beyond_catalog: sizing.beyond_catalog,
            input,
            calculation: sizing.calculation,
            data_source,
            invoice_count,
            skipped_records,
            failed_extractions,
        }
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(
            SizingEngine::default(),
            TariffParams::default(),
            DEFAULT_AGGREGATE_TANGENT,
        )
    }
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calc = &self.calculation;
        writeln!(f, "--- Compensator Recommendation ---")?;
        writeln!(
            f,
            "Data source:           {} ({} invoice(s), {} skipped, {} unreadable)",
            self.data_source, self.invoice_count, self.skipped_records, self.failed_extractions
        )?;
        writeln!(
            f,
            "Reactive energy:       {:.1} kvarh over {} month(s)",
            self.input.reactive_energy_kwh, self.input.billing_months
        )?;
        writeln!(
            f,
            "tg phi:                {:.3}{}",
            calc.tangent_used,
            if calc.tangent_defaulted { " (default)" } else { "" }
        )?;
        writeln!(
            f,
            "Average reactive:      {:.2} kvar",
            calc.average_reactive_power_kvar
        )?;
        writeln!(
            f,
            "Margin:                x{:.2} (band x{:.2}{})",
            calc.margin_multiplier_applied,
            calc.margin_multiplier,
            if self.input.has_photovoltaic { ", PV" } else { "" }
        )?;
        writeln!(f, "Primary estimate:      {:.2} kvar", calc.primary_estimate_kvar)?;
        match calc.alternate_estimate_kvar {
            Some(alt) => writeln!(f, "Formula estimate:      {alt:.2} kvar")?,
            None => writeln!(f, "Formula estimate:      n/a")?,
        }
        if (calc.reserve_factor - 1.0).abs() > f64::EPSILON {
            writeln!(f, "Reserve:               x{:.2}", calc.reserve_factor)?;
        }
        writeln!(f, "Required:              {:.2} kvar", calc.required_kvar)?;
        writeln!(
            f,
            "Recommended:           {} ({} kvar, {}, {:.0} PLN){}",
            self.recommendation.model_name,
            self.rating_kvar,
            self.recommendation.kind,
            self.recommendation.unit_price,
            if self.beyond_catalog {
                " BEYOND CATALOG"
            } else {
                ""
            }
        )?;
        writeln!(f, "Monthly penalty:       {:.0} PLN", self.monthly_penalty)?;
        writeln!(f, "Annual penalty:        {:.0} PLN", self.annual_penalty)?;
        writeln!(
            f,
            "{}-year savings:        {:.0} PLN",
            self.savings_horizon_years, self.horizon_savings
        )?;
        write!(f, "Payback:               {:.1} years", self.roi_years)
    }
}

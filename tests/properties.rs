//! Seeded randomized checks of ordering and aggregation properties.

mod common;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rngs::StdRng};

use kompensator::aggregate::aggregate;
use kompensator::catalog::Catalog;
use kompensator::sizing::{MarginTable, SizingEngine, is_beyond_catalog, round_to_standard};
use kompensator::types::MeteringRecord;

const SEED: u64 = 42;

fn random_records(rng: &mut StdRng, n: usize) -> Vec<MeteringRecord> {
    (0..n)
        .map(|_| {
            MeteringRecord::new(
                rng.random_range(1.0..20_000.0),
                rng.random_range(1..=3),
            )
            .with_tangent(rng.random_range(0.05..1.5))
        })
        .collect()
}

#[test]
fn rounding_is_monotonic_and_covers_requirement() {
    let catalog = Catalog::default();
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut required: Vec<f64> = (0..2_000).map(|_| rng.random_range(0.0..80.0)).collect();
    required.sort_by(f64::total_cmp);

    let mut prev = 0;
    for r in required {
        let rating = round_to_standard(&catalog, r);
        assert!(rating >= prev, "rating dropped from {prev} to {rating} at {r}");
        assert!(catalog.contains_rating(rating));
        if is_beyond_catalog(&catalog, r) {
            assert_eq!(rating, catalog.max_rating());
        } else {
            assert!(f64::from(rating) >= r, "{rating} kvar does not cover {r}");
        }
        prev = rating;
    }
}

#[test]
fn margin_multiplier_is_non_decreasing_in_tangent() {
    let table = MarginTable::tiered();
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    let mut tangents: Vec<f64> = (0..2_000).map(|_| rng.random_range(0.0..3.0)).collect();
    tangents.sort_by(f64::total_cmp);

    let mut prev = f64::MIN;
    for tg in tangents {
        let m = table.multiplier_for(tg);
        assert!(m >= prev, "multiplier fell at tgφ {tg}");
        prev = m;
    }
}

#[test]
fn primary_estimate_is_non_decreasing_in_tangent() {
    let engine = SizingEngine::default();
    let mut rng = StdRng::seed_from_u64(SEED + 6);
    for _ in 0..100 {
        let energy = rng.random_range(0.0..50_000.0);
        let months = rng.random_range(1..=12);
        let pv = rng.random_bool(0.5);
        let mut tangents: Vec<f64> = (0..20).map(|_| rng.random_range(0.01..3.0)).collect();
        tangents.sort_by(f64::total_cmp);

        let mut prev = f64::MIN;
        for tg in tangents {
            let record = MeteringRecord::new(energy, months)
                .with_tangent(tg)
                .with_photovoltaic(pv);
            let primary = engine
                .size(&record)
                .expect("sizing should succeed")
                .calculation
                .primary_estimate_kvar;
            assert!(primary >= prev, "primary estimate fell at tgφ {tg}");
            prev = primary;
        }
    }
}

#[test]
fn weighted_tangent_divides_by_all_usable_energy() {
    let mut rng = StdRng::seed_from_u64(SEED + 7);
    for _ in 0..50 {
        let n = rng.random_range(2..12);
        let mut records = random_records(&mut rng, n);
        for r in records.iter_mut().skip(1) {
            if rng.random_bool(0.4) {
                r.power_factor_tangent = None;
            }
        }

        let total: f64 = records.iter().map(|r| r.reactive_energy_kwh).sum();
        let weighted: f64 = records
            .iter()
            .filter_map(|r| r.power_factor_tangent.map(|tg| tg * r.reactive_energy_kwh))
            .sum();
        let agg = aggregate(&records, false, 0.5).expect("aggregate should succeed");
        let tg = agg.record.power_factor_tangent.unwrap_or_default();
        assert!((tg - weighted / total).abs() < 1e-9, "{tg} != {}", weighted / total);
        assert!(!agg.tangent_defaulted);
    }
}

#[test]
fn required_power_grows_with_energy() {
    let engine = SizingEngine::default();
    let mut rng = StdRng::seed_from_u64(SEED + 2);
    for _ in 0..200 {
        let months = rng.random_range(1..=12);
        let tg = rng.random_range(0.05..1.5);
        let low = rng.random_range(0.0..50_000.0);
        let high = low + rng.random_range(0.0..50_000.0);

        let a = engine
            .size(&MeteringRecord::new(low, months).with_tangent(tg))
            .expect("sizing should succeed");
        let b = engine
            .size(&MeteringRecord::new(high, months).with_tangent(tg))
            .expect("sizing should succeed");
        assert!(b.calculation.required_kvar >= a.calculation.required_kvar);
        assert!(b.rating_kvar >= a.rating_kvar);
    }
}

#[test]
fn aggregation_ignores_record_order() {
    let mut rng = StdRng::seed_from_u64(SEED + 3);
    for _ in 0..50 {
        let n = rng.random_range(1..12);
        let mut records = random_records(&mut rng, n);
        let first = aggregate(&records, false, 0.5).expect("aggregate should succeed");
        records.shuffle(&mut rng);
        let second = aggregate(&records, false, 0.5).expect("aggregate should succeed");

        assert_eq!(first.record.billing_months, second.record.billing_months);
        let e1 = first.record.reactive_energy_kwh;
        let e2 = second.record.reactive_energy_kwh;
        assert!((e1 - e2).abs() <= 1e-9 * e1.max(1.0));
        let t1 = first.record.power_factor_tangent.unwrap_or_default();
        let t2 = second.record.power_factor_tangent.unwrap_or_default();
        assert!((t1 - t2).abs() < 1e-9);
    }
}

#[test]
fn aggregation_of_partial_aggregates_matches_whole() {
    let mut rng = StdRng::seed_from_u64(SEED + 4);
    for _ in 0..50 {
        let n = rng.random_range(2..12);
        let records = random_records(&mut rng, n);
        let split = rng.random_range(1..n);

        let whole = aggregate(&records, false, 0.5).expect("aggregate should succeed");
        let left = aggregate(&records[..split], false, 0.5).expect("aggregate should succeed");
        let right = aggregate(&records[split..], false, 0.5).expect("aggregate should succeed");
        let nested =
            aggregate(&[left.record, right.record], false, 0.5).expect("aggregate should succeed");

        assert_eq!(whole.record.billing_months, nested.record.billing_months);
        let e1 = whole.record.reactive_energy_kwh;
        let e2 = nested.record.reactive_energy_kwh;
        assert!((e1 - e2).abs() <= 1e-9 * e1);
        let t1 = whole.record.power_factor_tangent.unwrap_or_default();
        let t2 = nested.record.power_factor_tangent.unwrap_or_default();
        assert!((t1 - t2).abs() < 1e-9);
    }
}

#[test]
fn every_recommendation_is_a_catalog_model() {
    let rec = common::default_recommender();
    let mut rng = StdRng::seed_from_u64(SEED + 5);
    for _ in 0..300 {
        let record = MeteringRecord::new(
            rng.random_range(0.0..200_000.0),
            rng.random_range(1..=12),
        )
        .with_tangent(rng.random_range(0.01..2.0))
        .with_photovoltaic(rng.random_bool(0.5));
        let result = rec.compute(&record).expect("compute should succeed");
        let model = rec
            .list_devices()
            .iter()
            .find(|m| m.rating_kvar == result.rating_kvar)
            .expect("rating should exist in catalog");
        assert_eq!(model.model_name, result.recommendation.model_name);
        assert!(result.roi_years >= 0.0);
    }
}

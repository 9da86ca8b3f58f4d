use crate::catalog::Catalog;

/// Rounds a required rating up to a catalog rating.
///
/// Returns the smallest catalog rating `>= required_kvar`. Requirements
/// below the smallest model get the smallest model; requirements above the
/// largest model get the largest model, which callers detect with
/// [`is_beyond_catalog`]. Idempotent on catalog ratings and monotonic.
///
/// # Examples
///
/// ```
/// use kompensator::catalog::Catalog;
/// use kompensator::sizing::round_to_standard;
///
/// let cat = Catalog::default();
/// assert_eq!(round_to_standard(&cat, 0.4), 5);
/// assert_eq!(round_to_standard(&cat, 12.1), 15);
/// assert_eq!(round_to_standard(&cat, 30.0), 30);
/// assert_eq!(round_to_standard(&cat, 80.0), 50);
/// ```
pub fn round_to_standard(catalog: &Catalog, required_kvar: f64) -> u32 {
    catalog
        .ratings()
        .find(|&r| f64::from(r) >= required_kvar)
        .unwrap_or_else(|| catalog.max_rating())
}

/// Returns `true` when no single catalog model covers `required_kvar`.
pub fn is_beyond_catalog(catalog: &Catalog, required_kvar: f64) -> bool {
    required_kvar > f64::from(catalog.max_rating())
}

//! Device catalog: the ordered set of compensator models available for sale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

/// Switching technology of a compensator.
///
/// The catalog in this domain is made up of automatically switched units
/// only, so there is a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Automatically switched compensator.
    #[default]
    Dynamic,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensatorModel {
    /// Commercial model name, e.g. `"LOPI LKD 10 PRO"`.
    pub model_name: String,
    /// Rated reactive power (kvar).
    pub rating_kvar: u32,
    /// Switching technology.
    #[serde(default)]
    pub kind: DeviceKind,
    /// Unit price (PLN).
    pub unit_price: f64,
}

impl CompensatorModel {
    /// Creates a dynamic compensator entry.
    pub fn dynamic(model_name: impl Into<String>, rating_kvar: u32, unit_price: f64) -> Self {
        Self {
            model_name: model_name.into(),
            rating_kvar,
            kind: DeviceKind::Dynamic,
            unit_price,
        }
    }
}

/// `(model, kvar, price)` rows of the default LOPI LKD PRO line.
const LOPI_LKD_PRO: &[(&str, u32, f64)] = &[
    ("LOPI LKD 5 PRO", 5, 9000.0),
    ("LOPI LKD 10 PRO", 10, 9500.0),
    ("LOPI LKD 15 PRO", 15, 11000.0),
    ("LOPI LKD 20 PRO", 20, 12000.0),
    ("LOPI LKD 25 PRO", 25, 14000.0),
    ("LOPI LKD 30 PRO", 30, 16000.0),
    ("LOPI LKD 40 PRO", 40, 20000.0),
    ("LOPI LKD 50 PRO", 50, 25000.0),
];

/// Immutable, rating-ordered sequence of compensator models.
///
/// Built once (from configuration or [`Catalog::lopi_lkd_pro`]) and handed
/// to the engine; there is no mutation API.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    models: Vec<CompensatorModel>,
}

impl Catalog {
    /// Builds a catalog, sorting entries ascending by rating.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Catalog`] if `models` is empty, contains a zero
    /// rating, a negative or non-finite price, or two entries with the same
    /// rating.
    pub fn new(mut models: Vec<CompensatorModel>) -> Result<Self> {
        if models.is_empty() {
            return Err(CalcError::Catalog("catalog must not be empty".into()));
        }
        if let Some(m) = models.iter().find(|m| m.rating_kvar == 0) {
            return Err(CalcError::Catalog(format!(
                "model \"{}\" has a zero rating",
                m.model_name
            )));
        }
        if let Some(m) = models
            .iter()
            .find(|m| !m.unit_price.is_finite() || m.unit_price < 0.0)
        {
            return Err(CalcError::Catalog(format!(
                "model \"{}\" has an invalid price {}",
                m.model_name, m.unit_price
            )));
        }
        models.sort_by_key(|m| m.rating_kvar);
        if let Some(pair) = models
            .windows(2)
            .find(|w| w[0].rating_kvar == w[1].rating_kvar)
        {
            return Err(CalcError::Catalog(format!(
                "duplicate rating {} kvar (\"{}\", \"{}\")",
                pair[0].rating_kvar, pair[0].model_name, pair[1].model_name
            )));
        }
        Ok(Self { models })
    }

    /// The LOPI LKD PRO line, 5 to 50 kvar.
    pub fn lopi_lkd_pro() -> Self {
        Self {
            models: LOPI_LKD_PRO
                .iter()
                .map(|&(name, kvar, price)| CompensatorModel::dynamic(name, kvar, price))
                .collect(),
        }
    }

    /// All models, ascending by rating.
    pub fn models(&self) -> &[CompensatorModel] {
        &self.models
    }

    /// Ratings in ascending order.
    pub fn ratings(&self) -> impl Iterator<Item = u32> + '_ {
        self.models.iter().map(|m| m.rating_kvar)
    }

    /// Smallest manufactured rating.
    pub fn min_rating(&self) -> u32 {
        self.smallest().rating_kvar
    }

    /// Largest manufactured rating.
    pub fn max_rating(&self) -> u32 {
        self.largest().rating_kvar
    }

    /// Returns `true` if some model has exactly this rating.
    pub fn contains_rating(&self, rating_kvar: u32) -> bool {
        self.models.iter().any(|m| m.rating_kvar == rating_kvar)
    }

    /// Looks up the model for a rating.
    ///
    /// Exact match first, then the next larger model, then the largest model.
    /// Always returns an entry.
    pub fn lookup(&self, rating_kvar: u32) -> &CompensatorModel {
        self.models
            .iter()
            .find(|m| m.rating_kvar >= rating_kvar)
            .unwrap_or_else(|| self.largest())
    }

    fn smallest(&self) -> &CompensatorModel {
        // `new` rejects empty catalogs.
        &self.models[0]
    }

    fn largest(&self) -> &CompensatorModel {
        &self.models[self.models.len() - 1]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::lopi_lkd_pro()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_sorted() {
        let cat = Catalog::default();
        let ratings: Vec<u32> = cat.ratings().collect();
        assert_eq!(ratings, vec![5, 10, 15, 20, 25, 30, 40, 50]);
        assert_eq!(cat.min_rating(), 5);
        assert_eq!(cat.max_rating(), 50);
    }

    #[test]
    fn default_catalog_is_all_dynamic() {
        assert!(
            Catalog::default()
                .models()
                .iter()
                .all(|m| m.kind == DeviceKind::Dynamic)
        );
    }

    #[test]
    fn new_sorts_unordered_input() {
        let cat = Catalog::new(vec![
            CompensatorModel::dynamic("B", 20, 2.0),
            CompensatorModel::dynamic("A", 10, 1.0),
        ])
        .expect("catalog should build");
        assert_eq!(cat.models()[0].model_name, "A");
        assert_eq!(cat.max_rating(), 20);
    }

    #[test]
    fn new_rejects_empty() {
        assert!(matches!(Catalog::new(vec![]), Err(CalcError::Catalog(_))));
    }

    #[test]
    fn new_rejects_duplicate_ratings() {
        let err = Catalog::new(vec![
            CompensatorModel::dynamic("A", 10, 1.0),
            CompensatorModel::dynamic("B", 10, 2.0),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn new_rejects_zero_rating_and_bad_price() {
        assert!(Catalog::new(vec![CompensatorModel::dynamic("Z", 0, 1.0)]).is_err());
        assert!(Catalog::new(vec![CompensatorModel::dynamic("N", 5, f64::NAN)]).is_err());
    }

    #[test]
    fn lookup_exact_next_and_fallback() {
        let cat = Catalog::default();
        assert_eq!(cat.lookup(15).model_name, "LOPI LKD 15 PRO");
        assert_eq!(cat.lookup(35).model_name, "LOPI LKD 40 PRO");
        assert_eq!(cat.lookup(75).model_name, "LOPI LKD 50 PRO");
        assert_eq!(cat.lookup(0).model_name, "LOPI LKD 5 PRO");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let model = CompensatorModel::dynamic("X", 5, 1.0);
        let text = toml::to_string(&model).expect("model should serialize");
        assert!(text.contains("kind = \"dynamic\""));
    }
}

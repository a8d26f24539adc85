//! Crop- and region-dependent coefficients of the symbiotic fixation model.
//!
//! Every coefficient is a [`CoefficientTable`]: one default value plus an
//! ordered list of overrides keyed by crop and, optionally, region. Lookups
//! resolve most-specific-match-wins, so a `(crop, region)` override always
//! beats a crop-only override, which always beats the default. The same table
//! drives both the scalar [`CoefficientTable::resolve`] and the column
//! expression used by the estimator, so the two cannot disagree.

use std::fmt;

use polars::prelude::*;

use crate::schema::{crops, region};

/// Region buckets distinguished by Herridge et al. (2022).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Europe,
    Brazil,
    RestOfWorld,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Europe, Region::Brazil, Region::RestOfWorld];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Europe => region::EUROPE,
            Region::Brazil => region::BRAZIL,
            Region::RestOfWorld => region::ROW,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named exception to a table's default.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub crop: &'static str,
    pub region: Option<Region>,
    pub value: f64,
}

impl Override {
    pub fn crop(crop: &'static str, value: f64) -> Self {
        Self {
            crop,
            region: None,
            value,
        }
    }

    pub fn crop_in_region(crop: &'static str, region: Region, value: f64) -> Self {
        Self {
            crop,
            region: Some(region),
            value,
        }
    }

    fn specificity(&self) -> u8 {
        if self.region.is_some() {
            2
        } else {
            1
        }
    }

    fn matches(&self, crop: &str, region: Region) -> bool {
        self.crop == crop && self.region.map_or(true, |r| r == region)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    pub default: f64,
    /// Sorted most specific first; ties keep declaration order.
    overrides: Vec<Override>,
}

impl CoefficientTable {
    pub fn new(default: f64, mut overrides: Vec<Override>) -> Self {
        overrides.sort_by_key(|o| std::cmp::Reverse(o.specificity()));
        Self { default, overrides }
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    pub fn resolve(&self, crop: &str, region: Region) -> f64 {
        self.overrides
            .iter()
            .find(|o| o.matches(crop, region))
            .map_or(self.default, |o| o.value)
    }

    /// Column expression equivalent to [`resolve`](Self::resolve), evaluated
    /// per row on the given crop and region columns.
    pub fn expr(&self, crop_col: &str, region_col: &str) -> Expr {
        // Fold from least to most specific so the most specific check is outermost.
        self.overrides
            .iter()
            .rev()
            .fold(lit(self.default), |otherwise, o| {
                let mut cond = col(crop_col).eq(lit(o.crop));
                if let Some(r) = o.region {
                    cond = cond.and(col(region_col).eq(lit(r.as_str())));
                }
                when(cond).then(lit(o.value)).otherwise(otherwise)
            })
    }
}

/// Linear coefficients `(k, m)` of one formula step.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCoefficients {
    pub k: CoefficientTable,
    pub m: CoefficientTable,
}

/// Full parameterisation of the grain-legume model.
///
/// # Harvest index
///
/// $$HI = k \cdot \ln(yield) + m$$
///
/// # Shoot N concentration
///
/// $$c_N = (k \cdot DM_{shoot} / area + m) / 100$$
///
/// # Fixed N
///
/// $$N_{fixed} = c_N \cdot DM_{shoot} \cdot f_{BG} \cdot Ndfa$$
#[derive(Debug, Clone, PartialEq)]
pub struct SymbioticParameters {
    pub harvest_index: LinearCoefficients,
    /// `m` is in percent.
    pub shoot_n_concentration: LinearCoefficients,
    pub bg_n_factor: CoefficientTable,
    /// In percent; divided by 100 when applied.
    pub ndfa_percent: CoefficientTable,
}

impl Default for SymbioticParameters {
    fn default() -> Self {
        Self {
            harvest_index: LinearCoefficients {
                k: CoefficientTable::new(
                    0.0804,
                    vec![
                        Override::crop(crops::SOYBEAN, 0.1178),
                        Override::crop(crops::GROUNDNUT, 0.1343),
                        Override::crop(crops::PIGEONPEA, 0.0517),
                    ],
                ),
                m: CoefficientTable::new(
                    0.2839,
                    vec![
                        Override::crop(crops::SOYBEAN, 0.2775),
                        Override::crop(crops::GROUNDNUT, 0.2614),
                        Override::crop(crops::PIGEONPEA, 0.1647),
                    ],
                ),
            },
            shoot_n_concentration: LinearCoefficients {
                k: CoefficientTable::new(0.0, vec![Override::crop(crops::SOYBEAN, -0.118)]),
                m: CoefficientTable::new(
                    2.5,
                    vec![
                        Override::crop(crops::SOYBEAN, 3.913),
                        Override::crop(crops::GROUNDNUT, 2.7),
                        Override::crop(crops::CHICKPEA, 1.9),
                        Override::crop(crops::PIGEONPEA, 1.9),
                        Override::crop(crops::LUPIN, 2.7),
                    ],
                ),
            },
            bg_n_factor: CoefficientTable::new(
                1.4,
                vec![
                    Override::crop(crops::CHICKPEA, 2.0),
                    Override::crop(crops::PIGEONPEA, 2.0),
                ],
            ),
            ndfa_percent: CoefficientTable::new(
                62.0,
                vec![
                    Override::crop(crops::SOYBEAN, 61.0),
                    Override::crop(crops::COMMON_BEAN, 38.0),
                    Override::crop(crops::PIGEONPEA, 74.0),
                    Override::crop(crops::FABA_BEAN, 74.0),
                    Override::crop(crops::LUPIN, 74.0),
                    Override::crop_in_region(crops::SOYBEAN, Region::Europe, 44.0),
                    Override::crop_in_region(crops::SOYBEAN, Region::Brazil, 78.0),
                ],
            ),
        }
    }
}

impl SymbioticParameters {
    /// Ndfa as a fraction for one crop in one region.
    pub fn ndfa(&self, crop: &str, region: Region) -> f64 {
        self.ndfa_percent.resolve(crop, region) / 100.0
    }
}

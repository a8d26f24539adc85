//! Summary rollups of symbiotic and non-symbiotic fixation.
//!
//! Both estimates are stacked into one long table carrying a Low/Main/High
//! band, a `fixation_type` tag and a crop `category`, then summed at
//! increasingly coarse levels.

use polars::prelude::*;
use tracing::info;

use crate::config::UncertaintyBand;
use crate::error::BnfError;
use crate::frame::nan_aware_sum;
use crate::reference::ReferenceData;
use crate::schema::{band, fixation_type, production, rollup, symbiotic};

/// Crops reported under their own name rather than a generic category.
pub const CATEGORY_OVERRIDES: [(i64, &str); 2] = [(27, "Rice"), (156, "Sugar cane")];
pub const GRAIN_LEGUMES: &str = "Grain legumes";
pub const OTHER: &str = "Other";

/// Grouping level of a rollup. Every level is keyed by year; all but the
/// `*Total` levels are also keyed by fixation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupLevel {
    CountryCrop,
    CountryCategory,
    Crop,
    Category,
    Country,
    Global,
    /// Symbiotic plus non-symbiotic per country.
    CountryTotal,
    /// Symbiotic plus non-symbiotic worldwide.
    GlobalTotal,
}

impl RollupLevel {
    pub const ALL: [RollupLevel; 8] = [
        RollupLevel::CountryCrop,
        RollupLevel::CountryCategory,
        RollupLevel::Crop,
        RollupLevel::Category,
        RollupLevel::Country,
        RollupLevel::Global,
        RollupLevel::CountryTotal,
        RollupLevel::GlobalTotal,
    ];

    pub fn splits_fixation_type(&self) -> bool {
        !matches!(self, RollupLevel::CountryTotal | RollupLevel::GlobalTotal)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = match self {
            RollupLevel::CountryCrop => vec![
                production::AREA_CODE,
                production::AREA,
                production::ITEM_CODE,
                production::ITEM,
            ],
            RollupLevel::CountryCategory => {
                vec![production::AREA_CODE, production::AREA, rollup::CATEGORY]
            }
            RollupLevel::Crop => vec![production::ITEM_CODE, production::ITEM],
            RollupLevel::Category => vec![rollup::CATEGORY],
            RollupLevel::Country | RollupLevel::CountryTotal => {
                vec![production::AREA_CODE, production::AREA]
            }
            RollupLevel::Global | RollupLevel::GlobalTotal => vec![],
        };
        if self.splits_fixation_type() {
            keys.push(rollup::FIXATION_TYPE);
        }
        keys.push(production::YEAR);
        keys
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            RollupLevel::CountryCrop => "bnf-by-country-crop.csv",
            RollupLevel::CountryCategory => "bnf-by-country-category.csv",
            RollupLevel::Crop => "bnf-by-crop.csv",
            RollupLevel::Category => "bnf-by-category.csv",
            RollupLevel::Country => "bnf-by-country.csv",
            RollupLevel::Global => "bnf-global.csv",
            RollupLevel::CountryTotal => "bnf-by-country-total.csv",
            RollupLevel::GlobalTotal => "bnf-global-total.csv",
        }
    }
}

/// Attach a Low/Main/High band to the symbiotic point estimate by scaling.
pub fn symbiotic_band(
    enriched: &DataFrame,
    multipliers: &UncertaintyBand,
) -> Result<DataFrame, BnfError> {
    let mut select: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
    for (target, factor) in band::ALL
        .iter()
        .zip([multipliers.low, multipliers.main, multipliers.high])
    {
        select.push((col(symbiotic::CROP_N_FIXED_MGN) * lit(factor)).alias(*target));
    }
    Ok(enriched.clone().lazy().select(select).collect()?)
}

/// Static crop category: named overrides first, then legumes, then "Other".
pub fn category_of(reference: &ReferenceData, item_code: i64) -> &'static str {
    if let Some((_, name)) = CATEGORY_OVERRIDES.iter().find(|(code, _)| *code == item_code) {
        return *name;
    }
    if reference.crop_name(item_code).is_some() {
        GRAIN_LEGUMES
    } else {
        OTHER
    }
}

/// Stack banded symbiotic and non-symbiotic results into one long table.
pub fn combine(
    symbiotic_banded: &DataFrame,
    nonsymbiotic: &DataFrame,
    reference: &ReferenceData,
) -> Result<DataFrame, BnfError> {
    let tagged = |df: &DataFrame, tag: &str| {
        let mut select: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
        select.extend(band::ALL.iter().map(|c| col(*c)));
        select.push(lit(tag).alias(rollup::FIXATION_TYPE));
        df.clone().lazy().select(select)
    };

    let mut combined = concat(
        [
            tagged(symbiotic_banded, fixation_type::SYMBIOTIC),
            tagged(nonsymbiotic, fixation_type::NONSYMBIOTIC),
        ],
        UnionArgs::default(),
    )?
    .collect()?;

    let categories: StringChunked = combined
        .column(production::ITEM_CODE)?
        .i64()?
        .into_iter()
        .map(|code| code.map(|c| category_of(reference, c)))
        .collect();
    combined.with_column(categories.with_name(rollup::CATEGORY.into()).into_series())?;

    info!(rows = combined.height(), "Fixation results combined");
    Ok(combined)
}

/// NaN-aware sum of the band columns grouped at `level`, sorted by its keys.
pub fn rollup(combined: &DataFrame, level: RollupLevel) -> Result<DataFrame, BnfError> {
    let keys = level.keys();
    let df = combined
        .clone()
        .lazy()
        .group_by(keys.iter().map(|k| col(*k)).collect::<Vec<_>>())
        .agg(band::ALL.iter().map(|c| nan_aware_sum(c)).collect::<Vec<_>>())
        .sort(keys, SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

//! Literature-comparison tables and the requested-country report.
//!
//! Tables 2 and 4 mirror the layout of Herridge et al. (2022) so the
//! symbiotic estimates can be checked against the published numbers.

use std::path::Path;

use encoding_rs::UTF_8;
use polars::prelude::*;
use tracing::info;

use crate::error::BnfError;
use crate::frame::{
    ensure_unique, nan_aware_sum, order_frame, parse_float, parse_int, read_csv_as_strings,
    require_columns, round_columns, ORDER,
};
use crate::reference::ReferenceData;
use crate::schema::{
    band, crops, faostat, literature, production, reference as refcol, requested, symbiotic,
};

pub const TABLE_2_COUNTRIES: [&str; 5] = [
    "Brazil",
    "United States of America",
    "Argentina",
    "India",
    "China",
];

pub const TABLE_4_CATEGORIES: [&str; 3] = [crops::SOYBEAN, crops::GROUNDNUT, PULSES];

pub const TABLE_4_REGIONS: [&str; 6] = [
    "South, Central America",
    "North America",
    "Asia",
    "Europe",
    "Africa",
    "Oceania",
];

const PULSES: &str = "Pulses";
const MEGA: f64 = 1e6;

/// Uniqueness precondition shared by both literature tables.
const TABLE_KEY: [&str; 3] = [production::AREA, production::YEAR, production::ITEM_CODE];

/// Columns summed when regrouping the enriched table.
const SUMMED: [&str; 6] = [
    production::AREA_HARVESTED_HA,
    production::PRODUCTION_MG,
    symbiotic::SHOOT_DM_MG,
    symbiotic::SHOOT_N_MGN,
    symbiotic::TOTAL_CROP_N_MGN,
    symbiotic::CROP_N_FIXED_MGN,
];

// ── Literature tables ───────────────────────────────────────────────────────

/// Soybean in the five largest producers for one year, like Herridge et al.
/// (2022) table 2. Countries without data appear as empty rows.
pub fn literature_table_2(
    enriched: &DataFrame,
    reference: &ReferenceData,
    year: i64,
) -> Result<DataFrame, BnfError> {
    ensure_unique(enriched, &TABLE_KEY, "symbiotic results")?;

    let soybean = reference.item_code_for(crops::SOYBEAN).ok_or_else(|| {
        BnfError::MissingReferenceData(format!("no item code mapped to '{}'", crops::SOYBEAN))
    })?;

    let selected = enriched
        .clone()
        .lazy()
        .filter(
            col(production::ITEM_CODE)
                .eq(lit(soybean))
                .and(col(production::YEAR).eq(lit(year))),
        );

    let mut select = vec![col(production::AREA)];
    select.extend(presentation_columns());

    let mut df = order_frame(production::AREA, &TABLE_2_COUNTRIES)?
        .lazy()
        .join(
            selected,
            [col(production::AREA)],
            [col(production::AREA)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ORDER], SortMultipleOptions::default())
        .select(select)
        .collect()?;

    present(&mut df)?;
    Ok(df)
}

/// Legume category × continent totals for one year, like Herridge et al.
/// (2022) table 4.
pub fn literature_table_4(
    enriched: &DataFrame,
    reference: &ReferenceData,
    year: i64,
) -> Result<DataFrame, BnfError> {
    ensure_unique(enriched, &TABLE_KEY, "symbiotic results")?;

    let crop = col(refcol::CROP);
    let legume_category = when(
        crop.clone()
            .eq(lit(crops::SOYBEAN))
            .or(crop.clone().eq(lit(crops::GROUNDNUT))),
    )
    .then(crop)
    .otherwise(lit(PULSES))
    .alias(literature::LEGUME_CATEGORY);

    let grouped = enriched
        .clone()
        .lazy()
        .filter(col(production::YEAR).eq(lit(year)))
        .join(
            reference.continent_frame()?.lazy(),
            [col(production::AREA_CODE)],
            [col(production::AREA_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns([
            legume_category,
            col(refcol::CONTINENT).alias(literature::REGION),
        ])
        .group_by([col(literature::LEGUME_CATEGORY), col(literature::REGION)])
        .agg(SUMMED.iter().map(|c| nan_aware_sum(c)).collect::<Vec<_>>())
        .with_column(
            (col(production::PRODUCTION_MG) / col(production::AREA_HARVESTED_HA))
                .alias(symbiotic::YIELD_MG_PER_HA),
        );

    let category_order = order_frame(literature::LEGUME_CATEGORY, &TABLE_4_CATEGORIES)?
        .lazy()
        .rename([ORDER], ["_category_order"], true);
    let region_order = order_frame(literature::REGION, &TABLE_4_REGIONS)?
        .lazy()
        .rename([ORDER], ["_region_order"], true);

    let mut select = vec![col(literature::LEGUME_CATEGORY), col(literature::REGION)];
    select.extend(presentation_columns());

    let mut df = grouped
        .join(
            category_order,
            [col(literature::LEGUME_CATEGORY)],
            [col(literature::LEGUME_CATEGORY)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            region_order,
            [col(literature::REGION)],
            [col(literature::REGION)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort(
            ["_category_order", "_region_order"],
            SortMultipleOptions::default(),
        )
        .select(select)
        .collect()?;

    present(&mut df)?;
    Ok(df)
}

/// Areas in Mha and masses in Tg.
fn presentation_columns() -> Vec<Expr> {
    vec![
        (col(production::AREA_HARVESTED_HA) / lit(MEGA)).alias(literature::TOTAL_AREA_MHA),
        (col(production::PRODUCTION_MG) / lit(MEGA)).alias(literature::GRAIN_PROD_TG),
        col(symbiotic::YIELD_MG_PER_HA).alias(literature::GRAIN_YIELD),
        (col(symbiotic::SHOOT_DM_MG) / lit(MEGA)).alias(literature::SHOOT_DM_TG),
        (col(symbiotic::SHOOT_N_MGN) / lit(MEGA)).alias(literature::SHOOT_N_TG),
        (col(symbiotic::TOTAL_CROP_N_MGN) / lit(MEGA)).alias(literature::TOTAL_CROP_N_TG),
        (col(symbiotic::CROP_N_FIXED_MGN) / lit(MEGA)).alias(literature::CROP_N_FIXED_TG),
    ]
}

fn present(df: &mut DataFrame) -> Result<(), BnfError> {
    round_columns(df, &literature::ONE_DECIMAL, 1)?;
    round_columns(df, &literature::VALUES, 2)?;
    Ok(())
}

// ── Requested countries ─────────────────────────────────────────────────────

/// Read the requested-country table: `Area`, `Year` and
/// `requested_total_bnf_MgN` (may be empty).
pub fn read_requested(path: &Path) -> Result<DataFrame, BnfError> {
    let raw = read_csv_as_strings(path, UTF_8)?;
    require_columns(
        &raw,
        &[
            faostat::AREA,
            faostat::YEAR,
            requested::REQUESTED_TOTAL_BNF_MGN,
        ],
    )
    .map_err(|e| BnfError::InputFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let df = raw
        .lazy()
        .select([
            col(faostat::AREA)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .alias(production::AREA),
            parse_int(faostat::YEAR).alias(production::YEAR),
            parse_float(requested::REQUESTED_TOTAL_BNF_MGN),
        ])
        .collect()?;
    ensure_unique(&df, &[production::AREA, production::YEAR], "requested countries")?;
    Ok(df)
}

/// Attach the country total (Main band, all fixation types) as
/// `FAO_requested_total_BNF_MgN` and use it to fill requested cells that are
/// missing. Values already present in the request are never overwritten.
pub fn cross_fill_requested(
    requested_df: &DataFrame,
    by_country: &DataFrame,
) -> Result<DataFrame, BnfError> {
    let totals = by_country
        .clone()
        .lazy()
        .group_by([col(production::AREA), col(production::YEAR)])
        .agg([nan_aware_sum(band::FIXED_N_MAIN_MGN)])
        .select([
            col(production::AREA),
            col(production::YEAR),
            col(band::FIXED_N_MAIN_MGN).alias(requested::FAO_REQUESTED_TOTAL_BNF_MGN),
        ]);

    let own = col(requested::REQUESTED_TOTAL_BNF_MGN).fill_nan(lit(NULL));
    let df = requested_df
        .clone()
        .lazy()
        .join(
            totals,
            [col(production::AREA), col(production::YEAR)],
            [col(production::AREA), col(production::YEAR)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(
            when(own.clone().is_not_null())
                .then(own)
                .otherwise(col(requested::FAO_REQUESTED_TOTAL_BNF_MGN))
                .alias(requested::REQUESTED_TOTAL_BNF_MGN),
        )
        .select([
            col(production::AREA),
            col(production::YEAR),
            col(requested::REQUESTED_TOTAL_BNF_MGN),
            col(requested::FAO_REQUESTED_TOTAL_BNF_MGN),
        ])
        .sort(
            [production::AREA, production::YEAR],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let still_missing = df.column(requested::REQUESTED_TOTAL_BNF_MGN)?.null_count();
    info!(
        rows = df.height(),
        still_missing,
        "Requested countries cross-filled"
    );
    Ok(df)
}

//! Symbiotic fixation in grain legumes, following Peoples et al. (2021) and
//! Herridge et al. (2022).

use std::f64::consts::E;

use polars::prelude::*;
use tracing::info;

use crate::coefficients::{CoefficientTable, SymbioticParameters};
use crate::error::BnfError;
use crate::reference::ReferenceData;
use crate::schema::{production, reference as refcol, symbiotic::*};

/// Estimate symbiotic fixation for every crop production record whose item
/// is a modelled legume and whose area has a region.
///
/// Input columns: `area_code`, `area`, `item_code`, `item`, `year`,
/// `area_harvested_ha`, `production_Mg`. Output keeps those, adds `crop` and
/// `region`, then every derived column in derivation order.
///
/// Zero or missing area/production never fails: division by zero yields
/// ±inf or NaN and nulls stay null, both propagating to `crop_n_fixed_MgN`.
pub fn estimate_fixation(
    crop_production: &DataFrame,
    reference: &ReferenceData,
    params: &SymbioticParameters,
) -> Result<DataFrame, BnfError> {
    let coeff = |table: &CoefficientTable| table.expr(refcol::CROP, refcol::REGION);
    let hi = &params.harvest_index;
    let conc = &params.shoot_n_concentration;

    let mut output: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
    output.extend(
        [
            production::AREA_HARVESTED_HA,
            production::PRODUCTION_MG,
            refcol::CROP,
            refcol::REGION,
        ]
        .iter()
        .chain(DERIVED.iter())
        .map(|c| col(*c)),
    );

    // Inner joins: rows outside the legume/region domain are dropped.
    let result = crop_production
        .clone()
        .lazy()
        .join(
            reference.crop_frame()?.lazy(),
            [col(production::ITEM_CODE)],
            [col(production::ITEM_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            reference.region_frame()?.lazy(),
            [col(production::AREA_CODE)],
            [col(production::AREA_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_column(
            (col(production::PRODUCTION_MG) / col(production::AREA_HARVESTED_HA))
                .alias(YIELD_MG_PER_HA),
        )
        .with_column(
            (coeff(&hi.k) * col(YIELD_MG_PER_HA).log(lit(E)) + coeff(&hi.m)).alias(HARVEST_INDEX),
        )
        .with_column((col(production::PRODUCTION_MG) / col(HARVEST_INDEX)).alias(SHOOT_DM_MG))
        .with_column(
            ((coeff(&conc.k) * col(SHOOT_DM_MG) / col(production::AREA_HARVESTED_HA)
                + coeff(&conc.m))
                / lit(100.0))
            .alias(SHOOT_N_CONCENTRATION),
        )
        .with_column((col(SHOOT_DM_MG) * col(SHOOT_N_CONCENTRATION)).alias(SHOOT_N_MGN))
        .with_column(coeff(&params.bg_n_factor).alias(BG_N_FACTOR))
        .with_column((col(SHOOT_N_MGN) * col(BG_N_FACTOR)).alias(TOTAL_CROP_N_MGN))
        .with_column((coeff(&params.ndfa_percent) / lit(100.0)).alias(NDFA))
        .with_column((col(TOTAL_CROP_N_MGN) * col(NDFA)).alias(CROP_N_FIXED_MGN))
        .select(output)
        .sort(production::KEY, SortMultipleOptions::default())
        .collect()?;

    info!(rows = result.height(), "Symbiotic fixation estimated");
    Ok(result)
}

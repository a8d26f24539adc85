//! Non-symbiotic fixation: a per-hectare coefficient band times harvested area.

use polars::prelude::*;
use tracing::info;

use crate::error::BnfError;
use crate::reference::ReferenceData;
use crate::schema::{band, production, reference as refcol};

/// kg → Mg
const KG_TO_MG: f64 = 1e-3;

/// Estimate `{Low, Main, High}` fixed N (MgN) for every record with a
/// harvested area whose item has coefficients. Other items produce no rows.
pub fn estimate_fixation_mgn(
    crop_production: &DataFrame,
    reference: &ReferenceData,
) -> Result<DataFrame, BnfError> {
    let mut output: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
    output.push(col(production::AREA_HARVESTED_HA));
    for (coefficient, target) in [refcol::LOW, refcol::MAIN, refcol::HIGH]
        .iter()
        .zip(band::ALL)
    {
        output.push(
            (col(*coefficient) * lit(KG_TO_MG) * col(production::AREA_HARVESTED_HA)).alias(target),
        );
    }

    let df = crop_production
        .clone()
        .lazy()
        .filter(col(production::AREA_HARVESTED_HA).is_not_null())
        .join(
            reference.nonsymbiotic_frame()?.lazy(),
            [col(production::ITEM_CODE)],
            [col(production::ITEM_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .select(output)
        .sort(production::KEY, SortMultipleOptions::default())
        .collect()?;

    info!(rows = df.height(), "Non-symbiotic fixation estimated");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::reference::FixationBand;

    fn reference() -> ReferenceData {
        let nonsymbiotic = BTreeMap::from([(
            27,
            FixationBand {
                low: 5.0,
                main: 10.0,
                high: 15.0,
            },
        )]);
        ReferenceData::new(BTreeMap::new(), BTreeMap::new(), BTreeMap::new(), nonsymbiotic)
    }

    fn production() -> DataFrame {
        df![
            production::AREA_CODE => [21i64, 21, 79],
            production::AREA => ["Brazil", "Brazil", "Germany"],
            production::ITEM_CODE => [27i64, 15, 27],
            production::ITEM => ["Rice", "Wheat", "Rice"],
            production::YEAR => [2018i64, 2018, 2018],
            production::AREA_HARVESTED_HA => [Some(1.0e5), Some(2.0e6), None],
            production::PRODUCTION_MG => [Some(5.0e5), Some(6.0e6), Some(1.0)],
        ]
        .unwrap()
    }

    #[test]
    fn coefficient_band_times_area() {
        let out = estimate_fixation_mgn(&production(), &reference()).unwrap();
        // Wheat has no coefficients, Germany has no harvested area
        assert_eq!(out.height(), 1);

        let get = |c: &str| out.column(c).unwrap().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(get(band::FIXED_N_LOW_MGN), 500.0, max_relative = 1e-12);
        assert_relative_eq!(get(band::FIXED_N_MAIN_MGN), 1000.0, max_relative = 1e-12);
        assert_relative_eq!(get(band::FIXED_N_HIGH_MGN), 1500.0, max_relative = 1e-12);
    }

    #[test]
    fn band_is_ordered() {
        let out = estimate_fixation_mgn(&production(), &reference()).unwrap();
        let low = out.column(band::FIXED_N_LOW_MGN).unwrap().f64().unwrap();
        let main = out.column(band::FIXED_N_MAIN_MGN).unwrap().f64().unwrap();
        let high = out.column(band::FIXED_N_HIGH_MGN).unwrap().f64().unwrap();
        for i in 0..out.height() {
            assert!(low.get(i) <= main.get(i) && main.get(i) <= high.get(i));
        }
    }
}

//! FAOSTAT normalized production data → wide crop production records.

use std::path::Path;

use encoding_rs::Encoding;
use polars::prelude::*;
use tracing::info;

use crate::error::BnfError;
use crate::frame::{ensure_unique, parse_float, parse_int, read_csv_as_strings, require_columns};
use crate::schema::{faostat, production};

/// Read the decompressed FAOSTAT bulk CSV and return its typed long form:
/// `(area_code, area, item_code, item, element_code, year, value)`.
pub fn read_faostat_long(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<DataFrame, BnfError> {
    let raw = read_csv_as_strings(path, encoding)?;
    require_columns(
        &raw,
        &[
            faostat::AREA_CODE,
            faostat::AREA,
            faostat::ITEM_CODE,
            faostat::ITEM,
            faostat::ELEMENT_CODE,
            faostat::YEAR,
            faostat::VALUE,
        ],
    )?;

    let df = raw
        .lazy()
        .select([
            parse_int(faostat::AREA_CODE).alias(production::AREA_CODE),
            col(faostat::AREA).alias(production::AREA),
            parse_int(faostat::ITEM_CODE).alias(production::ITEM_CODE),
            col(faostat::ITEM).alias(production::ITEM),
            parse_int(faostat::ELEMENT_CODE).alias(faostat::ELEMENT_CODE),
            parse_int(faostat::YEAR).alias(production::YEAR),
            parse_float(faostat::VALUE).alias(faostat::VALUE),
        ])
        .collect()?;

    info!(rows = df.height(), path = %path.display(), "FAOSTAT production data read");
    Ok(df)
}

/// Reshape the long table into one row per `(area_code, item_code, year)`
/// with `area_harvested_ha` and `production_Mg` columns.
///
/// Rows present for only one of the two elements keep a null for the other.
/// Fails with `NonUniqueKey` if an element is reported twice for a key.
pub fn to_crop_production(long: &DataFrame) -> Result<DataFrame, BnfError> {
    let element = |code: i64, alias: &str| -> Result<DataFrame, BnfError> {
        let mut select: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
        select.push(col(faostat::VALUE).alias(alias));
        let df = long
            .clone()
            .lazy()
            .filter(col(faostat::ELEMENT_CODE).eq(lit(code)))
            .select(select)
            .collect()?;
        ensure_unique(&df, &production::KEY, alias)?;
        Ok(df)
    };

    let area = element(faostat::ELEMENT_AREA_HARVESTED, production::AREA_HARVESTED_HA)?;
    let prod = element(faostat::ELEMENT_PRODUCTION, production::PRODUCTION_MG)?;

    let keys: Vec<Expr> = production::LABELS.iter().map(|c| col(*c)).collect();
    let mut output: Vec<Expr> = keys.clone();
    output.push(col(production::AREA_HARVESTED_HA));
    output.push(col(production::PRODUCTION_MG));

    let wide = area
        .lazy()
        .join(
            prod.lazy(),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .select(output)
        .sort(production::KEY, SortMultipleOptions::default())
        .collect()?;

    ensure_unique(&wide, &production::KEY, "crop production")?;

    info!(rows = wide.height(), "Crop production records reshaped");
    Ok(wide)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long() -> DataFrame {
        df![
            production::AREA_CODE => [21i64, 21, 21, 21, 79],
            production::AREA => ["Brazil", "Brazil", "Brazil", "Brazil", "Germany"],
            production::ITEM_CODE => [236i64, 236, 236, 27, 236],
            production::ITEM => ["Soya beans", "Soya beans", "Soya beans", "Rice", "Soya beans"],
            faostat::ELEMENT_CODE => [5312i64, 5510, 5419, 5312, 5510],
            production::YEAR => [2018i64, 2018, 2018, 2018, 2018],
            faostat::VALUE => [Some(3.5e7), Some(1.2e8), Some(34000.0), Some(1.8e6), Some(6.0e4)],
        ]
        .unwrap()
    }

    #[test]
    fn pivots_the_two_elements_and_keeps_partial_rows() {
        let wide = to_crop_production(&long()).unwrap();
        assert_eq!(wide.height(), 3);

        let codes = wide.column(production::ITEM_CODE).unwrap().i64().unwrap();
        let areas = wide.column(production::AREA_CODE).unwrap().i64().unwrap();
        let harvested = wide.column(production::AREA_HARVESTED_HA).unwrap().f64().unwrap();
        let prod = wide.column(production::PRODUCTION_MG).unwrap().f64().unwrap();

        // Sorted by (area_code, item_code, year)
        assert_eq!((areas.get(0), codes.get(0)), (Some(21), Some(27)));
        assert_eq!(harvested.get(0), Some(1.8e6));
        assert_eq!(prod.get(0), None);

        assert_eq!((areas.get(1), codes.get(1)), (Some(21), Some(236)));
        assert_eq!(harvested.get(1), Some(3.5e7));
        assert_eq!(prod.get(1), Some(1.2e8));

        assert_eq!((areas.get(2), codes.get(2)), (Some(79), Some(236)));
        assert_eq!(harvested.get(2), None);
        assert_eq!(prod.get(2), Some(6.0e4));
    }

    #[test]
    fn reads_windows_1252_bulk_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("faostat.csv");
        let csv = "Area Code,Area,Item Code,Item,Element Code,Element,Year,Unit,Value\n\
                   107,C\u{f4}te d'Ivoire,191,Chick peas,5312,Area harvested,2018,ha,1200\n";
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(csv);
        std::fs::write(&path, &bytes).unwrap();

        let long = read_faostat_long(&path, encoding_rs::WINDOWS_1252).unwrap();
        let area = long.column(production::AREA).unwrap().str().unwrap();
        assert_eq!(area.get(0), Some("Côte d'Ivoire"));
        assert_eq!(
            long.column(production::AREA_CODE).unwrap().i64().unwrap().get(0),
            Some(107)
        );
        assert_eq!(long.column(faostat::VALUE).unwrap().f64().unwrap().get(0), Some(1200.0));
    }

    #[test]
    fn duplicated_element_is_rejected() {
        let mut dup = long();
        dup.vstack_mut(&long().head(Some(1))).unwrap();
        let err = to_crop_production(&dup).unwrap_err();
        assert!(matches!(err, BnfError::NonUniqueKey(_)));
    }
}

//! Static lookup tables: crop names, regions, continent groups and
//! non-symbiotic coefficients.
//!
//! Loaded once at startup into an immutable [`ReferenceData`] that is passed
//! by reference to every estimator.

use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_8;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::coefficients::Region;
use crate::config::Config;
use crate::error::BnfError;
use crate::frame::{ensure_unique, parse_float, parse_int, read_csv_as_strings, require_columns};
use crate::schema::{production, reference as refcol};

/// FAOSTAT country groups collapsed into the continent buckets of
/// Herridge et al. (2022) table 4. Groups not listed are ignored.
pub const FAO_GROUP_TO_CONTINENT: [(&str, &str); 7] = [
    ("South America", "South, Central America"),
    ("Central America", "South, Central America"),
    ("Northern America", "North America"),
    ("Asia", "Asia"),
    ("Europe", "Europe"),
    ("Africa", "Africa"),
    ("Oceania", "Oceania"),
];

const EUROPE_GROUP: &str = "Europe";
const BRAZIL_COUNTRY: &str = "Brazil";

/// Non-symbiotic fixation coefficients in kg N per hectare harvested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationBand {
    pub low: f64,
    pub main: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    crop_names: BTreeMap<i64, String>,
    regions: BTreeMap<i64, Region>,
    continents: BTreeMap<i64, String>,
    nonsymbiotic: BTreeMap<i64, FixationBand>,
}

impl ReferenceData {
    pub fn new(
        crop_names: BTreeMap<i64, String>,
        regions: BTreeMap<i64, Region>,
        continents: BTreeMap<i64, String>,
        nonsymbiotic: BTreeMap<i64, FixationBand>,
    ) -> Self {
        Self {
            crop_names,
            regions,
            continents,
            nonsymbiotic,
        }
    }

    /// Load all four reference tables from the configured input directory.
    pub fn load(config: &Config) -> Result<Self, BnfError> {
        let crop_names = load_crop_names(&config.indata_path(&config.crop_names_file))?;
        let countries = read_reference(
            &config.indata_path(&config.country_region_file),
            &[refcol::SRC_COUNTRY_CODE, refcol::SRC_COUNTRY],
        )?;
        let groups = read_reference(
            &config.indata_path(&config.country_group_file),
            &[
                refcol::SRC_COUNTRY_GROUP,
                refcol::SRC_COUNTRY_CODE,
                refcol::SRC_COUNTRY,
            ],
        )?;
        let regions = build_regions(&countries, &groups)?;
        let continents = build_continents(&groups)?;
        let nonsymbiotic =
            load_nonsymbiotic(&config.indata_path(&config.nonsymbiotic_coefficients_file))?;

        debug!(
            crops = crop_names.len(),
            regions = regions.len(),
            continents = continents.len(),
            nonsymbiotic_items = nonsymbiotic.len(),
            "Reference data loaded"
        );

        Ok(Self::new(crop_names, regions, continents, nonsymbiotic))
    }

    // ── Lookups ─────────────────────────────────────────────────────────────

    pub fn crop_name(&self, item_code: i64) -> Option<&str> {
        self.crop_names.get(&item_code).map(|s| s.as_str())
    }

    pub fn item_code_for(&self, crop: &str) -> Option<i64> {
        self.crop_names
            .iter()
            .find(|(_, name)| name.as_str() == crop)
            .map(|(code, _)| *code)
    }

    pub fn region(&self, area_code: i64) -> Option<Region> {
        self.regions.get(&area_code).copied()
    }

    pub fn continent(&self, area_code: i64) -> Option<&str> {
        self.continents.get(&area_code).map(|s| s.as_str())
    }

    pub fn nonsymbiotic_coefficients(&self, item_code: i64) -> Option<FixationBand> {
        self.nonsymbiotic.get(&item_code).copied()
    }

    // ── Join frames ─────────────────────────────────────────────────────────

    /// `(item_code, crop)`
    pub fn crop_frame(&self) -> Result<DataFrame, BnfError> {
        let codes: Vec<i64> = self.crop_names.keys().copied().collect();
        let names: Vec<&str> = self.crop_names.values().map(|s| s.as_str()).collect();
        Ok(DataFrame::new(vec![
            Column::new(production::ITEM_CODE.into(), &codes),
            Column::new(refcol::CROP.into(), &names),
        ])?)
    }

    /// `(area_code, region)`
    pub fn region_frame(&self) -> Result<DataFrame, BnfError> {
        let codes: Vec<i64> = self.regions.keys().copied().collect();
        let labels: Vec<&str> = self.regions.values().map(|r| r.as_str()).collect();
        Ok(DataFrame::new(vec![
            Column::new(production::AREA_CODE.into(), &codes),
            Column::new(refcol::REGION.into(), &labels),
        ])?)
    }

    /// `(area_code, continent)`
    pub fn continent_frame(&self) -> Result<DataFrame, BnfError> {
        let codes: Vec<i64> = self.continents.keys().copied().collect();
        let labels: Vec<&str> = self.continents.values().map(|s| s.as_str()).collect();
        Ok(DataFrame::new(vec![
            Column::new(production::AREA_CODE.into(), &codes),
            Column::new(refcol::CONTINENT.into(), &labels),
        ])?)
    }

    /// `(item_code, Low, Main, High)` in kg N per hectare.
    pub fn nonsymbiotic_frame(&self) -> Result<DataFrame, BnfError> {
        let codes: Vec<i64> = self.nonsymbiotic.keys().copied().collect();
        let low: Vec<f64> = self.nonsymbiotic.values().map(|b| b.low).collect();
        let main: Vec<f64> = self.nonsymbiotic.values().map(|b| b.main).collect();
        let high: Vec<f64> = self.nonsymbiotic.values().map(|b| b.high).collect();
        Ok(DataFrame::new(vec![
            Column::new(production::ITEM_CODE.into(), &codes),
            Column::new(refcol::LOW.into(), &low),
            Column::new(refcol::MAIN.into(), &main),
            Column::new(refcol::HIGH.into(), &high),
        ])?)
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

/// Any failure to read a reference file is fatal for the run.
fn read_reference(path: &Path, required: &[&str]) -> Result<DataFrame, BnfError> {
    let missing = |e: BnfError| BnfError::MissingReferenceData(format!("{}: {e}", path.display()));
    let df = read_csv_as_strings(path, UTF_8).map_err(missing)?;
    require_columns(&df, required).map_err(missing)?;
    Ok(df)
}

fn load_crop_names(path: &Path) -> Result<BTreeMap<i64, String>, BnfError> {
    let raw = read_reference(path, &[refcol::SRC_ITEM_CODE, refcol::SRC_CROP_HERRIDGE])?;
    let df = raw
        .lazy()
        .select([
            parse_int(refcol::SRC_ITEM_CODE).alias(production::ITEM_CODE),
            col(refcol::SRC_CROP_HERRIDGE)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .alias(refcol::CROP),
        ])
        .filter(
            col(production::ITEM_CODE)
                .is_not_null()
                .and(col(refcol::CROP).is_not_null()),
        )
        .collect()?;
    ensure_unique(&df, &[production::ITEM_CODE], "crop names")?;

    let codes = df.column(production::ITEM_CODE)?.i64()?;
    let names = df.column(refcol::CROP)?.str()?;
    let map = codes
        .into_iter()
        .zip(names)
        .filter_map(|(code, name)| match (code, name) {
            (Some(code), Some(name)) if !name.is_empty() => Some((code, name.to_string())),
            _ => None,
        })
        .collect();
    Ok(map)
}

/// Every listed country defaults to ROW; members of the FAOSTAT "Europe"
/// group (and the Europe aggregate itself) become Europe; Brazil last.
fn build_regions(countries: &DataFrame, groups: &DataFrame) -> Result<BTreeMap<i64, Region>, BnfError> {
    let countries = countries
        .clone()
        .lazy()
        .select([
            parse_int(refcol::SRC_COUNTRY_CODE),
            col(refcol::SRC_COUNTRY).str().strip_chars(lit(" \t\r\n")),
        ])
        .filter(col(refcol::SRC_COUNTRY_CODE).is_not_null())
        .collect()?;

    let codes = countries.column(refcol::SRC_COUNTRY_CODE)?.i64()?;
    let names = countries.column(refcol::SRC_COUNTRY)?.str()?;

    let mut regions: BTreeMap<i64, Region> = BTreeMap::new();
    let mut brazil_codes = Vec::new();
    for (code, name) in codes.into_iter().zip(names) {
        let Some(code) = code else { continue };
        regions.insert(code, Region::RestOfWorld);
        if name == Some(BRAZIL_COUNTRY) {
            brazil_codes.push(code);
        }
    }

    let europe = groups
        .clone()
        .lazy()
        .filter(
            col(refcol::SRC_COUNTRY_GROUP)
                .eq(lit(EUROPE_GROUP))
                .or(col(refcol::SRC_COUNTRY).eq(lit(EUROPE_GROUP))),
        )
        .select([parse_int(refcol::SRC_COUNTRY_CODE)])
        .collect()?;
    for code in europe.column(refcol::SRC_COUNTRY_CODE)?.i64()?.into_iter().flatten() {
        if let Some(region) = regions.get_mut(&code) {
            *region = Region::Europe;
        }
    }

    let brazil = match brazil_codes.as_slice() {
        [code] => *code,
        [] => {
            return Err(BnfError::MissingReferenceData(format!(
                "country '{BRAZIL_COUNTRY}' not found in country list"
            )))
        }
        many => {
            return Err(BnfError::MissingReferenceData(format!(
                "country '{BRAZIL_COUNTRY}' is ambiguous in country list: codes {many:?}"
            )))
        }
    };
    regions.insert(brazil, Region::Brazil);

    Ok(regions)
}

fn build_continents(groups: &DataFrame) -> Result<BTreeMap<i64, String>, BnfError> {
    let df = groups
        .clone()
        .lazy()
        .select([
            parse_int(refcol::SRC_COUNTRY_CODE),
            col(refcol::SRC_COUNTRY_GROUP).str().strip_chars(lit(" \t\r\n")),
        ])
        .filter(col(refcol::SRC_COUNTRY_CODE).is_not_null())
        .collect()?;

    let codes = df.column(refcol::SRC_COUNTRY_CODE)?.i64()?;
    let fao_groups = df.column(refcol::SRC_COUNTRY_GROUP)?.str()?;

    let mut continents: BTreeMap<i64, String> = BTreeMap::new();
    for (code, group) in codes.into_iter().zip(fao_groups) {
        let (Some(code), Some(group)) = (code, group) else {
            continue;
        };
        let Some((_, continent)) = FAO_GROUP_TO_CONTINENT.iter().find(|(g, _)| *g == group) else {
            continue;
        };
        match continents.get(&code) {
            None => {
                continents.insert(code, continent.to_string());
            }
            Some(existing) if existing != continent => {
                warn!(
                    area_code = code,
                    kept = %existing,
                    ignored = %continent,
                    "Country belongs to more than one continent group"
                );
            }
            Some(_) => {}
        }
    }
    Ok(continents)
}

fn load_nonsymbiotic(path: &Path) -> Result<BTreeMap<i64, FixationBand>, BnfError> {
    let raw = read_reference(
        path,
        &[refcol::SRC_ITEM_CODE, refcol::LOW, refcol::MAIN, refcol::HIGH],
    )?;
    let df = raw
        .lazy()
        .select([
            parse_int(refcol::SRC_ITEM_CODE).alias(production::ITEM_CODE),
            parse_float(refcol::LOW),
            parse_float(refcol::MAIN),
            parse_float(refcol::HIGH),
        ])
        .filter(col(production::ITEM_CODE).is_not_null())
        .collect()?;
    ensure_unique(&df, &[production::ITEM_CODE], "non-symbiotic coefficients")?;

    let codes = df.column(production::ITEM_CODE)?.i64()?;
    let low = df.column(refcol::LOW)?.f64()?;
    let main = df.column(refcol::MAIN)?.f64()?;
    let high = df.column(refcol::HIGH)?.f64()?;

    let mut map = BTreeMap::new();
    for i in 0..df.height() {
        let Some(code) = codes.get(i) else { continue };
        match (low.get(i), main.get(i), high.get(i)) {
            (Some(low), Some(main), Some(high)) => {
                map.insert(code, FixationBand { low, main, high });
            }
            _ => warn!(item_code = code, "Skipping item with incomplete non-symbiotic coefficients"),
        }
    }
    Ok(map)
}

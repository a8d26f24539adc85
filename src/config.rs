use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::error::BnfError;

/// Multipliers turning the symbiotic point estimate into a Low/Main/High band.
///
/// The symbiotic model has no native uncertainty, unlike the non-symbiotic
/// coefficients which come with their own band.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct UncertaintyBand {
    pub low: f64,
    pub main: f64,
    pub high: f64,
}

impl Default for UncertaintyBand {
    fn default() -> Self {
        Self {
            low: 0.9,
            main: 1.0,
            high: 1.1,
        }
    }
}

/// Run configuration. Every field has a default so an empty TOML file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indata_dir: PathBuf,
    pub outdata_dir: PathBuf,

    /// Decompressed FAOSTAT "Production_Crops_Livestock_E_All_Data_(Normalized)" CSV.
    pub production_file: String,
    /// WHATWG label of the production file's encoding.
    pub production_encoding: String,
    pub crop_names_file: String,
    pub country_region_file: String,
    pub country_group_file: String,
    pub nonsymbiotic_coefficients_file: String,
    /// Optional per-country requests to cross-fill from the computed totals.
    pub requested_file: Option<String>,

    /// Year selected for the literature-comparison tables.
    pub comparison_year: i64,
    pub uncertainty: UncertaintyBand,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indata_dir: PathBuf::from("indata"),
            outdata_dir: PathBuf::from("outdata"),
            production_file: "Production_Crops_Livestock_E_All_Data_(Normalized).csv".into(),
            production_encoding: "windows-1252".into(),
            crop_names_file: "crop-names-herridge.csv".into(),
            country_region_file: "faostat_definitions_country_region_2022-10-01.csv".into(),
            country_group_file: "faostat_definitions_country_group_2022-10-01.csv".into(),
            nonsymbiotic_coefficients_file:
                "nonsymbiotic-fixation-coefficients-kg-per-ha-harvest.csv".into(),
            requested_file: None,
            comparison_year: 2018,
            uncertainty: UncertaintyBand::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, BnfError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, BnfError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), BnfError> {
        let band = &self.uncertainty;
        let finite = [band.low, band.main, band.high]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0);
        if !finite || band.low > band.main || band.main > band.high {
            return Err(BnfError::Config(format!(
                "uncertainty multipliers must be non-negative and ordered low <= main <= high, got {band:?}"
            )));
        }
        self.production_encoding()?;
        Ok(())
    }

    pub fn production_encoding(&self) -> Result<&'static Encoding, BnfError> {
        Encoding::for_label(self.production_encoding.as_bytes()).ok_or_else(|| {
            BnfError::Config(format!(
                "unknown production_encoding '{}'",
                self.production_encoding
            ))
        })
    }

    pub fn indata_path(&self, filename: &str) -> PathBuf {
        self.indata_dir.join(filename)
    }
}

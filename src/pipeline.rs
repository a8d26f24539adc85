//! Batch driver: ingestion → estimation → aggregation → CSV output.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::aggregation::{self, RollupLevel};
use crate::coefficients::SymbioticParameters;
use crate::config::Config;
use crate::error::BnfError;
use crate::frame::write_csv;
use crate::nonsymbiotic;
use crate::production::{read_faostat_long, to_crop_production};
use crate::reference::ReferenceData;
use crate::reporting;
use crate::symbiotic;

pub const GRAIN_LEGUMES_FILE: &str = "grain-legumes-symbiotic-fixation.csv";
pub const NONSYMBIOTIC_FILE: &str = "nonsymbiotic-fixation.csv";
pub const TABLE_2_FILE: &str = "results-like-peoples-table-2.csv";
pub const TABLE_4_FILE: &str = "results-like-peoples-table-4.csv";
pub const REQUESTED_FILE: &str = "requested-countries-bnf.csv";

/// Files written by a successful run, in write order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
}

/// A result table and the file name it is written under.
pub type Output = (&'static str, DataFrame);

/// Fail early when results from an earlier run are present.
pub fn ensure_output_absent(dir: &Path) -> Result<(), BnfError> {
    if dir.exists() {
        return Err(BnfError::OutputConflict(dir.display().to_string()));
    }
    Ok(())
}

/// Claim the output directory. Existing results are never overwritten.
pub fn create_output_dir(dir: &Path) -> Result<(), BnfError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(BnfError::OutputConflict(dir.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the whole estimation from the configured inputs.
///
/// Every input is read and every table built before the output directory is
/// created, so a failed run leaves nothing behind.
pub fn run(config: &Config) -> Result<RunSummary, BnfError> {
    config.validate()?;
    ensure_output_absent(&config.outdata_dir)?;

    let reference = ReferenceData::load(config)?;
    let long = read_faostat_long(
        &config.indata_path(&config.production_file),
        config.production_encoding()?,
    )?;
    let crop_production = to_crop_production(&long)?;
    drop(long);
    let requested = config
        .requested_file
        .as_ref()
        .map(|file| reporting::read_requested(&config.indata_path(file)))
        .transpose()?;

    let outputs = estimate(config, &reference, &crop_production, requested.as_ref())?;
    write_outputs(&config.outdata_dir, outputs)
}

/// Build every result table from already-loaded inputs.
pub fn estimate(
    config: &Config,
    reference: &ReferenceData,
    crop_production: &DataFrame,
    requested: Option<&DataFrame>,
) -> Result<Vec<Output>, BnfError> {
    let params = SymbioticParameters::default();
    let grain_legumes = symbiotic::estimate_fixation(crop_production, reference, &params)?;
    let nonsymbiotic = nonsymbiotic::estimate_fixation_mgn(crop_production, reference)?;

    let year = config.comparison_year;
    let mut outputs = vec![
        (
            TABLE_2_FILE,
            reporting::literature_table_2(&grain_legumes, reference, year)?,
        ),
        (
            TABLE_4_FILE,
            reporting::literature_table_4(&grain_legumes, reference, year)?,
        ),
    ];

    let banded = aggregation::symbiotic_band(&grain_legumes, &config.uncertainty)?;
    let combined = aggregation::combine(&banded, &nonsymbiotic, reference)?;
    for level in RollupLevel::ALL {
        let rolled = aggregation::rollup(&combined, level)?;
        if level == RollupLevel::CountryTotal {
            if let Some(requested) = requested {
                outputs.push((
                    REQUESTED_FILE,
                    reporting::cross_fill_requested(requested, &rolled)?,
                ));
            }
        }
        outputs.push((level.file_name(), rolled));
    }

    outputs.push((GRAIN_LEGUMES_FILE, grain_legumes));
    outputs.push((NONSYMBIOTIC_FILE, nonsymbiotic));
    Ok(outputs)
}

/// Create `dir` and write every table into it.
pub fn write_outputs(dir: &Path, outputs: Vec<Output>) -> Result<RunSummary, BnfError> {
    create_output_dir(dir)?;
    info!(outdata = %dir.display(), "Output directory created");

    let mut summary = RunSummary::default();
    for (name, mut df) in outputs {
        let path = dir.join(name);
        write_csv(&mut df, &path)?;
        info!(rows = df.height(), path = %path.display(), "Written");
        summary.written.push(path);
    }
    Ok(summary)
}

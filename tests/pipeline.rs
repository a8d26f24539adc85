use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use encoding_rs::UTF_8;
use polars::prelude::*;
use tempfile::TempDir;

use bnf_cropland::frame::read_csv_as_strings;
use bnf_cropland::pipeline::{self, NONSYMBIOTIC_FILE, REQUESTED_FILE, TABLE_2_FILE, TABLE_4_FILE};
use bnf_cropland::reporting::TABLE_2_COUNTRIES;
use bnf_cropland::{BnfError, Config, ReferenceData, Region, RollupLevel};

const CROP_NAMES: &str = "\
Item Code,Crop Herridge et al.
236,Soybean
191,Chickpea
";

const COUNTRIES: &str = "\
Country Code,Country
21,Brazil
68,France
100,India
107,Côte d'Ivoire
";

const GROUPS: &str = "\
Country Group Code,Country Group,Country Code,Country
5205,Central America,21,Brazil
5207,South America,21,Brazil
5400,Europe,68,France
5300,Asia,100,India
5100,Africa,107,Côte d'Ivoire
";

const NONSYMBIOTIC: &str = "\
Item Code,Crop,Low,Main,High
15,Wheat,1,2,3
27,Rice,5,10,
";

const FAOSTAT: &str = "\
Area Code,Area,Item Code,Item,Element Code,Element,Year Code,Year,Unit,Value
21,Brazil,236,Soya beans,5312,Area harvested,2018,2018,ha,34000000
21,Brazil,236,Soya beans,5510,Production,2018,2018,t,117000000
68,France,236,Soya beans,5312,Area harvested,2018,2018,ha,150000
68,France,236,Soya beans,5510,Production,2018,2018,t,400000
100,India,191,Chick peas,5312,Area harvested,2018,2018,ha,9500000
100,India,191,Chick peas,5510,Production,2018,2018,t,11000000
100,India,15,Wheat,5312,Area harvested,2018,2018,ha,1000
107,Côte d'Ivoire,15,Wheat,5312,Area harvested,2018,2018,ha,500
100,India,15,Wheat,5510,Production,2018,2018,t,3000
21,Brazil,27,Rice,5312,Area harvested,2018,2018,ha,2000
";

const REQUESTED: &str = "\
Area,Year,requested_total_bnf_MgN
India,2018,
Brazil,2018,123
Côte d'Ivoire,2018,
";

fn write_inputs(dir: &Path, countries: &str) {
    fs::write(dir.join("crop-names-herridge.csv"), CROP_NAMES).unwrap();
    fs::write(
        dir.join("faostat_definitions_country_region_2022-10-01.csv"),
        countries,
    )
    .unwrap();
    fs::write(
        dir.join("faostat_definitions_country_group_2022-10-01.csv"),
        GROUPS,
    )
    .unwrap();
    fs::write(
        dir.join("nonsymbiotic-fixation-coefficients-kg-per-ha-harvest.csv"),
        NONSYMBIOTIC,
    )
    .unwrap();
    // FAOSTAT bulk downloads are windows-1252.
    let (faostat, _, _) = encoding_rs::WINDOWS_1252.encode(FAOSTAT);
    fs::write(
        dir.join("Production_Crops_Livestock_E_All_Data_(Normalized).csv"),
        &faostat,
    )
    .unwrap();
    fs::write(dir.join("requested.csv"), REQUESTED).unwrap();
}

fn setup(countries: &str) -> (TempDir, Config) {
    let tmp = tempfile::tempdir().unwrap();
    let indata = tmp.path().join("indata");
    fs::create_dir(&indata).unwrap();
    write_inputs(&indata, countries);

    let config = Config {
        indata_dir: indata,
        outdata_dir: tmp.path().join("outdata"),
        requested_file: Some("requested.csv".into()),
        ..Config::default()
    };
    (tmp, config)
}

fn float_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn reference_data_loads_regions_and_continents() {
    let (_tmp, config) = setup(COUNTRIES);
    let reference = ReferenceData::load(&config).unwrap();

    assert_eq!(reference.region(21), Some(Region::Brazil));
    assert_eq!(reference.region(68), Some(Region::Europe));
    assert_eq!(reference.region(100), Some(Region::RestOfWorld));
    assert_eq!(reference.region(9999), None);

    // Central and South America share one bucket.
    assert_eq!(reference.continent(21), Some("South, Central America"));
    assert_eq!(reference.continent(68), Some("Europe"));

    assert_eq!(reference.crop_name(236), Some("Soybean"));
    assert_eq!(reference.nonsymbiotic_coefficients(15).map(|b| b.main), Some(2.0));
    // Rice has no High coefficient and is skipped.
    assert_eq!(reference.nonsymbiotic_coefficients(27), None);
}

#[test]
fn missing_brazil_is_fatal() {
    let (_tmp, config) = setup("Country Code,Country\n68,France\n100,India\n");
    let err = ReferenceData::load(&config).unwrap_err();
    assert!(matches!(err, BnfError::MissingReferenceData(_)));
}

#[test]
fn missing_reference_file_is_fatal() {
    let (_tmp, mut config) = setup(COUNTRIES);
    config.crop_names_file = "does-not-exist.csv".into();
    let err = ReferenceData::load(&config).unwrap_err();
    assert!(matches!(err, BnfError::MissingReferenceData(_)));
}

#[test]
fn run_writes_every_output_and_refuses_to_overwrite() {
    let (_tmp, config) = setup(COUNTRIES);
    let summary = pipeline::run(&config).unwrap();

    let out = &config.outdata_dir;
    let mut expected = vec![
        TABLE_2_FILE,
        TABLE_4_FILE,
        NONSYMBIOTIC_FILE,
        REQUESTED_FILE,
        pipeline::GRAIN_LEGUMES_FILE,
    ];
    expected.extend(RollupLevel::ALL.iter().map(|l| l.file_name()));
    for name in &expected {
        assert!(out.join(name).is_file(), "{name} not written");
    }
    assert_eq!(summary.written.len(), expected.len());

    let table_2 = read_csv_as_strings(&out.join(TABLE_2_FILE), UTF_8).unwrap();
    assert_eq!(table_2.height(), TABLE_2_COUNTRIES.len());

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, BnfError::OutputConflict(_)));
}

#[test]
fn nonsymbiotic_output_scales_area_by_coefficient() {
    let (_tmp, config) = setup(COUNTRIES);
    pipeline::run(&config).unwrap();

    let df = read_csv_as_strings(&config.outdata_dir.join(NONSYMBIOTIC_FILE), UTF_8).unwrap();
    assert_eq!(df.height(), 2);
    // Sorted by area code: India 1000 ha, Côte d'Ivoire 500 ha of wheat at 2 kg N per ha
    let main = float_column(&df, "fixed_n_main_MgN");
    assert_relative_eq!(main[0].unwrap(), 2000.0 * 1e-3);
    assert_relative_eq!(main[1].unwrap(), 1000.0 * 1e-3);
    let areas = df.column("area").unwrap().str().unwrap();
    assert_eq!(areas.get(1), Some("Côte d'Ivoire"));
}

#[test]
fn requested_countries_are_filled_only_where_missing() {
    let (_tmp, config) = setup(COUNTRIES);
    pipeline::run(&config).unwrap();

    let requested =
        read_csv_as_strings(&config.outdata_dir.join(REQUESTED_FILE), UTF_8).unwrap();
    let areas: Vec<Option<&str>> = requested
        .column("area")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(areas, [Some("Brazil"), Some("Côte d'Ivoire"), Some("India")]);

    let own = float_column(&requested, "requested_total_bnf_MgN");
    let computed = float_column(&requested, "FAO_requested_total_BNF_MgN");
    assert_eq!(own[0], Some(123.0));
    assert!(computed[0].unwrap() > 0.0);
    // Accented names written by FAOSTAT in windows-1252 still match.
    assert_relative_eq!(own[1].unwrap(), 500.0 * 2.0 * 1e-3);
    assert_eq!(own[1], computed[1]);
    assert_eq!(own[2], computed[2]);
    assert!(own[2].unwrap() > 0.0);
}

#[test]
fn failed_run_leaves_no_output_behind() {
    let (_tmp, mut config) = setup(COUNTRIES);
    config.requested_file = Some("missing.csv".into());

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, BnfError::InputFile { .. }));
    assert!(err.to_string().contains("missing.csv"));
    assert!(!config.outdata_dir.exists());

    // The same directory is usable once the input is fixed.
    config.requested_file = Some("requested.csv".into());
    pipeline::run(&config).unwrap();
}

/// Column-name constants for the BNF estimation tables.
/// Single source of truth; every quantity column carries its unit suffix.

// ── FAOSTAT normalized production table ─────────────────────────────────────
pub mod faostat {
    pub const AREA_CODE: &str = "Area Code";
    pub const AREA: &str = "Area";
    pub const ITEM_CODE: &str = "Item Code";
    pub const ITEM: &str = "Item";
    pub const ELEMENT_CODE: &str = "Element Code";
    pub const YEAR: &str = "Year";
    pub const VALUE: &str = "Value";

    pub const ELEMENT_AREA_HARVESTED: i64 = 5312;
    pub const ELEMENT_PRODUCTION: i64 = 5510;
}

// ── Wide crop production records ────────────────────────────────────────────
pub mod production {
    pub const AREA_CODE: &str = "area_code";
    pub const AREA: &str = "area";
    pub const ITEM_CODE: &str = "item_code";
    pub const ITEM: &str = "item";
    pub const YEAR: &str = "year";
    pub const AREA_HARVESTED_HA: &str = "area_harvested_ha";
    pub const PRODUCTION_MG: &str = "production_Mg";

    pub const KEY: [&str; 3] = [AREA_CODE, ITEM_CODE, YEAR];
    pub const LABELS: [&str; 5] = [AREA_CODE, AREA, ITEM_CODE, ITEM, YEAR];
}

// ── Reference tables ────────────────────────────────────────────────────────
pub mod reference {
    pub const CROP: &str = "crop";
    pub const REGION: &str = "region";
    pub const CONTINENT: &str = "continent";
    pub const LOW: &str = "Low";
    pub const MAIN: &str = "Main";
    pub const HIGH: &str = "High";

    // Headers as they appear in the source CSV files
    pub const SRC_ITEM_CODE: &str = "Item Code";
    pub const SRC_CROP_HERRIDGE: &str = "Crop Herridge et al.";
    pub const SRC_COUNTRY_CODE: &str = "Country Code";
    pub const SRC_COUNTRY: &str = "Country";
    pub const SRC_COUNTRY_GROUP: &str = "Country Group";
}

// ── Symbiotic estimator derived columns (in derivation order) ───────────────
pub mod symbiotic {
    pub const YIELD_MG_PER_HA: &str = "yield_Mg_per_ha";
    pub const HARVEST_INDEX: &str = "harvest_index";
    pub const SHOOT_DM_MG: &str = "shoot_dm_Mg";
    pub const SHOOT_N_CONCENTRATION: &str = "shoot_n_concentration";
    pub const SHOOT_N_MGN: &str = "shoot_n_MgN";
    pub const BG_N_FACTOR: &str = "bg_n_factor";
    pub const TOTAL_CROP_N_MGN: &str = "total_crop_n_MgN";
    pub const NDFA: &str = "ndfa";
    pub const CROP_N_FIXED_MGN: &str = "crop_n_fixed_MgN";

    pub const DERIVED: [&str; 9] = [
        YIELD_MG_PER_HA,
        HARVEST_INDEX,
        SHOOT_DM_MG,
        SHOOT_N_CONCENTRATION,
        SHOOT_N_MGN,
        BG_N_FACTOR,
        TOTAL_CROP_N_MGN,
        NDFA,
        CROP_N_FIXED_MGN,
    ];
}

// ── Fixation bands (Low / Main / High) ──────────────────────────────────────
pub mod band {
    pub const FIXED_N_LOW_MGN: &str = "fixed_n_low_MgN";
    pub const FIXED_N_MAIN_MGN: &str = "fixed_n_main_MgN";
    pub const FIXED_N_HIGH_MGN: &str = "fixed_n_high_MgN";

    pub const ALL: [&str; 3] = [FIXED_N_LOW_MGN, FIXED_N_MAIN_MGN, FIXED_N_HIGH_MGN];
}

// ── Rollup columns ──────────────────────────────────────────────────────────
pub mod rollup {
    pub const FIXATION_TYPE: &str = "fixation_type";
    pub const CATEGORY: &str = "category";
}

// ── Fixation type values ────────────────────────────────────────────────────
pub mod fixation_type {
    pub const SYMBIOTIC: &str = "symbiotic";
    pub const NONSYMBIOTIC: &str = "nonsymbiotic";
}

// ── Literature-comparison table columns ─────────────────────────────────────
pub mod literature {
    pub const LEGUME_CATEGORY: &str = "Legume category";
    pub const REGION: &str = "Region";
    pub const TOTAL_AREA_MHA: &str = "Total area (Mha)";
    pub const GRAIN_PROD_TG: &str = "Grain prod (Tg)";
    pub const GRAIN_YIELD: &str = "Grain yld (Mg/ha/y)";
    pub const SHOOT_DM_TG: &str = "Shoot DM (Tg)";
    pub const SHOOT_N_TG: &str = "Shoot N (Tg)";
    pub const TOTAL_CROP_N_TG: &str = "Total crop N (Tg)";
    pub const CROP_N_FIXED_TG: &str = "Crop N fixed (Tg)";

    pub const VALUES: [&str; 7] = [
        TOTAL_AREA_MHA,
        GRAIN_PROD_TG,
        GRAIN_YIELD,
        SHOOT_DM_TG,
        SHOOT_N_TG,
        TOTAL_CROP_N_TG,
        CROP_N_FIXED_TG,
    ];
    /// Columns additionally rounded to one decimal before the final two-decimal pass.
    pub const ONE_DECIMAL: [&str; 4] = [TOTAL_AREA_MHA, GRAIN_PROD_TG, SHOOT_DM_TG, CROP_N_FIXED_TG];
}

// ── Requested-country table columns ─────────────────────────────────────────
pub mod requested {
    pub const REQUESTED_TOTAL_BNF_MGN: &str = "requested_total_bnf_MgN";
    pub const FAO_REQUESTED_TOTAL_BNF_MGN: &str = "FAO_requested_total_BNF_MgN";
}

// ── Crop names used by the coefficient tables ───────────────────────────────
pub mod crops {
    pub const SOYBEAN: &str = "Soybean";
    pub const GROUNDNUT: &str = "Groundnut";
    pub const CHICKPEA: &str = "Chickpea";
    pub const PIGEONPEA: &str = "Pigeonpea";
    pub const FABA_BEAN: &str = "Faba bean";
    pub const LUPIN: &str = "Lupin";
    pub const COMMON_BEAN: &str = "Common bean";
}

// ── Region labels ───────────────────────────────────────────────────────────
pub mod region {
    pub const EUROPE: &str = "Europe";
    pub const BRAZIL: &str = "Brazil";
    pub const ROW: &str = "ROW";
}

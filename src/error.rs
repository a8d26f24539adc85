use thiserror::Error;

#[derive(Error, Debug)]
pub enum BnfError {
    #[error("Missing reference data: {0}")]
    MissingReferenceData(String),

    #[error("Non-unique key: {0}")]
    NonUniqueKey(String),

    #[error("Output directory already exists, not doing anything: '{0}'")]
    OutputConflict(String),

    #[error("Cannot read input file '{path}': {reason}")]
    InputFile { path: String, reason: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

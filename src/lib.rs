//! Biological nitrogen fixation estimates for FAOSTAT cropland.

pub mod aggregation;
pub mod coefficients;
pub mod config;
pub mod error;
pub mod frame;
pub mod nonsymbiotic;
pub mod pipeline;
pub mod production;
pub mod reference;
pub mod reporting;
pub mod schema;
pub mod symbiotic;

pub use aggregation::RollupLevel;
pub use coefficients::{Region, SymbioticParameters};
pub use config::{Config, UncertaintyBand};
pub use error::BnfError;
pub use reference::ReferenceData;

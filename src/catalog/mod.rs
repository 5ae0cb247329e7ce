//! Sample catalogs.
//!
//! A catalog is a CSV file with a header row naming at least the
//! `#Dataset`, `xsec`, `BR` and `options` columns. Each retained row becomes
//! a [`Sample`]. Rows whose dataset field is blank or starts with `#` are
//! commented out and silently skipped.
//!
//! ```text
//! #Dataset,xsec,BR,options
//! /SingleMuon/Run2018A-17Sep2018-v2/MINIAOD,1,1,globaltag=102X_dataRun2_v12 year=2018
//! #/DoubleMuon/Run2018A-17Sep2018-v2/MINIAOD,1,1,globaltag=102X_dataRun2_v12 year=2018
//! ```
//!
//! An optional `location` column points a sample at a storage directory
//! instead of a bookkeeping dataset.

pub mod loader;
pub mod sample;
pub mod selection;

pub use loader::{
    discover, load_all, load_file, parse_catalog, CatalogLoader, DEFAULT_CATALOG_PATTERN,
};
pub use sample::{Sample, SampleOrigin, SampleSource};
pub use selection::SampleSelection;

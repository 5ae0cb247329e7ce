//! Catalog discovery and CSV parsing.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use globset::Glob;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::sample::Sample;
use crate::error::CatalogError;

/// Marker that starts a commented-out catalog row.
pub const COMMENT_MARKER: char = '#';

/// Header of the dataset identifier column.
pub const DATASET_COLUMN: &str = "#Dataset";
/// Header of the cross section column.
pub const XSEC_COLUMN: &str = "xsec";
/// Header of the efficiency factor column.
pub const EFFICIENCY_COLUMN: &str = "BR";
/// Header of the pset options column.
pub const OPTIONS_COLUMN: &str = "options";
/// Header of the optional input directory column.
pub const LOCATION_COLUMN: &str = "location";

/// Default file name pattern for catalog files.
pub const DEFAULT_CATALOG_PATTERN: &str = "samples_*.csv";

/// Loads samples from every catalog file in a directory matching a pattern.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    dir: PathBuf,
    pattern: String,
}

impl CatalogLoader {
    /// Creates a loader for `dir` using the file name glob `pattern`.
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    /// Directory searched for catalogs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name glob used to select catalogs.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Lists the matching catalog files, sorted by file name.
    pub fn discover(&self) -> Result<Vec<PathBuf>, CatalogError> {
        discover(&self.dir, &self.pattern)
    }

    /// Discovers and loads all catalogs.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoCatalogFiles` when nothing matches the
    /// pattern, or the first error raised while parsing a file.
    pub fn load(&self) -> Result<Vec<Sample>, CatalogError> {
        let paths = self.discover()?;
        if paths.is_empty() {
            return Err(CatalogError::NoCatalogFiles {
                dir: self.dir.clone(),
                pattern: self.pattern.clone(),
            });
        }
        load_all(&paths)
    }
}

/// Lists regular files directly inside `dir` whose name matches `pattern`.
///
/// The result is sorted by file name so that repeated runs see the
/// catalogs in the same order.
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CatalogError> {
    let matcher = Glob::new(pattern)
        .map_err(|e| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?
        .compile_matcher();

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CatalogError::Walk {
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if matcher.is_match(entry.file_name()) {
            info!(path = %entry.path().display(), "Found catalog");
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

/// Loads the catalogs in order, concatenating their samples.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Sample>, CatalogError> {
    let mut samples = Vec::new();
    for path in paths {
        samples.extend(load_file(path.as_ref())?);
    }
    Ok(samples)
}

/// Loads the samples of a single catalog file.
pub fn load_file(path: &Path) -> Result<Vec<Sample>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = parse_catalog(file, path)?;
    info!(path = %path.display(), samples = samples.len(), "Loaded catalog");
    Ok(samples)
}

/// Column positions resolved from a catalog header.
struct Columns {
    dataset: usize,
    xsec: usize,
    efficiency: usize,
    options: usize,
    location: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| CatalogError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            dataset: require(DATASET_COLUMN)?,
            xsec: require(XSEC_COLUMN)?,
            efficiency: require(EFFICIENCY_COLUMN)?,
            options: require(OPTIONS_COLUMN)?,
            location: find(LOCATION_COLUMN),
        })
    }
}

/// Parses catalog rows from `reader`; `path` is only used for reporting.
///
/// Rows whose dataset field is blank or starts with [`COMMENT_MARKER`] are
/// skipped before any other field is looked at, so comment rows may be
/// ragged.
pub fn parse_catalog<R: Read>(reader: R, path: &Path) -> Result<Vec<Sample>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| malformed(path, &e))?
        .clone();
    let columns = Columns::resolve(&headers, path)?;

    let mut samples = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(path, &e))?;
        // Header is line 1; fall back to counting records if the reader has no position.
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 2);

        let dataset = record.get(columns.dataset).unwrap_or("").trim();
        if dataset.is_empty() || dataset.starts_with(COMMENT_MARKER) {
            debug!(path = %path.display(), line, "Skipping commented row");
            continue;
        }

        let row = Row {
            record: &record,
            path,
            line,
            dataset,
        };
        let xsec = row.number(columns.xsec, XSEC_COLUMN)?;
        let efficiency = row.number(columns.efficiency, EFFICIENCY_COLUMN)?;
        let options = row.field(columns.options, OPTIONS_COLUMN)?.trim();

        let mut sample = Sample::new(dataset, xsec, efficiency, options).with_origin(path, line);
        if let Some(location) = columns
            .location
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            sample = sample.with_location(location);
        }

        samples.push(sample);
    }

    Ok(samples)
}

fn malformed(path: &Path, err: &csv::Error) -> CatalogError {
    CatalogError::Malformed {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// A retained catalog row, used to extract typed fields.
struct Row<'a> {
    record: &'a StringRecord,
    path: &'a Path,
    line: u64,
    dataset: &'a str,
}

impl Row<'_> {
    fn field(&self, index: usize, name: &str) -> Result<&str, CatalogError> {
        self.record
            .get(index)
            .ok_or_else(|| CatalogError::MissingField {
                path: self.path.to_path_buf(),
                line: self.line,
                dataset: self.dataset.to_string(),
                field: name.to_string(),
            })
    }

    /// Parses a finite number. `NaN` and infinities are rejected.
    fn number(&self, index: usize, name: &str) -> Result<f64, CatalogError> {
        let raw = self.field(index, name)?.trim();
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(CatalogError::InvalidNumber {
                path: self.path.to_path_buf(),
                line: self.line,
                dataset: self.dataset.to_string(),
                field: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

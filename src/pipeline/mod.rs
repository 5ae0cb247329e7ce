//! The launch pipeline.
//!
//! A launch runs four stages strictly in order:
//!
//! 1. **Load**: discover catalogs and read their samples, then apply the
//!    operator's [`SampleSelection`].
//! 2. **Derive**: compute simulation flag, events per output and global tag
//!    for each sample.
//! 3. **Build**: turn each sample into a [`TaskDescriptor`].
//! 4. **Dispatch**: hand the descriptors to a [`Submitter`].
//!
//! Stages 1-3 complete for every sample before anything is submitted, so a
//! broken catalog row aborts the launch without a partial submission.
//!
//! # Example
//!
//! ```rust,ignore
//! use ntuple_launcher::dispatch::SpoolSubmitter;
//! use ntuple_launcher::pipeline::{LaunchConfig, Pipeline};
//!
//! let config = LaunchConfig::from_file("launch.yaml")?;
//! let pipeline = Pipeline::new(config)?;
//! let report = pipeline.run(SpoolSubmitter::new("./spool"))?;
//! println!("{} tasks submitted", report.len());
//! ```

pub mod config;

pub use config::{CatalogSettings, ConfigError, LaunchConfig};

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogLoader, Sample, SampleSelection};
use crate::dispatch::{DispatchReport, Dispatcher, Submitter};
use crate::error::{CatalogError, DispatchError, ParameterError};
use crate::params::{DerivedParameters, ParameterDeriver};
use crate::task::{TaskDescriptor, TaskFactory};

/// Errors that can stop a launch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Two datasets map to the same request name, so one task would
    /// replace the other in the framework.
    #[error("Datasets '{first}' and '{second}' both map to request name '{request_name}'")]
    DuplicateRequestName {
        request_name: String,
        first: String,
        second: String,
    },
}

/// A sample together with its derived parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSample {
    pub sample: Sample,
    pub derived: DerivedParameters,
}

/// Wires the catalog, derivation, factory and dispatch stages together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    loader: CatalogLoader,
    deriver: ParameterDeriver,
    factory: TaskFactory,
    selection: SampleSelection,
}

impl Pipeline {
    /// Creates a pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if `config` is invalid.
    pub fn new(config: LaunchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let LaunchConfig {
            catalog,
            policy,
            task,
        } = config;

        Ok(Self {
            loader: CatalogLoader::new(catalog.dir, catalog.pattern),
            deriver: ParameterDeriver::new(policy),
            factory: TaskFactory::new(task),
            selection: SampleSelection::default(),
        })
    }

    /// Restricts the launch to a subset of the catalog.
    pub fn with_selection(mut self, selection: SampleSelection) -> Self {
        self.selection = selection;
        self
    }

    /// The deriver in use.
    pub fn deriver(&self) -> &ParameterDeriver {
        &self.deriver
    }

    /// The factory in use.
    pub fn factory(&self) -> &TaskFactory {
        &self.factory
    }

    /// Loads and selects samples.
    pub fn load_samples(&self) -> Result<Vec<Sample>, PipelineError> {
        let samples = self.loader.load()?;
        let loaded = samples.len();
        let selected = self.selection.apply(samples)?;
        info!(loaded, selected = selected.len(), "Samples ready");
        Ok(selected)
    }

    /// Derives parameters for every sample, failing on the first error.
    pub fn derive_samples(&self, samples: Vec<Sample>) -> Result<Vec<PlannedSample>, PipelineError> {
        samples
            .into_iter()
            .map(|sample| -> Result<PlannedSample, PipelineError> {
                let derived = self.deriver.derive(&sample)?;
                Ok(PlannedSample { sample, derived })
            })
            .collect()
    }

    /// Builds descriptors for already derived samples.
    ///
    /// Either every sample yields a descriptor or none is returned.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::DuplicateRequestName` if two samples map to
    /// the same request name.
    pub fn build_tasks(&self, planned: &[PlannedSample]) -> Result<Vec<TaskDescriptor>, PipelineError> {
        let mut tasks = Vec::with_capacity(planned.len());
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(planned.len());
        for PlannedSample { sample, derived } in planned {
            let task = self.factory.build(sample, derived);
            if let Some(first) = seen.insert(task.request_name.clone(), &sample.dataset) {
                return Err(PipelineError::DuplicateRequestName {
                    request_name: task.request_name,
                    first: first.to_string(),
                    second: sample.dataset.clone(),
                });
            }
            info!(task = %task, origin = %sample.origin, "Planned task");
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Loads the catalogs and builds all descriptors without submitting.
    pub fn plan(&self) -> Result<Vec<TaskDescriptor>, PipelineError> {
        let samples = self.load_samples()?;
        let planned = self.derive_samples(samples)?;
        self.build_tasks(&planned)
    }

    /// Plans the launch, then dispatches every task through `submitter`.
    pub fn run<S: Submitter>(&self, submitter: S) -> Result<DispatchReport, PipelineError> {
        let tasks = self.plan()?;
        let total = tasks.len();
        let report = Dispatcher::new(submitter).dispatch(tasks)?;
        info!(total, submitted = report.len(), "Launch complete");
        Ok(report)
    }
}

//! Per-sample runtime parameters.
//!
//! Every sample gets three derived values before a task is built for it:
//!
//! - whether it is simulation or collision data, decided by a substring of
//!   the dataset name (`Run201` marks the 2016-2018 data eras);
//! - how many events go into one output file, which depends on the above;
//! - the conditions (global) tag, taken from the sample's options string.
//!
//! A missing global tag is a hard error. Submitting without one would run
//! the jobs with undefined conditions.

pub mod options;

pub use options::{extract_global_tag, OptionToken, PsetOptions, GLOBAL_TAG_KEY};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Sample;
use crate::error::ParameterError;

/// Default substring identifying collision data datasets.
pub const DEFAULT_REAL_DATA_MARKER: &str = "Run201";

/// Default events per output file for collision data.
pub const DEFAULT_EVENTS_PER_OUTPUT_DATA: u64 = 500_000;

/// Default events per output file for simulation.
pub const DEFAULT_EVENTS_PER_OUTPUT_MC: u64 = 200_000;

/// Run-wide policy used to derive per-sample parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationPolicy {
    /// Datasets containing this substring are collision data.
    pub real_data_marker: String,
    /// Events per output file for collision data.
    pub events_per_output_data: u64,
    /// Events per output file for simulation.
    pub events_per_output_mc: u64,
}

impl Default for DerivationPolicy {
    fn default() -> Self {
        Self {
            real_data_marker: DEFAULT_REAL_DATA_MARKER.to_string(),
            events_per_output_data: DEFAULT_EVENTS_PER_OUTPUT_DATA,
            events_per_output_mc: DEFAULT_EVENTS_PER_OUTPUT_MC,
        }
    }
}

/// Values derived from a single sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedParameters {
    /// False for collision data.
    pub is_simulation: bool,
    /// Events per output file.
    pub events_per_output: u64,
    /// Conditions tag.
    pub global_tag: String,
}

/// Computes [`DerivedParameters`] under a fixed policy.
#[derive(Debug, Clone, Default)]
pub struct ParameterDeriver {
    policy: DerivationPolicy,
}

impl ParameterDeriver {
    /// Creates a deriver for `policy`.
    pub fn new(policy: DerivationPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &DerivationPolicy {
        &self.policy
    }

    /// Exact substring test against the real-data marker.
    pub fn is_simulation(&self, dataset: &str) -> bool {
        !dataset.contains(self.policy.real_data_marker.as_str())
    }

    /// Events per output file for the given sample kind.
    pub fn events_per_output(&self, is_simulation: bool) -> u64 {
        if is_simulation {
            self.policy.events_per_output_mc
        } else {
            self.policy.events_per_output_data
        }
    }

    /// Derives the parameters of `sample`.
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::MissingGlobalTag` if the options string has
    /// no `globaltag=<token>`.
    pub fn derive(&self, sample: &Sample) -> Result<DerivedParameters, ParameterError> {
        let options = PsetOptions::parse(&sample.options);
        let global_tag = options
            .global_tag()
            .ok_or_else(|| ParameterError::MissingGlobalTag {
                dataset: sample.dataset.clone(),
                options: sample.options.clone(),
            })?;

        let is_simulation = self.is_simulation(&sample.dataset);
        let derived = DerivedParameters {
            is_simulation,
            events_per_output: self.events_per_output(is_simulation),
            global_tag: global_tag.to_string(),
        };

        debug!(
            dataset = %sample.dataset,
            is_simulation = derived.is_simulation,
            events_per_output = derived.events_per_output,
            global_tag = %derived.global_tag,
            "Derived sample parameters"
        );

        Ok(derived)
    }
}

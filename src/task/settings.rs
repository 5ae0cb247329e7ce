//! Run-wide task settings.

use serde::{Deserialize, Serialize};

/// Settings shared by every task of a launch.
///
/// These are copied verbatim into each [`TaskDescriptor`](super::TaskDescriptor).
/// Nothing here is validated; the processing framework owns that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Tarball with the CMSSW area shipped to the worker nodes.
    pub tarfile: String,
    /// Production tag, part of every request name.
    pub tag: String,
    /// SCRAM architecture.
    pub scram_arch: String,
    /// CMSSW release.
    pub cmssw_version: String,
    /// Pset script run by cmsRun.
    pub pset: String,
    /// Output file name inside each job.
    pub output_name: String,
    /// Whether the output is a flat tree.
    pub is_tree_output: bool,
    /// Skip the framework's tree consistency check on outputs.
    pub dont_check_tree: bool,
    /// Sites jobs may run at.
    pub sites: Vec<String>,
    /// Maximum number of jobs per task.
    pub max_jobs: u32,
    /// Maximum events processed per job.
    pub max_nevents_per_job: u64,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            tarfile: "tarball_v0.tar.xz".to_string(),
            tag: "OFFSHELL_v0".to_string(),
            scram_arch: "slc6_amd64_gcc700".to_string(),
            cmssw_version: "CMSSW_10_2_18".to_string(),
            pset: "main_pset.py".to_string(),
            output_name: "ntuple.root".to_string(),
            is_tree_output: false,
            dont_check_tree: true,
            sites: vec!["T2_US_UCSD".to_string()],
            max_jobs: 1,
            max_nevents_per_job: 100,
        }
    }
}

impl TaskSettings {
    /// Creates settings with the production defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the production tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Sets the tarball.
    pub fn with_tarfile(mut self, tarfile: impl Into<String>) -> Self {
        self.tarfile = tarfile.into();
        self
    }

    /// Sets the allowed sites.
    pub fn with_sites<S: Into<String>>(mut self, sites: impl IntoIterator<Item = S>) -> Self {
        self.sites = sites.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the job caps.
    pub fn with_job_limits(mut self, max_jobs: u32, max_nevents_per_job: u64) -> Self {
        self.max_jobs = max_jobs;
        self.max_nevents_per_job = max_nevents_per_job;
        self
    }
}

//! Task descriptors handed to the processing framework.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::SampleSource;

/// Input sample as seen by the framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRef {
    /// Dataset identifier.
    pub dataset: String,
    /// Cross section.
    pub xsec: f64,
    /// Efficiency factor.
    pub efficiency: f64,
    /// How the input files are located.
    pub source: SampleSource,
}

/// Condor submission parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondorSubmitParams {
    /// Sites jobs may run at.
    pub sites: Vec<String>,
}

/// A fully parameterized processing task.
///
/// Built once per sample by the [`TaskFactory`](super::TaskFactory) and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Task identity within the framework.
    pub request_name: String,
    /// Input sample.
    pub sample: SampleRef,
    /// Production tag.
    pub tag: String,
    /// Tarball with the CMSSW area.
    pub tarfile: String,
    /// Conditions tag.
    pub global_tag: String,
    /// SCRAM architecture.
    pub scram_arch: String,
    /// CMSSW release.
    pub cmssw_version: String,
    /// Pset script.
    pub pset: String,
    /// Arguments passed to the pset.
    pub pset_args: String,
    /// Output file name.
    pub output_name: String,
    /// Whether the output is a flat tree.
    pub is_tree_output: bool,
    /// Skip the tree consistency check.
    pub dont_check_tree: bool,
    /// Events per output file.
    pub events_per_output: u64,
    /// Maximum events per job.
    pub max_nevents_per_job: u64,
    /// Maximum number of jobs.
    pub max_jobs: u32,
    /// Condor parameters (site whitelist).
    pub condor_submit_params: CondorSubmitParams,
}

impl TaskDescriptor {
    /// SHA-256 of the descriptor's JSON encoding.
    ///
    /// Two descriptors have the same fingerprint exactly when all their
    /// fields are equal.
    pub fn fingerprint(&self) -> Result<Fingerprint, serde_json::Error> {
        let encoded = serde_json::to_vec(self)?;
        Ok(Fingerprint::from_bytes(&encoded))
    }
}

impl fmt::Display for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} {} gt={} epo={}]",
            self.request_name,
            self.sample.source,
            self.cmssw_version,
            self.global_tag,
            self.events_per_output
        )
    }
}

/// Hex-encoded SHA-256 digest of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives the framework request name from a dataset and tag.
///
/// `/A/B/MINIAOD` with tag `v1` becomes `A_B_MINIAOD_v1`.
pub fn request_name(dataset: &str, tag: &str) -> String {
    let stem = dataset.trim_start_matches('/').replace('/', "_");
    format!("{}_{}", stem, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_name() {
        assert_eq!(
            request_name("/A/B/MINIAOD", "OFFSHELL_v0"),
            "A_B_MINIAOD_OFFSHELL_v0"
        );
        assert_eq!(request_name("private_ggH", "v1"), "private_ggH_v1");
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::from_bytes(b"abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fp.to_string().len(), 64);
    }
}

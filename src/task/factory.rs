//! Building task descriptors.

use super::descriptor::{request_name, CondorSubmitParams, SampleRef, TaskDescriptor};
use super::settings::TaskSettings;
use crate::catalog::Sample;
use crate::params::DerivedParameters;

/// Combines samples, derived parameters and run-wide settings into tasks.
///
/// `build` is a pure function of its inputs: no I/O, no clock.
#[derive(Debug, Clone, Default)]
pub struct TaskFactory {
    settings: TaskSettings,
}

impl TaskFactory {
    /// Creates a factory for `settings`.
    pub fn new(settings: TaskSettings) -> Self {
        Self { settings }
    }

    /// The settings copied into every task.
    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    /// Builds the descriptor for `sample`.
    pub fn build(&self, sample: &Sample, derived: &DerivedParameters) -> TaskDescriptor {
        let settings = &self.settings;
        TaskDescriptor {
            request_name: request_name(&sample.dataset, &settings.tag),
            sample: SampleRef {
                dataset: sample.dataset.clone(),
                xsec: sample.xsec,
                efficiency: sample.efficiency,
                source: sample.source.clone(),
            },
            tag: settings.tag.clone(),
            tarfile: settings.tarfile.clone(),
            global_tag: derived.global_tag.clone(),
            scram_arch: settings.scram_arch.clone(),
            cmssw_version: settings.cmssw_version.clone(),
            pset: settings.pset.clone(),
            pset_args: sample.options.clone(),
            output_name: settings.output_name.clone(),
            is_tree_output: settings.is_tree_output,
            dont_check_tree: settings.dont_check_tree,
            events_per_output: derived.events_per_output,
            max_nevents_per_job: settings.max_nevents_per_job,
            max_jobs: settings.max_jobs,
            condor_submit_params: CondorSubmitParams {
                sites: settings.sites.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SampleSource;

    fn derived() -> DerivedParameters {
        DerivedParameters {
            is_simulation: true,
            events_per_output: 200_000,
            global_tag: "102X_upgrade2018_realistic_v20".to_string(),
        }
    }

    #[test]
    fn test_build_copies_everything() {
        let settings = TaskSettings::new().with_tag("OFFSHELL_v3");
        let factory = TaskFactory::new(settings.clone());
        let sample = Sample::new(
            "/ZZTo4L/RunIIAutumn18MiniAOD/MINIAODSIM",
            1.256,
            1.0,
            "globaltag=102X_upgrade2018_realistic_v20 year=2018",
        );

        let task = factory.build(&sample, &derived());

        assert_eq!(task.request_name, "ZZTo4L_RunIIAutumn18MiniAOD_MINIAODSIM_OFFSHELL_v3");
        assert_eq!(task.sample.dataset, sample.dataset);
        assert_eq!(task.sample.xsec, 1.256);
        assert_eq!(task.sample.source, SampleSource::Dataset);
        assert_eq!(task.tag, "OFFSHELL_v3");
        assert_eq!(task.tarfile, settings.tarfile);
        assert_eq!(task.global_tag, "102X_upgrade2018_realistic_v20");
        assert_eq!(task.scram_arch, settings.scram_arch);
        assert_eq!(task.cmssw_version, settings.cmssw_version);
        assert_eq!(task.pset, settings.pset);
        assert_eq!(task.pset_args, sample.options);
        assert_eq!(task.output_name, "ntuple.root");
        assert!(!task.is_tree_output);
        assert!(task.dont_check_tree);
        assert_eq!(task.events_per_output, 200_000);
        assert_eq!(task.max_nevents_per_job, 100);
        assert_eq!(task.max_jobs, 1);
        assert_eq!(task.condor_submit_params.sites, settings.sites);
    }

    #[test]
    fn test_build_is_deterministic() {
        let factory = TaskFactory::default();
        let sample = Sample::new("/A/B/MINIAOD", 1.0, 1.0, "globaltag=T")
            .with_location("/hadoop/a");

        let first = factory.build(&sample, &derived());
        let second = factory.build(&sample, &derived());

        assert_eq!(first, second);
        assert_eq!(
            first.fingerprint().expect("fingerprint"),
            second.fingerprint().expect("fingerprint")
        );
    }

    #[test]
    fn test_fingerprint_changes_with_settings() {
        let sample = Sample::new("/A/B/MINIAOD", 1.0, 1.0, "globaltag=T");
        let a = TaskFactory::default().build(&sample, &derived());
        let b = TaskFactory::new(TaskSettings::new().with_job_limits(5, 100)).build(&sample, &derived());

        assert_eq!(a.request_name, b.request_name);
        assert_ne!(
            a.fingerprint().expect("fingerprint"),
            b.fingerprint().expect("fingerprint")
        );
    }

    #[test]
    fn test_origin_does_not_leak_into_task() {
        let factory = TaskFactory::default();
        let a = Sample::new("/A/B/MINIAOD", 1.0, 1.0, "globaltag=T").with_origin("samples_a.csv", 2);
        let b = Sample::new("/A/B/MINIAOD", 1.0, 1.0, "globaltag=T").with_origin("samples_b.csv", 9);

        assert_eq!(factory.build(&a, &derived()), factory.build(&b, &derived()));
    }
}

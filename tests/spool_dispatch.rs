//! Launches through the spool backend.

use std::fs;

use ntuple_launcher::dispatch::{SpoolEntry, SpoolSubmitter, SubmissionStatus};
use ntuple_launcher::pipeline::{LaunchConfig, Pipeline};
use ntuple_launcher::task::TaskSettings;
use tempfile::tempdir;

const CATALOG: &str = "#Dataset,xsec,BR,options\n\
    /ZZTo4L/RunIIAutumn18MiniAOD/MINIAODSIM,1.256,1,globaltag=102X_upgrade2018_realistic_v20\n\
    /SingleMuon/Run2018A-17Sep2018-v2/MINIAOD,1,1,globaltag=102X_dataRun2_v12\n";

#[test]
fn test_relaunch_is_idempotent() {
    let catalogs = tempdir().expect("failed to create temp dir");
    let spool_dir = tempdir().expect("failed to create temp dir");
    fs::write(catalogs.path().join("samples_2018.csv"), CATALOG).expect("failed to write");

    let pipeline =
        Pipeline::new(LaunchConfig::default().with_catalog_dir(catalogs.path())).expect("pipeline");

    let first = pipeline
        .run(SpoolSubmitter::new(spool_dir.path()))
        .expect("first launch");
    assert_eq!(first.count(SubmissionStatus::Created), 2);

    let second = pipeline
        .run(SpoolSubmitter::new(spool_dir.path()))
        .expect("second launch");
    assert_eq!(second.count(SubmissionStatus::Unchanged), 2);

    let files = fs::read_dir(spool_dir.path()).expect("read spool").count();
    assert_eq!(files, 2);
}

#[test]
fn test_changed_settings_update_spool_entries() {
    let catalogs = tempdir().expect("failed to create temp dir");
    let spool_dir = tempdir().expect("failed to create temp dir");
    fs::write(catalogs.path().join("samples_2018.csv"), CATALOG).expect("failed to write");

    let base = LaunchConfig::default().with_catalog_dir(catalogs.path());
    Pipeline::new(base.clone())
        .expect("pipeline")
        .run(SpoolSubmitter::new(spool_dir.path()))
        .expect("first launch");

    let changed = base
        .with_task_settings(TaskSettings::new().with_sites(["T2_US_UCSD", "T2_US_Caltech"]));
    let report = Pipeline::new(changed)
        .expect("pipeline")
        .run(SpoolSubmitter::new(spool_dir.path()))
        .expect("second launch");

    assert_eq!(report.count(SubmissionStatus::Updated), 2);

    let path = spool_dir
        .path()
        .join("SingleMuon_Run2018A-17Sep2018-v2_MINIAOD_OFFSHELL_v0.json");
    let entry: SpoolEntry =
        serde_json::from_str(&fs::read_to_string(path).expect("read entry")).expect("parse entry");
    assert_eq!(
        entry.task.condor_submit_params.sites,
        vec!["T2_US_UCSD", "T2_US_Caltech"]
    );
    assert_eq!(entry.task.global_tag, "102X_dataRun2_v12");
    assert_eq!(entry.fingerprint, entry.task.fingerprint().expect("fingerprint"));
}

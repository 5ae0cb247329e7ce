//! End-to-end launches over catalogs written to a temporary directory.

use std::fs;
use std::path::Path;

use ntuple_launcher::catalog::SampleSelection;
use ntuple_launcher::dispatch::{
    DispatchReport, Dispatcher, SubmissionReceipt, SubmissionStatus, Submitter,
};
use ntuple_launcher::error::{CatalogError, DispatchError, ParameterError, SubmissionError};
use ntuple_launcher::pipeline::{LaunchConfig, Pipeline, PipelineError};
use ntuple_launcher::task::{TaskDescriptor, TaskSettings};
use tempfile::tempdir;

/// Collects every descriptor it is given; rejects request names listed in
/// `reject`.
#[derive(Default)]
struct CollectingSubmitter {
    tasks: Vec<TaskDescriptor>,
    reject: Vec<String>,
}

impl Submitter for CollectingSubmitter {
    fn name(&self) -> &str {
        "collecting"
    }

    fn submit(&mut self, task: &TaskDescriptor) -> Result<SubmissionReceipt, SubmissionError> {
        self.tasks.push(task.clone());
        if self.reject.contains(&task.request_name) {
            return Err(SubmissionError::Rejected {
                request_name: task.request_name.clone(),
                reason: "site unavailable".to_string(),
            });
        }
        Ok(SubmissionReceipt::new(&task.request_name, SubmissionStatus::Accepted))
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("failed to write catalog");
}

fn pipeline(dir: &Path) -> Pipeline {
    Pipeline::new(LaunchConfig::default().with_catalog_dir(dir)).expect("pipeline")
}

#[test]
fn test_single_simulation_sample_is_submitted_once() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /A/B/MINIAOD,1.0,1.0,globaltag=106X_v1\n\
         #/C/D,2,1,globaltag=X\n",
    );

    let mut submitter = CollectingSubmitter::default();
    let report = pipeline(dir.path())
        .run(&mut submitter)
        .expect("launch should work");

    assert_eq!(report.len(), 1);
    assert_eq!(submitter.tasks.len(), 1);

    let task = &submitter.tasks[0];
    assert_eq!(task.sample.dataset, "/A/B/MINIAOD");
    assert_eq!(task.global_tag, "106X_v1");
    assert_eq!(task.events_per_output, 200_000);
    assert_eq!(task.tag, "OFFSHELL_v0");
    assert_eq!(task.pset, "main_pset.py");
    assert_eq!(task.output_name, "ntuple.root");
    assert_eq!(task.max_jobs, 1);
    assert_eq!(task.max_nevents_per_job, 100);
    assert_eq!(task.condor_submit_params.sites, vec!["T2_US_UCSD"]);
    assert!(!task.is_tree_output);
    assert!(task.dont_check_tree);
    assert_eq!(task.pset_args, "globaltag=106X_v1");
}

#[test]
fn test_samples_follow_file_then_row_order() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_b.csv",
        "#Dataset,xsec,BR,options\n/B1/Run2018A/MINIAOD,1,1,globaltag=D\n",
    );
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /A1/x/MINIAODSIM,1,1,globaltag=M\n\
         /A2/x/MINIAODSIM,1,1,globaltag=M\n",
    );
    write(dir.path(), "other.csv", "#Dataset,xsec,BR,options\n/Z/x/M,1,1,globaltag=M\n");

    let tasks = pipeline(dir.path()).plan().expect("plan should work");

    let datasets: Vec<_> = tasks.iter().map(|t| t.sample.dataset.as_str()).collect();
    assert_eq!(
        datasets,
        vec!["/A1/x/MINIAODSIM", "/A2/x/MINIAODSIM", "/B1/Run2018A/MINIAOD"]
    );
    assert_eq!(tasks[2].events_per_output, 500_000);
    assert_eq!(tasks[2].global_tag, "D");
}

#[test]
fn test_missing_global_tag_submits_nothing() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /A/B/MINIAOD,1.0,1.0,globaltag=106X_v1\n\
         /E/F/MINIAOD,1.0,1.0,nothing_relevant\n",
    );

    let mut submitter = CollectingSubmitter::default();
    let result = pipeline(dir.path()).run(&mut submitter);

    match result {
        Err(PipelineError::Parameter(ParameterError::MissingGlobalTag { dataset, options })) => {
            assert_eq!(dataset, "/E/F/MINIAOD");
            assert_eq!(options, "nothing_relevant");
        }
        other => panic!("expected MissingGlobalTag, got {:?}", other),
    }
    assert!(submitter.tasks.is_empty());
}

#[test]
fn test_rejection_stops_remaining_submissions() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /A/x/M,1,1,globaltag=T\n\
         /B/x/M,1,1,globaltag=T\n\
         /C/x/M,1,1,globaltag=T\n",
    );

    let mut submitter = CollectingSubmitter {
        reject: vec!["B_x_M_OFFSHELL_v0".to_string()],
        ..CollectingSubmitter::default()
    };
    let result = pipeline(dir.path()).run(&mut submitter);

    match result {
        Err(PipelineError::Dispatch(DispatchError::Failed {
            index, request_name, ..
        })) => {
            assert_eq!(index, 1);
            assert_eq!(request_name, "B_x_M_OFFSHELL_v0");
        }
        other => panic!("expected dispatch failure, got {:?}", other),
    }
    let seen: Vec<_> = submitter.tasks.iter().map(|t| t.request_name.as_str()).collect();
    assert_eq!(seen, vec!["A_x_M_OFFSHELL_v0", "B_x_M_OFFSHELL_v0"]);
}

#[test]
fn test_selection_and_settings_flow_into_tasks() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /GluGluHToZZTo4L/x/MINIAODSIM,0.01,0.5,globaltag=G1\n\
         /ZZTo4L/x/MINIAODSIM,1.256,1,globaltag=G2\n\
         /SingleMuon/Run2018A/MINIAOD,1,1,globaltag=G3\n",
    );

    let config = LaunchConfig::default()
        .with_catalog_dir(dir.path())
        .with_task_settings(TaskSettings::new().with_tag("OFFSHELL_v7"));
    let pipeline = Pipeline::new(config)
        .expect("pipeline")
        .with_selection(SampleSelection::new().with_matching(["MINIAODSIM"]).with_limit(1));

    let tasks = pipeline.plan().expect("plan should work");

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].request_name, "GluGluHToZZTo4L_x_MINIAODSIM_OFFSHELL_v7");
    assert_eq!(tasks[0].sample.xsec, 0.01);
    assert_eq!(tasks[0].sample.efficiency, 0.5);
}

#[test]
fn test_empty_catalog_dispatches_nothing() {
    let dir = tempdir().expect("failed to create temp dir");
    write(dir.path(), "samples_a.csv", "#Dataset,xsec,BR,options\n#/A/x/M,1,1,globaltag=T\n");

    let tasks = pipeline(dir.path()).plan().expect("plan should work");
    let report: DispatchReport = Dispatcher::new(CollectingSubmitter::default())
        .dispatch(tasks)
        .expect("dispatch should work");

    assert!(report.is_empty());
}

#[test]
fn test_non_finite_cross_section_aborts_launch() {
    let dir = tempdir().expect("failed to create temp dir");
    write(
        dir.path(),
        "samples_a.csv",
        "#Dataset,xsec,BR,options\n\
         /A/x/MINIAODSIM,1,1,globaltag=T\n\
         /A/B/MINIAODSIM,NaN,1,globaltag=T\n",
    );

    let mut submitter = CollectingSubmitter::default();
    let result = pipeline(dir.path()).run(&mut submitter);

    assert!(matches!(
        result,
        Err(PipelineError::Catalog(CatalogError::InvalidNumber { .. }))
    ));
    assert!(submitter.tasks.is_empty());
}

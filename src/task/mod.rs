//! Task descriptors and the factory that builds them.
//!
//! A [`TaskDescriptor`] is an immutable value carrying everything the
//! processing framework needs to run one sample: identity (request name,
//! sample, tag, tarball, global tag) and execution settings (release,
//! architecture, pset and its arguments, output, event and job caps, site
//! whitelist). Submission is a separate concern, see [`crate::dispatch`].

pub mod descriptor;
pub mod factory;
pub mod settings;

pub use descriptor::{request_name, CondorSubmitParams, Fingerprint, SampleRef, TaskDescriptor};
pub use factory::TaskFactory;
pub use settings::TaskSettings;

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for pkgjob
//!
//! This crate marks user requests onto a [`DepCache`], repairs the result
//! with a scored problem resolver and classifies what a transaction would
//! change. It never touches the system; executing the marks is the job of
//! the install crate.

mod changes;
mod consistency;
mod depcache;
mod essential;
mod garbage;
mod graph;
mod obsolete;
mod problem;
mod report;
mod request;

pub use changes::ChangeSet;
pub use depcache::{CacheOptions, DepCache, Mode, PackageState, Which, MAX_INSTALL_DEPTH};
pub use essential::check_essential;
pub use garbage::GarbageSet;
pub use graph::{install_order, DependencyGraph, InstallStep, StepAction};
pub use obsolete::{is_obsoleted, pin_priority};
pub use problem::ProblemResolver;
pub use report::{install_report, now_report, unmet_report, REPORT_HEADER};
pub use request::{apply_request, TransactionRequest};

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Transaction execution for pkgjob
//!
//! This crate turns a resolved [`pkgjob_resolver::DepCache`] into work on
//! the system: it plans the archive downloads, checks the lock, network and
//! disk space, drives a fetch queue and finally hands the ordered steps to
//! the system installer.

#[macro_use]
mod macros;
mod context;
mod executor;
mod fetch;
mod installer;
mod plan;
mod restart;
mod result;
mod status;

pub use context::ExecuteContext;
pub use executor::{TransactionExecutor, BROKEN_PACKAGES_MESSAGE};
pub use fetch::{
    FetchItem, FetchQueue, FetchQueueFactory, FetchResult, FetchTotals, FileFetchQueue,
    FileFetchQueueFactory,
};
pub use installer::{DpkgInstaller, InstallItem, InstallProgress, SystemInstaller};
pub use plan::FetchPlan;
pub use restart::{RestartWatch, PLACEHOLDER_PACKAGE_ID};
pub use result::{TransactionOutcome, TransactionResult};
pub use status::{AcquireStatus, FetchPulse};

// Re-export EventSender for use by macros and contexts
pub use pkgjob_events::EventSender;

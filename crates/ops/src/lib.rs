#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Job orchestration for pkgjob
//!
//! This crate wires the store, resolver, query layer and transaction
//! executor into a [`Job`]: it opens the cache with lock retries, checks it
//! for consistency, answers queries and runs transactions, reporting every
//! failure as a single error-code event.

mod cache;
mod context;
mod job;
mod types;

pub use cache::JobCache;
pub use context::{OpsContextBuilder, OpsCtx};
pub use job::Job;
pub use types::TransactionFlags;

// Re-exports for callers building requests and reading results
pub use pkgjob_install::{TransactionOutcome, TransactionResult};
pub use pkgjob_query::{ProvidesKind, UpdateBuckets};
pub use pkgjob_resolver::TransactionRequest;

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform abstraction layer for the transaction engine.
//!
//! This crate provides the small set of OS-facing operations the engine needs:
//! - cooperative cancellation that can signal an installer subprocess
//! - free-space probing of the archive directory, aware of RAM-backed mounts
//! - the network-state oracle consulted before downloads

pub mod cancel;
pub mod filesystem;
pub mod network;
pub mod process;

pub use cancel::CancelToken;
pub use filesystem::{FreeSpace, SpaceProbe, StatvfsProbe};
pub use network::{NetworkMonitor, NetworkState, StaticNetwork};

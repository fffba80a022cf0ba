#![forbid(unsafe_code)]

//! Skills taxonomy console runtime.
//!
//! Hosts the kernel engine in a console session and adds configuration,
//! logging setup, replay, drift comparison, snapshots and row import.
//!
//! No taxonomy rules live here. Every mutation goes through the kernel.

pub mod config;
pub mod logging;
pub mod replay;
pub mod snapshot_codec;
pub mod import;
pub mod session;
pub mod drift;

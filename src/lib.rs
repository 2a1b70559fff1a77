//! pflog - process-output filter for tool chains
//!
//! Loaded into a process with `LD_PRELOAD` (or `DYLD_INSERT_LIBRARIES`),
//! this library closes the standard output and/or standard error of
//! programs whose executable short name is listed in the `PFLOG_*`
//! environment variables. The check runs once at load time for the host
//! process itself and again on every `execve`, so suppression follows the
//! process tree.
//!
//! The injected entry points live in the `pflog-preload` crate; this crate
//! holds the engine and the launcher and has no load-time side effects.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod filter;
pub mod interceptor;
pub mod launcher;
pub mod platform;
pub mod streams;

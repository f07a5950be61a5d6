//! Data models for repeated test invocation
//!
//! This module contains all data structures used throughout the application.

mod invocation;

pub use invocation::{
    InvocationResult, InvocationSpec, InvocationStatus, RunSummary, DEFAULT_TIMES,
};

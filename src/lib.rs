//! Execution-orchestration core of a multi-language code playground.
//!
//! Programs are run by an external execution service. This crate submits them, collects
//! stdin values when a program blocks on input, installs a missing Python package and
//! retries once, and renders the captured output.

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod input;
pub mod output;
pub mod packages;
pub mod printer;
pub mod session;

pub use error::{Error, Result};
pub use execution::{ExecutionClient, ExecutionRequest, ExecutionResult, HttpExecutionClient, Language};
pub use input::{CollectedInputs, InputCollector, InputPrompt};
pub use output::{OutputBuffer, OutputSink};
pub use packages::PackageResolver;
pub use session::{Orchestrator, RunOutcome, RunState};

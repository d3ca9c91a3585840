//! Execution engine: request/result types and the client seam.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;

pub use http::HttpExecutionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    C,
}

impl Language {
    /// Infer the language from a file name, if the extension says anything.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = std::path::Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => f.write_str("python"),
            Language::C => f.write_str("c"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "c" => Ok(Language::C),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// One submission to the execution service. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language: Language,
    pub prior_inputs: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(source_code: impl Into<String>, language: Language) -> Self {
        Self { source_code: source_code.into(), language, prior_inputs: Vec::new() }
    }

    pub fn with_inputs(mut self, inputs: Vec<String>) -> Self {
        self.prior_inputs = inputs;
        self
    }
}

/// Normalized outcome of a single execution call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success {
        stdout: String,
        stderr: String,
        exit_code: i32,
        duration_seconds: f64,
    },
    /// The program blocked on a read the service could not satisfy.
    NeedsInput { partial_message: String },
    /// An import could not be resolved.
    MissingDependency { module_name: String },
    CompileError { diagnostic: String },
    /// The service could not be reached or answered with garbage.
    TransportError { cause: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompilerStatus {
    #[serde(default)]
    pub available: bool,
    pub version: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { message: String },
    Failed { error: String },
}

impl InstallOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, InstallOutcome::Installed { .. })
    }
}

/// Everything the orchestrator needs from the execution service.
///
/// Implementations issue exactly one outbound call per method and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Base URL of the service, used in user-facing connectivity messages.
    fn endpoint(&self) -> &str;

    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;

    /// Liveness probe. Any 2xx counts as reachable.
    async fn health(&self) -> bool;

    async fn check_c_compiler(&self) -> CompilerStatus;

    async fn install_package(&self, name: &str) -> InstallOutcome;

    async fn list_packages(&self) -> crate::Result<Vec<String>>;
}

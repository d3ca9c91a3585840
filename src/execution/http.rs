//! Reqwest-based client for the playground execution service.

use std::{sync::OnceLock, time::Duration, time::Instant};

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    CompilerStatus, ExecutionClient, ExecutionRequest, ExecutionResult, InstallOutcome, Language,
};
use crate::{
    config::Config,
    error::{Error, Result},
};

const DEFAULT_NEEDS_INPUT_MESSAGE: &str = "Program needs input";

#[derive(Debug, Clone)]
pub struct HttpExecutionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpExecutionClient {
    /// Client without a request timeout; a hung service keeps the call pending.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        // Builder only fails on TLS backend init; fall back to the stock client in that case.
        let http = builder.build().unwrap_or_default();
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::with_timeout(cfg.backend_url(), cfg.request_timeout()?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Send a request and decode the JSON body regardless of status.
    ///
    /// The service reports classified failures (compile errors, blocked reads) with 4xx
    /// bodies, so the status is handed back alongside the decoded payload. Callers treat
    /// 5xx as a transport failure whatever the body says.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<(StatusCode, T)> {
        let resp = req
            .send()
            .await
            .map_err(|source| Error::Http { url: url.to_string(), source })?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|source| Error::Http { url: url.to_string(), source })?;
        match serde_json::from_str::<T>(&text) {
            Ok(body) => Ok((status, body)),
            Err(_) if !status.is_success() => Err(Error::Status { url: url.to_string(), status }),
            Err(source) => Err(Error::Decode { url: url.to_string(), source }),
        }
    }

    async fn execute_python(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let url = self.url("execute");
        let body = CodePayload { code: &request.source_code, inputs: &request.prior_inputs };
        let (status, resp) = self
            .send_json::<PythonResponse>(self.http.post(&url).json(&body), &url)
            .await?;
        if status.is_server_error() || (!status.is_success() && resp.exit_code.is_none()) {
            return Ok(ExecutionResult::TransportError {
                cause: format!("{} returned {}: {}", url, status, resp.error),
            });
        }
        Ok(classify_python(resp))
    }

    async fn execute_c(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        if request.source_code.trim().is_empty() {
            // The compile endpoints reject blank sources; nothing to run is a trivial success.
            return Ok(ExecutionResult::Success {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
                duration_seconds: 0.0,
            });
        }
        let url = if request.prior_inputs.is_empty() {
            self.url("compile-c")
        } else {
            self.url("compile-c-with-input")
        };
        let body = CodePayload { code: &request.source_code, inputs: &request.prior_inputs };
        let started = Instant::now();
        let (status, resp) = self
            .send_json::<CompileResponse>(self.http.post(&url).json(&body), &url)
            .await?;
        let elapsed = started.elapsed().as_secs_f64();
        if status.is_server_error() || (!status.is_success() && !resp.is_service_payload()) {
            return Ok(ExecutionResult::TransportError {
                cause: format!(
                    "{} returned {}: {}",
                    url,
                    status,
                    resp.error.unwrap_or_else(|| "no details".into())
                ),
            });
        }
        Ok(classify_c(resp, elapsed))
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        debug!(language = %request.language, inputs = request.prior_inputs.len(), "submitting program");
        let outcome = match request.language {
            Language::Python => self.execute_python(request).await,
            Language::C => self.execute_c(request).await,
        };
        outcome.unwrap_or_else(|e| {
            warn!("execution service unreachable: {}", e);
            ExecutionResult::TransportError { cause: e.to_string() }
        })
    }

    async fn health(&self) -> bool {
        match self.http.get(self.url("health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("health probe failed: {}", e);
                false
            }
        }
    }

    async fn check_c_compiler(&self) -> CompilerStatus {
        let url = self.url("check-c-compiler");
        match self.send_json::<CompilerStatus>(self.http.get(&url), &url).await {
            Ok((_, status)) => status,
            Err(e) => {
                warn!("compiler check failed: {}", e);
                CompilerStatus {
                    available: false,
                    version: None,
                    error: Some(format!("Failed to connect to C compiler service: {}", e)),
                }
            }
        }
    }

    async fn install_package(&self, name: &str) -> InstallOutcome {
        let url = self.url("install-package");
        let body = serde_json::json!({ "package": name });
        match self.send_json::<InstallResponse>(self.http.post(&url).json(&body), &url).await {
            Ok((status, resp)) if status.is_success() && resp.success => InstallOutcome::Installed {
                message: resp.message.unwrap_or_else(|| format!("Successfully installed {}", name)),
            },
            Ok((_, resp)) => InstallOutcome::Failed {
                error: resp.error.unwrap_or_else(|| format!("Failed to install {}", name)),
            },
            Err(e) => InstallOutcome::Failed { error: e.to_string() },
        }
    }

    async fn list_packages(&self) -> Result<Vec<String>> {
        let url = self.url("list-packages");
        let (status, resp) = self
            .send_json::<ListPackagesResponse>(self.http.get(&url), &url)
            .await?;
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }
        Ok(if resp.success { resp.packages } else { Vec::new() })
    }
}

#[derive(Debug, Serialize)]
struct CodePayload<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    inputs: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct PythonResponse {
    #[serde(default)]
    output: String,
    #[serde(default)]
    error: String,
    exit_code: Option<i32>,
    #[serde(default)]
    execution_time: f64,
}

#[derive(Debug, Default, Deserialize)]
struct CompileResponse {
    success: Option<bool>,
    output: Option<String>,
    error_output: Option<String>,
    compilation_error: Option<String>,
    error: Option<String>,
    return_code: Option<i32>,
    #[serde(default)]
    needs_input: bool,
    message: Option<String>,
}

impl CompileResponse {
    fn is_service_payload(&self) -> bool {
        self.success.is_some() || self.needs_input || self.compilation_error.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct InstallResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListPackagesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    packages: Vec<String>,
}

fn missing_module_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ModuleNotFoundError.*?'([^']+)'").expect("valid regex"))
}

/// Name of the module a Python traceback failed to import, if any.
pub fn missing_module(stderr: &str) -> Option<String> {
    missing_module_re()
        .captures(stderr)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether a Python traceback shows `input()` hitting an empty stdin.
pub fn is_blocked_read(stderr: &str) -> bool {
    stderr.contains("EOFError: EOF when reading a line")
}

fn classify_python(resp: PythonResponse) -> ExecutionResult {
    if let Some(module_name) = missing_module(&resp.error) {
        return ExecutionResult::MissingDependency { module_name };
    }
    if is_blocked_read(&resp.error) {
        let partial = resp.output.trim();
        return ExecutionResult::NeedsInput {
            partial_message: if partial.is_empty() {
                DEFAULT_NEEDS_INPUT_MESSAGE.to_string()
            } else {
                partial.to_string()
            },
        };
    }
    ExecutionResult::Success {
        stdout: resp.output,
        stderr: resp.error,
        exit_code: resp.exit_code.unwrap_or(0),
        duration_seconds: resp.execution_time,
    }
}

fn classify_c(resp: CompileResponse, elapsed: f64) -> ExecutionResult {
    if resp.needs_input {
        let partial_message = resp
            .message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| resp.output.filter(|o| !o.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_NEEDS_INPUT_MESSAGE.to_string());
        return ExecutionResult::NeedsInput { partial_message };
    }
    if resp.success == Some(true) {
        return ExecutionResult::Success {
            stdout: resp.output.unwrap_or_default(),
            stderr: resp.error_output.unwrap_or_default(),
            exit_code: resp.return_code.unwrap_or(0),
            duration_seconds: elapsed,
        };
    }
    let diagnostic = resp
        .compilation_error
        .or(resp.error)
        .unwrap_or_else(|| "Unknown compilation error".to_string());
    ExecutionResult::CompileError { diagnostic }
}

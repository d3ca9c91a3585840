//! Run orchestration: one session per playground page.
//!
//! A session drives a single run at a time from submission to a finalized, renderable
//! string. Runs that block on stdin park in `AwaitingInput` until the collected values
//! come back; runs that fail on a missing import install it and retry exactly once.
//!
//! Entry points take `&self`. The session state sits behind a mutex that is only held
//! between awaits, so a second `run` issued while one is in flight observes the active
//! state and is dropped.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    execution::{ExecutionClient, ExecutionRequest, ExecutionResult, Language},
    input::{extract_prompts, prompts_for_run, CollectedInputs, InputPrompt},
    output::{format_error, OutputBuffer, OutputSink},
    packages::PackageResolver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Submitting,
    AwaitingInput,
    Installing,
    Finalized,
}

impl RunState {
    /// Whether a run currently owns the session.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Submitting | RunState::AwaitingInput | RunState::Installing)
    }
}

/// What an entry point hands back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run ended; the text is the finalized display.
    Finalized(String),
    /// The program needs stdin values; collect them and call `submit_collected_inputs`.
    AwaitingInput { prompts: Vec<InputPrompt>, message: String },
    /// The call was not valid in the current state and changed nothing.
    Ignored,
    /// The session was disposed while the service was answering; the response was dropped.
    Stale,
}

impl RunOutcome {
    pub fn finalized_text(&self) -> Option<&str> {
        match self {
            RunOutcome::Finalized(text) => Some(text),
            _ => None,
        }
    }
}

/// Appended to C compile errors when the program reads stdin.
const INTERACTIVE_INPUT_HINT: &str = "\n\nInteractive Input Issue Detected:\n\
     Your program uses scanf() for input. You can now provide input values interactively!\n\n\
     How to use:\n\
     - The program will prompt you for input values\n\
     - Enter each value when prompted\n\
     - The program will continue execution with your input";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Round {
    First,
    Resubmitted,
}

#[derive(Debug)]
struct Pending {
    request: ExecutionRequest,
    prompts: Vec<InputPrompt>,
}

#[derive(Debug)]
struct Inner {
    state: RunState,
    buffer: OutputBuffer,
    finalized: OutputBuffer,
    last_output: Option<String>,
    pending: Option<Pending>,
}

pub struct Orchestrator<C: ExecutionClient> {
    client: Arc<C>,
    language: Language,
    packages: PackageResolver<C>,
    ready: OnceCell<()>,
    inner: Mutex<Inner>,
    live: AtomicBool,
    submissions: AtomicU64,
}

impl<C: ExecutionClient> Orchestrator<C> {
    pub fn new(client: Arc<C>, language: Language) -> Self {
        Self {
            packages: PackageResolver::new(client.clone()),
            client,
            language,
            ready: OnceCell::new(),
            inner: Mutex::new(Inner {
                state: RunState::Idle,
                buffer: OutputBuffer::new(),
                finalized: OutputBuffer::new(),
                last_output: None,
                pending: None,
            }),
            live: AtomicBool::new(true),
            submissions: AtomicU64::new(0),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn packages(&self) -> &PackageResolver<C> {
        &self.packages
    }

    pub fn state(&self) -> RunState {
        self.lock().state
    }

    /// Contents of the live buffer, including a run in progress.
    pub fn buffer_contents(&self) -> String {
        self.lock().buffer.contents()
    }

    /// Text of the last finalized run.
    pub fn last_output(&self) -> Option<String> {
        self.lock().last_output.clone()
    }

    /// Prompts of the run waiting for input, if any.
    pub fn pending_prompts(&self) -> Option<Vec<InputPrompt>> {
        self.lock().pending.as_ref().map(|p| p.prompts.clone())
    }

    /// Number of programs handed to the execution client by this session.
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Detach the session from the UI; responses still in flight are dropped.
    pub fn dispose(&self) {
        debug!("session disposed");
        self.live.store(false, Ordering::Release);
    }

    /// Replace the display with an empty buffer. Ignored while a run is active.
    pub fn clear(&self) -> bool {
        let mut inner = self.lock();
        if inner.state.is_active() {
            return false;
        }
        inner.buffer.clear();
        inner.finalized.clear();
        inner.last_output = None;
        true
    }

    /// Install a package on user request.
    pub async fn install_package(&self, name: &str) -> bool {
        self.packages.install(name).await
    }

    /// Start a run of `code` in the session language.
    pub async fn run(&self, code: &str) -> RunOutcome {
        if !self.is_live() {
            return RunOutcome::Ignored;
        }
        {
            let mut inner = self.lock();
            if inner.state.is_active() {
                debug!(state = ?inner.state, "run ignored: another run is active");
                return RunOutcome::Ignored;
            }
            inner.state = RunState::Submitting;
            inner.buffer.clear();
            inner.pending = None;
        }

        if let Err(message) = self.ensure_ready().await {
            if !self.is_live() {
                return RunOutcome::Stale;
            }
            return self.finish_with(&message);
        }

        let request = ExecutionRequest::new(code, self.language);
        let result = self.submit(&request).await;
        self.drive(request, result, Round::First).await
    }

    /// Resubmit the pending program with the values the user supplied.
    pub async fn submit_collected_inputs(&self, inputs: CollectedInputs) -> RunOutcome {
        if !self.is_live() {
            return RunOutcome::Ignored;
        }
        let request = {
            let mut inner = self.lock();
            if inner.state != RunState::AwaitingInput {
                return RunOutcome::Ignored;
            }
            let Some(pending) = inner.pending.take() else {
                return RunOutcome::Ignored;
            };
            inner.state = RunState::Submitting;
            inner.buffer.clear();
            let values = inputs.padded_to(pending.prompts.len()).into_vec();
            debug!(values = values.len(), "resubmitting with collected inputs");
            pending.request.with_inputs(values)
        };

        let result = self.submit(&request).await;
        self.drive(request, result, Round::Resubmitted).await
    }

    /// Abandon a run waiting for input. The display reverts to the last finalized output.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != RunState::AwaitingInput {
            return false;
        }
        inner.pending = None;
        inner.buffer = inner.finalized.clone();
        inner.state = RunState::Idle;
        debug!("pending run cancelled");
        true
    }

    async fn submit(&self, request: &ExecutionRequest) -> ExecutionResult {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        self.client.execute(request).await
    }

    /// Probe the environment once per session. Failures are not cached.
    async fn ensure_ready(&self) -> Result<(), String> {
        self.ready
            .get_or_try_init(|| async {
                match self.language {
                    Language::Python => {
                        if self.client.health().await {
                            Ok(())
                        } else {
                            Err(backend_down_message(self.client.endpoint(), None))
                        }
                    }
                    Language::C => {
                        let status = self.client.check_c_compiler().await;
                        if status.available {
                            info!(version = ?status.version, "C compiler ready");
                            Ok(())
                        } else {
                            Err(format!(
                                "C compiler not available: {}\n\nPlease install gcc on your system to use the C compiler.",
                                status.error.unwrap_or_else(|| "unknown error".into())
                            ))
                        }
                    }
                }
            })
            .await
            .map(|_| ())
    }

    /// Apply a result, auto-installing at most one missing dependency.
    async fn drive(
        &self,
        request: ExecutionRequest,
        mut result: ExecutionResult,
        round: Round,
    ) -> RunOutcome {
        let mut installed: Option<String> = None;
        loop {
            if !self.is_live() {
                warn!("dropping response for a disposed session");
                return RunOutcome::Stale;
            }
            match result {
                ExecutionResult::MissingDependency { module_name } if installed.is_none() => {
                    {
                        let mut inner = self.lock();
                        inner.state = RunState::Installing;
                        inner.buffer.append(&format!(
                            "Module '{}' not found. Installing automatically...",
                            module_name
                        ));
                    }
                    let ok = self.packages.install(&module_name).await;
                    if !self.is_live() {
                        return RunOutcome::Stale;
                    }
                    if !ok {
                        let reason = self
                            .packages
                            .last_error()
                            .unwrap_or_else(|| "unknown error".into());
                        return self.finish_with(&format!(
                            "Failed to install missing module '{}': {}\nThe program was not retried.",
                            module_name, reason
                        ));
                    }
                    info!(module = %module_name, "retrying after install");
                    {
                        let mut inner = self.lock();
                        inner.state = RunState::Submitting;
                        inner.buffer.append(&format!("Successfully installed {}", module_name));
                        inner.buffer.append("Retrying code execution...");
                    }
                    installed = Some(module_name);
                    result = self.submit(&request).await;
                }
                other => return self.settle(request, other, round, installed.as_deref()),
            }
        }
    }

    /// Finalize or park a run. `installed` names the module auto-installed earlier in this run.
    fn settle(
        &self,
        request: ExecutionRequest,
        result: ExecutionResult,
        round: Round,
        installed: Option<&str>,
    ) -> RunOutcome {
        match result {
            ExecutionResult::Success { stdout, stderr, exit_code, duration_seconds } => {
                let mut inner = self.lock();
                inner.buffer.append_stream(&stdout);
                if !stderr.trim().is_empty() {
                    inner.buffer.append_stream(&stderr);
                }
                inner.buffer.append("");
                inner.buffer.append(&format!(
                    "Execution completed in {:.3}s (Exit code: {})",
                    duration_seconds, exit_code
                ));
                debug!(exit_code, "run finished");
                Self::finalize(&mut inner)
            }
            ExecutionResult::NeedsInput { partial_message } if round == Round::First => {
                let prompts = prompts_for_run(&request.source_code, request.language);
                let mut inner = self.lock();
                inner.buffer.append_stream(&partial_message);
                inner.state = RunState::AwaitingInput;
                inner.pending = Some(Pending { request, prompts: prompts.clone() });
                debug!(prompts = prompts.len(), "awaiting input");
                RunOutcome::AwaitingInput { prompts, message: partial_message }
            }
            ExecutionResult::NeedsInput { partial_message } => {
                warn!("program still blocked on input after resubmission");
                self.finish_with(&format!(
                    "Error: the program is still waiting for input after the provided values were used.\n{}",
                    partial_message
                ))
            }
            ExecutionResult::MissingDependency { module_name } => {
                let error =
                    format_error(&format!("ModuleNotFoundError: No module named '{}'", module_name));
                match installed {
                    Some(first) => {
                        self.finish_with(&format!("Code failed after installing {}:\n{}", first, error))
                    }
                    None => self.finish_with(&format!("Error:\n{}", error)),
                }
            }
            ExecutionResult::CompileError { diagnostic } => {
                let mut message = format!("Compilation failed:\n{}", diagnostic);
                if request.language == Language::C
                    && !extract_prompts(&request.source_code, Language::C).is_empty()
                {
                    message.push_str(INTERACTIVE_INPUT_HINT);
                }
                self.finish_with(&message)
            }
            ExecutionResult::TransportError { cause } => {
                warn!("execution service unreachable: {}", cause);
                self.finish_with(&backend_down_message(self.client.endpoint(), Some(&cause)))
            }
        }
    }

    fn finish_with(&self, message: &str) -> RunOutcome {
        let mut inner = self.lock();
        inner.buffer.append_stream(message);
        Self::finalize(&mut inner)
    }

    fn finalize(inner: &mut Inner) -> RunOutcome {
        let text = inner.buffer.finalize();
        inner.finalized = inner.buffer.clone();
        inner.last_output = Some(text.clone());
        inner.pending = None;
        inner.state = RunState::Finalized;
        RunOutcome::Finalized(text)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Actionable text for an unreachable service.
pub fn backend_down_message(endpoint: &str, cause: Option<&str>) -> String {
    let mut msg = match cause {
        Some(c) => format!("Failed to reach the execution service at {}:\n{}\n\n", endpoint, c),
        None => "Backend server is not running!\n\n".to_string(),
    };
    msg.push_str(
        "Please start the backend server:\n\n\
         1. Navigate to the backend directory\n\
         2. Create a virtual environment: python -m venv venv\n\
         3. Activate it: source venv/bin/activate (or venv\\Scripts\\activate on Windows)\n\
         4. Install dependencies: pip install -r requirements.txt\n\
         5. Start server: python app.py\n\n",
    );
    msg.push_str(&format!("The server should be running on {}", endpoint));
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{CompilerStatus, InstallOutcome};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedClient {
        results: Mutex<VecDeque<ExecutionResult>>,
        requests: Mutex<Vec<ExecutionRequest>>,
        installs: Mutex<Vec<String>>,
        install_fails: bool,
        unhealthy: bool,
        compiler_missing: bool,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedClient {
        fn with(results: Vec<ExecutionResult>) -> Self {
            Self { results: Mutex::new(results.into()), ..Default::default() }
        }

        fn requests(&self) -> Vec<ExecutionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutionClient for ScriptedClient {
        fn endpoint(&self) -> &str {
            "http://localhost:5001"
        }
        async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ExecutionResult::TransportError { cause: "script exhausted".into() })
        }
        async fn health(&self) -> bool {
            !self.unhealthy
        }
        async fn check_c_compiler(&self) -> CompilerStatus {
            CompilerStatus {
                available: !self.compiler_missing,
                version: Some("gcc (GCC) 13.2.0".into()),
                error: self.compiler_missing.then(|| "gcc not installed".to_string()),
            }
        }
        async fn install_package(&self, name: &str) -> InstallOutcome {
            self.installs.lock().unwrap().push(name.to_string());
            if self.install_fails {
                InstallOutcome::Failed { error: format!("Failed to install {}", name) }
            } else {
                InstallOutcome::Installed { message: format!("Successfully installed {}", name) }
            }
        }
        async fn list_packages(&self) -> crate::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn success(stdout: &str) -> ExecutionResult {
        ExecutionResult::Success {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            duration_seconds: 0.01,
        }
    }

    fn needs_input() -> ExecutionResult {
        ExecutionResult::NeedsInput { partial_message: "Program needs input".into() }
    }

    #[tokio::test]
    async fn success_finalizes_with_summary() {
        let client = Arc::new(ScriptedClient::with(vec![success("hi\n")]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        let out = session.run("print('hi')").await;
        let text = out.finalized_text().unwrap();
        assert!(text.starts_with("=== Output ===\nhi\n"));
        assert!(text.contains("Exit code: 0"));
        assert_eq!(session.state(), RunState::Finalized);
        assert_eq!(session.last_output().as_deref(), Some(text));
    }

    #[tokio::test]
    async fn stderr_follows_stdout_on_its_own_line() {
        let client = Arc::new(ScriptedClient::with(vec![ExecutionResult::Success {
            stdout: "out".into(),
            stderr: "Traceback: boom\n".into(),
            exit_code: 1,
            duration_seconds: 0.5,
        }]));
        let session = Orchestrator::new(client, Language::Python);
        let text = session.run("x").await.finalized_text().unwrap().to_string();
        assert!(text.contains("out\nTraceback: boom\n"));
        assert!(text.ends_with("Execution completed in 0.500s (Exit code: 1)"));
    }

    #[tokio::test]
    async fn needs_input_then_resubmission() {
        let client = Arc::new(ScriptedClient::with(vec![needs_input(), success("25\n")]));
        let session = Orchestrator::new(client.clone(), Language::Python);

        let out = session.run("x=int(input())\nprint(x*x)").await;
        let RunOutcome::AwaitingInput { prompts, .. } = out else {
            panic!("expected AwaitingInput, got {:?}", out);
        };
        assert_eq!(prompts.len(), 1);
        assert_eq!(session.state(), RunState::AwaitingInput);

        let out = session.submit_collected_inputs(vec!["5".to_string()].into()).await;
        assert!(out.finalized_text().unwrap().contains("25"));
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].prior_inputs.is_empty());
        assert_eq!(requests[1].prior_inputs, vec!["5"]);
        assert_eq!(requests[1].source_code, requests[0].source_code);
    }

    #[tokio::test]
    async fn short_inputs_are_padded_to_prompt_count() {
        let client = Arc::new(ScriptedClient::with(vec![needs_input(), success("")]));
        let session = Orchestrator::new(client.clone(), Language::C);
        let code = "int a,b,c;\nscanf(\"%d\", &a);\nscanf(\"%d\", &b);\nscanf(\"%d\", &c);\n";
        session.run(code).await;
        session.submit_collected_inputs(vec!["1".to_string()].into()).await;
        assert_eq!(client.requests()[1].prior_inputs, vec!["1", "", ""]);
    }

    #[tokio::test]
    async fn second_needs_input_is_a_hard_failure() {
        let client = Arc::new(ScriptedClient::with(vec![needs_input(), needs_input()]));
        let session = Orchestrator::new(client, Language::C);
        session.run("scanf(\"%d\", &n);").await;
        let out = session.submit_collected_inputs(vec!["1".to_string()].into()).await;
        assert!(out.finalized_text().unwrap().contains("still waiting for input"));
        assert_eq!(session.state(), RunState::Finalized);
        assert!(session.pending_prompts().is_none());
    }

    #[tokio::test]
    async fn missing_dependency_installs_and_retries_once() {
        let client = Arc::new(ScriptedClient::with(vec![
            ExecutionResult::MissingDependency { module_name: "foo".into() },
            success("imported\n"),
        ]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        let text = session.run("import foo").await.finalized_text().unwrap().to_string();
        assert!(text.contains("Module 'foo' not found. Installing automatically..."));
        assert!(text.contains("imported"));
        assert!(session.packages().is_installed("foo"));
        assert_eq!(client.requests().len(), 2);
        assert_eq!(*client.installs.lock().unwrap(), vec!["foo"]);
    }

    #[tokio::test]
    async fn second_missing_dependency_is_not_chained() {
        let client = Arc::new(ScriptedClient::with(vec![
            ExecutionResult::MissingDependency { module_name: "foo".into() },
            ExecutionResult::MissingDependency { module_name: "bar".into() },
        ]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        let text = session.run("import foo, bar").await.finalized_text().unwrap().to_string();
        assert!(text.contains("Code failed after installing foo"));
        assert!(text.contains("'bar'"));
        assert_eq!(client.requests().len(), 2);
        assert_eq!(client.installs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_install_finalizes_without_retry() {
        let client = Arc::new(ScriptedClient {
            install_fails: true,
            ..ScriptedClient::with(vec![ExecutionResult::MissingDependency { module_name: "foo".into() }])
        });
        let session = Orchestrator::new(client.clone(), Language::Python);
        let text = session.run("import foo").await.finalized_text().unwrap().to_string();
        assert!(text.contains("Failed to install missing module 'foo'"));
        assert_eq!(client.requests().len(), 1);
        assert!(!session.packages().is_installed("foo"));
    }

    #[tokio::test]
    async fn compile_and_transport_errors_finalize_immediately() {
        let client = Arc::new(ScriptedClient::with(vec![
            ExecutionResult::CompileError { diagnostic: "main.c:3: error: expected ';'".into() },
            ExecutionResult::TransportError { cause: "connection refused".into() },
        ]));
        let session = Orchestrator::new(client.clone(), Language::C);
        let text = session.run("int main(){").await.finalized_text().unwrap().to_string();
        assert!(text.contains("Compilation failed:\nmain.c:3: error: expected ';'"));

        let text = session.run("int main(){}").await.finalized_text().unwrap().to_string();
        assert!(text.contains("connection refused"));
        assert!(text.contains("http://localhost:5001"));
        assert!(text.contains("python app.py"));
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn compile_error_hints_at_interactive_input_for_reads() {
        let client = Arc::new(ScriptedClient::with(vec![
            ExecutionResult::CompileError { diagnostic: "main.c:2: error: 'n' undeclared".into() },
            ExecutionResult::CompileError { diagnostic: "main.c:1: error: expected ';'".into() },
        ]));
        let session = Orchestrator::new(client, Language::C);

        let text = session.run("int main(){\nscanf(\"%d\", &n);\n}").await.finalized_text().unwrap().to_string();
        assert!(text.contains("'n' undeclared\n\nInteractive Input Issue Detected:"));
        assert!(text.ends_with("The program will continue execution with your input"));

        let text = session.run("int main(){ return 0 }").await.finalized_text().unwrap().to_string();
        assert!(!text.contains("Interactive Input Issue Detected"));
    }

    #[tokio::test]
    async fn run_while_submitting_is_dropped() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::with(vec![success("first\n"), success("second\n")])
        });
        let session = Orchestrator::new(client.clone(), Language::Python);

        let first = session.run("print('first')");
        let second = async {
            while session.submissions() == 0 {
                tokio::task::yield_now().await;
            }
            assert_eq!(session.state(), RunState::Submitting);
            let before = session.buffer_contents();
            let outcome = session.run("print('second')").await;
            assert_eq!(session.buffer_contents(), before);
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.finalized_text().unwrap().contains("first"));
        assert_eq!(second, RunOutcome::Ignored);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn run_while_awaiting_input_is_dropped() {
        let client = Arc::new(ScriptedClient::with(vec![needs_input()]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        session.run("input()").await;
        assert_eq!(session.run("print(1)").await, RunOutcome::Ignored);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn cancel_restores_last_finalized_output() {
        let client = Arc::new(ScriptedClient::with(vec![success("earlier\n"), needs_input()]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        session.run("print('earlier')").await;
        let finalized = session.buffer_contents();
        session.run("input()").await;
        assert_ne!(session.buffer_contents(), finalized);

        assert!(session.cancel());
        assert_eq!(session.state(), RunState::Idle);
        assert_eq!(session.buffer_contents(), finalized);
        assert!(!session.cancel());
        assert_eq!(
            session.submit_collected_inputs(CollectedInputs::default()).await,
            RunOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn disposed_session_drops_in_flight_response() {
        let gate = Arc::new(Notify::new());
        let client = Arc::new(ScriptedClient {
            gate: Some(gate.clone()),
            ..ScriptedClient::with(vec![success("late\n")])
        });
        let session = Orchestrator::new(client, Language::Python);

        let run = session.run("print('late')");
        let leave = async {
            while session.submissions() == 0 {
                tokio::task::yield_now().await;
            }
            session.dispose();
            gate.notify_one();
        };
        let (outcome, _) = tokio::join!(run, leave);

        assert_eq!(outcome, RunOutcome::Stale);
        assert!(session.last_output().is_none());
        assert_eq!(session.run("print(1)").await, RunOutcome::Ignored);
    }

    #[tokio::test]
    async fn disposed_session_sends_no_resubmission() {
        let client = Arc::new(ScriptedClient::with(vec![needs_input(), success("late\n")]));
        let session = Orchestrator::new(client.clone(), Language::Python);
        session.run("input()").await;
        session.dispose();

        let outcome = session.submit_collected_inputs(vec!["1".to_string()].into()).await;

        assert_eq!(outcome, RunOutcome::Ignored);
        assert_eq!(client.requests().len(), 1);
        assert_eq!(session.state(), RunState::AwaitingInput);
    }

    #[tokio::test]
    async fn unreachable_backend_is_reported_before_submitting() {
        let client = Arc::new(ScriptedClient { unhealthy: true, ..Default::default() });
        let session = Orchestrator::new(client.clone(), Language::Python);
        let text = session.run("print(1)").await.finalized_text().unwrap().to_string();
        assert!(text.contains("Backend server is not running!"));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_compiler_is_reported() {
        let client = Arc::new(ScriptedClient { compiler_missing: true, ..Default::default() });
        let session = Orchestrator::new(client.clone(), Language::C);
        let text = session.run("int main(){}").await.finalized_text().unwrap().to_string();
        assert!(text.contains("C compiler not available: gcc not installed"));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn clear_is_refused_during_a_run() {
        let client = Arc::new(ScriptedClient::with(vec![success("x\n"), needs_input()]));
        let session = Orchestrator::new(client, Language::Python);
        session.run("print('x')").await;
        assert!(session.clear());
        assert!(session.last_output().is_none());
        session.run("input()").await;
        assert!(!session.clear());
    }
}

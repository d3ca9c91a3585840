//! Program runner: drives one run to a finalized display, collecting input on the way.

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::Result;
use is_terminal::IsTerminal;

use crate::{
    config::Config,
    execution::{ExecutionClient, HttpExecutionClient, Language},
    input::{collect_from_terminal, CollectedInputs, InputCollector},
    printer::OutputPrinter,
    session::{Orchestrator, RunOutcome},
};

/// Run `code` on the configured service and print the result.
pub async fn run(cfg: &Config, code: &str, language: Language, inputs: Vec<String>, printer: &OutputPrinter) -> Result<()> {
    let client = Arc::new(HttpExecutionClient::from_config(cfg)?);
    let session = Orchestrator::new(client, language);

    printer.status(match language {
        Language::C => "Compiling C code...",
        Language::Python => "Executing code on backend...",
    });

    // Prompt on the terminal only when stdin is not carrying the program itself.
    let interactive = io::stdin().is_terminal();
    let text = if interactive {
        let stdin = io::stdin();
        execute_program(&session, code, inputs, Some((stdin.lock(), io::stderr())), printer).await?
    } else {
        execute_program(&session, code, inputs, None::<(io::Empty, io::Sink)>, printer).await?
    };

    match text {
        Some(text) => printer.print(&text),
        None => printer.status("Run cancelled."),
    }
    Ok(())
}

/// Drive a session through one run.
///
/// Values in `inputs` answer the first input request; otherwise the terminal, when given,
/// collects them, and without one the run is resubmitted with empty values. Returns the
/// finalized text, or `None` when the user cancelled.
pub async fn execute_program<C, R, W>(
    session: &Orchestrator<C>,
    code: &str,
    mut inputs: Vec<String>,
    mut terminal: Option<(R, W)>,
    printer: &OutputPrinter,
) -> Result<Option<String>>
where
    C: ExecutionClient,
    R: BufRead,
    W: Write,
{
    let mut outcome = session.run(code).await;
    loop {
        match outcome {
            RunOutcome::Finalized(text) => return Ok(Some(text)),
            RunOutcome::AwaitingInput { prompts, message } => {
                printer.status(&message);
                let collected = if !inputs.is_empty() {
                    CollectedInputs::from(std::mem::take(&mut inputs))
                } else if let Some((reader, writer)) = terminal.as_mut() {
                    let mut collector = InputCollector::new(prompts);
                    collect_from_terminal(&mut collector, reader, writer)?;
                    match collector.collected() {
                        Some(values) => values,
                        None => {
                            session.cancel();
                            return Ok(None);
                        }
                    }
                } else {
                    CollectedInputs::default()
                };
                printer.status("Providing input and continuing execution...");
                outcome = session.submit_collected_inputs(collected).await;
            }
            RunOutcome::Ignored | RunOutcome::Stale => {
                anyhow::bail!("run was not started: the session is busy or closed")
            }
        }
    }
}

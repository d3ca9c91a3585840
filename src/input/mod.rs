//! Interactive input collection for programs that block on stdin.

use std::io::{self, BufRead, Write};

use tracing::debug;

pub mod prompts;

pub use prompts::{extract_prompts, prompts_for_run};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPrompt {
    /// 1-based position in source order.
    pub ordinal: usize,
    pub label: String,
}

/// Values gathered for one resubmission, in prompt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedInputs(Vec<String>);

impl CollectedInputs {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Pad with empty strings up to `count` values.
    pub fn padded_to(mut self, count: usize) -> Self {
        if self.0.len() < count {
            self.0.resize(count, String::new());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for CollectedInputs {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Waiting for the value of the prompt at this 0-based index.
    AwaitingValue(usize),
    Complete,
    Cancelled,
}

/// Sequential, one-value-at-a-time capture of stdin values.
#[derive(Debug, Clone)]
pub struct InputCollector {
    prompts: Vec<InputPrompt>,
    values: Vec<String>,
    state: CollectorState,
}

impl InputCollector {
    pub fn new(prompts: Vec<InputPrompt>) -> Self {
        let state = if prompts.is_empty() {
            CollectorState::Complete
        } else {
            CollectorState::AwaitingValue(0)
        };
        Self { prompts, values: Vec::new(), state }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn prompts(&self) -> &[InputPrompt] {
        &self.prompts
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Values accepted so far.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn current_prompt(&self) -> Option<&InputPrompt> {
        match self.state {
            CollectorState::AwaitingValue(i) => self.prompts.get(i),
            _ => None,
        }
    }

    /// Offer a value for the current prompt.
    ///
    /// Blank values are rejected and leave the state untouched. Returns whether the
    /// value was accepted.
    pub fn submit_value(&mut self, text: &str) -> bool {
        let CollectorState::AwaitingValue(index) = self.state else {
            return false;
        };
        let value = text.trim();
        if value.is_empty() {
            return false;
        }
        self.values.push(value.to_string());
        self.state = if index + 1 == self.prompts.len() {
            CollectorState::Complete
        } else {
            CollectorState::AwaitingValue(index + 1)
        };
        debug!(ordinal = index + 1, state = ?self.state, "input accepted");
        true
    }

    /// Finish early; the missing values become empty strings.
    pub fn skip_remaining(&mut self) -> bool {
        if !matches!(self.state, CollectorState::AwaitingValue(_)) {
            return false;
        }
        self.values.resize(self.prompts.len(), String::new());
        self.state = CollectorState::Complete;
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !matches!(self.state, CollectorState::AwaitingValue(_)) {
            return false;
        }
        self.state = CollectorState::Cancelled;
        true
    }

    /// The collected values once complete.
    pub fn collected(&self) -> Option<CollectedInputs> {
        match self.state {
            CollectorState::Complete => {
                Some(CollectedInputs::new(self.values.clone()).padded_to(self.prompts.len()))
            }
            _ => None,
        }
    }
}

const SKIP_COMMAND: &str = ":skip";
const CANCEL_COMMAND: &str = ":cancel";

/// Walk a collector over a line-oriented terminal.
///
/// `:skip` finishes early, `:cancel` abandons the run, and end of input acts as skip.
pub fn collect_from_terminal<R: BufRead, W: Write>(
    collector: &mut InputCollector,
    mut reader: R,
    mut writer: W,
) -> io::Result<()> {
    let total = collector.prompt_count();
    if total > 0 {
        writeln!(
            writer,
            "Interactive input required. Enter each value when prompted ({} to submit the rest empty, {} to abort).",
            SKIP_COMMAND, CANCEL_COMMAND
        )?;
    }
    while let CollectorState::AwaitingValue(index) = collector.state() {
        let label = collector
            .current_prompt()
            .map(|p| p.label.clone())
            .unwrap_or_else(|| prompts::GENERIC_LABEL.to_string());
        write!(writer, "Input {} of {} | #{}: {} ", index + 1, total, index + 1, label)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            collector.skip_remaining();
            break;
        }
        match line.trim() {
            SKIP_COMMAND => {
                collector.skip_remaining();
            }
            CANCEL_COMMAND => {
                collector.cancel();
            }
            value => {
                if !collector.submit_value(value) {
                    writeln!(writer, "A value is required ({} or {}).", SKIP_COMMAND, CANCEL_COMMAND)?;
                }
            }
        }
    }
    Ok(())
}

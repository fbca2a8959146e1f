use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};
use std::borrow::Cow;
use tracing::{debug, warn};

use evalshell::{Evaluation, Shell, ShellConfig, Value};

/// Prompt showing the evaluation counter, or the continuation marker mid-input
struct ShellPrompt {
    primary: String,
    continuation: String,
    counter: u64,
    is_continuation: bool,
}

impl ShellPrompt {
    fn new(config: &ShellConfig) -> Self {
        Self {
            primary: config.prompt.clone(),
            continuation: config.continuation_prompt.clone(),
            counter: 1,
            is_continuation: false,
        }
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        // Reset colors left over from command output
        if self.is_continuation {
            Cow::Owned(format!("\x1b[0m{}", self.continuation))
        } else {
            Cow::Owned(format!("\x1b[0m[{}] {}", self.counter, self.primary))
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse search) ", prefix))
    }
}

fn line_editor(config: &ShellConfig, with_history: bool) -> Reedline {
    let editor = Reedline::create();
    if !with_history {
        return editor;
    }

    let Some(path) = config.resolved_history_file() else {
        return editor;
    };
    match FileBackedHistory::with_file(config.history_size, path.clone()) {
        Ok(history) => editor.with_history(Box::new(history)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "history disabled");
            editor
        }
    }
}

/// Settle an evaluation and print its value or error trace
pub fn report(evaluation: Evaluation) -> bool {
    match evaluation.wait() {
        Ok(Value::None) => true,
        Ok(value) => {
            println!("{value}");
            true
        }
        Err(err) => {
            for line in err.trace() {
                eprintln!("{line}");
            }
            false
        }
    }
}

/// Read, evaluate and report until Ctrl-D
pub fn run(shell: &mut Shell, with_history: bool) -> anyhow::Result<()> {
    let mut line_editor = line_editor(shell.config(), with_history);
    let mut prompt = ShellPrompt::new(shell.config());
    let mut buffer = String::new();

    println!("evalshell: Python evaluation shell");
    println!("Use %name for line commands, %%name for block commands (end with a blank line)");
    println!("Press Ctrl+D to quit");
    println!();

    loop {
        prompt.is_continuation = !buffer.is_empty();

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }

                if !shell.is_complete(&buffer) {
                    continue;
                }

                let evaluation_id = prompt.counter.to_string();
                let text = if buffer.starts_with("%%") {
                    // The terminating blank line is not part of the data block
                    buffer.strip_suffix('\n').unwrap_or(&buffer)
                } else {
                    buffer.as_str()
                };
                debug!(evaluation_id = %evaluation_id, "submitting input");
                report(shell.evaluate(text, &evaluation_id));

                prompt.counter += 1;
                buffer.clear();
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                buffer.clear();
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("Exiting...");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

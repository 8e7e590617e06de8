use std::ops::ControlFlow;

use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    const HISTORY: Option<&'static str> = None;
    const PROMPT: &'static str = ">> ";
    /// Handles one complete input. `ControlFlow::Break` ends the session.
    fn evaluate(&mut self, input: String) -> Result<ControlFlow<()>, Self::Error>;
}

/// Joins a line ending with `\` onto the pending input, returning the completed input otherwise.
fn accumulate(pending: &mut Option<String>, mut line: String) -> Option<String> {
    if line.ends_with('\\') {
        line.pop();
        line.push('\n');
        match pending.as_mut() {
            Some(input) => input.push_str(line.as_str()),
            None => *pending = Some(line),
        }
        return None;
    }
    Some(match pending.take() {
        Some(mut input) => {
            input.push_str(line.as_str());
            input
        }
        None => line,
    })
}

pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = R::HISTORY {
        editor.load_history(history).ok();
    }
    let mut pending: Option<String> = None;
    loop {
        match editor.readline(R::PROMPT) {
            Ok(line) => {
                let input = match accumulate(&mut pending, line) {
                    Some(input) => input,
                    None => continue,
                };
                editor.add_history_entry(input.as_str());
                let flow = repl.evaluate(input).map_err(Error::EvalError)?;
                if let Some(history) = R::HISTORY {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
                if flow.is_break() {
                    println!("Bye!");
                    break Ok(());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}

//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection, user prompting, and the interactive prompter
//! used by `publish` and `workflows`.

use std::io::{self, BufRead, IsTerminal, Write};

use skill4d::publish::Prompter;

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn is_stderr_tty() -> bool {
    io::stderr().is_terminal()
}

/// Prompts are written to stderr so stdout keeps only the JSON envelope.
pub fn can_prompt() -> bool {
    is_stdin_tty() && is_stderr_tty()
}

pub fn prompt(message: &str) -> skill4d::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line).map_err(|e| {
        skill4d::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
    })?;

    Ok(line.trim().to_string())
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if is_stderr_tty() {
        eprintln!("{}", message);
    }
}

/// Answers questions from the terminal.
pub struct TtyPrompter;

impl TtyPrompter {
    /// Interactive prompter unless `--yes` was passed or there is no terminal.
    pub fn for_flags(yes: bool) -> Box<dyn Prompter> {
        if yes || !can_prompt() {
            Box::new(skill4d::publish::NonInteractive)
        } else {
            Box::new(TtyPrompter)
        }
    }
}

impl Prompter for TtyPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        match prompt(&format!("{} [Y/n]: ", question)) {
            Ok(answer) => !answer.eq_ignore_ascii_case("n") && !answer.eq_ignore_ascii_case("no"),
            Err(_) => false,
        }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        prompt(question).ok().filter(|answer| !answer.is_empty())
    }
}

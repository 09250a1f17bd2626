//! `konspekt chat`: interactive question loop over stdin.
//!
//! Every line is a question unless it starts with `:`.
//!
//! | Input | Action |
//! |-------|--------|
//! | `:ingest <path>` | add a document |
//! | `:stats` | print index statistics |
//! | `:clear` | delete the index |
//! | `:help` | list commands |
//! | `:quit` / `:exit` | leave (as does end of input) |

use std::io::{BufRead, Write};

use anyhow::Result;

use konspekt_core::index::VectorIndex;

use crate::config::Config;
use crate::engine::{build_engine, AppEngine};
use crate::errors::{describe_error, describe_retrieval_error};
use crate::ingest::{format_report, ingest_one};
use crate::search::answer_question;
use crate::stats::{collect_stats, render_stats};

const HELP: &str = "Type a question, or one of:
  :ingest <path>   add a document to the index
  :stats           show index statistics
  :clear           delete the index
  :help            show this help
  :quit            leave";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Empty,
    Ask(&'a str),
    Ingest(&'a str),
    Stats,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return ChatCommand::Ask(line);
    };
    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    match cmd {
        "ingest" | "load" => ChatCommand::Ingest(arg),
        "stats" => ChatCommand::Stats,
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Unknown(cmd),
    }
}

/// Drive the loop until `:quit` or end of input. Command failures are
/// reported on `output` and the loop continues.
pub fn chat_loop<R: BufRead, W: Write>(
    engine: &mut AppEngine,
    config: &Config,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(
        output,
        "Konspekt chat. {} fragments indexed. Type :help for commands.",
        engine.index().size()
    )?;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => writeln!(output, "{}", HELP)?,
            ChatCommand::Unknown(cmd) => {
                writeln!(output, "Unknown command ':{}'. Type :help for commands.", cmd)?
            }
            ChatCommand::Stats => {
                write!(output, "{}", render_stats(&collect_stats(engine.index())))?
            }
            ChatCommand::Clear => match engine.clear() {
                Ok(()) => writeln!(output, "Index cleared.")?,
                Err(e) => writeln!(output, "error: {}", describe_retrieval_error(&e))?,
            },
            ChatCommand::Ingest("") => writeln!(output, "usage: :ingest <path>")?,
            ChatCommand::Ingest(path) => match ingest_one(engine, std::path::Path::new(path)) {
                Ok(report) => writeln!(output, "{}", format_report(&report))?,
                Err(e) => writeln!(output, "error: {}", describe_error(&e))?,
            },
            ChatCommand::Ask(question) => match answer_question(engine, config, question, None) {
                Ok(response) => writeln!(output, "{}", response.answer)?,
                Err(e) => writeln!(output, "error: {}", describe_retrieval_error(&e))?,
            },
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    writeln!(output)?;
    Ok(())
}

/// Run the chat command on stdin/stdout.
pub fn run_chat(config: &Config) -> Result<()> {
    let mut engine = build_engine(config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    chat_loop(&mut engine, config, stdin.lock(), stdout.lock())
}

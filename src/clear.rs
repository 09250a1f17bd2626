//! `konspekt clear`: delete the index directory.

use std::io::{BufRead, Write};

use anyhow::Result;

use konspekt_core::index::VectorIndex;

use crate::config::Config;
use crate::engine::open_index;

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm<R: BufRead, W: Write>(mut input: R, mut output: W, prompt: &str) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Run the clear command. Without `yes`, asks on stdin first.
pub fn run_clear(config: &Config, yes: bool) -> Result<()> {
    let mut index = open_index(config)?;
    if !yes {
        let prompt = format!(
            "Delete the index at {} ({} fragments)?",
            index.dir().display(),
            index.size()
        );
        let stdin = std::io::stdin();
        if !confirm(stdin.lock(), std::io::stdout(), &prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }
    index.clear()?;
    println!("Index cleared: {}", index.dir().display());
    Ok(())
}

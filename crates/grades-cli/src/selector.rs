//! Interactive module selection.

use std::io::{self, BufRead, Write};

use grades_model::{ErrorKind, ModuleCatalog, ModuleFilter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("input ended before a module was selected")]
    EndOfInput,

    #[error("failed to read module selection: {0}")]
    Io(#[from] io::Error),
}

impl SelectionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Input
    }
}

/// Print a numbered menu of `catalog` and read choices from `input` until a
/// valid position is entered.
///
/// Returns `None` without prompting when the catalog is empty. Non-numeric
/// and out-of-range answers re-prompt; end of input is an error.
pub fn select_module<R, W>(
    catalog: &ModuleCatalog,
    input: &mut R,
    output: &mut W,
) -> Result<Option<ModuleFilter>, SelectionError>
where
    R: BufRead,
    W: Write,
{
    if catalog.is_empty() {
        return Ok(None);
    }
    writeln!(output, "Available modules:")?;
    for (idx, name) in catalog.names().iter().enumerate() {
        writeln!(output, "  {}. {name}", idx + 1)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select a module [1-{}]: ", catalog.len())?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(SelectionError::EndOfInput);
        }
        let answer = line.trim();
        let Ok(position) = answer.parse::<usize>() else {
            writeln!(output, "'{answer}' is not a number.")?;
            continue;
        };
        match catalog.select(position) {
            Some(module) => {
                writeln!(output, "Selected module: {module}")?;
                return Ok(Some(module));
            }
            None => writeln!(
                output,
                "Please enter a number between 1 and {}.",
                catalog.len()
            )?,
        }
    }
}

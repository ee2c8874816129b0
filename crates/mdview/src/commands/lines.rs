//! `mdview lines` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdview_markup::render_lines;

use super::write_output;
use crate::error::CliError;

/// Arguments for the lines command.
#[derive(Args)]
pub(crate) struct LinesArgs {
    /// File to render.
    file: PathBuf,

    /// Output HTML file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl LinesArgs {
    /// Execute the lines command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input or output file cannot be accessed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let text = std::fs::read_to_string(&self.file)?;
        write_output(self.output.as_deref(), &render_lines(&text))
    }
}

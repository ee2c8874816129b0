//! `mdview render` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdview_diagrams::PassOutcome;

use super::{ConfigArgs, write_output};
use crate::engine::build_session;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    file: PathBuf,

    /// Output HTML file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input or output file
    /// cannot be accessed. Diagram failures are shown inline, not returned.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        let text = std::fs::read_to_string(&self.file)?;

        let session = build_session(&config);
        session.set_content(&text);
        let outcome = session.render_pending().await;

        if let PassOutcome::Completed { rendered, failed } = outcome {
            if failed > 0 {
                output.warning(&format!(
                    "{failed} of {} diagrams failed to render",
                    rendered + failed
                ));
            }
            tracing::info!(rendered, failed, "Rendered diagrams");
        }

        write_output(self.output.as_deref(), &session.snapshot().html)?;
        if let Some(path) = &self.output {
            output.success(&format!("Wrote {}", path.display()));
        }
        Ok(())
    }
}

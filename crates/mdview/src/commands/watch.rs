//! `mdview watch` command implementation.
//!
//! Watches the input file and resubmits its content to the render session
//! on every change. Each published snapshot is written to the output file,
//! so the output first shows placeholders and then fills in diagram by
//! diagram. Saves arriving mid-render supersede the running pass.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::ConfigArgs;
use crate::engine::build_session;
use crate::error::CliError;
use crate::output::Output;

/// Quiet period after a change before the file is re-read.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Markdown file to watch.
    file: PathBuf,

    /// Output HTML file, rewritten on every update.
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Runs until interrupted with Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input file cannot be
    /// read initially, or the file watcher cannot be created.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        let input = std::fs::canonicalize(&self.file)?;
        let text = std::fs::read_to_string(&input)?;

        let session = Arc::new(build_session(&config));

        let mut snapshots = session.subscribe();
        let output_path = self.output.clone();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if let Err(e) = tokio::fs::write(&output_path, &snapshot.html).await {
                    tracing::warn!(path = %output_path.display(), "Failed to write output: {e}");
                } else {
                    tracing::debug!(generation = snapshot.generation, "Wrote snapshot");
                }
            }
        });

        // Editors often save via "write temp + rename", so watch the directory
        let (tx, mut rx) = mpsc::channel::<Event>(100);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Use blocking_send since callback is sync
                let _ = tx.blocking_send(event);
            }
        })?;
        let watch_dir = input.parent().unwrap_or(Path::new("."));
        watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

        session.submit(&text);
        output.info(&format!(
            "Watching {} -> {}",
            input.display(),
            self.output.display()
        ));

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    if !is_content_change(&event, &input) {
                        continue;
                    }

                    // Coalesce the burst of events a single save produces
                    tokio::time::sleep(DEBOUNCE).await;
                    while rx.try_recv().is_ok() {}

                    match tokio::fs::read_to_string(&input).await {
                        Ok(text) => {
                            let generation = session.generation() + 1;
                            session.submit(&text);
                            output.info(&format!("Re-rendering (generation {generation})"));
                        }
                        Err(e) => {
                            tracing::warn!(path = %input.display(), "Failed to read input: {e}");
                        }
                    }
                }
            }
        }

        drop(watcher);
        output.success("Stopped watching");
        Ok(())
    }
}

/// Whether `event` changes the content of `input`.
fn is_content_change(event: &Event, input: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| path == input)
}

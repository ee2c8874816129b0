//! Versioned render sessions.
//!
//! A [`RenderSession`] holds the committed document of one viewer instance
//! and fills its diagram placeholders asynchronously:
//!
//! - [`RenderSession::set_content`] runs the markdown pipeline synchronously,
//!   bumps the generation counter and commits the new document.
//! - [`RenderSession::render_pending`] renders `Pending` slots one at a time.
//!   At most one pass runs per session; a request made while a pass is in
//!   flight is recorded and served by re-running the pass once it finishes.
//! - After every engine call the pass compares the generation it captured at
//!   start with the live counter. On mismatch the result is dropped and the
//!   pass stops without touching the document.
//!
//! Committed state is published through a `tokio::sync::watch` channel so
//! observers always see a self-consistent document.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mdview_markup::Pipeline;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::consts::DEFAULT_RENDER_TIMEOUT;
use crate::document::Document;
use crate::engine::DiagramEngine;
use crate::error::DiagramError;

/// Published view of a session's committed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Generation of the document.
    pub generation: u64,
    /// Document HTML at the time of publishing.
    pub html: String,
}

impl Snapshot {
    fn of(document: &Document) -> Self {
        Self {
            generation: document.generation(),
            html: document.html().to_owned(),
        }
    }
}

/// Result of [`RenderSession::render_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every pending slot of the current generation was processed.
    Completed {
        /// Slots replaced by engine output.
        rendered: usize,
        /// Slots replaced by an error display.
        failed: usize,
    },
    /// Newer content was committed while a render was in flight; the pass
    /// stopped without applying the result.
    Superseded,
    /// Another pass was in flight; it runs again once it finishes.
    Queued,
}

#[derive(Debug, Default)]
struct Flight {
    in_flight: bool,
    rerun: bool,
}

/// Holds the in-flight flag for the duration of a pass.
///
/// Dropping the guard without [`FlightGuard::finish`] releases the flag so
/// later passes can start. A slot left mid-render is reset by its own
/// [`RenderingSlot`].
struct FlightGuard<'a> {
    flight: &'a Mutex<Flight>,
    released: bool,
}

impl<'a> FlightGuard<'a> {
    /// Take the in-flight flag, or record a rerun request if it is taken.
    fn begin(flight: &'a Mutex<Flight>) -> Option<Self> {
        let mut state = flight.lock().unwrap();
        if state.in_flight {
            state.rerun = true;
            return None;
        }
        state.in_flight = true;
        Some(Self {
            flight,
            released: false,
        })
    }

    /// Consume a pending rerun request, or release the flag if there is none.
    ///
    /// Both happen under one lock so a request made concurrently is never lost.
    fn finish(&mut self) -> bool {
        let mut state = self.flight.lock().unwrap();
        if state.rerun {
            state.rerun = false;
            return true;
        }
        state.in_flight = false;
        self.released = true;
        false
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            let mut state = self.flight.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight = false;
            state.rerun = false;
        }
    }
}

/// Marks one slot of a captured generation as being rendered.
///
/// If the pass is dropped before [`RenderingSlot::complete`], the slot goes
/// back to `Pending` so the next pass picks it up again.
struct RenderingSlot<'a> {
    document: &'a Mutex<Document>,
    generation: u64,
    index: usize,
    armed: bool,
}

impl<'a> RenderingSlot<'a> {
    fn new(document: &'a Mutex<Document>, generation: u64, index: usize) -> Self {
        Self {
            document,
            generation,
            index,
            armed: true,
        }
    }

    /// The engine call returned; the slot is settled by the caller.
    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for RenderingSlot<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut document = self.document.lock().unwrap_or_else(PoisonError::into_inner);
        if document.generation() == self.generation {
            tracing::debug!(index = self.index, "Render abandoned, slot pending again");
            document.reset_rendering(self.index);
        }
    }
}

/// Rendering state of one viewer instance.
///
/// # Example
///
/// ```
/// use mdview_diagrams::{DisabledEngine, PassOutcome, RenderSession};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let session = RenderSession::new(DisabledEngine);
/// session.set_content("```mermaid\ngraph TD\nA-->B\n```");
///
/// let outcome = session.render_pending().await;
/// assert_eq!(outcome, PassOutcome::Completed { rendered: 0, failed: 1 });
/// assert!(session.snapshot().html.contains("diagram-error"));
/// # }
/// ```
pub struct RenderSession<E> {
    engine: E,
    pipeline: Pipeline,
    render_timeout: Duration,
    generation: AtomicU64,
    flight: Mutex<Flight>,
    document: Mutex<Document>,
    snapshots: watch::Sender<Snapshot>,
}

impl<E: DiagramEngine> RenderSession<E> {
    /// Create a session with an empty document at generation 0.
    #[must_use]
    pub fn new(engine: E) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            engine,
            pipeline: Pipeline::new(),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            generation: AtomicU64::new(0),
            flight: Mutex::new(Flight::default()),
            document: Mutex::new(Document::empty()),
            snapshots,
        }
    }

    /// Use a custom markdown pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the upper bound for a single diagram render.
    ///
    /// A render exceeding it marks its slot `Failed`.
    #[must_use]
    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// The diagram engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Copy of the committed document.
    pub fn document(&self) -> Document {
        self.document.lock().unwrap().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Replace the content, commit the rendered document and return its
    /// generation.
    ///
    /// Every diagram of the new document starts `Pending`. Results of renders
    /// dispatched for earlier generations are dropped from now on.
    pub fn set_content(&self, text: &str) -> u64 {
        let markup = self.pipeline.render(text);
        let diagrams = markup.diagrams.len();

        let mut document = self.document.lock().unwrap();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *document = Document::new(generation, markup);
        self.snapshots.send_replace(Snapshot::of(&document));

        tracing::debug!(generation, diagrams, "Committed new content");
        generation
    }

    /// Render every `Pending` slot of the committed document, in order.
    ///
    /// Returns [`PassOutcome::Queued`] immediately if a pass is already in
    /// flight; that pass then runs once more before releasing the session.
    /// Otherwise returns the outcome of the last pass run.
    pub async fn render_pending(&self) -> PassOutcome {
        let Some(mut guard) = FlightGuard::begin(&self.flight) else {
            tracing::debug!("Render pass in flight, queued rerun");
            return PassOutcome::Queued;
        };

        loop {
            let outcome = self.run_pass().await;
            if !guard.finish() {
                return outcome;
            }
            tracing::debug!(?outcome, "Re-running render pass");
        }
    }

    /// Commit `text` and render its diagrams on a background task.
    pub fn submit(self: &Arc<Self>, text: &str) -> JoinHandle<PassOutcome> {
        self.set_content(text);
        let session = Arc::clone(self);
        tokio::spawn(async move { session.render_pending().await })
    }

    async fn run_pass(&self) -> PassOutcome {
        let captured = self.generation();
        let mut rendered = 0;
        let mut failed = 0;

        loop {
            let (index, id, source) = {
                let mut document = self.document.lock().unwrap();
                if document.generation() != captured {
                    return PassOutcome::Superseded;
                }
                let Some(index) = document.next_pending() else {
                    break;
                };
                document.mark_rendering(index);
                let slot = document.slot(index);
                (index, slot.id.clone(), slot.source.clone())
            };

            tracing::trace!(id, generation = captured, "Rendering diagram");
            let slot = RenderingSlot::new(&self.document, captured, index);
            let render = self.engine.render(&id, &source);
            let result = tokio::time::timeout(self.render_timeout, render)
                .await
                .unwrap_or(Err(DiagramError::Timeout(self.render_timeout)));
            slot.complete();

            let mut document = self.document.lock().unwrap();
            let current = self.generation();
            if current != captured {
                tracing::debug!(id, captured, current, "Discarding stale diagram render");
                return PassOutcome::Superseded;
            }

            match result {
                Ok(diagram) => {
                    document.apply_rendered(index, &diagram.markup);
                    rendered += 1;
                }
                Err(e) => {
                    tracing::warn!(id, error = %e, "Diagram render failed");
                    document.apply_failed(index, &e);
                    failed += 1;
                }
            }
            self.snapshots.send_replace(Snapshot::of(&document));
        }

        tracing::debug!(generation = captured, rendered, failed, "Render pass complete");
        PassOutcome::Completed { rendered, failed }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::document::SlotState;
    use crate::engine::{DisabledEngine, RenderedDiagram};
    use pretty_assertions::assert_eq;

    /// Engine whose behavior is driven by the diagram source:
    /// `slow` sleeps 100ms, `fail` errors, `hang` never resolves, anything
    /// else sleeps 10ms. Output is `<svg>{source}</svg>`.
    #[derive(Default)]
    struct ScriptedEngine {
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScriptedEngine {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DiagramEngine for ScriptedEngine {
        async fn render(&self, _id: &str, source: &str) -> Result<RenderedDiagram, DiagramError> {
            self.calls.lock().unwrap().push(source.to_owned());
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);

            if source.contains("hang") {
                return std::future::pending().await;
            }
            let delay = if source.contains("slow") { 100 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.active.fetch_sub(1, Ordering::SeqCst);
            if source.contains("fail") {
                return Err(DiagramError::Engine("boom".to_owned()));
            }
            Ok(RenderedDiagram::new(format!("<svg>{source}</svg>")))
        }
    }

    fn diagram(source: &str) -> String {
        format!("```mermaid\n{source}\n```")
    }

    fn scripted() -> Arc<RenderSession<ScriptedEngine>> {
        Arc::new(RenderSession::new(ScriptedEngine::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_content_commits_pending_document() {
        let session = scripted();

        let generation = session.set_content(&format!("# Title\n\n{}", diagram("graph TD")));

        assert_eq!(generation, 1);
        assert_eq!(session.generation(), 1);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.html.starts_with("<h1>Title</h1>\n<div class=\"diagram-placeholder\""));
        let document = session.document();
        assert_eq!(document.slots().len(), 1);
        assert_eq!(document.slots()[0].state, SlotState::Pending);
        assert!(session.engine().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_pending_fills_every_slot_in_order() {
        let session = scripted();
        session.set_content(&format!("{}\n\ntext\n\n{}", diagram("graph A"), diagram("graph B")));

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 2, failed: 0 });
        assert_eq!(session.engine().calls(), vec!["graph A", "graph B"]);
        let html = session.snapshot().html;
        assert_eq!(
            html,
            "<figure class=\"diagram\" id=\"diagram-0\"><svg>graph A</svg></figure>\n\
             <p>text</p>\n\
             <figure class=\"diagram\" id=\"diagram-1\"><svg>graph B</svg></figure>"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_siblings() {
        let session = scripted();
        session.set_content(&format!("{}\n\n{}", diagram("fail <me>"), diagram("graph ok")));

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 1 });
        let html = session.snapshot().html;
        assert!(html.contains(
            "<figure class=\"diagram diagram-error\" id=\"diagram-0\"><pre>fail &lt;me&gt;</pre>"
        ));
        assert!(html.contains("Diagram rendering failed: engine error: boom"));
        assert!(html.contains("<svg>graph ok</svg>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_timeout_marks_slot_failed() {
        let session = Arc::new(
            RenderSession::new(ScriptedEngine::default())
                .with_render_timeout(Duration::from_secs(1)),
        );
        session.set_content(&format!("{}\n\n{}", diagram("hang"), diagram("graph ok")));

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 1 });
        let document = session.document();
        assert_eq!(document.slots()[0].state, SlotState::Failed);
        assert_eq!(document.slots()[1].state, SlotState::Rendered);
        assert!(document.html().contains("render timed out after 1s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_pass_skips_finished_slots() {
        let session = scripted();
        session.set_content(&diagram("graph TD"));

        session.render_pending().await;
        let html = session.snapshot().html;
        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 0, failed: 0 });
        assert_eq!(session.engine().calls().len(), 1);
        assert_eq!(session.snapshot().html, html);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_render_is_discarded() {
        let session = scripted();
        session.set_content(&diagram("slow first"));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.render_pending().await }
        });
        // Let the first pass dispatch its render
        tokio::time::sleep(Duration::from_millis(10)).await;

        let generation = session.set_content(&diagram("graph second"));
        assert_eq!(generation, 2);

        assert_eq!(first.await.unwrap(), PassOutcome::Superseded);
        let html = session.snapshot().html;
        assert!(!html.contains("slow first"));
        assert!(html.contains("diagram-placeholder"));

        let outcome = session.render_pending().await;
        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 0 });
        let html = session.snapshot().html;
        assert!(html.contains("<svg>graph second</svg>"));
        assert!(!html.contains("slow first"));
        assert_eq!(session.engine().calls(), vec!["slow first", "graph second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_during_pass_is_queued_and_rerun() {
        let session = scripted();
        session.set_content(&diagram("slow first"));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.render_pending().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        session.set_content(&diagram("graph second"));
        assert_eq!(session.render_pending().await, PassOutcome::Queued);

        // The in-flight pass is superseded, then reruns for the new content
        assert_eq!(
            first.await.unwrap(),
            PassOutcome::Completed { rendered: 1, failed: 0 }
        );
        let html = session.snapshot().html;
        assert!(html.contains("<svg>graph second</svg>"));
        assert!(!html.contains("slow first"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_pass_leaves_slot_pending() {
        let session = scripted();
        session.set_content(&diagram("slow"));

        let dropped =
            tokio::time::timeout(Duration::from_millis(50), session.render_pending()).await;
        assert!(dropped.is_err());
        assert_eq!(session.document().slots()[0].state, SlotState::Pending);

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 0 });
        let document = session.document();
        assert_eq!(document.slots()[0].state, SlotState::Rendered);
        assert!(document.html().contains("<svg>slow</svg>"));
        assert_eq!(session.engine().calls(), vec!["slow", "slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholder_lookalike_in_text_stays_escaped() {
        let session = scripted();
        let forged = r#"<div class="diagram-placeholder" id="diagram-0" data-source="Z3JhcGggVEQ="></div>"#;
        session.set_content(&format!("{forged}\n\n{}", diagram("graph TD")));

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 0 });
        let html = session.snapshot().html;
        assert_eq!(html.matches(r#"id="diagram-0""#).count(), 1);
        assert!(html.starts_with("<p>&lt;div class=&quot;diagram-placeholder&quot;"));
        assert!(html.ends_with(
            r#"<figure class="diagram" id="diagram-0"><svg>graph TD</svg></figure>"#
        ));
        assert!(!html.contains(r#"<div class="diagram-placeholder""#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_never_overlap() {
        let session = scripted();
        session.set_content(&format!("{}\n\n{}", diagram("slow a"), diagram("slow b")));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.render_pending().await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        assert_eq!(
            outcomes.iter().filter(|o| **o == PassOutcome::Queued).count(),
            2
        );
        assert_eq!(session.engine().max_active.load(Ordering::SeqCst), 1);
        assert_eq!(session.engine().calls(), vec!["slow a", "slow b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_publishes_rendered_snapshot() {
        let session = scripted();
        let mut snapshots = session.subscribe();

        let outcome = session.submit(&diagram("graph TD")).await.unwrap();

        assert_eq!(outcome, PassOutcome::Completed { rendered: 1, failed: 0 });
        assert!(snapshots.has_changed().unwrap());
        let snapshot = snapshots.borrow_and_update().clone();
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.html.contains("<svg>graph TD</svg>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_restart_each_generation() {
        let session = scripted();

        session.set_content(&diagram("graph A"));
        session.set_content(&diagram("graph B"));

        let document = session.document();
        assert_eq!(document.generation(), 2);
        assert_eq!(document.slots()[0].id, "diagram-0");
        assert_eq!(document.slots()[0].source, "graph B");
    }

    #[tokio::test]
    async fn test_keyword_without_body_fails_gracefully() {
        let session = RenderSession::new(DisabledEngine);
        session.set_content("sequenceDiagram\n\nafter");

        let outcome = session.render_pending().await;

        assert_eq!(outcome, PassOutcome::Completed { rendered: 0, failed: 1 });
        let document = session.document();
        assert_eq!(document.slots()[0].source, "sequenceDiagram");
        assert!(document.html().ends_with("<p>after</p>"));
    }

    #[tokio::test]
    async fn test_empty_session_completes() {
        let session = RenderSession::new(DisabledEngine);
        assert_eq!(
            session.render_pending().await,
            PassOutcome::Completed { rendered: 0, failed: 0 }
        );
        assert_eq!(session.snapshot(), Snapshot::default());
    }
}

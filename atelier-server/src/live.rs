//! Realtime advisory scoring for an active drawing session.
//!
//! A [`LiveScoreSession`] consumes the edit-event stream of one drawing
//! surface and surfaces advisory [`ScoreResult`]s without ever blocking
//! editing. Every edit normalizes the scene into a snapshot stamped with a
//! monotonically increasing generation number; requests are coalesced
//! through a debounce window so a burst of edits costs one scoring call,
//! and the final edit of any burst is always scored. Results publish in
//! generation order: a result for an older snapshot arriving after a newer
//! one has been displayed is dropped, never shown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use atelier_core::{
    normalize, score, DrawingScene, DrawingSnapshot, GameResult, Movement, ScoreResult, SceneShape,
    ShapeId,
};

/// Default debounce window for coalescing edit bursts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

/// An edit applied to the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// A shape was added.
    ObjectAdded,
    /// A shape was modified.
    ObjectModified,
    /// A shape was removed.
    ObjectRemoved,
    /// The canvas was cleared.
    Cleared,
}

/// An advisory score for a specific snapshot generation.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryScore {
    /// Generation of the snapshot this score belongs to.
    pub generation: u64,
    /// The advisory score.
    pub result: ScoreResult,
}

/// The seam between the live controller and the scoring backend.
///
/// The default implementation scores in-process; a remote deployment can
/// substitute a network-bound scorer. Calls may overlap; ordering is
/// enforced by the controller, not the scorer.
#[async_trait]
pub trait AdvisoryScorer: Send + Sync {
    /// Score a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when scoring is temporarily unavailable. The
    /// controller keeps the previous advisory and retries on the next edit.
    async fn score(&self, snapshot: DrawingSnapshot) -> GameResult<ScoreResult>;
}

/// In-process scorer over a fixed movement.
pub struct EngineScorer {
    movement: Movement,
}

impl EngineScorer {
    /// Create a scorer for the given movement.
    #[must_use]
    pub fn new(movement: Movement) -> Self {
        Self { movement }
    }
}

#[async_trait]
impl AdvisoryScorer for EngineScorer {
    async fn score(&self, snapshot: DrawingSnapshot) -> GameResult<ScoreResult> {
        Ok(score(&snapshot, &self.movement))
    }
}

/// A scoring request for one snapshot generation.
struct ScoreRequest {
    generation: u64,
    snapshot: DrawingSnapshot,
}

/// Live scoring session for one drawing surface.
///
/// Owns the mutable scene; every mutating call counts as one edit event and
/// schedules an advisory recompute. Dropping the session cancels the worker
/// and any queued requests.
pub struct LiveScoreSession {
    scene: Arc<RwLock<DrawingScene>>,
    generation: AtomicU64,
    /// Results at or below this generation are stale and dropped.
    floor: Arc<AtomicU64>,
    request_tx: mpsc::UnboundedSender<ScoreRequest>,
    display_tx: Arc<watch::Sender<Option<AdvisoryScore>>>,
    display_rx: watch::Receiver<Option<AdvisoryScore>>,
}

impl LiveScoreSession {
    /// Start a session with the default debounce window.
    #[must_use]
    pub fn new(scorer: Arc<dyn AdvisoryScorer>) -> Self {
        Self::with_debounce(scorer, DEFAULT_DEBOUNCE)
    }

    /// Start a session with an explicit debounce window.
    ///
    /// A zero window disables batching: every coalesced request dispatches
    /// immediately. Useful for tests.
    #[must_use]
    pub fn with_debounce(scorer: Arc<dyn AdvisoryScorer>, debounce: Duration) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (display_tx, display_rx) = watch::channel(None);
        let display_tx = Arc::new(display_tx);
        let floor = Arc::new(AtomicU64::new(0));

        tokio::spawn(run_worker(
            request_rx,
            Arc::clone(&display_tx),
            scorer,
            Arc::clone(&floor),
            debounce,
        ));
        crate::metrics::inc_live_sessions();

        Self {
            scene: Arc::new(RwLock::new(DrawingScene::default())),
            generation: AtomicU64::new(0),
            floor,
            request_tx,
            display_tx,
            display_rx,
        }
    }

    /// Add a shape to the scene.
    pub fn add_shape(&self, shape: SceneShape) -> ShapeId {
        let id = {
            let mut scene = self
                .scene
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            scene.add_shape(shape)
        };
        self.note_edit(EditEvent::ObjectAdded);
        id
    }

    /// Modify a shape in place. Returns false if the shape is gone.
    pub fn update_shape<F>(&self, id: ShapeId, f: F) -> bool
    where
        F: FnOnce(&mut SceneShape),
    {
        let updated = {
            let mut scene = self
                .scene
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            scene.get_shape_mut(id).map(f).is_some()
        };
        if updated {
            self.note_edit(EditEvent::ObjectModified);
        }
        updated
    }

    /// Remove a shape. Returns false if the shape is gone.
    pub fn remove_shape(&self, id: ShapeId) -> bool {
        let removed = {
            let mut scene = self
                .scene
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            scene.remove_shape(id).is_ok()
        };
        if removed {
            self.note_edit(EditEvent::ObjectRemoved);
        }
        removed
    }

    /// Clear the canvas.
    pub fn clear(&self) {
        {
            let mut scene = self
                .scene
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            scene.clear();
        }
        self.note_edit(EditEvent::Cleared);
    }

    /// Record an edit event: snapshot the scene and schedule an advisory
    /// recompute for it.
    pub fn note_edit(&self, event: EditEvent) {
        let snapshot = {
            let scene = self
                .scene
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            normalize(&scene)
        };
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(?event, generation, "edit event");
        if self
            .request_tx
            .send(ScoreRequest {
                generation,
                snapshot,
            })
            .is_err()
        {
            tracing::debug!("live scoring worker gone; edit not scored");
        }
    }

    /// Snapshot the current scene without scheduling a recompute.
    #[must_use]
    pub fn snapshot(&self) -> DrawingSnapshot {
        let scene = self
            .scene
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        normalize(&scene)
    }

    /// Subscribe to advisory score updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AdvisoryScore>> {
        self.display_rx.clone()
    }

    /// The advisory score currently displayed, if any.
    #[must_use]
    pub fn current_score(&self) -> Option<AdvisoryScore> {
        self.display_rx.borrow().clone()
    }

    /// Abandon all in-flight and queued scoring for this session.
    ///
    /// Called when the user navigates away from the canvas or resets it:
    /// the display clears, and any result that later arrives for an already
    /// issued snapshot is dropped silently.
    pub fn reset(&self) {
        let current = self.generation.load(Ordering::Acquire);
        self.floor.store(current, Ordering::Release);
        self.display_tx.send_replace(None);
        tracing::debug!(floor = current, "live session reset");
    }
}

impl Drop for LiveScoreSession {
    fn drop(&mut self) {
        crate::metrics::dec_live_sessions();
    }
}

/// Drain the request queue, debounce, and dispatch scoring calls.
///
/// Dispatches run on their own tasks so a slow (e.g. remote) call never
/// delays newer snapshots; the publish guard enforces generation order.
async fn run_worker(
    mut request_rx: mpsc::UnboundedReceiver<ScoreRequest>,
    display_tx: Arc<watch::Sender<Option<AdvisoryScore>>>,
    scorer: Arc<dyn AdvisoryScorer>,
    floor: Arc<AtomicU64>,
    debounce: Duration,
) {
    while let Some(request) = request_rx.recv().await {
        let mut latest = request;
        while let Ok(next) = request_rx.try_recv() {
            latest = next;
        }
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
            while let Ok(next) = request_rx.try_recv() {
                latest = next;
            }
        }
        if latest.generation <= floor.load(Ordering::Acquire) {
            continue;
        }

        let scorer = Arc::clone(&scorer);
        let display_tx = Arc::clone(&display_tx);
        let floor = Arc::clone(&floor);
        tokio::spawn(async move {
            match scorer.score(latest.snapshot).await {
                Ok(result) => publish(&display_tx, &floor, latest.generation, result),
                Err(e) => {
                    // Keep the last advisory; the next edit retries
                    tracing::debug!(generation = latest.generation, "advisory scoring failed: {e}");
                }
            }
        });
    }
}

/// Publish a result unless a newer generation is already displayed or the
/// session has been reset past it.
fn publish(
    display_tx: &watch::Sender<Option<AdvisoryScore>>,
    floor: &AtomicU64,
    generation: u64,
    result: ScoreResult,
) {
    if generation <= floor.load(Ordering::Acquire) {
        tracing::trace!(generation, "dropping result below reset floor");
        return;
    }
    display_tx.send_if_modified(|current| {
        let newer = current
            .as_ref()
            .is_none_or(|displayed| generation > displayed.generation);
        if newer {
            *current = Some(AdvisoryScore { generation, result });
        }
        newer
    });
}

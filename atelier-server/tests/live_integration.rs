//! Integration tests for the live advisory-score session.
//!
//! Exercises the debounced edit stream end to end: burst coalescing,
//! generation-ordered delivery to subscribers, and agreement between the
//! advisory path and the authoritative save-time rescore.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::{MovementCatalog, SceneShape, ShapeForm};
use atelier_server::{AdvisoryScore, EngineScorer, GameStore, LiveScoreSession};
use tokio::sync::watch;

fn rect(color: &str) -> SceneShape {
    SceneShape::new(ShapeForm::Rect {
        width: 60.0,
        height: 40.0,
    })
    .at(300.0, 250.0)
    .with_fill(color)
}

fn minimalism_session(debounce: Duration) -> LiveScoreSession {
    let movement = MovementCatalog::builtin()
        .get("minimalism")
        .expect("exists")
        .clone();
    LiveScoreSession::with_debounce(Arc::new(EngineScorer::new(movement)), debounce)
}

async fn wait_for_generation(
    rx: &mut watch::Receiver<Option<AdvisoryScore>>,
    generation: u64,
) -> AdvisoryScore {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(advisory) = rx.borrow_and_update().clone() {
                if advisory.generation >= generation {
                    return advisory;
                }
            }
            rx.changed().await.expect("watch channel open");
        }
    })
    .await
    .expect("advisory score should arrive")
}

/// A realistic burst through a real debounce window: many edits, few
/// scoring calls, and the final state always scored.
#[tokio::test]
async fn test_burst_with_debounce_scores_final_state() {
    let session = minimalism_session(Duration::from_millis(30));
    let mut rx = session.subscribe();

    for i in 0..10 {
        session.add_shape(rect(if i % 2 == 0 { "#FFFFFF" } else { "#000000" }));
    }

    let advisory = wait_for_generation(&mut rx, 10).await;
    assert_eq!(advisory.generation, 10);
    // 10 shapes against a 5-element budget: partial credit, not zero
    let elements = advisory.result.breakdown["elements"];
    assert!(elements > 0.0 && elements < 30.0);
}

/// Subscribers only ever see generations moving forward.
#[tokio::test]
async fn test_subscriber_sees_monotonic_generations() {
    let session = minimalism_session(Duration::from_millis(10));
    let mut rx = session.subscribe();

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            if let Some(advisory) = rx.borrow_and_update().clone() {
                let done = advisory.generation >= 12;
                seen.push(advisory.generation);
                if done {
                    break;
                }
            }
        }
        seen
    });

    for _ in 0..12 {
        session.add_shape(rect("#FFFFFF"));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let seen = tokio::time::timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector finishes")
        .expect("collector task");
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert!(pair[0] < pair[1], "generations went backwards: {seen:?}");
    }
}

/// The advisory score is a preview of exactly what the authoritative save
/// will compute for the same scene.
#[tokio::test]
async fn test_advisory_matches_authoritative_rescore() {
    let session = minimalism_session(Duration::ZERO);
    let mut rx = session.subscribe();

    session.add_shape(rect("#FFFFFF"));
    session.add_shape(rect("#000000"));
    let advisory = wait_for_generation(&mut rx, 2).await;

    // Rebuild the same scene for the save path
    let store = GameStore::new(MovementCatalog::builtin());
    store.ensure_user("user-1", "Ada").expect("ensure");
    let mut scene = atelier_core::DrawingScene::default();
    scene.add_shape(rect("#FFFFFF"));
    scene.add_shape(rect("#000000"));

    let (artwork, _) = store
        .save_artwork("user-1", "minimalism", &scene, "Twins")
        .expect("save");

    assert_eq!(artwork.score, advisory.result);
}

/// Resetting the session mid-burst leaves nothing displayed even after the
/// queued work drains.
#[tokio::test]
async fn test_reset_mid_burst_clears_display() {
    let session = minimalism_session(Duration::from_millis(20));

    for _ in 0..6 {
        session.add_shape(rect("#FFFFFF"));
    }
    session.reset();

    // Give queued/debounced work time to drain
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.current_score().is_none());
}

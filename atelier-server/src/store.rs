//! The game store: transactional artwork saves and read projections.
//!
//! [`GameStore`] is the persistence coordinator. A save is a single atomic
//! unit: authoritative rescoring, artwork construction, the progression
//! ledger transition, and the durable commit all happen under one write
//! lock, so concurrent saves for the same user serialize and a failed
//! commit leaves no partial state visible to readers.
//!
//! Durability is optional: with a data directory configured, every save is
//! written as one transaction document (artwork + post-save progression)
//! via temp-file-and-rename before the in-memory state is touched, and
//! transaction files are replayed in save order at startup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{
    normalize, score, AwardSummary, DrawingScene, DrawingSnapshot, GameError, LifetimeStats,
    Movement, MovementCatalog, ProgressionLedger, ScoreResult, UserProgression,
};

use crate::validation::{validate_object_count, validate_title, validate_user_id, ValidationError};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A game-rule violation (unknown movement, locked movement, empty
    /// drawing, unknown user).
    #[error(transparent)]
    Game(#[from] GameError),
    /// Untrusted input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The requested artwork does not exist.
    #[error("Artwork not found: {0}")]
    ArtworkNotFound(String),
    /// An I/O error occurred during the durable commit.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A saved artwork with its authoritative score.
///
/// The snapshot and score are immutable once created; only the `likes` and
/// `views` counters change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    /// Unique identifier.
    pub artwork_id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Movement the artwork was scored against.
    pub movement_id: String,
    /// Player-chosen title.
    pub title: String,
    /// The drawing at save time.
    pub snapshot: DrawingSnapshot,
    /// The authoritative score.
    pub score: ScoreResult,
    /// Creation timestamp (ms since epoch).
    pub created_at: u64,
    /// Like count.
    pub likes: u64,
    /// View count.
    pub views: u64,
}

/// Leaderboard scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardScope {
    /// All artworks.
    Global,
    /// Artworks of a single movement.
    Movement(String),
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Rank, starting at 1.
    pub rank: usize,
    /// User id.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Current level.
    pub level: u32,
    /// Sum of authoritative scores in scope.
    pub total_score: f64,
    /// Number of artworks in scope.
    pub artworks_count: u64,
}

/// A user's progression together with the stats behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name.
    pub username: String,
    /// Progression state.
    pub progression: UserProgression,
    /// Lifetime statistics.
    pub stats: LifetimeStats,
}

/// Per-user record held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    progression: UserProgression,
    stats: LifetimeStats,
    /// Timestamp of the first save, used for leaderboard tie-breaking.
    first_save_at: Option<u64>,
}

/// All committed state.
#[derive(Debug, Default)]
struct GameState {
    users: HashMap<String, UserRecord>,
    artworks: Vec<Artwork>,
}

/// One durable save transaction: the artwork and the post-save progression
/// committed as a single document.
#[derive(Debug, Serialize, Deserialize)]
struct SaveTransaction {
    artwork: Artwork,
    user_id: String,
    username: String,
    progression: UserProgression,
    stats: LifetimeStats,
}

/// Thread-safe game store shared across HTTP handlers and live sessions.
#[derive(Clone)]
pub struct GameStore {
    state: Arc<RwLock<GameState>>,
    catalog: Arc<MovementCatalog>,
    ledger: Arc<ProgressionLedger>,
    /// Optional data directory for transaction persistence.
    data_dir: Option<PathBuf>,
}

impl GameStore {
    /// Create an in-memory store over a movement catalog (no persistence).
    #[must_use]
    pub fn new(catalog: MovementCatalog) -> Self {
        let ledger = ProgressionLedger::with_builtin(catalog.len());
        Self {
            state: Arc::new(RwLock::new(GameState::default())),
            catalog: Arc::new(catalog),
            ledger: Arc::new(ledger),
            data_dir: None,
        }
    }

    /// Create a store with transaction persistence.
    ///
    /// The directory is created if it doesn't exist, and any transaction
    /// files already present are replayed in save order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or
    /// read, or [`StoreError::Serialization`] if a transaction file is
    /// corrupt.
    pub fn with_data_dir(
        catalog: MovementCatalog,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let mut store = Self::new(catalog);
        store.data_dir = Some(data_dir);
        store.replay_transactions()?;
        Ok(store)
    }

    /// The movement catalog this store serves.
    #[must_use]
    pub fn catalog(&self) -> &MovementCatalog {
        &self.catalog
    }

    /// Create the user if absent; update the username if it changed.
    ///
    /// New users start at level 1 with the default coin grant.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed user id.
    pub fn ensure_user(&self, user_id: &str, username: &str) -> Result<UserProfile, StoreError> {
        validate_user_id(user_id)?;
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = state
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord {
                username: username.to_string(),
                progression: UserProgression::new(),
                stats: LifetimeStats::default(),
                first_save_at: None,
            });
        record.username = username.to_string();
        Ok(UserProfile {
            username: record.username.clone(),
            progression: record.progression.clone(),
            stats: record.stats.clone(),
        })
    }

    /// Read a user's progression and stats.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownUser`] if the user does not exist.
    pub fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = state
            .users
            .get(user_id)
            .ok_or_else(|| GameError::UnknownUser(user_id.to_string()))?;
        Ok(UserProfile {
            username: record.username.clone(),
            progression: record.progression.clone(),
            stats: record.stats.clone(),
        })
    }

    /// Compute a non-authoritative advisory score.
    ///
    /// When a user id is given, the movement's unlock level is enforced
    /// before any scoring happens.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownMovement`] for an unknown movement and
    /// [`GameError::MovementLocked`] when the user's level is too low.
    pub fn advisory_score(
        &self,
        user_id: Option<&str>,
        movement_id: &str,
        snapshot: &DrawingSnapshot,
    ) -> Result<ScoreResult, StoreError> {
        let movement = self.authorize_movement(user_id, movement_id)?;
        Ok(score(snapshot, &movement))
    }

    /// Save an artwork and apply its progression side-effects atomically.
    ///
    /// The drawing is re-normalized and re-scored here; any advisory score
    /// the client saw is ignored. The whole read-modify-write runs under
    /// the store's write lock, and the durable commit happens before the
    /// in-memory state changes, so a failed save has no effect.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a bad title, an empty drawing, or an
    /// oversized drawing; [`GameError::MovementLocked`] before any scoring
    /// when the movement is not unlocked; [`GameError::UnknownUser`] for an
    /// unregistered user; and [`StoreError::Io`] if the durable commit
    /// fails.
    pub fn save_artwork(
        &self,
        user_id: &str,
        movement_id: &str,
        scene: &DrawingScene,
        title: &str,
    ) -> Result<(Artwork, AwardSummary), StoreError> {
        validate_title(title)?;
        let movement = self.catalog.get(movement_id)?.clone();

        let snapshot = normalize(scene);
        if snapshot.is_empty() {
            return Err(GameError::EmptyDrawing.into());
        }
        validate_object_count(snapshot.object_count())?;

        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = state
            .users
            .get(user_id)
            .ok_or_else(|| GameError::UnknownUser(user_id.to_string()))?;

        if !record.progression.can_use(&movement) {
            return Err(GameError::MovementLocked {
                required: movement.unlock_level,
                level: record.progression.level,
            }
            .into());
        }

        // Authoritative rescore; the advisory path is never trusted
        let authoritative = score(&snapshot, &movement);
        let (progression, stats, award) = self.ledger.apply(
            &record.progression,
            &record.stats,
            &authoritative,
            &movement,
        );

        let artwork = Artwork {
            artwork_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            movement_id: movement_id.to_string(),
            title: title.to_string(),
            snapshot,
            score: authoritative,
            created_at: current_timestamp_ms(),
            likes: 0,
            views: 0,
        };

        // Durable commit first: if this fails, nothing below runs and no
        // partial state becomes visible
        self.persist_transaction(&SaveTransaction {
            artwork: artwork.clone(),
            user_id: user_id.to_string(),
            username: record.username.clone(),
            progression: progression.clone(),
            stats: stats.clone(),
        })?;

        let record = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| GameError::UnknownUser(user_id.to_string()))?;
        record.progression = progression;
        record.stats = stats;
        record.first_save_at = Some(
            record
                .first_save_at
                .map_or(artwork.created_at, |t| t.min(artwork.created_at)),
        );
        state.artworks.push(artwork.clone());

        tracing::info!(
            user = user_id,
            movement = movement_id,
            score = artwork.score.total_score,
            xp = award.experience_gained,
            "artwork saved"
        );

        Ok((artwork, award))
    }

    /// List committed artworks, newest first, optionally for one user.
    #[must_use]
    pub fn list_gallery(&self, user_id: Option<&str>) -> Vec<Artwork> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut artworks: Vec<Artwork> = state
            .artworks
            .iter()
            .filter(|a| user_id.is_none_or(|u| a.user_id == u))
            .cloned()
            .collect();
        artworks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        artworks
    }

    /// Get an artwork by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArtworkNotFound`] if the artwork does not
    /// exist.
    pub fn get_artwork(&self, artwork_id: Uuid) -> Result<Artwork, StoreError> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state
            .artworks
            .iter()
            .find(|a| a.artwork_id == artwork_id)
            .cloned()
            .ok_or_else(|| StoreError::ArtworkNotFound(artwork_id.to_string()))
    }

    /// Add a like to an artwork. Returns the new like count.
    ///
    /// The owner's lifetime like counter updates immediately; achievements
    /// over it are evaluated on the owner's next save.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArtworkNotFound`] if the artwork does not
    /// exist.
    pub fn like_artwork(&self, artwork_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let artwork = state
            .artworks
            .iter_mut()
            .find(|a| a.artwork_id == artwork_id)
            .ok_or_else(|| StoreError::ArtworkNotFound(artwork_id.to_string()))?;
        artwork.likes += 1;
        let likes = artwork.likes;
        let (owner, created_at) = (artwork.user_id.clone(), artwork.created_at);

        if let Some(record) = state.users.get_mut(&owner) {
            record.stats.likes_received += 1;
        }
        drop(state);

        self.persist_counters(created_at, artwork_id);
        Ok(likes)
    }

    /// Record a view on an artwork. Returns the new view count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ArtworkNotFound`] if the artwork does not
    /// exist.
    pub fn record_view(&self, artwork_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let artwork = state
            .artworks
            .iter_mut()
            .find(|a| a.artwork_id == artwork_id)
            .ok_or_else(|| StoreError::ArtworkNotFound(artwork_id.to_string()))?;
        artwork.views += 1;
        let (views, created_at) = (artwork.views, artwork.created_at);
        drop(state);

        self.persist_counters(created_at, artwork_id);
        Ok(views)
    }

    /// Rank users by total authoritative score in scope.
    ///
    /// Stable total order: score descending, ties broken by earliest first
    /// save in scope, then by user id.
    #[must_use]
    pub fn leaderboard(&self, scope: &LeaderboardScope) -> Vec<LeaderboardEntry> {
        let state = self
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        struct Aggregate {
            total_score: f64,
            artworks_count: u64,
            earliest: u64,
        }

        let mut per_user: HashMap<&str, Aggregate> = HashMap::new();
        for artwork in &state.artworks {
            if let LeaderboardScope::Movement(id) = scope {
                if artwork.movement_id != *id {
                    continue;
                }
            }
            let entry = per_user
                .entry(artwork.user_id.as_str())
                .or_insert(Aggregate {
                    total_score: 0.0,
                    artworks_count: 0,
                    earliest: artwork.created_at,
                });
            entry.total_score += artwork.score.total_score;
            entry.artworks_count += 1;
            entry.earliest = entry.earliest.min(artwork.created_at);
        }

        let mut rows: Vec<(String, Aggregate)> = per_user
            .into_iter()
            .map(|(user_id, agg)| (user_id.to_string(), agg))
            .collect();
        rows.sort_by(|a, b| {
            b.1.total_score
                .partial_cmp(&a.1.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.earliest.cmp(&b.1.earliest))
                .then_with(|| a.0.cmp(&b.0))
        });

        rows.into_iter()
            .enumerate()
            .map(|(i, (user_id, agg))| {
                let record = state.users.get(&user_id);
                LeaderboardEntry {
                    rank: i + 1,
                    username: record.map_or_else(|| user_id.clone(), |r| r.username.clone()),
                    level: record.map_or(1, |r| r.progression.level),
                    user_id,
                    total_score: agg.total_score,
                    artworks_count: agg.artworks_count,
                }
            })
            .collect()
    }

    fn authorize_movement(
        &self,
        user_id: Option<&str>,
        movement_id: &str,
    ) -> Result<Movement, StoreError> {
        let movement = self.catalog.get(movement_id)?.clone();
        if let Some(user_id) = user_id {
            let state = self
                .state
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(record) = state.users.get(user_id) {
                if !record.progression.can_use(&movement) {
                    return Err(GameError::MovementLocked {
                        required: movement.unlock_level,
                        level: record.progression.level,
                    }
                    .into());
                }
            }
        }
        Ok(movement)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn transaction_path(&self, created_at: u64, artwork_id: Uuid) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("txn-{created_at:013}-{artwork_id}.json")))
    }

    /// Write a save transaction durably via temp-file-and-rename.
    ///
    /// No-op without a data directory.
    fn persist_transaction(&self, txn: &SaveTransaction) -> Result<(), StoreError> {
        let Some(path) = self.transaction_path(txn.artwork.created_at, txn.artwork.artwork_id)
        else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(txn)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Best-effort rewrite of an artwork's counters in its transaction
    /// file. Counter updates are not part of the save atomicity contract.
    fn persist_counters(&self, created_at: u64, artwork_id: Uuid) {
        let Some(path) = self.transaction_path(created_at, artwork_id) else {
            return;
        };
        let Ok(artwork) = self.get_artwork(artwork_id) else {
            return;
        };
        let result = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                serde_json::from_str::<SaveTransaction>(&contents).map_err(|e| e.to_string())
            })
            .and_then(|mut txn| {
                txn.artwork.likes = artwork.likes;
                txn.artwork.views = artwork.views;
                serde_json::to_string_pretty(&txn).map_err(|e| e.to_string())
            })
            .and_then(|json| {
                let tmp = path.with_extension("json.tmp");
                std::fs::write(&tmp, json)
                    .and_then(|()| std::fs::rename(&tmp, &path))
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!("Failed to persist counters for {artwork_id}: {e}");
        }
    }

    /// Replay persisted transactions into memory, oldest first.
    fn replay_transactions(&self) -> Result<(), StoreError> {
        let Some(ref data_dir) = self.data_dir else {
            return Ok(());
        };
        let mut paths: Vec<PathBuf> = std::fs::read_dir(data_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "json")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("txn-"))
            })
            .collect();
        paths.sort();

        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for path in paths {
            let contents = std::fs::read_to_string(&path)?;
            let txn: SaveTransaction = serde_json::from_str(&contents)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
            let created_at = txn.artwork.created_at;
            let record = state
                .users
                .entry(txn.user_id.clone())
                .or_insert_with(|| UserRecord {
                    username: txn.username.clone(),
                    progression: UserProgression::new(),
                    stats: LifetimeStats::default(),
                    first_save_at: None,
                });
            record.username = txn.username;
            record.progression = txn.progression;
            record.stats = txn.stats;
            record.first_save_at =
                Some(record.first_save_at.map_or(created_at, |t| t.min(created_at)));
            state.artworks.push(txn.artwork);
        }
        state.artworks.sort_by_key(|a| a.created_at);
        tracing::info!(artworks = state.artworks.len(), "replayed transactions");
        Ok(())
    }
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

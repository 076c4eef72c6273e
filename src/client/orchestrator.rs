//! Single-flight search pipeline.
//!
//! One trigger runs resolve id -> price/score -> streams, strictly in order.
//! The pipeline is busy exactly while the state is one of the `Fetching*`
//! variants; entering `FetchingId` is a check-and-set on the state cell, so
//! a second trigger while busy is refused instead of interleaving with the
//! first. Every run ends in `Done`, `Error`, or `AwaitingManualCorrection`,
//! each of which releases the lock.

use super::gateway::Gateway;
use super::view::{self, ReviewEntry};
use crate::config::ClientConfig;
use crate::error::StitchError;
use crate::titles::{TitleBook, TitleCorrection};
use crate::upstream::types::{PriceScore, StreamPreview};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingId,
    FetchingPriceScore,
    FetchingStreams,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::FetchingId => "finding game",
            Stage::FetchingPriceScore => "fetching price and score",
            Stage::FetchingStreams => "fetching streams",
        }
    }
}

/// Everything a finished run shows.
#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub title: String,
    pub app_id: String,
    pub price_score: PriceScore,
    pub streams: Vec<StreamPreview>,
}

impl GameReport {
    pub fn cost(&self) -> String {
        view::format_price(self.price_score.price_cents)
    }

    pub fn metacritic(&self) -> String {
        view::format_metacritic(self.price_score.metacritic_score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    FetchingId { title: String },
    FetchingPriceScore { title: String, app_id: String },
    FetchingStreams { title: String, app_id: String },
    /// The search found nothing; waiting for the user to type a better
    /// title. `original_title` is the key the correction is recorded under,
    /// `searched_title` what was actually looked up (a saved correction
    /// may already have replaced the key).
    AwaitingManualCorrection {
        original_title: String,
        searched_title: String,
    },
    Done(GameReport),
    Error { stage: Stage, message: String },
}

impl PipelineState {
    pub fn is_busy(&self) -> bool {
        self.stage().is_some()
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::FetchingId { .. } => Some(Stage::FetchingId),
            PipelineState::FetchingPriceScore { .. } => Some(Stage::FetchingPriceScore),
            PipelineState::FetchingStreams { .. } => Some(Stage::FetchingStreams),
            _ => None,
        }
    }
}

/// A trigger the orchestrator refused. Nothing ran.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("a search is already running")]
    Busy,
    #[error("no title correction is pending")]
    NoCorrectionPending,
    #[error("no review at position {0}")]
    NoSuchReview(usize),
}

pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    max_rss_items: usize,
    max_stream_preview: usize,
    titles: Mutex<TitleBook>,
    corrections_loaded: AtomicBool,
    reviews: Mutex<Vec<ReviewEntry>>,
    state: watch::Sender<PipelineState>,
}

impl Orchestrator {
    /// Load corrections once, then stand ready in `Idle`.
    pub async fn start(gateway: Arc<dyn Gateway>, config: &ClientConfig) -> Result<Self, StitchError> {
        let orchestrator = Self::new(gateway, config);
        orchestrator.ensure_corrections().await?;
        Ok(orchestrator)
    }

    /// An orchestrator whose corrections are not loaded yet. Call
    /// `ensure_corrections` before the first `wake`.
    pub fn new(gateway: Arc<dyn Gateway>, config: &ClientConfig) -> Self {
        Self::build(gateway, config, TitleBook::new(), false)
    }

    pub fn with_corrections(
        gateway: Arc<dyn Gateway>,
        config: &ClientConfig,
        corrections: Vec<TitleCorrection>,
    ) -> Self {
        Self::build(gateway, config, TitleBook::from_entries(corrections), true)
    }

    fn build(gateway: Arc<dyn Gateway>, config: &ClientConfig, book: TitleBook, loaded: bool) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            gateway,
            max_rss_items: config.max_rss_items,
            max_stream_preview: config.max_stream_preview,
            titles: Mutex::new(book),
            corrections_loaded: AtomicBool::new(loaded),
            reviews: Mutex::new(Vec::new()),
            state,
        }
    }

    /// Fetch the saved corrections unless a previous call already did.
    /// A failure leaves the book as it was; the next call retries.
    pub async fn ensure_corrections(&self) -> Result<(), StitchError> {
        if self.corrections_loaded.load(Ordering::Acquire) {
            return Ok(());
        }
        let corrections = self.gateway.load_corrections().await?;
        tracing::info!(count = corrections.len(), "title corrections loaded");
        {
            let mut book = lock(&self.titles);
            let local = std::mem::take(&mut *book);
            *book = TitleBook::from_entries(corrections);
            for entry in local.entries() {
                book.insert(entry.clone());
            }
            view::apply_corrections(&mut lock(&self.reviews), &book);
        }
        self.corrections_loaded.store(true, Ordering::Release);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn reviews(&self) -> Vec<ReviewEntry> {
        lock(&self.reviews).clone()
    }

    pub fn corrections(&self) -> Vec<TitleCorrection> {
        lock(&self.titles).entries().to_vec()
    }

    /// Fetch the feed and build the visible review list.
    pub async fn wake(&self) -> Result<Vec<ReviewEntry>, StitchError> {
        let items = self.gateway.fetch_reviews().await?;
        let entries = {
            let book = lock(&self.titles);
            view::build_entries(&items, self.max_rss_items, &book)
        };
        tracing::info!(fetched = items.len(), shown = entries.len(), "reviews loaded");
        *lock(&self.reviews) = entries.clone();
        Ok(entries)
    }

    /// Run the pipeline for the review at `index` in the visible list.
    pub async fn select_review(&self, index: usize) -> Result<PipelineState, Rejected> {
        let entry = lock(&self.reviews)
            .get(index)
            .cloned()
            .ok_or(Rejected::NoSuchReview(index))?;
        self.search_as(&entry.feed_title, &entry.title).await
    }

    /// Run the pipeline for a free-form title.
    pub async fn search(&self, title: &str) -> Result<PipelineState, Rejected> {
        self.search_as(title, title).await
    }

    async fn search_as(&self, key: &str, title: &str) -> Result<PipelineState, Rejected> {
        self.begin(title, |state| !state.is_busy())
            .map_err(|_| Rejected::Busy)?;
        Ok(self.run(key, title, false).await)
    }

    /// Retry a failed lookup with a user-supplied title. On success the
    /// correction is recorded before the price lookup starts.
    pub async fn submit_correction(&self, corrected: &str) -> Result<PipelineState, Rejected> {
        let corrected = corrected.trim();
        let mut key = None;
        self.begin(corrected, |state| match state {
            PipelineState::AwaitingManualCorrection { original_title, .. } => {
                key = Some(original_title.clone());
                true
            }
            _ => false,
        })
        .map_err(|state| {
            if state.is_busy() {
                Rejected::Busy
            } else {
                Rejected::NoCorrectionPending
            }
        })?;
        let key = key.ok_or(Rejected::NoCorrectionPending)?;
        Ok(self.run(&key, corrected, true).await)
    }

    /// Abandon a pending correction.
    pub fn cancel_correction(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, PipelineState::AwaitingManualCorrection { .. }) {
                *state = PipelineState::Idle;
                true
            } else {
                false
            }
        })
    }

    /// Guarded transition into `FetchingId`. On refusal the current state is
    /// returned and nothing changes.
    fn begin<F>(&self, title: &str, admit: F) -> Result<(), PipelineState>
    where
        F: FnOnce(&PipelineState) -> bool,
    {
        let mut refused = None;
        self.state.send_if_modified(|state| {
            if admit(state) {
                *state = PipelineState::FetchingId {
                    title: title.to_string(),
                };
                true
            } else {
                refused = Some(state.clone());
                false
            }
        });
        match refused {
            None => Ok(()),
            Some(state) => {
                tracing::debug!(title, "trigger refused while {:?}", state);
                Err(state)
            }
        }
    }

    async fn run(&self, key: &str, title: &str, correcting: bool) -> PipelineState {
        let terminal = match self.stages(key, title, correcting).await {
            Ok(Some(report)) => {
                tracing::info!(title, app_id = %report.app_id, streams = report.streams.len(), "search done");
                PipelineState::Done(report)
            }
            Ok(None) => {
                tracing::info!(title, "no match, awaiting manual correction");
                PipelineState::AwaitingManualCorrection {
                    original_title: key.to_string(),
                    searched_title: title.to_string(),
                }
            }
            Err((stage, e)) => {
                tracing::warn!(title, stage = stage.label(), error = %e, "search failed");
                PipelineState::Error {
                    stage,
                    message: e.to_string(),
                }
            }
        };
        self.state.send_replace(terminal.clone());
        terminal
    }

    async fn stages(
        &self,
        key: &str,
        title: &str,
        correcting: bool,
    ) -> Result<Option<GameReport>, (Stage, StitchError)> {
        let ids = self
            .gateway
            .resolve_game_id(title)
            .await
            .map_err(|e| (Stage::FetchingId, e))?;
        let Some(app_id) = ids.into_iter().next() else {
            return Ok(None);
        };

        if correcting && key != title {
            self.apply_correction(key, title).await;
        }

        self.state.send_replace(PipelineState::FetchingPriceScore {
            title: title.to_string(),
            app_id: app_id.clone(),
        });
        let price_score = self
            .gateway
            .fetch_price_score(&app_id)
            .await
            .map_err(|e| (Stage::FetchingPriceScore, e))?;

        self.state.send_replace(PipelineState::FetchingStreams {
            title: title.to_string(),
            app_id: app_id.clone(),
        });
        let mut streams = self
            .gateway
            .fetch_streams(title)
            .await
            .map_err(|e| (Stage::FetchingStreams, e))?;
        streams.truncate(self.max_stream_preview);

        Ok(Some(GameReport {
            title: title.to_string(),
            app_id,
            price_score,
            streams,
        }))
    }

    /// Persist upstream (result ignored), then update the in-memory book and
    /// the visible titles.
    async fn apply_correction(&self, old: &str, new: &str) {
        if let Err(e) = self.gateway.record_correction(old, new).await {
            tracing::warn!(old, new, error = %e, "correction not persisted");
        }
        let mut book = lock(&self.titles);
        book.insert(TitleCorrection::new(old, new));
        view::apply_corrections(&mut lock(&self.reviews), &book);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

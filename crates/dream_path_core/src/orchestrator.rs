//! crates/dream_path_core/src/orchestrator.rs
//!
//! The generation orchestrator: validates a submission, records history, builds the
//! prompt, calls the provider, decodes and illustrates the artifact, and owns the
//! resulting loading/success/error state.
//!
//! Every dispatched request gets a sequence number. A response is only applied if
//! its number is still the latest one dispatched, so a slow superseded request can
//! never overwrite the outcome of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decode::{decode_artifact, DecodePolicy};
use crate::domain::{GenerationRequest, GenerationResult, HistoryItem, User};
use crate::error::GenerationError;
use crate::history::FileHistory;
use crate::imagery::{augment, AugmentStrategy};
use crate::ports::{CompletionService, HistoryStore, ImageLookupService};
use crate::prompt::build_prompt;

//=========================================================================================
// State
//=========================================================================================

/// The observable state of the orchestrator. At most one result or one error is live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GenerationState {
    #[default]
    Idle,
    Submitting { sequence: u64 },
    Success { sequence: u64, result: GenerationResult },
    Failed { sequence: u64, error: GenerationError },
}

impl GenerationState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            Self::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Tunables chosen at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorSettings {
    pub decode_policy: DecodePolicy,
    pub augment_strategy: AugmentStrategy,
}

//=========================================================================================
// Orchestrator
//=========================================================================================

pub struct Orchestrator {
    completion: Arc<dyn CompletionService>,
    images: Arc<dyn ImageLookupService>,
    history: Option<Arc<dyn HistoryStore>>,
    settings: OrchestratorSettings,
    state: Mutex<GenerationState>,
    latest_sequence: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        images: Arc<dyn ImageLookupService>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            completion,
            images,
            history: None,
            settings,
            state: Mutex::new(GenerationState::Idle),
            latest_sequence: AtomicU64::new(0),
        }
    }

    /// Enables per-user history recording for file-derived submissions.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// A snapshot of the current state.
    pub async fn state(&self) -> GenerationState {
        self.state.lock().await.clone()
    }

    /// Runs one submission to completion.
    ///
    /// Blank content is rejected synchronously without touching the state. Otherwise the
    /// state moves to `Submitting`, and then to `Success` or `Failed` unless a newer
    /// submission was dispatched in the meantime, in which case the outcome is
    /// discarded and `GenerationError::Superseded` is returned to this caller.
    pub async fn submit(
        &self,
        request: GenerationRequest,
        user: Option<&User>,
    ) -> Result<GenerationResult, GenerationError> {
        if request.content.trim().is_empty() {
            return Err(GenerationError::empty_content());
        }

        // Allocated under the state lock so the Submitting writes land in sequence order.
        let sequence = {
            let mut state = self.state.lock().await;
            let sequence = self.latest_sequence.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GenerationState::Submitting { sequence };
            sequence
        };
        info!(sequence, mode = %request.mode, profile = %request.profile, "Submitting generation request");

        if let (Some(user), Some(file_name)) = (user, request.file_name.as_deref()) {
            self.record_history(
                user.id,
                HistoryItem {
                    file_name: file_name.to_string(),
                    content: request.content.clone(),
                },
            )
            .await;
        }

        let outcome = self.generate(&request).await;

        let mut state = self.state.lock().await;
        if self.latest_sequence.load(Ordering::SeqCst) != sequence {
            debug!(sequence, "Discarding superseded generation outcome");
            return Err(GenerationError::Superseded { sequence });
        }
        *state = match &outcome {
            Ok(result) => GenerationState::Success {
                sequence,
                result: result.clone(),
            },
            Err(error) => {
                warn!(sequence, "Generation failed: {}", error);
                GenerationState::Failed {
                    sequence,
                    error: error.clone(),
                }
            }
        };
        outcome
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let prompt = build_prompt(
            request.mode,
            request.profile,
            &request.content,
            request.question.as_deref(),
        );
        let raw = self.completion.complete(&prompt).await?;
        debug!(mode = %request.mode, bytes = raw.len(), "Received provider response");

        let strategy = self.settings.augment_strategy;
        Ok(
            match decode_artifact(request.mode, &raw, self.settings.decode_policy)? {
                GenerationResult::Flashcards(cards) => {
                    GenerationResult::Flashcards(augment(&self.images, cards, strategy).await)
                }
                GenerationResult::Game(pairs) => {
                    GenerationResult::Game(augment(&self.images, pairs, strategy).await)
                }
                other => other,
            },
        )
    }

    /// History is a best-effort cache: failures are logged and never abort a submission.
    async fn record_history(&self, user_id: Uuid, item: HistoryItem) {
        let Some(store) = &self.history else {
            return;
        };
        let mut history = match store.load_history(user_id).await {
            Ok(items) => FileHistory::from_items(items),
            Err(e) => {
                warn!(%user_id, "Could not load file history, starting fresh: {}", e);
                FileHistory::default()
            }
        };
        history.push(item);
        if let Err(e) = store.save_history(user_id, history.items()).await {
            warn!(%user_id, "Could not save file history: {}", e);
        }
    }

    /// The user's file history, newest first. Empty when history is disabled or unreadable.
    pub async fn history_for(&self, user: &User) -> Vec<HistoryItem> {
        let Some(store) = &self.history else {
            return Vec::new();
        };
        match store.load_history(user.id).await {
            Ok(items) => FileHistory::from_items(items).into_items(),
            Err(e) => {
                warn!(user_id = %user.id, "Could not load file history: {}", e);
                Vec::new()
            }
        }
    }
}

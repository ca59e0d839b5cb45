/*!
 * Core rewriting service.
 *
 * `TranslationService` owns the provider and the per-run request settings.
 * Each batch goes through a small state machine:
 *
 * `Pending -> Sent -> Reconciled`, or on a bad response
 * `Sent -> RetryPending -> Sent -> Reconciled | Skipped`.
 * The terminal states are not stored; they are the `BatchOutcome`.
 *
 * Exactly one retry is made, and only when the response could not be
 * reconciled. A failed provider call skips the batch straight away.
 */

use log::debug;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::{ProviderError, ReconciliationError};
use crate::providers::{create_provider, CompletionRequest, Provider};
use crate::subtitle_processor::SubtitleEntry;

use super::batch::FlattenedBatch;
use super::reconcile::reconcile;

/// Attempts made before a batch with an unusable response is skipped
const MAX_ATTEMPTS: usize = 2;

/// Non-terminal lifecycle states of one batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchState {
    Pending,
    Sent { attempt: usize, response: String },
    RetryPending,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Sent { attempt, .. } => write!(f, "sent (attempt {})", attempt),
            Self::RetryPending => write!(f, "retry pending"),
        }
    }
}

/// Final result of processing one batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Rewritten copies of the batch entries, same length and order
    Rewritten(Vec<SubtitleEntry>),
    /// The provider call produced no response
    ServiceFailed { reason: String },
    /// Two responses in a row could not be reconciled
    ReconciliationFailed {
        raw_response: String,
        error: ReconciliationError,
    },
}

impl BatchOutcome {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

/// Sends batches to the provider and maps the answers back onto entries
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    timeout: Duration,
    sentinel: String,
}

impl TranslationService {
    /// Build the service with the provider selected in the configuration
    pub fn new(config: &Config) -> Self {
        Self::with_provider(create_provider(&config.translation), config)
    }

    /// Build the service around an already constructed provider
    pub fn with_provider(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self {
            provider,
            model: config.translation.get_model(),
            system_prompt: config.translation.common.system_prompt.clone(),
            temperature: config.translation.common.temperature,
            timeout: config.translation.get_timeout(),
            sentinel: config.subtitles.sentinel.clone(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Test the connection to the configured provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection(&self.model, self.timeout).await
    }

    /// Send one numbered block; any failure yields `None`
    pub async fn send_batch(&self, block: &str) -> Option<String> {
        match self.request(block).await {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("{} request failed: {}", self.provider.name(), e);
                None
            }
        }
    }

    async fn request(&self, block: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            user: block.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: self.timeout,
        };
        self.provider.complete(request).await
    }

    /// Drive one batch through send, reconcile and the single retry
    ///
    /// `batch_number` is 1-based and only used for logging. Nothing above
    /// debug level is logged here; the caller reports the outcome.
    pub async fn process_batch(&self, batch_number: usize, batch: &[SubtitleEntry]) -> BatchOutcome {
        let flattened = FlattenedBatch::from_entries(batch);
        let block = flattened.numbered_block();
        let mut state = BatchState::Pending;
        let mut attempt = 0;

        loop {
            state = match state {
                BatchState::Pending | BatchState::RetryPending => {
                    attempt += 1;
                    match self.request(&block).await {
                        Ok(response) => BatchState::Sent { attempt, response },
                        Err(e) => {
                            debug!("Batch {}: no response on attempt {}, skipped", batch_number, attempt);
                            return BatchOutcome::ServiceFailed {
                                reason: format!("{} request failed: {}", self.provider.name(), e),
                            };
                        }
                    }
                }
                BatchState::Sent { attempt, response } => {
                    match reconcile(batch, &flattened, &response, &self.sentinel) {
                        Ok(entries) => {
                            debug!(
                                "Batch {}: {} lines reconciled on attempt {}",
                                batch_number,
                                flattened.len(),
                                attempt
                            );
                            return BatchOutcome::Rewritten(entries);
                        }
                        Err(e) if attempt < MAX_ATTEMPTS => {
                            debug!("Batch {}: {}, retrying", batch_number, e);
                            BatchState::RetryPending
                        }
                        Err(e) => {
                            debug!("Batch {}: giving up after {} attempts", batch_number, attempt);
                            return BatchOutcome::ReconciliationFailed {
                                raw_response: response,
                                error: e,
                            };
                        }
                    }
                }
            };
            debug!("Batch {}: -> {}", batch_number, state);
        }
    }
}

/*!
 * Text-completion provider implementations.
 *
 * This module contains client implementations for the supported services:
 * - OpenAI: chat completions API (also used for LM Studio's compatible server)
 * - Anthropic: messages API
 * - Mock: scripted provider used by tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// A single request/response completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Fixed instruction sent as the system message
    pub system: String,
    /// User content, the numbered line block
    pub user: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound for the whole HTTP exchange
    pub timeout: Duration,
}

/// Common trait for all text-completion providers
///
/// Implementations return the free-form text of the completion or a
/// `ProviderError`. No streaming, one request per call.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Test the connection to the provider with a tiny prompt
    async fn test_connection(&self, model: &str, timeout: Duration) -> Result<(), ProviderError> {
        let request = CompletionRequest {
            system: "Reply with the single word OK.".to_string(),
            user: "Hello".to_string(),
            model: model.to_string(),
            temperature: 0.0,
            timeout,
        };
        self.complete(request).await.map(|_| ())
    }
}

/// Build the provider selected in the configuration
pub fn create_provider(config: &TranslationConfig) -> Arc<dyn Provider> {
    match config.provider {
        TranslationProvider::OpenAI => Arc::new(
            openai::OpenAI::new(config.get_api_key(), config.get_endpoint())
                .with_max_tokens(config.common.max_tokens),
        ),
        TranslationProvider::LMStudio => {
            // LM Studio often doesn't require an API key; use a default if empty
            let api_key = {
                let k = config.get_api_key();
                if k.is_empty() { "lm-studio".to_string() } else { k }
            };
            Arc::new(
                openai::OpenAI::new(api_key, config.get_endpoint())
                    .with_name("lmstudio")
                    .with_max_tokens(config.common.max_tokens),
            )
        }
        TranslationProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new(config.get_api_key(), config.get_endpoint())
                .with_max_tokens(config.common.max_tokens),
        ),
    }
}

pub mod anthropic;
pub mod mock;
pub mod openai;

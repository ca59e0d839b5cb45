/*!
 * Mock provider for testing.
 *
 * Replies are taken from a script first; once the script is exhausted the
 * provider falls back to its behavior:
 * - `MockProvider::echo()` - rewrites every numbered line as `[MODERN] <text>`
 * - `MockProvider::failing()` - always fails with an error
 * - `MockProvider::empty()` - always fails with an empty completion
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, Provider};

/// Fallback behavior once scripted replies run out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answer every numbered input line with a rewritten one
    Echo,
    /// Always fail with an API error
    Failing,
    /// Always answer with nothing
    Empty,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Result<String, ProviderError>>,
    requests: Vec<CompletionRequest>,
}

/// Mock provider recording every request it receives
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Queue a successful reply
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.state.lock().script.push_back(Ok(text.into()));
        self
    }

    /// Queue a failed reply
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.state.lock().script.push_back(Err(error));
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Copies of every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state.lock().requests.clone()
    }

    /// Rewrite a numbered block the way a well-behaved model would
    pub fn echo_numbered(block: &str) -> String {
        block
            .lines()
            .filter_map(|line| line.split_once(". "))
            .map(|(number, text)| format!("{}. [MODERN] {}", number, text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let scripted = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());
            state.script.pop_front()
        };

        if let Some(reply) = scripted {
            return reply;
        }

        match self.behavior {
            MockBehavior::Echo => Ok(Self::echo_numbered(&request.user)),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),
            MockBehavior::Empty => Err(ProviderError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

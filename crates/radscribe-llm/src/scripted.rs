//! Scripted backend for tests.
//!
//! Plays back a queue of canned outcomes and records every invocation, so
//! tests can assert call counts, prompt contents, and fallback order without
//! touching the network. Test seam; not part of public API stability
//! guarantees.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use radscribe_util::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Backend that replays a scripted sequence of outcomes
#[doc(hidden)]
pub struct ScriptedBackend {
    provider: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicU32,
    invocations: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    /// Create a scripted backend reporting the given provider name
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    #[must_use]
    pub fn with_ok(self, raw_response: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(raw_response.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn with_err(self, err: LlmError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    /// Number of invocations observed so far
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copies of every invocation observed so far
    #[must_use]
    pub fn invocations(&self) -> Vec<LlmInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = inv.model.clone();
        self.invocations.lock().unwrap().push(inv);

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(raw)) => Ok(LlmResult::new(raw, self.provider.clone(), model)
                .with_latency_ms(1)),
            Some(Err(err)) => Err(err),
            None => Err(LlmError::Transport(format!(
                "scripted backend '{}' has no queued response",
                self.provider
            ))),
        }
    }
}

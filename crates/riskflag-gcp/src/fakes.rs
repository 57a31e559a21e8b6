//! In-memory fakes for the generation seam (testing only)
//!
//! Provides `ScriptedGenerator` and `FakeFactory`, which satisfy the
//! [`TextGenerator`] / [`GeneratorFactory`] contracts without any network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{GcpError, Result};
use crate::generate::{GenerationRequest, GeneratorFactory, TextGenerator};

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Generator that answers every prompt with a fixed reply, except prompts
/// containing one of the configured failure markers.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    reply: String,
    fail_markers: Vec<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    /// Fail any request whose prompt contains `marker`.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_markers.push(marker.to_string());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .fail_markers
            .iter()
            .any(|marker| request.prompt.contains(marker.as_str()))
        {
            return Err(GcpError::Connection("scripted://unreachable".to_string()));
        }

        Ok(self.reply.clone())
    }
}

// ---------------------------------------------------------------------------
// FakeFactory
// ---------------------------------------------------------------------------

/// Factory that either hands out a prepared generator or fails like a
/// misconfigured environment. Counts `connect` calls.
#[derive(Debug, Default)]
pub struct FakeFactory {
    generator: Option<Arc<ScriptedGenerator>>,
    connects: AtomicUsize,
}

impl FakeFactory {
    pub fn ready(generator: Arc<ScriptedGenerator>) -> Self {
        Self {
            generator: Some(generator),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn misconfigured() -> Self {
        Self::default()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl GeneratorFactory for FakeFactory {
    fn connect(&self) -> Result<Arc<dyn TextGenerator>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.generator {
            Some(generator) => Ok(generator.clone()),
            None => Err(GcpError::MissingConfig(crate::config::ENV_PROJECT)),
        }
    }
}

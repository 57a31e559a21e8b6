//! Text-generation capability seam.
//!
//! The drafting stage only needs `generate(model, prompt, system, temperature)`.
//! [`TextGenerator`] is that operation; [`GeneratorFactory`] defers building
//! a generator (and validating its configuration) until a caller actually
//! needs one.

use crate::config::VertexConfig;
use crate::error::Result;
use crate::vertex::VertexClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One call to the text-generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model selector
    pub model: String,
    /// User prompt
    pub prompt: String,
    /// System instruction, if any
    pub system_instruction: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system_instruction: None,
            temperature: 1.0,
        }
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(instruction.to_string());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A text-generation backend (allows mocking)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Builds a [`TextGenerator`] on demand.
pub trait GeneratorFactory: Send + Sync {
    /// Validate configuration and build the generator.
    fn connect(&self) -> Result<Arc<dyn TextGenerator>>;
}

impl GeneratorFactory for VertexConfig {
    fn connect(&self) -> Result<Arc<dyn TextGenerator>> {
        let client = VertexClient::new(self.clone())?;
        Ok(Arc::new(client))
    }
}

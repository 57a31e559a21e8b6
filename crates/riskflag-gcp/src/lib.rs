//! riskflag-gcp: Google Cloud integrations for riskflag
//!
//! This crate provides the external-service layer for riskflag.
//! It talks to Vertex AI for compliance draft generation and to
//! Cloud Storage for retrieving source datasets.
//!
//! ## Layer 0 - External Services
//!
//! Focus: explicit configuration, typed failures, mockable seams.

pub mod config;
pub mod error;
pub mod fakes;
pub mod generate;
pub mod storage;
pub mod vertex;

pub use config::{StorageConfig, VertexConfig};
pub use error::{GcpError, Result};
pub use generate::{GenerationRequest, GeneratorFactory, TextGenerator};
pub use storage::{GcsClient, GcsObject};
pub use vertex::VertexClient;

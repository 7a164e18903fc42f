//! Station payload ingestion
//!
//! Normalizes realtime payloads, reconciles history payloads, and produces
//! synthetic history when the source has none. The transforms are
//! synchronous; [`StationService`] wires them to async collaborators.

pub mod forecast;
pub mod normalizer;
pub mod reconciler;
pub mod service;
pub mod synthetic;

pub use forecast::*;
pub use normalizer::*;
pub use reconciler::*;
pub use service::*;
pub use synthetic::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("Malformed payload: {0}")]
    Structural(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Preferences lookup failed: {0}")]
    Preferences(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

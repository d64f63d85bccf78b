//! Synchronice library - audio-reactive particle visualization core
//!
//! Turns a streamed timeline of audio feature records into a smooth,
//! simulated particle scene kept in step with an external media clock.

pub mod cli;
pub mod error;
pub mod features;
pub mod mapping;
pub mod params;
pub mod particles;
pub mod scene;
pub mod session;
pub mod sync;
pub mod synthetic;
pub mod timeline;
pub mod transport;

pub use error::{MalformedReason, Result, VisualizerError};
pub use features::{AnalysisRecord, FeatureChunk};
pub use params::VisualizerConfig;
pub use session::{RenderFrame, VisualizationSession};

//! Scorer capabilities and dispatch

pub mod dispatcher;
pub mod linear;
#[cfg(feature = "onnx")]
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scorer;

pub use dispatcher::{ScoringDispatcher, ScoringError};
#[cfg(feature = "onnx")]
pub use loader::ModelLoader;
pub use scorer::{FeatureScaler, Scorer, ScorerKind};

//! ONNX Runtime setup for the tree-ensemble scorer

use crate::feature_extractor::FeatureSet;
use crate::models::onnx::OnnxScorer;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_INPUT: &str = "float_input";
const DEFAULT_OUTPUT: &str = "probabilities";

/// Builds ONNX sessions with a shared runtime configuration
pub struct ModelLoader {
    intra_threads: usize,
}

impl ModelLoader {
    /// Single-threaded sessions
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    pub fn with_threads(intra_threads: usize) -> Result<Self> {
        ort::init()
            .with_name("churn-risk")
            .commit()
            .context("Failed to initialize ONNX Runtime")?;
        info!(intra_threads, "ONNX Runtime ready");
        Ok(Self { intra_threads })
    }

    /// Load an exported tree ensemble that consumes `layout`
    pub fn load_scorer<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        layout: FeatureSet,
    ) -> Result<OnnxScorer> {
        let path = path.as_ref();
        let session = self
            .open_session(path)
            .with_context(|| format!("Failed to load {name} from {}", path.display()))?;
        let (input_name, output_name) = io_names(&session);

        info!(
            model = %name,
            path = %path.display(),
            layout = %layout,
            features = layout.len(),
            input = %input_name,
            output = %output_name,
            "Tree model loaded"
        );

        Ok(OnnxScorer::new(
            name.to_string(),
            layout.names().iter().map(|n| n.to_string()).collect(),
            session,
            input_name,
            output_name,
        ))
    }

    fn open_session(&self, path: &Path) -> Result<Session> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(path)?;
        Ok(session)
    }
}

/// First input, and the probability output of a classifier export
fn io_names(session: &Session) -> (String, String) {
    let inputs: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
    debug!(?inputs, ?outputs, "Model signature");
    pick_io_names(&inputs, &outputs)
}

/// Classifier exports carry a label output and a probability output; the
/// latter is found by name, falling back to the last output.
fn pick_io_names(inputs: &[&str], outputs: &[&str]) -> (String, String) {
    let input = inputs.first().copied().unwrap_or(DEFAULT_INPUT);
    let output = outputs
        .iter()
        .copied()
        .find(|name| name.contains("prob"))
        .or_else(|| outputs.last().copied())
        .unwrap_or(DEFAULT_OUTPUT);

    (input.to_string(), output.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_output_preferred_over_label() {
        let (input, output) =
            pick_io_names(&["float_input"], &["output_label", "output_probability"]);

        assert_eq!(input, "float_input");
        assert_eq!(output, "output_probability");
    }

    #[test]
    fn test_last_output_when_none_named_prob() {
        let (_, output) = pick_io_names(&["x"], &["label", "scores"]);
        assert_eq!(output, "scores");
    }

    #[test]
    fn test_first_input_is_used() {
        let (input, _) = pick_io_names(&["features", "mask"], &["probabilities"]);
        assert_eq!(input, "features");
    }

    #[test]
    fn test_defaults_for_empty_signature() {
        let (input, output) = pick_io_names(&[], &[]);

        assert_eq!(input, DEFAULT_INPUT);
        assert_eq!(output, DEFAULT_OUTPUT);
    }
}

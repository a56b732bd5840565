//! Tree-ensemble scorer backed by ONNX Runtime

use crate::models::scorer::Scorer;
use anyhow::{bail, Context, Result};
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::sync::Mutex;
use tracing::{debug, warn};

/// ONNX session wrapped as a churn scorer.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex.
pub struct OnnxScorer {
    name: String,
    feature_names: Vec<String>,
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxScorer {
    pub fn new(
        name: String,
        feature_names: Vec<String>,
        session: Session,
        input_name: String,
        output_name: String,
    ) -> Self {
        Self {
            name,
            feature_names,
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl Scorer for OnnxScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        // Input tensor - shape [1, num_features]
        let input: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, input.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, input)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        extract_probability(&outputs, &self.output_name, &self.name)
    }
}

/// Extract the churn-class probability from model output.
/// Handles tensor outputs and the seq(map) outputs of zipmap-style exports.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let prob = positive_class_from_tensor(&dims, data)
                .with_context(|| format!("output '{output_name}' of {model_name}"))?;
            debug!(model = %model_name, prob = prob, "Extracted from tensor");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let prob = positive_class_from_tensor(&dims, data)
                .with_context(|| format!("output '{name}' of {model_name}"))?;
            debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
            return Ok(prob);
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    warn!(model = %model_name, "Could not locate a probability output");
    anyhow::bail!("model {model_name} produced no probability output")
}

/// Probability of class 1 from seq(map(int64, float))
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(anyhow::anyhow!("No probability found in map"))
}

/// [batch, classes] or [classes]: class 1 when present, else the single column
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);

    let value = if classes >= 2 { data.get(1) } else { data.first() };
    match value {
        Some(&v) => Ok(v as f64),
        None => bail!(
            "probability tensor {dims:?} holds {} values, no positive class",
            data.len()
        ),
    }
}

//! Inference engine for eye-fundus classification.
//!
//! The classifier maps a preprocessed fundus image to four class scores.
//! The engine is constructed once at process startup and injected into
//! the request path; if the model artifact cannot be loaded the engine
//! stays in an unavailable state for the life of the process and every
//! classification request reports it, rather than the process dying or
//! retrying.
//!
//! For a fixed model artifact and fixed input bytes the output is
//! reproducible: the pipeline contains no randomness.

pub mod preprocess;

use std::fmt;
use std::path::Path;

use image::RgbImage;
use tract_onnx::prelude::*;
use tracing::{error, info};

use crate::error::ClassifyError;
pub use preprocess::{decode_and_resize, INPUT_HEIGHT, INPUT_WIDTH};

// =============================================================================
// Labels
// =============================================================================

/// The four diagnostic categories the classifier can output.
///
/// Order matters: it matches the class-score vector produced by the
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Cataract,
    DiabeticRetinopathy,
    Glaucoma,
    Normal,
}

impl Label {
    /// All labels, in model output order.
    pub const ALL: [Label; 4] = [
        Label::Cataract,
        Label::DiabeticRetinopathy,
        Label::Glaucoma,
        Label::Normal,
    ];

    /// Machine-readable name, as used in the training data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Cataract => "cataract",
            Label::DiabeticRetinopathy => "diabetic_retinopathy",
            Label::Glaucoma => "glaucoma",
            Label::Normal => "normal",
        }
    }

    /// Human-readable name: underscores become spaces, words are
    /// title-cased. Used on the result page and in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Label::Cataract => "Cataract",
            Label::DiabeticRetinopathy => "Diabetic Retinopathy",
            Label::Glaucoma => "Glaucoma",
            Label::Normal => "Normal",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class (argmax of the score vector)
    pub label: Label,

    /// Maximum class score as a percentage in [0, 100], rounded to two
    /// decimal places
    pub confidence: f64,
}

/// Map a class-score vector to a prediction.
///
/// The predicted label is the argmax (first index wins on ties);
/// confidence is 100 times the maximum score, rounded to two decimals.
pub fn interpret_scores(scores: &[f32]) -> Result<Prediction, ClassifyError> {
    if scores.len() != Label::ALL.len() {
        return Err(ClassifyError::Inference(format!(
            "expected {} class scores, got {}",
            Label::ALL.len(),
            scores.len()
        )));
    }

    let mut best_index = 0;
    let mut best_score = scores[0];
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    let confidence = (f64::from(best_score) * 100.0 * 100.0).round() / 100.0;

    Ok(Prediction {
        label: Label::ALL[best_index],
        confidence,
    })
}

// =============================================================================
// Classifier
// =============================================================================

/// A model that scores a preprocessed fundus image against the four
/// classes.
///
/// The production implementation is [`OnnxClassifier`]; tests substitute
/// fixed score vectors.
pub trait ImageClassifier: Send + Sync {
    /// Score one image. Returns one score per class, in [`Label::ALL`]
    /// order.
    fn class_scores(&self, image: &RgbImage) -> Result<Vec<f32>, ClassifyError>;
}

type RunnableOnnx = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// ONNX classifier executed with tract.
pub struct OnnxClassifier {
    model: RunnableOnnx,
}

impl OnnxClassifier {
    /// Load and optimize the model artifact.
    ///
    /// The input is pinned to a single NHWC frame so the plan is fully
    /// typed before the first request.
    pub fn load(model_path: &Path) -> Result<Self, ClassifyError> {
        let load = || -> TractResult<RunnableOnnx> {
            tract_onnx::onnx()
                .model_for_path(model_path)?
                .with_input_fact(
                    0,
                    InferenceFact::dt_shape(
                        f32::datum_type(),
                        tvec!(1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 3),
                    ),
                )?
                .into_optimized()?
                .into_runnable()
        };

        let model = load().map_err(|e| ClassifyError::Inference(e.to_string()))?;
        Ok(Self { model })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn class_scores(&self, image: &RgbImage) -> Result<Vec<f32>, ClassifyError> {
        // Single-element NHWC batch with raw 0-255 channel values; the
        // model owns any further normalization.
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 3),
            |(_, y, x, c)| f32::from(image.get_pixel(x as u32, y as u32)[c]),
        );

        let outputs = self
            .model
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let scores = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }
}

// =============================================================================
// Engine
// =============================================================================

enum EngineState {
    Ready(Box<dyn ImageClassifier>),
    Unavailable { reason: String },
}

/// The inference engine handed to the request path.
///
/// Constructed exactly once at startup; read-only afterwards, so it is
/// safe to share behind an `Arc` across concurrent requests.
pub struct InferenceEngine {
    state: EngineState,
}

impl InferenceEngine {
    /// Build the engine from the model artifact at `model_path`.
    ///
    /// A load failure is captured, logged and converted into the
    /// unavailable state; it is not retried for the rest of the process.
    pub fn load(model_path: &Path) -> Self {
        match OnnxClassifier::load(model_path) {
            Ok(classifier) => {
                info!("Model loaded from {}", model_path.display());
                Self::from_classifier(Box::new(classifier))
            }
            Err(e) => {
                error!("Failed to load model from {}: {}", model_path.display(), e);
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Build a ready engine around an existing classifier.
    pub fn from_classifier(classifier: Box<dyn ImageClassifier>) -> Self {
        Self {
            state: EngineState::Ready(classifier),
        }
    }

    /// Build an engine that reports the given reason on every request.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Whether the classifier constructed successfully.
    pub fn is_available(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Classify uploaded image bytes.
    ///
    /// Decodes and preprocesses the bytes, runs the classifier and maps
    /// the score vector to a prediction.
    pub fn classify(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifyError> {
        let classifier = match &self.state {
            EngineState::Ready(classifier) => classifier,
            EngineState::Unavailable { reason } => {
                return Err(ClassifyError::Unavailable {
                    reason: reason.clone(),
                })
            }
        };

        let frame = preprocess::decode_and_resize(image_bytes)?;
        let scores = classifier.class_scores(&frame)?;
        interpret_scores(&scores)
    }
}

// =============================================================================
// Tests
// =============================================================================

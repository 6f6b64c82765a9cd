//! Code for loading and running the trained ONNX classifier

use crate::catalog::{CatalogError, ClassCatalog};
use crate::preprocess::TensorLayout;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tract_core::plan::SimplePlan;
use tract_onnx::prelude::tract_ndarray::Array4;
use tract_onnx::prelude::*;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to load model from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Anything that can turn a preprocessed image batch into one score per
/// class. Shared read-only across all request workers.
pub trait Classifier: Send + Sync {
    /// Run the model on a single-image batch and return the scores of that
    /// image, one per catalog entry
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError>;
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Load and run an ONNX file
pub struct OnnxModel {
    plan: Plan,
    input_shape: [usize; 4],
    output_width: usize,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OnnxModel {{ plan: <graph>, input_shape: {:?}, output_width: {} }}",
            self.input_shape, self.output_width
        )
    }
}

impl OnnxModel {
    /// Load the artifact at `path`, pin its input to a single
    /// `image_size`x`image_size` RGB image and check that its output lines up
    /// with `catalog`.
    pub fn load(
        path: &Path,
        image_size: u32,
        layout: TensorLayout,
        catalog: &ClassCatalog,
    ) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let input_shape = layout.shape(image_size as usize);
        let plan = Self::build_plan(path, input_shape).map_err(|e| ModelError::Load {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;

        let mut model = OnnxModel {
            plan,
            input_shape,
            output_width: 0,
        };

        // Learn the output width from a run on a blank image, so the check
        // also holds for graphs whose output shape is only known after evaluation
        let blank = model.classify(Array4::zeros(input_shape))?;
        catalog.ensure_matches(blank.len())?;
        model.output_width = blank.len();

        info!(
            path = %path.display(),
            input_shape = ?input_shape,
            classes = model.output_width,
            "model loaded successfully"
        );
        Ok(model)
    }

    fn build_plan(path: &Path, input_shape: [usize; 4]) -> TractResult<Plan> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact(input_shape).into())?
            .into_optimized()?
            .into_runnable()
    }

    pub fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }
}

impl Classifier for OnnxModel {
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, ModelError> {
        if input.shape() != self.input_shape {
            return Err(ModelError::Inference(format!(
                "expected input of shape {:?}, got {:?}",
                self.input_shape,
                input.shape()
            )));
        }

        let run = || -> TractResult<Vec<f32>> {
            let outputs = self.plan.run(tvec!(Tensor::from(input).into()))?;
            let scores = outputs[0].cast_to::<f32>()?;
            Ok(scores.as_slice::<f32>()?.to_vec())
        };
        run().map_err(|e| ModelError::Inference(format!("{e:#}")))
    }
}

use crate::ranking::ClassPrediction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /predict`. Exactly one of the two fields must be set.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    /// http(s) URL of an encoded image
    #[serde(default)]
    pub image_url: Option<String>,

    /// Raw pixels as a nested `[height][width][channels]` array of 0-255
    /// integers
    #[serde(default)]
    pub image_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub top_3_classes_predictions: Vec<ClassPrediction>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classes: usize,
}

//! The classification service: everything a `/predict` request needs, built
//! once at startup and shared read-only by every worker.

use crate::catalog::{CatalogError, ClassCatalog};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::fetch::ImageFetcher;
use crate::input::{self, ImageSource};
use crate::model::Classifier;
use crate::preprocess::{preprocess, TensorLayout};
use crate::ranking::{top_predictions, ClassPrediction};
use crate::server::protocol::PredictRequest;
use crate::TOP_N;
use actix_web::web;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct ClassificationService {
    /// The loaded model, if any. Never replaced after construction.
    model: Option<Arc<dyn Classifier>>,
    catalog: ClassCatalog,
    fetcher: ImageFetcher,
    image_size: u32,
    layout: TensorLayout,
    max_dimension: usize,
}

impl std::fmt::Debug for ClassificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationService")
            .field("model_loaded", &self.model.is_some())
            .field("catalog", &self.catalog)
            .field("image_size", &self.image_size)
            .field("layout", &self.layout)
            .finish()
    }
}

impl ClassificationService {
    /// Build a service without a model. The catalog must hold at least
    /// [`TOP_N`] labels so every answer is complete.
    pub fn new(
        catalog: ClassCatalog,
        fetcher: ImageFetcher,
        image_size: u32,
        layout: TensorLayout,
        max_dimension: usize,
    ) -> Result<Self, CatalogError> {
        catalog.ensure_at_least(TOP_N)?;

        Ok(ClassificationService {
            model: None,
            catalog,
            fetcher,
            image_size,
            layout,
            max_dimension,
        })
    }

    /// Build a service without a model from the loaded configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = config.catalog()?;
        let fetcher = ImageFetcher::new(&config.fetch).context("failed to build HTTP client")?;

        ClassificationService::new(
            catalog,
            fetcher,
            config.model.image_size,
            config.model.layout,
            config.input.max_dimension,
        )
        .context("invalid classes.labels")
    }

    /// Attach the model that serves predictions
    pub fn with_model(mut self, model: Arc<dyn Classifier>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Classify the image named by `request` and return the top
    /// [`TOP_N`] classes, most probable first
    pub async fn predict(&self, request: &PredictRequest) -> Result<Vec<ClassPrediction>, ApiError> {
        let model = self.model.clone().ok_or(ApiError::ModelNotLoaded)?;
        let start = Instant::now();

        let source = input::resolve(request.image_url.as_deref(), request.image_data.as_ref())?;
        let image = match source {
            ImageSource::Url(url) => {
                input::check_url(url)?;
                debug!(image_url = url, "fetching image");
                self.fetcher.fetch_image(url).await?
            }
            ImageSource::Inline(data) => input::image_from_json(data, self.max_dimension)?,
        };
        let (width, height) = image.dimensions();

        // Resizing and inference are CPU-bound; keep them off the reactor
        let (size, layout) = (self.image_size, self.layout);
        let scores = web::block(move || model.classify(preprocess(&image, size, layout))).await??;

        if scores.len() != self.catalog.len() {
            return Err(ApiError::InferenceError(format!(
                "model returned {} scores for {} classes",
                scores.len(),
                self.catalog.len()
            )));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ApiError::InferenceError(
                "model returned non-finite scores".into(),
            ));
        }

        let predictions = top_predictions(&scores, &self.catalog, TOP_N)
            .ok_or_else(|| ApiError::Internal("ranked index outside the class catalog".into()))?;

        info!(
            width,
            height,
            top_class = %predictions[0].class_name,
            probability = predictions[0].probability,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "classified image"
        );
        Ok(predictions)
    }
}

use super::protocol::{HealthResponse, PredictRequest, PredictResponse};
use crate::error::ApiError;
use crate::service::ClassificationService;
use actix_web::http::header::ContentType;
use actix_web::{get, post, web, HttpResponse, Responder};

type Result<T> = std::result::Result<T, ApiError>;

pub const GREETING: &str = "Hello! Welcome to product type classification API with ONNX.";

#[get("/")]
pub async fn hello() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(GREETING)
}

/// Classify one image and return the three most likely product categories
#[post("/predict")]
pub async fn predict(
    body: web::Bytes,
    state: web::Data<ClassificationService>,
) -> Result<impl Responder> {
    if !state.model_loaded() {
        return Err(ApiError::ModelNotLoaded);
    }

    let request: PredictRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let predictions = state.predict(&request).await?;

    Ok(web::Json(PredictResponse {
        top_3_classes_predictions: predictions,
    }))
}

#[get("/health")]
pub async fn health(state: web::Data<ClassificationService>) -> impl Responder {
    web::Json(HealthResponse {
        status: "ok",
        model_loaded: state.model_loaded(),
        classes: state.catalog().len(),
    })
}

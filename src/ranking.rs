//! Top-k selection over a model's score vector

use crate::catalog::ClassCatalog;
use serde::Serialize;

/// A class prediction outputted by the classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPrediction {
    pub class_name: String,
    pub probability: f32,
}

/// Indices and scores of the `k` highest scores, highest first. Equal scores
/// keep their catalog order.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    // sort_by is stable, so ties stay in index order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(k);
    ranked
}

/// Rank `scores` and attach catalog labels. Returns `None` if an index falls
/// outside the catalog.
pub fn top_predictions(
    scores: &[f32],
    catalog: &ClassCatalog,
    k: usize,
) -> Option<Vec<ClassPrediction>> {
    top_k(scores, k)
        .into_iter()
        .map(|(index, probability)| {
            catalog.label(index).map(|name| ClassPrediction {
                class_name: name.to_string(),
                probability,
            })
        })
        .collect()
}

//! The fixed, ordered list of product categories the classifier was trained
//! on. Position `i` in the catalog names output `i` of the model.

use std::collections::HashSet;
use thiserror::Error;

/// Labels the shipped model was trained with, in output order
pub const DEFAULT_LABELS: [&str; 10] = [
    "ACCESSORIES",
    "BRACELETS",
    "CHAIN",
    "CHARMS",
    "EARRINGS",
    "ENGAGEMENT RINGS",
    "ENGAGEMENT SET",
    "FASHION RINGS",
    "NECKLACES",
    "WEDDING BANDS",
];

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("class catalog is empty")]
    Empty,

    #[error("class label at position {0} is blank")]
    BlankLabel(usize),

    #[error("class label {0:?} appears more than once")]
    DuplicateLabel(String),

    #[error("model produces {actual} scores but the class catalog has {expected} labels")]
    Mismatch { expected: usize, actual: usize },

    #[error("class catalog needs at least {required} labels, found {actual}")]
    TooFew { required: usize, actual: usize },
}

/// An immutable, index-aligned list of class labels
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCatalog {
    labels: Vec<String>,
}

impl ClassCatalog {
    pub fn new<I, S>(labels: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(CatalogError::BlankLabel(i));
            }
            if !seen.insert(label.as_str()) {
                return Err(CatalogError::DuplicateLabel(label.clone()));
            }
        }

        Ok(ClassCatalog { labels })
    }

    /// Look up the label for a model output position
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Check that the catalog can fill a top-`k` answer
    pub fn ensure_at_least(&self, k: usize) -> Result<(), CatalogError> {
        if self.labels.len() < k {
            return Err(CatalogError::TooFew {
                required: k,
                actual: self.labels.len(),
            });
        }
        Ok(())
    }

    /// Check that a model's output width lines up with the catalog
    pub fn ensure_matches(&self, output_width: usize) -> Result<(), CatalogError> {
        if output_width != self.labels.len() {
            return Err(CatalogError::Mismatch {
                expected: self.labels.len(),
                actual: output_width,
            });
        }
        Ok(())
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        ClassCatalog {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

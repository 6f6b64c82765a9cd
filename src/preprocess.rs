//! Turn a decoded RGB image into the float tensor the classifier consumes

use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::Deserialize;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Memory order of the model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, used by Keras exports
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`, used by PyTorch exports
    Nchw,
}

impl TensorLayout {
    /// Shape of a single-image batch at the given square size
    pub fn shape(&self, size: usize) -> [usize; 4] {
        match self {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        }
    }
}

/// Resize to `size`x`size`, scale pixels into [0, 1] and add a batch
/// dimension of 1.
pub fn preprocess(image: &RgbImage, size: u32, layout: TensorLayout) -> Array4<f32> {
    let resized = if image.dimensions() == (size, size) {
        image.clone()
    } else {
        imageops::resize(image, size, size, FilterType::Triangle)
    };

    let s = size as usize;
    match layout {
        TensorLayout::Nhwc => Array4::from_shape_fn((1, s, s, 3), |(_, y, x, c)| {
            resized[(x as u32, y as u32)][c] as f32 / 255.0
        }),
        TensorLayout::Nchw => Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| {
            resized[(x as u32, y as u32)][c] as f32 / 255.0
        }),
    }
}

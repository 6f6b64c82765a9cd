//! Resolve a prediction request into an image source and turn inline pixel
//! arrays into RGB images.
//!
//! Inline `image_data` is a nested JSON array of raw 0-255 integers, laid out
//! `[height][width][channels]` with 1, 3 or 4 channels, or `[height][width]`
//! for grayscale. Alpha is dropped and gray is replicated across RGB.

use image::{Rgb, RgbImage};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("No valid input image provided.")]
    Missing,

    #[error("Provide only one of image_url or image_data.")]
    Ambiguous,

    #[error("image_url must be an http or https URL.")]
    BadUrl,

    #[error("image_data must be a non-empty nested array of shape [height][width][channels].")]
    BadShape,

    #[error("image_data rows must all have the same width.")]
    RaggedRows,

    #[error("image_data pixels must all have the same number of channels (1, 3 or 4).")]
    BadChannels,

    #[error("image_data values must be integers between 0 and 255.")]
    BadValue,

    #[error("image_data is larger than {0}x{0} pixels.")]
    TooLarge(usize),
}

/// Where the pixels for a request come from
#[derive(Debug, PartialEq)]
pub enum ImageSource<'a> {
    Url(&'a str),
    Inline(&'a Value),
}

/// Pick the single image source out of the two optional request fields
pub fn resolve<'a>(
    image_url: Option<&'a str>,
    image_data: Option<&'a Value>,
) -> Result<ImageSource<'a>, InputError> {
    // An explicit JSON null counts as absent
    let image_data = image_data.filter(|v| !v.is_null());

    match (image_url, image_data) {
        (Some(_), Some(_)) => Err(InputError::Ambiguous),
        (Some(url), None) => Ok(ImageSource::Url(url)),
        (None, Some(data)) => Ok(ImageSource::Inline(data)),
        (None, None) => Err(InputError::Missing),
    }
}

/// Build an RGB image from a nested JSON pixel array
pub fn image_from_json(data: &Value, max_dimension: usize) -> Result<RgbImage, InputError> {
    let rows = non_empty_array(data)?;
    let height = rows.len();

    let first_row = non_empty_array(&rows[0])?;
    let width = first_row.len();

    if height > max_dimension || width > max_dimension {
        return Err(InputError::TooLarge(max_dimension));
    }

    let channels = match &first_row[0] {
        Value::Array(px) => px.len(),
        _ => 0,
    };
    if !matches!(channels, 0 | 1 | 3 | 4) {
        return Err(InputError::BadChannels);
    }

    let mut raw = Vec::with_capacity(height * width * 3);
    for row in rows {
        let row = row.as_array().ok_or(InputError::BadShape)?;
        if row.len() != width {
            return Err(InputError::RaggedRows);
        }
        for px in row {
            raw.extend_from_slice(&pixel(px, channels)?);
        }
    }

    RgbImage::from_raw(width as u32, height as u32, raw).ok_or(InputError::BadShape)
}

fn non_empty_array(value: &Value) -> Result<&Vec<Value>, InputError> {
    match value {
        Value::Array(items) if !items.is_empty() => Ok(items),
        _ => Err(InputError::BadShape),
    }
}

/// Read one pixel. `channels == 0` means scalar grayscale entries.
fn pixel(value: &Value, channels: usize) -> Result<[u8; 3], InputError> {
    match (value, channels) {
        (Value::Array(_), 0) => Err(InputError::BadChannels),
        (v, 0) => {
            let g = byte(v)?;
            Ok([g, g, g])
        }
        (Value::Array(px), n) if px.len() == n => {
            let g = byte(&px[0])?;
            match n {
                1 => Ok([g, g, g]),
                // alpha, if any, is validated but dropped
                _ => {
                    if n == 4 {
                        byte(&px[3])?;
                    }
                    Ok([g, byte(&px[1])?, byte(&px[2])?])
                }
            }
        }
        (Value::Array(_), _) => Err(InputError::BadChannels),
        _ => Err(InputError::BadShape),
    }
}

fn byte(value: &Value) -> Result<u8, InputError> {
    value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or(InputError::BadValue)
}

/// Check that a URL uses a scheme we are willing to fetch
pub fn check_url(url: &str) -> Result<(), InputError> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(InputError::BadUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve() {
        let data = json!([[[0, 0, 0]]]);
        assert_eq!(
            resolve(Some("http://x/a.png"), None),
            Ok(ImageSource::Url("http://x/a.png"))
        );
        assert_eq!(resolve(None, Some(&data)), Ok(ImageSource::Inline(&data)));
        assert_eq!(resolve(None, None), Err(InputError::Missing));
        assert_eq!(resolve(None, Some(&Value::Null)), Err(InputError::Missing));
        assert_eq!(
            resolve(Some("http://x/a.png"), Some(&data)),
            Err(InputError::Ambiguous)
        );
        assert_eq!(
            InputError::Missing.to_string(),
            "No valid input image provided."
        );
    }

    #[test]
    fn test_rgb_array() {
        let data = json!([
            [[255, 0, 0], [0, 255, 0]],
            [[0, 0, 255], [10, 20, 30]],
        ]);
        let image = image_from_json(&data, 16).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image[(0, 0)], Rgb([255, 0, 0]));
        assert_eq!(image[(1, 0)], Rgb([0, 255, 0]));
        assert_eq!(image[(0, 1)], Rgb([0, 0, 255]));
        assert_eq!(image[(1, 1)], Rgb([10, 20, 30]));
    }

    #[test]
    fn test_gray_and_rgba_arrays() {
        let gray = image_from_json(&json!([[7, 8, 9]]), 16).unwrap();
        assert_eq!(gray.dimensions(), (3, 1));
        assert_eq!(gray[(2, 0)], Rgb([9, 9, 9]));

        let single = image_from_json(&json!([[[42]]]), 16).unwrap();
        assert_eq!(single[(0, 0)], Rgb([42, 42, 42]));

        let rgba = image_from_json(&json!([[[1, 2, 3, 200]]]), 16).unwrap();
        assert_eq!(rgba[(0, 0)], Rgb([1, 2, 3]));
    }

    #[test]
    fn test_rejects_malformed_arrays() {
        assert_eq!(image_from_json(&json!([]), 16), Err(InputError::BadShape));
        assert_eq!(image_from_json(&json!([[]]), 16), Err(InputError::BadShape));
        assert_eq!(image_from_json(&json!("pixels"), 16), Err(InputError::BadShape));
        assert_eq!(
            image_from_json(&json!([[[0, 0, 0]], [[0, 0, 0], [1, 1, 1]]]), 16),
            Err(InputError::RaggedRows)
        );
        assert_eq!(
            image_from_json(&json!([[[0, 0]]]), 16),
            Err(InputError::BadChannels)
        );
        assert_eq!(
            image_from_json(&json!([[[0, 0, 0], [0, 0]]]), 16),
            Err(InputError::BadChannels)
        );
        assert_eq!(
            image_from_json(&json!([[1, [0, 0, 0]]]), 16),
            Err(InputError::BadChannels)
        );
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert_eq!(
            image_from_json(&json!([[[256, 0, 0]]]), 16),
            Err(InputError::BadValue)
        );
        assert_eq!(
            image_from_json(&json!([[[-1, 0, 0]]]), 16),
            Err(InputError::BadValue)
        );
        assert_eq!(
            image_from_json(&json!([[[0.5, 0, 0]]]), 16),
            Err(InputError::BadValue)
        );
    }

    #[test]
    fn test_rejects_oversized_arrays() {
        let row: Vec<u8> = vec![0; 5];
        let data = json!([row]);
        assert_eq!(image_from_json(&data, 4), Err(InputError::TooLarge(4)));
    }

    #[test]
    fn test_check_url() {
        assert!(check_url("https://cdn.example.com/ring.jpg").is_ok());
        assert!(check_url("HTTP://example.com/a").is_ok());
        assert_eq!(check_url("file:///etc/passwd"), Err(InputError::BadUrl));
        assert_eq!(check_url("ring.jpg"), Err(InputError::BadUrl));
    }
}

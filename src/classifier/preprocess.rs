//! Image preprocessing
//!
//! ImageNet-style pipeline: decode to RGB, scale the shorter side to the
//! resize edge, center-crop a square, scale to `[0, 1]` and normalize per
//! channel. The decoded (pre-resize) image is returned alongside the tensor
//! so handlers can round-trip it back to the client.

use image::{imageops, RgbImage};
use tract_onnx::prelude::*;

use super::engine::ClassifierError;

/// ImageNet channel means, must match the training pipeline exactly
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode `bytes` and produce a normalized NCHW tensor with batch size 1.
pub fn preprocess(
    bytes: &[u8],
    resize_edge: u32,
    crop_size: u32,
) -> Result<(tract_ndarray::Array4<f32>, RgbImage), ClassifierError> {
    let decoded = image::load_from_memory(bytes)?.to_rgb8();

    let (width, height) = decoded.dimensions();
    // Scale so the shorter side lands on `resize_edge`, keeping aspect ratio.
    let (scaled_w, scaled_h) = if width <= height {
        let h = (height as u64 * resize_edge as u64 / width as u64).max(1) as u32;
        (resize_edge, h)
    } else {
        let w = (width as u64 * resize_edge as u64 / height as u64).max(1) as u32;
        (w, resize_edge)
    };
    // Bilinear, matching torchvision's default interpolation.
    let resized = imageops::resize(&decoded, scaled_w, scaled_h, imageops::FilterType::Triangle);

    let left = scaled_w.saturating_sub(crop_size) / 2;
    let top = scaled_h.saturating_sub(crop_size) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, crop_size, crop_size).to_image();

    let side = crop_size as usize;
    let plane = side * side;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in cropped.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            data[channel * plane + offset] =
                (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel];
        }
    }

    let tensor = tract_ndarray::Array4::from_shape_vec((1, 3, side, side), data)
        .map_err(|e| ClassifierError::Preprocess(e.to_string()))?;

    Ok((tensor, decoded))
}

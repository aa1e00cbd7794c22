// SPDX-License-Identifier: MIT

// crates/formats/src/pixels.rs
//
// Pixel buffer conversions between `image` buffers and ndarray tensors.

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array3;

/// Copy an RGB image into an H×W×3 byte tensor.
pub fn to_hwc_u8(img: &RgbImage) -> Array3<u8> {
    let (width, height) = img.dimensions();
    let mut out = Array3::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            out[[y as usize, x as usize, c]] = pixel[c];
        }
    }
    out
}

/// Resize to `(height, width)` with bilinear interpolation.
pub fn resize(img: &RgbImage, target: (u32, u32)) -> RgbImage {
    let (height, width) = target;
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

/// Map pixel bytes to an H×W×3 float tensor in [0, 1].
pub fn normalize(img: &RgbImage) -> Array3<f32> {
    let (width, height) = img.dimensions();
    let mut out = Array3::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            out[[y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }
    out
}

//! Image preparation for fixed-size model input.

use image::{RgbaImage, imageops::FilterType};
use ndarray::Array4;

/// Scale to a `size`x`size` square, ignoring aspect ratio.
pub fn resize_to_square(image: &RgbaImage, size: u32) -> RgbaImage {
    image::imageops::resize(image, size, size, FilterType::CatmullRom)
}

/// Pack an RGBA image into a normalized `1x3xHxW` tensor. Alpha is dropped.
pub fn to_nchw_tensor(image: &RgbaImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut array = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let (y, x) = (y as usize, x as usize);
        array[[0, 0, y, x]] = normalize_channel(r, mean[0], std[0]);
        array[[0, 1, y, x]] = normalize_channel(g, mean[1], std[1]);
        array[[0, 2, y, x]] = normalize_channel(b, mean[2], std[2]);
    }
    array
}

fn normalize_channel(value: u8, mean: f32, std: f32) -> f32 {
    let v = value as f32 / 255.0;
    (v - mean) / std
}

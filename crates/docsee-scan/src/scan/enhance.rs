// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pre-extraction enhancement: grayscale conversion and unsharp masking to
// make glyph edges stand out before text recognition.

use docsee_core::config::SharpenConfig;
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Sharpen a grayscale image with an unsharp mask:
/// `gray_weight * gray + blur_weight * blur(gray)`, saturated to 0..=255.
///
/// With the defaults (1.5, -0.5, sigma 1.0) this amplifies the image and
/// subtracts a blurred copy, boosting local contrast at edges while leaving
/// flat regions unchanged.
pub fn unsharp_mask(gray: &GrayImage, config: &SharpenConfig) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, config.sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let original = gray.get_pixel(x, y).0[0] as f32;
        let soft = blurred.get_pixel(x, y).0[0] as f32;
        let value = config.gray_weight * original + config.blur_weight * soft;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Convert a rectified page into the sharpened single-channel form the
/// extractor sees, expanded back to three identical channels.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn prepare_for_extraction(image: &RgbImage, config: &SharpenConfig) -> RgbImage {
    let gray = image::imageops::grayscale(image);
    let sharpened = unsharp_mask(&gray, config);
    debug!("Unsharp mask applied");
    image::DynamicImage::ImageLuma8(sharpened).to_rgb8()
}

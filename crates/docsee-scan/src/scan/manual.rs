// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manual corner selection on a letter-boxed preview. Clicks are made in
// preview coordinates and mapped back to the source image before the crop is
// rectified.

use docsee_core::error::{DocseeError, Result};
use docsee_core::types::{Point, Quadrilateral};
use image::RgbImage;
use tracing::{debug, info};

use super::rectify::PerspectiveRectifier;

/// Default preview area used by the selection dialog.
pub const DEFAULT_DISPLAY_SIZE: (u32, u32) = (800, 600);

/// Collects four user-picked corners on a scaled, centred preview.
#[derive(Debug, Clone)]
pub struct ManualSelection {
    source_size: (u32, u32),
    scale: f32,
    offset: (f32, f32),
    resized: (f32, f32),
    clicks: Vec<Point>,
}

impl ManualSelection {
    /// Lay out an image of `source_size` inside a `display_size` preview,
    /// scaled to fit and centred.
    pub fn new(source_size: (u32, u32), display_size: (u32, u32)) -> Result<Self> {
        let (src_w, src_h) = source_size;
        let (disp_w, disp_h) = display_size;
        if src_w == 0 || src_h == 0 || disp_w == 0 || disp_h == 0 {
            return Err(DocseeError::InvalidSelection(format!(
                "cannot lay out {src_w}x{src_h} image in {disp_w}x{disp_h} preview"
            )));
        }

        let scale = (disp_w as f32 / src_w as f32).min(disp_h as f32 / src_h as f32);
        let resized_w = (src_w as f32 * scale).floor();
        let resized_h = (src_h as f32 * scale).floor();
        let offset = (
            ((disp_w as f32 - resized_w) / 2.0).floor(),
            ((disp_h as f32 - resized_h) / 2.0).floor(),
        );

        Ok(Self {
            source_size,
            scale,
            offset,
            resized: (resized_w, resized_h),
            clicks: Vec::with_capacity(4),
        })
    }

    /// Selection for `image` in the default preview size.
    pub fn for_image(image: &RgbImage) -> Result<Self> {
        Self::new(image.dimensions(), DEFAULT_DISPLAY_SIZE)
    }

    /// Register a click in preview coordinates.
    ///
    /// Clicks outside the displayed image, or beyond the fourth, are ignored.
    /// Returns whether the click was accepted.
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        if self.clicks.len() == 4 {
            return false;
        }
        let (ox, oy) = self.offset;
        let (rw, rh) = self.resized;
        let inside = (ox..=ox + rw).contains(&x) && (oy..=oy + rh).contains(&y);
        if !inside {
            debug!(x, y, "Click outside image area ignored");
            return false;
        }
        self.clicks.push((x, y));
        true
    }

    /// Discard all clicks (the user declined the selection).
    pub fn clear(&mut self) {
        self.clicks.clear();
    }

    pub fn clicks(&self) -> &[Point] {
        &self.clicks
    }

    pub fn is_complete(&self) -> bool {
        self.clicks.len() == 4
    }

    /// Map a preview point back to source pixel coordinates (truncated).
    pub fn to_source(&self, point: Point) -> Point {
        let (ox, oy) = self.offset;
        let max_x = (self.source_size.0 - 1) as f32;
        let max_y = (self.source_size.1 - 1) as f32;
        (
            ((point.0 - ox) / self.scale).trunc().clamp(0.0, max_x),
            ((point.1 - oy) / self.scale).trunc().clamp(0.0, max_y),
        )
    }

    /// The four clicks in source coordinates.
    pub fn quadrilateral(&self) -> Result<Quadrilateral> {
        if !self.is_complete() {
            return Err(DocseeError::InvalidSelection(format!(
                "need 4 corners, have {}",
                self.clicks.len()
            )));
        }
        let mapped: Vec<Point> = self.clicks.iter().map(|p| self.to_source(*p)).collect();
        Ok(Quadrilateral::new([mapped[0], mapped[1], mapped[2], mapped[3]]))
    }

    /// Rectify the selected region of `source`.
    pub fn crop(&self, source: &RgbImage, rectifier: &PerspectiveRectifier) -> Result<RgbImage> {
        if source.dimensions() != self.source_size {
            return Err(DocseeError::InvalidSelection(format!(
                "selection laid out for {:?}, image is {:?}",
                self.source_size,
                source.dimensions()
            )));
        }
        let quad = self.quadrilateral()?;
        let cropped = rectifier.rectify_unordered(source, &quad)?;
        info!(
            width = cropped.width(),
            height = cropped.height(),
            "Manual selection rectified"
        );
        Ok(cropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn landscape_image_is_letterboxed_vertically() {
        // 1600x800 → scale 0.5 → 800x400, centred with 100 px bands.
        let sel = ManualSelection::new((1600, 800), (800, 600)).expect("layout");
        assert_eq!(sel.to_source((0.0, 100.0)), (0.0, 0.0));
        assert_eq!(sel.to_source((400.0, 300.0)), (800.0, 400.0));
    }

    #[test]
    fn clicks_outside_image_are_ignored() {
        let mut sel = ManualSelection::new((1600, 800), (800, 600)).expect("layout");
        assert!(!sel.click(400.0, 50.0));
        assert!(!sel.click(400.0, 550.0));
        assert!(sel.click(400.0, 300.0));
        assert_eq!(sel.clicks().len(), 1);
    }

    #[test]
    fn fifth_click_is_rejected() {
        let mut sel = ManualSelection::new((100, 100), (100, 100)).expect("layout");
        for (x, y) in [(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)] {
            assert!(sel.click(x, y));
        }
        assert!(sel.is_complete());
        assert!(!sel.click(50.0, 50.0));
    }

    #[test]
    fn incomplete_selection_is_an_error() {
        let mut sel = ManualSelection::new((100, 100), (100, 100)).expect("layout");
        sel.click(10.0, 10.0);
        assert!(matches!(
            sel.quadrilateral(),
            Err(DocseeError::InvalidSelection(_))
        ));
    }

    #[test]
    fn zero_sized_layout_is_an_error() {
        assert!(ManualSelection::new((0, 10), (800, 600)).is_err());
    }

    #[test]
    fn crop_rectifies_selected_region() {
        // 400x300 source shown at 2x in an 800x600 preview.
        let source = RgbImage::from_pixel(400, 300, Rgb([50, 60, 70]));
        let mut sel = ManualSelection::new((400, 300), (800, 600)).expect("layout");
        for (x, y) in [(600.0, 400.0), (200.0, 100.0), (600.0, 100.0), (200.0, 400.0)] {
            assert!(sel.click(x, y));
        }
        let cropped = sel
            .crop(&source, &PerspectiveRectifier::new())
            .expect("crop");
        // Source corners (100,50)..(300,200) → 200x150.
        assert_eq!(cropped.dimensions(), (200, 150));
    }

    #[test]
    fn crop_rejects_mismatched_image() {
        let mut sel = ManualSelection::new((400, 300), (800, 600)).expect("layout");
        for (x, y) in [(200.0, 100.0), (600.0, 100.0), (600.0, 400.0), (200.0, 400.0)] {
            sel.click(x, y);
        }
        let other = RgbImage::new(10, 10);
        assert!(sel.crop(&other, &PerspectiveRectifier::new()).is_err());
    }
}

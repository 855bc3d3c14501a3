// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The text-recognition capability, as seen by the dispatcher.

use docsee_core::error::Result;
use docsee_core::types::RawHit;
use image::RgbImage;

/// Opaque text-recognition service.
///
/// Implementations own their model resources; the dispatcher shares one
/// instance across all jobs via `Arc`, so calls must be safe from several
/// threads at once.
pub trait TextExtractor: Send + Sync {
    /// Recognise text in an RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`DocseeError::Extraction`](docsee_core::DocseeError::Extraction)
    /// on internal failure.
    fn extract_text(&self, image: &RgbImage) -> Result<Vec<RawHit>>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "extractor"
    }
}

/// Extractor that never finds anything. Used when no recognition backend is
/// compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExtractor;

impl TextExtractor for NullExtractor {
    fn extract_text(&self, _image: &RgbImage) -> Result<Vec<RawHit>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "null"
    }
}

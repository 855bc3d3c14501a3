// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch processing of still images: each image is detected with the still
// thresholds and, when a document is found, rectified and submitted for
// extraction. Images without a detectable document are kept unchanged.

use std::path::Path;
use std::sync::Arc;

use docsee_core::config::ScanConfig;
use docsee_core::error::{DocseeError, Result};
use docsee_core::types::{ImageIndex, ScanMode};
use image::RgbImage;
use tracing::{info, instrument, warn};

use super::source::load_frame;
use super::store::CaptureStore;
use crate::extract::ExtractionDispatcher;
use crate::scan::detect::BoundaryDetector;
use crate::scan::manual::ManualSelection;
use crate::scan::rectify::PerspectiveRectifier;

/// Which pages of a batch were rectified and which were kept raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Rectified and submitted for extraction.
    pub rectified: Vec<ImageIndex>,
    /// Stored as-is; nothing submitted.
    pub raw: Vec<ImageIndex>,
    /// Failed to load; nothing stored.
    pub failed: Vec<ImageIndex>,
}

pub struct BatchSession {
    detector: BoundaryDetector,
    rectifier: PerspectiveRectifier,
    store: CaptureStore,
    dispatcher: Arc<ExtractionDispatcher>,
}

impl BatchSession {
    pub fn new(dispatcher: Arc<ExtractionDispatcher>, config: &ScanConfig) -> Self {
        Self {
            detector: BoundaryDetector::new(config.detection.clone(), ScanMode::Still),
            rectifier: PerspectiveRectifier::new(),
            store: CaptureStore::new(),
            dispatcher,
        }
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<ExtractionDispatcher> {
        &self.dispatcher
    }

    /// Process a fresh batch. Each frame's index is its position; any
    /// previously stored pages are discarded.
    #[instrument(skip_all)]
    pub fn process(&mut self, frames: impl IntoIterator<Item = RgbImage>) -> BatchReport {
        self.store.clear();
        let mut report = BatchReport::default();
        for (index, frame) in frames.into_iter().enumerate() {
            self.process_one(index, frame, &mut report);
        }
        info!(
            rectified = report.rectified.len(),
            raw = report.raw.len(),
            "Batch processed"
        );
        report
    }

    /// Load and process image files. Indices follow the input order, so a
    /// file that fails to load leaves a gap.
    #[instrument(skip_all)]
    pub fn process_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> BatchReport {
        self.store.clear();
        let mut report = BatchReport::default();
        for (index, path) in paths.iter().enumerate() {
            match load_frame(path) {
                Ok(frame) => self.process_one(index, frame, &mut report),
                Err(e) => {
                    warn!(index, path = %path.as_ref().display(), error = %e, "Image skipped");
                    report.failed.push(index);
                }
            }
        }
        info!(
            rectified = report.rectified.len(),
            raw = report.raw.len(),
            failed = report.failed.len(),
            "Batch processed"
        );
        report
    }

    fn process_one(&mut self, index: ImageIndex, frame: RgbImage, report: &mut BatchReport) {
        let page = match self.detector.detect(&frame) {
            Some(quad) => match self.rectifier.rectify_unordered(&frame, &quad) {
                Ok(page) => Some(page),
                Err(DocseeError::DegenerateGeometry(reason)) => {
                    warn!(index, %reason, "Degenerate outline; keeping raw image");
                    None
                }
                Err(e) => {
                    warn!(index, error = %e, "Rectification failed; keeping raw image");
                    None
                }
            },
            None => {
                info!(index, "No document found; keeping raw image");
                None
            }
        };

        match page {
            Some(page) => {
                self.store.insert(index, page.clone());
                self.dispatcher.submit(index, page);
                report.rectified.push(index);
            }
            None => {
                self.store.insert(index, frame);
                report.raw.push(index);
            }
        }
    }

    /// Replace the page at `index` with a manual crop and re-extract it.
    pub fn apply_manual_selection(
        &mut self,
        index: ImageIndex,
        selection: &ManualSelection,
    ) -> Result<()> {
        super::apply_selection(
            &mut self.store,
            &self.dispatcher,
            &self.rectifier,
            index,
            selection,
        )
    }
}

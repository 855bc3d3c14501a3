// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::collections::BTreeMap;

use docsee_core::error::{DocseeError, Result};
use docsee_core::types::ImageIndex;
use image::RgbImage;

/// Captured pages keyed by index. Re-capturing an index overwrites it.
#[derive(Debug, Default, Clone)]
pub struct CaptureStore {
    pages: BTreeMap<ImageIndex, RgbImage>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `page` under `index`, returning the page it replaced.
    pub fn insert(&mut self, index: ImageIndex, page: RgbImage) -> Option<RgbImage> {
        self.pages.insert(index, page)
    }

    pub fn get(&self, index: ImageIndex) -> Option<&RgbImage> {
        self.pages.get(&index)
    }

    /// Like [`get`](Self::get), but a missing page is an error.
    pub fn require(&self, index: ImageIndex) -> Result<&RgbImage> {
        self.get(index).ok_or(DocseeError::NoCapture(index))
    }

    /// All pages in index order.
    pub fn pages(&self) -> Vec<RgbImage> {
        self.pages.values().cloned().collect()
    }

    pub fn indices(&self) -> Vec<ImageIndex> {
        self.pages.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

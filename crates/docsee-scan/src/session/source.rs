// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame sources: anything that yields RGB frames one at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use docsee_core::error::{DocseeError, Result};
use image::RgbImage;
use tracing::{debug, info};

/// File extensions accepted when scanning a directory for frames.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Yields frames until exhausted. Cameras and still-image lists both fit.
pub trait FrameSource {
    /// The next frame, or `None` when the source has ended.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Decode an image file into an RGB frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|err| {
        DocseeError::Image(format!("failed to load {}: {err}", path.display()))
    })?;
    debug!(path = %path.display(), width = decoded.width(), height = decoded.height(), "Frame loaded");
    Ok(decoded.to_rgb8())
}

/// Frames already in memory, yielded in order.
#[derive(Debug, Default)]
pub struct StillFrames {
    frames: VecDeque<RgbImage>,
}

impl StillFrames {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for StillFrames {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// Image files from a directory, sorted by file name, decoded lazily.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    paths: VecDeque<PathBuf>,
}

impl DirectoryFrameSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), "Frame directory opened");
        Ok(Self {
            paths: paths.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match self.paths.pop_front() {
            Some(path) => load_frame(path).map(Some),
            None => Ok(None),
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

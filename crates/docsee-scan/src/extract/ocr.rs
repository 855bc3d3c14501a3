// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction backed by the pure-Rust `ocrs` engine.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// docsee-scan = { path = "crates/docsee-scan", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two `.rten` model files:
//
// - `text-detection.rten` locates text regions.
// - `text-recognition.rten` decodes characters within them.
//
// Running `ocrs-cli` once downloads both into the default cache directory,
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).
//
// `ocrs` does not report per-line scores, so every recognised line carries
// confidence 1.0 and only the shape and length checks of the filter apply.

use std::path::{Path, PathBuf};

use docsee_core::error::{DocseeError, Result};
use docsee_core::types::RawHit;
use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use super::extractor::TextExtractor;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Confidence reported for every line.
const OCRS_CONFIDENCE: f32 = 1.0;

/// `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`, else `./ocrs-models`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct OcrModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl OcrModelPaths {
    /// Both models inside `dir` under their well-known names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection, &self.recognition] {
            if !path.exists() {
                return Err(DocseeError::Extraction(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for OcrModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

/// [`TextExtractor`] over an `ocrs` engine. Model loading is the expensive
/// step; build once and share.
pub struct OcrsExtractor {
    engine: OcrEngine,
}

impl OcrsExtractor {
    /// Load both models.
    ///
    /// # Errors
    ///
    /// [`DocseeError::Extraction`] if a model file is missing or corrupt.
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn new(paths: &OcrModelPaths) -> Result<Self> {
        paths.validate()?;

        info!("Loading text detection model");
        let detection_model = Model::load_file(&paths.detection).map_err(|err| {
            DocseeError::Extraction(format!(
                "failed to load detection model from {}: {err}",
                paths.detection.display()
            ))
        })?;

        info!("Loading text recognition model");
        let recognition_model = Model::load_file(&paths.recognition).map_err(|err| {
            DocseeError::Extraction(format!(
                "failed to load recognition model from {}: {err}",
                paths.recognition.display()
            ))
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| DocseeError::Extraction(format!("failed to initialise engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&OcrModelPaths::default())
    }
}

impl TextExtractor for OcrsExtractor {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn extract_text(&self, image: &RgbImage) -> Result<Vec<RawHit>> {
        let (width, height) = image.dimensions();
        let source = ImageSource::from_bytes(image.as_raw(), (width, height)).map_err(|err| {
            DocseeError::Extraction(format!("bad image source ({width}x{height}): {err}"))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| DocseeError::Extraction(format!("preprocessing failed: {err}")))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| DocseeError::Extraction(format!("word detection failed: {err}")))?;
        let lines = self.engine.find_text_lines(&input, &words);
        debug!(words = words.len(), lines = lines.len(), "Text lines found");

        let recognised = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|err| DocseeError::Extraction(format!("line recognition failed: {err}")))?;

        let hits = recognised
            .iter()
            .flatten()
            .map(|line| {
                let corners = line.rotated_rect().corners();
                RawHit {
                    region: corners.map(|c| (c.x, c.y)),
                    text: line.to_string(),
                    confidence: OCRS_CONFIDENCE,
                }
            })
            .collect();
        Ok(hits)
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Every tunable constant of the pipeline lives here so
// it can be persisted as JSON and overridden per deployment.

use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{DocseeError, Result};
use crate::types::{PaperSize, ScanMode};

/// Default file name for a persisted configuration.
pub const CONFIG_FILE: &str = "docsee.json";

/// Canny hysteresis thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeThresholds {
    pub low: f32,
    pub high: f32,
}

/// Boundary detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gaussian sigma; 1.1 matches a 5x5 kernel.
    pub blur_sigma: f32,
    /// Thresholds for stand-alone stills.
    pub still_edges: EdgeThresholds,
    /// Lower thresholds for live video, to tolerate motion blur.
    pub live_edges: EdgeThresholds,
    /// How many of the largest contours are examined.
    pub max_candidates: usize,
    /// Polygon approximation tolerance as a fraction of the perimeter.
    pub approx_epsilon_ratio: f64,
    /// Candidates enclosing this many square pixels or fewer are ignored.
    pub min_area: f32,
}

impl DetectionConfig {
    /// Edge thresholds for the given scan mode.
    pub fn edges_for(&self, mode: ScanMode) -> EdgeThresholds {
        match mode {
            ScanMode::Still => self.still_edges,
            ScanMode::Live => self.live_edges,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            still_edges: EdgeThresholds {
                low: 75.0,
                high: 200.0,
            },
            live_edges: EdgeThresholds {
                low: 50.0,
                high: 150.0,
            },
            max_candidates: 5,
            approx_epsilon_ratio: 0.02,
            min_area: 200.0,
        }
    }
}

/// Live-capture debounce parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Mean corner displacement (pixels) below which two detections agree.
    pub max_mean_distance: f32,
    /// Consecutive agreeing frames, including the first, needed to confirm.
    pub stable_frames: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            max_mean_distance: 25.0,
            stable_frames: 6,
        }
    }
}

/// Extraction hit filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_confidence: f32,
    /// Minimum length in characters after trimming.
    pub min_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.4,
            min_chars: 2,
        }
    }
}

/// Unsharp mask applied before extraction:
/// `gray_weight * gray + blur_weight * blur(gray, sigma)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenConfig {
    pub sigma: f32,
    pub gray_weight: f32,
    pub blur_weight: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            gray_weight: 1.5,
            blur_weight: -0.5,
        }
    }
}

/// Output naming and document assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub paper_size: PaperSize,
    /// Title written into assembled PDFs.
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            title: "DocSee Scan".into(),
        }
    }
}

impl OutputConfig {
    /// `<prefix>_<YYYY-mm-dd_HH-MM-SS>.<ext>` in local time.
    pub fn timestamped_name(prefix: &str, ext: &str) -> String {
        let now = Local::now().format("%Y-%m-%d_%H-%M-%S");
        format!("{prefix}_{now}.{ext}")
    }
}

/// Complete scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub sharpen: SharpenConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// How often callers poll for extraction results.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between live frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    300
}

fn default_frame_interval_ms() -> u64 {
    30
}

impl ScanConfig {
    /// Read a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration, falling back to defaults only when the file
    /// does not exist. A file that exists but is malformed or invalid is an
    /// error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(path) {
            Err(DocseeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.detection.max_candidates == 0 {
            return Err(DocseeError::Config(
                "detection.max_candidates must be at least 1".into(),
            ));
        }
        if self.detection.approx_epsilon_ratio <= 0.0 {
            return Err(DocseeError::Config(
                "detection.approx_epsilon_ratio must be positive".into(),
            ));
        }
        if self.detection.blur_sigma <= 0.0 || self.sharpen.sigma <= 0.0 {
            return Err(DocseeError::Config("blur sigmas must be positive".into()));
        }
        if self.stability.stable_frames == 0 {
            return Err(DocseeError::Config(
                "stability.stable_frames must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.filter.min_confidence) {
            return Err(DocseeError::Config(format!(
                "filter.min_confidence {} is outside 0.0..=1.0",
                self.filter.min_confidence
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = ScanConfig::default();
        assert_eq!(config.detection.max_candidates, 5);
        assert_eq!(config.detection.edges_for(ScanMode::Still).low, 75.0);
        assert_eq!(config.detection.edges_for(ScanMode::Live).high, 150.0);
        assert_eq!(config.stability.stable_frames, 6);
        assert_eq!(config.filter.min_confidence, 0.4);
        assert_eq!(config.poll_interval_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);

        let mut config = ScanConfig::default();
        config.stability.stable_frames = 9;
        config.save(&path).expect("save");

        let loaded = ScanConfig::load(&path).expect("load");
        assert_eq!(loaded.stability.stable_frames, 9);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "poll_interval_ms": 100 }"#).expect("write");

        let loaded = ScanConfig::load(&path).expect("load");
        assert_eq!(loaded.poll_interval_ms, 100);
        assert_eq!(loaded.frame_interval_ms, 30);
        assert_eq!(loaded.detection.min_area, 200.0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ScanConfig::load_or_default("/nonexistent/docsee.json").expect("defaults");
        assert_eq!(config.stability.max_mean_distance, 25.0);
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "stability": { "max_mean_distance": 10.0 } }"#)
            .expect("write");

        let loaded = ScanConfig::load_or_default(&path).expect("load");
        assert_eq!(loaded.stability.max_mean_distance, 10.0);
        assert_eq!(loaded.stability.stable_frames, 6);
        assert_eq!(loaded.detection.max_candidates, 5);
    }

    #[test]
    fn invalid_file_is_reported_not_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{ "stability": { "max_mean_distance": 10.0, "stable_frames": 0 } }"#,
        )
        .expect("write");

        assert!(matches!(
            ScanConfig::load_or_default(&path),
            Err(DocseeError::Config(_))
        ));
    }

    #[test]
    fn malformed_file_is_reported_not_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").expect("write");

        assert!(matches!(
            ScanConfig::load_or_default(&path),
            Err(DocseeError::Serialization(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_stable_frames() {
        let mut config = ScanConfig::default();
        config.stability.stable_frames = 0;
        assert!(matches!(config.validate(), Err(DocseeError::Config(_))));
    }

    #[test]
    fn timestamped_name_shape() {
        let name = OutputConfig::timestamped_name("scanned", "pdf");
        assert!(name.starts_with("scanned_"));
        assert!(name.ends_with(".pdf"));
        // scanned_ + 19 timestamp chars + .pdf
        assert_eq!(name.len(), "scanned_".len() + 19 + ".pdf".len());
    }
}

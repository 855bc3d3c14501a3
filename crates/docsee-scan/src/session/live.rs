// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live capture: one tick per frame. Detection runs with the motion-tolerant
// thresholds, the stability gate decides when to capture, and the captured
// page is rectified, stored and handed to extraction without waiting.

use std::sync::Arc;
use std::time::Duration;

use docsee_core::config::ScanConfig;
use docsee_core::error::{DocseeError, Result};
use docsee_core::types::{ImageIndex, ScanMode, SessionId};
use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use super::source::FrameSource;
use super::store::CaptureStore;
use crate::extract::ExtractionDispatcher;
use crate::scan::detect::BoundaryDetector;
use crate::scan::manual::ManualSelection;
use crate::scan::rectify::PerspectiveRectifier;
use crate::scan::stability::{GateState, StabilityGate};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No document in the frame.
    Searching,
    /// A document is in view and holding still for `matches` frames.
    Tracking { matches: u32 },
    /// The page was captured under `index` and submitted for extraction.
    Captured { index: ImageIndex },
    /// The confirmed outline could not be rectified; tracking restarts.
    Rejected,
    /// The frame source has no more frames.
    Exhausted,
    /// This session already captured; call [`LiveSession::restart`].
    Finished,
}

/// Drives live capture for one page at a time.
pub struct LiveSession<S: FrameSource> {
    id: SessionId,
    source: S,
    detector: BoundaryDetector,
    gate: StabilityGate,
    rectifier: PerspectiveRectifier,
    store: CaptureStore,
    dispatcher: Arc<ExtractionDispatcher>,
    current_index: ImageIndex,
    last_frame: Option<RgbImage>,
    finished: bool,
}

impl<S: FrameSource> LiveSession<S> {
    pub fn new(source: S, dispatcher: Arc<ExtractionDispatcher>, config: &ScanConfig) -> Self {
        let id = SessionId::new();
        info!(session = %id, "Live session started");
        Self {
            id,
            source,
            detector: BoundaryDetector::new(config.detection.clone(), ScanMode::Live),
            gate: StabilityGate::new(config.stability.clone()),
            rectifier: PerspectiveRectifier::new(),
            store: CaptureStore::new(),
            dispatcher,
            current_index: 0,
            last_frame: None,
            finished: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Index the next capture is stored under.
    pub fn current_index(&self) -> ImageIndex {
        self.current_index
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<ExtractionDispatcher> {
        &self.dispatcher
    }

    /// Process one frame.
    ///
    /// # Errors
    ///
    /// Frame acquisition failures, and rectification failures other than
    /// degenerate geometry, are returned; the session stays usable.
    #[instrument(skip(self), fields(session = %self.id, index = self.current_index))]
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.finished {
            return Ok(TickOutcome::Finished);
        }

        let Some(frame) = self.source.next_frame()? else {
            info!("Frame source exhausted");
            self.finished = true;
            return Ok(TickOutcome::Exhausted);
        };

        let detection = self.detector.detect(&frame);
        let outcome = match self.gate.observe(detection) {
            GateState::Searching => TickOutcome::Searching,
            GateState::Accumulating => TickOutcome::Tracking {
                matches: self.gate.matches(),
            },
            GateState::Confirmed => self.capture_confirmed(&frame)?,
        };
        self.last_frame = Some(frame);
        Ok(outcome)
    }

    fn capture_confirmed(&mut self, frame: &RgbImage) -> Result<TickOutcome> {
        let Some(quad) = self.gate.confirmed_quad() else {
            return Ok(TickOutcome::Searching);
        };

        match self.rectifier.rectify_unordered(frame, &quad) {
            Ok(page) => {
                let index = self.current_index;
                self.store.insert(index, page.clone());
                self.dispatcher.submit(index, page);
                self.finished = true;
                info!(index, "Page captured");
                Ok(TickOutcome::Captured { index })
            }
            Err(DocseeError::DegenerateGeometry(reason)) => {
                warn!(%reason, "Confirmed outline is degenerate; tracking again");
                self.gate.reset();
                Ok(TickOutcome::Rejected)
            }
            Err(e) => Err(e),
        }
    }

    /// Tick until a page is captured, the source ends, or `max_ticks` frames
    /// have been processed, sleeping `frame_interval` between frames.
    ///
    /// Per-frame errors are logged and skipped. Returns the captured index.
    pub fn run(&mut self, max_ticks: usize, frame_interval: Duration) -> Option<ImageIndex> {
        for tick in 0..max_ticks {
            match self.tick() {
                Ok(TickOutcome::Captured { index }) => return Some(index),
                Ok(TickOutcome::Exhausted | TickOutcome::Finished) => return None,
                Ok(outcome) => debug!(tick, ?outcome, "Tick"),
                Err(e) => warn!(tick, error = %e, "Frame skipped"),
            }
            if !frame_interval.is_zero() {
                std::thread::sleep(frame_interval);
            }
        }
        info!(max_ticks, "Tick budget spent without capture");
        None
    }

    /// Capture the most recent raw frame as-is, bypassing detection.
    pub fn take_picture(&mut self) -> Result<ImageIndex> {
        let frame = self
            .last_frame
            .clone()
            .ok_or(DocseeError::NoCapture(self.current_index))?;
        let index = self.current_index;
        self.store.insert(index, frame.clone());
        self.dispatcher.submit(index, frame);
        self.finished = true;
        info!(index, "Raw frame captured manually");
        Ok(index)
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

    /// Begin a new session on the same page index; the next capture
    /// overwrites it.
    pub fn restart(&mut self) {
        self.gate.reset();
        self.finished = false;
        self.id = SessionId::new();
        info!(session = %self.id, index = self.current_index, "Live session restarted");
    }

    /// Begin a new session for the following page.
    pub fn next_page(&mut self) {
        self.current_index += 1;
        self.restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::NullExtractor;
    use crate::session::source::StillFrames;
    use image::Rgb;

    fn frame_with_rectangle(dx: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]));
        for y in 40..200 {
            for x in (60 + dx)..(260 + dx) {
                img.put_pixel(x, y, Rgb([230, 230, 230]));
            }
        }
        img
    }

    fn blank() -> RgbImage {
        RgbImage::from_pixel(320, 240, Rgb([30, 30, 30]))
    }

    fn session(frames: Vec<RgbImage>) -> LiveSession<StillFrames> {
        let config = ScanConfig::default();
        let dispatcher = Arc::new(ExtractionDispatcher::new(Arc::new(NullExtractor), &config));
        LiveSession::new(StillFrames::new(frames), dispatcher, &config)
    }

    #[test]
    fn steady_document_is_captured_on_sixth_frame() {
        let mut live = session(vec![frame_with_rectangle(0); 8]);
        for frame in 0..5 {
            let outcome = live.tick().expect("tick");
            assert!(
                matches!(outcome, TickOutcome::Tracking { .. }),
                "frame {frame}: {outcome:?}"
            );
        }
        assert_eq!(live.tick().expect("tick"), TickOutcome::Captured { index: 0 });
        assert_eq!(live.tick().expect("tick"), TickOutcome::Finished);

        let page = live.store().get(0).expect("stored page");
        assert!(page.width() > 150 && page.height() > 120);
        assert!(live.dispatcher().status(0).is_some());
    }

    /// Tilted sheet shifted by a few pixels, as a hand-held camera would see it.
    fn tilted_sheet(dx: i32, dy: i32) -> RgbImage {
        let mut img = RgbImage::from_pixel(450, 500, Rgb([30, 30, 30]));
        let corners = [(120, 60), (390, 130), (320, 430), (50, 360)];
        let polygon: Vec<imageproc::point::Point<i32>> = corners
            .iter()
            .map(|&(x, y)| imageproc::point::Point::new(x + dx, y + dy))
            .collect();
        imageproc::drawing::draw_polygon_mut(&mut img, &polygon, Rgb([235, 235, 235]));
        img
    }

    #[test]
    fn jittering_tilted_sheet_is_captured_on_sixth_frame() {
        let jitter = [(0, 0), (1, 0), (2, 1), (1, 2), (0, 1), (2, 2), (1, 1)];
        let mut live = session(jitter.iter().map(|&(dx, dy)| tilted_sheet(dx, dy)).collect());
        for frame in 0..5 {
            let outcome = live.tick().expect("tick");
            assert!(
                matches!(outcome, TickOutcome::Tracking { .. }),
                "frame {frame}: {outcome:?}"
            );
        }
        assert_eq!(live.tick().expect("tick"), TickOutcome::Captured { index: 0 });

        // Opposite sides measure about 279 and 308 px.
        let (w, h) = live.store().get(0).expect("stored page").dimensions();
        assert!((270..=290).contains(&w), "width {w}");
        assert!((298..=318).contains(&h), "height {h}");
    }

    #[test]
    fn empty_frames_keep_searching_until_exhausted() {
        let mut live = session(vec![blank(), blank()]);
        assert_eq!(live.tick().expect("tick"), TickOutcome::Searching);
        assert_eq!(live.tick().expect("tick"), TickOutcome::Searching);
        assert_eq!(live.tick().expect("tick"), TickOutcome::Exhausted);
        assert!(live.store().is_empty());
    }

    #[test]
    fn movement_delays_capture() {
        let mut frames = vec![frame_with_rectangle(0); 5];
        frames.push(frame_with_rectangle(50));
        let mut live = session(frames);
        assert_eq!(live.run(10, Duration::ZERO), None);
        assert!(live.store().is_empty());
    }

    #[test]
    fn run_returns_captured_index() {
        let mut live = session(vec![frame_with_rectangle(0); 6]);
        assert_eq!(live.run(20, Duration::ZERO), Some(0));
    }

    #[test]
    fn take_picture_needs_a_frame() {
        let mut live = session(vec![blank()]);
        assert!(matches!(live.take_picture(), Err(DocseeError::NoCapture(0))));

        live.tick().expect("tick");
        assert_eq!(live.take_picture().expect("picture"), 0);
        assert_eq!(live.store().get(0).expect("page").dimensions(), (320, 240));
        assert!(live.is_finished());
    }

    #[test]
    fn next_page_captures_under_new_index() {
        let mut live = session(vec![frame_with_rectangle(0); 12]);
        assert_eq!(live.run(20, Duration::ZERO), Some(0));
        let first_id = live.id();

        live.next_page();
        assert_ne!(live.id(), first_id);
        assert_eq!(live.run(20, Duration::ZERO), Some(1));
        assert_eq!(live.store().indices(), vec![0, 1]);
    }

    #[test]
    fn manual_selection_replaces_page() {
        let mut live = session(vec![blank()]);
        live.tick().expect("tick");
        live.take_picture().expect("picture");

        // 320x240 shown at 2.5x in an 800x600 preview.
        let mut selection = ManualSelection::new((320, 240), (800, 600)).expect("layout");
        for (x, y) in [(100.0, 100.0), (600.0, 100.0), (600.0, 400.0), (100.0, 400.0)] {
            assert!(selection.click(x, y));
        }
        live.apply_manual_selection(0, &selection).expect("apply");
        assert_eq!(live.store().get(0).expect("page").dimensions(), (200, 120));
    }
}

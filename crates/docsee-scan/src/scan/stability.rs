// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporal debounce for live capture: a detection must hold still across
// several consecutive frames before it triggers an automatic capture.

use docsee_core::config::StabilityConfig;
use docsee_core::types::Quadrilateral;
use tracing::{debug, info};

/// Where the gate is in its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No document in view.
    Searching,
    /// A document is in view; counting agreeing frames.
    Accumulating,
    /// Enough agreeing frames; capture now. Terminal until [`StabilityGate::reset`].
    Confirmed,
}

/// Debounces per-frame detections for one live-capture session.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    config: StabilityConfig,
    state: GateState,
    /// Anchor the current run of matches is measured against.
    anchor: Option<Quadrilateral>,
    /// Most recent detection, handed to the rectifier on confirmation.
    latest: Option<Quadrilateral>,
    /// Consecutive frames that agreed with the anchor.
    matches: u32,
}

impl StabilityGate {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            state: GateState::Searching,
            anchor: None,
            latest: None,
            matches: 0,
        }
    }

    /// Feed one frame's detection result and return the new state.
    pub fn observe(&mut self, detection: Option<Quadrilateral>) -> GateState {
        if self.state == GateState::Confirmed {
            return self.state;
        }

        let Some(quad) = detection else {
            if self.state != GateState::Searching {
                debug!("Document lost; back to searching");
            }
            self.state = GateState::Searching;
            self.anchor = None;
            self.latest = None;
            self.matches = 0;
            return self.state;
        };

        self.latest = Some(quad);

        match self.anchor {
            None => {
                self.anchor = Some(quad);
                self.matches = 0;
                self.state = GateState::Accumulating;
            }
            Some(anchor) => {
                let drift = quad.mean_corner_distance(&anchor);
                if drift < self.config.max_mean_distance {
                    self.matches += 1;
                } else {
                    debug!(drift, "Detection moved; restarting count");
                    self.matches = 0;
                    self.anchor = Some(quad);
                }
                self.state = GateState::Accumulating;
            }
        }

        // The anchor frame itself counts toward the stable run.
        if self.matches + 1 >= self.config.stable_frames {
            info!(matches = self.matches, "Detection stable; capture confirmed");
            self.state = GateState::Confirmed;
        }

        self.state
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Consecutive matches against the anchor so far.
    pub fn matches(&self) -> u32 {
        self.matches
    }

    /// The detection that completed confirmation, if confirmed.
    pub fn confirmed_quad(&self) -> Option<Quadrilateral> {
        match self.state {
            GateState::Confirmed => self.latest,
            _ => None,
        }
    }

    /// Start a new session.
    pub fn reset(&mut self) {
        self.state = GateState::Searching;
        self.anchor = None;
        self.latest = None;
        self.matches = 0;
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(StabilityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_at(dx: f32) -> Quadrilateral {
        Quadrilateral::new([
            (10.0 + dx, 10.0),
            (200.0 + dx, 12.0),
            (205.0 + dx, 300.0),
            (8.0 + dx, 295.0),
        ])
    }

    #[test]
    fn six_identical_detections_confirm() {
        let mut gate = StabilityGate::default();
        for frame in 0..5 {
            assert_eq!(gate.observe(Some(quad_at(0.0))), GateState::Accumulating, "frame {frame}");
        }
        assert_eq!(gate.observe(Some(quad_at(0.0))), GateState::Confirmed);
        assert_eq!(gate.confirmed_quad(), Some(quad_at(0.0)));
    }

    #[test]
    fn sixth_frame_jump_resets_count() {
        let mut gate = StabilityGate::default();
        for _ in 0..5 {
            gate.observe(Some(quad_at(0.0)));
        }
        assert_eq!(gate.matches(), 4);

        let state = gate.observe(Some(quad_at(40.0)));
        assert_eq!(state, GateState::Accumulating);
        assert_eq!(gate.matches(), 0);
        assert!(gate.confirmed_quad().is_none());
    }

    #[test]
    fn small_jitter_still_counts() {
        let mut gate = StabilityGate::default();
        let jitter = [0.0, 3.0, -2.0, 5.0, 1.0, -4.0];
        let mut last = GateState::Searching;
        for dx in jitter {
            last = gate.observe(Some(quad_at(dx)));
        }
        assert_eq!(last, GateState::Confirmed);
    }

    #[test]
    fn lost_detection_returns_to_searching() {
        let mut gate = StabilityGate::default();
        gate.observe(Some(quad_at(0.0)));
        gate.observe(Some(quad_at(0.0)));
        assert_eq!(gate.matches(), 1);

        assert_eq!(gate.observe(None), GateState::Searching);
        assert_eq!(gate.matches(), 0);

        // A fresh anchor is taken on the next detection.
        assert_eq!(gate.observe(Some(quad_at(100.0))), GateState::Accumulating);
        assert_eq!(gate.matches(), 0);
    }

    #[test]
    fn confirmed_is_terminal_until_reset() {
        let mut gate = StabilityGate::default();
        for _ in 0..6 {
            gate.observe(Some(quad_at(0.0)));
        }
        assert_eq!(gate.observe(None), GateState::Confirmed);
        assert_eq!(gate.observe(Some(quad_at(80.0))), GateState::Confirmed);

        gate.reset();
        assert_eq!(gate.state(), GateState::Searching);
        assert!(gate.confirmed_quad().is_none());
    }

    #[test]
    fn single_stable_frame_config_confirms_immediately() {
        let mut gate = StabilityGate::new(StabilityConfig {
            max_mean_distance: 25.0,
            stable_frames: 1,
        });
        assert_eq!(gate.observe(Some(quad_at(0.0))), GateState::Confirmed);
    }
}

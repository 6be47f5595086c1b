use serde::Deserialize;
use std::time::Duration;

/// What the capture session is trying to accomplish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    Enrollment,
    Verification,
}

/// Knobs of the four-phase capture state machine.
///
/// Defaults implement the acquisition protocol: live detection throttled to
/// one analysed frame per 400 ms, a 500 ms continuous-ready gate, and bursts
/// bounded by 20 frames or 2 seconds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureOptions {
    pub mode: CaptureMode,
    /// Complete bursts required to finish an enrollment.
    pub enrollment_bursts: usize,
    /// Frames collected per burst before it is cut short.
    pub burst_target_frames: usize,
    /// Wall-clock bound on a burst.
    pub burst_max_ms: u64,
    /// How long quick-detect must stay `Ready` before a burst starts.
    pub ready_hold_ms: u64,
    /// Minimum spacing between analysed live-detection frames.
    pub frame_interval_ms: u64,
    /// Pause between enrollment bursts while the user repositions.
    pub reposition_pause_ms: u64,
    /// Composite quality floor for burst frame selection; `None` picks the
    /// mode default (50 verification, 60 enrollment).
    pub min_score: Option<f32>,
    /// Best frames kept per burst after sorting by composite.
    pub selection_top: usize,
    /// Maximum distance to the burst's first template before a template is
    /// discarded as inconsistent.
    pub consistency_max_distance: f32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Verification,
            enrollment_bursts: 3,
            burst_target_frames: 20,
            burst_max_ms: 2000,
            ready_hold_ms: 500,
            frame_interval_ms: 400,
            reposition_pause_ms: 2000,
            min_score: None,
            selection_top: 5,
            consistency_max_distance: 0.30,
        }
    }
}

impl CaptureOptions {
    pub fn for_mode(mode: CaptureMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Composite quality floor in effect.
    pub fn min_score(&self) -> f32 {
        self.min_score.unwrap_or(match self.mode {
            CaptureMode::Enrollment => 60.0,
            CaptureMode::Verification => 50.0,
        })
    }

    /// Templates retained from one burst.
    pub fn templates_to_keep(&self) -> usize {
        match self.mode {
            CaptureMode::Enrollment => 3,
            CaptureMode::Verification => 1,
        }
    }

    /// Diverse templates stored on an enrollment record.
    pub fn templates_to_store(&self) -> usize {
        3
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn ready_hold(&self) -> Duration {
        Duration::from_millis(self.ready_hold_ms)
    }

    pub fn burst_max(&self) -> Duration {
        Duration::from_millis(self.burst_max_ms)
    }

    pub fn reposition_pause(&self) -> Duration {
        Duration::from_millis(self.reposition_pause_ms)
    }
}

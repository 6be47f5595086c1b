//! Error taxonomy for the recognition core.
//!
//! Two tiers, matching the propagation policy: [`FrameError`] values are
//! absorbed by the capture loop (logged at debug, the loop keeps sampling),
//! while [`SessionError`] values surface to the UI layer as a single status
//! message. No panic ever crosses the frame boundary; every transform
//! returns a value or one of these errors.

use thiserror::Error;

/// Per-frame soft failures. The live-detection loop continues past these.
#[derive(Clone, Debug, Error)]
pub enum FrameError {
    /// No valid pupil/iris circle pair was found.
    #[error("segmentation failed: no valid pupil/iris pair")]
    SegmentationFailed,

    /// Iris ROI Laplacian variance below the pipeline minimum.
    #[error("sharpness too low: variance {variance:.1} < {minimum:.1}")]
    SharpnessTooLow { variance: f32, minimum: f32 },

    /// Template mask valid fraction below the encoding gate.
    #[error("encoding too noisy: valid fraction {valid_fraction:.3} < {gate:.2}")]
    EncodingTooNoisy { valid_fraction: f32, gate: f32 },

    /// Template disagrees with the burst reference template.
    #[error("inconsistent template: distance {distance:.3} to burst reference")]
    Inconsistent { distance: f32 },
}

/// Burst- and session-level failures surfaced to the UI.
#[derive(Clone, Debug, Error)]
pub enum SessionError {
    /// The whole burst produced no usable template.
    #[error("burst quality too low: no frame passed the quality gate")]
    QualityTooLow,

    /// The subject store cannot be reached.
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    /// The camera device cannot be opened or died mid-session.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
}

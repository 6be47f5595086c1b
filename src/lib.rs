#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod capture;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod repository;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
// (You can tighten or feature-gate these later.)
pub mod config;
pub mod encode;
pub mod matcher;
pub mod normalize;
pub mod preprocess;
pub mod quality;
pub mod segment;

// --- High-level re-exports -------------------------------------------------

// Main entry points: pipeline, matcher and the capture controller.
pub use crate::capture::{CaptureController, CaptureEvent, CaptureMode, CaptureOptions};
pub use crate::encode::Template;
pub use crate::matcher::{hamming_distance, match_score};
pub use crate::pipeline::{FramePipeline, PipelineOptions, ScoredFrame};
pub use crate::repository::{JsonStore, Repository, SubjectDetails, SubjectRecord};
pub use crate::types::{IrisDetectionStatus, MatchScore, MatchZone, QualityScore, Segmentation};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use iris_recognizer::prelude::*;
///
/// # fn main() {
/// let frame = GrayBuffer::new(640, 480);
/// let pipeline = FramePipeline::default();
/// let status = pipeline.quick_detect(&frame);
/// println!("status={status:?}");
/// # }
/// ```
pub mod prelude {
    pub use crate::image::GrayBuffer;
    pub use crate::matcher::hamming_distance;
    pub use crate::{FramePipeline, IrisDetectionStatus, MatchZone, Template};
}

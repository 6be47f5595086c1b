//! Live-capture subsystem.
//!
//! Overview
//! - [`CaptureController`] is a four-phase state machine (idle, live
//!   detection, burst, processing) driven by the host event loop. It owns
//!   the camera for the session and holds the frame pipeline by value.
//! - Live detection throttles quick-detect analysis to one frame per
//!   interval and requires a continuously-`Ready` status before a burst.
//! - A burst collects scored frames until the target count or deadline,
//!   then ships them to a worker thread for selection, encoding and the
//!   consistency filter.
//! - Enrollment pools templates from three bursts and stores a
//!   diversity-selected trio; verification ranks enrolled subjects by
//!   minimum template distance and reports the three-zone decision.
//!
//! Modules
//! - `controller` – the state machine.
//! - `options` – the capture protocol knobs.
//! - `selection` – pure frame/template selection and ranking helpers.
//! - `worker` – the burst-processing thread.
//! - `camera` – the camera collaborator contract and still storage.

mod camera;
mod controller;
mod options;
mod selection;
mod worker;

pub use camera::{enrollment_photo, import_still, store_capture, CameraControl};
pub use controller::{CaptureController, CaptureEvent, CapturePhase};
pub use options::{CaptureMode, CaptureOptions};
pub use selection::{
    encode_consistent, rank_candidates, select_diverse, select_frames, MatchCandidate,
};
pub use worker::{BurstOutcome, BurstWorker};

//! Worker-thread offload for burst processing.
//!
//! Selecting, encoding and consistency-filtering a burst takes well over a
//! frame budget, so it runs on a dedicated thread and reports back through
//! a channel the controller polls from its event loop. The scored frames
//! move into the worker; nothing aliases them afterwards.

use super::selection::{encode_consistent, select_frames};
use crate::encode::Template;
use crate::error::SessionError;
use crate::image::GrayBuffer;
use crate::pipeline::{FramePipeline, ScoredFrame};
use log::debug;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Result of processing one burst.
#[derive(Debug)]
pub struct BurstOutcome {
    /// Consistent templates, at most `keep`.
    pub templates: Vec<Template>,
    /// Image of the best selected frame, for the enrollment photo.
    pub best_frame: Option<GrayBuffer>,
}

pub struct BurstWorker {
    receiver: Receiver<Result<BurstOutcome, SessionError>>,
}

impl BurstWorker {
    /// Move the burst frames to a processing thread.
    pub fn spawn(
        pipeline: FramePipeline,
        frames: Vec<ScoredFrame>,
        min_score: f32,
        selection_top: usize,
        consistency_max_distance: f32,
        keep: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let outcome = process_burst(
                &pipeline,
                frames,
                min_score,
                selection_top,
                consistency_max_distance,
                keep,
            );
            // The controller may have cancelled and dropped the receiver.
            let _ = sender.send(outcome);
        });
        Self { receiver }
    }

    /// Non-blocking poll; `None` while the worker is still running.
    pub fn try_result(&mut self) -> Option<Result<BurstOutcome, SessionError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SessionError::QualityTooLow)),
        }
    }
}

fn process_burst(
    pipeline: &FramePipeline,
    frames: Vec<ScoredFrame>,
    min_score: f32,
    selection_top: usize,
    consistency_max_distance: f32,
    keep: usize,
) -> Result<BurstOutcome, SessionError> {
    let collected = frames.len();
    let selected = select_frames(frames, min_score, selection_top);
    debug!(
        "burst processing: {} of {} frames selected",
        selected.len(),
        collected
    );
    if selected.is_empty() {
        return Err(SessionError::QualityTooLow);
    }

    let templates = encode_consistent(pipeline, &selected, consistency_max_distance, keep);
    if templates.is_empty() {
        return Err(SessionError::QualityTooLow);
    }
    // `selected` is sorted best-first.
    let best_frame = selected.into_iter().next().map(|f| f.image);
    Ok(BurstOutcome {
        templates,
        best_frame,
    })
}

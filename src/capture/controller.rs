//! Four-phase capture state machine.
//!
//! ```text
//!          start               stable >=500ms, status=ready
//!   Idle ────────▶ LiveDetect ───────────────────────────▶ Burst
//!                      ▲                                    │
//!                      │ low quality / no match             │ 20 frames or 2s
//!                      └────────── Process ◀────────────────┘
//! ```
//!
//! The controller is driven from the host application's event loop: frames
//! arrive through [`CaptureController::on_frame`], worker completion is
//! observed in [`CaptureController::poll`], and UI updates are drained with
//! [`CaptureController::next_event`]. Every timestamp comes in from the
//! caller, which keeps transitions totally ordered by the loop and makes
//! the machine testable with synthetic clocks.

use super::camera::{enrollment_photo, CameraControl};
use super::options::{CaptureMode, CaptureOptions};
use super::selection::{rank_candidates, select_diverse, MatchCandidate};
use super::worker::{BurstOutcome, BurstWorker};
use crate::encode::Template;
use crate::error::SessionError;
use crate::image::GrayBuffer;
use crate::pipeline::{FramePipeline, ScoredFrame};
use crate::repository::{Repository, SubjectDetails, SubjectRecord};
use crate::types::{IrisDetectionStatus, MatchZone};
use chrono::Utc;
use log::{debug, warn};
use std::collections::VecDeque;
use std::mem;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    LiveDetect,
    Burst,
    Process,
}

/// Status messages surfaced to the UI layer.
#[derive(Clone, Debug)]
pub enum CaptureEvent {
    DetectionStatus(IrisDetectionStatus),
    BurstStarted,
    BurstProgress { collected: usize, target: usize },
    /// Shown between enrollment bursts while detection is paused.
    RepositionHint,
    EnrollmentComplete { record_id: String },
    MatchConfirmed(MatchCandidate),
    MatchSuggested(Vec<MatchCandidate>),
    /// Verification found nothing in range; the UI may offer enrollment.
    NoMatch,
    SessionFailed(String),
}

pub struct CaptureController<R: Repository, C: CameraControl> {
    options: CaptureOptions,
    pipeline: FramePipeline,
    repository: R,
    camera: C,
    docs_dir: PathBuf,

    phase: CapturePhase,
    subject: Option<SubjectDetails>,
    last_analysis: Option<Instant>,
    ready_since: Option<Instant>,
    is_analyzing: bool,
    paused_until: Option<Instant>,
    burst_started: Option<Instant>,
    burst_frames: Vec<ScoredFrame>,
    bursts_done: usize,
    template_pool: Vec<Template>,
    enrollment_photo_frame: Option<GrayBuffer>,
    worker: Option<BurstWorker>,
    events: VecDeque<CaptureEvent>,
}

impl<R: Repository, C: CameraControl> CaptureController<R, C> {
    pub fn new(
        options: CaptureOptions,
        pipeline: FramePipeline,
        repository: R,
        camera: C,
        docs_dir: PathBuf,
    ) -> Self {
        Self {
            options,
            pipeline,
            repository,
            camera,
            docs_dir,
            phase: CapturePhase::Idle,
            subject: None,
            last_analysis: None,
            ready_since: None,
            is_analyzing: false,
            paused_until: None,
            burst_started: None,
            burst_frames: Vec::new(),
            bursts_done: 0,
            template_pool: Vec::new(),
            enrollment_photo_frame: None,
            worker: None,
            events: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Begin an enrollment session for `subject`.
    pub fn start_enrollment(&mut self, subject: SubjectDetails, now: Instant) {
        self.options.mode = CaptureMode::Enrollment;
        self.subject = Some(subject);
        self.start_session(now);
    }

    /// Begin a verification session.
    pub fn start_verification(&mut self, now: Instant) {
        self.options.mode = CaptureMode::Verification;
        self.subject = None;
        self.start_session(now);
    }

    fn start_session(&mut self, _now: Instant) {
        self.reset_detection();
        self.burst_frames.clear();
        self.bursts_done = 0;
        self.template_pool.clear();
        self.enrollment_photo_frame = None;
        self.worker = None;
        self.phase = CapturePhase::LiveDetect;
        debug!("capture session started mode={:?}", self.options.mode);
    }

    /// Adopt a raw camera luma plane and feed it to the state machine.
    pub fn on_camera_frame(
        &mut self,
        width: usize,
        height: usize,
        stride: usize,
        plane: Vec<u8>,
        now: Instant,
    ) {
        self.on_frame(GrayBuffer::from_luma_plane(width, height, stride, plane), now);
    }

    /// Feed one frame. Frames are consumed in arrival order; anything the
    /// current phase cannot use is dropped (and released) here.
    pub fn on_frame(&mut self, frame: GrayBuffer, now: Instant) {
        match self.phase {
            CapturePhase::Idle | CapturePhase::Process => {}
            CapturePhase::LiveDetect => self.live_detect_frame(frame, now),
            CapturePhase::Burst => self.burst_frame(frame, now),
        }
    }

    /// Observe timers and worker completion. Call at least once per frame
    /// interval.
    pub fn poll(&mut self, now: Instant) {
        if self.phase == CapturePhase::Burst && self.burst_elapsed(now) {
            self.finish_burst(now);
        }
        if self.phase != CapturePhase::Process {
            return;
        }
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        let Some(result) = worker.try_result() else {
            return;
        };
        self.worker = None;
        match result {
            Ok(outcome) => self.on_burst_complete(outcome, now),
            Err(err) => self.on_burst_failed(err, now),
        }
    }

    /// Next pending UI update, if any.
    pub fn next_event(&mut self) -> Option<CaptureEvent> {
        self.events.pop_front()
    }

    /// The frame supplier died mid-session. Unlike burst failures this
    /// terminates the session outright.
    pub fn on_camera_lost(&mut self, reason: impl Into<String>) {
        let err = SessionError::CameraUnavailable(reason.into());
        self.events
            .push_back(CaptureEvent::SessionFailed(err.to_string()));
        self.cancel();
    }

    /// Abort the session: stop the stream, release burst frames, restore
    /// AF/AE and return to idle.
    pub fn cancel(&mut self) {
        self.camera.restore_auto();
        self.camera.stop_stream();
        self.burst_frames.clear();
        self.worker = None;
        self.subject = None;
        self.reset_detection();
        self.phase = CapturePhase::Idle;
        debug!("capture session cancelled");
    }

    fn reset_detection(&mut self) {
        self.last_analysis = None;
        self.ready_since = None;
        self.is_analyzing = false;
        self.paused_until = None;
        self.burst_started = None;
    }

    fn live_detect_frame(&mut self, frame: GrayBuffer, now: Instant) {
        if let Some(pause_end) = self.paused_until {
            if now < pause_end {
                return;
            }
            self.paused_until = None;
        }
        if self.is_analyzing {
            // Overlapping frame while one is under analysis.
            return;
        }
        if let Some(last) = self.last_analysis {
            if now.duration_since(last) < self.options.frame_interval() {
                return;
            }
        }

        self.is_analyzing = true;
        self.last_analysis = Some(now);
        let status = self.pipeline.quick_detect(&frame);
        self.is_analyzing = false;
        self.events.push_back(CaptureEvent::DetectionStatus(status));

        if status == IrisDetectionStatus::Ready {
            let since = *self.ready_since.get_or_insert(now);
            if now.duration_since(since) >= self.options.ready_hold() {
                self.enter_burst(now);
            }
        } else {
            self.ready_since = None;
        }
    }

    fn enter_burst(&mut self, now: Instant) {
        if let Err(e) = self.camera.lock_focus_exposure() {
            warn!("AF/AE lock failed, continuing unlocked: {e}");
        }
        self.phase = CapturePhase::Burst;
        self.burst_started = Some(now);
        self.burst_frames.clear();
        self.events.push_back(CaptureEvent::BurstStarted);
        debug!("burst started");
    }

    fn burst_elapsed(&self, now: Instant) -> bool {
        self.burst_started
            .map(|start| now.duration_since(start) >= self.options.burst_max())
            .unwrap_or(false)
    }

    fn burst_frame(&mut self, frame: GrayBuffer, now: Instant) {
        if self.burst_elapsed(now) {
            self.finish_burst(now);
            return;
        }
        match self.pipeline.score_frame(frame) {
            Ok(scored) => {
                self.burst_frames.push(scored);
                self.events.push_back(CaptureEvent::BurstProgress {
                    collected: self.burst_frames.len(),
                    target: self.options.burst_target_frames,
                });
            }
            Err(err) => debug!("burst frame rejected: {err}"),
        }
        if self.burst_frames.len() >= self.options.burst_target_frames || self.burst_elapsed(now) {
            self.finish_burst(now);
        }
    }

    fn finish_burst(&mut self, now: Instant) {
        self.camera.restore_auto();
        self.camera.stop_stream();
        self.burst_started = None;

        let frames = mem::take(&mut self.burst_frames);
        debug!("burst finished with {} scored frames", frames.len());
        if frames.is_empty() {
            self.on_burst_failed(SessionError::QualityTooLow, now);
            return;
        }
        self.phase = CapturePhase::Process;
        self.worker = Some(BurstWorker::spawn(
            self.pipeline.clone(),
            frames,
            self.options.min_score(),
            self.options.selection_top,
            self.options.consistency_max_distance,
            self.options.templates_to_keep(),
        ));
    }

    fn on_burst_failed(&mut self, err: SessionError, _now: Instant) {
        debug!("burst failed: {err}");
        self.events
            .push_back(CaptureEvent::SessionFailed(err.to_string()));
        // Burst-level failures restart live detection rather than ending
        // the session.
        self.reset_detection();
        self.phase = CapturePhase::LiveDetect;
    }

    fn on_burst_complete(&mut self, outcome: BurstOutcome, now: Instant) {
        match self.options.mode {
            CaptureMode::Enrollment => self.enrollment_burst_complete(outcome, now),
            CaptureMode::Verification => self.verification_burst_complete(outcome),
        }
    }

    fn enrollment_burst_complete(&mut self, outcome: BurstOutcome, now: Instant) {
        self.template_pool.extend(outcome.templates);
        if self.enrollment_photo_frame.is_none() {
            self.enrollment_photo_frame = outcome.best_frame;
        }
        self.bursts_done += 1;
        debug!(
            "enrollment burst {}/{} complete, pool={}",
            self.bursts_done,
            self.options.enrollment_bursts,
            self.template_pool.len()
        );

        if self.bursts_done < self.options.enrollment_bursts {
            self.events.push_back(CaptureEvent::RepositionHint);
            self.reset_detection();
            self.paused_until = Some(now + self.options.reposition_pause());
            self.phase = CapturePhase::LiveDetect;
            return;
        }
        self.complete_enrollment();
    }

    fn complete_enrollment(&mut self) {
        let selected = select_diverse(&self.template_pool, self.options.templates_to_store());
        if selected.is_empty() {
            self.events.push_back(CaptureEvent::SessionFailed(
                SessionError::QualityTooLow.to_string(),
            ));
            self.phase = CapturePhase::Idle;
            return;
        }

        let record_id = Uuid::new_v4().to_string();
        let photo = enrollment_photo(
            &mut self.camera,
            &self.docs_dir,
            self.enrollment_photo_frame.as_ref(),
        );
        let record = SubjectRecord::new(
            record_id.clone(),
            self.subject.take().unwrap_or_default(),
            selected,
            photo,
            Utc::now(),
        );
        match self.repository.insert(record) {
            Ok(()) => {
                self.events
                    .push_back(CaptureEvent::EnrollmentComplete { record_id });
            }
            Err(err) => {
                self.events.push_back(CaptureEvent::SessionFailed(
                    SessionError::RepositoryUnavailable(err.to_string()).to_string(),
                ));
            }
        }
        self.template_pool.clear();
        self.enrollment_photo_frame = None;
        self.phase = CapturePhase::Idle;
    }

    fn verification_burst_complete(&mut self, outcome: BurstOutcome) {
        let Some(probe) = outcome.templates.first() else {
            self.events.push_back(CaptureEvent::SessionFailed(
                SessionError::QualityTooLow.to_string(),
            ));
            self.reset_detection();
            self.phase = CapturePhase::LiveDetect;
            return;
        };

        let records = match self.repository.list_with_templates() {
            Ok(records) => records,
            Err(err) => {
                self.events.push_back(CaptureEvent::SessionFailed(
                    SessionError::RepositoryUnavailable(err.to_string()).to_string(),
                ));
                self.phase = CapturePhase::Idle;
                return;
            }
        };

        let candidates = rank_candidates(probe, &records);
        let in_range: Vec<MatchCandidate> = candidates
            .into_iter()
            .filter(|c| c.zone != MatchZone::NoMatch)
            .collect();

        match in_range.first() {
            Some(top) if top.zone == MatchZone::Confirmed => {
                debug!("verification confirmed: {} d={:.3}", top.subject_id, top.distance);
                self.events
                    .push_back(CaptureEvent::MatchConfirmed(top.clone()));
            }
            Some(_) => {
                debug!("verification suggested: {} candidates", in_range.len());
                self.events.push_back(CaptureEvent::MatchSuggested(in_range));
            }
            None => {
                debug!("verification found no candidate in range");
                self.events.push_back(CaptureEvent::NoMatch);
            }
        }
        self.phase = CapturePhase::Idle;
    }
}

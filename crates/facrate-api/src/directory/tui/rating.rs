//! Rating dialog state and the review submit worker

use crate::directory::{Faculty, FacultyId, RatingAxis, RatingScores, ReviewSubmission, Score};
use crate::store::FacultyStore;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingPhase {
    Editing,
    Submitting,
}

/// Scores being edited for one faculty member
#[derive(Debug, Clone)]
pub struct RatingForm {
    pub faculty: Faculty,
    pub scores: RatingScores,
    pub axis: RatingAxis,
    pub phase: RatingPhase,
}

/// Closed, open for editing, or waiting on a submit. At most one is open.
#[derive(Debug, Default)]
pub struct RatingDialog {
    form: Option<RatingForm>,
}

impl RatingDialog {
    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(
            self.form,
            Some(RatingForm {
                phase: RatingPhase::Submitting,
                ..
            })
        )
    }

    pub fn form(&self) -> Option<&RatingForm> {
        self.form.as_ref()
    }

    /// Open for `faculty` with every score at the default. Refused while
    /// another dialog is open.
    pub fn open(&mut self, faculty: Faculty) -> bool {
        if self.form.is_some() {
            return false;
        }
        self.form = Some(RatingForm {
            faculty,
            scores: RatingScores::default(),
            axis: RatingAxis::Teaching,
            phase: RatingPhase::Editing,
        });
        true
    }

    /// Dismiss without sending. Ignored once a submit is in flight.
    pub fn cancel(&mut self) -> bool {
        if self.editing().is_none() {
            return false;
        }
        self.form = None;
        true
    }

    fn editing(&mut self) -> Option<&mut RatingForm> {
        self.form
            .as_mut()
            .filter(|f| f.phase == RatingPhase::Editing)
    }

    pub fn next_axis(&mut self) {
        if let Some(form) = self.editing() {
            form.axis = form.axis.next();
        }
    }

    pub fn prev_axis(&mut self) {
        if let Some(form) = self.editing() {
            form.axis = form.axis.prev();
        }
    }

    pub fn increment(&mut self) {
        if let Some(form) = self.editing() {
            let score = form.scores.get(form.axis).increment();
            form.scores.set(form.axis, score);
        }
    }

    pub fn decrement(&mut self) {
        if let Some(form) = self.editing() {
            let score = form.scores.get(form.axis).decrement();
            form.scores.set(form.axis, score);
        }
    }

    /// Set the selected axis, clamping into range
    pub fn set_score(&mut self, value: i64) {
        if let Some(form) = self.editing() {
            form.scores.set(form.axis, Score::new(value));
        }
    }

    pub fn set_axis_score(&mut self, axis: RatingAxis, value: i64) {
        if let Some(form) = self.editing() {
            form.scores.set(axis, Score::new(value));
        }
    }

    /// Move to submitting and hand back the review to send. Returns None when
    /// closed or already submitting, so one dialog yields at most one insert.
    pub fn submit(&mut self) -> Option<ReviewSubmission> {
        let form = self.editing()?;
        form.phase = RatingPhase::Submitting;
        Some(ReviewSubmission::new(form.faculty.id.clone(), form.scores))
    }

    /// The in-flight submit finished; dismiss the dialog
    pub fn complete(&mut self) -> bool {
        if !self.is_submitting() {
            return false;
        }
        self.form = None;
        true
    }
}

/// Outcome of one insert
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub faculty_id: FacultyId,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Spawn the review submit worker thread.
///
/// Requests are never coalesced: every review handed over is inserted.
pub fn spawn_submit_worker(
    store: Arc<dyn FacultyStore>,
    review_rx: Receiver<ReviewSubmission>,
    outcome_tx: Sender<SubmitOutcome>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(review) = review_rx.recv() {
            let start = Instant::now();
            let error = match store.insert_review(&review) {
                Ok(()) => None,
                Err(e) => {
                    log::warn!("Submit worker: {}", e);
                    Some(e.to_string())
                }
            };

            if outcome_tx
                .send(SubmitOutcome {
                    faculty_id: review.faculty_id,
                    error,
                    duration: start.elapsed(),
                })
                .is_err()
            {
                break;
            }
        }
    })
}

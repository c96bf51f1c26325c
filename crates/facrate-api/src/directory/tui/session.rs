//! Search and rating state wired to their worker threads

use super::rating::{RatingDialog, SubmitOutcome, spawn_submit_worker};
use super::search::{
    SEARCH_DEBOUNCE, SearchController, SearchQuery, SearchResults, spawn_search_worker,
};
use crate::directory::{Faculty, ReviewSubmission};
use crate::store::FacultyStore;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// Shown after every finished submit, successful or not
pub const SUBMITTED_NOTICE: &str = "Review Submitted! Rating will update shortly.";

/// What changed during one `tick`
#[derive(Debug, Default)]
pub struct TickEvents {
    pub results_changed: bool,
    pub submitted: Option<SubmitOutcome>,
}

pub struct Session {
    pub search: SearchController,
    pub rating: RatingDialog,
    query_tx: Sender<SearchQuery>,
    result_rx: Receiver<SearchResults>,
    review_tx: Sender<ReviewSubmission>,
    outcome_rx: Receiver<SubmitOutcome>,
}

impl Session {
    pub fn new(store: Arc<dyn FacultyStore>) -> Self {
        Self::with_debounce(store, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(store: Arc<dyn FacultyStore>, debounce: Duration) -> Self {
        let (query_tx, query_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        spawn_search_worker(store.clone(), query_rx, result_tx);

        let (review_tx, review_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        spawn_submit_worker(store, review_rx, outcome_tx);

        Self {
            search: SearchController::new(debounce),
            rating: RatingDialog::default(),
            query_tx,
            result_rx,
            review_tx,
            outcome_rx,
        }
    }

    pub fn query(&self) -> &str {
        self.search.query()
    }

    pub fn edit_query(&mut self, text: &str, now: Instant) {
        self.search.set_query(text, now);
    }

    pub fn open_rating(&mut self, faculty: Faculty) -> bool {
        self.rating.open(faculty)
    }

    pub fn cancel_rating(&mut self) -> bool {
        self.rating.cancel()
    }

    /// Hand the dialog's review to the submit worker
    pub fn submit_rating(&mut self) -> bool {
        let Some(review) = self.rating.submit() else {
            return false;
        };
        log::info!("Submitting review for faculty {}", review.faculty_id);
        if self.review_tx.send(review).is_err() {
            log::error!("Submit worker is gone; dropping review");
            self.rating.complete();
            return false;
        }
        true
    }

    /// Send a due search and apply whatever the workers finished
    pub fn tick(&mut self, now: Instant) -> TickEvents {
        let mut events = TickEvents::default();

        if let Some(query) = self.search.poll_due(now) {
            self.send_query(query);
        }

        while let Ok(results) = self.result_rx.try_recv() {
            if self.search.apply(results) {
                events.results_changed = true;
            }
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(err) = &outcome.error {
                log::error!(
                    "Review for faculty {} was not stored: {}",
                    outcome.faculty_id,
                    err
                );
            } else {
                log::info!(
                    "Review for faculty {} stored in {:?}",
                    outcome.faculty_id,
                    outcome.duration
                );
            }

            self.rating.complete();
            if let Some(query) = self.search.refresh(now) {
                self.send_query(query);
            }
            events.submitted = Some(outcome);
        }

        events
    }

    fn send_query(&self, query: SearchQuery) {
        log::debug!("Searching faculty for {:?} (#{})", query.text, query.id);
        if self.query_tx.send(query).is_err() {
            log::error!("Search worker is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{FacultyId, RatingAxis, Score};
    use crate::store::StoreError;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Default)]
    struct RecordingStore {
        rows: Vec<Faculty>,
        fail_search: bool,
        fail_insert: bool,
        searches: Mutex<Vec<String>>,
        inserts: Mutex<Vec<ReviewSubmission>>,
    }

    impl RecordingStore {
        fn searches(&self) -> Vec<String> {
            self.searches.lock().unwrap().clone()
        }

        fn inserts(&self) -> Vec<ReviewSubmission> {
            self.inserts.lock().unwrap().clone()
        }
    }

    impl FacultyStore for RecordingStore {
        fn search_faculty(&self, query: &str) -> Result<Vec<Faculty>, StoreError> {
            self.searches.lock().unwrap().push(query.to_string());
            if self.fail_search {
                return Err(StoreError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "boom".into(),
                });
            }
            Ok(self.rows.clone())
        }

        fn insert_review(&self, review: &ReviewSubmission) -> Result<(), StoreError> {
            self.inserts.lock().unwrap().push(review.clone());
            if self.fail_insert {
                return Err(StoreError::Status {
                    status: StatusCode::CONFLICT,
                    message: "violates foreign key constraint".into(),
                });
            }
            Ok(())
        }
    }

    fn rows() -> Vec<Faculty> {
        serde_json::from_value(json!([
            {"id": 11, "name": "Sanat Jain", "cabin": "SJT 313-A", "mobile": "98"},
            {"id": 12, "name": "Reena Jain", "cabin": "TT 101", "teaching_rating": 4.5}
        ]))
        .unwrap()
    }

    /// Tick until `done` holds or two seconds pass
    fn tick_until(
        session: &mut Session,
        now: Instant,
        mut done: impl FnMut(&Session, &TickEvents) -> bool,
    ) -> TickEvents {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let events = session.tick(now);
            if done(session, &events) || Instant::now() > deadline {
                return events;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn searched(session: &mut Session, text: &str, now: Instant) {
        session.edit_query(text, now);
        tick_until(session, now + SEARCH_DEBOUNCE, |s, _| s.search.has_settled());
    }

    #[test]
    fn test_search_populates_results_in_order() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            ..Default::default()
        });
        let mut session = Session::new(store.clone());
        let t0 = Instant::now();

        searched(&mut session, "Jain", t0);

        assert_eq!(store.searches(), vec!["Jain"]);
        let names: Vec<_> = session.search.results().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Sanat Jain", "Reena Jain"]);
        assert!(!session.search.is_loading());
    }

    #[test]
    fn test_search_failure_shows_empty_list() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            fail_search: true,
            ..Default::default()
        });
        let mut session = Session::new(store.clone());

        searched(&mut session, "Jain", Instant::now());

        assert_eq!(store.searches().len(), 1);
        assert!(session.search.results().is_empty());
        assert!(!session.search.is_loading());
    }

    #[test]
    fn test_empty_query_never_reaches_store() {
        let store = Arc::new(RecordingStore::default());
        let mut session = Session::new(store.clone());
        let t0 = Instant::now();

        session.edit_query("", t0);
        session.tick(t0 + Duration::from_secs(5));
        thread::sleep(Duration::from_millis(50));
        session.tick(t0 + Duration::from_secs(5));

        assert!(store.searches().is_empty());
    }

    #[test]
    fn test_submit_inserts_once_and_refreshes_query() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            ..Default::default()
        });
        let mut session = Session::new(store.clone());
        let t0 = Instant::now();
        searched(&mut session, "Jain", t0);

        let target = session.search.results()[0].clone();
        assert!(session.open_rating(target));
        session.rating.set_axis_score(RatingAxis::Teaching, 3);
        session.rating.set_axis_score(RatingAxis::Grading, 4);
        assert!(session.submit_rating());
        assert!(!session.submit_rating());

        let later = t0 + Duration::from_secs(3);
        let events = tick_until(&mut session, later, |_, e| e.submitted.is_some());
        let outcome = events.submitted.unwrap();
        assert!(outcome.error.is_none());
        assert!(!session.rating.is_open());

        tick_until(&mut session, later, |s, _| !s.search.is_loading());

        assert_eq!(
            store.inserts(),
            vec![ReviewSubmission {
                faculty_id: FacultyId::new(11),
                teaching: Score::new(3),
                grading: Score::new(4),
                behavior: Score::new(5),
            }]
        );
        assert_eq!(store.searches(), vec!["Jain", "Jain"]);
    }

    #[test]
    fn test_submit_with_cleared_query_does_not_search() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            ..Default::default()
        });
        let mut session = Session::new(store.clone());
        let t0 = Instant::now();
        searched(&mut session, "Jain", t0);

        let target = session.search.results()[1].clone();
        session.open_rating(target);
        session.edit_query("", t0 + Duration::from_secs(1));
        assert!(session.submit_rating());

        let later = t0 + Duration::from_secs(3);
        tick_until(&mut session, later, |_, e| e.submitted.is_some());
        thread::sleep(Duration::from_millis(50));
        session.tick(later);

        assert_eq!(store.inserts().len(), 1);
        assert_eq!(store.searches(), vec!["Jain"]);
        assert!(!session.search.is_loading());
    }

    #[test]
    fn test_failed_submit_still_dismisses_and_refreshes() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            fail_insert: true,
            ..Default::default()
        });
        let mut session = Session::new(store.clone());
        let t0 = Instant::now();
        searched(&mut session, "Jain", t0);

        session.open_rating(session.search.results()[0].clone());
        session.submit_rating();

        let later = t0 + Duration::from_secs(3);
        let events = tick_until(&mut session, later, |_, e| e.submitted.is_some());
        assert!(events.submitted.unwrap().error.is_some());
        assert!(!session.rating.is_open());

        tick_until(&mut session, later, |s, _| !s.search.is_loading());
        assert_eq!(store.searches().len(), 2);
    }

    #[test]
    fn test_cancel_sends_no_review() {
        let store = Arc::new(RecordingStore {
            rows: rows(),
            ..Default::default()
        });
        let mut session = Session::new(store.clone());
        searched(&mut session, "Jain", Instant::now());

        session.open_rating(session.search.results()[0].clone());
        assert!(session.cancel_rating());
        assert!(!session.submit_rating());

        thread::sleep(Duration::from_millis(50));
        session.tick(Instant::now());
        assert!(store.inserts().is_empty());
    }
}

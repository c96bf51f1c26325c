//! Debounced faculty search and its background worker thread

use crate::directory::Faculty;
use crate::store::FacultyStore;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Quiet period after the last keystroke before a search is sent
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Formatted display of one faculty row (result card)
pub struct FacultyCard {
    pub name: String,
    pub rating: String,
    pub is_rated: bool,
    pub cabin: String,
    pub mobile: String,
}

impl FacultyCard {
    pub fn from_faculty(faculty: &Faculty) -> Self {
        Self {
            name: faculty.name.clone(),
            rating: faculty.rating_display(),
            is_rated: faculty.rating_display() != "New",
            cabin: if faculty.cabin.trim().is_empty() {
                "-".to_string()
            } else {
                faculty.cabin.clone()
            },
            mobile: faculty.mobile_display().to_string(),
        }
    }

    /// Render to ratatui Lines for TUI
    pub fn to_tui_lines(
        &self,
        is_selected: bool,
        base_style: ratatui::style::Style,
        prefix_style: ratatui::style::Style,
        accent: ratatui::style::Color,
    ) -> Vec<ratatui::text::Line<'static>> {
        use ratatui::style::{Color, Modifier};
        use ratatui::text::{Line, Span};

        let prefix = if is_selected { "▌" } else { " " };

        // Line 1: name + rating badge
        let name_style = if is_selected {
            base_style.fg(accent).add_modifier(Modifier::BOLD)
        } else {
            base_style.add_modifier(Modifier::BOLD)
        };
        let badge_style = if self.is_rated {
            base_style.fg(Color::Yellow)
        } else {
            base_style.fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
        };

        let line1 = Line::from(vec![
            Span::styled(prefix.to_string(), prefix_style),
            Span::styled(" ".to_string(), base_style),
            Span::styled(self.name.clone(), name_style),
            Span::styled("  ".to_string(), base_style),
            Span::styled(format!("★ {}", self.rating), badge_style),
        ]);

        // Line 2: cabin · mobile
        let line2 = Line::from(vec![
            Span::styled(prefix.to_string(), prefix_style),
            Span::styled("   ".to_string(), base_style),
            Span::styled(format!("Cabin {}", self.cabin), base_style.fg(Color::Gray)),
            Span::styled(" · ".to_string(), base_style.fg(Color::DarkGray)),
            Span::styled(
                format!("Mobile {}", self.mobile),
                base_style.fg(Color::DarkGray),
            ),
        ]);

        vec![line1, line2]
    }
}

/// Query sent to the worker thread
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub id: u64,
    pub text: String,
}

/// Results from the worker thread
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub query_id: u64,
    pub faculty: Vec<Faculty>,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Search state driven by keystrokes and worker replies.
///
/// Every dispatched query gets a new id; only a reply carrying the latest id
/// is applied. Clearing the query also advances the id so that an in-flight
/// reply can never repopulate an empty search.
pub struct SearchController {
    query: String,
    debounce: Duration,
    last_edit: Option<Instant>,
    query_counter: u64,
    faculty: Vec<Faculty>,
    loading_since: Option<Instant>,
    last_duration: Option<Duration>,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            query: String::new(),
            debounce,
            last_edit: None,
            query_counter: 0,
            faculty: Vec::new(),
            loading_since: None,
            last_duration: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Faculty] {
        &self.faculty
    }

    pub fn is_loading(&self) -> bool {
        self.loading_since.is_some()
    }

    /// When the in-flight search was sent (drives the spinner)
    pub fn loading_since(&self) -> Option<Instant> {
        self.loading_since
    }

    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    /// True once a search for the current query has completed
    pub fn has_settled(&self) -> bool {
        !self.query.is_empty() && self.last_edit.is_none() && !self.is_loading()
    }

    /// Record a new query value. An empty query clears results immediately;
    /// anything else (re)starts the quiet period.
    pub fn set_query(&mut self, text: &str, now: Instant) {
        if text == self.query {
            return;
        }
        self.query = text.to_string();

        if self.query.is_empty() {
            self.last_edit = None;
            self.faculty.clear();
            self.last_duration = None;
            self.query_counter += 1;
            self.loading_since = None;
        } else {
            self.last_edit = Some(now);
        }
    }

    /// Query to send if the quiet period has elapsed since the last edit
    pub fn poll_due(&mut self, now: Instant) -> Option<SearchQuery> {
        let last_edit = self.last_edit?;
        if now.duration_since(last_edit) < self.debounce {
            return None;
        }
        self.last_edit = None;
        Some(self.dispatch(now))
    }

    /// Re-issue the current query right away (no-op when empty)
    pub fn refresh(&mut self, now: Instant) -> Option<SearchQuery> {
        if self.query.is_empty() {
            return None;
        }
        self.last_edit = None;
        Some(self.dispatch(now))
    }

    fn dispatch(&mut self, now: Instant) -> SearchQuery {
        self.query_counter += 1;
        self.loading_since = Some(now);
        SearchQuery {
            id: self.query_counter,
            text: self.query.clone(),
        }
    }

    /// Apply a worker reply. Returns false when the reply is stale.
    pub fn apply(&mut self, results: SearchResults) -> bool {
        if results.query_id != self.query_counter {
            log::debug!(
                "Dropping stale search results {} (latest {})",
                results.query_id,
                self.query_counter
            );
            return false;
        }

        self.loading_since = None;
        self.last_duration = Some(results.duration);
        match results.error {
            Some(err) => {
                log::error!("Faculty search for {:?} failed: {}", self.query, err);
                self.faculty.clear();
            }
            None => self.faculty = results.faculty,
        }
        true
    }
}

/// Spawn the search worker thread
pub fn spawn_search_worker(
    store: Arc<dyn FacultyStore>,
    query_rx: Receiver<SearchQuery>,
    result_tx: Sender<SearchResults>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(mut query) = query_rx.recv() {
            // Drain pending queries, keep only the latest
            while let Ok(next) = query_rx.try_recv() {
                query = next;
            }

            let start = Instant::now();
            let (faculty, error) = match store.search_faculty(&query.text) {
                Ok(rows) => (rows, None),
                Err(e) => {
                    log::warn!("Search worker: {}", e);
                    (Vec::new(), Some(e.to_string()))
                }
            };
            let duration = start.elapsed();

            if result_tx
                .send(SearchResults {
                    query_id: query.id,
                    faculty,
                    error,
                    duration,
                })
                .is_err()
            {
                break;
            }
        }
    })
}

//! Main application state and event loop

use super::session::{SUBMITTED_NOTICE, Session, TickEvents};
use super::ui;
use crate::directory::Faculty;
use crate::store::FacultyStore;
use anyhow::{Context, Result};
use crossterm::{
    cursor::SetCursorStyle,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, widgets::ListState};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Suggested names shown while the search box is empty
pub const TRENDING: [&str; 4] = ["Sanat Jain", "Praveen Lalwani", "Reena Jain", "Anant Kant"];

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Single-line text input. `cursor` counts characters, not bytes.
#[derive(Default, Clone)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

impl TextInput {
    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_at(self.cursor);
            self.text.remove(at);
        }
    }

    /// Remove the word (and any spaces after it) before the cursor
    pub fn delete_word_before(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut start = self.cursor;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        let (from, to) = (self.byte_at(start), self.byte_at(self.cursor));
        self.text.drain(from..to);
        self.cursor = start;
    }

    /// Handle an editing key, returns true if the text or cursor changed
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let alt = modifiers.contains(KeyModifiers::ALT);

        match code {
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('w') if ctrl => self.delete_word_before(),
            KeyCode::Backspace if alt => self.delete_word_before(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.char_len(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_len(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_len()),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(c) if !ctrl && !alt => self.insert_char(c),
            _ => return false,
        }
        true
    }
}

/// Toast notification state
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Colour scheme; dark is the startup default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

pub struct App {
    /// Search and rating state plus their workers
    pub session: Session,
    /// Search input
    pub search_input: TextInput,
    /// Selection within the result list
    pub list_state: ListState,
    /// Highlighted trending suggestion (empty query only)
    pub trending_index: usize,
    pub theme: Theme,
    pub toast: Option<Toast>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: Arc<dyn FacultyStore>) -> Self {
        Self::with_session(Session::new(store))
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            search_input: TextInput::default(),
            list_state: ListState::default(),
            trending_index: 0,
            theme: Theme::default(),
            toast: None,
            should_quit: false,
        }
    }

    /// Selected faculty, if results are on screen
    pub fn selected_faculty(&self) -> Option<&Faculty> {
        if self.session.search.is_loading() {
            return None;
        }
        self.session
            .search
            .results()
            .get(self.list_state.selected()?)
    }

    fn sync_query(&mut self, now: Instant) {
        let text = self.search_input.text.clone();
        self.session.edit_query(&text, now);
        if text.is_empty() {
            self.list_state.select(None);
        }
    }

    fn select_prev(&mut self) {
        if self.session.query().is_empty() {
            self.trending_index = self.trending_index.saturating_sub(1);
        } else if let Some(i) = self.list_state.selected() {
            self.list_state.select(Some(i.saturating_sub(1)));
        }
    }

    fn select_next(&mut self) {
        if self.session.query().is_empty() {
            self.trending_index = (self.trending_index + 1).min(TRENDING.len() - 1);
            return;
        }
        let count = self.session.search.results().len();
        if count == 0 {
            return;
        }
        let next = self.list_state.selected().map_or(0, |i| (i + 1).min(count - 1));
        self.list_state.select(Some(next));
    }

    /// Enter on the main screen: pick a suggestion or rate the selection
    fn activate(&mut self, now: Instant) {
        if self.session.query().is_empty() {
            self.search_input.set(TRENDING[self.trending_index]);
            self.sync_query(now);
            return;
        }
        if let Some(faculty) = self.selected_faculty().cloned() {
            log::debug!("Opening rating dialog for {}", faculty.name);
            self.session.open_rating(faculty);
        }
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.session.rating.is_open() {
            self.handle_rating_key(key.code, key.modifiers);
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Esc, _) => {
                if self.search_input.text.is_empty() {
                    self.should_quit = true;
                } else {
                    self.search_input.clear();
                    self.sync_query(now);
                }
            }
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => self.theme = self.theme.toggle(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::CONTROL) => self.select_prev(),
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::CONTROL) => {
                self.select_next()
            }
            (KeyCode::Enter, _) => self.activate(now),
            _ => {
                if self.search_input.handle_key(key.code, key.modifiers) {
                    self.sync_query(now);
                }
            }
        }
    }

    fn handle_rating_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let rating = &mut self.session.rating;
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Esc, _) => {
                rating.cancel();
            }
            (KeyCode::Up, _) | (KeyCode::BackTab, _) => rating.prev_axis(),
            (KeyCode::Down, _) | (KeyCode::Tab, _) => rating.next_axis(),
            (KeyCode::Left, _) | (KeyCode::Char('-'), _) => rating.decrement(),
            (KeyCode::Right, _) | (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                rating.increment()
            }
            (KeyCode::Char(c @ '1'..='5'), _) => rating.set_score((c as u8 - b'0') as i64),
            (KeyCode::Enter, _) => {
                self.session.submit_rating();
            }
            _ => {}
        }
    }

    /// Advance timers and apply worker replies
    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }

        let TickEvents {
            results_changed,
            submitted,
        } = self.session.tick(now);

        if results_changed {
            let selection = (!self.session.search.results().is_empty()).then_some(0);
            self.list_state.select(selection);
        }
        if submitted.is_some() {
            self.toast = Some(Toast::new(SUBMITTED_NOTICE, TOAST_DURATION));
        }
    }
}

/// Run the TUI application against `store`
pub fn run(store: Arc<dyn FacultyStore>) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::BlinkingBar)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store);
    log::info!("Terminal UI started");

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        SetCursorStyle::DefaultUserShape
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // ~60Hz
    const FRAME_TIME: Duration = Duration::from_micros(16_667);

    loop {
        let frame_start = Instant::now();

        // Drain all pending events first (lowest latency for input)
        let mut events_processed = 0usize;
        while event::poll(Duration::ZERO)? && events_processed < 100 {
            app.handle_event(event::read()?, Instant::now());
            events_processed += 1;
            if app.should_quit {
                break;
            }
        }

        if app.should_quit {
            break;
        }

        app.tick(Instant::now());

        terminal.draw(|f| ui::render(f, app))?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

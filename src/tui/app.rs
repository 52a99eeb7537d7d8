use std::time::{Duration, Instant};

use ratatui::widgets::TableState;

use crate::session::{Notice, Session};
use crate::view::Row;

const TICK: Duration = Duration::from_secs(1);

/// A message box shown over the main view until dismissed.
pub struct Popup {
    pub title: String,
    pub message: String,
}

impl From<Notice> for Popup {
    fn from(notice: Notice) -> Popup {
        match notice {
            Notice::PomodoroDone(name) => Popup {
                title: "POMODORO".to_string(),
                message: format!("Pomodoro complete for: {}", name),
            },
            Notice::DueToday(name) => Popup {
                title: "TASK DUE TODAY".to_string(),
                message: format!("{} is due today.", name),
            },
        }
    }
}

pub struct App {
    pub session: Session,
    /// Selected display row (including category headers).
    pub state: TableState,
    pub input_buffer: String,
    pub popup: Option<Popup>,
    pub should_quit: bool,
    last_tick: Instant,
}

impl App {
    pub fn new(mut session: Session) -> App {
        let popup = session.check_reminders().map(Popup::from);
        let mut app = App {
            session,
            state: TableState::default(),
            input_buffer: String::new(),
            popup,
            should_quit: false,
            last_tick: Instant::now(),
        };
        app.clamp_selection();
        app
    }

    /// Runs the entered command line and clears the buffer.
    pub fn submit(&mut self) {
        let line = std::mem::take(&mut self.input_buffer);
        self.run(&line);
    }

    pub fn run(&mut self, line: &str) {
        self.session.execute(line);
        self.clamp_selection();
    }

    /// Completes the task under the cursor, if the cursor is on a task row.
    pub fn complete_selected(&mut self) {
        if let Some(number) = self.selected_number() {
            self.run(&format!("complete {}", number));
        }
    }

    /// Puts `update N ` for the selected task in the input line.
    pub fn edit_selected(&mut self) {
        if let Some(number) = self.selected_number() {
            self.input_buffer = format!("update {} ", number);
        }
    }

    pub fn selected_number(&self) -> Option<usize> {
        let rows = self.session.rows();
        match rows.get(self.state.selected()?) {
            Some(Row::Task { number, .. }) => Some(*number),
            _ => None,
        }
    }

    /// Selects the next row.
    pub fn next(&mut self) {
        let len = self.session.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous row.
    pub fn previous(&mut self) {
        let len = self.session.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Called from the event loop; ticks the session once per second.
    pub fn on_tick(&mut self) {
        self.advance(Instant::now());
    }

    /// Ticks the session by the whole seconds elapsed up to `now`. The
    /// remainder carries over to the next call.
    pub fn advance(&mut self, now: Instant) {
        let secs = now.saturating_duration_since(self.last_tick).as_secs();
        if secs == 0 {
            return;
        }
        self.last_tick += TICK * secs as u32;
        for notice in self.session.tick(secs) {
            self.popup = Some(Popup::from(notice));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.rows().len();
        if len == 0 {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= len {
                self.state.select(Some(len - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }
}

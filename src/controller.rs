//! Application controller.
//!
//! This module orchestrates the main application loop:
//! - Terminal initialization and cleanup
//! - Draining finished backend requests into the state
//! - Event polling and handling
//! - Handing submitted requests to the dispatcher
//!
//! The loop is the single owner of `AppState`; worker threads only ever
//! talk back through the dispatcher's channel.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::backend::Dispatcher;
use crate::event::{apply_action, handle_event, poll_event};
use crate::model::AppState;
use crate::ui::render;

/// The main application controller.
pub struct App {
    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state
    state: AppState,
    /// Runs backend requests off the event loop
    dispatcher: Dispatcher,
    /// Event poll timeout
    tick_rate: Duration,
}

impl App {
    /// Creates a new application with the given state.
    pub fn new(state: AppState, dispatcher: Dispatcher) -> Result<Self> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            state,
            dispatcher,
            tick_rate: Duration::from_millis(80),
        })
    }

    /// Runs the main application loop.
    pub fn run(&mut self) -> Result<()> {
        info!("session started");

        loop {
            while let Some(response) = self.dispatcher.try_next() {
                self.state.receive(response);
            }

            // Render
            self.terminal.draw(|frame| {
                render(frame, &self.state);
            })?;

            // Handle events
            match poll_event(self.tick_rate) {
                Some(event) => {
                    let action = handle_event(event, self.state.mode());
                    if let Some(request) = apply_action(&mut self.state, action) {
                        self.dispatcher.issue(request);
                    }

                    if self.state.should_quit {
                        break;
                    }
                }
                None => self.state.advance_tick(),
            }
        }

        info!("session ended");
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Convenience function to run the application.
pub fn run_app(state: AppState, dispatcher: Dispatcher) -> Result<()> {
    let mut app = App::new(state, dispatcher)?;
    app.run()
}

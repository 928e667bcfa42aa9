//! Keyboard event handling.
//!
//! Input form:
//! - `Tab` / `Shift+Tab`: cycle focus (format, text, file)
//! - typing or pasting: edit the text box
//! - `Enter` on the file field: open the file browser
//! - `Backspace` on the file field: clear the selected path
//! - `Space` on the format toggle, or `Ctrl+T` anywhere: switch FASTQ/FASTA
//! - `Ctrl+S`: submit
//! - `Ctrl+L`: clear both inputs
//! - `Ctrl+C` / `Ctrl+Q`: quit
//!
//! Results overlay:
//! - `j`/`k`: move between records
//! - `Enter`/`Space`: expand or collapse the selected record
//! - `s`: save results as JSON
//! - `r`: retry a failed request
//! - `Esc`/`q`: dismiss
//!
//! File browser: `j`/`k` move, `Enter`/`l` open, `Backspace`/`h` parent, `Esc` cancel.
//! Validation notice: any key dismisses.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::dispatch::DispatchedRequest;
use crate::model::{AppState, Focus, UiMode};

/// Actions that can be triggered by keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action (key not recognized)
    None,
    /// Quit the application
    Quit,
    /// Move focus to the next input widget
    FocusNext,
    /// Move focus to the previous input widget
    FocusPrevious,
    /// Switch between FASTQ and FASTA
    ToggleFormat,
    /// Append text to the text box (typed character, newline or paste)
    InsertText(String),
    /// Delete the last character of the text box
    DeleteChar,
    /// Clear the file path
    ClearFilePath,
    /// Open the file browser
    OpenBrowser,
    /// Submit the input for analysis
    Submit,
    /// Clear both inputs
    ClearInput,
    /// Dismiss the validation notice
    DismissNotice,
    /// Dismiss the results overlay
    DismissOverlay,
    /// Select the next result panel
    PanelNext,
    /// Select the previous result panel
    PanelPrevious,
    /// Expand or collapse the selected result panel
    TogglePanel,
    /// Re-submit after a failure
    Retry,
    /// Save the loaded results
    ExportResults,
    /// File browser: move selection up
    BrowserUp,
    /// File browser: move selection down
    BrowserDown,
    /// File browser: open directory or pick file
    BrowserEnter,
    /// File browser: go to parent directory
    BrowserParent,
    /// File browser: close without picking
    BrowserCancel,
    /// Resize event (terminal resized)
    Resize(u16, u16),
}

/// Polls for terminal events with a timeout.
///
/// Returns `None` if no event occurred within the timeout.
pub fn poll_event(timeout: Duration) -> Option<Event> {
    if event::poll(timeout).ok()? {
        event::read().ok()
    } else {
        None
    }
}

/// Converts a crossterm event to an Action based on the current UI mode.
pub fn handle_event(event: Event, mode: UiMode) -> Action {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            handle_key_event(key_event, mode)
        }
        Event::Paste(text) => match mode {
            UiMode::Input(Focus::Text) => Action::InsertText(text),
            _ => Action::None,
        },
        Event::Resize(width, height) => Action::Resize(width, height),
        _ => Action::None,
    }
}

/// Handles a key event based on the current UI mode.
fn handle_key_event(key: KeyEvent, mode: UiMode) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }

    match mode {
        // Any key dismisses the notice
        UiMode::Notice => Action::DismissNotice,
        UiMode::Browser => handle_browser_mode(key),
        UiMode::Overlay => handle_overlay_mode(key),
        UiMode::Input(focus) => handle_input_mode(key, focus),
    }
}

/// Handles key events on the input form.
fn handle_input_mode(key: KeyEvent, focus: Focus) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('s') => Action::Submit,
            KeyCode::Char('l') => Action::ClearInput,
            KeyCode::Char('t') => Action::ToggleFormat,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Tab => return Action::FocusNext,
        KeyCode::BackTab => return Action::FocusPrevious,
        _ => {}
    }

    match focus {
        Focus::Format => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Left | KeyCode::Right => {
                Action::ToggleFormat
            }
            _ => Action::None,
        },
        Focus::Text => match key.code {
            KeyCode::Char(c) => Action::InsertText(c.to_string()),
            KeyCode::Enter => Action::InsertText("\n".to_string()),
            KeyCode::Backspace => Action::DeleteChar,
            _ => Action::None,
        },
        Focus::File => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => Action::OpenBrowser,
            KeyCode::Backspace | KeyCode::Delete => Action::ClearFilePath,
            _ => Action::None,
        },
    }
}

/// Handles key events while the results overlay is shown.
fn handle_overlay_mode(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Action::DismissOverlay,
        KeyCode::Char('j') | KeyCode::Down => Action::PanelNext,
        KeyCode::Char('k') | KeyCode::Up => Action::PanelPrevious,
        KeyCode::Enter | KeyCode::Char(' ') => Action::TogglePanel,
        KeyCode::Char('r') => Action::Retry,
        KeyCode::Char('s') => Action::ExportResults,
        _ => Action::None,
    }
}

/// Handles key events in the file browser.
fn handle_browser_mode(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::BrowserDown,
        KeyCode::Char('k') | KeyCode::Up => Action::BrowserUp,
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Action::BrowserEnter,
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => Action::BrowserParent,
        KeyCode::Esc | KeyCode::Char('q') => Action::BrowserCancel,
        _ => Action::None,
    }
}

/// Applies an action to the application state.
///
/// Returns the request to hand to the backend when the action submitted one.
pub fn apply_action(state: &mut AppState, action: Action) -> Option<DispatchedRequest> {
    match action {
        Action::None => {}
        Action::Quit => {
            state.should_quit = true;
        }
        Action::FocusNext => {
            state.focus_next();
        }
        Action::FocusPrevious => {
            state.focus_previous();
        }
        Action::ToggleFormat => {
            state.toggle_format();
        }
        Action::InsertText(text) => {
            state.insert_text(&text);
        }
        Action::DeleteChar => {
            state.delete_char();
        }
        Action::ClearFilePath => {
            state.clear_file_path();
        }
        Action::OpenBrowser => {
            state.open_browser();
        }
        Action::Submit => {
            return state.submit();
        }
        Action::ClearInput => {
            state.clear_input();
        }
        Action::DismissNotice => {
            state.dismiss_notice();
        }
        Action::DismissOverlay => {
            state.dismiss_overlay();
        }
        Action::PanelNext => {
            state.panels.next();
        }
        Action::PanelPrevious => {
            state.panels.previous();
        }
        Action::TogglePanel => {
            state.panels.toggle();
        }
        Action::Retry => {
            return state.retry();
        }
        Action::ExportResults => {
            state.export_results();
        }
        Action::BrowserUp => {
            state.browser_up();
        }
        Action::BrowserDown => {
            state.browser_down();
        }
        Action::BrowserEnter => {
            state.browser_enter();
        }
        Action::BrowserParent => {
            state.browser_parent();
        }
        Action::BrowserCancel => {
            state.browser_cancel();
        }
        Action::Resize(_, _) => {
            // The next draw picks up the new size
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendResponse;
    use crate::dispatch::AnalysisCommand;
    use crate::model::Settings;
    use crate::results::{AnalysisResult, ResultCollection};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            let action = handle_event(Event::Key(key(code)), state.mode());
            assert!(apply_action(state, action).is_none());
        }
    }

    fn press(state: &mut AppState, event: KeyEvent) -> Option<DispatchedRequest> {
        let action = handle_event(Event::Key(event), state.mode());
        apply_action(state, action)
    }

    #[test]
    fn test_input_mode_keys() {
        let text = UiMode::Input(Focus::Text);
        assert_eq!(handle_key_event(key(KeyCode::Char('A')), text), Action::InsertText("A".into()));
        assert_eq!(handle_key_event(key(KeyCode::Enter), text), Action::InsertText("\n".into()));
        assert_eq!(handle_key_event(key(KeyCode::Backspace), text), Action::DeleteChar);
        assert_eq!(handle_key_event(key(KeyCode::Tab), text), Action::FocusNext);
        assert_eq!(handle_key_event(key(KeyCode::BackTab), text), Action::FocusPrevious);
        assert_eq!(handle_key_event(ctrl('s'), text), Action::Submit);
        assert_eq!(handle_key_event(ctrl('l'), text), Action::ClearInput);
        assert_eq!(handle_key_event(ctrl('t'), text), Action::ToggleFormat);
        assert_eq!(handle_key_event(ctrl('q'), text), Action::Quit);

        let file = UiMode::Input(Focus::File);
        assert_eq!(handle_key_event(key(KeyCode::Enter), file), Action::OpenBrowser);
        assert_eq!(handle_key_event(key(KeyCode::Backspace), file), Action::ClearFilePath);
        assert_eq!(handle_key_event(key(KeyCode::Char('x')), file), Action::None);

        let format = UiMode::Input(Focus::Format);
        assert_eq!(handle_key_event(key(KeyCode::Char(' ')), format), Action::ToggleFormat);
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        for mode in [UiMode::Input(Focus::Text), UiMode::Notice, UiMode::Browser, UiMode::Overlay] {
            assert_eq!(handle_key_event(ctrl('c'), mode), Action::Quit);
        }
    }

    #[test]
    fn test_notice_dismissed_by_any_key() {
        assert_eq!(handle_key_event(key(KeyCode::Char('x')), UiMode::Notice), Action::DismissNotice);
        assert_eq!(handle_key_event(key(KeyCode::Esc), UiMode::Notice), Action::DismissNotice);
    }

    #[test]
    fn test_overlay_keys() {
        let mode = UiMode::Overlay;
        assert_eq!(handle_key_event(key(KeyCode::Esc), mode), Action::DismissOverlay);
        assert_eq!(handle_key_event(key(KeyCode::Char('j')), mode), Action::PanelNext);
        assert_eq!(handle_key_event(key(KeyCode::Char('k')), mode), Action::PanelPrevious);
        assert_eq!(handle_key_event(key(KeyCode::Enter), mode), Action::TogglePanel);
        assert_eq!(handle_key_event(key(KeyCode::Char('r')), mode), Action::Retry);
        assert_eq!(handle_key_event(key(KeyCode::Char('s')), mode), Action::ExportResults);
        // Typing does not leak into the input while the overlay is up
        assert_eq!(handle_key_event(key(KeyCode::Char('A')), mode), Action::None);
    }

    #[test]
    fn test_browser_keys() {
        let mode = UiMode::Browser;
        assert_eq!(handle_key_event(key(KeyCode::Char('j')), mode), Action::BrowserDown);
        assert_eq!(handle_key_event(key(KeyCode::Up), mode), Action::BrowserUp);
        assert_eq!(handle_key_event(key(KeyCode::Enter), mode), Action::BrowserEnter);
        assert_eq!(handle_key_event(key(KeyCode::Backspace), mode), Action::BrowserParent);
        assert_eq!(handle_key_event(key(KeyCode::Esc), mode), Action::BrowserCancel);
    }

    #[test]
    fn test_paste_only_into_text_box() {
        let paste = || Event::Paste("@r1\nACGT\n+\n!!!!".to_string());
        assert_eq!(
            handle_event(paste(), UiMode::Input(Focus::Text)),
            Action::InsertText("@r1\nACGT\n+\n!!!!".into())
        );
        assert_eq!(handle_event(paste(), UiMode::Input(Focus::File)), Action::None);
        assert_eq!(handle_event(paste(), UiMode::Overlay), Action::None);
    }

    #[test]
    fn test_key_release_ignored() {
        let mut release = key(KeyCode::Char('a'));
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_event(Event::Key(release), UiMode::Input(Focus::Text)), Action::None);
    }

    #[test]
    fn test_typed_fastq_submission() {
        let mut state = AppState::new(Settings::default());
        type_str(&mut state, "@r1\nACGT\n+\n!!!!");

        let dispatched = press(&mut state, ctrl('s')).unwrap();
        assert_eq!(dispatched.request.command, AnalysisCommand::FastqSequences);
        assert_eq!(dispatched.request.argument, "@r1\nACGT\n+\n!!!!");
        assert_eq!(state.mode(), UiMode::Overlay);
    }

    #[test]
    fn test_toggle_then_submit_uses_fasta() {
        let mut state = AppState::new(Settings::default());
        type_str(&mut state, ">c1\nACGT");
        press(&mut state, ctrl('t'));

        let dispatched = press(&mut state, ctrl('s')).unwrap();
        assert_eq!(dispatched.request.command, AnalysisCommand::FastaSequences);
    }

    #[test]
    fn test_empty_submit_then_dismiss_notice() {
        let mut state = AppState::new(Settings::default());
        assert!(press(&mut state, ctrl('s')).is_none());
        assert_eq!(state.mode(), UiMode::Notice);
        press(&mut state, key(KeyCode::Char('z')));
        assert_eq!(state.mode(), UiMode::Input(Focus::Text));
        assert_eq!(state.input.text(), "");
    }

    #[test]
    fn test_overlay_flow() {
        let mut state = AppState::new(Settings::default());
        type_str(&mut state, "ACGT");
        let dispatched = press(&mut state, ctrl('s')).unwrap();
        state.receive(BackendResponse {
            request_id: dispatched.request_id,
            outcome: Ok(ResultCollection::from_records(vec![
                AnalysisResult::fastq("q1", 4, 0.5, 0, 4),
                AnalysisResult::fastq("q2", 4, 0.5, 0, 4),
            ])
            .unwrap()),
        });

        press(&mut state, key(KeyCode::Char('j')));
        press(&mut state, key(KeyCode::Enter));
        assert!(state.panels.is_expanded(1));
        assert!(!state.panels.is_expanded(0));

        press(&mut state, key(KeyCode::Esc));
        assert!(state.request.is_idle());
        assert_eq!(state.input.text(), "");
    }

    #[test]
    fn test_focus_cycle() {
        let mut state = AppState::new(Settings::default());
        press(&mut state, key(KeyCode::Tab));
        assert_eq!(state.focus, Focus::File);
        press(&mut state, key(KeyCode::Tab));
        assert_eq!(state.focus, Focus::Format);
        press(&mut state, key(KeyCode::BackTab));
        assert_eq!(state.focus, Focus::File);
    }

    #[test]
    fn test_quit() {
        let mut state = AppState::new(Settings::default());
        press(&mut state, ctrl('q'));
        assert!(state.should_quit);
    }
}

//! Data model for the analysis front end.
//!
//! This module contains the state the user edits and the state the
//! event loop threads through a request:
//! - Sequence format selection
//! - The two input slots (pasted text, file path)
//! - Application state tying input, routing, request lifecycle and overlays together

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::BackendResponse;
use crate::browser::{FileBrowser, PickOutcome};
use crate::dispatch::{DispatchedRequest, ExtensionPolicy, SubmissionRouter};
use crate::lifecycle::{Dismissal, RequestState, Resolution};
use crate::presentation::PanelCursor;
use crate::ui::glyphs::{self, Glyphs};

/// The two sequence encodings the backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceFormat {
    #[default]
    Fastq,
    Fasta,
}

impl SequenceFormat {
    /// Returns the other format.
    pub fn toggled(self) -> Self {
        match self {
            SequenceFormat::Fastq => SequenceFormat::Fasta,
            SequenceFormat::Fasta => SequenceFormat::Fastq,
        }
    }

    /// File extensions (without the dot) recognized for this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SequenceFormat::Fastq => &["fq", "fastq"],
            SequenceFormat::Fasta => &["fa", "fasta", "fas", "fna"],
        }
    }

    /// Detects the format from a file extension, looking through a trailing `.gz`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(OsStr::to_str)?.to_lowercase();
        let ext = if ext == "gz" {
            Path::new(path.file_stem()?)
                .extension()
                .and_then(OsStr::to_str)?
                .to_lowercase()
        } else {
            ext
        };

        [SequenceFormat::Fastq, SequenceFormat::Fasta]
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceFormat::Fastq => write!(f, "FASTQ"),
            SequenceFormat::Fasta => write!(f, "FASTA"),
        }
    }
}

/// Two-valued format toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSelector {
    current: SequenceFormat,
}

impl FormatSelector {
    pub fn new(format: SequenceFormat) -> Self {
        Self { current: format }
    }

    pub fn current(&self) -> SequenceFormat {
        self.current
    }

    /// Flips between FASTQ and FASTA.
    pub fn toggle(&mut self) {
        self.current = self.current.toggled();
    }
}

/// Which of the two input slots a submission comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    File,
}

/// Holds the pasted text and the selected file path.
///
/// Both slots may hold content at the same time while the user edits;
/// exclusivity is only checked when a submission is routed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputStore {
    text: String,
    file_path: String,
}

impl InputStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.text = value.into();
    }

    pub fn set_file_path(&mut self, value: impl Into<String>) {
        self.file_path = value.into();
    }

    /// Appends to the text slot.
    pub fn push_text(&mut self, value: &str) {
        self.text.push_str(value);
    }

    /// Removes the last character of the text slot.
    pub fn pop_text(&mut self) {
        self.text.pop();
    }

    /// Resets both slots to empty.
    pub fn clear(&mut self) {
        self.text.clear();
        self.file_path.clear();
    }

    /// True when the slot holds content.
    ///
    /// Any text counts, whitespace included; a blank file path does not.
    pub fn has(&self, kind: InputKind) -> bool {
        match kind {
            InputKind::Text => !self.text.is_empty(),
            InputKind::File => !self.file_path.trim().is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.has(InputKind::Text) && !self.has(InputKind::File)
    }
}

/// Input widget currently receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Format,
    #[default]
    Text,
    File,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Format => Focus::Text,
            Focus::Text => Focus::File,
            Focus::File => Focus::Format,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Format => Focus::File,
            Focus::Text => Focus::Format,
            Focus::File => Focus::Text,
        }
    }
}

/// Which layer of the UI owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Editing the input form
    Input(Focus),
    /// A blocking validation notice is shown
    Notice,
    /// The file browser is open
    Browser,
    /// The results overlay (loading, results or failure) is shown
    Overlay,
}

/// Start-up settings for the application state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub format: SequenceFormat,
    pub policy: ExtensionPolicy,
    pub start_dir: PathBuf,
    pub export_dir: PathBuf,
    pub glyphs: Glyphs,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: SequenceFormat::default(),
            policy: ExtensionPolicy::default(),
            start_dir: PathBuf::from("."),
            export_dir: PathBuf::from("."),
            glyphs: glyphs::select(false),
        }
    }
}

/// The complete application state.
#[derive(Debug)]
pub struct AppState {
    /// Pasted text and file path
    pub input: InputStore,
    /// Active sequence format
    pub format: FormatSelector,
    /// Focused input widget
    pub focus: Focus,
    /// Validates input and resolves backend commands
    pub router: SubmissionRouter,
    /// In-flight request and its outcome
    pub request: RequestState,
    /// Selection and expansion of result panels
    pub panels: PanelCursor,
    /// Blocking validation notice
    pub notice: Option<String>,
    /// Open file browser, if any
    pub browser: Option<FileBrowser>,
    /// Directory the browser opens in
    pub start_dir: PathBuf,
    /// Directory results are exported to
    pub export_dir: PathBuf,
    /// Status message to display
    pub status_message: Option<String>,
    /// Glyph set used by the renderer
    pub glyphs: Glyphs,
    /// Whether the application should quit
    pub should_quit: bool,
    /// Animation counter for the loading indicator
    pub tick: usize,
}

impl AppState {
    /// Creates an empty session.
    pub fn new(settings: Settings) -> Self {
        Self {
            input: InputStore::new(),
            format: FormatSelector::new(settings.format),
            focus: Focus::default(),
            router: SubmissionRouter::new(settings.policy),
            request: RequestState::Idle,
            panels: PanelCursor::default(),
            notice: None,
            browser: None,
            start_dir: settings.start_dir,
            export_dir: settings.export_dir,
            status_message: None,
            glyphs: settings.glyphs,
            should_quit: false,
            tick: 0,
        }
    }

    /// Returns the UI layer that currently owns the keyboard.
    pub fn mode(&self) -> UiMode {
        if self.notice.is_some() {
            UiMode::Notice
        } else if self.browser.is_some() {
            UiMode::Browser
        } else if self.request.is_overlay_visible() {
            UiMode::Overlay
        } else {
            UiMode::Input(self.focus)
        }
    }

    pub fn toggle_format(&mut self) {
        self.format.toggle();
        debug!(format = %self.format.current(), "format toggled");
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Appends typed or pasted text, normalizing line endings.
    pub fn insert_text(&mut self, value: &str) {
        let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
        self.input.push_text(&normalized);
    }

    pub fn delete_char(&mut self) {
        self.input.pop_text();
    }

    pub fn clear_file_path(&mut self) {
        self.input.set_file_path("");
    }

    /// Clears both input slots.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.status_message = Some("Input cleared".to_string());
    }

    /// Routes the current input and moves the lifecycle to awaiting.
    ///
    /// Returns the request the caller must issue to the backend, or `None`
    /// when validation failed (a notice is shown) or a request is already
    /// in flight.
    pub fn submit(&mut self) -> Option<DispatchedRequest> {
        if self.request.is_awaiting() {
            self.status_message = Some("An analysis is already running".to_string());
            return None;
        }

        match self.router.submit(&self.input, self.format.current()) {
            Ok(dispatched) => {
                if !self.request.begin(dispatched.request_id) {
                    return None;
                }
                info!(
                    request_id = dispatched.request_id,
                    command = dispatched.request.command.name(),
                    "analysis requested"
                );
                self.panels = PanelCursor::default();
                self.status_message = None;
                Some(dispatched)
            }
            Err(err) => {
                warn!(error = %err, "submission rejected");
                self.notice = Some(err.to_string());
                None
            }
        }
    }

    /// Re-submits the input after a failed request.
    pub fn retry(&mut self) -> Option<DispatchedRequest> {
        if !self.request.is_failed() {
            return None;
        }
        self.submit()
    }

    /// Applies a backend response to the lifecycle.
    pub fn receive(&mut self, response: BackendResponse) {
        let request_id = response.request_id;
        match self.request.resolve(response) {
            Resolution::Loaded(count) => {
                info!(request_id, records = count, "analysis loaded");
                self.panels = PanelCursor::new(count);
            }
            Resolution::Failed => {
                warn!(request_id, "analysis failed");
            }
            Resolution::Stale => {
                debug!(request_id, "ignoring stale response");
            }
        }
    }

    /// Closes the results overlay.
    ///
    /// Dismissing loaded results (or a pending request) clears the input;
    /// dismissing a failure keeps it so the user can fix and resubmit.
    pub fn dismiss_overlay(&mut self) {
        match self.request.dismiss() {
            Dismissal::Results | Dismissal::Pending => self.input.clear(),
            Dismissal::Failure | Dismissal::Nothing => {}
        }
        self.panels = PanelCursor::default();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Opens the file browser next to the current file, or in the start directory.
    pub fn open_browser(&mut self) {
        let dir = Path::new(self.input.file_path())
            .parent()
            .filter(|parent| parent.is_dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.start_dir.clone());

        match FileBrowser::open(&dir) {
            Ok(browser) => self.browser = Some(browser),
            Err(err) => {
                warn!(error = %err, "cannot open file browser");
                self.status_message = Some(err.to_string());
            }
        }
    }

    pub fn browser_up(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            browser.move_up();
        }
    }

    pub fn browser_down(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            browser.move_down();
        }
    }

    /// Enters the selected directory or picks the selected file.
    pub fn browser_enter(&mut self) {
        let Some(browser) = self.browser.as_mut() else {
            return;
        };
        match browser.enter() {
            Ok(PickOutcome::Selected(path)) => {
                self.start_dir = browser.dir().to_path_buf();
                self.input.set_file_path(path.display().to_string());
                self.browser = None;
            }
            Ok(PickOutcome::Cancelled) => self.browser = None,
            Ok(PickOutcome::Pending) => {}
            Err(err) => self.status_message = Some(err.to_string()),
        }
    }

    pub fn browser_parent(&mut self) {
        if let Some(browser) = self.browser.as_mut() {
            if let Err(err) = browser.parent() {
                self.status_message = Some(err.to_string());
            }
        }
    }

    /// Closes the browser without touching the file slot.
    pub fn browser_cancel(&mut self) {
        self.browser = None;
    }

    /// Writes loaded results to the export directory.
    pub fn export_results(&mut self) {
        let Some(results) = self.request.results() else {
            return;
        };
        self.status_message = Some(match results.save_json(&self.export_dir) {
            Ok(path) => {
                info!(path = %path.display(), "results exported");
                format!("Saved results to {}", path.display())
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                err.to_string()
            }
        });
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

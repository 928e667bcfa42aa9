//! # seqanalyser - Terminal front end for sequence analysis
//!
//! Paste FASTQ/FASTA records or pick a sequence file, submit, and browse the
//! per-record results (validity, length, GC content, ORF count, PHRED score
//! per base) returned by an external analysis backend.
//!
//! ## Architecture
//!
//! The application follows an event-driven architecture with clear separation:
//! - `model`: Input store, format selector and application state
//! - `dispatch`: Submission routing to one of the four backend commands
//! - `lifecycle`: Request state machine (idle, awaiting, loaded, failed)
//! - `backend`: Backend process transport and worker-thread dispatcher
//! - `results`: Result records and their invariants, JSON export
//! - `presentation`: Per-type result panels
//! - `browser`: In-terminal file picker
//! - `event`: Keyboard event handling
//! - `ui`: TUI rendering with ratatui
//! - `controller`: Orchestration of the event loop

pub mod backend;
pub mod browser;
pub mod controller;
pub mod dispatch;
pub mod event;
pub mod lifecycle;
pub mod model;
pub mod presentation;
pub mod results;
pub mod ui;

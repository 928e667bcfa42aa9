//! Submission routing.
//!
//! Turns the input store and the active format into exactly one backend
//! command, or a validation error when the input is ambiguous or missing.
//!
//! | source | FASTQ                     | FASTA                     |
//! |--------|---------------------------|---------------------------|
//! | text   | `analyse_fastq_sequences` | `analyse_fasta_sequences` |
//! | file   | `analyse_fastq_file`      | `analyse_fasta_file`      |

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::{InputKind, InputStore, SequenceFormat};

/// The four backend entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisCommand {
    FastqSequences,
    FastaSequences,
    FastqFile,
    FastaFile,
}

impl AnalysisCommand {
    /// Selects the command for a source kind and format.
    pub fn resolve(kind: InputKind, format: SequenceFormat) -> Self {
        match (kind, format) {
            (InputKind::Text, SequenceFormat::Fastq) => AnalysisCommand::FastqSequences,
            (InputKind::Text, SequenceFormat::Fasta) => AnalysisCommand::FastaSequences,
            (InputKind::File, SequenceFormat::Fastq) => AnalysisCommand::FastqFile,
            (InputKind::File, SequenceFormat::Fasta) => AnalysisCommand::FastaFile,
        }
    }

    /// Wire identifier of the command.
    pub fn name(self) -> &'static str {
        match self {
            AnalysisCommand::FastqSequences => "analyse_fastq_sequences",
            AnalysisCommand::FastaSequences => "analyse_fasta_sequences",
            AnalysisCommand::FastqFile => "analyse_fastq_file",
            AnalysisCommand::FastaFile => "analyse_fasta_file",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            AnalysisCommand::FastqSequences | AnalysisCommand::FastaSequences => InputKind::Text,
            AnalysisCommand::FastqFile | AnalysisCommand::FastaFile => InputKind::File,
        }
    }

    pub fn format(self) -> SequenceFormat {
        match self {
            AnalysisCommand::FastqSequences | AnalysisCommand::FastqFile => SequenceFormat::Fastq,
            AnalysisCommand::FastaSequences | AnalysisCommand::FastaFile => SequenceFormat::Fasta,
        }
    }
}

impl fmt::Display for AnalysisCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved command with its single argument (raw text or file path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub command: AnalysisCommand,
    pub argument: String,
}

/// Parameter object sent to the backend alongside the command name.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestParams<'a> {
    Sequences { sequences: &'a str },
    Path { path: &'a str },
}

impl AnalysisRequest {
    pub fn params(&self) -> RequestParams<'_> {
        match self.command.input_kind() {
            InputKind::Text => RequestParams::Sequences {
                sequences: &self.argument,
            },
            InputKind::File => RequestParams::Path {
                path: &self.argument,
            },
        }
    }
}

/// A request tagged with the id the lifecycle waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedRequest {
    pub request_id: u64,
    pub request: AnalysisRequest,
}

/// Errors detected before anything is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You may supply text or a file, not both.")]
    AmbiguousSource,

    #[error("Please supply text or a file.")]
    NoSource,

    #[error("{path} looks like a {found} file but the selected format is {expected}.")]
    FormatMismatch {
        path: String,
        expected: SequenceFormat,
        found: SequenceFormat,
    },
}

/// What to do with a file whose extension belongs to the other format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionPolicy {
    /// Send it anyway and let the backend decide
    #[default]
    Defer,
    /// Refuse it before dispatch
    Reject,
}

/// Validates input and allocates request ids.
#[derive(Debug, Clone)]
pub struct SubmissionRouter {
    policy: ExtensionPolicy,
    next_request_id: u64,
}

impl SubmissionRouter {
    pub fn new(policy: ExtensionPolicy) -> Self {
        Self {
            policy,
            next_request_id: 1,
        }
    }

    pub fn policy(&self) -> ExtensionPolicy {
        self.policy
    }

    /// Resolves the command for the current input without side effects.
    pub fn route(
        &self,
        store: &InputStore,
        format: SequenceFormat,
    ) -> Result<AnalysisRequest, ValidationError> {
        let kind = match (store.has(InputKind::Text), store.has(InputKind::File)) {
            (true, true) => return Err(ValidationError::AmbiguousSource),
            (false, false) => return Err(ValidationError::NoSource),
            (true, false) => InputKind::Text,
            (false, true) => InputKind::File,
        };

        let argument = match kind {
            InputKind::Text => store.text().to_string(),
            InputKind::File => {
                let path = store.file_path().trim();
                if self.policy == ExtensionPolicy::Reject {
                    if let Some(found) = SequenceFormat::from_path(path) {
                        if found != format {
                            return Err(ValidationError::FormatMismatch {
                                path: path.to_string(),
                                expected: format,
                                found,
                            });
                        }
                    }
                }
                path.to_string()
            }
        };

        Ok(AnalysisRequest {
            command: AnalysisCommand::resolve(kind, format),
            argument,
        })
    }

    /// Routes the input and assigns a fresh request id on success.
    pub fn submit(
        &mut self,
        store: &InputStore,
        format: SequenceFormat,
    ) -> Result<DispatchedRequest, ValidationError> {
        let request = self.route(store, format)?;
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        Ok(DispatchedRequest {
            request_id,
            request,
        })
    }
}

impl Default for SubmissionRouter {
    fn default() -> Self {
        Self::new(ExtensionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(text: &str, path: &str) -> InputStore {
        let mut store = InputStore::new();
        store.set_text(text);
        store.set_file_path(path);
        store
    }

    #[test]
    fn test_command_table() {
        let cases = [
            ("ACGT", "", SequenceFormat::Fastq, "analyse_fastq_sequences", "ACGT"),
            ("ACGT", "", SequenceFormat::Fasta, "analyse_fasta_sequences", "ACGT"),
            ("", "/tmp/a.fq", SequenceFormat::Fastq, "analyse_fastq_file", "/tmp/a.fq"),
            ("", "/tmp/a.fa", SequenceFormat::Fasta, "analyse_fasta_file", "/tmp/a.fa"),
        ];
        let mut router = SubmissionRouter::default();
        for (text, path, format, command, argument) in cases {
            let dispatched = router.submit(&store(text, path), format).unwrap();
            assert_eq!(dispatched.request.command.name(), command);
            assert_eq!(dispatched.request.argument, argument);
        }
    }

    #[test]
    fn test_fastq_text_scenario() {
        let mut router = SubmissionRouter::default();
        let text = "@r1\nACGT\n+\n!!!!";
        let dispatched = router.submit(&store(text, ""), SequenceFormat::Fastq).unwrap();
        assert_eq!(dispatched.request.command, AnalysisCommand::FastqSequences);
        assert_eq!(dispatched.request.argument, text);
        assert_eq!(
            serde_json::to_value(dispatched.request.params()).unwrap(),
            serde_json::json!({ "sequences": text })
        );
    }

    #[test]
    fn test_fasta_file_scenario() {
        let mut router = SubmissionRouter::default();
        let dispatched = router
            .submit(&store("", "/tmp/x.fasta"), SequenceFormat::Fasta)
            .unwrap();
        assert_eq!(dispatched.request.command, AnalysisCommand::FastaFile);
        assert_eq!(
            serde_json::to_value(dispatched.request.params()).unwrap(),
            serde_json::json!({ "path": "/tmp/x.fasta" })
        );
    }

    #[test]
    fn test_both_sources_rejected() {
        let mut router = SubmissionRouter::default();
        let err = router
            .submit(&store("ACGT", "/tmp/x.fasta"), SequenceFormat::Fasta)
            .unwrap_err();
        assert_eq!(err, ValidationError::AmbiguousSource);
    }

    #[test]
    fn test_no_source_rejected() {
        let mut router = SubmissionRouter::default();
        let err = router.submit(&store("", ""), SequenceFormat::Fastq).unwrap_err();
        assert_eq!(err, ValidationError::NoSource);
        let err = router.submit(&store("", " "), SequenceFormat::Fastq).unwrap_err();
        assert_eq!(err, ValidationError::NoSource);
    }

    #[test]
    fn test_whitespace_text_counts_as_a_source() {
        let router = SubmissionRouter::default();
        let err = router
            .route(&store(" ", "/tmp/x.fasta"), SequenceFormat::Fasta)
            .unwrap_err();
        assert_eq!(err, ValidationError::AmbiguousSource);

        let request = router.route(&store("\n", ""), SequenceFormat::Fasta).unwrap();
        assert_eq!(request.command, AnalysisCommand::FastaSequences);
        assert_eq!(request.argument, "\n");
    }

    #[test]
    fn test_request_ids_only_advance_on_success() {
        let mut router = SubmissionRouter::default();
        let first = router.submit(&store("A", ""), SequenceFormat::Fastq).unwrap();
        assert!(router.submit(&store("", ""), SequenceFormat::Fastq).is_err());
        let second = router.submit(&store("A", ""), SequenceFormat::Fastq).unwrap();
        assert_eq!(second.request_id, first.request_id + 1);
    }

    #[test]
    fn test_defer_policy_passes_wrong_extension() {
        let router = SubmissionRouter::new(ExtensionPolicy::Defer);
        let request = router
            .route(&store("", "/tmp/reads.fq"), SequenceFormat::Fasta)
            .unwrap();
        assert_eq!(request.command, AnalysisCommand::FastaFile);
    }

    #[test]
    fn test_reject_policy() {
        let router = SubmissionRouter::new(ExtensionPolicy::Reject);
        let err = router
            .route(&store("", "/tmp/reads.fq.gz"), SequenceFormat::Fasta)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::FormatMismatch {
                path: "/tmp/reads.fq.gz".to_string(),
                expected: SequenceFormat::Fasta,
                found: SequenceFormat::Fastq,
            }
        );

        // Matching and unrecognized extensions pass through
        assert!(router.route(&store("", "/tmp/reads.fq"), SequenceFormat::Fastq).is_ok());
        assert!(router.route(&store("", "/tmp/reads.txt"), SequenceFormat::Fasta).is_ok());
    }

    #[test]
    fn test_command_roundtrips_kind_and_format() {
        for kind in [InputKind::Text, InputKind::File] {
            for format in [SequenceFormat::Fastq, SequenceFormat::Fasta] {
                let command = AnalysisCommand::resolve(kind, format);
                assert_eq!(command.input_kind(), kind);
                assert_eq!(command.format(), format);
            }
        }
    }
}

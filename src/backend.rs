//! Analysis backend transport.
//!
//! The backend is an external program. For every request it is started as
//!
//! ```text
//! <program> [args...] <command>
//! ```
//!
//! receives the single parameter as a JSON object on stdin
//! (`{"sequences": "..."}` or `{"path": "..."}`) and prints a JSON array of
//! result records on stdout. A non-zero exit status is a failure; whatever the
//! program wrote to stderr becomes the failure message.
//!
//! Requests run on worker threads. Their responses come back to the event
//! loop over a channel, tagged with the request id, so the loop stays the
//! only owner of the request lifecycle.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error};

use crate::dispatch::{AnalysisRequest, DispatchedRequest};
use crate::results::{AnalysisResult, ResultCollection, ResultError};

/// Errors raised while talking to the backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to start analysis backend {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while talking to the analysis backend: {0}")]
    Io(#[from] io::Error),

    #[error("Analysis backend exited with {}: {}", exit_label(.code), .stderr.trim())]
    Exited { code: Option<i32>, stderr: String },

    #[error("Invalid backend output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid result: {0}")]
    InvalidResult(#[from] ResultError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Something that can run one of the four analysis commands.
pub trait AnalysisBackend: Send + Sync {
    fn analyse(&self, request: &AnalysisRequest) -> Result<ResultCollection, BackendError>;
}

/// Runs the backend as a child process per request.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the command name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl AnalysisBackend for ProcessBackend {
    fn analyse(&self, request: &AnalysisRequest) -> Result<ResultCollection, BackendError> {
        let params = serde_json::to_vec(&request.params())?;
        debug!(
            program = %self.program.display(),
            command = request.command.name(),
            bytes = params.len(),
            "starting backend"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(request.command.name())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Feed stdin from its own thread so a chatty backend cannot block on a full stdout pipe
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || write_params(stdin, &params));
        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| io::Error::other("stdin writer panicked"))??;

        if !output.status.success() {
            return Err(BackendError::Exited {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let records: Vec<AnalysisResult> = serde_json::from_slice(&output.stdout)?;
        Ok(ResultCollection::from_records(records)?)
    }
}

fn write_params(stdin: Option<ChildStdin>, params: &[u8]) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(params) {
        // The backend may exit without reading; its exit status tells the story
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// A finished request, as delivered to the event loop.
#[derive(Debug)]
pub struct BackendResponse {
    pub request_id: u64,
    pub outcome: Result<ResultCollection, BackendError>,
}

/// Issues requests on worker threads and collects their responses.
pub struct Dispatcher {
    backend: Arc<dyn AnalysisBackend>,
    sender: Sender<BackendResponse>,
    receiver: Receiver<BackendResponse>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            backend,
            sender,
            receiver,
        }
    }

    /// Starts a request without waiting for it.
    pub fn issue(&self, dispatched: DispatchedRequest) {
        let request_id = dispatched.request_id;
        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();

        let spawned = thread::Builder::new()
            .name(format!("analysis-{request_id}"))
            .spawn(move || {
                let started = Instant::now();
                let outcome = backend.analyse(&dispatched.request);
                debug!(
                    request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = outcome.is_ok(),
                    "backend finished"
                );
                // A closed channel means the application is shutting down
                let _ = sender.send(BackendResponse {
                    request_id,
                    outcome,
                });
            });

        if let Err(err) = spawned {
            error!(request_id, error = %err, "cannot start worker thread");
            let _ = self.sender.send(BackendResponse {
                request_id,
                outcome: Err(BackendError::Io(err)),
            });
        }
    }

    /// Returns the next finished response, if any.
    pub fn try_next(&self) -> Option<BackendResponse> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::dispatch::AnalysisCommand;

    struct StubBackend {
        calls: Mutex<Vec<AnalysisRequest>>,
        records: usize,
    }

    impl AnalysisBackend for StubBackend {
        fn analyse(&self, request: &AnalysisRequest) -> Result<ResultCollection, BackendError> {
            self.calls.lock().unwrap().push(request.clone());
            let records = (0..self.records)
                .map(|i| AnalysisResult::fasta(format!("r{i}"), 4, 0.25, 0))
                .collect();
            Ok(ResultCollection::from_records(records)?)
        }
    }

    fn request(command: AnalysisCommand, argument: &str) -> AnalysisRequest {
        AnalysisRequest {
            command,
            argument: argument.to_string(),
        }
    }

    #[test]
    fn test_dispatcher_delivers_tagged_response() {
        let backend = Arc::new(StubBackend {
            calls: Mutex::new(Vec::new()),
            records: 3,
        });
        let dispatcher = Dispatcher::new(backend.clone());
        dispatcher.issue(DispatchedRequest {
            request_id: 42,
            request: request(AnalysisCommand::FastaFile, "/tmp/x.fasta"),
        });

        let response = dispatcher
            .receiver
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(response.request_id, 42);
        assert_eq!(response.outcome.unwrap().len(), 3);

        let calls = backend.calls.lock().unwrap();
        assert_eq!(*calls, vec![request(AnalysisCommand::FastaFile, "/tmp/x.fasta")]);
        assert!(dispatcher.try_next().is_none());
    }

    #[cfg(unix)]
    fn shell(script: &str) -> ProcessBackend {
        ProcessBackend::new("sh").with_args(["-c", script])
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_passes_command_name() {
        // With `sh -c`, the appended command name becomes $0
        let backend = shell(
            r#"cat > /dev/null; printf '[{"id":"%s","gc":0.5,"n_orfs":2,"is_valid":true,"seq_len":4,"result_type":"fasta"}]' "$0""#,
        );
        let results = backend
            .analyse(&request(AnalysisCommand::FastaSequences, ">a\nACGT"))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.get(0).unwrap().id, "analyse_fasta_sequences");
        assert_eq!(results.get(0).unwrap().orf_count, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_sends_params_on_stdin() {
        let backend = shell(
            r#"input=$(cat); case "$input" in *'"path":"/tmp/x.fasta"'*) echo '[]' ;; *) exit 9 ;; esac"#,
        );
        let results = backend
            .analyse(&request(AnalysisCommand::FastaFile, "/tmp/x.fasta"))
            .unwrap();
        assert!(results.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_nonzero_exit() {
        let backend = shell("cat > /dev/null; echo 'cannot open file' >&2; exit 3");
        let err = backend
            .analyse(&request(AnalysisCommand::FastqFile, "/missing.fq"))
            .unwrap_err();
        match &err {
            BackendError::Exited { code, stderr } => {
                assert_eq!(*code, Some(3));
                assert!(stderr.contains("cannot open file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Analysis backend exited with status 3: cannot open file"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_bad_output() {
        let backend = shell("cat > /dev/null; echo 'not json'");
        let err = backend
            .analyse(&request(AnalysisCommand::FastqSequences, "@r\nA\n+\n!"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_backend_invalid_record() {
        let backend = shell(
            r#"cat > /dev/null; echo '[{"id":"x","gc":2.0,"n_orfs":0,"is_valid":true,"seq_len":1,"result_type":"fasta"}]'"#,
        );
        let err = backend
            .analyse(&request(AnalysisCommand::FastaSequences, ">x\nG"))
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidResult(_)));
    }

    #[test]
    fn test_missing_program() {
        let backend = ProcessBackend::new("/nonexistent/seqanalyser-backend");
        let err = backend
            .analyse(&request(AnalysisCommand::FastqSequences, "ACGT"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }
}

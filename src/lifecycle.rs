//! Request lifecycle.
//!
//! ```text
//! Idle ──submit──▶ Awaiting{id} ──ok──▶ Loaded{results} ──dismiss──▶ Idle
//!                       │                                    ▲
//!                       └──err──▶ Failed{message} ─dismiss───┘
//!                                      └──retry──▶ Awaiting{id'}
//! ```
//!
//! Responses are matched on request id; anything not awaited is stale.

use crate::backend::BackendResponse;
use crate::results::ResultCollection;

/// State of the single modelled request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState {
    #[default]
    Idle,
    Awaiting {
        request_id: u64,
    },
    Loaded {
        results: ResultCollection,
    },
    Failed {
        message: String,
    },
}

/// Outcome of feeding a backend response to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Results replaced the previous state; carries the record count
    Loaded(usize),
    Failed,
    /// The response does not belong to the awaited request
    Stale,
}

/// What the overlay showed when it was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    Nothing,
    Pending,
    Results,
    Failure,
}

impl RequestState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, RequestState::Awaiting { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestState::Failed { .. })
    }

    /// The overlay is visible in every state but idle.
    pub fn is_overlay_visible(&self) -> bool {
        !self.is_idle()
    }

    pub fn results(&self) -> Option<&ResultCollection> {
        match self {
            RequestState::Loaded { results } => Some(results),
            _ => None,
        }
    }

    /// Starts waiting for `request_id`. Refused while another request is awaited.
    pub fn begin(&mut self, request_id: u64) -> bool {
        if self.is_awaiting() {
            return false;
        }
        *self = RequestState::Awaiting { request_id };
        true
    }

    /// Applies a backend response if it answers the awaited request.
    pub fn resolve(&mut self, response: BackendResponse) -> Resolution {
        match self {
            RequestState::Awaiting { request_id } if *request_id == response.request_id => {}
            _ => return Resolution::Stale,
        }

        match response.outcome {
            Ok(results) => {
                let count = results.len();
                *self = RequestState::Loaded { results };
                Resolution::Loaded(count)
            }
            Err(err) => {
                *self = RequestState::Failed {
                    message: err.to_string(),
                };
                Resolution::Failed
            }
        }
    }

    /// Returns to idle, dropping results or failure.
    pub fn dismiss(&mut self) -> Dismissal {
        let dismissal = match self {
            RequestState::Idle => Dismissal::Nothing,
            RequestState::Awaiting { .. } => Dismissal::Pending,
            RequestState::Loaded { .. } => Dismissal::Results,
            RequestState::Failed { .. } => Dismissal::Failure,
        };
        *self = RequestState::Idle;
        dismissal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::results::AnalysisResult;

    fn ok(request_id: u64, n: usize) -> BackendResponse {
        let records = (0..n)
            .map(|i| AnalysisResult::fastq(format!("r{i}"), 4, 0.5, 0, 4))
            .collect();
        BackendResponse {
            request_id,
            outcome: Ok(ResultCollection::from_records(records).unwrap()),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut state = RequestState::default();
        assert!(state.is_idle());
        assert!(!state.is_overlay_visible());

        assert!(state.begin(1));
        assert!(state.is_awaiting());
        assert!(state.is_overlay_visible());
        assert!(state.results().is_none());

        assert_eq!(state.resolve(ok(1, 2)), Resolution::Loaded(2));
        assert_eq!(state.results().map(ResultCollection::len), Some(2));

        assert_eq!(state.dismiss(), Dismissal::Results);
        assert!(state.is_idle());
    }

    #[test]
    fn test_empty_results_are_loaded() {
        let mut state = RequestState::default();
        state.begin(7);
        assert_eq!(state.resolve(ok(7, 0)), Resolution::Loaded(0));
        assert!(state.results().unwrap().is_empty());
    }

    #[test]
    fn test_failure() {
        let mut state = RequestState::default();
        state.begin(3);
        let resolution = state.resolve(BackendResponse {
            request_id: 3,
            outcome: Err(BackendError::Exited {
                code: Some(1),
                stderr: "boom".to_string(),
            }),
        });
        assert_eq!(resolution, Resolution::Failed);
        match &state {
            RequestState::Failed { message } => assert!(message.contains("boom")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(state.dismiss(), Dismissal::Failure);
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let mut state = RequestState::default();
        assert_eq!(state.resolve(ok(1, 1)), Resolution::Stale);
        assert!(state.is_idle());

        state.begin(2);
        assert_eq!(state.resolve(ok(1, 1)), Resolution::Stale);
        assert!(state.is_awaiting());
    }

    #[test]
    fn test_cannot_begin_twice() {
        let mut state = RequestState::default();
        assert!(state.begin(1));
        assert!(!state.begin(2));
        assert_eq!(state, RequestState::Awaiting { request_id: 1 });
    }

    #[test]
    fn test_results_replaced_wholesale() {
        let mut state = RequestState::default();
        state.begin(1);
        state.resolve(ok(1, 3));
        state.begin(2);
        state.resolve(ok(2, 1));
        assert_eq!(state.results().map(ResultCollection::len), Some(1));
    }

    #[test]
    fn test_dismiss_idle_and_pending() {
        let mut state = RequestState::default();
        assert_eq!(state.dismiss(), Dismissal::Nothing);
        state.begin(1);
        assert_eq!(state.dismiss(), Dismissal::Pending);
        assert_eq!(state.resolve(ok(1, 1)), Resolution::Stale);
    }
}

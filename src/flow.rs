use crate::error::RouteError;
use crate::response::Response;
use crate::state::RequestState;

/// The outcome a handler reports back to the dispatcher.
///
/// Every handler invocation resolves to exactly one of these four cases, and
/// the dispatcher interprets them the same way at every nesting level:
/// - `Continue` threads an updated state to the next process,
/// - `Skip` declines and leaves the state untouched,
/// - `Complete` produces the terminal response for the request,
/// - `Fail` marks an error as pending and keeps walking the same process list
///   so later processes may recover it.
#[derive(Debug)]
pub enum Flow {
    /// Proceed to the next process with this updated state.
    Continue(RequestState),
    /// Proceed to the next process with the state unchanged.
    Skip,
    /// A terminal response is ready.
    Complete(Response),
    /// An error occurred; offer it to later processes in the same scope.
    Fail(RouteError),
}

impl Flow {
    /// Returns `true` for outcomes that end the current walk (`Complete`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Flow::Complete(_))
    }

    /// Returns `true` for outcomes that advance the walk (`Continue`/`Skip`).
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Flow::Continue(_) | Flow::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_classification() {
        let state = RequestState::new("GET", "/");
        assert!(Flow::Continue(state).is_in_flight());
        assert!(Flow::Skip.is_in_flight());
        assert!(Flow::Complete(Response::new(200)).is_terminal());
        assert!(!Flow::Fail(RouteError::validation("bad input")).is_in_flight());
    }
}

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{Axis, PersonalityType, Scores, TypeLetter};
use super::scoring::{resolve_axis, AxisOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "axis")]
pub enum TieBreakState {
    #[default]
    Resolving,
    AwaitingTieBreakAnswer(Axis),
    Done,
    DoneWithFailure,
}

/// What the session has to do after a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    Complete(PersonalityType),
    /// A tie-break question for this axis must be requested; the pass is suspended.
    NeedsTieBreaker(Axis),
    /// A tie-break question is still outstanding; nothing new was requested.
    Suspended(Axis),
}

/// Drives axis resolution, suspending on the first tie until its tie-break is answered.
///
/// Every pass re-scans all axes from the top. Axes decided earlier resolve identically
/// because their totals cannot change, so only the first open tie ever matters.
#[derive(Debug, Clone, Default)]
pub struct TieBreakCoordinator {
    state: TieBreakState,
    failed_axes: Vec<Axis>,
}

impl TieBreakCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TieBreakState {
        self.state
    }

    pub fn resolve(&mut self, scores: &Scores) -> ResolutionStep {
        if let TieBreakState::AwaitingTieBreakAnswer(axis) = self.state {
            return ResolutionStep::Suspended(axis);
        }

        self.state = TieBreakState::Resolving;
        let mut letters = [TypeLetter::Unresolved; 4];

        for (slot, axis) in letters.iter_mut().zip(Axis::ordered()) {
            *slot = match resolve_axis(axis, scores) {
                AxisOutcome::Decided(dimension) => TypeLetter::Resolved(dimension),
                AxisOutcome::Tied if self.failed_axes.contains(&axis) => TypeLetter::Unresolved,
                AxisOutcome::Tied => {
                    debug!(%axis, "axis tied; requesting tie-breaker");
                    self.state = TieBreakState::AwaitingTieBreakAnswer(axis);
                    return ResolutionStep::NeedsTieBreaker(axis);
                }
            };
        }

        let personality_type = PersonalityType::new(letters);
        self.state = if personality_type.has_unresolved() {
            TieBreakState::DoneWithFailure
        } else {
            TieBreakState::Done
        };
        ResolutionStep::Complete(personality_type)
    }

    /// The tie-break question for the pending axis could not be obtained. The axis is
    /// marked unresolved for the rest of the session and resolution continues.
    pub fn tie_breaker_unavailable(&mut self, scores: &Scores) -> ResolutionStep {
        if let TieBreakState::AwaitingTieBreakAnswer(axis) = self.state {
            warn!(%axis, "tie-breaker unavailable; axis left unresolved");
            if !self.failed_axes.contains(&axis) {
                self.failed_axes.push(axis);
            }
            self.state = TieBreakState::Resolving;
        }
        self.resolve(scores)
    }

    pub fn tie_breaker_answered(&mut self) {
        if matches!(self.state, TieBreakState::AwaitingTieBreakAnswer(_)) {
            self.state = TieBreakState::Resolving;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::quiz::domain::Dimension;

    fn decided_scores() -> Scores {
        let mut scores = Scores::default();
        scores.add(Dimension::E, 2);
        scores.add(Dimension::N, 3);
        scores.add(Dimension::T, 1);
        scores.add(Dimension::P, 2);
        scores
    }

    #[test]
    fn no_ties_completes_without_requests() {
        let mut coordinator = TieBreakCoordinator::new();
        let step = coordinator.resolve(&decided_scores());

        match step {
            ResolutionStep::Complete(code) => assert_eq!(code.to_string(), "ENTP"),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(coordinator.state(), TieBreakState::Done);
    }

    #[test]
    fn first_tie_suspends_the_pass() {
        let mut scores = decided_scores();
        scores.add(Dimension::S, 3);
        scores.add(Dimension::J, 2);

        let mut coordinator = TieBreakCoordinator::new();
        assert_eq!(
            coordinator.resolve(&scores),
            ResolutionStep::NeedsTieBreaker(Axis::SN)
        );
        assert_eq!(
            coordinator.resolve(&scores),
            ResolutionStep::Suspended(Axis::SN),
            "never requests a second tie-breaker while one is pending"
        );
        assert_eq!(
            coordinator.state(),
            TieBreakState::AwaitingTieBreakAnswer(Axis::SN)
        );
    }

    #[test]
    fn unavailable_tie_breaker_yields_sentinel_and_continues() {
        let mut scores = decided_scores();
        scores.add(Dimension::I, 2);
        scores.add(Dimension::F, 1);

        let mut coordinator = TieBreakCoordinator::new();
        assert_eq!(
            coordinator.resolve(&scores),
            ResolutionStep::NeedsTieBreaker(Axis::EI)
        );
        assert_eq!(
            coordinator.tie_breaker_unavailable(&scores),
            ResolutionStep::NeedsTieBreaker(Axis::TF)
        );

        match coordinator.tie_breaker_unavailable(&scores) {
            ResolutionStep::Complete(code) => {
                assert_eq!(code.to_string(), "XNXP");
                assert!(code.has_unresolved());
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(coordinator.state(), TieBreakState::DoneWithFailure);
    }

    #[test]
    fn weighted_answer_breaks_the_tie() {
        let mut scores = Scores::default();
        scores.add(Dimension::E, 1);
        scores.add(Dimension::I, 1);
        scores.add(Dimension::N, 3);
        scores.add(Dimension::T, 1);
        scores.add(Dimension::P, 2);

        let mut coordinator = TieBreakCoordinator::new();
        assert_eq!(
            coordinator.resolve(&scores),
            ResolutionStep::NeedsTieBreaker(Axis::EI)
        );

        scores.add(Dimension::E, 2);
        coordinator.tie_breaker_answered();

        match coordinator.resolve(&scores) {
            ResolutionStep::Complete(code) => assert_eq!(code.to_string(), "ENTP"),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(scores.get(Dimension::E), 3);
        assert_eq!(scores.get(Dimension::I), 1);
    }
}

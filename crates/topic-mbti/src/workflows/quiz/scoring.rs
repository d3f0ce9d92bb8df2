use super::domain::{AnswerLog, Axis, Dimension, Question, Scores};

/// Recompute dimension totals from scratch. Unanswered questions contribute nothing.
pub fn tally(questions: &[Question], answers: &AnswerLog) -> Scores {
    let mut scores = Scores::default();

    for question in questions {
        let Some(side) = answers.get(&question.id) else {
            continue;
        };
        if let Some(choice) = question.choices.iter().find(|choice| choice.side == side) {
            scores.add(choice.polarity, question.weight);
        }
    }

    scores
}

/// Per-axis verdict of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOutcome {
    Decided(Dimension),
    Tied,
}

/// Strictly greater wins; equal totals, including 0-0, are a tie.
pub fn resolve_axis(axis: Axis, scores: &Scores) -> AxisOutcome {
    let (left, right) = axis.dimensions();
    let (left_score, right_score) = (scores.get(left), scores.get(right));

    if left_score > right_score {
        AxisOutcome::Decided(left)
    } else if right_score > left_score {
        AxisOutcome::Decided(right)
    } else {
        AxisOutcome::Tied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::quiz::domain::{ChoiceSide, QuestionId};
    use crate::workflows::quiz::fallback::fallback_questions;

    #[test]
    fn tally_is_idempotent_and_skips_unanswered() {
        let questions = fallback_questions("여행");
        let mut answers = AnswerLog::default();
        answers.record(questions[0].id.clone(), ChoiceSide::Left);
        answers.record(questions[4].id.clone(), ChoiceSide::Right);
        answers.record(QuestionId::from("never_asked"), ChoiceSide::Left);

        let first = tally(&questions, &answers);
        let second = tally(&questions, &answers);

        assert_eq!(first, second);
        assert_eq!(first.get(Dimension::E), 1);
        assert_eq!(first.get(Dimension::N), 1);
        let total: u32 = Dimension::all().into_iter().map(|d| first.get(d)).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn equal_totals_tie_including_zero() {
        let mut scores = Scores::default();
        assert_eq!(resolve_axis(Axis::EI, &scores), AxisOutcome::Tied);

        scores.add(Dimension::E, 1);
        scores.add(Dimension::I, 1);
        assert_eq!(resolve_axis(Axis::EI, &scores), AxisOutcome::Tied);

        scores.add(Dimension::I, 2);
        assert_eq!(
            resolve_axis(Axis::EI, &scores),
            AxisOutcome::Decided(Dimension::I)
        );
    }
}

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    validate_keyword, validate_question_set, AnswerLog, Axis, ChoiceSide, ContributingQuestion,
    InterpretationDetail, KeywordError, Phase, PersonalityType, Question, QuestionId,
    QuestionShapeError, QuizResult, Scores,
};
use super::fallback::{fallback_interpretation, fallback_questions};
use super::gateway::{GatewayCall, GatewayError, GatewayOutcome, GatewayRequest, Ticket};
use super::scoring::tally;
use super::tiebreak::{ResolutionStep, TieBreakCoordinator, TieBreakState};

pub const SUGGESTION_FAILURE_MESSAGE: &str = "AI 주제 추천에 실패했습니다. 잠시 후 다시 시도해주세요.";
pub const QUESTION_FALLBACK_NOTICE: &str = "AI 질문 생성에 실패했습니다. 일반 질문으로 시작합니다.";
pub const INTERPRETATION_FALLBACK_NOTICE: &str =
    "AI 결과 분석에 실패했습니다. 기본 결과를 표시합니다.";

/// How many answered questions are echoed back on the result page.
const CONTRIBUTING_QUESTION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error(transparent)]
    Keyword(#[from] KeywordError),
    #[error("cannot {action} during the {} phase", .phase.label())]
    InvalidTransition { phase: Phase, action: &'static str },
    #[error("a {0} request is still in flight")]
    Busy(&'static str),
    #[error("settlement does not belong to the pending request")]
    StaleSettlement,
    #[error("expected a {expected} outcome but received {found}")]
    UnexpectedOutcome {
        expected: &'static str,
        found: &'static str,
    },
    #[error("topic `{0}` is not one of the suggestions")]
    UnknownTopic(String),
    #[error("answer targets question {found} but the current question is {expected}")]
    QuestionMismatch {
        expected: QuestionId,
        found: QuestionId,
    },
    #[error("no result has been computed yet")]
    NoResult,
    #[error("quiz state is unavailable")]
    StateUnavailable,
}

/// The single active quiz session.
///
/// Every method is a synchronous transition. A transition that needs the generative
/// service returns the [`GatewayRequest`] to run; its outcome is fed back through
/// [`QuizSession::settle`] with the same ticket. Until then the session is busy and
/// refuses further triggering actions.
#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    history: Vec<Phase>,
    keyword: String,
    topic: String,
    suggestions: Vec<String>,
    questions: Vec<Question>,
    current_index: usize,
    answers: AnswerLog,
    scores: Scores,
    coordinator: TieBreakCoordinator,
    result: Option<QuizResult>,
    error: Option<String>,
    pending: Option<GatewayRequest>,
    next_ticket: u64,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Home,
            history: vec![Phase::Home],
            keyword: String::new(),
            topic: String::new(),
            suggestions: Vec::new(),
            questions: Vec::new(),
            current_index: 0,
            answers: AnswerLog::default(),
            scores: Scores::default(),
            coordinator: TieBreakCoordinator::new(),
            result: None,
            error: None,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered since the session was created or restarted, in order.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerLog {
        &self.answers
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> Option<&GatewayRequest> {
        self.pending.as_ref()
    }

    pub fn tie_break_state(&self) -> TieBreakState {
        self.coordinator.state()
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Quizzing => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// `(current index + 1) / total` while quizzing, complete once a result exists.
    pub fn progress(&self) -> f64 {
        match self.phase {
            Phase::Quizzing if !self.questions.is_empty() => {
                (self.current_index + 1) as f64 / self.questions.len() as f64
            }
            Phase::ResultLoading | Phase::Result => 1.0,
            _ => 0.0,
        }
    }

    pub fn view(&self) -> SessionView {
        let current_question = self.current_question().cloned();
        SessionView {
            phase: self.phase,
            keyword: self.keyword.clone(),
            topic: self.topic.clone(),
            suggestions: self.suggestions.clone(),
            is_tie_breaker: current_question
                .as_ref()
                .is_some_and(Question::is_tie_breaker),
            question_number: current_question.as_ref().map(|_| self.current_index + 1),
            current_question,
            total_questions: self.questions.len(),
            progress: self.progress(),
            busy: self.pending.is_some(),
            error: self.error.clone(),
            tie_break: self.coordinator.state(),
            result: self.result.clone(),
        }
    }

    pub fn submit_keyword(&mut self, keyword: &str) -> Result<GatewayRequest, QuizError> {
        self.ensure_idle()?;
        validate_keyword(keyword)?;
        self.expect_phase(&[Phase::Home], "submit a keyword")?;

        self.keyword = keyword.to_string();
        self.suggestions.clear();
        self.error = None;
        self.enter(Phase::Suggesting);
        Ok(self.issue(GatewayCall::SuggestTopics {
            keyword: self.keyword.clone(),
            style: None,
        }))
    }

    pub fn regenerate_suggestions(
        &mut self,
        style: Option<&str>,
    ) -> Result<GatewayRequest, QuizError> {
        self.ensure_idle()?;
        self.expect_phase(&[Phase::Suggested], "regenerate suggestions")?;

        let style = style
            .map(str::trim)
            .filter(|style| !style.is_empty())
            .map(str::to_string);
        self.error = None;
        self.enter(Phase::Suggesting);
        Ok(self.issue(GatewayCall::SuggestTopics {
            keyword: self.keyword.clone(),
            style,
        }))
    }

    pub fn select_topic(&mut self, topic: &str) -> Result<GatewayRequest, QuizError> {
        self.ensure_idle()?;
        self.expect_phase(&[Phase::Suggested], "select a topic")?;

        let topic = topic.trim();
        if !self.suggestions.iter().any(|suggestion| suggestion == topic) {
            return Err(QuizError::UnknownTopic(topic.to_string()));
        }

        self.topic = topic.to_string();
        self.error = None;
        self.reset_quiz_content();
        self.enter(Phase::QuizLoading);
        Ok(self.issue(GatewayCall::GenerateQuestions {
            topic: self.topic.clone(),
        }))
    }

    /// Record the answer for the current question. Returns a request when answering
    /// completed the set and the scoring pipeline needs the generative service.
    pub fn answer(
        &mut self,
        question_id: &QuestionId,
        side: ChoiceSide,
    ) -> Result<Option<GatewayRequest>, QuizError> {
        self.ensure_idle()?;
        self.expect_phase(&[Phase::Quizzing], "answer a question")?;

        let current = self
            .questions
            .get(self.current_index)
            .ok_or(QuizError::InvalidTransition {
                phase: self.phase,
                action: "answer a question",
            })?;
        if &current.id != question_id {
            return Err(QuizError::QuestionMismatch {
                expected: current.id.clone(),
                found: question_id.clone(),
            });
        }

        self.answers.record(question_id.clone(), side);
        debug!(question = %question_id, choice = side.code(), "answer recorded");

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            return Ok(None);
        }

        self.coordinator.tie_breaker_answered();
        self.scores = tally(&self.questions, &self.answers);
        let step = self.coordinator.resolve(&self.scores);
        Ok(self.follow(step))
    }

    /// Apply the outcome of the pending request. Exactly one settlement is accepted per
    /// ticket; anything else is rejected without touching the session.
    pub fn settle(
        &mut self,
        ticket: Ticket,
        outcome: GatewayOutcome,
    ) -> Result<Option<GatewayRequest>, QuizError> {
        let Some(pending) = self.pending.as_ref().filter(|pending| pending.ticket == ticket) else {
            debug!(ticket = ticket.0, kind = outcome.kind(), "discarding stale settlement");
            return Err(QuizError::StaleSettlement);
        };
        if pending.call.kind() != outcome.kind() {
            return Err(QuizError::UnexpectedOutcome {
                expected: pending.call.kind(),
                found: outcome.kind(),
            });
        }

        let Some(GatewayRequest { call, .. }) = self.pending.take() else {
            return Err(QuizError::StaleSettlement);
        };

        let next = match (call, outcome) {
            (GatewayCall::SuggestTopics { .. }, GatewayOutcome::Suggestions(result)) => {
                self.settle_suggestions(result);
                None
            }
            (GatewayCall::GenerateQuestions { .. }, GatewayOutcome::Questions(result)) => {
                self.settle_questions(result);
                None
            }
            (GatewayCall::GenerateTieBreaker { axis, .. }, GatewayOutcome::TieBreaker(result)) => {
                self.settle_tie_breaker(axis, result)
            }
            (
                GatewayCall::GenerateInterpretation {
                    personality_type, ..
                },
                GatewayOutcome::Interpretation(result),
            ) => {
                self.settle_interpretation(personality_type, result);
                None
            }
            (call, outcome) => {
                return Err(QuizError::UnexpectedOutcome {
                    expected: call.kind(),
                    found: outcome.kind(),
                })
            }
        };
        Ok(next)
    }

    /// Return to the start page keeping the keyword. Any in-flight request is orphaned.
    pub fn go_back(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(ticket = pending.ticket.0, kind = pending.call.kind(), "abandoning request");
        }
        self.error = None;
        self.topic.clear();
        self.suggestions.clear();
        self.reset_quiz_content();
        self.enter(Phase::Home);
    }

    /// Discard everything. Tickets keep counting so late settlements stay stale.
    pub fn restart(&mut self) {
        let next_ticket = self.next_ticket;
        *self = Self::new();
        self.next_ticket = next_ticket;
        info!("quiz session restarted");
    }

    fn settle_suggestions(&mut self, result: Result<Vec<String>, GatewayError>) {
        match result {
            Ok(suggestions) if !suggestions.is_empty() => {
                info!(count = suggestions.len(), "topic suggestions received");
                self.suggestions = suggestions;
                self.enter(Phase::Suggested);
            }
            Ok(_) => self.fail_suggestions(&GatewayError::Malformed(
                "no topic suggestions returned".to_string(),
            )),
            Err(err) => self.fail_suggestions(&err),
        }
    }

    fn fail_suggestions(&mut self, err: &GatewayError) {
        warn!(%err, keyword = %self.keyword, "topic suggestion failed");
        self.suggestions.clear();
        self.error = Some(SUGGESTION_FAILURE_MESSAGE.to_string());
        self.enter(Phase::Home);
    }

    fn settle_questions(&mut self, result: Result<Vec<Question>, GatewayError>) {
        let checked = result.and_then(|questions| {
            validate_question_set(&questions)
                .map(|()| questions)
                .map_err(|err| GatewayError::Malformed(err.to_string()))
        });

        self.questions = match checked {
            Ok(questions) => {
                info!(count = questions.len(), topic = %self.topic, "question set received");
                questions
            }
            Err(err) => {
                warn!(%err, topic = %self.topic, "question generation failed; using fallback set");
                self.error = Some(QUESTION_FALLBACK_NOTICE.to_string());
                fallback_questions(&self.topic)
            }
        };
        self.current_index = 0;
        self.enter(Phase::Quizzing);
    }

    fn settle_tie_breaker(
        &mut self,
        axis: Axis,
        result: Result<Question, GatewayError>,
    ) -> Option<GatewayRequest> {
        let checked = result.and_then(|question| {
            check_tie_breaker(&question, axis)
                .map(|()| question)
                .map_err(|err| GatewayError::Malformed(err.to_string()))
        });

        match checked {
            Ok(mut question) => {
                question.id = self.unique_id(question.id);
                info!(%axis, question = %question.id, "tie-breaker appended");
                self.questions.push(question);
                self.current_index = self.questions.len() - 1;
                None
            }
            Err(err) => {
                warn!(%err, %axis, "tie-breaker generation failed");
                let step = self.coordinator.tie_breaker_unavailable(&self.scores);
                self.follow(step)
            }
        }
    }

    fn settle_interpretation(
        &mut self,
        personality_type: PersonalityType,
        result: Result<InterpretationDetail, GatewayError>,
    ) {
        let (interpretation, interpretation_fallback) = match result {
            Ok(detail) => (detail, false),
            Err(err) => {
                warn!(%err, %personality_type, "interpretation failed; using fallback payload");
                self.error = Some(INTERPRETATION_FALLBACK_NOTICE.to_string());
                (fallback_interpretation(&self.topic, &personality_type), true)
            }
        };

        self.result = Some(QuizResult {
            personality_type,
            scores: self.scores.clone(),
            interpretation,
            interpretation_fallback,
            contributing_questions: if interpretation_fallback {
                Vec::new()
            } else {
                self.contributing_questions()
            },
            completed_at: Utc::now(),
        });
        info!(%personality_type, interpretation_fallback, "quiz result ready");
        self.enter(Phase::Result);
    }

    fn follow(&mut self, step: ResolutionStep) -> Option<GatewayRequest> {
        match step {
            ResolutionStep::Complete(personality_type) => {
                self.enter(Phase::ResultLoading);
                Some(self.issue(GatewayCall::GenerateInterpretation {
                    topic: self.topic.clone(),
                    personality_type,
                }))
            }
            ResolutionStep::NeedsTieBreaker(axis) => {
                Some(self.issue(GatewayCall::GenerateTieBreaker {
                    topic: self.topic.clone(),
                    axis,
                }))
            }
            ResolutionStep::Suspended(axis) => {
                debug!(%axis, "resolution still waiting on a tie-breaker");
                None
            }
        }
    }

    /// Highest-weight answered questions, earlier questions first among equal weights.
    fn contributing_questions(&self) -> Vec<ContributingQuestion> {
        let mut answered: Vec<(&Question, ChoiceSide)> = self
            .questions
            .iter()
            .filter_map(|question| self.answers.get(&question.id).map(|side| (question, side)))
            .collect();
        answered.sort_by(|(a, _), (b, _)| b.weight.cmp(&a.weight));

        answered
            .into_iter()
            .take(CONTRIBUTING_QUESTION_LIMIT)
            .map(|(question, side)| ContributingQuestion {
                text: question.text.clone(),
                choice: question.choice(side).label.clone(),
            })
            .collect()
    }

    fn unique_id(&self, id: QuestionId) -> QuestionId {
        let taken = |candidate: &QuestionId| self.questions.iter().any(|q| &q.id == candidate);
        if !taken(&id) {
            return id;
        }
        let mut suffix = 2;
        loop {
            let candidate = QuestionId(format!("{}_{suffix}", id.0));
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn reset_quiz_content(&mut self) {
        self.questions.clear();
        self.current_index = 0;
        self.answers = AnswerLog::default();
        self.scores = Scores::default();
        self.coordinator = TieBreakCoordinator::new();
        self.result = None;
    }

    fn issue(&mut self, call: GatewayCall) -> GatewayRequest {
        self.next_ticket += 1;
        let request = GatewayRequest {
            ticket: Ticket(self.next_ticket),
            call,
        };
        debug!(ticket = self.next_ticket, kind = request.call.kind(), "gateway request issued");
        self.pending = Some(request.clone());
        request
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = self.phase.label(), to = phase.label(), "quiz phase changed");
        self.phase = phase;
        self.history.push(phase);
    }

    fn ensure_idle(&self) -> Result<(), QuizError> {
        match &self.pending {
            Some(pending) => Err(QuizError::Busy(pending.call.kind())),
            None => Ok(()),
        }
    }

    fn expect_phase(&self, allowed: &[Phase], action: &'static str) -> Result<(), QuizError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(QuizError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }
}

/// A tie-breaker must be well-formed, target the tied axis and outweigh regular questions.
fn check_tie_breaker(question: &Question, axis: Axis) -> Result<(), QuestionShapeError> {
    question.validate()?;
    if question.axis != axis {
        return Err(QuestionShapeError::WrongAxis {
            expected: axis,
            found: question.axis,
        });
    }
    if !question.is_tie_breaker() {
        return Err(QuestionShapeError::WeightTooLow {
            id: question.id.clone(),
            weight: question.weight,
        });
    }
    Ok(())
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub keyword: String,
    pub topic: String,
    pub suggestions: Vec<String>,
    pub current_question: Option<Question>,
    pub question_number: Option<usize>,
    pub total_questions: usize,
    pub progress: f64,
    pub is_tie_breaker: bool,
    pub busy: bool,
    pub error: Option<String>,
    pub tie_break: TieBreakState,
    pub result: Option<QuizResult>,
}

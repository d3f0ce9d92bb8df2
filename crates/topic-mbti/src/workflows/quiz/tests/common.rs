use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::quiz::domain::{
    Axis, BestMatch, Choice, ChoiceSide, InterpretationDetail, PersonalityType, Question,
    QuestionId,
};
use crate::workflows::quiz::gateway::{
    GatewayCall, GatewayError, GatewayOutcome, GatewayRequest, QuizGateway,
};
use crate::workflows::quiz::service::QuizService;
use crate::workflows::quiz::session::QuizSession;

pub(super) const KEYWORD: &str = "여행";
pub(super) const TOPIC: &str = "여행 스타일 테스트";

pub(super) fn suggestions() -> Vec<String> {
    vec![
        TOPIC.to_string(),
        "여행지 궁합 MBTI".to_string(),
        "짐 싸기 성향 테스트".to_string(),
    ]
}

pub(super) fn question(id: &str, axis: Axis, weight: u32) -> Question {
    let (left, right) = axis.dimensions();
    Question {
        id: QuestionId::from(id),
        text: format!("{id} 질문"),
        icon: "❓".to_string(),
        axis,
        weight,
        choices: [
            Choice {
                side: ChoiceSide::Left,
                label: format!("{id} {left}"),
                polarity: left,
            },
            Choice {
                side: ChoiceSide::Right,
                label: format!("{id} {right}"),
                polarity: right,
            },
        ],
    }
}

/// Twelve generated questions, three per axis.
pub(super) fn generated_questions() -> Vec<Question> {
    Axis::ordered()
        .into_iter()
        .flat_map(|axis| (0..3).map(move |n| (axis, n)))
        .enumerate()
        .map(|(index, (axis, _))| question(&format!("q{}", index + 1), axis, 1))
        .collect()
}

pub(super) fn tie_breaker(axis: Axis) -> Question {
    question(&format!("q_tie_{}", axis.code()), axis, 2)
}

pub(super) fn interpretation(code: &str) -> InterpretationDetail {
    InterpretationDetail {
        title: "자유로운 여행가".to_string(),
        emoji: "🧭".to_string(),
        summary: format!("{code} 유형은 즉흥 여행을 즐깁니다."),
        best_match: BestMatch {
            type_code: "ISTJ".to_string(),
            description: "꼼꼼한 계획으로 균형을 잡아줍니다.".to_string(),
        },
        strengths: vec!["호기심".to_string(), "적응력".to_string()],
        weaknesses: vec!["계획 부족".to_string(), "산만함".to_string()],
        characteristics: vec!["모험".to_string(), "즉흥".to_string(), "사교".to_string()],
    }
}

pub(super) fn unavailable() -> GatewayError {
    GatewayError::Unavailable("scripted failure".to_string())
}

/// In-memory gateway replaying queued responses and recording every call it receives.
/// An empty queue answers with a failure.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    suggestions: Mutex<VecDeque<Result<Vec<String>, GatewayError>>>,
    questions: Mutex<VecDeque<Result<Vec<Question>, GatewayError>>>,
    tie_breakers: Mutex<VecDeque<Result<Question, GatewayError>>>,
    interpretations: Mutex<VecDeque<Result<InterpretationDetail, GatewayError>>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl ScriptedGateway {
    pub(super) fn push_suggestions(&self, result: Result<Vec<String>, GatewayError>) {
        self.suggestions.lock().expect("lock").push_back(result);
    }

    pub(super) fn push_questions(&self, result: Result<Vec<Question>, GatewayError>) {
        self.questions.lock().expect("lock").push_back(result);
    }

    pub(super) fn push_tie_breaker(&self, result: Result<Question, GatewayError>) {
        self.tie_breakers.lock().expect("lock").push_back(result);
    }

    pub(super) fn push_interpretation(&self, result: Result<InterpretationDetail, GatewayError>) {
        self.interpretations.lock().expect("lock").push_back(result);
    }

    pub(super) fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub(super) fn call_kinds(&self) -> Vec<&'static str> {
        self.calls().iter().map(GatewayCall::kind).collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().expect("lock").push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, GatewayError>>>) -> Result<T, GatewayError> {
        queue
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Err(unavailable()))
    }
}

#[async_trait]
impl QuizGateway for ScriptedGateway {
    async fn suggest_topics(
        &self,
        keyword: &str,
        style: Option<&str>,
    ) -> Result<Vec<String>, GatewayError> {
        self.record(GatewayCall::SuggestTopics {
            keyword: keyword.to_string(),
            style: style.map(str::to_string),
        });
        Self::next(&self.suggestions)
    }

    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>, GatewayError> {
        self.record(GatewayCall::GenerateQuestions {
            topic: topic.to_string(),
        });
        Self::next(&self.questions)
    }

    async fn generate_tie_breaker(
        &self,
        topic: &str,
        axis: Axis,
    ) -> Result<Question, GatewayError> {
        self.record(GatewayCall::GenerateTieBreaker {
            topic: topic.to_string(),
            axis,
        });
        Self::next(&self.tie_breakers)
    }

    async fn generate_interpretation(
        &self,
        topic: &str,
        personality_type: &PersonalityType,
    ) -> Result<InterpretationDetail, GatewayError> {
        self.record(GatewayCall::GenerateInterpretation {
            topic: topic.to_string(),
            personality_type: *personality_type,
        });
        Self::next(&self.interpretations)
    }
}

pub(super) fn build_service() -> (Arc<QuizService<ScriptedGateway>>, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::default());
    let service = Arc::new(QuizService::new(gateway.clone()));
    (service, gateway)
}

/// Feed a pending request's outcome back into a session driven by hand.
pub(super) fn settle_ok(
    session: &mut QuizSession,
    request: GatewayRequest,
    outcome: GatewayOutcome,
) -> Option<GatewayRequest> {
    session
        .settle(request.ticket, outcome)
        .expect("settlement accepted")
}

/// A session sitting in the quiz phase with the given question set.
pub(super) fn quizzing_session(questions: Vec<Question>) -> QuizSession {
    let mut session = QuizSession::new();
    let request = session.submit_keyword(KEYWORD).expect("keyword accepted");
    settle_ok(
        &mut session,
        request,
        GatewayOutcome::Suggestions(Ok(suggestions())),
    );
    let request = session.select_topic(TOPIC).expect("topic accepted");
    settle_ok(&mut session, request, GatewayOutcome::Questions(Ok(questions)));
    session
}

/// Two E/I questions and one for every other axis, so opposite E/I answers tie.
pub(super) fn tie_prone_questions() -> Vec<Question> {
    vec![
        question("q1", Axis::EI, 1),
        question("q2", Axis::EI, 1),
        question("q3", Axis::SN, 1),
        question("q4", Axis::TF, 1),
        question("q5", Axis::JP, 1),
    ]
}

/// Picks sides in order, then keeps picking left.
pub(super) fn in_order(sides: &[ChoiceSide]) -> impl FnMut(&Question) -> ChoiceSide + '_ {
    let mut remaining = sides.iter();
    move |_| remaining.next().copied().unwrap_or(ChoiceSide::Left)
}

/// Answer every remaining question with `pick`, returning the first request the
/// session asks for.
pub(super) fn answer_all(
    session: &mut QuizSession,
    mut pick: impl FnMut(&Question) -> ChoiceSide,
) -> Option<GatewayRequest> {
    while let Some(question) = session.current_question().cloned() {
        let side = pick(&question);
        if let Some(request) = session.answer(&question.id, side).expect("answer accepted") {
            return Some(request);
        }
    }
    None
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

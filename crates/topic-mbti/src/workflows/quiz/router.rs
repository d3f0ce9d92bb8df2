use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ChoiceSide, QuestionId};
use super::gateway::QuizGateway;
use super::service::QuizService;
use super::session::{QuizError, SessionView};

/// Router builder exposing the quiz presentation boundary over HTTP.
pub fn quiz_router<G>(service: Arc<QuizService<G>>) -> Router
where
    G: QuizGateway + 'static,
{
    Router::new()
        .route("/api/v1/quiz", get(view_handler::<G>))
        .route("/api/v1/quiz/keyword", post(keyword_handler::<G>))
        .route(
            "/api/v1/quiz/suggestions/regenerate",
            post(regenerate_handler::<G>),
        )
        .route("/api/v1/quiz/topic", post(topic_handler::<G>))
        .route("/api/v1/quiz/answers", post(answer_handler::<G>))
        .route("/api/v1/quiz/back", post(back_handler::<G>))
        .route("/api/v1/quiz/restart", post(restart_handler::<G>))
        .route("/api/v1/quiz/transcript", get(transcript_handler::<G>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub keyword: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegenerateRequest {
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: String,
    pub choice: String,
}

fn status_for(error: &QuizError) -> StatusCode {
    match error {
        QuizError::Keyword(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuizError::InvalidTransition { .. }
        | QuizError::Busy(_)
        | QuizError::UnknownTopic(_)
        | QuizError::QuestionMismatch { .. } => StatusCode::CONFLICT,
        QuizError::NoResult => StatusCode::NOT_FOUND,
        QuizError::StaleSettlement
        | QuizError::UnexpectedOutcome { .. }
        | QuizError::StateUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(error: &QuizError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (status_for(error), axum::Json(payload)).into_response()
}

fn view_response(result: Result<SessionView, QuizError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn view_handler<G>(State(service): State<Arc<QuizService<G>>>) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(service.snapshot())
}

pub(crate) async fn keyword_handler<G>(
    State(service): State<Arc<QuizService<G>>>,
    axum::Json(request): axum::Json<KeywordRequest>,
) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(service.submit_keyword(&request.keyword).await)
}

pub(crate) async fn regenerate_handler<G>(
    State(service): State<Arc<QuizService<G>>>,
    axum::Json(request): axum::Json<RegenerateRequest>,
) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(
        service
            .regenerate_suggestions(request.style.as_deref())
            .await,
    )
}

pub(crate) async fn topic_handler<G>(
    State(service): State<Arc<QuizService<G>>>,
    axum::Json(request): axum::Json<TopicRequest>,
) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(service.select_topic(&request.topic).await)
}

pub(crate) async fn answer_handler<G>(
    State(service): State<Arc<QuizService<G>>>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    G: QuizGateway + 'static,
{
    let Some(side) = ChoiceSide::from_code(&request.choice) else {
        let payload = json!({
            "error": format!("choice must be \"L\" or \"R\", got {:?}", request.choice),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    let question_id = QuestionId(request.question_id);
    view_response(service.answer(&question_id, side).await)
}

pub(crate) async fn back_handler<G>(State(service): State<Arc<QuizService<G>>>) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(service.go_back())
}

pub(crate) async fn restart_handler<G>(State(service): State<Arc<QuizService<G>>>) -> Response
where
    G: QuizGateway + 'static,
{
    view_response(service.restart())
}

pub(crate) async fn transcript_handler<G>(State(service): State<Arc<QuizService<G>>>) -> Response
where
    G: QuizGateway + 'static,
{
    match service.transcript() {
        Ok((file_name, body)) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "text/plain; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename*=UTF-8''{}",
                        encode_file_name(&file_name)
                    ),
                ),
            ],
            body,
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

/// Percent-encodes a file name for the RFC 5987 `filename*` parameter.
fn encode_file_name(name: &str) -> String {
    name.bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                (byte as char).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}

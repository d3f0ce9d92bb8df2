//! Keyword to topic to questionnaire to four-letter type, with AI assistance at each
//! step and a local fallback wherever a failure must not strand the user.

pub mod domain;
pub mod export;
pub mod fallback;
pub mod gateway;
pub mod gemini;
pub mod router;
pub(crate) mod scoring;
pub mod service;
pub mod session;
pub(crate) mod tiebreak;

#[cfg(test)]
mod tests;

pub use domain::{
    Axis, BestMatch, Choice, ChoiceSide, ContributingQuestion, Dimension, InterpretationDetail,
    KeywordError, PersonalityType, Phase, Question, QuestionId, QuestionShapeError, QuizResult,
    Scores, TypeLetter, BASE_QUESTION_WEIGHT, KEYWORD_MAX_CHARS, KEYWORD_MIN_CHARS,
    MAX_QUESTION_WEIGHT, UNRESOLVED_LETTER,
};
pub use export::{share_text, transcript, transcript_file_name};
pub use fallback::{fallback_interpretation, fallback_questions};
pub use gateway::{GatewayCall, GatewayError, GatewayOutcome, GatewayRequest, QuizGateway, Ticket};
pub use gemini::GeminiGateway;
pub use router::quiz_router;
pub use scoring::{resolve_axis, tally, AxisOutcome};
pub use service::QuizService;
pub use session::{
    QuizError, QuizSession, SessionView, INTERPRETATION_FALLBACK_NOTICE, QUESTION_FALLBACK_NOTICE,
    SUGGESTION_FAILURE_MESSAGE,
};
pub use tiebreak::TieBreakState;

/// Styles offered when asking for a fresh batch of topic suggestions.
pub const SUGGESTION_STYLES: [&str; 3] = ["재미있게", "창의적으로", "심플하게"];

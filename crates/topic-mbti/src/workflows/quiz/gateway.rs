use async_trait::async_trait;
use serde::Deserialize;

use super::domain::{
    Axis, BestMatch, Choice, ChoiceSide, Dimension, InterpretationDetail, PersonalityType,
    Question, QuestionId,
};

/// Generative service the quiz depends on. Every operation may fail for any reason and
/// is never retried by the core.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    async fn suggest_topics(
        &self,
        keyword: &str,
        style: Option<&str>,
    ) -> Result<Vec<String>, GatewayError>;

    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>, GatewayError>;

    async fn generate_tie_breaker(&self, topic: &str, axis: Axis)
        -> Result<Question, GatewayError>;

    async fn generate_interpretation(
        &self,
        topic: &str,
        personality_type: &PersonalityType,
    ) -> Result<InterpretationDetail, GatewayError>;
}

/// Error raised by a gateway implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("gateway response contained no text")]
    EmptyResponse,
    #[error("gateway response was malformed: {0}")]
    Malformed(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Identifies one outstanding gateway call so a late settlement can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub(crate) u64);

/// A gateway operation the session is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    SuggestTopics {
        keyword: String,
        style: Option<String>,
    },
    GenerateQuestions {
        topic: String,
    },
    GenerateTieBreaker {
        topic: String,
        axis: Axis,
    },
    GenerateInterpretation {
        topic: String,
        personality_type: PersonalityType,
    },
}

impl GatewayCall {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SuggestTopics { .. } => "suggest_topics",
            Self::GenerateQuestions { .. } => "generate_questions",
            Self::GenerateTieBreaker { .. } => "generate_tie_breaker",
            Self::GenerateInterpretation { .. } => "generate_interpretation",
        }
    }

    pub async fn dispatch<G>(&self, gateway: &G) -> GatewayOutcome
    where
        G: QuizGateway + ?Sized,
    {
        match self {
            Self::SuggestTopics { keyword, style } => GatewayOutcome::Suggestions(
                gateway.suggest_topics(keyword, style.as_deref()).await,
            ),
            Self::GenerateQuestions { topic } => {
                GatewayOutcome::Questions(gateway.generate_questions(topic).await)
            }
            Self::GenerateTieBreaker { topic, axis } => {
                GatewayOutcome::TieBreaker(gateway.generate_tie_breaker(topic, *axis).await)
            }
            Self::GenerateInterpretation {
                topic,
                personality_type,
            } => GatewayOutcome::Interpretation(
                gateway
                    .generate_interpretation(topic, personality_type)
                    .await,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub ticket: Ticket,
    pub call: GatewayCall,
}

/// Settled result of a [`GatewayCall`].
#[derive(Debug, Clone)]
pub enum GatewayOutcome {
    Suggestions(Result<Vec<String>, GatewayError>),
    Questions(Result<Vec<Question>, GatewayError>),
    TieBreaker(Result<Question, GatewayError>),
    Interpretation(Result<InterpretationDetail, GatewayError>),
}

impl GatewayOutcome {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Suggestions(_) => "suggest_topics",
            Self::Questions(_) => "generate_questions",
            Self::TieBreaker(_) => "generate_tie_breaker",
            Self::Interpretation(_) => "generate_interpretation",
        }
    }
}

// Wire shapes: every field optional so presence is checked explicitly before a typed
// value is built.

#[derive(Debug, Deserialize)]
struct WireChoice {
    id: Option<String>,
    label: Option<String>,
    polarity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    id: Option<String>,
    text: Option<String>,
    icon: Option<String>,
    dimension: Option<String>,
    weight: Option<i64>,
    choices: Option<Vec<WireChoice>>,
}

#[derive(Debug, Deserialize)]
struct WireQuestionSet {
    questions: Option<Vec<WireQuestion>>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    #[serde(rename = "type")]
    type_code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireInterpretation {
    title: Option<String>,
    emoji: Option<String>,
    summary: Option<String>,
    #[serde(rename = "match")]
    best_match: Option<WireMatch>,
    strengths: Option<Vec<String>>,
    weaknesses: Option<Vec<String>>,
    characteristics: Option<Vec<String>>,
}

fn malformed(detail: impl Into<String>) -> GatewayError {
    GatewayError::Malformed(detail.into())
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, GatewayError> {
    value.ok_or_else(|| malformed(format!("missing field `{field}`")))
}

fn parse_json<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, GatewayError> {
    serde_json::from_str(text.trim()).map_err(|err| malformed(err.to_string()))
}

impl WireChoice {
    fn into_choice(self) -> Result<Choice, GatewayError> {
        let side_code = required(self.id, "choices[].id")?;
        let side = ChoiceSide::from_code(&side_code)
            .ok_or_else(|| malformed(format!("unknown choice id `{side_code}`")))?;
        let polarity_code = required(self.polarity, "choices[].polarity")?;
        let polarity = Dimension::from_code(&polarity_code)
            .ok_or_else(|| malformed(format!("unknown polarity `{polarity_code}`")))?;

        Ok(Choice {
            side,
            label: required(self.label, "choices[].label")?,
            polarity,
        })
    }
}

impl WireQuestion {
    fn into_question(self) -> Result<Question, GatewayError> {
        let id = required(self.id, "id")?;
        let axis_code = required(self.dimension, "dimension")?;
        let axis = Axis::from_code(&axis_code)
            .ok_or_else(|| malformed(format!("unknown dimension `{axis_code}`")))?;
        let weight = required(self.weight, "weight")?;
        let weight = u32::try_from(weight)
            .map_err(|_| malformed(format!("weight {weight} out of range")))?;

        let choices = required(self.choices, "choices")?;
        let count = choices.len();
        let [first, second]: [WireChoice; 2] = choices
            .try_into()
            .map_err(|_| malformed(format!("question {id} has {count} choices, expected 2")))?;

        let question = Question {
            id: QuestionId(id),
            text: required(self.text, "text")?,
            icon: self.icon.unwrap_or_default(),
            axis,
            weight,
            choices: [first.into_choice()?, second.into_choice()?],
        };
        question
            .validate()
            .map_err(|err| malformed(err.to_string()))?;
        Ok(question)
    }
}

/// Decode a JSON array of topic strings. An empty list is rejected.
pub fn decode_suggestions(text: &str) -> Result<Vec<String>, GatewayError> {
    let topics: Vec<String> = parse_json(text)?;
    let topics: Vec<String> = topics
        .into_iter()
        .map(|topic| topic.trim().to_string())
        .filter(|topic| !topic.is_empty())
        .collect();

    if topics.is_empty() {
        return Err(malformed("no topic suggestions returned"));
    }
    Ok(topics)
}

/// Decode `{"questions": [...]}` into typed questions.
pub fn decode_question_set(text: &str) -> Result<Vec<Question>, GatewayError> {
    let set: WireQuestionSet = parse_json(text)?;
    required(set.questions, "questions")?
        .into_iter()
        .map(WireQuestion::into_question)
        .collect()
}

pub fn decode_question(text: &str) -> Result<Question, GatewayError> {
    parse_json::<WireQuestion>(text)?.into_question()
}

pub fn decode_interpretation(text: &str) -> Result<InterpretationDetail, GatewayError> {
    let wire: WireInterpretation = parse_json(text)?;
    let best_match = required(wire.best_match, "match")?;

    Ok(InterpretationDetail {
        title: required(wire.title, "title")?,
        emoji: required(wire.emoji, "emoji")?,
        summary: required(wire.summary, "summary")?,
        best_match: BestMatch {
            type_code: required(best_match.type_code, "match.type")?,
            description: required(best_match.description, "match.description")?,
        },
        strengths: required(wire.strengths, "strengths")?,
        weaknesses: required(wire.weaknesses, "weaknesses")?,
        characteristics: required(wire.characteristics, "characteristics")?,
    })
}

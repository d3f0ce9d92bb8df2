use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub const KEYWORD_MIN_CHARS: usize = 2;
pub const KEYWORD_MAX_CHARS: usize = 20;

/// Letter substituted for an axis whose tie-break question could not be generated.
pub const UNRESOLVED_LETTER: char = 'X';

/// Weight of every question in a generated or fallback set.
pub const BASE_QUESTION_WEIGHT: u32 = 1;
/// Upper bound on any question weight, tie-breakers included.
pub const MAX_QUESTION_WEIGHT: u32 = 10;

/// One of the eight personality-trait letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Dimension {
    pub const fn all() -> [Self; 8] {
        [
            Self::E,
            Self::I,
            Self::S,
            Self::N,
            Self::T,
            Self::F,
            Self::J,
            Self::P,
        ]
    }

    pub const fn letter(self) -> char {
        match self {
            Self::E => 'E',
            Self::I => 'I',
            Self::S => 'S',
            Self::N => 'N',
            Self::T => 'T',
            Self::F => 'F',
            Self::J => 'J',
            Self::P => 'P',
        }
    }

    pub const fn axis(self) -> Axis {
        match self {
            Self::E | Self::I => Axis::EI,
            Self::S | Self::N => Axis::SN,
            Self::T | Self::F => Axis::TF,
            Self::J | Self::P => Axis::JP,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|dimension| code.trim().eq_ignore_ascii_case(&dimension.letter().to_string()))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Opposing dimension pair. Declaration order is the order of letters in a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    EI,
    SN,
    TF,
    JP,
}

impl Axis {
    pub const fn ordered() -> [Self; 4] {
        [Self::EI, Self::SN, Self::TF, Self::JP]
    }

    pub const fn dimensions(self) -> (Dimension, Dimension) {
        match self {
            Self::EI => (Dimension::E, Dimension::I),
            Self::SN => (Dimension::S, Dimension::N),
            Self::TF => (Dimension::T, Dimension::F),
            Self::JP => (Dimension::J, Dimension::P),
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::EI => "EI",
            Self::SN => "SN",
            Self::TF => "TF",
            Self::JP => "JP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|axis| code.trim().eq_ignore_ascii_case(axis.code()))
    }

    pub fn contains(self, dimension: Dimension) -> bool {
        let (left, right) = self.dimensions();
        dimension == left || dimension == right
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.dimensions();
        write!(f, "{left}/{right}")
    }
}

/// Which of a question's two options was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceSide {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl ChoiceSide {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Left => "L",
            Self::Right => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "L" | "l" => Some(Self::Left),
            "R" | "r" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "id")]
    pub side: ChoiceSide,
    pub label: String,
    pub polarity: Dimension,
}

/// Identifier wrapper for generated questions, unique within one session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Binary-choice question scoring toward one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "dimension")]
    pub axis: Axis,
    pub weight: u32,
    pub choices: [Choice; 2],
}

impl Question {
    pub fn choice(&self, side: ChoiceSide) -> &Choice {
        match self.choices.iter().find(|choice| choice.side == side) {
            Some(choice) => choice,
            None => &self.choices[0],
        }
    }

    /// Tie-break questions are the only ones carrying more than the base weight.
    pub fn is_tie_breaker(&self) -> bool {
        self.weight > 1
    }

    /// Structural checks applied before a generated question is trusted.
    pub fn validate(&self) -> Result<(), QuestionShapeError> {
        if self.id.0.trim().is_empty() {
            return Err(QuestionShapeError::MissingId);
        }
        if self.text.trim().is_empty() {
            return Err(QuestionShapeError::EmptyText(self.id.clone()));
        }
        if self.weight == 0 {
            return Err(QuestionShapeError::ZeroWeight(self.id.clone()));
        }
        if self.weight > MAX_QUESTION_WEIGHT {
            return Err(QuestionShapeError::WeightTooHigh {
                id: self.id.clone(),
                weight: self.weight,
            });
        }

        let [first, second] = &self.choices;
        if first.side == second.side {
            return Err(QuestionShapeError::DuplicateSide(self.id.clone()));
        }
        for choice in &self.choices {
            if !self.axis.contains(choice.polarity) {
                return Err(QuestionShapeError::AxisMismatch {
                    id: self.id.clone(),
                    axis: self.axis,
                    polarity: choice.polarity,
                });
            }
        }
        if first.polarity == second.polarity {
            return Err(QuestionShapeError::SamePolarity(self.id.clone()));
        }

        Ok(())
    }
}

/// Validate a full generated question set: every question well-formed at base weight,
/// ids unique.
pub fn validate_question_set(questions: &[Question]) -> Result<(), QuestionShapeError> {
    if questions.is_empty() {
        return Err(QuestionShapeError::EmptySet);
    }

    let mut seen = std::collections::BTreeSet::new();
    for question in questions {
        question.validate()?;
        if question.weight != BASE_QUESTION_WEIGHT {
            return Err(QuestionShapeError::NotBaseWeight {
                id: question.id.clone(),
                weight: question.weight,
            });
        }
        if !seen.insert(question.id.clone()) {
            return Err(QuestionShapeError::DuplicateId(question.id.clone()));
        }
    }

    Ok(())
}

/// Reasons a generated question or question set is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionShapeError {
    #[error("question set is empty")]
    EmptySet,
    #[error("question is missing an id")]
    MissingId,
    #[error("question {0} has no text")]
    EmptyText(QuestionId),
    #[error("question {0} has zero weight")]
    ZeroWeight(QuestionId),
    #[error("question {id} has weight {weight}, above the maximum of {max}", max = MAX_QUESTION_WEIGHT)]
    WeightTooHigh { id: QuestionId, weight: u32 },
    #[error("regular question {id} has weight {weight}, expected {base}", base = BASE_QUESTION_WEIGHT)]
    NotBaseWeight { id: QuestionId, weight: u32 },
    #[error("question {0} repeats the same choice side")]
    DuplicateSide(QuestionId),
    #[error("question {id} is tagged {axis} but a choice scores toward {polarity}")]
    AxisMismatch {
        id: QuestionId,
        axis: Axis,
        polarity: Dimension,
    },
    #[error("question {0} scores both choices toward the same dimension")]
    SamePolarity(QuestionId),
    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
    #[error("tie-breaker targets {found} but {expected} was requested")]
    WrongAxis { expected: Axis, found: Axis },
    #[error("tie-breaker {id} must outweigh regular questions (weight {weight})")]
    WeightTooLow { id: QuestionId, weight: u32 },
}

/// Answers keyed by question id, kept in answering order. Re-answering overwrites in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLog {
    entries: Vec<(QuestionId, ChoiceSide)>,
}

impl AnswerLog {
    pub fn record(&mut self, id: QuestionId, side: ChoiceSide) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = side,
            None => self.entries.push((id, side)),
        }
    }

    pub fn get(&self, id: &QuestionId) -> Option<ChoiceSide> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, side)| *side)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, ChoiceSide)> {
        self.entries.iter().map(|(id, side)| (id, *side))
    }
}

/// Accumulated weight per dimension. All eight letters are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores(BTreeMap<Dimension, u32>);

impl Default for Scores {
    fn default() -> Self {
        Self(Dimension::all().into_iter().map(|d| (d, 0)).collect())
    }
}

impl Scores {
    pub fn get(&self, dimension: Dimension) -> u32 {
        self.0.get(&dimension).copied().unwrap_or(0)
    }

    pub fn add(&mut self, dimension: Dimension, weight: u32) {
        let total = self.0.entry(dimension).or_insert(0);
        *total = total.saturating_add(weight);
    }

    /// Share of the axis held by its first dimension, 50 when nothing was scored.
    pub fn percentage(&self, axis: Axis) -> u32 {
        let (left, right) = axis.dimensions();
        let total = self.get(left).saturating_add(self.get(right));
        if total == 0 {
            return 50;
        }
        ((self.get(left) as f64 / total as f64) * 100.0).round() as u32
    }
}

/// One position of a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLetter {
    Resolved(Dimension),
    Unresolved,
}

impl TypeLetter {
    pub const fn as_char(self) -> char {
        match self {
            Self::Resolved(dimension) => dimension.letter(),
            Self::Unresolved => UNRESOLVED_LETTER,
        }
    }
}

/// Four-letter classification, one letter per axis in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonalityType([TypeLetter; 4]);

impl PersonalityType {
    pub const fn new(letters: [TypeLetter; 4]) -> Self {
        Self(letters)
    }

    pub fn has_unresolved(&self) -> bool {
        self.0.contains(&TypeLetter::Unresolved)
    }

    pub fn code(&self) -> String {
        self.0.iter().map(|letter| letter.as_char()).collect()
    }
}

impl fmt::Display for PersonalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for PersonalityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMatch {
    #[serde(rename = "type")]
    pub type_code: String,
    pub description: String,
}

/// Narrative interpretation of a type in the context of the chosen topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationDetail {
    pub title: String,
    pub emoji: String,
    pub summary: String,
    #[serde(rename = "match")]
    pub best_match: BestMatch,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub characteristics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributingQuestion {
    pub text: String,
    pub choice: String,
}

/// Terminal outcome of a completed session.
#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    #[serde(rename = "type")]
    pub personality_type: PersonalityType,
    pub scores: Scores,
    pub interpretation: InterpretationDetail,
    pub interpretation_fallback: bool,
    pub contributing_questions: Vec<ContributingQuestion>,
    pub completed_at: DateTime<Utc>,
}

/// Page the presentation layer should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Home,
    Suggesting,
    Suggested,
    QuizLoading,
    Quizzing,
    ResultLoading,
    Result,
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Suggesting => "Suggesting Topics",
            Self::Suggested => "Topic Suggestions",
            Self::QuizLoading => "Preparing Quiz",
            Self::Quizzing => "Quiz",
            Self::ResultLoading => "Analyzing Result",
            Self::Result => "Result",
        }
    }

    /// Phases during which a gateway call is outstanding.
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Suggesting | Self::QuizLoading | Self::ResultLoading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("keyword must be {min}-{max} characters long (found {length})", min = KEYWORD_MIN_CHARS, max = KEYWORD_MAX_CHARS)]
pub struct KeywordError {
    pub length: usize,
}

/// Length is counted in characters so Hangul keywords are measured the way users type them.
pub fn validate_keyword(keyword: &str) -> Result<(), KeywordError> {
    let length = keyword.chars().count();
    if (KEYWORD_MIN_CHARS..=KEYWORD_MAX_CHARS).contains(&length) {
        Ok(())
    } else {
        Err(KeywordError { length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(axis: Axis, left: Dimension, right: Dimension) -> Question {
        Question {
            id: QuestionId::from("q1"),
            text: "text".to_string(),
            icon: String::new(),
            axis,
            weight: 1,
            choices: [
                Choice {
                    side: ChoiceSide::Left,
                    label: "left".to_string(),
                    polarity: left,
                },
                Choice {
                    side: ChoiceSide::Right,
                    label: "right".to_string(),
                    polarity: right,
                },
            ],
        }
    }

    #[test]
    fn keyword_bounds_are_inclusive() {
        assert!(validate_keyword("여").is_err());
        assert!(validate_keyword("여행").is_ok());
        assert!(validate_keyword(&"가".repeat(20)).is_ok());
        assert_eq!(
            validate_keyword(&"가".repeat(21)),
            Err(KeywordError { length: 21 })
        );
    }

    #[test]
    fn question_rejects_cross_axis_choices() {
        let bad = question(Axis::EI, Dimension::E, Dimension::N);
        assert!(matches!(
            bad.validate(),
            Err(QuestionShapeError::AxisMismatch { .. })
        ));

        let same = question(Axis::EI, Dimension::E, Dimension::E);
        assert!(matches!(
            same.validate(),
            Err(QuestionShapeError::SamePolarity(_))
        ));

        assert!(question(Axis::JP, Dimension::P, Dimension::J)
            .validate()
            .is_ok());
    }

    #[test]
    fn answer_log_overwrites_in_place() {
        let mut log = AnswerLog::default();
        log.record(QuestionId::from("a"), ChoiceSide::Left);
        log.record(QuestionId::from("b"), ChoiceSide::Left);
        log.record(QuestionId::from("a"), ChoiceSide::Right);

        let order: Vec<_> = log.iter().map(|(id, side)| (id.0.clone(), side)).collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), ChoiceSide::Right),
                ("b".to_string(), ChoiceSide::Left)
            ]
        );
    }

    #[test]
    fn personality_type_serializes_as_code() {
        let code = PersonalityType::new([
            TypeLetter::Resolved(Dimension::E),
            TypeLetter::Unresolved,
            TypeLetter::Resolved(Dimension::F),
            TypeLetter::Resolved(Dimension::P),
        ]);
        assert_eq!(code.to_string(), "EXFP");
        assert_eq!(
            serde_json::to_value(code).expect("serializes"),
            serde_json::json!("EXFP")
        );
    }

    #[test]
    fn scores_saturate_instead_of_overflowing() {
        let mut scores = Scores::default();
        scores.add(Dimension::E, u32::MAX);
        scores.add(Dimension::E, 2);
        scores.add(Dimension::I, 1);

        assert_eq!(scores.get(Dimension::E), u32::MAX);
        assert_eq!(scores.percentage(Axis::EI), 100);
    }

    #[test]
    fn question_weights_are_bounded() {
        let mut question = question(Axis::EI, Dimension::E, Dimension::I);
        question.weight = MAX_QUESTION_WEIGHT;
        assert!(question.validate().is_ok());
        assert!(matches!(
            validate_question_set(std::slice::from_ref(&question)),
            Err(QuestionShapeError::NotBaseWeight { weight: 10, .. })
        ));

        question.weight = MAX_QUESTION_WEIGHT + 1;
        assert!(matches!(
            question.validate(),
            Err(QuestionShapeError::WeightTooHigh { weight: 11, .. })
        ));
    }

    #[test]
    fn scores_serialize_every_dimension() {
        let value = serde_json::to_value(Scores::default()).expect("serializes");
        let map = value.as_object().expect("object");
        assert_eq!(map.len(), 8);
        assert_eq!(map["J"], 0);
    }
}

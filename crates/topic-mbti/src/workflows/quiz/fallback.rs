//! Offline question battery and interpretation used when generation fails.

use super::domain::{
    Axis, BestMatch, Choice, ChoiceSide, Dimension, InterpretationDetail, PersonalityType,
    Question, QuestionId, BASE_QUESTION_WEIGHT,
};

const TOPIC_PLACEHOLDER: &str = "{topic}";

struct QuestionTemplate {
    text: &'static str,
    icon: &'static str,
    left: &'static str,
    right: &'static str,
}

const fn template(
    text: &'static str,
    icon: &'static str,
    left: &'static str,
    right: &'static str,
) -> QuestionTemplate {
    QuestionTemplate {
        text,
        icon,
        left,
        right,
    }
}

static EI_TEMPLATES: [QuestionTemplate; 3] = [
    template(
        "{topic} 상황에서, 나는 주로",
        "🎉",
        "여러 사람과 함께하며 에너지를 얻는다",
        "혼자 조용히 생각하며 에너지를 얻는다",
    ),
    template(
        "새로운 {topic} 프로젝트를 시작할 때, 나는",
        "🏃",
        "먼저 행동하고 나중에 생각한다",
        "충분히 생각한 후 행동한다",
    ),
    template(
        "{topic}에 대해 이야기할 때, 나는",
        "🗣️",
        "폭넓은 대화를 통해 아이디어를 발전시킨다",
        "깊이 있는 소수의 대화를 선호한다",
    ),
];

static SN_TEMPLATES: [QuestionTemplate; 3] = [
    template(
        "{topic} 문제를 해결할 때, 나는",
        "🌳",
        "실제 경험과 사실에 더 집중한다",
        "미래의 가능성과 아이디어를 더 탐구한다",
    ),
    template(
        "{topic}에 대한 정보를 받아들일 때, 나는",
        "🔍",
        "구체적이고 현실적인 설명을 선호한다",
        "비유적이고 추상적인 설명을 선호한다",
    ),
    template(
        "{topic} 관련 업무를 처리할 때, 나는",
        "🛠️",
        "검증된 방식으로 일하는 것을 선호한다",
        "새로운 방식으로 시도하는 것을 즐긴다",
    ),
];

static TF_TEMPLATES: [QuestionTemplate; 3] = [
    template(
        "{topic}에 대한 결정을 내릴 때, 나는",
        "📊",
        "객관적인 사실과 논리를 중시한다",
        "사람들과의 관계와 감정을 중시한다",
    ),
    template(
        "{topic}에 대해 피드백을 줄 때, 나는",
        "❤️",
        "결정이 가져올 결과에 대해 분석한다",
        "결정이 사람들에게 미칠 영향에 공감한다",
    ),
    template(
        "{topic} 결과에 대해 동료에게 피드백을 줄 때, 나는",
        "⚖️",
        "진실과 효율성을 위해 솔직하게 비판한다",
        "상대방의 기분을 고려하여 조심스럽게 말한다",
    ),
];

static JP_TEMPLATES: [QuestionTemplate; 3] = [
    template(
        "{topic}을 진행할 때 나의 스타일은",
        "📅",
        "계획을 세우고 체계적으로 진행한다",
        "상황에 맞춰 유연하게 대처한다",
    ),
    template(
        "{topic} 마감일을 앞두고, 나는",
        "🎨",
        "마감 기한을 지키는 것이 중요하다",
        "자유로운 분위기에서 더 능률이 오른다",
    ),
    template(
        "{topic}을 위한 나의 작업 공간은,",
        "🧭",
        "정리된 환경에서 안정을 느낀다",
        "다소 어수선해도 자유로운 환경을 즐긴다",
    ),
];

fn templates_for(axis: Axis) -> &'static [QuestionTemplate; 3] {
    match axis {
        Axis::EI => &EI_TEMPLATES,
        Axis::SN => &SN_TEMPLATES,
        Axis::TF => &TF_TEMPLATES,
        Axis::JP => &JP_TEMPLATES,
    }
}

fn choice(side: ChoiceSide, label: &str, polarity: Dimension) -> Choice {
    Choice {
        side,
        label: label.to_string(),
        polarity,
    }
}

/// Twelve weight-1 questions, three per axis in axis order, ids `fallback_1..=12`.
/// Pure and deterministic for a given topic.
pub fn fallback_questions(topic: &str) -> Vec<Question> {
    Axis::ordered()
        .into_iter()
        .flat_map(|axis| templates_for(axis).iter().map(move |t| (axis, t)))
        .enumerate()
        .map(|(index, (axis, template))| {
            let (left, right) = axis.dimensions();
            Question {
                id: QuestionId(format!("fallback_{}", index + 1)),
                text: template.text.replace(TOPIC_PLACEHOLDER, topic),
                icon: template.icon.to_string(),
                axis,
                weight: BASE_QUESTION_WEIGHT,
                choices: [
                    choice(ChoiceSide::Left, template.left, left),
                    choice(ChoiceSide::Right, template.right, right),
                ],
            }
        })
        .collect()
}

/// Fixed payload attached when the interpretation call fails.
pub fn fallback_interpretation(topic: &str, personality_type: &PersonalityType) -> InterpretationDetail {
    InterpretationDetail {
        title: "결과를 분석하지 못했어요".to_string(),
        emoji: "😢".to_string(),
        summary: format!("\"{topic}\"에 대한 당신의 MBTI 유형은 {personality_type} 입니다."),
        best_match: BestMatch {
            type_code: "N/A".to_string(),
            description: "AI 분석에 실패하여 추천할 수 없습니다.".to_string(),
        },
        strengths: Vec::new(),
        weaknesses: Vec::new(),
        characteristics: vec!["AI 오류".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::quiz::domain::{validate_question_set, TypeLetter};

    #[test]
    fn battery_is_deterministic_and_balanced() {
        let first = fallback_questions("여행");
        let second = fallback_questions("여행");
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);

        for axis in Axis::ordered() {
            let count = first.iter().filter(|q| q.axis == axis).count();
            assert_eq!(count, 3, "axis {axis} should have three questions");
        }
        assert!(first.iter().all(|q| q.weight == 1));
        assert_eq!(first[0].id.as_str(), "fallback_1");
        assert_eq!(first[11].id.as_str(), "fallback_12");
        validate_question_set(&first).expect("fallback battery is well-formed");
    }

    #[test]
    fn topic_is_substituted_into_every_question() {
        let questions = fallback_questions("캠핑");
        assert!(questions.iter().all(|q| q.text.contains("캠핑")));
        assert!(questions.iter().all(|q| !q.text.contains(TOPIC_PLACEHOLDER)));
        assert_eq!(questions[0].text, "캠핑 상황에서, 나는 주로");
    }

    #[test]
    fn fallback_interpretation_mentions_topic_and_type() {
        let code = PersonalityType::new([
            TypeLetter::Resolved(Dimension::I),
            TypeLetter::Resolved(Dimension::N),
            TypeLetter::Unresolved,
            TypeLetter::Resolved(Dimension::J),
        ]);
        let detail = fallback_interpretation("여행", &code);
        assert!(detail.summary.contains("여행"));
        assert!(detail.summary.contains("INXJ"));
        assert!(detail.strengths.is_empty());
        assert!(detail.weaknesses.is_empty());
    }
}

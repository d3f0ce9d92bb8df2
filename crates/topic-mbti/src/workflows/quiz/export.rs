use std::fmt::Write as _;

use super::domain::QuizResult;
use super::session::QuizSession;

const TRANSCRIPT_BANNER: &str = " AI Topic MBTI - 생성된 테스트 정보";
const QUESTIONS_HEADER: &str = " 📝 생성된 질문 및 보기 전체";
const HEAVY_RULE: &str = "========================================";
const LIGHT_RULE: &str = "----------------------------------------";
const SELECTED_MARK: &str = "▶";
const UNSELECTED_MARK: &str = "○";

/// Plain-text transcript of the session: topic, final type, and every question with the
/// selected choice marked. Types still being computed render as an empty line.
pub fn transcript(session: &QuizSession) -> String {
    let personality_type = session
        .result()
        .map(|result| result.personality_type.code())
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{HEAVY_RULE}\n{TRANSCRIPT_BANNER}\n{HEAVY_RULE}\n");
    let _ = writeln!(out, "주제: {}\n", session.topic());
    let _ = writeln!(
        out,
        "{LIGHT_RULE}\n 최종 MBTI 유형: {personality_type}\n{LIGHT_RULE}\n"
    );
    let _ = writeln!(out, "{HEAVY_RULE}\n{QUESTIONS_HEADER}\n{HEAVY_RULE}\n");

    for (index, question) in session.questions().iter().enumerate() {
        let selected = session.answers().get(&question.id);
        let _ = writeln!(out, "{}. {}", index + 1, question.text);
        for choice in &question.choices {
            let mark = if selected == Some(choice.side) {
                SELECTED_MARK
            } else {
                UNSELECTED_MARK
            };
            let _ = writeln!(out, "   {mark} {}", choice.label);
        }
        let _ = writeln!(out);
    }

    out
}

/// `mbti_test_<topic>.txt` with each whitespace run collapsed to a single underscore.
pub fn transcript_file_name(topic: &str) -> String {
    let slug = topic.split_whitespace().collect::<Vec<_>>().join("_");
    format!("mbti_test_{slug}.txt")
}

pub fn share_text(result: &QuizResult) -> String {
    format!(
        "나의 Topic MBTI 결과는 \"{}: {}\" 입니다!\n\n{}\n\n여러분도 테스트해보세요!",
        result.personality_type, result.interpretation.title, result.interpretation.summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_collapses_whitespace_runs() {
        assert_eq!(
            transcript_file_name("여행 스타일  테스트"),
            "mbti_test_여행_스타일_테스트.txt"
        );
        assert_eq!(transcript_file_name("캠핑"), "mbti_test_캠핑.txt");
    }

    #[test]
    fn empty_session_transcript_has_only_the_header() {
        let session = QuizSession::new();
        let text = transcript(&session);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEAVY_RULE);
        assert_eq!(lines[1], TRANSCRIPT_BANNER);
        assert!(text.contains(&format!("{LIGHT_RULE}\n 최종 MBTI 유형: \n{LIGHT_RULE}\n")));
        assert!(text.ends_with(&format!("{QUESTIONS_HEADER}\n{HEAVY_RULE}\n\n")));
        assert!(!text.contains(SELECTED_MARK));
    }
}

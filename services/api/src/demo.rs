use crate::infra::OfflineGateway;
use clap::Args;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use topic_mbti::config::AppConfig;
use topic_mbti::error::AppError;
use topic_mbti::workflows::quiz::{
    share_text, Axis, ChoiceSide, GeminiGateway, Phase, Question, QuizError, QuizGateway,
    QuizResult, QuizService, SessionView, SUGGESTION_STYLES,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Keyword used to seed topic suggestions.
    #[arg(long, default_value = "여행")]
    pub(crate) keyword: String,
    /// Write the finished transcript to this path.
    #[arg(long)]
    pub(crate) transcript: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PlayArgs {
    /// Play without contacting Gemini; the local question battery is used.
    #[arg(long)]
    pub(crate) offline: bool,
    /// Write the finished transcript to this path.
    #[arg(long)]
    pub(crate) transcript: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        keyword,
        transcript,
    } = args;

    println!("Topic MBTI demo (offline gateway)");
    let service = QuizService::new(Arc::new(OfflineGateway));

    let view = service.submit_keyword(&keyword).await?;
    render_suggestions(&view);
    let Some(topic) = view.suggestions.first().cloned() else {
        println!("No topics were suggested for \"{keyword}\".");
        return Ok(());
    };
    println!("\nSelected topic: {topic}");

    let mut view = service.select_topic(&topic).await?;
    if let Some(notice) = &view.error {
        println!("Notice: {notice}");
    }

    while let Some(question) = view.current_question.clone() {
        let choice = question.choice(ChoiceSide::Left);
        println!(
            "[{}/{}] {} {} -> {}",
            view.question_number.unwrap_or_default(),
            view.total_questions,
            question.icon,
            question.text,
            choice.label
        );
        view = service.answer(&question.id, ChoiceSide::Left).await?;
    }

    if let Some(result) = &view.result {
        render_result(result);
    }
    if let Some(path) = transcript {
        save_transcript(&service, &path)?;
    }

    Ok(())
}

pub(crate) async fn run_play(args: PlayArgs) -> Result<(), AppError> {
    let PlayArgs {
        offline,
        transcript,
    } = args;

    if offline {
        return play(QuizService::new(Arc::new(OfflineGateway)), transcript).await;
    }

    let config = AppConfig::load()?;
    let api_key = config.gateway.require_api_key()?;
    let gateway = GeminiGateway::new(api_key, &config.gateway)?;
    play(QuizService::new(Arc::new(gateway)), transcript).await
}

async fn play<G>(service: QuizService<G>, transcript: Option<PathBuf>) -> Result<(), AppError>
where
    G: QuizGateway + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = service.snapshot()?;

    println!("AI Topic MBTI");
    loop {
        match view.phase {
            Phase::Home => {
                if let Some(error) = &view.error {
                    println!("! {error}");
                }
                let Some(input) = prompt(&mut lines, "\n키워드를 입력하세요 (2-20자, q 종료)").await?
                else {
                    break;
                };
                if input == "q" {
                    break;
                }
                view = match service.submit_keyword(&input).await {
                    Err(QuizError::Keyword(err)) => {
                        println!("! {err}");
                        continue;
                    }
                    other => other?,
                };
            }
            Phase::Suggested => {
                render_suggestions(&view);
                println!("스타일: {}", SUGGESTION_STYLES.join(", "));
                let Some(input) =
                    prompt(&mut lines, "번호 선택 / r [스타일] 재추천 / b 뒤로").await?
                else {
                    break;
                };
                view = if input == "b" {
                    service.go_back()?
                } else if let Some(rest) = input.strip_prefix('r') {
                    let style = rest.trim();
                    service
                        .regenerate_suggestions((!style.is_empty()).then_some(style))
                        .await?
                } else {
                    match input
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|index| view.suggestions.get(index).cloned())
                    {
                        Some(topic) => {
                            let next = service.select_topic(&topic).await?;
                            if let Some(notice) = &next.error {
                                println!("! {notice}");
                            }
                            next
                        }
                        None => {
                            println!("! 목록에 있는 번호를 입력하세요.");
                            continue;
                        }
                    }
                };
            }
            Phase::Quizzing => {
                let Some(question) = view.current_question.clone() else {
                    break;
                };
                render_question(&view, &question);
                let Some(input) = prompt(&mut lines, "1 또는 2").await? else {
                    break;
                };
                let side = match input.as_str() {
                    "1" => ChoiceSide::Left,
                    "2" => ChoiceSide::Right,
                    other => match ChoiceSide::from_code(other) {
                        Some(side) => side,
                        None => {
                            println!("! 1 또는 2를 입력하세요.");
                            continue;
                        }
                    },
                };
                view = service.answer(&question.id, side).await?;
            }
            Phase::Result => {
                if let Some(result) = &view.result {
                    render_result(result);
                }
                if let Some(path) = &transcript {
                    save_transcript(&service, path)?;
                }
                let Some(input) = prompt(&mut lines, "\nr 다시 하기 / q 종료").await? else {
                    break;
                };
                if input != "r" {
                    break;
                }
                view = service.restart()?;
            }
            Phase::Suggesting | Phase::QuizLoading | Phase::ResultLoading => {
                view = service.snapshot()?;
                if view.phase.is_loading() {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>, AppError> {
    print!("{label} > ");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

fn save_transcript<G>(service: &QuizService<G>, path: &Path) -> Result<(), AppError>
where
    G: QuizGateway + 'static,
{
    let (file_name, body) = service.transcript()?;
    let target = if path.is_dir() {
        path.join(file_name)
    } else {
        path.to_path_buf()
    };
    std::fs::write(&target, body)?;
    println!("Transcript saved to {}", target.display());
    Ok(())
}

fn render_suggestions(view: &SessionView) {
    println!("\nTopics for \"{}\":", view.keyword);
    for (index, topic) in view.suggestions.iter().enumerate() {
        println!("  {}. {topic}", index + 1);
    }
}

fn render_question(view: &SessionView, question: &Question) {
    let marker = if view.is_tie_breaker {
        " [tie-breaker]"
    } else {
        ""
    };
    println!(
        "\n[{}/{}] {:.0}%{marker}",
        view.question_number.unwrap_or_default(),
        view.total_questions,
        view.progress * 100.0
    );
    println!("{} {}", question.icon, question.text);
    println!("  1. {}", question.choice(ChoiceSide::Left).label);
    println!("  2. {}", question.choice(ChoiceSide::Right).label);
}

fn render_result(result: &QuizResult) {
    let detail = &result.interpretation;
    println!("\n{} {} - {}", detail.emoji, result.personality_type, detail.title);
    println!("{}", detail.summary);

    println!("Axis balance:");
    for axis in Axis::ordered() {
        let (left, right) = axis.dimensions();
        let share = result.scores.percentage(axis);
        println!("  - {left} {share}% | {right} {}%", 100 - share);
    }

    println!(
        "Best match: {} ({})",
        detail.best_match.type_code, detail.best_match.description
    );
    if !detail.strengths.is_empty() {
        println!("Strengths: {}", detail.strengths.join(", "));
    }
    if !detail.weaknesses.is_empty() {
        println!("Weaknesses: {}", detail.weaknesses.join(", "));
    }
    println!("Keywords: {}", detail.characteristics.join(" #"));

    if !result.contributing_questions.is_empty() {
        println!("Answers that shaped this result:");
        for question in &result.contributing_questions {
            println!("  - {} -> {}", question.text, question.choice);
        }
    }

    println!("\n{}", share_text(result));
}

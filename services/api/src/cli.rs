use crate::demo::{run_demo, run_play, DemoArgs, PlayArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use topic_mbti::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Topic MBTI",
    about = "Serve or play the AI topic MBTI quiz from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Play the quiz interactively in the terminal
    Play(PlayArgs),
    /// Run a scripted offline quiz that exercises every fallback
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Play(args) => run_play(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["topic-mbti-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_demo_and_play_flags() {
        let cli = Cli::try_parse_from(["topic-mbti-api", "demo", "--keyword", "캠핑"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => assert_eq!(args.keyword, "캠핑"),
            other => panic!("expected demo command, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["topic-mbti-api", "play", "--offline"]).expect("parses");
        match cli.command {
            Some(Command::Play(args)) => assert!(args.offline),
            other => panic!("expected play command, got {other:?}"),
        }
    }
}

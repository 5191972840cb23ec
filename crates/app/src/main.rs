//! Terminal runner for a live exam attempt.
//!
//! Binary glue only: argument parsing, backend wiring, and a line-oriented
//! command loop over stdin. All exam semantics live in the services crate;
//! the one-second ticker and the auto-submit at expiry run regardless of
//! what the user types here.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use url::Url;

use backend::{
    AttemptRepository, BackendConfig, HttpBackend, ResponsePersistence, SubmissionGateway,
    TranslationProvider,
};
use exam_core::model::{AnswerOption, AttemptId};
use services::hooks::{NoopHooks, PresentationHooks};
use services::view::format_remaining;
use services::{AttemptController, Clock, QuestionStatus, SubmitOutcome};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidBaseUrl { raw: String },
    InvalidAttemptId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => {
                write!(f, "{flag} is required (flag or environment)")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
            ArgsError::InvalidAttemptId { raw } => write!(f, "invalid --attempt-id value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- --base-url <url> --token <token> --attempt-id <id>");
    eprintln!();
    eprintln!("Environment fallbacks:");
    eprintln!("  EXAM_BASE_URL, EXAM_SESSION_TOKEN, EXAM_ATTEMPT_ID");
    eprintln!();
    eprintln!("Commands once running:");
    eprintln!("  next | prev | goto <n>      navigate (1-based)");
    eprintln!("  a|b|c|d                     answer the current question");
    eprintln!("  clear | mark                clear selection / toggle review mark");
    eprintln!("  lang                        switch between renditions");
    eprintln!("  pause | resume              freeze / unfreeze the countdown");
    eprintln!("  palette | summary | time    progress views");
    eprintln!("  submit                      submit the attempt");
    eprintln!("  quit                        leave without submitting");
}

struct Args {
    config: BackendConfig,
    attempt_id: AttemptId,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut base_url = std::env::var("EXAM_BASE_URL").ok();
        let mut token = std::env::var("EXAM_SESSION_TOKEN").ok();
        let mut attempt_id = std::env::var("EXAM_ATTEMPT_ID").ok();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => base_url = Some(require_value(args, "--base-url")?),
                "--token" => token = Some(require_value(args, "--token")?),
                "--attempt-id" => attempt_id = Some(require_value(args, "--attempt-id")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let raw_url = base_url.ok_or(ArgsError::MissingFlag { flag: "--base-url" })?;
        let base_url = raw_url
            .parse::<Url>()
            .map_err(|_| ArgsError::InvalidBaseUrl { raw: raw_url })?;
        let token = token
            .filter(|value| !value.trim().is_empty())
            .ok_or(ArgsError::MissingFlag { flag: "--token" })?;
        let raw_id = attempt_id.ok_or(ArgsError::MissingFlag { flag: "--attempt-id" })?;
        let attempt_id = raw_id
            .parse::<AttemptId>()
            .map_err(|_| ArgsError::InvalidAttemptId { raw: raw_id })?;

        Ok(Self {
            config: BackendConfig::new(base_url, token),
            attempt_id,
        })
    }
}

fn print_question(controller: &AttemptController) {
    controller.with_session(|session| {
        let question = session.current_question();
        let response = session.attempt().response(question.id());
        let total = session.attempt().question_count();

        println!();
        println!(
            "Question {}/{}  [{}]  remaining {}",
            session.cursor() + 1,
            total,
            question.id(),
            format_remaining(session.remaining_seconds()),
        );
        println!("{}", question.text());
        for option in AnswerOption::ALL {
            let chosen = if response.selected == Some(option) {
                '*'
            } else {
                ' '
            };
            println!(" {chosen}{}. {}", option.as_str(), question.option(option));
        }
        if response.marked_for_review {
            println!("   (marked for review)");
        }
    });
}

fn print_palette(controller: &AttemptController) {
    let cells: Vec<String> = controller
        .palette()
        .iter()
        .map(|entry| {
            let status = match entry.status {
                QuestionStatus::Unanswered => '.',
                QuestionStatus::Answered => 'o',
                QuestionStatus::Marked => '?',
                QuestionStatus::AnsweredAndMarked => '!',
            };
            if entry.is_current {
                format!("[{status}]")
            } else {
                status.to_string()
            }
        })
        .collect();
    println!("{}  (o answered, ? marked, ! both, . blank)", cells.join(" "));
}

fn print_summary(controller: &AttemptController) {
    let summary = controller.review_summary();
    println!(
        "{} questions: {} answered, {} marked, {} marked+answered, {} unanswered",
        summary.total,
        summary.answered,
        summary.marked,
        summary.marked_and_answered,
        summary.unanswered,
    );
}

async fn apply_command(controller: &AttemptController, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return false;
    };

    match command {
        "next" => {
            controller.next();
            print_question(controller);
        }
        "prev" => {
            controller.prev();
            print_question(controller);
        }
        "goto" => match words.next().and_then(|raw| raw.parse::<usize>().ok()) {
            Some(position) if position > 0 => {
                controller.go_to(position - 1);
                print_question(controller);
            }
            _ => println!("goto needs a 1-based question number"),
        },
        "a" | "b" | "c" | "d" => {
            // Single letters answer the current question directly.
            if let Ok(option) = command.parse::<AnswerOption>() {
                let id = controller.with_session(|s| s.current_question().id());
                if controller.select_option(id, option) {
                    print_question(controller);
                } else {
                    println!("the attempt no longer accepts answers");
                }
            }
        }
        "clear" => {
            let id = controller.with_session(|s| s.current_question().id());
            if !controller.clear_response(id) {
                println!("the attempt no longer accepts answers");
            }
        }
        "mark" => {
            let id = controller.with_session(|s| s.current_question().id());
            match controller.toggle_mark(id) {
                Some(true) => println!("marked for review"),
                Some(false) => println!("mark removed"),
                None => println!("the attempt no longer accepts changes"),
            }
        }
        "lang" => {
            controller.toggle_display();
            print_question(controller);
        }
        "pause" => {
            if controller.pause() {
                println!("countdown paused");
            }
        }
        "resume" => {
            if controller.resume() {
                println!("countdown resumed");
            }
        }
        "palette" => print_palette(controller),
        "summary" => print_summary(controller),
        "time" => {
            let remaining = controller.with_session(|s| s.remaining_seconds());
            println!("remaining {}", format_remaining(remaining));
        }
        "submit" => {
            print_summary(controller);
            match controller.submit().await {
                Ok(SubmitOutcome::Submitted(result_id)) => {
                    println!("submitted; result id {result_id}");
                    return true;
                }
                Ok(SubmitOutcome::Ignored) => println!("a submission is already in flight"),
                Ok(SubmitOutcome::AlreadyTerminal) => return true,
                Err(err) => println!("submission failed, you may retry: {err}"),
            }
        }
        "quit" => return true,
        "help" => print_usage(),
        other => println!("unknown command: {other} (try help)"),
    }
    false
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|err| {
        eprintln!("{err}");
        print_usage();
        err
    })?;

    let backend = Arc::new(HttpBackend::new(parsed.config));
    let controller = Arc::new(
        AttemptController::load(
            parsed.attempt_id,
            backend.as_ref() as &dyn AttemptRepository,
            Arc::clone(&backend) as Arc<dyn ResponsePersistence>,
            Arc::clone(&backend) as Arc<dyn TranslationProvider>,
            Arc::clone(&backend) as Arc<dyn SubmissionGateway>,
            Arc::new(NoopHooks) as Arc<dyn PresentationHooks>,
            Clock::default_clock(),
        )
        .await?,
    );
    controller.warm_up();
    let ticker = controller.run_ticker();

    info!(attempt_id = %controller.attempt_id(), "attempt session started");
    print_question(&controller);
    println!("(type help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if apply_command(&controller, &line).await {
            break;
        }
        // The ticker may have auto-submitted while we waited for input.
        if controller.with_session(services::ExamSession::is_terminal) {
            if let Some(result_id) = controller.with_session(|s| s.result_id()) {
                println!("time expired; attempt submitted with result id {result_id}");
            }
            break;
        }
    }

    ticker.abort();
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

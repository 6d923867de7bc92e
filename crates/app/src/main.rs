mod demo;
mod terminal;

use std::fmt;
use std::io::Write as _;
use std::sync::Arc;

use services::config::{parse_delay, parse_proxy, parse_scoring, parse_url};
use services::{
    ConfigError, ControllerSettings, HttpQuestionProvider, QuestionProvider, QuizConfig,
    QuizController, QuizError, StaticQuestionProvider,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use terminal::{Input, option_for, render};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ConfigError> for ArgsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--source <url>] [--proxy <url|none>] [--delay-ms <ms>]");
    eprintln!("                      [--scoring <per-submission|first-correct>] [--demo]");
    eprintln!();
    eprintln!("Controls: 1-9 answer, b previous question, r reset, q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_SOURCE_URL, QUIZ_PROXY_URL, QUIZ_ADVANCE_DELAY_MS, QUIZ_SCORING, RUST_LOG");
}

struct Args {
    config: QuizConfig,
    demo: bool,
}

impl Args {
    /// Returns `None` when usage was requested.
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut config = QuizConfig::from_env()?;
        let mut demo = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--source" => {
                    config.source_url = parse_url("source", &require_value(args, "--source")?)?;
                }
                "--proxy" => config.proxy_url = parse_proxy(&require_value(args, "--proxy")?)?,
                "--delay-ms" => {
                    config.advance_delay = parse_delay(&require_value(args, "--delay-ms")?)?;
                }
                "--scoring" => config.scoring = parse_scoring(&require_value(args, "--scoring")?)?,
                "--demo" => demo = true,
                "--help" | "-h" => {
                    print_usage();
                    return Ok(None);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self { config, demo }))
    }
}

fn show(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        return Ok(());
    };

    tracing::info!(
        source = %args.config.source_url,
        demo = args.demo,
        delay_ms = args.config.advance_delay.as_millis(),
        "starting quiz"
    );
    let provider: Arc<dyn QuestionProvider> = if args.demo {
        Arc::new(StaticQuestionProvider::new(demo::questions()))
    } else {
        Arc::new(HttpQuestionProvider::new(args.config.clone()))
    };
    let controller = QuizController::new(provider, ControllerSettings::from(&args.config));
    let mut updates = controller.subscribe();

    show(&render(&controller.snapshot()?, None))?;
    controller.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        show(&render(&snapshot, controller.summary()?.as_ref()))?;
        if snapshot.phase.is_empty() {
            // No retry; the session ends here.
            return Ok(());
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match Input::parse(&line) {
                    Some(Input::Quit) => return Ok(()),
                    Some(Input::Choose(number)) => match option_for(&snapshot, number) {
                        Some(option) => match controller.submit_answer(option) {
                            Ok(_) => {}
                            Err(err @ (QuizError::NotInProgress | QuizError::UnknownOption { .. })) => {
                                show(&err.to_string())?;
                            }
                            Err(err) => return Err(err.into()),
                        },
                        None => show(&format!("no option {number}"))?,
                    },
                    Some(Input::Previous) => {
                        controller.go_to_previous_question()?;
                    }
                    Some(Input::Reset) => controller.reset()?,
                    None => {
                        tracing::debug!(line = line.trim(), "unrecognized input");
                        show("unrecognized input")?;
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,services=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

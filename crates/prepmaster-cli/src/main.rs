//! PrepMaster CLI
//!
//! Main entry point for practising interviews in the terminal or serving the
//! session API to a front end.

use std::io::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use prepmaster_genai::{api_key_from_env, connect, ServiceBackend};
use prepmaster_orchestrator::{
    create_router, AnswerScorer, AppState, Config, Difficulty, Orchestrator, PrepError, Question,
    QuestionSetProvider, QuestionType, ResultsSummary, ScoreBand, SessionMode, SessionStatus,
};
use prepmaster_report::{json::JsonGenerator, MarkdownGenerator, Report};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

const MARKDOWN_REPORT: &str = "prepmaster-report.md";
const JSON_REPORT: &str = "prepmaster-report.json";

/// PrepMaster - Interview Practice
///
/// Generates interview questions for a role and level, then walks through them
/// either as study cards or as a scored mock interview.
#[derive(Parser, Debug)]
#[command(name = "prepmaster")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: prepmaster.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Output directory for reports
    #[arg(short, long, value_name = "DIR", global = true)]
    output_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the session API and WebSocket events over HTTP
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Score answers instead of revealing them
        #[arg(long)]
        evaluate: bool,
    },

    /// Practise with generated questions
    Practice {
        /// Job role, e.g. "Frontend Developer"
        #[arg(short, long)]
        role: String,

        /// Topic to focus on (default: core competencies)
        #[arg(short, long, default_value = "")]
        topic: String,

        /// Junior, Mid-Level, Senior or Expert
        #[arg(short, long, default_value = "Mid-Level")]
        difficulty: Difficulty,

        /// Number of questions (overrides questionCount)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Score answers instead of revealing them
        #[arg(long)]
        evaluate: bool,
    },

    /// Practise with the built-in curated question set
    Curated {
        /// Score answers instead of revealing them
        #[arg(long)]
        evaluate: bool,
    },
}

impl Command {
    const fn evaluate(&self) -> bool {
        match self {
            Self::Serve { evaluate, .. }
            | Self::Practice { evaluate, .. }
            | Self::Curated { evaluate } => *evaluate,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(output_dir = ?args.output_dir, "Output directory");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if args.command.evaluate() {
        config.evaluation_mode = true;
    }
    if let Command::Practice {
        count: Some(count), ..
    } = args.command
    {
        config.question_count = count;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);
    let orchestrator = Arc::new(build_orchestrator(&config)?);

    match args.command {
        Command::Serve { port, .. } => serve(config, orchestrator, port).await,
        Command::Practice {
            role,
            topic,
            difficulty,
            ..
        } => {
            if !orchestrator.can_generate() {
                anyhow::bail!(
                    "No content service is available\n\nSuggestion: Set the {} environment variable, or run `prepmaster curated`",
                    config.generator.api_key_env
                );
            }
            println!();
            println!("Generating {} questions...", config.question_count);
            orchestrator
                .start_custom(&role, &topic, difficulty)
                .await?;
            practise(&orchestrator, &config).await
        }
        Command::Curated { .. } => {
            orchestrator.start_curated().await?;
            practise(&orchestrator, &config).await
        }
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Wires the content service into an orchestrator.
///
/// Without an API key only curated sessions are possible, and scored mode
/// reports an evaluation failure on every answer.
fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let mode = SessionMode::from_evaluation_flag(config.evaluation_mode);
    let timeout = config.generator.request_timeout();

    let api_key = match api_key_from_env(&config.generator) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "Content service disabled; only curated sessions are available");
            return Ok(Orchestrator::new(
                QuestionSetProvider::curated_only(),
                mode,
                config.question_count,
            ));
        }
    };

    let service = connect(&config.generator, api_key)?;
    let backend = Arc::new(ServiceBackend::new(service));

    Ok(Orchestrator::new(
        QuestionSetProvider::new(backend.clone(), timeout),
        mode,
        config.question_count,
    )
    .with_scorer(AnswerScorer::new(backend, timeout)))
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Mode: {}", SessionMode::from_evaluation_flag(config.evaluation_mode));
    println!("  Questions per session: {}", config.question_count);
    println!("  Output directory: {}", config.output_dir);
    println!(
        "  Content service: {} ({})",
        config.generator.backend, config.generator.model
    );
}

// ============================================================================
// serve
// ============================================================================

async fn serve(config: Config, orchestrator: Arc<Orchestrator>, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    println!();
    println!("Starting HTTP API server on {addr}...");

    let router = create_router(AppState::new(config, orchestrator));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await?;

    println!();
    println!("Server stopped");
    Ok(())
}

// ============================================================================
// Interactive session
// ============================================================================

/// What the user typed at a question prompt.
enum Input {
    Hint,
    Quit,
    Text(String),
}

/// Reads one prompt's worth of input.
///
/// Study mode takes a single line. Scored mode keeps reading until a blank
/// line so code answers can span several lines.
async fn read_input(lines: &mut Lines<BufReader<Stdin>>, multiline: bool) -> anyhow::Result<Input> {
    let Some(first) = lines.next_line().await? else {
        return Ok(Input::Quit);
    };
    match first.trim() {
        "?" => return Ok(Input::Hint),
        "q" | ":q" => return Ok(Input::Quit),
        _ => {}
    }
    if !multiline || first.trim().is_empty() {
        return Ok(Input::Text(first));
    }

    let mut text = first;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        text.push('\n');
        text.push_str(&line);
    }
    Ok(Input::Text(text))
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

fn print_question(progress: &str, question: &Question) {
    println!();
    println!("=== {progress} ===");
    println!("[{}] ({})", question.topic, question.question_type);
    println!();
    println!("{}", question.text);
    println!();
}

fn print_block(label: &str, text: &str) {
    println!("{label}:");
    for line in text.lines() {
        println!("    {line}");
    }
}

/// Runs the interactive loop until the session reaches `Results` or the user quits.
async fn practise(orchestrator: &Orchestrator, config: &Config) -> anyhow::Result<()> {
    let mode = orchestrator.mode();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Option<String> = None;

    match mode {
        SessionMode::Study => println!("Study mode: Enter reveals the answer, ? shows a hint, q quits."),
        SessionMode::Scored => println!(
            "Scored mode: type your answer and finish with an empty line. ? shows a hint, q quits."
        ),
    }

    loop {
        let state = orchestrator.snapshot().await;
        match state.status {
            SessionStatus::Results => break,
            SessionStatus::Interviewing => {}
            other => anyhow::bail!(
                "{}",
                state
                    .last_error
                    .unwrap_or_else(|| format!("session is {other}"))
            ),
        }

        let Some(session) = state.session.as_ref() else {
            anyhow::bail!("no active session");
        };
        let Some(question) = session.current_question() else {
            anyhow::bail!("session has no remaining questions");
        };

        if shown.as_deref() != Some(question.id.as_str()) {
            print_question(&session.progress().to_string(), question);
            shown = Some(question.id.clone());
        }
        prompt("> ");

        match read_input(&mut lines, mode == SessionMode::Scored).await? {
            Input::Quit => {
                orchestrator.restart().await;
                println!();
                println!("Session abandoned.");
                return Ok(());
            }
            Input::Hint => println!("Hint: {}", question.hint),
            Input::Text(_) if mode == SessionMode::Study => {
                print_block("Answer", question.resolved_answer());
                if let Some(example) = question.example() {
                    print_block("Example", example);
                }
                orchestrator.advance().await?;
            }
            Input::Text(answer) if answer.trim().is_empty() => {
                println!("Answer must not be empty.");
            }
            Input::Text(answer) => {
                println!("Evaluating...");
                match orchestrator.submit_answer(&answer).await {
                    Ok(state) => {
                        if let Some(evaluation) = state
                            .session
                            .as_ref()
                            .and_then(|s| s.evaluations.get(&question.id))
                        {
                            println!("Score: {}/10", evaluation.score);
                            println!("Feedback: {}", evaluation.feedback);
                            let shape = if question.question_type == QuestionType::Code {
                                "Ideal solution"
                            } else {
                                "Ideal answer"
                            };
                            print_block(shape, &evaluation.ideal_answer);
                        }
                    }
                    Err(e) if e.is_evaluation_failure() => {
                        println!("Evaluation failed: {e}");
                        println!("{}", retry_hint(&e));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    let (session, summary) = orchestrator.results().await?;
    print_summary(&summary, session.questions.len());

    let report = Report::from_results(&session, &summary)?;
    write_reports(&report, Path::new(&config.output_dir))?;
    orchestrator.restart().await;
    Ok(())
}

/// What to tell the user after a failed evaluation.
const fn retry_hint(err: &PrepError) -> &'static str {
    if err.is_transient() {
        "This is usually temporary. Submit again, or press q to quit."
    } else {
        "Retrying is unlikely to help until this is fixed. Press q to quit."
    }
}

fn print_summary(summary: &ResultsSummary, question_count: usize) {
    println!();
    println!("=== Session Complete ===");
    println!("Questions: {question_count}");
    if let Some(average) = summary.average_score() {
        println!(
            "Average score: {average:.1}/10 ({})",
            ScoreBand::from_score(average)
        );
        println!("{}", prepmaster_orchestrator::share_line(average));
    }
}

/// Writes Markdown and JSON reports to the output directory.
fn write_reports(report: &Report, output_dir: &Path) -> anyhow::Result<()> {
    println!();
    println!("Generating reports...");

    std::fs::create_dir_all(output_dir)?;

    let md_path: PathBuf = output_dir.join(MARKDOWN_REPORT);
    std::fs::write(&md_path, MarkdownGenerator::new(report).generate())?;
    println!("  Markdown report: {}", md_path.display());

    let json_path = output_dir.join(JSON_REPORT);
    JsonGenerator::new(report).write_to_file(&json_path, true)?;
    println!("  JSON report: {}", json_path.display());

    Ok(())
}

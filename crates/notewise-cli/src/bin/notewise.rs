//! notewise: analyze note text, exercise the auto-save queue, and talk to a
//! local LLM from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use notewise_cli::commands::{self, SaveDemoOptions};
use notewise_cli::{logging, read_input};
use notewise_core::{Error, PreferencesManager};
use notewise_inference::LlmConfig;
use notewise_text::CancellationToken;

#[derive(Parser)]
#[command(name = "notewise")]
#[command(author, version, about = "Note text analysis, auto-save, and local LLM tools")]
#[command(propagate_version = true)]
struct Cli {
    /// Debug-level logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding persisted preferences (in-memory when omitted)
    #[arg(long, global = true, env = "NOTEWISE_PREFS_DIR")]
    prefs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run statistics, language detection, and sentiment over a note
    Analyze {
        /// Note text, or "-" for stdin
        text: Option<String>,

        /// Read the note from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Detect the language of a note and of each segment
    Detect {
        /// Note text, or "-" for stdin
        text: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Sentiment, emotional journey, and sarcasm cues
    Sentiment {
        /// Note text, or "-" for stdin
        text: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Language code; detected when omitted
        #[arg(short, long)]
        language: Option<String>,

        /// Include sarcasm detection
        #[arg(long)]
        sarcasm: bool,
    },

    /// Send a prompt to the local LLM
    Generate {
        /// Prompt text, or "-" for stdin
        prompt: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print fragments as they arrive
        #[arg(short, long)]
        stream: bool,

        /// Override the model from preferences
        #[arg(short, long)]
        model: Option<String>,

        /// Override the server URL from preferences
        #[arg(long)]
        url: Option<String>,
    },

    /// Queue sample notes and force-save them through the auto-save queue
    SaveDemo {
        /// Number of notes to queue
        #[arg(short, long, default_value_t = 8)]
        notes: usize,

        /// Every n-th note fails before it saves (0 disables)
        #[arg(long, default_value_t = 3)]
        flaky_every: usize,

        /// How many times a flaky note fails
        #[arg(long, default_value_t = 1)]
        failures: u32,

        /// Simulated save latency in milliseconds
        #[arg(long, default_value_t = 20)]
        delay_ms: u64,
    },

    /// Show, export, import, or reset preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print the current preferences
    Show,

    /// Export preferences as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace preferences with an exported file
    Import {
        /// Exported preferences file
        input: PathBuf,
    },

    /// Restore default preferences
    Reset,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let prefs = commands::open_preferences(cli.prefs_dir.as_deref()).await;

    match cli.command {
        Commands::Analyze { text, file } => {
            let text = read_input(text.as_deref(), file.as_deref())?;
            cmd_analyze(&text, &prefs).await?;
        }
        Commands::Detect { text, file } => {
            let text = read_input(text.as_deref(), file.as_deref())?;
            print_json(&commands::detect(&text).await?)?;
        }
        Commands::Sentiment {
            text,
            file,
            language,
            sarcasm,
        } => {
            let text = read_input(text.as_deref(), file.as_deref())?;
            print_json(&commands::sentiment(&text, language.as_deref(), sarcasm).await?)?;
        }
        Commands::Generate {
            prompt,
            file,
            stream,
            model,
            url,
        } => {
            let prompt = read_input(prompt.as_deref(), file.as_deref())?;
            cmd_generate(&prefs, &prompt, stream, model, url).await?;
        }
        Commands::SaveDemo {
            notes,
            flaky_every,
            failures,
            delay_ms,
        } => {
            let options = SaveDemoOptions {
                notes,
                flaky_every: (flaky_every > 0).then_some(flaky_every),
                flaky_failures: failures,
                save_delay: Duration::from_millis(delay_ms),
                config: prefs.current().await.auto_save,
            };
            print_json(&commands::save_demo(options).await?)?;
        }
        Commands::Prefs { action } => cmd_prefs(&prefs, action).await?,
    }

    Ok(())
}

async fn cmd_analyze(text: &str, prefs: &PreferencesManager) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let insights = commands::analyze(text, &prefs.current().await, &cancel).await;
    match insights {
        Ok(insights) => print_json(&insights),
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::Cancelled(_))) => {
            anyhow::bail!("analysis interrupted")
        }
        Err(e) => Err(e),
    }
}

async fn cmd_generate(
    prefs: &PreferencesManager,
    prompt: &str,
    stream: bool,
    model: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let mut config = LlmConfig::from(&prefs.current().await.llm);
    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(url) = url {
        config = config.with_base_url(url);
    }

    let mut stdout = std::io::stdout();
    let response = commands::generate(config, prompt, stream, &mut stdout).await?;
    tracing::info!(
        model = %response.model,
        eval_count = ?response.eval_count,
        tokens_per_second = ?response.tokens_per_second(),
        "Generation finished"
    );
    Ok(())
}

async fn cmd_prefs(prefs: &PreferencesManager, action: PrefsAction) -> Result<()> {
    match action {
        PrefsAction::Show => print_json(&prefs.current().await),
        PrefsAction::Export { output } => {
            let exported = commands::export_preferences(prefs, output.as_deref()).await?;
            match output {
                Some(path) => print_json(&serde_json::json!({
                    "output": path.to_string_lossy(),
                })),
                None => print_json(&exported),
            }
        }
        PrefsAction::Import { input } => {
            print_json(&commands::import_preferences(prefs, &input).await?)
        }
        PrefsAction::Reset => print_json(&prefs.reset().await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

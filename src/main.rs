//! Tandem CLI entry point.
//!
//! Provides `chat`, `conditions`, and `summary` subcommands for running an
//! interactive session, listing the experimental conditions, or summarising a
//! turn log.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use tandem::clock::{Clock, ManualClock, SystemClock};
use tandem::config::load_effective_config;
use tandem::credentials::load_default_credentials;
use tandem::experiment::{ExperimentCondition, LatencyTier};
use tandem::logging;
use tandem::providers::build_provider;
use tandem::session::{render_transcript, ConversationSession};
use tandem::turn::{TurnHandler, TypingIndicator};
use tandem::turn_log::{read_records, summarize, CsvTurnLog};

/// Tandem: chat partner simulator for conversational behavior experiments.
#[derive(Parser)]
#[command(name = "tandem", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Chat with the simulated partner on stdin/stdout.
    Chat(ChatArgs),
    /// List conditions, personas, and latency profiles.
    Conditions,
    /// Summarise a turn log.
    Summary {
        /// Log file to read (defaults to the configured log path).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Config file (defaults to `~/.tandem/config.toml`).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Session parameters for `chat`.
#[derive(Args)]
struct ChatArgs {
    /// Participant identifier.
    #[arg(long)]
    pid: Option<String>,
    /// Experimental condition (acceptance, ambiguous, rejection, ai_clear, friend_like).
    #[arg(long)]
    condition: Option<String>,
    /// Latency tier override (fast, ambiguous, slow).
    #[arg(long)]
    latency: Option<String>,
    /// Config file (defaults to `~/.tandem/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write JSON diagnostics to this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Skip the simulated waits.
    #[arg(long)]
    instant: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Chat(args) => handle_chat(args).await,
        Command::Conditions => {
            logging::init_cli();
            handle_conditions();
            Ok(())
        }
        Command::Summary { path, config } => {
            logging::init_cli();
            handle_summary(path, config)
        }
    }
}

/// Prints a transient typing line on stderr.
struct TerminalTyping;

impl TypingIndicator for TerminalTyping {
    fn set_typing(&self, typing: bool) {
        let mut stderr = std::io::stderr();
        if typing {
            let _ = write!(stderr, "Partner is typing...");
        } else {
            let _ = write!(stderr, "\r\x1b[2K");
        }
        let _ = stderr.flush();
    }
}

/// Run an interactive session until EOF or `/quit`.
async fn handle_chat(args: ChatArgs) -> anyhow::Result<()> {
    let _logging_guard = match &args.log_dir {
        Some(dir) => Some(logging::init_production(dir)?),
        None => {
            logging::init_cli();
            None
        }
    };

    let config = load_effective_config(args.config.as_deref())
        .context("failed to load configuration")?;
    let credentials = load_default_credentials().context("failed to load credentials")?;
    let provider = build_provider(&config.models.default, credentials)
        .with_context(|| format!("failed to create provider '{}'", config.models.default))?;

    let clock: Arc<dyn Clock> = if args.instant {
        Arc::new(ManualClock::starting_now())
    } else {
        Arc::new(SystemClock)
    };
    let log = Arc::new(CsvTurnLog::new(config.experiment.log_path.clone()));
    let handler = TurnHandler::new(provider, log, Arc::clone(&clock))
        .with_typing_indicator(Arc::new(TerminalTyping))
        .with_generation_timeout(config.generation.timeout());

    let pid = args
        .pid
        .unwrap_or_else(|| config.experiment.default_participant.clone());
    let condition = args
        .condition
        .unwrap_or_else(|| config.experiment.default_condition.clone());
    let mut session =
        ConversationSession::new(&pid, &condition, args.latency.as_deref(), clock.now());
    info!(
        session_id = %session.id(),
        pid = session.participant_id(),
        condition = session.condition(),
        model = %config.models.default,
        log_path = %config.experiment.log_path.display(),
        "session started"
    );

    println!("Partner: {}", session.intro().text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/history" => {
                println!("{}", render_transcript(&session));
                continue;
            }
            _ => {}
        }

        match handler.handle_turn(&mut session, &line).await {
            Ok(outcome) => println!("Partner: {}", outcome.reply),
            Err(e) => warn!(error = %e, "turn rejected"),
        }
    }

    println!();
    println!("--- Chat history ---");
    println!("{}", render_transcript(&session));
    Ok(())
}

/// Print every condition and latency tier.
fn handle_conditions() {
    println!("Conditions:");
    for condition in ExperimentCondition::ALL {
        let persona = condition.persona();
        println!(
            "  {:<12} persona={:<10} latency={:<10} intro={:?}",
            condition.id(),
            persona.name,
            condition.default_tier().tag(),
            persona.intro
        );
    }

    println!("Latency tiers:");
    for tier in LatencyTier::ALL {
        let phases = tier
            .profile()
            .phases
            .iter()
            .map(|p| {
                format!(
                    "{}[{:.1}s-{:.1}s]",
                    if p.shows_typing { "typing" } else { "pause" },
                    p.min_secs,
                    p.max_secs
                )
            })
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("  {:<10} {phases}", tier.tag());
    }
}

/// Print turn counts per condition and participant.
fn handle_summary(path: Option<PathBuf>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => load_effective_config(config.as_deref())?.experiment.log_path,
    };
    let records =
        read_records(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let summary = summarize(&records);

    println!("{} turns in {}", summary.total_turns, path.display());
    println!("Conditions:");
    for entry in &summary.conditions {
        println!(
            "  {:<12} turns={:<6} participants={}",
            entry.condition.id(),
            entry.turns,
            entry.participants.len()
        );
        let variants = entry
            .requested_ids
            .keys()
            .filter(|id| id.as_str() != entry.condition.id())
            .map(String::as_str)
            .collect::<Vec<_>>();
        if !variants.is_empty() {
            println!("    logged as: {}", variants.join(", "));
        }
        for (pid, turns) in &entry.participants {
            println!("    {pid:<12} turns={turns}");
        }
    }

    println!("Participants:");
    for (pid, turns) in &summary.participants {
        println!("  {pid:<12} turns={turns}");
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use handkey_core::landmarks::Trace;
use handkey_core::{HandType, TemplateKind};
use handkey_engine::{EngineConfig, GestureEngine};
use std::path::PathBuf;
use tracing::{info, warn};

mod replay;

use replay::LogInjector;

#[derive(Parser, Debug)]
#[command(name = "handkey", about = "Map recorded hand gestures to key presses")]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the profile directory
    #[arg(long)]
    profiles_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a gesture from a landmark trace
    Record {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        gesture: String,
        /// Key binding; defaults to the template suggestion
        #[arg(long, default_value = "")]
        key: String,
        #[arg(long, default_value = "single")]
        hand_type: HandType,
        /// JSON-lines landmark trace
        #[arg(long)]
        trace: PathBuf,
        /// Create the profile if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Replay a trace against a profile and print the fired keys
    Run {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        trace: PathBuf,
    },
    /// List stored profiles
    List,
    /// Create a profile from a built-in template (racing, media, gaming)
    Template { kind: TemplateKind },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.profiles_dir {
        config.storage.profiles_dir = dir;
    }

    let (mut engine, report) = GestureEngine::open(config, LogInjector::default())?;
    for (key, reason) in &report.skipped {
        warn!("Ignored profile record '{}': {}", key, reason);
    }

    match cli.command {
        Command::Record {
            profile,
            gesture,
            key,
            hand_type,
            trace,
            create,
        } => {
            if create && !engine.store().contains(&profile) {
                engine.create_profile(&profile, "")?;
            }
            let trace = Trace::load(&trace)?;
            let replaced = replay::record_from_trace(&mut engine, &trace, &profile, &gesture, &key, hand_type)?;
            println!(
                "{} '{}' in profile '{}'",
                if replaced { "Re-recorded" } else { "Recorded" },
                gesture,
                profile
            );
        }
        Command::Run { profile, trace } => {
            let trace = Trace::load(&trace)?;
            let fires = replay::run_trace(&mut engine, &trace, &profile)?;
            info!(
                "{} gestures fired, {} keys sent",
                fires.len(),
                engine.injector().sent.len()
            );
        }
        Command::List => {
            for summary in engine.list_profiles() {
                println!(
                    "{:<24} {:>2}/{:<2} active  {:>2} to record  {}",
                    summary.name,
                    summary.active_gesture_count,
                    summary.gesture_count,
                    summary.pending_placeholders,
                    summary.description
                );
            }
        }
        Command::Template { kind } => {
            engine.add_template_profile(kind)?;
            println!("Created profile '{}'", kind.display_name());
            for placeholder in engine.instantiate_template(kind).placeholders {
                println!("  {:<14} {:<8} {}", placeholder.name, placeholder.key_binding, placeholder.description);
            }
        }
    }

    Ok(())
}

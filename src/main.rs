#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use breakpoint_overlay::constants;
use breakpoint_overlay::replay::{parse_script, ReplaySession};
use breakpoint_overlay::{normalize, parse_hotkey, resolve, OverlayConfig, TextBadge, ViewportSnapshot};

/// Inspect breakpoint overlay configs and replay overlay sessions
#[derive(Parser, Debug)]
#[command(name = "bp-overlay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a config and print its normalized form
    Check {
        /// Config file (defaults to the user config path)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the breakpoint active at a given viewport
    Resolve {
        #[arg(long)]
        width: f64,

        #[arg(long, default_value_t = 0.0)]
        height: f64,

        /// Device pixel ratio
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run a scripted session against a simulated viewport
    Replay {
        /// JSON array of steps
        #[arg(long)]
        script: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Initial viewport width
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Initial viewport height
        #[arg(long, default_value_t = 800.0)]
        height: f64,

        /// Also render the text badge as it changes
        #[arg(long)]
        badge: bool,

        /// Print the transcript as JSON
        #[arg(long, conflicts_with = "badge")]
        json: bool,
    },

    /// Write a starter config file
    Init {
        /// Destination (defaults to the user config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(debug: bool) -> Result<()> {
    let log_level = if debug {
        TraceLevel::DEBUG
    } else {
        match std::env::var(constants::env::LOG_LEVEL)
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => TraceLevel::TRACE,
            "debug" => TraceLevel::DEBUG,
            "warn" => TraceLevel::WARN,
            "error" => TraceLevel::ERROR,
            _ => TraceLevel::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn check(config: Option<PathBuf>) -> Result<()> {
    let raw = OverlayConfig::load(config.as_deref())?;
    let resolved = normalize(Some(&raw)).context("Config is invalid")?;
    let binding = parse_hotkey(&resolved.hotkey).context("Hotkey is invalid")?;

    match &binding {
        Some(binding) => info!("hotkey: {binding}"),
        None => info!("hotkey disabled"),
    }
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

fn resolve_at(width: f64, height: f64, dpr: f64, config: Option<PathBuf>) -> Result<()> {
    let raw = OverlayConfig::load(config.as_deref())?;
    let resolved = normalize(Some(&raw)).context("Config is invalid")?;
    let viewport = ViewportSnapshot::new(width, height, dpr);
    debug!("resolving against {} breakpoints: viewport={viewport:?}", resolved.breakpoints.len());

    match resolve(&viewport, &resolved.breakpoints) {
        Some(active) if active.label != active.id => println!("{} ({})", active.id, active.label),
        Some(active) => println!("{}", active.id),
        None => println!("none"),
    }
    Ok(())
}

fn replay(script: PathBuf, config: Option<PathBuf>, width: f64, height: f64, badge: bool, json: bool) -> Result<()> {
    let raw = OverlayConfig::load(config.as_deref())?;
    let contents = fs::read_to_string(&script)
        .with_context(|| format!("Failed to read replay script from {}", script.display()))?;
    let steps = parse_script(&contents)
        .with_context(|| format!("Failed to parse replay script from {}", script.display()))?;

    let session = ReplaySession::new(Some(&raw), ViewportSnapshot::new(width, height, 1.0))
        .context("Failed to create overlay")?;
    if badge {
        session.attach_presenter(Box::new(TextBadge::new(io::stdout())));
    }

    let mut transcript = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let line = session.apply(index, step);
        if !json {
            println!("{line}");
        }
        transcript.push(line);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    }
    info!("replayed {} steps", transcript.len());
    Ok(())
}

fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(OverlayConfig::default_path);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    OverlayConfig::sample().save_to(&path)?;
    println!("{}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    match cli.command {
        Command::Check { config } => check(config),
        Command::Resolve {
            width,
            height,
            dpr,
            config,
        } => resolve_at(width, height, dpr, config),
        Command::Replay {
            script,
            config,
            width,
            height,
            badge,
            json,
        } => replay(script, config, width, height, badge, json),
        Command::Init { path, force } => init(path, force),
    }
}

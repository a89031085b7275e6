//! Glider CLI - smooth programmatic pointer motion from the command line.
//!
//! Usage:
//!   glider move <X> <Y>         Glide the cursor to a point
//!   glider click                Click a button in place
//!   glider drag <X> <Y>         Press, glide, and release
//!   glider presets              Show the built-in presets
//!   glider check                Check system capabilities
//!   glider config               Show or save the effective configuration
//!   glider interactive          Queue targets from stdin

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glider_common::config::AppConfig;
use glider_motion::EasingKind;
use glider_platform_core::MouseButton;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "glider",
    about = "Smooth, eased pointer motion for automation",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Drive an in-memory pointer instead of the real one
    #[arg(long, global = true)]
    dry_run: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/glider/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Glide the cursor to a point
    Move {
        #[arg(allow_negative_numbers = true)]
        x: i32,

        #[arg(allow_negative_numbers = true)]
        y: i32,

        /// Treat X and Y as a delta from the current position
        #[arg(short, long)]
        relative: bool,

        /// Easing curve: linear|quadratic|sinusoidal|cubic|exponential (or 1-5)
        #[arg(short, long)]
        easing: Option<EasingKind>,

        /// Curve strength [1, 100]
        #[arg(short, long)]
        strength: Option<i32>,

        /// Movement speed
        #[arg(long)]
        speed: Option<i32>,
    },

    /// Click a button without moving
    Click {
        /// Button: left|right|middle (or 1-3)
        #[arg(short, long, default_value = "left")]
        button: MouseButton,
    },

    /// Press a button, glide to a point, release
    Drag {
        #[arg(allow_negative_numbers = true)]
        x: i32,

        #[arg(allow_negative_numbers = true)]
        y: i32,

        /// Button: left|right|middle (or 1-3)
        #[arg(short, long, default_value = "left")]
        button: MouseButton,

        /// Upper bound on the whole gesture
        #[arg(short, long, default_value = "1000")]
        duration_ms: i32,
    },

    /// Show the built-in presets
    Presets,

    /// Check system capabilities
    Check,

    /// Print the effective configuration as JSON
    Config {
        /// Write it to --config, or the standard location
        #[arg(long)]
        save: bool,
    },

    /// Read commands from stdin and drive the engine
    Interactive {
        /// Wait this long before the engine starts draining the queue
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        /// Easing curve: linear|quadratic|sinusoidal|cubic|exponential (or 1-5)
        #[arg(short, long)]
        easing: Option<EasingKind>,

        /// Curve strength [1, 100]
        #[arg(short, long)]
        strength: Option<i32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match (&cli.command, cli.config.as_ref()) {
        // Seed a new file from the defaults.
        (Commands::Config { save: true }, Some(path)) if !path.exists() => AppConfig::default(),
        (_, path) => load_config(path)?,
    };
    let mut config = loaded.clone();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    glider_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Move {
            x,
            y,
            relative,
            easing,
            strength,
            speed,
        } => commands::move_to::run(
            &config.engine,
            cli.dry_run,
            x,
            y,
            relative,
            commands::Overrides {
                easing,
                strength,
                speed,
            },
        ),
        Commands::Click { button } => commands::click::run(&config.engine, cli.dry_run, button),
        Commands::Drag {
            x,
            y,
            button,
            duration_ms,
        } => commands::drag::run(&config.engine, cli.dry_run, x, y, button, duration_ms),
        Commands::Presets => commands::presets::run(),
        Commands::Check => commands::check::run(),
        Commands::Config { save } => commands::config::run(&loaded, save, cli.config.as_deref()),
        Commands::Interactive {
            delay_ms,
            easing,
            strength,
        } => {
            commands::interactive::run(
                &config.engine,
                cli.dry_run,
                delay_ms,
                commands::Overrides {
                    easing,
                    strength,
                    speed: None,
                },
            )
            .await
        }
    }
}

//! Line-oriented command loop over stdin.
//!
//! The engine starts draining the queue after `--delay-ms`; targets can be
//! added before and after that. Ctrl-C, `quit`, or end of input shuts the
//! engine down.

use std::sync::Arc;
use std::time::Duration;

use glider_common::config::EngineSettings;
use glider_common::error::GliderResult;
use glider_motion::{MotionEngine, Preset};
use glider_platform_core::MouseButton;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Overrides, Session};

const HELP: &str = "\
Commands:
  add_abs <x> <y>               queue an absolute target
  add_rel <dx> <dy>             queue a relative target
  click [button]                click (left|right|middle)
  drag <x> <y> [button] [ms]    press, glide, release
  preset <id|name>              apply a preset (1 default, 2 fast, 3 smooth)
  speed <n>                     change only the speed
  start | stop                  resume or hold the queue
  status                        show engine status
  level <0-3>                   log level (none, error, info, debug)
  quit                          shut down and exit";

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    AddAbs(i32, i32),
    AddRel(i32, i32),
    Click(MouseButton),
    Drag {
        x: i32,
        y: i32,
        button: MouseButton,
        duration_ms: i32,
    },
    Preset(Preset),
    Speed(i32),
    Start,
    Stop,
    Status,
    Level(i32),
    Help,
    Quit,
}

fn int(arg: Option<&str>, what: &str) -> Result<i32, String> {
    let arg = arg.ok_or_else(|| format!("missing {what}"))?;
    arg.parse()
        .map_err(|_| format!("{what} must be an integer, got '{arg}'"))
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    if verb.starts_with('#') {
        return Ok(None);
    }

    let button = |arg: Option<&str>| -> Result<MouseButton, String> {
        arg.map_or(Ok(MouseButton::Left), |b| b.parse().map_err(|e| format!("{e}")))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add_abs" => ReplCommand::AddAbs(int(words.next(), "x")?, int(words.next(), "y")?),
        "add_rel" => ReplCommand::AddRel(int(words.next(), "dx")?, int(words.next(), "dy")?),
        "click" => ReplCommand::Click(button(words.next())?),
        "drag" => ReplCommand::Drag {
            x: int(words.next(), "x")?,
            y: int(words.next(), "y")?,
            button: button(words.next())?,
            duration_ms: match words.next() {
                Some(ms) => int(Some(ms), "duration")?,
                None => 1000,
            },
        },
        "preset" => {
            let arg = words.next().ok_or("missing preset")?;
            ReplCommand::Preset(arg.parse().map_err(|e| format!("{e}"))?)
        }
        "speed" => ReplCommand::Speed(int(words.next(), "speed")?),
        "start" => ReplCommand::Start,
        "stop" => ReplCommand::Stop,
        "status" => ReplCommand::Status,
        "level" => ReplCommand::Level(int(words.next(), "level")?),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };

    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }
    Ok(Some(command))
}

/// Run one command against the engine. Returns the line to print.
pub fn execute(engine: &MotionEngine, command: ReplCommand) -> GliderResult<String> {
    Ok(match command {
        ReplCommand::AddAbs(x, y) => {
            engine.enqueue_absolute(x, y)?;
            format!("queued ({x}, {y})")
        }
        ReplCommand::AddRel(dx, dy) => {
            engine.enqueue_relative(dx, dy)?;
            format!("queued ({dx:+}, {dy:+})")
        }
        ReplCommand::Click(button) => {
            engine.click(button)?;
            format!("clicked {button}")
        }
        ReplCommand::Drag {
            x,
            y,
            button,
            duration_ms,
        } => {
            let outcome = engine.hold_and_move(x, y, button, duration_ms)?;
            format!("drag to ({x}, {y}) {outcome}")
        }
        ReplCommand::Preset(preset) => {
            engine.apply(preset)?;
            format!("preset {preset} applied")
        }
        ReplCommand::Speed(speed) => {
            engine.set_mouse_speed(speed)?;
            format!("speed set to {speed}")
        }
        ReplCommand::Start => {
            engine.start_movement()?;
            "running".to_string()
        }
        ReplCommand::Stop => {
            engine.stop_movement()?;
            "idle".to_string()
        }
        ReplCommand::Status => {
            let status = engine.status()?;
            let config = engine.config()?;
            format!(
                "{}\nconfig: easing {}, strength {}, hold {}ms, speed {}, smooth {}",
                serde_json::to_string(&status)?,
                config.easing(),
                config.strength(),
                config.hold_time_ms(),
                config.speed(),
                config.smooth()
            )
        }
        ReplCommand::Level(level) => {
            engine.set_logging_level(level)?;
            format!("log level set to {level}")
        }
        ReplCommand::Help => HELP.to_string(),
        ReplCommand::Quit => "bye".to_string(),
    })
}

pub async fn run(
    settings: &EngineSettings,
    dry_run: bool,
    delay_ms: u64,
    overrides: Overrides,
) -> anyhow::Result<()> {
    let session = Session::open(settings, dry_run)?;
    overrides.apply(&session.engine)?;
    let pointer = session.pointer.clone();
    let engine = Arc::new(session.engine);

    println!("Glider interactive mode. Type 'help' for commands, 'quit' to exit.");

    let starter = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if delay_ms > 0 {
                tracing::info!(delay_ms, "Movement starts after delay");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            if let Err(e) = engine.start_movement() {
                tracing::warn!(error = %e, "Failed to start movement");
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(msg) => {
                        println!("error: {msg}");
                        continue;
                    }
                };
                if command == ReplCommand::Quit {
                    break;
                }
                let engine = Arc::clone(&engine);
                match tokio::task::spawn_blocking(move || execute(&engine, command)).await? {
                    Ok(reply) => println!("{reply}"),
                    Err(e) => println!("error: {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    starter.abort();
    engine.shutdown()?;
    if let Some(pointer) = pointer {
        println!("[dry-run] cursor at {}", pointer.current());
    }
    println!("Engine shut down.");
    Ok(())
}

//! Run the timer in a terminal.
//!
//! The overlay is drawn as status lines on stderr. Stdin lines drive the
//! session; anything that is not a command counts as a key press, so typing
//! during a break is punished like it would be on a desktop.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use breakwall_core::error::{InputError, OverlayError};
use breakwall_core::runtime::{Command, Runtime};
use breakwall_core::timer::Session;
use breakwall_core::{Config, Event, InputMonitor, OverlayStyle, OverlaySurface, PointerPosition, SystemClock};
use clap::Args;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Work length in minutes [default: from config]
    #[arg(long = "work")]
    work_minutes: Option<u64>,
    /// Break length in minutes [default: from config]
    #[arg(long = "break")]
    break_minutes: Option<u64>,
}

/// Overlay rendered as text on stderr.
struct TerminalOverlay {
    style: Option<OverlayStyle>,
}

impl TerminalOverlay {
    fn label(&self) -> &'static str {
        match self.style {
            Some(OverlayStyle::Break) => "BREAK",
            Some(OverlayStyle::Ready) => "READY",
            None => "",
        }
    }

    fn write(&self, line: &str) -> std::io::Result<()> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "[{}] {line}", self.label())?;
        err.flush()
    }
}

impl OverlaySurface for TerminalOverlay {
    fn show(&mut self, style: OverlayStyle, text: &str) -> Result<(), OverlayError> {
        self.style = Some(style);
        let hint = match style {
            OverlayStyle::Break => "step away; type `skip` to end early",
            OverlayStyle::Ready => "type `move 5 5` when you are back",
        };
        self.write(&format!("{text}  ({hint})"))
            .map_err(|e| OverlayError::ShowFailed(e.to_string()))
    }

    fn update_text(&mut self, text: &str) -> Result<(), OverlayError> {
        self.write(text)
            .map_err(|e| OverlayError::UpdateFailed(e.to_string()))
    }

    fn set_alert(&mut self, alert: bool) -> Result<(), OverlayError> {
        if !alert {
            return Ok(());
        }
        self.write("activity detected, countdown frozen")
            .map_err(|e| OverlayError::UpdateFailed(e.to_string()))
    }

    fn hide(&mut self) -> Result<(), OverlayError> {
        let result = self
            .write("overlay closed")
            .map_err(|e| OverlayError::HideFailed(e.to_string()));
        self.style = None;
        result
    }
}

/// Activity reported by the stdin reader.
#[derive(Default)]
struct Activity {
    last_key: Option<Instant>,
    pointer: PointerPosition,
}

#[derive(Clone, Default)]
struct TerminalInput {
    activity: Arc<Mutex<Activity>>,
}

impl TerminalInput {
    fn with_activity<T>(&self, f: impl FnOnce(&mut Activity) -> T) -> T {
        let mut guard = self
            .activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    fn press_key(&self) {
        self.with_activity(|a| a.last_key = Some(Instant::now()));
    }

    fn move_pointer_by(&self, dx: f64, dy: f64) -> PointerPosition {
        self.with_activity(|a| {
            a.pointer = PointerPosition::new(a.pointer.x + dx, a.pointer.y + dy);
            a.pointer
        })
    }
}

impl InputMonitor for TerminalInput {
    fn seconds_since_last_keystroke(&self) -> f64 {
        self.with_activity(|a| {
            a.last_key
                .map_or(f64::MAX, |at| at.elapsed().as_secs_f64())
        })
    }

    fn pointer_position(&self) -> PointerPosition {
        self.with_activity(|a| a.pointer)
    }

    fn subscribe_pointer(&mut self) -> Result<(), InputError> {
        debug!("pointer events subscribed");
        Ok(())
    }

    fn unsubscribe_pointer(&mut self) -> Result<(), InputError> {
        debug!("pointer events unsubscribed");
        Ok(())
    }
}

/// One line of stdin.
#[derive(Debug, PartialEq)]
enum Line {
    Command(Command),
    Move { dx: f64, dy: f64 },
    Keystroke,
    Empty,
}

fn parse_line(line: &str) -> Line {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Line::Empty;
    };
    let args: Vec<&str> = words.collect();
    let number = |i: usize| args.get(i).and_then(|s| s.parse::<f64>().ok());
    let minutes = || args.first().and_then(|s| s.parse::<u64>().ok());

    match (head, args.len()) {
        ("start" | "toggle" | "pause" | "resume", 0) => Line::Command(Command::Toggle),
        ("stop", 0) => Line::Command(Command::Stop),
        ("skip", 0) => Line::Command(Command::Skip),
        ("status", 0) => Line::Command(Command::Snapshot),
        ("quit" | "exit", 0) => Line::Command(Command::Shutdown),
        ("work", 1) => minutes().map_or(Line::Keystroke, |m| Line::Command(Command::SetWorkMinutes(m))),
        ("break", 1) => minutes().map_or(Line::Keystroke, |m| Line::Command(Command::SetBreakMinutes(m))),
        ("move", 2) => match (number(0), number(1)) {
            (Some(dx), Some(dy)) => Line::Move { dx, dy },
            _ => Line::Keystroke,
        },
        _ => Line::Keystroke,
    }
}

async fn read_stdin(tx: mpsc::Sender<Command>, input: TerminalInput) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        let command = match parse_line(&line) {
            Line::Command(command) => command,
            Line::Move { dx, dy } => Command::PointerMoved(input.move_pointer_by(dx, dy)),
            Line::Keystroke => {
                input.press_key();
                continue;
            }
            Line::Empty => continue,
        };
        if tx.send(command).await.is_err() {
            break;
        }
    }
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to serialize event"),
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if let Some(minutes) = args.work_minutes {
        config.apply("timer.work_minutes", &minutes.to_string())?;
    }
    if let Some(minutes) = args.break_minutes {
        config.apply("timer.break_minutes", &minutes.to_string())?;
    }

    let session = Session::new(config.durations()?, config.enforcement_settings());
    let input = TerminalInput::default();
    let runtime = Runtime::new(
        session,
        SystemClock,
        TerminalOverlay { style: None },
        input.clone(),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(async move {
        let (tx, rx) = mpsc::channel(32);
        tx.send(Command::Toggle).await?;
        tokio::spawn(read_stdin(tx, input));
        runtime.run(rx, print_event).await;
        Ok::<_, Box<dyn std::error::Error>>(())
    });
    // The stdin reader may still be parked in a blocking read.
    rt.shutdown_background();
    result
}

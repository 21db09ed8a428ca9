//! Single-task event loop driving a [`Session`].
//!
//! Ticks, arming deadlines and host commands are multiplexed with
//! `tokio::select!` on one task, so handlers never overlap and each runs to
//! completion before the next event is looked at. The arming timer is
//! recomputed from the session on every iteration: once an overlay is torn
//! down its timer simply stops existing.

use std::time::Duration as StdDuration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::events::Event;
use crate::input::{InputMonitor, PointerPosition};
use crate::overlay::OverlaySurface;
use crate::timer::Session;

/// Requests from the host: menu actions and input monitor events.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start, pause or resume, depending on state.
    Toggle,
    Stop,
    /// The skip control on the break overlay.
    Skip,
    SetWorkMinutes(u64),
    SetBreakMinutes(u64),
    PointerMoved(PointerPosition),
    /// Emit a state snapshot.
    Snapshot,
    Shutdown,
}

pub trait EventSink {
    fn emit(&mut self, event: &Event);
}

impl<F> EventSink for F
where
    F: FnMut(&Event),
{
    fn emit(&mut self, event: &Event) {
        self(event)
    }
}

pub struct Runtime<C, O, I> {
    session: Session,
    clock: C,
    overlay: O,
    input: I,
}

impl<C, O, I> Runtime<C, O, I>
where
    C: Clock,
    O: OverlaySurface,
    I: InputMonitor,
{
    pub fn new(session: Session, clock: C, overlay: O, input: I) -> Self {
        Self {
            session,
            clock,
            overlay,
            input,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.session.tick(now, &mut self.overlay, &mut self.input)
    }

    /// The arming timer fired.
    pub fn fire_arm(&mut self) -> bool {
        let now = self.clock.now();
        self.session.arm(now, &mut self.input)
    }

    /// Apply one command. `Shutdown` stops the session.
    pub fn handle(&mut self, command: Command) -> Option<Event> {
        let now = self.clock.now();
        let (overlay, input) = (&mut self.overlay, &mut self.input);
        match command {
            Command::Toggle => self.session.start(now),
            Command::Stop | Command::Shutdown => self.session.stop(now, overlay, input),
            Command::Skip => self.session.skip_break(now, overlay, input),
            Command::SetWorkMinutes(minutes) => self
                .session
                .set_work_duration(minutes, now)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "rejected work duration");
                    None
                }),
            Command::SetBreakMinutes(minutes) => self
                .session
                .set_break_duration(minutes, now, overlay)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "rejected break duration");
                    None
                }),
            Command::PointerMoved(pos) => self.session.pointer_moved(pos, now, overlay, input),
            Command::Snapshot => Some(self.session.snapshot(now)),
        }
    }

    /// Time until the pending arming deadline, if any.
    fn arm_delay(&self) -> Option<StdDuration> {
        let at = self.session.next_arm_at()?;
        Some((at - self.clock.now()).to_std().unwrap_or(StdDuration::ZERO))
    }

    /// Run until `Shutdown` arrives or every sender is dropped. The session is
    /// stopped on the way out so no overlay outlives the loop.
    pub async fn run<S: EventSink>(mut self, mut commands: mpsc::Receiver<Command>, mut sink: S) -> Self {
        let mut ticker = tokio::time::interval(StdDuration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            let arm_delay = self.arm_delay();
            let event = tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = sleep_for(arm_delay) => {
                    self.fire_arm();
                    None
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => {
                        debug!(?command, "command received");
                        self.handle(command)
                    }
                },
            };
            if let Some(event) = event {
                sink.emit(&event);
            }
        }

        if let Some(event) = self.handle(Command::Shutdown) {
            sink.emit(&event);
        }
        self
    }
}

async fn sleep_for(delay: Option<StdDuration>) {
    match delay {
        Some(d) => tokio::time::sleep_until(Instant::now() + d).await,
        None => std::future::pending().await,
    }
}

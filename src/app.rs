use std::{collections::BTreeSet, fmt::Write as _, str::FromStr, sync::Arc, time::Duration};

use rand::{Rng, rngs::StdRng};
use thiserror::Error;

use crate::{
    corpus::supplementary_for,
    gesture::PullGesture,
    hijri::HijriDate,
    milestone::Target,
    scheduler::TaskScheduler,
    schedule::{azkar_period, format_clock},
    session::{NavOutcome, SessionController},
    traits::Clock,
};

pub const HELP: &str = "Enter/t: tap   n: next   p: previous   h: help   q: quit";

/// Line-based user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tap,
    Next,
    Previous,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command '{0}', type h for help")]
pub struct UnknownCommand(String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "t" | "tap" => Ok(Command::Tap),
            "n" | "next" => Ok(Command::Next),
            "p" | "prev" | "previous" => Ok(Command::Previous),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Touch input for pull-to-advance, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PullEvent {
    Start { y: f64, viewport_height: f64 },
    Move { y: f64 },
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ClockTick,
    Input(Command),
    Pull(PullEvent),
    HijriResolved(HijriDate),
    CelebrationExpired(u64),
    TransitionEnded,
}

/// What the event loop should do after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Redraw,
    Idle,
    Exit,
}

/// Terminal front end: routes messages into the session and renders it.
pub struct ZikrApp<R = StdRng> {
    session: SessionController<R>,
    scheduler: TaskScheduler<Message>,
    clock: Arc<dyn Clock>,
    clock_refresh: Duration,
    clock_text: String,
    hijri: Option<HijriDate>,
    read_azkar: BTreeSet<String>,
    status: Option<String>,
    gesture: PullGesture,
}

impl<R: Rng> ZikrApp<R> {
    pub fn new(
        session: SessionController<R>,
        scheduler: TaskScheduler<Message>,
        clock: Arc<dyn Clock>,
        clock_refresh: Duration,
        read_azkar: BTreeSet<String>,
    ) -> Self {
        let clock_text = format_clock(&clock.now_local());
        Self {
            session,
            scheduler,
            clock,
            clock_refresh,
            clock_text,
            hijri: None,
            read_azkar,
            status: None,
            gesture: PullGesture::default(),
        }
    }

    /// Use configured pull thresholds instead of the defaults.
    pub fn with_gesture(mut self, gesture: PullGesture) -> Self {
        self.gesture = gesture;
        self
    }

    /// Start the periodic wall-clock refresh.
    pub fn start(&mut self) {
        self.scheduler
            .schedule_every(self.clock_refresh, || Message::ClockTick);
    }

    pub fn update(&mut self, message: Message) -> Flow {
        match message {
            Message::ClockTick => {
                // Backstop for a celebration timer that never arrived
                let expired = self.session.expire_overdue();
                let text = format_clock(&self.clock.now_local());
                if text == self.clock_text && !expired {
                    Flow::Idle
                } else {
                    self.clock_text = text;
                    Flow::Redraw
                }
            }
            Message::Pull(event) => self.on_pull(event),
            Message::HijriResolved(date) => {
                self.hijri = Some(date);
                Flow::Redraw
            }
            Message::CelebrationExpired(generation) => {
                if self.session.expire_celebration(generation) {
                    Flow::Redraw
                } else {
                    Flow::Idle
                }
            }
            Message::TransitionEnded => {
                self.session.end_transition();
                Flow::Idle
            }
            Message::Input(Command::Tap) => {
                let outcome = self.session.tap();
                if let Some(celebration) = outcome.celebration {
                    let delay = (celebration.until - self.clock.now_utc())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    self.scheduler
                        .schedule_once(delay, Message::CelebrationExpired(celebration.generation));
                }
                self.status = None;
                Flow::Redraw
            }
            Message::Input(Command::Next) => {
                let outcome = self.session.advance();
                self.after_navigation(outcome)
            }
            Message::Input(Command::Previous) => {
                let outcome = self.session.retreat();
                self.after_navigation(outcome)
            }
            Message::Input(Command::Help) => {
                self.status = Some(HELP.to_string());
                Flow::Redraw
            }
            Message::Input(Command::Quit) => Flow::Exit,
        }
    }

    fn on_pull(&mut self, event: PullEvent) -> Flow {
        match event {
            PullEvent::Start { y, viewport_height } => {
                self.gesture.start(y, viewport_height);
                Flow::Idle
            }
            PullEvent::Move { y } => {
                if !self.gesture.is_pulling() {
                    return Flow::Idle;
                }
                self.gesture.move_to(y);
                Flow::Redraw
            }
            PullEvent::Release => {
                let was_pulling = self.gesture.is_pulling();
                if self.gesture.release() {
                    let outcome = self.session.advance();
                    self.after_navigation(outcome)
                } else if was_pulling {
                    Flow::Redraw
                } else {
                    Flow::Idle
                }
            }
        }
    }

    fn after_navigation(&mut self, outcome: NavOutcome) -> Flow {
        match outcome {
            NavOutcome::Moved(_) => {
                let window = self
                    .session
                    .timings()
                    .transition
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                self.scheduler.schedule_once(window, Message::TransitionEnded);
                self.status = None;
                Flow::Redraw
            }
            NavOutcome::NothingToUndo => {
                self.status = Some("Nothing to go back to".to_string());
                Flow::Redraw
            }
            NavOutcome::Busy => Flow::Idle,
        }
    }

    /// Render the current frame as plain text.
    pub fn view(&self) -> String {
        let state = self.session.snapshot();
        let now_local = self.clock.now_local();
        let mut out = String::new();

        let hijri = self
            .hijri
            .map(|d| d.to_string())
            .unwrap_or_else(|| "…".to_string());
        let _ = writeln!(out, "{}  ·  {}  ·  {}", self.clock_text, hijri, state.slot);
        let _ = writeln!(out);

        if let Some(period) = azkar_period(&now_local) {
            let _ = writeln!(out, "{}", period.title());
            for zikr in supplementary_for(period) {
                let mark = if self.read_azkar.contains(zikr.id) { "x" } else { " " };
                let _ = writeln!(out, "  [{}] {}  {}", mark, zikr.id, zikr.arabic);
                let _ = writeln!(out, "        {}", zikr.transliteration);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{}", state.entry.arabic);
        let _ = writeln!(out, "{}", state.entry.transliteration);
        let _ = writeln!(out, "{}", state.entry.translation);
        let _ = writeln!(out);

        match state.target {
            Target::Bounded(target) => {
                let _ = writeln!(out, "Count: {} / {}", state.count, target);
            }
            Target::Unbounded => {
                let _ = writeln!(out, "Count: {}", state.count);
            }
        }
        if state.is_celebrating() {
            let _ = writeln!(out, "✦ ✦ ✦  {} ✦ ✦ ✦", state.count);
        }
        if self.gesture.distance() > 0.0 {
            let _ = writeln!(out, "↓ {:.0}px", self.gesture.distance());
        }
        if let Some(status) = &self.status {
            let _ = writeln!(out, "{}", status);
        }

        out
    }

    /// Cancel every pending timer; call before leaving the event loop.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
    }
}

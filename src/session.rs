//! Session controller: navigation plus tap counting behind one API.
//!
//! State lives here and nowhere else. After every change a fresh
//! [`SessionState`] snapshot is published on a `watch` channel so the
//! presentation layer only renders what it is told.
//!
//! Next/previous open a short transition window (the visual cross-fade).
//! Navigation requested while a window is still open is rejected with
//! [`NavOutcome::Busy`] instead of racing the pending transition.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    config::TimingsConfig,
    corpus::{Corpus, EntryId, ZikrEntry},
    milestone::{Celebration, CelebrationState, MilestoneTracker, Target},
    navigation::Navigator,
    schedule::{TimeSlot, classify},
    traits::Clock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub transition: Duration,
    pub celebration: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::from(&TimingsConfig::default())
    }
}

impl From<&TimingsConfig> for SessionTimings {
    fn from(config: &TimingsConfig) -> Self {
        let config = config.clamped();
        Self {
            transition: Duration::milliseconds(config.transition_ms as i64),
            celebration: Duration::seconds(config.celebration_secs as i64),
        }
    }
}

/// Result of a next/previous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved(EntryId),
    NothingToUndo,
    /// A transition window is still open; nothing changed.
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TapOutcome {
    pub count: u32,
    pub target: Target,
    pub celebration: Option<Celebration>,
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub current: EntryId,
    pub entry: &'static ZikrEntry,
    pub history: Vec<EntryId>,
    pub count: u32,
    pub target: Target,
    pub celebration: CelebrationState,
    pub transition_until: Option<DateTime<Utc>>,
    pub slot: TimeSlot,
}

impl SessionState {
    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_active()
    }

    pub fn is_transitioning(&self, now: DateTime<Utc>) -> bool {
        self.transition_until.is_some_and(|until| now < until)
    }
}

pub struct SessionController<R = StdRng> {
    corpus: Corpus,
    clock: Arc<dyn Clock>,
    rng: R,
    timings: SessionTimings,
    navigator: Navigator,
    milestones: MilestoneTracker,
    transition_until: Option<DateTime<Utc>>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionController<StdRng> {
    /// Controller seeded from OS entropy.
    pub fn with_entropy(corpus: Corpus, clock: Arc<dyn Clock>, timings: SessionTimings) -> Self {
        Self::new(corpus, clock, StdRng::from_entropy(), timings)
    }
}

impl<R: Rng> SessionController<R> {
    /// Start a session on the entry preferred for the current slot.
    pub fn new(corpus: Corpus, clock: Arc<dyn Clock>, rng: R, timings: SessionTimings) -> Self {
        let slot = classify(&clock.now_local());
        let navigator = Navigator::initialize(&corpus, slot);
        tracing::debug!(entry = navigator.current().0, %slot, "Session initialized");

        let milestones = MilestoneTracker::new(timings.celebration);
        let initial = build_state(&corpus, &navigator, &milestones, None, slot);
        let (state_tx, _) = watch::channel(initial);

        Self {
            corpus,
            clock,
            rng,
            timings,
            navigator,
            milestones,
            transition_until: None,
            state_tx,
        }
    }

    pub fn timings(&self) -> SessionTimings {
        self.timings
    }

    pub fn current(&self) -> EntryId {
        self.navigator.current()
    }

    pub fn count(&self) -> u32 {
        self.milestones.count()
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        let slot = classify(&self.clock.now_local());
        build_state(
            &self.corpus,
            &self.navigator,
            &self.milestones,
            self.transition_until,
            slot,
        )
    }

    /// Move to a new random entry eligible for the current slot.
    pub fn advance(&mut self) -> NavOutcome {
        let now = self.clock.now_utc();
        if self.in_transition(now) {
            tracing::debug!("Advance rejected, transition in progress");
            return NavOutcome::Busy;
        }

        let slot = classify(&self.clock.now_local());
        let next = self.navigator.advance(&self.corpus, slot, &mut self.rng);
        self.entry_changed(now);
        NavOutcome::Moved(next)
    }

    /// Go back to the previously shown entry.
    pub fn retreat(&mut self) -> NavOutcome {
        let now = self.clock.now_utc();
        if self.navigator.history().is_empty() {
            return NavOutcome::NothingToUndo;
        }
        if self.in_transition(now) {
            tracing::debug!("Retreat rejected, transition in progress");
            return NavOutcome::Busy;
        }

        match self.navigator.retreat() {
            Some(previous) => {
                self.entry_changed(now);
                NavOutcome::Moved(previous)
            }
            None => NavOutcome::NothingToUndo,
        }
    }

    /// Count one tap on the current entry.
    pub fn tap(&mut self) -> TapOutcome {
        let now = self.clock.now_utc();
        let celebration = self.milestones.increment(now, &mut self.rng);
        self.publish();

        TapOutcome {
            count: self.milestones.count(),
            target: self.milestones.target(),
            celebration,
        }
    }

    /// Timer callback for the end of a celebration window.
    pub fn expire_celebration(&mut self, generation: u64) -> bool {
        let expired = self.milestones.expire(generation);
        if expired {
            self.publish();
        }
        expired
    }

    /// End a celebration whose deadline has passed even if its timer never
    /// fired. Called on every clock tick.
    pub fn expire_overdue(&mut self) -> bool {
        let expired = self.milestones.expire_due(self.clock.now_utc());
        if expired {
            tracing::debug!("Overdue celebration expired");
            self.publish();
        }
        expired
    }

    /// Timer callback for the end of a transition window.
    pub fn end_transition(&mut self) {
        let now = self.clock.now_utc();
        if self.transition_until.is_some_and(|until| until <= now) {
            self.transition_until = None;
            self.publish();
        }
    }

    fn in_transition(&self, now: DateTime<Utc>) -> bool {
        self.transition_until.is_some_and(|until| now < until)
    }

    fn entry_changed(&mut self, now: DateTime<Utc>) {
        self.milestones.reset();
        self.transition_until = Some(now + self.timings.transition);
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

fn build_state(
    corpus: &Corpus,
    navigator: &Navigator,
    milestones: &MilestoneTracker,
    transition_until: Option<DateTime<Utc>>,
    slot: TimeSlot,
) -> SessionState {
    SessionState {
        current: navigator.current(),
        entry: corpus.entry(navigator.current()),
        history: navigator.history().to_vec(),
        count: milestones.count(),
        target: milestones.target(),
        celebration: milestones.state().clone(),
        transition_until,
        slot,
    }
}

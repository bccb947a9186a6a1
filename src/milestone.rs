//! Tap counting, progress targets and milestone celebrations.
//!
//! The celebration is a two-state machine per entry:
//! `Idle -> Celebrating` when a tap lands on a milestone, and back to `Idle`
//! once its window elapses. Every celebration carries a generation number so
//! an expiry scheduled for an older celebration can never end a newer one.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

/// Markers generated per celebration burst.
pub const PARTICLE_COUNT: usize = 30;

/// Upper bound (exclusive) of a marker's stagger delay, in seconds.
pub const MAX_PARTICLE_DELAY: f64 = 0.3;

const FIRST_MILESTONE: u32 = 10;
const SECOND_MILESTONE: u32 = 100;
const REPEAT_INTERVAL: u32 = 50;

/// Progress goal shown next to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    Bounded(u32),
    /// Past the last fixed goal, progress is open ended.
    Unbounded,
}

/// Next goal for `count`: 10, then 100, then unbounded.
pub fn target(count: u32) -> Target {
    if count < FIRST_MILESTONE {
        Target::Bounded(FIRST_MILESTONE)
    } else if count < SECOND_MILESTONE {
        Target::Bounded(SECOND_MILESTONE)
    } else {
        Target::Unbounded
    }
}

/// 10, 100, and every multiple of 50 above 100.
pub fn is_milestone(count: u32) -> bool {
    count == FIRST_MILESTONE
        || count == SECOND_MILESTONE
        || (count > SECOND_MILESTONE && count % REPEAT_INTERVAL == 0)
}

/// Decorative marker; `x`/`y` are percentages of the viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Celebration {
    pub generation: u64,
    pub until: DateTime<Utc>,
    pub particles: Vec<Particle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum CelebrationState {
    #[default]
    Idle,
    Celebrating(Celebration),
}

impl CelebrationState {
    pub fn is_active(&self) -> bool {
        matches!(self, CelebrationState::Celebrating(_))
    }
}

/// Per-entry counter plus celebration state.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    count: u32,
    state: CelebrationState,
    window: Duration,
    generation: u64,
    next_particle_id: u64,
}

impl MilestoneTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            count: 0,
            state: CelebrationState::Idle,
            window,
            generation: 0,
            next_particle_id: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn target(&self) -> Target {
        target(self.count)
    }

    pub fn state(&self) -> &CelebrationState {
        &self.state
    }

    pub fn is_celebrating(&self) -> bool {
        self.state.is_active()
    }

    /// Count one tap; returns the new celebration if this tap hit a milestone.
    ///
    /// Triggering while already celebrating replaces the burst and moves the
    /// deadline, so there is only ever one live celebration.
    pub fn increment<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Option<Celebration> {
        self.count = self.count.saturating_add(1);
        if !is_milestone(self.count) {
            return None;
        }

        self.generation += 1;
        let celebration = Celebration {
            generation: self.generation,
            until: now + self.window,
            particles: self.burst(rng),
        };
        tracing::debug!(count = self.count, generation = self.generation, "Milestone reached");

        self.state = CelebrationState::Celebrating(celebration.clone());
        Some(celebration)
    }

    /// End the celebration with this generation. Stale generations are ignored.
    pub fn expire(&mut self, generation: u64) -> bool {
        match &self.state {
            CelebrationState::Celebrating(c) if c.generation == generation => {
                self.state = CelebrationState::Idle;
                true
            }
            _ => false,
        }
    }

    /// End the celebration if its deadline has passed.
    pub fn expire_due(&mut self, now: DateTime<Utc>) -> bool {
        match &self.state {
            CelebrationState::Celebrating(c) if c.until <= now => {
                self.state = CelebrationState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Back to zero with no celebration; used whenever the entry changes.
    pub fn reset(&mut self) {
        self.count = 0;
        self.state = CelebrationState::Idle;
    }

    fn burst<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Particle> {
        let first = self.next_particle_id;
        self.next_particle_id += PARTICLE_COUNT as u64;

        (0..PARTICLE_COUNT as u64)
            .map(|i| Particle {
                id: first + i,
                x: rng.gen_range(0.0..100.0),
                y: rng.gen_range(0.0..100.0),
                delay: rng.gen_range(0.0..MAX_PARTICLE_DELAY),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 13, 0, 0).unwrap()
    }

    fn tracker() -> MilestoneTracker {
        MilestoneTracker::new(Duration::seconds(2))
    }

    // ==================== Target Tests ====================

    #[test]
    fn test_target_thresholds() {
        assert_eq!(target(0), Target::Bounded(10));
        assert_eq!(target(5), Target::Bounded(10));
        assert_eq!(target(9), Target::Bounded(10));
        assert_eq!(target(10), Target::Bounded(100));
        assert_eq!(target(99), Target::Bounded(100));
        assert_eq!(target(100), Target::Unbounded);
        assert_eq!(target(5000), Target::Unbounded);
    }

    #[test]
    fn test_milestones() {
        let hits: Vec<u32> = (0..=400).filter(|&c| is_milestone(c)).collect();
        assert_eq!(hits, vec![10, 100, 150, 200, 250, 300, 350, 400]);
        assert!(!is_milestone(50));
    }

    // ==================== Tracker Tests ====================

    #[test]
    fn test_celebrates_exactly_at_milestones() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(1);
        let mut fired_at = Vec::new();

        for _ in 0..200 {
            if tracker.increment(now(), &mut rng).is_some() {
                fired_at.push(tracker.count());
            }
        }

        assert_eq!(fired_at, vec![10, 100, 150, 200]);
    }

    #[test]
    fn test_burst_shape() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..9 {
            tracker.increment(now(), &mut rng);
        }

        let celebration = tracker.increment(now(), &mut rng).unwrap();
        assert_eq!(celebration.particles.len(), PARTICLE_COUNT);
        assert_eq!(celebration.until, now() + Duration::seconds(2));
        for p in &celebration.particles {
            assert!((0.0..100.0).contains(&p.x));
            assert!((0.0..100.0).contains(&p.y));
            assert!((0.0..MAX_PARTICLE_DELAY).contains(&p.delay));
        }
        assert!(tracker.is_celebrating());
    }

    #[test]
    fn test_particle_ids_continue_across_bursts() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(3);
        let mut bursts = Vec::new();
        for _ in 0..100 {
            if let Some(c) = tracker.increment(now(), &mut rng) {
                bursts.push(c);
            }
        }

        assert_eq!(bursts[0].particles[0].id, 0);
        assert_eq!(bursts[1].particles[0].id, PARTICLE_COUNT as u64);
    }

    #[test]
    fn test_expire_ignores_stale_generation() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(4);
        let mut generations = Vec::new();
        for _ in 0..100 {
            if let Some(c) = tracker.increment(now(), &mut rng) {
                generations.push(c.generation);
            }
        }

        // The celebration from count 10 is superseded by the one at 100.
        assert!(!tracker.expire(generations[0]));
        assert!(tracker.is_celebrating());
        assert!(tracker.expire(generations[1]));
        assert!(!tracker.is_celebrating());
        assert!(!tracker.expire(generations[1]));
    }

    #[test]
    fn test_expire_due_respects_deadline() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            tracker.increment(now(), &mut rng);
        }

        assert!(!tracker.expire_due(now() + Duration::milliseconds(1999)));
        assert!(tracker.is_celebrating());
        assert!(tracker.expire_due(now() + Duration::seconds(2)));
        assert!(!tracker.is_celebrating());
    }

    #[test]
    fn test_reset_clears_count_and_celebration() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..10 {
            tracker.increment(now(), &mut rng);
        }

        tracker.reset();

        assert_eq!(tracker.count(), 0);
        assert_eq!(tracker.target(), Target::Bounded(10));
        assert_eq!(tracker.state(), &CelebrationState::Idle);
    }
}

use crate::config::GestureConfig;

/// Vertical pull tracker; releasing past the trigger distance means "advance".
///
/// A pull only arms when it starts in the bottom part of the viewport.
/// Movements at or beyond `max_px` are ignored, so the last in-range
/// distance is what counts on release.
#[derive(Debug, Clone)]
pub struct PullGesture {
    config: GestureConfig,
    start_y: Option<f64>,
    distance: f64,
}

impl PullGesture {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            start_y: None,
            distance: 0.0,
        }
    }

    /// Begin a touch at `y`; returns whether the pull armed.
    pub fn start(&mut self, y: f64, viewport_height: f64) -> bool {
        if y > viewport_height * self.config.arm_fraction {
            self.start_y = Some(y);
            self.distance = 0.0;
            true
        } else {
            false
        }
    }

    pub fn move_to(&mut self, y: f64) {
        let Some(start) = self.start_y else {
            return;
        };
        let distance = (y - start).max(0.0);
        if distance > 0.0 && distance < self.config.max_px {
            self.distance = distance;
        }
    }

    /// Current pull distance, for visual feedback.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn is_pulling(&self) -> bool {
        self.start_y.is_some()
    }

    /// End the touch. Returns `true` when it should trigger an advance.
    pub fn release(&mut self) -> bool {
        let triggered = self.distance > self.config.trigger_px;
        self.start_y = None;
        self.distance = 0.0;
        triggered
    }
}

impl Default for PullGesture {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

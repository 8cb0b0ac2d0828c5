//! Per-critter frame advancement.
//!
//! A clock is either wall-time driven (advance every N ms, for critters that
//! animate in place or run continuously) or distance driven (advance once the
//! sprite has travelled a fraction of its own width, tying animation speed to
//! locomotion speed). Either way the atlas cell must be re-applied every tick,
//! even when the frame did not change: the movement primitive is allowed to
//! overwrite presentation state while repositioning, so the clock has to be
//! the last writer each tick.

/// What accumulates between frame advances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameDriver {
    /// Advance one frame every `every_ms` of elapsed time.
    Interval { every_ms: f64 },
    /// Advance one frame after `threshold` px of absolute horizontal travel.
    Distance { threshold: f64 },
}

/// Result of one clock step. `frame` must be re-applied by the caller whether
/// or not `advanced` is set.
#[derive(Clone, Copy, Debug)]
pub struct FrameTick {
    pub frame: usize,
    pub advanced: bool,
}

#[derive(Clone, Debug)]
pub struct AnimationClock {
    driver: FrameDriver,
    frame_count: usize,
    frame: usize,
    acc: f64,
}

impl AnimationClock {
    pub fn new(driver: FrameDriver, frame_count: usize) -> Self {
        Self {
            driver,
            frame_count: frame_count.max(1),
            frame: 0,
            acc: 0.0,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Feed one tick's elapsed time and absolute horizontal displacement.
    /// At most one frame is advanced per call; the accumulator resets to zero
    /// on advance (excess is dropped, keeping cadence stable across jitter).
    pub fn step(&mut self, dt_ms: f64, dx_abs: f64) -> FrameTick {
        let (gain, threshold) = match self.driver {
            FrameDriver::Interval { every_ms } => (dt_ms.max(0.0), every_ms),
            FrameDriver::Distance { threshold } => (dx_abs.abs(), threshold),
        };
        self.acc += gain;
        let advanced = threshold > 0.0 && self.acc >= threshold;
        if advanced {
            self.acc = 0.0;
            self.frame = (self.frame + 1) % self.frame_count;
        }
        FrameTick {
            frame: self.frame,
            advanced,
        }
    }

    /// Back to frame 0 with an empty accumulator. Used on spawn/respawn only;
    /// direction changes intentionally keep the frame for continuity.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_clock_advances_on_elapsed_time() {
        let mut c = AnimationClock::new(FrameDriver::Interval { every_ms: 100.0 }, 4);
        assert!(!c.step(40.0, 0.0).advanced);
        assert!(!c.step(40.0, 0.0).advanced);
        let t = c.step(40.0, 0.0);
        assert!(t.advanced);
        assert_eq!(t.frame, 1);
    }

    #[test]
    fn distance_clock_one_frame_per_threshold_crossing() {
        // width/6 threshold: a single step of exactly the threshold advances
        // exactly one frame, never more.
        let mut c = AnimationClock::new(FrameDriver::Distance { threshold: 8.0 }, 3);
        let t = c.step(16.0, 8.0);
        assert!(t.advanced);
        assert_eq!(t.frame, 1);
        // A huge jump still only advances once per step.
        let t = c.step(16.0, 80.0);
        assert!(t.advanced);
        assert_eq!(t.frame, 2);
    }

    #[test]
    fn frame_wraps_modulo_count() {
        let mut c = AnimationClock::new(FrameDriver::Interval { every_ms: 10.0 }, 3);
        for _ in 0..7 {
            let t = c.step(10.0, 0.0);
            assert!(t.frame < 3);
        }
        assert_eq!(c.frame(), 1); // 7 advances mod 3
    }

    #[test]
    fn reset_returns_to_frame_zero() {
        let mut c = AnimationClock::new(FrameDriver::Distance { threshold: 5.0 }, 6);
        c.step(0.0, 5.0);
        c.step(0.0, 5.0);
        assert_eq!(c.frame(), 2);
        c.reset();
        assert_eq!(c.frame(), 0);
        // Accumulator cleared too: a sub-threshold move does not advance.
        assert!(!c.step(0.0, 4.0).advanced);
    }
}

//! One spawned critter: position, facing, animation clock and the lifecycle
//! state machine `Spawning -> Alive -> Dying -> Despawned`, with pooled reuse
//! feeding back into `Spawning`. The entity owns at most one fall state and
//! one fade deadline at a time; installing a new one replaces the old slot, so
//! a death can never run two overlapping fall chains.

use crate::engine::CritterId;
use crate::engine::clock::{AnimationClock, FrameTick};
use crate::engine::fall::{FallSample, FallState};
use crate::engine::profile::{DeathStyle, Facing, KindTraits, SubKind};

/// Horizontal displacement below this is ignored for facing recomputation, so
/// near-zero drift does not flicker the sprite.
const FACING_DEADBAND: f64 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Entrance in progress; promoted to `Alive` at `until`.
    Spawning { until: f64 },
    Alive,
    Dying,
    Despawned,
}

#[derive(Clone, Debug)]
pub struct Critter {
    id: CritterId,
    traits_: KindTraits,
    x: f64,
    y: f64,
    facing: Facing,
    speed: f64,
    clock: AnimationClock,
    phase: Phase,
    fall: Option<FallState>,
    fade_due: Option<f64>,
}

/// What the death machinery did this tick.
#[derive(Clone, Copy, Debug)]
pub enum DeathTick {
    NotDying,
    Falling(FallSample),
    /// Fall just finished; the fade-out window begins now.
    FadeBegun(FallSample),
    StillFading,
    /// Fade elapsed; the entity has been returned to the pool.
    Returned,
}

impl Critter {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        id: CritterId,
        traits_: KindTraits,
        clock: AnimationClock,
        x: f64,
        y: f64,
        facing: Facing,
        speed: f64,
        now: f64,
        walk_in_ms: f64,
    ) -> Self {
        Self {
            id,
            traits_,
            x,
            y,
            facing: traits_.fixed_facing.unwrap_or(facing),
            speed,
            clock,
            phase: Phase::Spawning {
                until: now + walk_in_ms,
            },
            fall: None,
            fade_due: None,
        }
    }

    /// Pooled reuse: everything is reinitialized, nothing leaks from the
    /// previous life.
    #[allow(clippy::too_many_arguments)]
    pub fn respawn(
        &mut self,
        traits_: KindTraits,
        clock: AnimationClock,
        x: f64,
        y: f64,
        facing: Facing,
        speed: f64,
        now: f64,
        walk_in_ms: f64,
    ) {
        *self = Self::spawn(self.id, traits_, clock, x, y, facing, speed, now, walk_in_ms);
    }

    pub fn id(&self) -> CritterId {
        self.id
    }

    pub fn kind(&self) -> SubKind {
        self.traits_.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn frame(&self) -> usize {
        self.clock.frame()
    }

    /// False only during the fall/respawn window; a walk-in counts as live.
    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Spawning { .. } | Phase::Alive)
    }

    /// Finish the entrance once its deadline passes. Frame resets to 0 here,
    /// the one place animation continuity is deliberately broken.
    pub fn promote_if_due(&mut self, now: f64) -> bool {
        if let Phase::Spawning { until } = self.phase {
            if now >= until {
                self.phase = Phase::Alive;
                self.clock.reset();
                return true;
            }
        }
        false
    }

    /// Movement callback from the host: adopt the new position, refresh facing
    /// past the deadband, and step the animation clock. Returns None while the
    /// entity is not live (a dying critter neither walks nor animates).
    pub fn on_move(&mut self, x: f64, y: f64, dt_ms: f64) -> Option<FrameTick> {
        if !self.is_live() {
            return None;
        }
        let dx = x - self.x;
        self.x = x;
        self.y = y;
        if self.traits_.fixed_facing.is_none() && dx.abs() > FACING_DEADBAND {
            self.facing = if dx < 0.0 { Facing::Left } else { Facing::Right };
        }
        Some(self.clock.step(dt_ms, dx.abs()))
    }

    /// Elimination signal. Idempotent: anything but `Alive` is a no-op and the
    /// caller must not count a hit. On success the fall slot is installed
    /// (replacing any stale state) and the entity stops walking/animating.
    pub fn eliminate(
        &mut self,
        now: f64,
        ground_y: f64,
        fall_ms: f64,
        ease_k: f64,
        style: DeathStyle,
        spin_sign: f64,
    ) -> bool {
        if self.phase != Phase::Alive {
            return false;
        }
        self.phase = Phase::Dying;
        self.fade_due = None;
        self.fall = Some(FallState::new(
            self.y, ground_y, now, fall_ms, ease_k, style, spin_sign,
        ));
        true
    }

    /// Advance the fall/fade chain one repaint tick.
    pub fn tick_death(&mut self, now: f64, fade_ms: f64) -> DeathTick {
        if self.phase != Phase::Dying {
            return DeathTick::NotDying;
        }
        if let Some(due) = self.fade_due {
            if now >= due {
                self.phase = Phase::Despawned;
                self.fall = None;
                self.fade_due = None;
                return DeathTick::Returned;
            }
            return DeathTick::StillFading;
        }
        let Some(fall) = self.fall else {
            // Defensive: a Dying entity always carries a fall slot.
            self.phase = Phase::Despawned;
            return DeathTick::Returned;
        };
        let sample = fall.sample(now);
        self.y = sample.y;
        if sample.done {
            self.fade_due = Some(now + fade_ms);
            DeathTick::FadeBegun(sample)
        } else {
            DeathTick::Falling(sample)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::FrameDriver;
    use crate::engine::profile::{FrameDriverKind, SeasonProfile};

    fn walker() -> Critter {
        let traits_ = KindTraits {
            kind: SubKind::Walker,
            driver: FrameDriverKind::DistancePerWidthSixth,
            weight: 100,
            fixed_facing: None,
            speed_scale: 1.0,
        };
        Critter::spawn(
            CritterId(0),
            traits_,
            AnimationClock::new(FrameDriver::Distance { threshold: 8.0 }, 4),
            100.0,
            200.0,
            Facing::Right,
            50.0,
            0.0,
            600.0,
        )
    }

    #[test]
    fn spawning_promotes_to_alive_at_deadline() {
        let mut c = walker();
        assert!(matches!(c.phase(), Phase::Spawning { .. }));
        assert!(c.is_live());
        assert!(!c.promote_if_due(599.0));
        assert!(c.promote_if_due(600.0));
        assert_eq!(c.phase(), Phase::Alive);
        assert_eq!(c.frame(), 0);
    }

    #[test]
    fn facing_flips_only_past_deadband() {
        let mut c = walker();
        c.promote_if_due(600.0);
        c.on_move(99.5, 200.0, 16.0); // within deadband, keeps Right
        assert_eq!(c.facing(), Facing::Right);
        c.on_move(95.0, 200.0, 16.0);
        assert_eq!(c.facing(), Facing::Left);
    }

    #[test]
    fn direction_change_preserves_frame() {
        let mut c = walker();
        c.promote_if_due(600.0);
        c.on_move(108.0, 200.0, 16.0); // +8 => one advance
        assert_eq!(c.frame(), 1);
        c.on_move(100.0, 200.0, 16.0); // -8, flips facing, advances again
        assert_eq!(c.facing(), Facing::Left);
        assert_eq!(c.frame(), 2);
    }

    #[test]
    fn eliminate_is_idempotent() {
        let p = SeasonProfile::gingerbread();
        let mut c = walker();
        c.promote_if_due(600.0);
        assert!(c.eliminate(700.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0));
        assert!(!c.eliminate(701.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0));
        assert!(!c.is_live());
    }

    #[test]
    fn eliminate_before_alive_is_refused() {
        let p = SeasonProfile::gingerbread();
        let mut c = walker();
        assert!(!c.eliminate(10.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0));
        assert!(c.is_live());
    }

    #[test]
    fn dying_critter_ignores_movement() {
        let p = SeasonProfile::gingerbread();
        let mut c = walker();
        c.promote_if_due(600.0);
        c.eliminate(700.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0);
        assert!(c.on_move(300.0, 300.0, 16.0).is_none());
        assert_eq!(c.position().0, 100.0);
    }

    #[test]
    fn death_chain_falls_fades_then_returns() {
        let p = SeasonProfile::gingerbread();
        let mut c = walker();
        c.promote_if_due(600.0);
        c.eliminate(700.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0);
        assert!(matches!(c.tick_death(800.0, p.fade_ms), DeathTick::Falling(_)));
        let done_at = 700.0 + p.fall_ms;
        assert!(matches!(
            c.tick_death(done_at, p.fade_ms),
            DeathTick::FadeBegun(_)
        ));
        assert!(matches!(
            c.tick_death(done_at + 1.0, p.fade_ms),
            DeathTick::StillFading
        ));
        assert!(matches!(
            c.tick_death(done_at + p.fade_ms, p.fade_ms),
            DeathTick::Returned
        ));
        assert_eq!(c.phase(), Phase::Despawned);
    }

    #[test]
    fn respawn_reinitializes_everything() {
        let p = SeasonProfile::gingerbread();
        let mut c = walker();
        c.promote_if_due(600.0);
        c.on_move(108.0, 200.0, 16.0);
        c.eliminate(700.0, 500.0, p.fall_ms, p.fall_ease_k, p.death_style, 1.0);
        c.tick_death(700.0 + p.fall_ms, p.fade_ms);
        c.tick_death(700.0 + p.fall_ms + p.fade_ms, p.fade_ms);

        let traits_ = c.traits_;
        c.respawn(
            traits_,
            AnimationClock::new(FrameDriver::Distance { threshold: 8.0 }, 4),
            10.0,
            20.0,
            Facing::Right,
            60.0,
            5000.0,
            600.0,
        );
        assert!(c.is_live());
        assert_eq!(c.frame(), 0);
        assert_eq!(c.position(), (10.0, 20.0));
        assert_eq!(c.speed(), 60.0);
        assert!(matches!(c.tick_death(9999.0, p.fade_ms), DeathTick::NotDying));
    }
}

//! Spawn scheduling and population control. The controller owns the critter
//! arena, the reconcile schedule and the pending-spawn queue; the host (DOM
//! layer in the browser, a mock in tests) owns pixels. Everything is driven by
//! `tick(now)` from the shared repaint loop, so no hidden timers exist and the
//! whole lifecycle replays deterministically under simulated time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::CritterId;
use crate::engine::clock::AnimationClock;
use crate::engine::entity::{Critter, DeathTick, Phase};
use crate::engine::fall::FallSample;
use crate::engine::profile::{Facing, PopulationConfig, SeasonProfile, SubKind};

/// Where a freshly placed sprite enters the screen.
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
}

/// Boundary to the base sprite-movement system. The engine never touches the
/// DOM; it asks the host to place, paint and recycle primitive sprites and the
/// host routes movement and click signals back in.
pub trait SpriteHost {
    /// Create (or re-activate) the primitive sprite for `id`, start its
    /// walk-in entrance, and report where it entered.
    fn place(&mut self, id: CritterId, kind: SubKind) -> Placement;
    fn sprite_size(&self, id: CritterId) -> (f64, f64);
    fn viewport_height(&self) -> f64;
    /// Re-assert the atlas cell (pixel offsets into the sheet). Called every
    /// tick, also when the frame did not change: the clock is the last writer.
    fn apply_frame(&mut self, id: CritterId, cell_x: f64, cell_y: f64);
    fn apply_fall(&mut self, id: CritterId, sample: FallSample);
    fn begin_fade(&mut self, id: CritterId);
    /// Return the primitive sprite to the base pool.
    fn recycle(&mut self, id: CritterId);
}

pub struct Population {
    profile: SeasonProfile,
    cfg: PopulationConfig,
    rng: StdRng,
    critters: Vec<Critter>,
    /// Due timestamps of spawns a reconcile pass has queued but not fired.
    pending: Vec<f64>,
    next_reconcile: Option<f64>,
    running: bool,
    /// Cumulative eliminations, drives the difficulty multiplier. Seeded from
    /// the persisted primary count so returning players resume their curve.
    score: u64,
}

impl Population {
    pub fn new(profile: SeasonProfile) -> Self {
        Self::with_rng(profile, StdRng::from_entropy())
    }

    pub fn with_seed(profile: SeasonProfile, seed: u64) -> Self {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }

    fn with_rng(profile: SeasonProfile, rng: StdRng) -> Self {
        let cfg = profile.config.clamped();
        Self {
            profile,
            cfg,
            rng,
            critters: Vec::new(),
            pending: Vec::new(),
            next_reconcile: None,
            running: false,
            score: 0,
        }
    }

    pub fn profile(&self) -> &SeasonProfile {
        &self.profile
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn set_score(&mut self, score: u64) {
        self.score = score;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Critters that count against the population bounds (Spawning or Alive).
    pub fn live_count(&self) -> usize {
        self.critters.iter().filter(|c| c.is_live()).count()
    }

    pub fn critter(&self, id: CritterId) -> Option<&Critter> {
        self.critters.get(id.0)
    }

    /// Idempotent: a second start never doubles the reconcile schedule.
    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.next_reconcile = Some(now);
    }

    /// Idempotent, safe when not started. Cancels the reconcile schedule and
    /// drops queued spawn delays; critters mid-fall keep falling on their own.
    pub fn stop(&mut self) {
        self.running = false;
        self.next_reconcile = None;
        self.pending.clear();
    }

    /// Queue spawns for the deficit below `min_live`. Each queued spawn gets
    /// its own random delay, compressed by the difficulty multiplier. Targets
    /// never exceed `max_live`; the fire path re-checks anyway.
    pub fn reconcile(&mut self, now: f64) {
        let committed = self.live_count() + self.pending.len();
        let target = self.cfg.min_live.min(self.cfg.max_live);
        let difficulty = self.cfg.difficulty(self.score);
        for _ in committed..target {
            let (lo, hi) = self.cfg.spawn_delay_ms;
            let delay = self.rng.gen_range(lo..=hi) / difficulty;
            self.pending.push(now + delay);
        }
    }

    /// Immediate spawn. Refuses at `max_live`, checked at this moment and not
    /// when the spawn was decided, so queued spawns cannot overshoot.
    pub fn spawn_now<H: SpriteHost>(&mut self, now: f64, host: &mut H) -> Option<CritterId> {
        if self.live_count() >= self.cfg.max_live {
            return None;
        }
        let traits_ = self.profile.pick_kind(&mut self.rng);
        let (lo, hi) = self.cfg.speed_range;
        let speed = self.rng.gen_range(lo..=hi) * self.cfg.difficulty(self.score) * traits_.speed_scale;

        // Reuse the first pooled slot; otherwise grow the arena.
        let id = match self
            .critters
            .iter()
            .position(|c| c.phase() == Phase::Despawned)
        {
            Some(idx) => CritterId(idx),
            None => CritterId(self.critters.len()),
        };
        let placement = host.place(id, traits_.kind);
        let (sprite_w, _) = host.sprite_size(id);
        let clock = AnimationClock::new(traits_.driver.resolve(sprite_w), self.profile.atlas.frames);
        if id.0 == self.critters.len() {
            self.critters.push(Critter::spawn(
                id,
                traits_,
                clock,
                placement.x,
                placement.y,
                placement.facing,
                speed,
                now,
                self.cfg.walk_in_ms,
            ));
        } else {
            self.critters[id.0].respawn(
                traits_,
                clock,
                placement.x,
                placement.y,
                placement.facing,
                speed,
                now,
                self.cfg.walk_in_ms,
            );
        }
        let critter = &self.critters[id.0];
        let (cx, cy) = self.profile.atlas.cell(critter.frame(), critter.facing());
        host.apply_frame(id, cx, cy);
        Some(id)
    }

    /// Host movement callback for one critter: adopt position, step the
    /// animation clock, and re-assert the atlas cell as the last writer.
    pub fn on_move<H: SpriteHost>(
        &mut self,
        id: CritterId,
        x: f64,
        y: f64,
        dt_ms: f64,
        host: &mut H,
    ) {
        let Some(critter) = self.critters.get_mut(id.0) else {
            return;
        };
        if critter.on_move(x, y, dt_ms).is_some() {
            let (cx, cy) = self.profile.atlas.cell(critter.frame(), critter.facing());
            host.apply_frame(id, cx, cy);
        }
    }

    /// Elimination signal routed from the host. Returns true exactly once per
    /// life; the caller records the hit (stats, display) only on true.
    pub fn eliminate<H: SpriteHost>(&mut self, id: CritterId, now: f64, host: &mut H) -> bool {
        let spin_sign = if self.rng.r#gen::<bool>() { 1.0 } else { -1.0 };
        let Some(critter) = self.critters.get_mut(id.0) else {
            return false;
        };
        let (_, sprite_h) = host.sprite_size(id);
        let ground_y = host.viewport_height() - sprite_h - self.profile.ground_margin;
        if !critter.eliminate(
            now,
            ground_y,
            self.profile.fall_ms,
            self.profile.fall_ease_k,
            self.profile.death_style,
            spin_sign,
        ) {
            return false;
        }
        self.score += 1;
        // Terminal pose before the fall starts.
        let (cx, cy) = self
            .profile
            .atlas
            .cell(self.profile.atlas.death_frame, critter.facing());
        host.apply_frame(id, cx, cy);
        true
    }

    /// One repaint tick: run a due reconcile, fire due spawns, finish
    /// walk-ins, and advance every dying critter's fall/fade chain. Returns
    /// the ids recycled this tick.
    pub fn tick<H: SpriteHost>(&mut self, now: f64, host: &mut H) -> Vec<CritterId> {
        if self.running {
            if let Some(due) = self.next_reconcile {
                if now >= due {
                    self.reconcile(now);
                    self.next_reconcile = Some(now + self.cfg.reconcile_every_ms);
                }
            }
        }

        // Fire queued spawns whose delay elapsed. A stopped controller has an
        // empty queue; stale due-stamps simply no-op out of it.
        let mut i = 0;
        while i < self.pending.len() {
            if now >= self.pending[i] {
                self.pending.swap_remove(i);
                self.spawn_now(now, host);
            } else {
                i += 1;
            }
        }

        let mut returned = Vec::new();
        for idx in 0..self.critters.len() {
            let id = CritterId(idx);
            if self.critters[idx].promote_if_due(now) {
                let critter = &self.critters[idx];
                let (cx, cy) = self.profile.atlas.cell(critter.frame(), critter.facing());
                host.apply_frame(id, cx, cy);
                continue;
            }
            match self.critters[idx].tick_death(now, self.profile.fade_ms) {
                DeathTick::NotDying | DeathTick::StillFading => {}
                DeathTick::Falling(sample) => host.apply_fall(id, sample),
                DeathTick::FadeBegun(sample) => {
                    host.apply_fall(id, sample);
                    host.begin_fade(id);
                }
                DeathTick::Returned => {
                    host.recycle(id);
                    returned.push(id);
                }
            }
        }

        // A pool return reconciles immediately so replacements are queued
        // without waiting out the fixed period.
        if self.running && !returned.is_empty() {
            self.reconcile(now);
        }
        returned
    }
}

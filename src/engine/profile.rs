//! Season profiles: everything that differs between the seasonal variants is
//! data here, so one engine serves both. A profile bundles the sprite atlas,
//! the frame driver choice, the death visuals, sub-kind weighting and the
//! difficulty curve; the entity and controller code never branch on season.

use rand::Rng;

use crate::engine::clock::FrameDriver;

/// Behavior sub-kind attached to an entity at spawn, immutable per life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubKind {
    /// Sprints across the screen, time-driven run cycle.
    Runner,
    /// Mostly stationary, wiggles in place facing the viewer.
    Wiggler,
    /// Ambles along, distance-driven walk cycle, "cooked" death pose.
    Walker,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// 2-D sprite sheet addressing: columns are frames, rows are facings (or a
/// single row for flat frame lists).
#[derive(Clone, Copy, Debug)]
pub struct SpriteAtlas {
    /// Sheet image the host binds as the sprite background.
    pub sheet: &'static str,
    pub cell_w: f64,
    pub cell_h: f64,
    pub frames: usize,
    /// When set, row 0 renders `Left` and row 1 renders `Right`.
    pub directional_rows: bool,
    /// Atlas column holding the struck/cooked terminal pose.
    pub death_frame: usize,
}

impl SpriteAtlas {
    /// Pixel offsets of a cell, for `background-position: -x -y`.
    pub fn cell(&self, frame: usize, facing: Facing) -> (f64, f64) {
        let col = frame % self.frames.max(1);
        let row = if self.directional_rows {
            match facing {
                Facing::Left => 0,
                Facing::Right => 1,
            }
        } else {
            0
        };
        (col as f64 * self.cell_w, row as f64 * self.cell_h)
    }
}

/// How a dying critter leaves the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeathStyle {
    /// Full-turn rotation with random sign while falling.
    Spin,
    /// No rotation; the sprite is mirrored horizontally on the way down.
    TumbleMirrored,
}

/// Per-sub-kind animation parameters.
#[derive(Clone, Copy, Debug)]
pub struct KindTraits {
    pub kind: SubKind,
    pub driver: FrameDriverKind,
    /// Spawn weight relative to the other sub-kinds of the profile.
    pub weight: u32,
    /// Some(_) pins facing for face-the-viewer kinds; None derives it from
    /// movement.
    pub fixed_facing: Option<Facing>,
    /// Fraction of base speed this kind moves at (wigglers barely drift).
    pub speed_scale: f64,
}

/// Frame driver selection, resolved against the sprite's on-screen width at
/// spawn time (the distance threshold is width / 6).
#[derive(Clone, Copy, Debug)]
pub enum FrameDriverKind {
    Interval { every_ms: f64 },
    DistancePerWidthSixth,
}

impl FrameDriverKind {
    pub fn resolve(&self, sprite_w: f64) -> FrameDriver {
        match *self {
            FrameDriverKind::Interval { every_ms } => FrameDriver::Interval { every_ms },
            FrameDriverKind::DistancePerWidthSixth => FrameDriver::Distance {
                threshold: (sprite_w / 6.0).max(1.0),
            },
        }
    }
}

/// Population bounds and pacing, immutable per controller instance.
#[derive(Clone, Copy, Debug)]
pub struct PopulationConfig {
    pub min_live: usize,
    pub max_live: usize,
    /// Random per-entity delay between a reconcile decision and the spawn.
    pub spawn_delay_ms: (f64, f64),
    pub speed_range: (f64, f64),
    /// Score span over which the difficulty multiplier climbs toward the cap.
    pub difficulty_window: f64,
    pub difficulty_cap: f64,
    pub reconcile_every_ms: f64,
    pub walk_in_ms: f64,
}

impl PopulationConfig {
    /// Normalized copy: `min_live` can never exceed `max_live`.
    pub fn clamped(mut self) -> Self {
        self.min_live = self.min_live.min(self.max_live);
        self
    }

    /// Monotonically increasing, capped multiplier over cumulative score.
    pub fn difficulty(&self, score: u64) -> f64 {
        if self.difficulty_window <= 0.0 {
            return 1.0;
        }
        (1.0 + score as f64 / self.difficulty_window).min(self.difficulty_cap)
    }
}

/// Everything one seasonal variant needs.
#[derive(Clone, Debug)]
pub struct SeasonProfile {
    pub name: &'static str,
    pub storage_key: &'static str,
    pub atlas: SpriteAtlas,
    pub kinds: &'static [KindTraits],
    pub death_style: DeathStyle,
    pub fall_ms: f64,
    /// Ease-out exponent for the fall (k in [2, 2.5]).
    pub fall_ease_k: f64,
    pub fade_ms: f64,
    pub ground_margin: f64,
    pub config: PopulationConfig,
}

impl SeasonProfile {
    /// Weighted random sub-kind choice.
    pub fn pick_kind<R: Rng>(&self, rng: &mut R) -> KindTraits {
        let total: u32 = self.kinds.iter().map(|k| k.weight).sum();
        if total == 0 {
            return self.kinds[0];
        }
        let mut roll = rng.gen_range(0..total);
        for k in self.kinds {
            if roll < k.weight {
                return *k;
            }
            roll -= k.weight;
        }
        self.kinds[self.kinds.len() - 1]
    }

    /// Turkeys sprint and wiggle; feast-counter difficulty caps at 2x.
    pub fn turkey() -> Self {
        const KINDS: &[KindTraits] = &[
            KindTraits {
                kind: SubKind::Runner,
                driver: FrameDriverKind::Interval { every_ms: 100.0 },
                weight: 70,
                fixed_facing: None,
                speed_scale: 1.0,
            },
            KindTraits {
                kind: SubKind::Wiggler,
                driver: FrameDriverKind::Interval { every_ms: 120.0 },
                weight: 30,
                fixed_facing: Some(Facing::Right),
                speed_scale: 0.15,
            },
        ];
        Self {
            name: "turkey",
            storage_key: "critter-romp/turkey",
            atlas: SpriteAtlas {
                sheet: "assets/turkey-sheet.png",
                cell_w: 64.0,
                cell_h: 64.0,
                frames: 6,
                directional_rows: true,
                death_frame: 5,
            },
            kinds: KINDS,
            death_style: DeathStyle::Spin,
            fall_ms: 900.0,
            fall_ease_k: 2.0,
            fade_ms: 400.0,
            ground_margin: 8.0,
            config: PopulationConfig {
                min_live: 4,
                max_live: 6,
                spawn_delay_ms: (300.0, 1200.0),
                speed_range: (40.0, 90.0),
                difficulty_window: 40.0,
                difficulty_cap: 2.0,
                reconcile_every_ms: 1500.0,
                walk_in_ms: 600.0,
            }
            .clamped(),
        }
    }

    /// Gingerbread folk walk in step with their stride and bake on a hit;
    /// gift-counter difficulty caps at 1.25x.
    pub fn gingerbread() -> Self {
        const KINDS: &[KindTraits] = &[KindTraits {
            kind: SubKind::Walker,
            driver: FrameDriverKind::DistancePerWidthSixth,
            weight: 100,
            fixed_facing: None,
            speed_scale: 1.0,
        }];
        Self {
            name: "gingerbread",
            storage_key: "critter-romp/gingerbread",
            atlas: SpriteAtlas {
                sheet: "assets/gingerbread-sheet.png",
                cell_w: 48.0,
                cell_h: 56.0,
                frames: 4,
                directional_rows: true,
                death_frame: 3,
            },
            kinds: KINDS,
            death_style: DeathStyle::TumbleMirrored,
            fall_ms: 750.0,
            fall_ease_k: 2.5,
            fade_ms: 400.0,
            ground_margin: 8.0,
            config: PopulationConfig {
                min_live: 3,
                max_live: 5,
                spawn_delay_ms: (400.0, 1400.0),
                speed_range: (25.0, 55.0),
                difficulty_window: 100.0,
                difficulty_cap: 1.25,
                reconcile_every_ms: 1500.0,
                walk_in_ms: 700.0,
            }
            .clamped(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn config_clamps_min_to_max() {
        let cfg = PopulationConfig {
            min_live: 9,
            max_live: 4,
            ..SeasonProfile::turkey().config
        }
        .clamped();
        assert_eq!(cfg.min_live, 4);
    }

    #[test]
    fn difficulty_is_capped_and_monotonic() {
        let cfg = SeasonProfile::turkey().config;
        let mut prev = 0.0;
        for score in [0u64, 10, 40, 100, 10_000] {
            let d = cfg.difficulty(score);
            assert!(d >= prev);
            assert!(d <= cfg.difficulty_cap);
            prev = d;
        }
        assert_eq!(cfg.difficulty(0), 1.0);
    }

    #[test]
    fn weighted_kind_pick_respects_weights_roughly() {
        let profile = SeasonProfile::turkey();
        let mut rng = StdRng::seed_from_u64(7);
        let runners = (0..1000)
            .filter(|_| profile.pick_kind(&mut rng).kind == SubKind::Runner)
            .count();
        // 70/30 split; allow generous slack.
        assert!((600..800).contains(&runners), "runners = {runners}");
    }

    #[test]
    fn atlas_cell_addresses_direction_rows() {
        let atlas = SeasonProfile::turkey().atlas;
        assert_eq!(atlas.cell(2, Facing::Left), (128.0, 0.0));
        assert_eq!(atlas.cell(2, Facing::Right), (128.0, 64.0));
        // Frame index wraps into range.
        assert_eq!(atlas.cell(7, Facing::Left).0, 64.0);
    }
}

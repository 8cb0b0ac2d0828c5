//! Season-agnostic critter engine: animation clocks, the entity state
//! machine, the fall animator and the population controller. Nothing in this
//! module touches the DOM; the browser side plugs in through [`SpriteHost`]
//! and everything time-based is a function of a caller-supplied `now` in ms,
//! which is what keeps the whole lifecycle runnable under `cargo test` on the
//! host.

pub mod clock;
pub mod entity;
pub mod fall;
pub mod population;
pub mod profile;

pub use clock::{AnimationClock, FrameDriver, FrameTick};
pub use entity::{Critter, DeathTick, Phase};
pub use fall::{FallSample, FallState};
pub use population::{Placement, Population, SpriteHost};
pub use profile::{
    DeathStyle, Facing, FrameDriverKind, KindTraits, PopulationConfig, SeasonProfile, SpriteAtlas,
    SubKind,
};

/// Slot index into the controller's arena. Stable for the entity's lifetime,
/// reused after the entity returns to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CritterId(pub usize);

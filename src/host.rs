//! Browser side of the [`SpriteHost`] boundary: primitive `<div>` sprites
//! positioned with fixed CSS, a minimal walk-and-bounce movement layer, and
//! per-sprite click routing. Presentation state is always written as one whole
//! style attribute, which is what makes the engine's "clock is the last
//! writer" rule hold by construction.
//!
//! Also home to the `localStorage` backend for the stats store.

use rand::Rng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, window};

use crate::engine::{CritterId, FallSample, Placement, Population, SpriteAtlas, SpriteHost, SubKind};
use crate::stats::KvStorage;

/// One primitive sprite and the presentation state composed into its style.
struct Sprite {
    el: Option<Element>,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    /// Walk direction, +1 right / -1 left. Owned by the movement layer.
    dir: f64,
    /// Set once the sprite has been fully inside the viewport. Until then it
    /// is still walking in from off-screen and the edge bounce must not
    /// apply, or the entrance would snap straight to the boundary.
    entered: bool,
    cell: (f64, f64),
    rotation_deg: f64,
    mirrored: bool,
    fading: bool,
    active: bool,
}

pub struct DomSpriteHost {
    atlas: SpriteAtlas,
    sprites: Vec<Sprite>,
}

// Clicks land in a queue the frame loop drains, so listener closures never
// need a handle on the season state.
thread_local! {
    static CLICKS: std::cell::RefCell<Vec<CritterId>> = const { std::cell::RefCell::new(Vec::new()) };
}

pub fn take_clicks() -> Vec<CritterId> {
    CLICKS.with(|q| q.borrow_mut().drain(..).collect())
}

impl DomSpriteHost {
    pub fn new(atlas: SpriteAtlas) -> Self {
        Self {
            atlas,
            sprites: Vec::new(),
        }
    }

    fn viewport(&self) -> (f64, f64) {
        let Some(win) = window() else {
            return (1280.0, 720.0);
        };
        let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
        let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
        (w, h)
    }

    /// Rewrite the sprite's entire style attribute from its current state.
    fn sync(&self, id: CritterId) {
        let Some(sprite) = self.sprites.get(id.0) else {
            return;
        };
        let Some(el) = sprite.el.as_ref() else {
            return;
        };
        if !sprite.active {
            el.set_attribute("style", "display:none;").ok();
            return;
        }
        let mut transform = String::new();
        if sprite.rotation_deg != 0.0 {
            transform.push_str(&format!("rotate({}deg) ", sprite.rotation_deg));
        }
        if sprite.mirrored {
            transform.push_str("scaleX(-1) ");
        }
        let fade = if sprite.fading {
            "transition:opacity 0.4s ease-out; opacity:0;"
        } else {
            "opacity:1;"
        };
        let style = format!(
            "position:fixed; left:{x:.1}px; top:{y:.1}px; width:{w}px; height:{h}px; \
             background-image:url('{sheet}'); background-repeat:no-repeat; \
             background-position:-{cx}px -{cy}px; image-rendering:pixelated; \
             transform:{transform}; cursor:pointer; z-index:50; {fade}",
            x = sprite.x,
            y = sprite.y,
            w = sprite.w,
            h = sprite.h,
            sheet = self.atlas.sheet,
            cx = sprite.cell.0,
            cy = sprite.cell.1,
            transform = if transform.is_empty() { "none".into() } else { transform },
        );
        el.set_attribute("style", &style).ok();
    }

    fn make_element(id: CritterId) -> Option<Element> {
        let doc = window()?.document()?;
        let el = doc.create_element("div").ok()?;
        el.set_id(&format!("cr-sprite-{}", id.0));
        el.set_attribute("class", "cr-sprite").ok();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            CLICKS.with(|q| q.borrow_mut().push(id));
        }) as Box<dyn FnMut(_)>);
        el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .ok()?;
        closure.forget();
        doc.body()?.append_child(&el).ok()?;
        Some(el)
    }

    /// Remove every sprite element. Used on season teardown.
    pub fn clear(&mut self) {
        for sprite in &mut self.sprites {
            if let Some(el) = sprite.el.take() {
                el.remove();
            }
            sprite.active = false;
        }
    }
}

impl SpriteHost for DomSpriteHost {
    fn place(&mut self, id: CritterId, _kind: SubKind) -> Placement {
        let (vw, vh) = self.viewport();
        let w = self.atlas.cell_w;
        let h = self.atlas.cell_h;
        let mut rng = rand::thread_rng();
        // Enter from a random side, just off-screen, in a band above the
        // ground line; walk-in carries the sprite into view.
        let from_left = rng.r#gen::<bool>();
        let x = if from_left { -w } else { vw };
        let lo = vh * 0.35;
        let hi = (vh - h - 16.0).max(lo + 1.0);
        let y = rng.gen_range(lo..hi);

        while self.sprites.len() <= id.0 {
            let next = CritterId(self.sprites.len());
            self.sprites.push(Sprite {
                el: Self::make_element(next),
                x: 0.0,
                y: 0.0,
                w,
                h,
                dir: 1.0,
                entered: false,
                cell: (0.0, 0.0),
                rotation_deg: 0.0,
                mirrored: false,
                fading: false,
                active: false,
            });
        }
        let sprite = &mut self.sprites[id.0];
        sprite.x = x;
        sprite.y = y;
        sprite.w = w;
        sprite.h = h;
        sprite.dir = if from_left { 1.0 } else { -1.0 };
        sprite.entered = false;
        sprite.cell = (0.0, 0.0);
        sprite.rotation_deg = 0.0;
        sprite.mirrored = false;
        sprite.fading = false;
        sprite.active = true;
        self.sync(id);
        Placement {
            x,
            y,
            facing: if from_left {
                crate::engine::Facing::Right
            } else {
                crate::engine::Facing::Left
            },
        }
    }

    fn sprite_size(&self, id: CritterId) -> (f64, f64) {
        self.sprites
            .get(id.0)
            .map(|s| (s.w, s.h))
            .unwrap_or((self.atlas.cell_w, self.atlas.cell_h))
    }

    fn viewport_height(&self) -> f64 {
        self.viewport().1
    }

    fn apply_frame(&mut self, id: CritterId, cell_x: f64, cell_y: f64) {
        if let Some(sprite) = self.sprites.get_mut(id.0) {
            sprite.cell = (cell_x, cell_y);
        }
        self.sync(id);
    }

    fn apply_fall(&mut self, id: CritterId, sample: FallSample) {
        if let Some(sprite) = self.sprites.get_mut(id.0) {
            sprite.y = sample.y;
            sprite.rotation_deg = sample.rotation_deg;
            sprite.mirrored = sample.mirrored;
        }
        self.sync(id);
    }

    fn begin_fade(&mut self, id: CritterId) {
        if let Some(sprite) = self.sprites.get_mut(id.0) {
            sprite.fading = true;
        }
        self.sync(id);
    }

    fn recycle(&mut self, id: CritterId) {
        if let Some(sprite) = self.sprites.get_mut(id.0) {
            sprite.active = false;
        }
        self.sync(id);
    }
}

/// One walk-layer integration step, bounce included. Kept free of DOM state
/// so the entrance/bounce rules are testable on the host.
#[derive(Clone, Copy, Debug)]
struct WalkStep {
    x: f64,
    dir: f64,
    entered: bool,
}

fn step_walk(x: f64, dir: f64, speed: f64, dt_ms: f64, max_x: f64, entered: bool) -> WalkStep {
    let x = x + dir * speed * dt_ms / 1000.0;
    if !entered {
        // Still walking in from off-screen: drift freely, arm the bounce only
        // once the sprite is fully inside the viewport.
        return WalkStep {
            x,
            dir,
            entered: (0.0..=max_x).contains(&x),
        };
    }
    if x < 0.0 {
        WalkStep {
            x: 0.0,
            dir: 1.0,
            entered,
        }
    } else if x > max_x {
        WalkStep {
            x: max_x,
            dir: -1.0,
            entered,
        }
    } else {
        WalkStep { x, dir, entered }
    }
}

/// The minimal walk layer: live critters drift horizontally at their assigned
/// speed and bounce at the viewport edges once they have entered; every move
/// is reported back through the engine's movement callback, which then
/// re-asserts the frame.
pub fn drive_movement(host: &mut DomSpriteHost, pop: &mut Population, dt_ms: f64) {
    let (vw, _) = host.viewport();
    for idx in 0..host.sprites.len() {
        let id = CritterId(idx);
        if !host.sprites[idx].active {
            continue;
        }
        let Some(critter) = pop.critter(id) else {
            continue;
        };
        if !critter.is_live() {
            continue;
        }
        let speed = critter.speed();
        let sprite = &mut host.sprites[idx];
        let max_x = (vw - sprite.w).max(0.0);
        let step = step_walk(sprite.x, sprite.dir, speed, dt_ms, max_x, sprite.entered);
        sprite.x = step.x;
        sprite.dir = step.dir;
        sprite.entered = step.entered;
        let (x, y) = (sprite.x, sprite.y);
        pop.on_move(id, x, y, dt_ms, host);
    }
}

/// `localStorage` backend for [`crate::stats::StatsStore`]. Any storage
/// hiccup degrades to "no data".
pub struct LocalStorage;

impl KvStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        window()?
            .local_storage()
            .ok()
            .flatten()?
            .get_item(key)
            .ok()
            .flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let storage = window()
            .ok_or("no window")?
            .local_storage()
            .map_err(|_| "localStorage unavailable")?
            .ok_or("localStorage disabled")?;
        storage
            .set_item(key, value)
            .map_err(|_| "write rejected".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_X: f64 = 1280.0 - 48.0;

    #[test]
    fn entering_sprite_drifts_in_gradually_from_the_left() {
        // Placed fully off-screen at -w; each tick may move at most
        // speed * dt, never a sprite-width snap to the boundary.
        let (speed, dt) = (60.0, 16.0);
        let per_tick = speed * dt / 1000.0;
        let mut x = -48.0;
        let mut dir = 1.0;
        let mut entered = false;
        let mut ticks = 0;
        while !entered {
            let step = step_walk(x, dir, speed, dt, MAX_X, entered);
            assert!((step.x - x - per_tick).abs() < 1e-9, "snapped at tick {ticks}");
            assert_eq!(step.dir, 1.0);
            x = step.x;
            dir = step.dir;
            entered = step.entered;
            ticks += 1;
            assert!(ticks < 100, "never entered the viewport");
        }
        assert!(x >= 0.0 && x <= MAX_X);
        // 48px at 0.96px per tick, plus at most one tick of float slack.
        assert!((50..=51).contains(&ticks), "entered after {ticks} ticks");
    }

    #[test]
    fn entering_sprite_from_the_right_is_not_clamped_to_max_x() {
        let step = step_walk(1280.0, -1.0, 60.0, 16.0, MAX_X, false);
        assert!(step.x > MAX_X, "first tick clamped an entrance to the edge");
        assert_eq!(step.dir, -1.0);
        assert!(!step.entered);
    }

    #[test]
    fn bounce_applies_only_after_entry() {
        // Entered sprite overshooting the right edge bounces back.
        let step = step_walk(MAX_X - 0.5, 1.0, 120.0, 16.0, MAX_X, true);
        assert_eq!(step.x, MAX_X);
        assert_eq!(step.dir, -1.0);
        // And the left edge.
        let step = step_walk(0.3, -1.0, 120.0, 16.0, MAX_X, true);
        assert_eq!(step.x, 0.0);
        assert_eq!(step.dir, 1.0);
    }
}

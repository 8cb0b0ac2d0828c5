//! Critter Romp core crate.
//!
//! Seasonal on-screen critters that spawn, roam and can be whacked by click,
//! with persistent count/streak stats per season. One parametrized engine
//! (`engine::*`) serves both seasonal variants; this file is the wasm glue:
//! entry points, the thread-local season state and the single
//! requestAnimationFrame drive loop everything in the crate hangs off.

use wasm_bindgen::prelude::*;

pub mod display;
pub mod engine;
pub mod host;
pub mod stats;

use display::DisplayBinder;
use engine::{Population, SeasonProfile};
use host::{DomSpriteHost, LocalStorage};
use stats::StatsStore;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // Module re-init keeps the first logger; a failed install is harmless.
    let _ = log::set_logger(&CONSOLE_LOGGER).map(|()| log::set_max_level(log::LevelFilter::Info));
}

/// Routes the `log` facade to the browser console, so best-effort failure
/// warnings (storage writes, malformed records) actually land somewhere.
struct ConsoleLogger;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}", record.target(), record.args());
        match record.level() {
            log::Level::Error | log::Level::Warn => web_sys::console::warn_1(&line.into()),
            _ => web_sys::console::log_1(&line.into()),
        }
    }

    fn flush(&self) {}
}

/// Everything one running season owns. Dropped wholesale on season switch.
struct Season {
    population: Population,
    host: DomSpriteHost,
    stats: StatsStore<LocalStorage>,
    display: DisplayBinder,
    last_ts: Option<f64>,
}

thread_local! {
    static SEASON: std::cell::RefCell<Option<Season>> = const { std::cell::RefCell::new(None) };
    static LOOP_RUNNING: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

#[wasm_bindgen]
pub fn start_turkey_season() -> Result<(), JsValue> {
    start_season(SeasonProfile::turkey())
}

#[wasm_bindgen]
pub fn start_gingerbread_season() -> Result<(), JsValue> {
    start_season(SeasonProfile::gingerbread())
}

/// Idempotent teardown: stops spawning, removes sprites, keeps stats saved.
#[wasm_bindgen]
pub fn stop_season() {
    SEASON.with(|cell| {
        if let Some(mut season) = cell.borrow_mut().take() {
            season.population.stop();
            season.host.clear();
        }
    });
}

/// Global reset hook for an outside miss/timeout detector: the current streak
/// drops to zero, the best streak survives.
#[wasm_bindgen]
pub fn reset_streak() {
    SEASON.with(|cell| {
        if let Some(season) = cell.borrow_mut().as_mut() {
            season.stats.reset_streak();
            season.display.render(season.stats.record(), performance_now());
        }
    });
}

/// Explicit full wipe of the season's persisted stats. The only path that
/// lowers the primary count.
#[wasm_bindgen]
pub fn reset_stats() {
    SEASON.with(|cell| {
        if let Some(season) = cell.borrow_mut().as_mut() {
            season.stats.reset_all();
            season.display.render(season.stats.record(), performance_now());
        }
    });
}

fn start_season(profile: SeasonProfile) -> Result<(), JsValue> {
    let win = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let now = win
        .performance()
        .ok_or_else(|| JsValue::from_str("no performance clock"))?
        .now();

    // Swapping seasons tears the previous one down first.
    stop_season();

    let stats = StatsStore::load(profile.storage_key, LocalStorage);
    let host = DomSpriteHost::new(profile.atlas);
    let mut population = Population::new(profile);
    // Returning players resume their earned difficulty curve.
    population.set_score(stats.record().primary_count);
    population.start(now);

    let mut display = DisplayBinder::new();
    display.render(stats.record(), now);

    SEASON.with(|cell| {
        cell.replace(Some(Season {
            population,
            host,
            stats,
            display,
            last_ts: None,
        }))
    });
    ensure_frame_loop();
    Ok(())
}

/// One repaint tick: route queued clicks, run the walk layer, advance the
/// population (reconcile, spawns, falls, fades) and refresh the display sink.
fn frame(season: &mut Season, now: f64) {
    let dt_ms = match season.last_ts {
        // Tab-switch pauses produce huge gaps; clamp so critters do not warp.
        Some(prev) => (now - prev).clamp(0.0, 100.0),
        None => 16.0,
    };
    season.last_ts = Some(now);

    for id in host::take_clicks() {
        if season.population.eliminate(id, now, &mut season.host) {
            let stamp = String::from(js_sys::Date::new_0().to_iso_string());
            season.stats.record_hit(Some(&stamp));
            season.display.render(season.stats.record(), now);
        }
    }

    host::drive_movement(&mut season.host, &mut season.population, dt_ms);
    season.population.tick(now, &mut season.host);
    season.display.tick(now);
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn ensure_frame_loop() {
    use wasm_bindgen::JsCast;
    if LOOP_RUNNING.with(|f| f.replace(true)) {
        return;
    }
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        SEASON.with(|cell| {
            if let Some(season) = cell.borrow_mut().as_mut() {
                frame(season, ts);
            }
        });
        if let Some(w) = web_sys::window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = web_sys::window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

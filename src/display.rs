//! DOM sink for the counters. Reflects the stats record into fixed-id text
//! targets and flashes a transient pulse class on the ones that changed. Pure
//! side effects: missing targets are skipped per update and nothing in the
//! engine reads back from here.

use web_sys::window;

use crate::stats::StatsRecord;

pub const COUNT_TARGET: &str = "cr-count";
pub const STREAK_TARGET: &str = "cr-streak";
pub const BEST_TARGET: &str = "cr-best";

const BASE_CLASS: &str = "cr-stat";
const PULSE_CLASS: &str = "cr-stat cr-stat-pulse";
const PULSE_MS: f64 = 250.0;

pub struct DisplayBinder {
    last: Option<(u64, u64, u64)>,
    /// (element id, pulse-end timestamp) pairs; cleared from the tick.
    pulses: Vec<(&'static str, f64)>,
}

impl DisplayBinder {
    pub fn new() -> Self {
        Self {
            last: None,
            pulses: Vec::new(),
        }
    }

    /// Write all three counters; changed ones get the pulse class until the
    /// tick removes it again.
    pub fn render(&mut self, rec: &StatsRecord, now: f64) {
        let values = (rec.primary_count, rec.current_streak, rec.best_streak);
        let changed = |pick: fn((u64, u64, u64)) -> u64| {
            self.last.is_some_and(|prev| pick(prev) != pick(values))
        };
        let targets: [(&'static str, u64, bool); 3] = [
            (COUNT_TARGET, values.0, changed(|v| v.0)),
            (STREAK_TARGET, values.1, changed(|v| v.1)),
            (BEST_TARGET, values.2, changed(|v| v.2)),
        ];
        for (id, value, pulse) in targets {
            set_counter_text(id, value);
            if pulse {
                set_class(id, PULSE_CLASS);
                self.pulses.retain(|(pid, _)| *pid != id);
                self.pulses.push((id, now + PULSE_MS));
            }
        }
        self.last = Some(values);
    }

    /// Drop expired pulse classes. Driven from the repaint tick like every
    /// other delay in the crate.
    pub fn tick(&mut self, now: f64) {
        let mut i = 0;
        while i < self.pulses.len() {
            if now >= self.pulses[i].1 {
                let (id, _) = self.pulses.swap_remove(i);
                set_class(id, BASE_CLASS);
            } else {
                i += 1;
            }
        }
    }
}

impl Default for DisplayBinder {
    fn default() -> Self {
        Self::new()
    }
}

fn set_counter_text(id: &str, value: u64) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(&value.to_string()));
        }
    }
}

fn set_class(id: &str, class: &str) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_attribute("class", class).ok();
        }
    }
}

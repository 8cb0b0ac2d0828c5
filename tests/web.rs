// Browser-side smoke tests, run with `wasm-pack test --headless --firefox`.
// The native suites cover the engine and persistence logic; this only checks
// the wasm glue wiring that cannot run on the host.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn module_init_wires_console_logging_idempotently() {
    critter_romp::wasm_start();
    critter_romp::wasm_start(); // re-init keeps the first logger, no panic
    assert!(log::log_enabled!(log::Level::Warn));
    log::warn!("storage write rejected (smoke)"); // must reach the console sink without panicking
}

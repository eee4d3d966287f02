//! Browser-side checks of the JavaScript surface. Run with `wasm-pack test`.

#![cfg(target_arch = "wasm32")]

use force3d_layout::{ControlMessage, EdgeInput, ForceLayoutWasm, NodeInput, SimParams};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn post(engine: &mut ForceLayoutWasm, message: &ControlMessage) {
    let value = serde_wasm_bindgen::to_value(message).unwrap();
    engine.post_message(value).map_err(JsValue::from).unwrap();
}

#[wasm_bindgen_test]
fn test_post_message_and_pump() {
    let mut engine = ForceLayoutWasm::new();
    post(
        &mut engine,
        &ControlMessage::Init {
            nodes: vec![NodeInput::new("a"), NodeInput::new("b")],
            edges: vec![EdgeInput::new("a", "b")],
            params: Some(SimParams {
                seed: Some(3),
                ..SimParams::default()
            }),
        },
    );
    post(&mut engine, &ControlMessage::Start);
    assert!(engine.is_running());

    let tick = engine.pump(0.0).unwrap();
    assert_eq!(tick.positions().length(), 6);
    assert_eq!(tick.ids().length(), 2);
    assert_eq!(tick.ids().get(0).as_string().as_deref(), Some("a"));
    assert_eq!(tick.seq(), 0.0);
}

#[wasm_bindgen_test]
fn test_bad_message_throws() {
    let mut engine = ForceLayoutWasm::new();
    assert!(engine.post_message(JsValue::from_str("START")).is_err());
    assert!(engine.post_message(JsValue::NULL).is_err());
}

#[wasm_bindgen_test]
fn test_start_before_init_throws() {
    let mut engine = ForceLayoutWasm::new();
    let start = serde_wasm_bindgen::to_value(&ControlMessage::Start).unwrap();
    assert!(engine.post_message(start).is_err());
    assert!(!engine.is_running());
}

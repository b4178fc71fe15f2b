#![cfg(target_arch = "wasm32")]

//! 通过 JSON 边界驱动引擎的 wasm 端到端测试（wasm-pack test 运行）。

use memory_game::{GameEngine, GameState, ResolutionOutcome, RuleResolution};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn state_of(engine: &GameEngine) -> GameState {
    let json = engine.state_json().expect("state should serialize");
    serde_json::from_str(&json).expect("snapshot should parse back")
}

#[wasm_bindgen_test]
fn constructor_defaults_to_sample_state() {
    let engine = GameEngine::new(None).expect("constructor should succeed");
    let state = state_of(&engine);
    assert_eq!(state.tiles.len(), 8);
    assert_eq!(engine.attempts(), 0);
    assert_eq!(engine.matched_pairs(), 0);
    assert!(!engine.is_complete());
}

#[wasm_bindgen_test]
fn invalid_difficulty_is_rejected_at_the_boundary() {
    let mut engine = GameEngine::new(None).expect("constructor should succeed");
    assert!(engine.start_game("impossible").is_err());
}

#[wasm_bindgen_test]
fn click_and_resolve_round_trip_through_json() {
    let mut engine = GameEngine::new(None).expect("constructor should succeed");
    engine
        .start_game_seeded("easy", 11)
        .expect("start should succeed");

    let state = state_of(&engine);
    let pair: Vec<usize> = state
        .tiles
        .iter()
        .enumerate()
        .filter(|(_, tile)| tile.value == 1)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(pair.len(), 2, "value 1 should appear on exactly two tiles");

    engine.click_tile(pair[0]).expect("first click should succeed");
    let resolution_json = engine
        .click_tile(pair[1])
        .expect("second click should succeed");
    let resolution: RuleResolution =
        serde_json::from_str(&resolution_json).expect("resolution should parse");

    let task = resolution
        .pending
        .expect("second click should schedule a resolution");
    assert_eq!(task.outcome, ResolutionOutcome::Match);
    assert_eq!(engine.attempts(), 1);

    let task_json = serde_json::to_string(&task).expect("task should serialize");
    engine
        .resolve_pending(&task_json)
        .expect("resolution should apply");
    assert_eq!(engine.matched_pairs(), 1);
}

#[wasm_bindgen_test]
fn stale_task_does_not_touch_a_new_game() {
    let mut engine = GameEngine::new(None).expect("constructor should succeed");
    engine
        .start_game_seeded("easy", 3)
        .expect("start should succeed");

    let state = state_of(&engine);
    let first_value = state.tiles[0].value;
    // 找一张数值不同的牌凑出一次必然失败的比较。
    let other = state
        .tiles
        .iter()
        .position(|tile| tile.value != first_value)
        .expect("a differing value should exist");
    engine.click_tile(0).expect("first click should succeed");
    let resolution_json = engine.click_tile(other).expect("second click should succeed");
    let resolution: RuleResolution =
        serde_json::from_str(&resolution_json).expect("resolution should parse");
    let stale_task = resolution.pending.expect("a resolution should be pending");

    engine
        .start_game("normal")
        .expect("switching difficulty should succeed");
    let before = state_of(&engine);

    let task_json = serde_json::to_string(&stale_task).expect("task should serialize");
    engine
        .resolve_pending(&task_json)
        .expect("stale resolution should be discarded without error");
    let after = state_of(&engine);
    assert_eq!(before, after, "stale task must not mutate the new game");
}

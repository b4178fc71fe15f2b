pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    generate_board, generate_board_seeded, parse_difficulty, Difficulty, GameEvent, GameState,
    Generation, IntegrityError, ResolutionOutcome, ResolutionTask, RuleEngine, RuleError,
    RuleResolution, Tile, TileId, TileValue, MATCH_DELAY_MS, MISMATCH_DELAY_MS,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn make_resolution(state: GameState, events: Vec<GameEvent>) -> RuleResolution {
    RuleResolution::new(state, events)
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn resolution_from_events(state: &GameState, events: Vec<GameEvent>) -> RuleResolution {
    RuleResolution::new(state.clone(), events)
}

fn execute_with_engine<F>(state: &mut GameState, action: F) -> Result<Vec<GameEvent>, JsValue>
where
    F: FnOnce(&mut RuleEngine, &mut GameState) -> Result<Vec<GameEvent>, RuleError>,
{
    let mut engine = RuleEngine::new();
    action(&mut engine, state).map_err(to_js_error)
}

/// 渲染端持有的引擎句柄：状态归引擎独占，前端只拿序列化快照。
#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            GameState::sample()
        };
        Ok(GameEngine { state })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    /// 开始新的一局。难度来自自由输入（单选框取值、URL 参数），
    /// 未知取值返回 `InvalidDifficulty`。
    pub fn start_game(&mut self, difficulty: &str) -> Result<String, JsValue> {
        let difficulty = parse_difficulty(difficulty).map_err(to_js_error)?;
        let mut engine = RuleEngine::new();
        let events = engine.start_game(&mut self.state, difficulty);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    pub fn start_game_seeded(&mut self, difficulty: &str, seed: u64) -> Result<String, JsValue> {
        let difficulty = parse_difficulty(difficulty).map_err(to_js_error)?;
        let mut engine = RuleEngine::new();
        let events = engine.start_game_seeded(&mut self.state, difficulty, seed);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    pub fn click_tile(&mut self, index: usize) -> Result<String, JsValue> {
        let events = execute_with_engine(&mut self.state, |engine, state| {
            engine.click_tile(state, index)
        })?;
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 应用一个到期的结算任务。过期任务会被静默丢弃，只在控制台留一条日志。
    pub fn resolve_pending(&mut self, task_json: &str) -> Result<String, JsValue> {
        let task: ResolutionTask = serde_json::from_str(task_json).map_err(serde_to_js_error)?;
        if task.generation != self.state.generation {
            web_sys::console::log_1(&"memory_game: 丢弃过期的结算任务".into());
        }
        let mut engine = RuleEngine::new();
        let events = engine.resolve(&mut self.state, &task);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 返回一个 Promise：等待当前待结算任务的延时走完后给出任务 JSON，
    /// 没有待结算任务时直接给出 null。前端 await 之后调用 `resolve_pending`。
    pub fn wait_pending(&self) -> Promise {
        let pending = self.state.pending.clone();
        future_to_promise(async move {
            match pending {
                Some(task) => {
                    TimeoutFuture::new(task.delay_ms).await;
                    let json = serde_json::to_string(&task).map_err(serde_to_js_error)?;
                    Ok(JsValue::from_str(&json))
                }
                None => Ok(JsValue::NULL),
            }
        })
    }

    pub fn attempts(&self) -> u32 {
        self.state.attempts
    }

    pub fn matched_pairs(&self) -> u32 {
        self.state.matched_pairs
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}

/// 返回一个示例游戏状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

/// 将传入的游戏状态进行深拷贝后返回。
#[wasm_bindgen(js_name = "cloneGameState")]
pub fn clone_game_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

/// 按难度生成一副洗好的牌组；给定种子时结果可复现。
#[wasm_bindgen(js_name = "generateBoard")]
pub fn generate_board_js(difficulty: &str, seed: Option<u64>) -> Result<JsValue, JsValue> {
    let difficulty = parse_difficulty(difficulty).map_err(to_js_error)?;
    let tiles = match seed {
        Some(seed) => generate_board_seeded(difficulty, seed),
        None => generate_board(difficulty),
    };
    to_value(&tiles).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "startGame")]
pub fn start_game_js(state: JsValue, difficulty: &str) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let difficulty = parse_difficulty(difficulty).map_err(to_js_error)?;
    let mut engine = RuleEngine::new();
    let events = engine.start_game(&mut state, difficulty);
    to_value(&make_resolution(state, events)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "clickTile")]
pub fn click_tile_js(state: JsValue, index: usize) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.click_tile(&mut state, index) {
        Ok(events) => to_value(&make_resolution(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "resolvePending")]
pub fn resolve_pending_js(state: JsValue, task: JsValue) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let task: ResolutionTask = from_value(task).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    let events = engine.resolve(&mut state, &task);
    to_value(&make_resolution(state, events)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isComplete")]
pub fn is_complete_js(state: JsValue) -> Result<bool, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    Ok(RuleEngine::is_complete(&state))
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

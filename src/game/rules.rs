use serde::{Deserialize, Serialize};

use super::{
    board,
    state::{
        Difficulty, GameEvent, GameState, IntegrityError, ResolutionOutcome, ResolutionTask, Tile,
        SELECTION_LIMIT,
    },
};

/// 配对成功后翻面定格的延时（毫秒）。
pub const MATCH_DELAY_MS: u32 = 600;
/// 配对失败后盖回的延时（毫秒）。
pub const MISMATCH_DELAY_MS: u32 = 900;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    InvalidDifficulty {
        value: String,
    },
    IndexOutOfRange {
        index: usize,
        tile_count: usize,
    },
    IntegrityViolation {
        error: IntegrityError,
    },
}

/// 一次操作后的完整回执：新状态、本次产生的事件、待结算任务与完成标记。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<ResolutionTask>,
    pub complete: bool,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let pending = state.pending.clone();
        let complete = state.is_complete();
        Self {
            state,
            events,
            pending,
            complete,
        }
    }
}

/// Validates a free-form difficulty string coming from the host boundary
/// (radio value, URL parameter).
pub fn parse_difficulty(value: &str) -> Result<Difficulty, RuleError> {
    value
        .parse::<Difficulty>()
        .map_err(|_| RuleError::InvalidDifficulty {
            value: value.to_string(),
        })
}

#[derive(Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn replace_state(state: &mut GameState, difficulty: Difficulty, tiles: Vec<Tile>) -> GameEvent {
        // 代次跨对局递增；上一局未触发的结算任务因代次不符而失效。
        let generation = state.generation.wrapping_add(1);
        *state = GameState::new(difficulty, tiles);
        state.generation = generation;
        let event = GameEvent::GameStarted { difficulty };
        state.record_event(event.clone());
        event
    }

    /// 整体替换状态开始新的一局。
    pub fn start_game(&mut self, state: &mut GameState, difficulty: Difficulty) -> Vec<GameEvent> {
        let event = Self::replace_state(state, difficulty, board::generate_board(difficulty));
        vec![event]
    }

    /// 同 `start_game`，但用固定种子洗牌。
    pub fn start_game_seeded(
        &mut self,
        state: &mut GameState,
        difficulty: Difficulty,
        seed: u64,
    ) -> Vec<GameEvent> {
        let event = Self::replace_state(
            state,
            difficulty,
            board::generate_board_seeded(difficulty, seed),
        );
        vec![event]
    }

    /// 用调用方提供的牌组开局；牌组必须通过完整性检查。
    pub fn start_game_with_tiles(
        &mut self,
        state: &mut GameState,
        difficulty: Difficulty,
        tiles: Vec<Tile>,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let candidate = GameState::new(difficulty, tiles);
        Self::ensure_integrity(&candidate)?;
        let event = Self::replace_state(state, difficulty, candidate.tiles);
        Ok(vec![event])
    }

    /// Handles a tile-click intent.
    ///
    /// Misclicks are defined behavior, not errors: clicking a flipped or
    /// matched tile, or clicking while two tiles already await resolution,
    /// returns `Ok` with no events and mutates nothing. An out-of-range
    /// index signals a renderer bug and fails fast.
    pub fn click_tile(
        &mut self,
        state: &mut GameState,
        index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;

        let tile_count = state.tiles.len();
        if index >= tile_count {
            return Err(RuleError::IndexOutOfRange { index, tile_count });
        }
        if state.selection_full() {
            return Ok(Vec::new());
        }
        if !state.tiles[index].is_selectable() {
            return Ok(Vec::new());
        }

        state.tiles[index].flipped = true;
        state.selection.push(index);

        let mut events = Vec::new();
        let flip_event = GameEvent::TileFlipped {
            index,
            tile_id: state.tiles[index].id,
        };
        state.record_event(flip_event.clone());
        events.push(flip_event);

        if state.selection.len() == SELECTION_LIMIT {
            // attempts 统计的是比较次数，与是否配对成功无关。
            state.attempts += 1;
            let first = state.selection[0];
            let second = state.selection[1];
            let outcome = if state.tiles[first].value == state.tiles[second].value {
                ResolutionOutcome::Match
            } else {
                ResolutionOutcome::Mismatch
            };
            let delay_ms = match outcome {
                ResolutionOutcome::Match => MATCH_DELAY_MS,
                ResolutionOutcome::Mismatch => MISMATCH_DELAY_MS,
            };
            state.pending = Some(ResolutionTask {
                generation: state.generation,
                first,
                second,
                outcome,
                delay_ms,
            });

            let pair_event = GameEvent::PairSelected {
                first,
                second,
                attempts: state.attempts,
            };
            state.record_event(pair_event.clone());
            events.push(pair_event);
        }

        Ok(events)
    }

    /// Applies a fired resolution task. Staleness is defined behavior, not
    /// an error: a task whose generation no longer matches the state, or
    /// that differs from the stored pending task (already resolved,
    /// duplicate fire), is discarded without mutation.
    pub fn resolve(&mut self, state: &mut GameState, task: &ResolutionTask) -> Vec<GameEvent> {
        if task.generation != state.generation {
            return Vec::new();
        }
        let pending = match state.pending.take() {
            Some(pending) if pending == *task => pending,
            other => {
                state.pending = other;
                return Vec::new();
            }
        };
        if pending.first >= state.tiles.len() || pending.second >= state.tiles.len() {
            return Vec::new();
        }

        let mut events = Vec::new();
        match pending.outcome {
            ResolutionOutcome::Match => {
                let value = state.tiles[pending.first].value;
                state.tiles[pending.first].matched = true;
                state.tiles[pending.second].matched = true;
                state.matched_pairs += 1;
                let event = GameEvent::PairMatched {
                    first: pending.first,
                    second: pending.second,
                    value,
                };
                state.record_event(event.clone());
                events.push(event);

                if state.is_complete() {
                    let done = GameEvent::GameCompleted {
                        attempts: state.attempts,
                    };
                    state.record_event(done.clone());
                    events.push(done);
                }
            }
            ResolutionOutcome::Mismatch => {
                state.tiles[pending.first].flipped = false;
                state.tiles[pending.second].flipped = false;
                let event = GameEvent::PairMismatched {
                    first: pending.first,
                    second: pending.second,
                };
                state.record_event(event.clone());
                events.push(event);
            }
        }
        state.selection.clear();

        events
    }

    pub fn is_complete(state: &GameState) -> bool {
        state.is_complete()
    }
}

//! 翻牌配对游戏的核心逻辑模块（棋盘生成、状态模型、规则引擎）。

pub mod board;
pub mod rules;
pub mod state;

pub use board::{generate_board, generate_board_seeded, generate_board_with};
pub use rules::{
    parse_difficulty,
    RuleEngine,
    RuleError,
    RuleResolution,
    MATCH_DELAY_MS,
    MISMATCH_DELAY_MS,
};
pub use state::{
    Difficulty,
    GameEvent,
    GameState,
    Generation,
    IntegrityError,
    ResolutionOutcome,
    ResolutionTask,
    Tile,
    TileId,
    TileValue,
};

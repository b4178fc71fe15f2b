use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::board;

/// 牌面标识（渲染 key，洗牌后按顺序分配）。
pub type TileId = u32;
/// 牌面数值，每个数值在一局中恰好出现两次。
pub type TileValue = u8;
/// 对局代次，用于识别过期的延时结算。
pub type Generation = u64;

/// 同一时刻最多翻开且未配对的牌数。
pub const SELECTION_LIMIT: usize = 2;

const SAMPLE_SEED: u64 = 0x6d656d;

/// 难度等级，决定一局的配对数与牌数。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl Difficulty {
    pub fn pair_count(self) -> usize {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Normal => 8,
            Difficulty::Hard => 16,
        }
    }

    pub fn tile_count(self) -> usize {
        self.pair_count() * 2
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 单张牌的状态：facedown → flipped → (matched | facedown)，matched 为终态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub value: TileValue,
    #[serde(default)]
    pub flipped: bool,
    #[serde(default)]
    pub matched: bool,
}

impl Tile {
    pub fn face_down(id: TileId, value: TileValue) -> Self {
        Self {
            id,
            value,
            flipped: false,
            matched: false,
        }
    }

    pub fn is_selectable(&self) -> bool {
        !self.flipped && !self.matched
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionOutcome {
    Match,
    Mismatch,
}

/// 延时结算任务。任务携带它所属对局的代次，结算前必须核对代次，
/// 代次不符的任务视为过期并被丢弃。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolutionTask {
    pub generation: Generation,
    pub first: usize,
    pub second: usize,
    pub outcome: ResolutionOutcome,
    pub delay_ms: u32,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted {
        difficulty: Difficulty,
    },
    TileFlipped {
        index: usize,
        tile_id: TileId,
    },
    PairSelected {
        first: usize,
        second: usize,
        attempts: u32,
    },
    PairMatched {
        first: usize,
        second: usize,
        value: TileValue,
    },
    PairMismatched {
        first: usize,
        second: usize,
    },
    GameCompleted {
        attempts: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    WrongTileCount {
        expected: usize,
        actual: usize,
    },
    DuplicateTileId {
        tile_id: TileId,
    },
    TileIdOutOfRange {
        tile_id: TileId,
        tile_count: usize,
    },
    ValueOutOfRange {
        tile_id: TileId,
        value: TileValue,
    },
    ValueMultiplicity {
        value: TileValue,
        count: usize,
    },
    MatchedFaceDown {
        tile_id: TileId,
    },
    TooManyFlipped {
        count: usize,
    },
    SelectionOverflow {
        len: usize,
    },
    SelectionOutOfRange {
        index: usize,
    },
    SelectionStale {
        index: usize,
    },
    MatchedCountMismatch {
        matched_tiles: usize,
        matched_pairs: u32,
    },
    PendingWithoutSelection,
}

/// 游戏整体状态。由规则引擎独占持有并修改，渲染端只读取序列化快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<usize>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub matched_pairs: u32,
    #[serde(default)]
    pub generation: Generation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<ResolutionTask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameState {
    pub fn new(difficulty: Difficulty, tiles: Vec<Tile>) -> Self {
        Self {
            difficulty,
            tiles,
            selection: Vec::new(),
            attempts: 0,
            matched_pairs: 0,
            generation: 0,
            pending: None,
            event_log: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn pair_count(&self) -> usize {
        self.difficulty.pair_count()
    }

    pub fn tile_count(&self) -> usize {
        self.difficulty.tile_count()
    }

    pub fn selection_full(&self) -> bool {
        self.selection.len() >= SELECTION_LIMIT
    }

    pub fn is_complete(&self) -> bool {
        self.matched_pairs as usize == self.pair_count()
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let expected = self.tile_count();
        if self.tiles.len() != expected {
            return Err(IntegrityError::WrongTileCount {
                expected,
                actual: self.tiles.len(),
            });
        }

        let pair_count = self.pair_count();
        let mut seen = HashSet::new();
        let mut value_counts = vec![0usize; pair_count];
        let mut flipped_unmatched = 0usize;
        let mut matched_tiles = 0usize;

        for tile in &self.tiles {
            if tile.id as usize >= expected {
                return Err(IntegrityError::TileIdOutOfRange {
                    tile_id: tile.id,
                    tile_count: expected,
                });
            }
            if !seen.insert(tile.id) {
                return Err(IntegrityError::DuplicateTileId { tile_id: tile.id });
            }
            if tile.value == 0 || tile.value as usize > pair_count {
                return Err(IntegrityError::ValueOutOfRange {
                    tile_id: tile.id,
                    value: tile.value,
                });
            }
            value_counts[tile.value as usize - 1] += 1;
            if tile.matched && !tile.flipped {
                return Err(IntegrityError::MatchedFaceDown { tile_id: tile.id });
            }
            if tile.flipped && !tile.matched {
                flipped_unmatched += 1;
            }
            if tile.matched {
                matched_tiles += 1;
            }
        }

        for (offset, count) in value_counts.iter().enumerate() {
            if *count != 2 {
                return Err(IntegrityError::ValueMultiplicity {
                    value: (offset + 1) as TileValue,
                    count: *count,
                });
            }
        }

        if flipped_unmatched > SELECTION_LIMIT {
            return Err(IntegrityError::TooManyFlipped {
                count: flipped_unmatched,
            });
        }

        if self.selection.len() > SELECTION_LIMIT {
            return Err(IntegrityError::SelectionOverflow {
                len: self.selection.len(),
            });
        }
        for &index in &self.selection {
            match self.tiles.get(index) {
                None => return Err(IntegrityError::SelectionOutOfRange { index }),
                Some(tile) if !tile.flipped || tile.matched => {
                    return Err(IntegrityError::SelectionStale { index });
                }
                Some(_) => {}
            }
        }

        if matched_tiles != self.matched_pairs as usize * 2 {
            return Err(IntegrityError::MatchedCountMismatch {
                matched_tiles,
                matched_pairs: self.matched_pairs,
            });
        }

        if self.pending.is_some() && self.selection.len() != SELECTION_LIMIT {
            return Err(IntegrityError::PendingWithoutSelection);
        }

        Ok(())
    }

    /// 返回一个固定种子的示例对局，方便前端调试或初始化。
    pub fn sample() -> Self {
        let difficulty = Difficulty::Easy;
        let mut state =
            GameState::new(difficulty, board::generate_board_seeded(difficulty, SAMPLE_SEED));
        state.record_event(GameEvent::GameStarted { difficulty });
        state
    }
}

impl Default for GameState {
    fn default() -> Self {
        let difficulty = Difficulty::default();
        GameState::new(difficulty, board::generate_board(difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_maps_to_pair_and_tile_counts() {
        assert_eq!(Difficulty::Easy.pair_count(), 4);
        assert_eq!(Difficulty::Normal.pair_count(), 8);
        assert_eq!(Difficulty::Hard.pair_count(), 16);
        assert_eq!(Difficulty::Easy.tile_count(), 8);
        assert_eq!(Difficulty::Normal.tile_count(), 16);
        assert_eq!(Difficulty::Hard.tile_count(), 32);
    }

    #[test]
    fn difficulty_parses_from_free_form_input() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("Normal".parse::<Difficulty>(), Ok(Difficulty::Normal));
        assert_eq!("medium".parse::<Difficulty>(), Ok(Difficulty::Normal));
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
        assert!("".parse::<Difficulty>().is_err());
    }

    #[test]
    fn sample_state_passes_integrity_check() {
        let state = GameState::sample();
        state
            .integrity_check()
            .expect("sample state should be structurally sound");
        assert_eq!(state.tiles.len(), 8);
        assert_eq!(state.attempts, 0);
        assert_eq!(state.matched_pairs, 0);
    }

    #[test]
    fn integrity_check_rejects_tampered_value() {
        let mut state = GameState::sample();
        state.tiles[0].value = 9;
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn integrity_check_rejects_matched_face_down_tile() {
        let mut state = GameState::sample();
        state.tiles[3].matched = true;
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::MatchedFaceDown { .. })
        ));
    }

    #[test]
    fn integrity_check_rejects_selection_overflow() {
        let mut state = GameState::sample();
        for index in 0..3 {
            state.tiles[index].flipped = true;
            state.selection.push(index);
        }
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::TooManyFlipped { .. })
                | Err(IntegrityError::SelectionOverflow { .. })
        ));
    }

    #[test]
    fn integrity_check_rejects_stale_selection_entry() {
        let mut state = GameState::sample();
        state.selection.push(0);
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::SelectionStale { index: 0 })
        ));
    }
}

//! 棋盘生成：构造数值成对的牌组并做无偏洗牌。

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::state::{Difficulty, Tile, TileId, TileValue};

/// 用系统熵源生成一局新牌组。
pub fn generate_board(difficulty: Difficulty) -> Vec<Tile> {
    let mut rng = SmallRng::from_entropy();
    generate_board_with(difficulty, &mut rng)
}

/// 用固定种子生成牌组，同一种子总是得到同一排列。
pub fn generate_board_seeded(difficulty: Difficulty, seed: u64) -> Vec<Tile> {
    let mut rng = SmallRng::seed_from_u64(seed);
    generate_board_with(difficulty, &mut rng)
}

/// Builds the value multiset (each value 1..=pair_count exactly twice),
/// applies a Fisher–Yates shuffle, then assigns ids 0.. in post-shuffle
/// order with every tile face-down.
pub fn generate_board_with<R: Rng>(difficulty: Difficulty, rng: &mut R) -> Vec<Tile> {
    let pair_count = difficulty.pair_count();
    let mut values: Vec<TileValue> = Vec::with_capacity(pair_count * 2);
    for value in 1..=pair_count as TileValue {
        values.push(value);
        values.push(value);
    }
    values.shuffle(rng);
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| Tile::face_down(index as TileId, value))
        .collect()
}

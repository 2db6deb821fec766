//! Random source for tie-breaking decisions
//!
//! The turn policy draws through the [`RandomSource`] trait so runs can be
//! reproduced from a seed, or scripted outright in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Direction;

/// Source of uniform draws in [0, 1)
pub trait RandomSource: Send {
    fn uniform(&mut self) -> f32;

    /// Returns true with given probability
    #[inline]
    fn chance(&mut self, probability: f32) -> bool {
        self.uniform() < probability
    }

    /// Left or Right with equal odds
    fn either_turn(&mut self) -> Direction {
        if self.chance(0.5) {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    /// `favored` with 2:1 odds over its opposite
    fn favor_turn(&mut self, favored: Direction) -> Direction {
        if self.chance(2.0 / 3.0) {
            favored
        } else {
            favored.opposite()
        }
    }
}

/// Seedable generator backed by `StdRng`
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a new generator
    ///
    /// If seed is 0, uses OS entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            StdRng::from_os_rng()
        } else {
            StdRng::seed_from_u64(seed)
        };
        Self { rng }
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn uniform(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f32>,
    index: usize,
}

impl ScriptedRandom {
    pub fn new(draws: Vec<f32>) -> Self {
        Self { draws, index: 0 }
    }

    /// Every draw returns `value`
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self) -> f32 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.index % self.draws.len()];
        self.index += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);

        for _ in 0..100 {
            assert_eq!(a.uniform(), b.uniform());
        }
    }

    #[test]
    fn test_uniform_range() {
        let mut random = SeededRandom::new(7);
        for _ in 0..1000 {
            let u = random.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_favor_turn_ratio() {
        let mut random = SeededRandom::new(42);
        let trials = 10000;
        let favored = (0..trials)
            .filter(|_| random.favor_turn(Direction::Right) == Direction::Right)
            .count();

        let ratio = favored as f32 / trials as f32;
        assert!((ratio - 2.0 / 3.0).abs() < 0.05); // Within 5% of expected
    }

    #[test]
    fn test_either_turn_is_balanced() {
        let mut random = SeededRandom::new(3);
        let trials = 10000;
        let lefts = (0..trials)
            .filter(|_| random.either_turn() == Direction::Left)
            .count();

        let ratio = lefts as f32 / trials as f32;
        assert!((ratio - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_scripted_cycles() {
        let mut random = ScriptedRandom::new(vec![0.1, 0.9]);
        assert_eq!(random.uniform(), 0.1);
        assert_eq!(random.uniform(), 0.9);
        assert_eq!(random.uniform(), 0.1);
        assert_eq!(random.either_turn(), Direction::Right);
    }
}

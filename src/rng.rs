// src/rng.rs
//! Детерминированный источник случайности.
//!
//! Каждая единица генерации (континент или регион) владеет собственным
//! `RandomStream`, выведенным из глобального сида и координаты единицы.
//! Глобальный ГСЧ процесса не используется и не пересеивается — это
//! позволяет генерировать независимые регионы параллельно без общего
//! изменяемого состояния.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::coords::Coordinate;

// Константы подмешивания координат в сид. Нечётные множители дают разным
// единицам непересекающиеся потоки даже при соседних координатах.
const UNIT_MIX_X: u64 = 0x9E37_79B9_7F4A_7C15;
const UNIT_MIX_Y: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Сидированный поток случайных чисел одной единицы генерации
#[derive(Debug, Clone)]
pub struct RandomStream {
    inner: ChaCha8Rng,
}

impl RandomStream {
    /// Поток уровня континента
    #[must_use]
    pub fn for_continent(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Поток региона: глобальный сид + координата региона
    #[must_use]
    pub fn for_unit(seed: u64, unit: Coordinate) -> Self {
        let mixed = seed
            ^ (unit.x as i64 as u64).wrapping_mul(UNIT_MIX_X)
            ^ (unit.y as i64 as u64).wrapping_mul(UNIT_MIX_Y);
        Self {
            inner: ChaCha8Rng::seed_from_u64(mixed),
        }
    }

    /// Сид для очередного шумового слоя. Порядок вызовов фиксирован.
    pub fn noise_seed(&mut self) -> i32 {
        self.inner.next_u32() as i32
    }

    /// Бросок с вероятностью успеха `probability` (0.0 — никогда, 1.0 — всегда)
    pub fn chance(&mut self, probability: f32) -> bool {
        self.inner.gen_range(0.0..1.0f32) < probability
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_unit_same_sequence() {
        let mut a = RandomStream::for_unit(42, Coordinate::new(3, -7));
        let mut b = RandomStream::for_unit(42, Coordinate::new(3, -7));
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_neighboring_units_diverge() {
        let mut a = RandomStream::for_unit(42, Coordinate::new(0, 0));
        let mut b = RandomStream::for_unit(42, Coordinate::new(1, 0));
        let left: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let right: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = RandomStream::for_continent(1);
        for _ in 0..64 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }
}

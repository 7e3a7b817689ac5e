// src/coords.rs
//! Координатная сетка и рост контура континента.
//!
//! Континент — это связное множество целочисленных координат регионов,
//! выращенное случайным блужданием по фронтиру от стартовой точки (0, 0).

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::rng::RandomStream;

/// Ортогональные смещения: порядок фиксирован для детерминизма
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Минимальное число регионов континента
pub const MIN_CONTINENT_REGIONS: usize = 10;
/// Максимальное число регионов континента
pub const MAX_CONTINENT_REGIONS: usize = 200;

/// Целочисленная координата на неограниченной сетке
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Четыре ортогональных соседа
    #[must_use]
    pub fn neighbors(self) -> [Coordinate; 4] {
        DIRECTIONS.map(|(dx, dy)| Coordinate::new(self.x + dx, self.y + dy))
    }

    /// Манхэттенское расстояние
    #[must_use]
    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Выращивает связное множество координат регионов континента.
///
/// Алгоритм: от (0, 0) поддерживается фронтир — список уже размещённых
/// координат, у которых могут оставаться свободные соседи. На каждом шаге
/// берётся случайная координата фронтира, её смещения перемешиваются и
/// первая незанятая клетка добавляется к контуру. Координата без свободных
/// соседей выбывает из фронтира.
///
/// `target_count` вне `[min_count, max_count]` не считается ошибкой:
/// вместо него берётся равномерно случайное значение из диапазона.
/// Исчерпание фронтира тоже не ошибка — возвращается то, что выросло.
pub fn generate_continent_coordinates(
    rng: &mut RandomStream,
    target_count: usize,
    min_count: usize,
    max_count: usize,
) -> Vec<Coordinate> {
    let target = if (min_count..=max_count).contains(&target_count) {
        target_count
    } else {
        rng.gen_range(min_count..=max_count)
    };

    let start = Coordinate::new(0, 0);
    let mut placed = vec![start];
    let mut seen: HashSet<Coordinate> = HashSet::from([start]);
    let mut frontier = vec![start];

    while placed.len() < target && !frontier.is_empty() {
        let pick = rng.gen_range(0..frontier.len());
        let base = frontier[pick];

        let mut offsets = DIRECTIONS;
        offsets.shuffle(rng);

        let mut grown = false;
        for (dx, dy) in offsets {
            let candidate = Coordinate::new(base.x + dx, base.y + dy);
            if seen.insert(candidate) {
                placed.push(candidate);
                frontier.push(candidate);
                grown = true;
                break;
            }
        }

        if !grown {
            // Все соседи заняты — координата больше не участвует в росте
            frontier.swap_remove(pick);
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedValue;

    fn text_seed(text: &str) -> u64 {
        SeedValue::Text(text.to_string()).canonical()
    }

    #[test]
    fn test_exact_count_and_origin() {
        let mut rng = RandomStream::for_continent(text_seed("abc"));
        let coords = generate_continent_coordinates(&mut rng, 60, 10, 200);
        assert_eq!(coords.len(), 60);
        assert_eq!(coords[0], Coordinate::new(0, 0));

        let unique: HashSet<Coordinate> = coords.iter().copied().collect();
        assert_eq!(unique.len(), 60);
    }

    #[test]
    fn test_contiguity() {
        let mut rng = RandomStream::for_continent(text_seed("abc"));
        let coords = generate_continent_coordinates(&mut rng, 60, 10, 200);
        let set: HashSet<Coordinate> = coords.iter().copied().collect();

        let isolated = coords
            .iter()
            .filter(|c| !c.neighbors().iter().any(|n| set.contains(n)))
            .count();
        assert_eq!(isolated, 0);
    }

    #[test]
    fn test_deterministic_order() {
        let mut a = RandomStream::for_continent(text_seed("abc"));
        let mut b = RandomStream::for_continent(text_seed("abc"));
        let first = generate_continent_coordinates(&mut a, 60, 10, 200);
        let second = generate_continent_coordinates(&mut b, 60, 10, 200);
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_target_is_clamped_by_draw() {
        let mut rng = RandomStream::for_continent(7);
        let coords = generate_continent_coordinates(&mut rng, 100_000, 10, 200);
        assert!((10..=200).contains(&coords.len()));
    }

    #[test]
    fn test_manhattan() {
        let a = Coordinate::new(-2, 3);
        let b = Coordinate::new(1, -1);
        assert_eq!(a.manhattan(b), 7);
    }
}

// src/hydrology.rs
//! Гидрология региона: береговая линия, пляжи и реки.
//!
//! Реки растут от возвышенных истоков вниз по склону. Фактор меандра
//! изредка разрешает локальный шаг вверх, ограниченный `MEANDER_MAX_RISE`;
//! в остальном высота вдоль пути не возрастает. Путь фиксируется, только
//! если он дотянулся до воды или края региона и не короче минимальной
//! длины — всё остальное молча отбрасывается.

use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::biome::{Biome, BiomeMap};
use crate::config::HydrologySettings;
use crate::coords::DIRECTIONS;
use crate::elevation::ElevationMap;
use crate::rng::RandomStream;

/// Максимальный разрешённый меандром подъём за один шаг
pub const MEANDER_MAX_RISE: f32 = 0.05;

/// Биомы, по которым не прокладывают пляжи
const BEACH_EXCLUDED: [Biome; 3] = [Biome::Mountain, Biome::Hills, Biome::Swamp];

/// Путь реки: индексы клеток от истока к устью
#[derive(Debug, Clone)]
pub struct RiverPath {
    pub cells: Vec<usize>,
}

enum WalkEnd {
    Water,
    Edge,
    Abandoned,
}

/// Клетка береговой линии: сосед противоположного класса вода/суша
#[must_use]
pub fn is_coastline(map: &BiomeMap, x: u32, y: u32) -> bool {
    let own = map.get(x, y).is_water();
    DIRECTIONS.iter().any(|&(dx, dy)| {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        nx >= 0
            && ny >= 0
            && nx < map.width as i32
            && ny < map.height as i32
            && map.get(nx as u32, ny as u32).is_water() != own
    })
}

/// Сглаживает береговую линию: клетка в меньшинстве среди своих соседей
/// с шансом переходит в их класс. Высота подправляется через уровень моря,
/// чтобы карта высот не противоречила карте биомов.
pub fn smooth_coastline(
    biomes: &mut BiomeMap,
    elevation: &mut ElevationMap,
    rng: &mut RandomStream,
    settings: &HydrologySettings,
    sea_level: f32,
) {
    for _ in 0..settings.coast_smooth_iterations {
        for y in 0..biomes.height {
            for x in 0..biomes.width {
                let own_water = biomes.get(x, y).is_water();
                let mut neighbors = 0;
                let mut opposite = 0;
                for (dx, dy) in DIRECTIONS {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= biomes.width as i32 || ny >= biomes.height as i32
                    {
                        continue;
                    }
                    neighbors += 1;
                    if biomes.get(nx as u32, ny as u32).is_water() != own_water {
                        opposite += 1;
                    }
                }

                if opposite * 2 > neighbors && rng.chance(settings.coast_flip_chance) {
                    if own_water {
                        biomes.set(x, y, Biome::Plains);
                        elevation.set(x, y, (sea_level + 0.02).min(1.0));
                    } else {
                        biomes.set(x, y, Biome::Ocean);
                        elevation.set(x, y, (sea_level - 0.02).max(0.0));
                    }
                }
            }
        }
    }
}

/// Прокладывает пляжную полосу: сухопутные клетки на расстоянии не более
/// `beach_width` шагов от воды. Пляжи возникают только вдоль настоящей
/// границы вода/суша.
pub fn place_beaches(biomes: &mut BiomeMap, beach_width: u32) {
    if beach_width == 0 {
        return;
    }

    let width = biomes.width as usize;
    let height = biomes.height as usize;
    let mut distance = vec![u32::MAX; width * height];
    let mut queue = VecDeque::new();

    // BFS от всех водных клеток по суше
    for (idx, biome) in biomes.data.iter().enumerate() {
        if biome.is_water() {
            distance[idx] = 0;
            queue.push_back(idx);
        }
    }

    while let Some(idx) = queue.pop_front() {
        if distance[idx] >= beach_width {
            continue;
        }
        let x = (idx % width) as i32;
        let y = (idx / width) as i32;
        for (dx, dy) in DIRECTIONS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let nidx = (ny as usize) * width + nx as usize;
            if distance[nidx] == u32::MAX && !biomes.data[nidx].is_water() {
                distance[nidx] = distance[idx] + 1;
                queue.push_back(nidx);
            }
        }
    }

    for (idx, dist) in distance.iter().enumerate() {
        if (1..=beach_width).contains(dist) && !BEACH_EXCLUDED.contains(&biomes.data[idx]) {
            biomes.data[idx] = Biome::Beach;
        }
    }
}

/// Выращивает реки региона и фиксирует их на карте биомов.
/// Возвращает пути от истока к устью.
pub fn generate_rivers(
    biomes: &mut BiomeMap,
    elevation: &ElevationMap,
    rng: &mut RandomStream,
    settings: &HydrologySettings,
) -> Vec<RiverPath> {
    let mut sources: Vec<usize> = biomes
        .data
        .iter()
        .enumerate()
        .filter(|&(idx, biome)| {
            biome.is_high_elevation() && elevation.data[idx] >= settings.source_min_elevation
        })
        .map(|(idx, _)| idx)
        .collect();
    sources.shuffle(rng);

    let mut rivers: Vec<RiverPath> = Vec::new();
    for &source in &sources {
        if rivers.len() >= settings.max_rivers_per_region {
            break;
        }
        // Исток мог уже стать руслом предыдущей реки
        if biomes.data[source].is_water() {
            continue;
        }
        if let Some(path) = walk_river(biomes, elevation, rng, settings, source) {
            for &idx in &path.cells {
                if !biomes.data[idx].is_water() {
                    biomes.data[idx] = Biome::River;
                }
            }
            rivers.push(path);
        }
    }
    rivers
}

fn walk_river(
    biomes: &BiomeMap,
    elevation: &ElevationMap,
    rng: &mut RandomStream,
    settings: &HydrologySettings,
    source: usize,
) -> Option<RiverPath> {
    let width = biomes.width as usize;
    let height = biomes.height as usize;

    let mut path = vec![source];
    let mut visited: HashSet<usize> = HashSet::from([source]);
    let mut end = WalkEnd::Abandoned;

    loop {
        let current = *path.last().expect("path is never empty");
        let x = (current % width) as i32;
        let y = (current / width) as i32;

        // Сосед-вода: устье. Водную клетку дописываем как финальную.
        let mut mouth: Option<(usize, f32)> = None;
        for (dx, dy) in DIRECTIONS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let nidx = (ny as usize) * width + nx as usize;
            if biomes.data[nidx].is_water() && !visited.contains(&nidx) {
                let h = elevation.data[nidx];
                if mouth.is_none_or(|(_, best)| h < best) {
                    mouth = Some((nidx, h));
                }
            }
        }
        if let Some((mouth_idx, _)) = mouth {
            path.push(mouth_idx);
            end = WalkEnd::Water;
            break;
        }

        // Край региона — тоже законное окончание
        if path.len() > 1
            && (x == 0 || y == 0 || x == width as i32 - 1 || y == height as i32 - 1)
        {
            end = WalkEnd::Edge;
            break;
        }

        if path.len() >= settings.max_river_length {
            break;
        }

        let current_h = elevation.data[current];
        let mut candidates: Vec<(usize, f32)> = Vec::with_capacity(4);
        for (dx, dy) in DIRECTIONS {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }
            let nidx = (ny as usize) * width + nx as usize;
            if !visited.contains(&nidx) {
                candidates.push((nidx, elevation.data[nidx]));
            }
        }

        let meander_roll = rng.chance(settings.meander);
        let next = if meander_roll {
            // Меандр: любой сосед не выше текущего более чем на допуск
            let allowed: Vec<usize> = candidates
                .iter()
                .filter(|&&(_, h)| h <= current_h + MEANDER_MAX_RISE)
                .map(|&(idx, _)| idx)
                .collect();
            if allowed.is_empty() {
                None
            } else {
                Some(allowed[rng.gen_range(0..allowed.len())])
            }
        } else {
            // Обычный шаг: строго не вверх, к самому низкому соседу
            candidates
                .iter()
                .filter(|&&(_, h)| h <= current_h)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|&(idx, _)| idx)
        };

        match next {
            Some(idx) => {
                visited.insert(idx);
                path.push(idx);
            }
            None => break, // тупик — путь бросаем
        }
    }

    let long_enough = path.len() >= settings.min_river_length;
    match end {
        WalkEnd::Water | WalkEnd::Edge if long_enough => Some(RiverPath { cells: path }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coordinate;

    const W: u32 = 10;
    const H: u32 = 10;

    fn stream() -> RandomStream {
        RandomStream::for_unit(2024, Coordinate::new(0, 3))
    }

    /// Горный исток слева, океанская колонка справа, ровный спуск между ними
    fn slope_world() -> (BiomeMap, ElevationMap) {
        let mut elevation = ElevationMap::new(W, H);
        let mut biomes = BiomeMap {
            width: W,
            height: H,
            data: vec![Biome::Plains; (W * H) as usize],
        };
        for y in 0..H {
            for x in 0..W {
                let h = 0.8 - x as f32 * 0.078; // 0.8 .. ~0.1
                elevation.set(x, y, h.clamp(0.0, 1.0));
                if x == W - 1 {
                    biomes.set(x, y, Biome::Ocean);
                    elevation.set(x, y, 0.1);
                }
            }
        }
        biomes.set(1, 5, Biome::Mountain);
        (biomes, elevation)
    }

    fn settings() -> HydrologySettings {
        HydrologySettings {
            meander: 0.0,
            max_rivers_per_region: 3,
            min_river_length: 4,
            ..HydrologySettings::default()
        }
    }

    #[test]
    fn test_river_reaches_ocean() {
        let (mut biomes, elevation) = slope_world();
        let rivers = generate_rivers(&mut biomes, &elevation, &mut stream(), &settings());

        assert_eq!(rivers.len(), 1);
        let path = &rivers[0];
        assert!(path.cells.len() >= 4);
        // Финальная клетка — океанская
        let last = *path.cells.last().unwrap();
        assert_eq!(last % W as usize, (W - 1) as usize);
    }

    #[test]
    fn test_river_elevation_monotonic_without_meander() {
        let (mut biomes, elevation) = slope_world();
        let rivers = generate_rivers(&mut biomes, &elevation, &mut stream(), &settings());

        for path in &rivers {
            for pair in path.cells.windows(2) {
                assert!(elevation.data[pair[1]] <= elevation.data[pair[0]] + 1e-6);
            }
        }
    }

    #[test]
    fn test_short_paths_discarded() {
        let (mut biomes, elevation) = slope_world();
        let strict = HydrologySettings {
            min_river_length: 50,
            ..settings()
        };
        let rivers = generate_rivers(&mut biomes, &elevation, &mut stream(), &strict);
        assert!(rivers.is_empty());
        // Без рек карта биомов не тронута
        assert!(!biomes.data.contains(&Biome::River));
    }

    #[test]
    fn test_committed_cells_marked_as_river() {
        let (mut biomes, elevation) = slope_world();
        let rivers = generate_rivers(&mut biomes, &elevation, &mut stream(), &settings());
        for path in &rivers {
            for &idx in &path.cells {
                assert!(biomes.data[idx].is_water());
            }
        }
    }

    #[test]
    fn test_beach_strip_touches_water() {
        let (mut biomes, _elevation) = slope_world();
        place_beaches(&mut biomes, 1);

        let width = W as usize;
        for (idx, &biome) in biomes.data.clone().iter().enumerate() {
            if biome != Biome::Beach {
                continue;
            }
            let x = (idx % width) as u32;
            let y = (idx / width) as u32;
            assert!(is_coastline(&biomes, x, y) || {
                // сосед-пляж, выросший из той же береговой линии
                DIRECTIONS.iter().any(|&(dx, dy)| {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    nx >= 0
                        && ny >= 0
                        && nx < W as i32
                        && ny < H as i32
                        && biomes.get(nx as u32, ny as u32).is_water()
                })
            });
        }
        // Пляж существует и только у воды: колонка x=8 стала пляжем
        assert_eq!(biomes.get(W - 2, 0), Biome::Beach);
        assert_eq!(biomes.get(0, 0), Biome::Plains);
    }

    #[test]
    fn test_coast_smoothing_flips_minority_cells() {
        // Одинокая клетка океана посреди суши
        let mut biomes = BiomeMap {
            width: 5,
            height: 5,
            data: vec![Biome::Plains; 25],
        };
        biomes.set(2, 2, Biome::Ocean);
        let mut elevation = ElevationMap::new(5, 5);
        for v in &mut elevation.data {
            *v = 0.5;
        }
        elevation.set(2, 2, 0.1);

        let s = HydrologySettings {
            coast_smooth_iterations: 8,
            coast_flip_chance: 1.0,
            ..HydrologySettings::default()
        };
        smooth_coastline(&mut biomes, &mut elevation, &mut stream(), &s, 0.3);

        assert!(!biomes.get(2, 2).is_water());
        assert!(elevation.get(2, 2) > 0.3);
    }
}

// src/settlement.rs
//! Размещение поселений и точек интереса.
//!
//! Поселения раздают бюджет населения региона порциями, пока он не
//! исчерпан. Каждая порция ищет клетку с допустимым биомом на минимальном
//! манхэттенском удалении от уже размещённых поселений; исчерпание бюджета
//! попыток — штатный исход, регион просто получает меньше построек.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeMap};
use crate::config::SettlementSettings;
use crate::coords::DIRECTIONS;
use crate::rng::RandomStream;

/// Тип точки интереса на тайле
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoiType {
    Settlement,
    Social,
    Exploration,
    Dungeon,
}

/// Тематический подтип метрополии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetropolisType {
    TradeCapital,
    FortressCity,
    ArcaneSeat,
    HolyCity,
    RiverPort,
}

const METROPOLIS_TYPES: [MetropolisType; 5] = [
    MetropolisType::TradeCapital,
    MetropolisType::FortressCity,
    MetropolisType::ArcaneSeat,
    MetropolisType::HolyCity,
    MetropolisType::RiverPort,
];

/// Размещённое поселение
#[derive(Debug, Clone)]
pub struct Settlement {
    pub cell: usize,
    pub population: u32,
}

/// Метрополия: крупнейшее поселение региона с прилегающими клетками
#[derive(Debug, Clone)]
pub struct Metropolis {
    pub cell: usize,
    pub kind: MetropolisType,
    pub claimed: Vec<usize>,
}

/// Непоселенческий POI
#[derive(Debug, Clone)]
pub struct PlacedPoi {
    pub cell: usize,
    pub poi_type: PoiType,
}

/// Биомы, где селиться нельзя
fn is_forbidden(biome: Biome) -> bool {
    matches!(
        biome,
        Biome::Ocean | Biome::River | Biome::Mountain | Biome::Swamp
    )
}

/// Биомы, где селятся неохотно
fn is_less_likely(biome: Biome) -> bool {
    matches!(
        biome,
        Biome::Desert | Biome::Tundra | Biome::Taiga | Biome::Jungle | Biome::Hills
    )
}

fn manhattan_cells(a: usize, b: usize, width: usize) -> u32 {
    let (ax, ay) = ((a % width) as i32, (a / width) as i32);
    let (bx, by) = ((b % width) as i32, (b / width) as i32);
    ax.abs_diff(bx) + ay.abs_diff(by)
}

/// Ограниченный перебор попыток: случайная клетка, проверка биома и
/// дистанции до занятых. `None` — попытки кончились, это не ошибка.
fn find_spot(
    biomes: &BiomeMap,
    rng: &mut RandomStream,
    occupied: &[usize],
    min_spacing: u32,
    settings: &SettlementSettings,
) -> Option<usize> {
    let total = (biomes.width * biomes.height) as usize;
    let width = biomes.width as usize;

    for _ in 0..settings.max_attempts {
        let cell = rng.gen_range(0..total);
        let biome = biomes.data[cell];

        if is_forbidden(biome) {
            continue;
        }
        if is_less_likely(biome) && !rng.chance(settings.less_likely_chance) {
            continue;
        }
        if occupied
            .iter()
            .any(|&taken| manhattan_cells(cell, taken, width) < min_spacing)
        {
            continue;
        }
        return Some(cell);
    }
    None
}

/// Размещает поселения по бюджету населения и выделяет метрополию
pub fn place_settlements(
    biomes: &BiomeMap,
    rng: &mut RandomStream,
    settings: &SettlementSettings,
) -> (Vec<Settlement>, Option<Metropolis>) {
    let mut settlements: Vec<Settlement> = Vec::new();
    let mut remaining = settings.population_budget;

    while settlements.len() < settings.max_settlements
        && remaining >= settings.min_settlement_pop
    {
        let allotment = rng
            .gen_range(settings.min_settlement_pop..=settings.max_settlement_pop)
            .min(remaining);

        let occupied: Vec<usize> = settlements.iter().map(|s| s.cell).collect();
        let Some(cell) = find_spot(
            biomes,
            rng,
            &occupied,
            settings.min_settlement_spacing,
            settings,
        ) else {
            break;
        };

        settlements.push(Settlement {
            cell,
            population: allotment,
        });
        remaining -= allotment;
    }

    let metropolis = pick_metropolis(biomes, rng, &settlements);
    (settlements, metropolis)
}

/// Крупнейшее поселение становится метрополией и прихватывает 1-2
/// соседние сухопутные клетки под разрастание
fn pick_metropolis(
    biomes: &BiomeMap,
    rng: &mut RandomStream,
    settlements: &[Settlement],
) -> Option<Metropolis> {
    let largest = settlements.iter().max_by_key(|s| s.population)?;
    let kind = METROPOLIS_TYPES[rng.gen_range(0..METROPOLIS_TYPES.len())];

    let width = biomes.width as usize;
    let x = (largest.cell % width) as i32;
    let y = (largest.cell / width) as i32;
    let taken: Vec<usize> = settlements.iter().map(|s| s.cell).collect();

    let mut adjacent: Vec<usize> = DIRECTIONS
        .iter()
        .filter_map(|&(dx, dy)| {
            let nx = x + dx;
            let ny = y + dy;
            if nx < 0 || ny < 0 || nx >= biomes.width as i32 || ny >= biomes.height as i32 {
                return None;
            }
            let idx = (ny as usize) * width + nx as usize;
            (!biomes.data[idx].is_water() && !taken.contains(&idx)).then_some(idx)
        })
        .collect();
    adjacent.shuffle(rng);

    let claim_count = rng.gen_range(1..=2usize).min(adjacent.len());
    adjacent.truncate(claim_count);

    Some(Metropolis {
        cell: largest.cell,
        kind,
        claimed: adjacent,
    })
}

/// Взвешенный выбор подтипа POI по локальной опасности: в тихих местах —
/// социальные точки, в опасных — подземелья
fn pick_poi_type(danger: u8, rng: &mut RandomStream) -> PoiType {
    let social = u32::from(10u8.saturating_sub(danger));
    let exploration = 5u32;
    let dungeon = u32::from(danger);
    let total = social + exploration + dungeon;

    let roll = rng.gen_range(0..total);
    if roll < social {
        PoiType::Social
    } else if roll < social + exploration {
        PoiType::Exploration
    } else {
        PoiType::Dungeon
    }
}

/// Размещает непоселенческие POI с уменьшенной дистанцией
pub fn place_pois(
    biomes: &BiomeMap,
    danger: &[u8],
    rng: &mut RandomStream,
    settings: &SettlementSettings,
    occupied: &[usize],
) -> Vec<PlacedPoi> {
    let mut pois: Vec<PlacedPoi> = Vec::new();
    if settings.max_pois == 0 {
        return pois;
    }

    let count = rng.gen_range(1..=settings.max_pois);
    let mut all_taken: Vec<usize> = occupied.to_vec();

    for _ in 0..count {
        let Some(cell) = find_spot(biomes, rng, &all_taken, settings.poi_spacing, settings)
        else {
            break;
        };
        let poi_type = pick_poi_type(danger[cell], rng);
        all_taken.push(cell);
        pois.push(PlacedPoi { cell, poi_type });
    }
    pois
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coordinate;

    const W: u32 = 15;
    const H: u32 = 15;

    fn plains_map() -> BiomeMap {
        BiomeMap {
            width: W,
            height: H,
            data: vec![Biome::Plains; (W * H) as usize],
        }
    }

    fn ocean_map() -> BiomeMap {
        BiomeMap {
            width: W,
            height: H,
            data: vec![Biome::Ocean; (W * H) as usize],
        }
    }

    fn stream() -> RandomStream {
        RandomStream::for_unit(77, Coordinate::new(4, 4))
    }

    #[test]
    fn test_spacing_and_cap_respected() {
        let settings = SettlementSettings::default();
        let (settlements, _) = place_settlements(&plains_map(), &mut stream(), &settings);

        assert!(!settlements.is_empty());
        assert!(settlements.len() <= settings.max_settlements);
        for (i, a) in settlements.iter().enumerate() {
            for b in settlements.iter().skip(i + 1) {
                assert!(
                    manhattan_cells(a.cell, b.cell, W as usize)
                        >= settings.min_settlement_spacing
                );
            }
        }
    }

    #[test]
    fn test_population_within_budget() {
        let settings = SettlementSettings::default();
        let (settlements, _) = place_settlements(&plains_map(), &mut stream(), &settings);

        let total: u32 = settlements.iter().map(|s| s.population).sum();
        assert!(total <= settings.population_budget);
        for s in &settlements {
            assert!(s.population <= settings.max_settlement_pop);
        }
    }

    #[test]
    fn test_no_settlements_on_water() {
        let (settlements, metropolis) =
            place_settlements(&ocean_map(), &mut stream(), &SettlementSettings::default());
        assert!(settlements.is_empty());
        assert!(metropolis.is_none());
    }

    #[test]
    fn test_metropolis_is_largest_and_claims_neighbors() {
        let (settlements, metropolis) =
            place_settlements(&plains_map(), &mut stream(), &SettlementSettings::default());
        let metropolis = metropolis.expect("settlements exist, metropolis must too");

        let largest = settlements.iter().max_by_key(|s| s.population).unwrap();
        assert_eq!(metropolis.cell, largest.cell);
        assert!((1..=2).contains(&metropolis.claimed.len()));
        for &claim in &metropolis.claimed {
            assert_eq!(manhattan_cells(claim, metropolis.cell, W as usize), 1);
        }
    }

    #[test]
    fn test_pois_respect_spacing_from_each_other() {
        let settings = SettlementSettings::default();
        let danger = vec![5u8; (W * H) as usize];
        let pois = place_pois(&plains_map(), &danger, &mut stream(), &settings, &[]);

        assert!(!pois.is_empty());
        assert!(pois.len() <= settings.max_pois);
        for (i, a) in pois.iter().enumerate() {
            for b in pois.iter().skip(i + 1) {
                assert!(manhattan_cells(a.cell, b.cell, W as usize) >= settings.poi_spacing);
            }
        }
    }

    #[test]
    fn test_poi_type_extremes() {
        // При нулевой опасности подземелий не бывает, при максимальной —
        // не бывает социальных точек
        let mut rng = stream();
        for _ in 0..64 {
            assert_ne!(pick_poi_type(0, &mut rng), PoiType::Dungeon);
            assert_ne!(pick_poi_type(10, &mut rng), PoiType::Social);
        }
    }

    #[test]
    fn test_placement_is_deterministic() {
        let settings = SettlementSettings::default();
        let (a, _) = place_settlements(&plains_map(), &mut stream(), &settings);
        let (b, _) = place_settlements(&plains_map(), &mut stream(), &settings);
        let cells_a: Vec<usize> = a.iter().map(|s| s.cell).collect();
        let cells_b: Vec<usize> = b.iter().map(|s| s.cell).collect();
        assert_eq!(cells_a, cells_b);
    }
}

// src/region.rs
//! Сборка региона: полный конвейер генерации одного участка 15×15.
//!
//! Регион — самостоятельная единица генерации со своим `RandomStream`.
//! Порядок стадий фиксирован: высоты → климат → биомы → разрешение
//! смежности → береговая линия → пляжи → реки → поселения → опасность →
//! POI → ресурсы. Менять порядок нельзя — изменится расход случайных
//! чисел и, как следствие, весь результат.

use serde::{Deserialize, Serialize};

use crate::biome::adjacency::{AdjacencyRuleSet, count_violations, resolve_adjacency};
use crate::biome::{Biome, BiomeMap, assign_biomes};
use crate::climate::generate_climate;
use crate::config::GenerationParams;
use crate::coords::Coordinate;
use crate::elevation::{ElevationMap, generate_elevation};
use crate::error::GenerationError;
use crate::hydrology::{generate_rivers, place_beaches, smooth_coastline};
use crate::resources::{Resource, ResourceTables, distribute_resources, stamp_clusters};
use crate::rng::RandomStream;
use crate::settlement::{MetropolisType, PoiType, place_pois, place_settlements};

/// Сторона квадратной сетки региона (15×15 = 225 тайлов)
pub const REGION_SIZE: u32 = 15;

/// Радиус, в котором поселение снижает опасность окрестных тайлов
const SETTLEMENT_CALM_RADIUS: u32 = 2;

/// Роль тайла в русле реки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiverKind {
    Source,
    Channel,
    Mouth,
}

/// Река на тайле: роль в русле и ширина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverInfo {
    pub kind: RiverKind,
    pub width: u8,
}

/// Тайл региона — наименьшая адресуемая единица мира
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coordinate: Coordinate,
    pub biome: Biome,
    pub elevation: f32,
    pub humidity: f32,
    pub temperature: f32,
    /// Уровень опасности 0..=10
    pub danger_level: u8,
    pub poi_type: Option<PoiType>,
    /// Население: только у поселенческих тайлов, иначе 0
    pub population: u32,
    pub river: Option<RiverInfo>,
    /// Координата метрополии, захватившей тайл под разрастание
    pub claimed_by_city: Option<Coordinate>,
    pub resources: Vec<Resource>,
}

/// Регион: прямоугольный участок тайлов вокруг координаты континента
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    /// Координата региона на сетке континента
    pub coordinates: Coordinate,
    /// Тайлы в построчном порядке — порядок стабилен для сериализации
    pub tiles: Vec<Tile>,
    /// Глобальные координаты всех POI региона (включая поселения)
    pub poi_list: Vec<Coordinate>,
    pub total_population: u32,
    /// Напряжённость региона 0..=10 — средняя опасность тайлов
    pub tension_level: u8,
    pub metropolis_type: Option<MetropolisType>,
    /// Журнал примечательных событий генерации
    pub memory: Vec<String>,
}

/// Генерирует один регион по глобальному сиду и координате на континенте
pub fn generate_region(
    global_seed: u64,
    origin: Coordinate,
    params: &GenerationParams,
    rules: &AdjacencyRuleSet,
    tables: &ResourceTables,
) -> Result<Region, GenerationError> {
    let mut rng = RandomStream::for_unit(global_seed, origin);
    let size = REGION_SIZE;
    let mut memory: Vec<String> = Vec::new();

    // === 1. Рельеф и климат ===
    let mut elevation = generate_elevation(&mut rng, size, size, &params.elevation)?;
    let climate = generate_climate(
        &mut rng,
        &elevation,
        &params.climate,
        params.thresholds.sea_level,
    )?;

    // === 2. Биомы и правила смежности ===
    let mut biomes = assign_biomes(&elevation, &climate, &params.thresholds)?;
    let resolved = resolve_adjacency(&mut biomes, rules);
    if resolved > 0 {
        tracing::debug!(region = %region_id(origin), cells = resolved, "adjacency conflicts resolved");
    }
    let leftover = count_violations(&biomes, rules);
    if leftover > 0 {
        return Err(GenerationError::InvariantBroken(format!(
            "{leftover} adjacency violations survived resolution in {}",
            region_id(origin)
        )));
    }

    // === 3. Гидрология ===
    smooth_coastline(
        &mut biomes,
        &mut elevation,
        &mut rng,
        &params.hydrology,
        params.thresholds.sea_level,
    );
    place_beaches(&mut biomes, params.hydrology.beach_width);
    let rivers = generate_rivers(&mut biomes, &elevation, &mut rng, &params.hydrology);
    for river in &rivers {
        memory.push(format!("river carved for {} tiles", river.cells.len()));
    }

    // === 4. Поселения, опасность, POI ===
    let (settlements, metropolis) = place_settlements(&biomes, &mut rng, &params.settlements);
    let danger = compute_danger(&biomes, &elevation, &settlements.iter().map(|s| s.cell).collect::<Vec<_>>());

    let mut occupied: Vec<usize> = settlements.iter().map(|s| s.cell).collect();
    if let Some(m) = &metropolis {
        occupied.extend(&m.claimed);
    }
    let pois = place_pois(&biomes, &danger, &mut rng, &params.settlements, &occupied);

    // === 5. Ресурсы ===
    let mut resources = distribute_resources(
        &biomes,
        &elevation,
        &climate.humidity,
        &mut rng,
        tables,
    );
    stamp_clusters(&biomes, &mut rng, &params.resources, &mut resources);

    // === 6. Сборка тайлов ===
    let width = size as usize;
    let total = width * width;

    let mut river_info: Vec<Option<RiverInfo>> = vec![None; total];
    for river in &rivers {
        let len = river.cells.len();
        for (pos, &idx) in river.cells.iter().enumerate() {
            let kind = if pos == 0 {
                RiverKind::Source
            } else if pos == len - 1 {
                RiverKind::Mouth
            } else {
                RiverKind::Channel
            };
            // Ширина нарастает к устью
            let width_step = 1 + (pos * 2 / len.max(1)) as u8;
            river_info[idx] = Some(RiverInfo {
                kind,
                width: width_step,
            });
        }
    }

    let mut population: Vec<u32> = vec![0; total];
    let mut poi_types: Vec<Option<PoiType>> = vec![None; total];
    for s in &settlements {
        population[s.cell] = s.population;
        poi_types[s.cell] = Some(PoiType::Settlement);
        memory.push(format!(
            "settlement of {} founded at {}",
            s.population,
            cell_coordinate(origin, s.cell, width)
        ));
    }
    for p in &pois {
        poi_types[p.cell] = Some(p.poi_type);
    }

    let mut claimed: Vec<Option<Coordinate>> = vec![None; total];
    if let Some(m) = &metropolis {
        let metro_coord = cell_coordinate(origin, m.cell, width);
        for &cell in &m.claimed {
            claimed[cell] = Some(metro_coord);
        }
        memory.push(format!("metropolis raised: {:?}", m.kind));
    }

    let mut tiles = Vec::with_capacity(total);
    let mut resources = resources.into_iter();
    for idx in 0..total {
        tiles.push(Tile {
            coordinate: cell_coordinate(origin, idx, width),
            biome: biomes.data[idx],
            elevation: elevation.data[idx],
            humidity: climate.humidity[idx],
            temperature: climate.temperature[idx],
            danger_level: danger[idx],
            poi_type: poi_types[idx],
            population: population[idx],
            river: river_info[idx],
            claimed_by_city: claimed[idx],
            resources: resources.next().unwrap_or_default(),
        });
    }

    let total_population: u32 = settlements.iter().map(|s| s.population).sum();
    let tension_level = mean_danger(&danger);

    let mut poi_list: Vec<Coordinate> = settlements
        .iter()
        .map(|s| cell_coordinate(origin, s.cell, width))
        .collect();
    poi_list.extend(pois.iter().map(|p| cell_coordinate(origin, p.cell, width)));

    Ok(Region {
        id: region_id(origin),
        coordinates: origin,
        tiles,
        poi_list,
        total_population,
        tension_level,
        metropolis_type: metropolis.map(|m| m.kind),
        memory,
    })
}

/// Стабильный идентификатор региона по его координате
#[must_use]
pub fn region_id(origin: Coordinate) -> String {
    format!("region_{}_{}", origin.x, origin.y)
}

/// Глобальная координата тайла: регион занимает квадрат 15×15 на мировой сетке
fn cell_coordinate(origin: Coordinate, idx: usize, width: usize) -> Coordinate {
    let local_x = (idx % width) as i32;
    let local_y = (idx / width) as i32;
    Coordinate::new(
        origin.x * REGION_SIZE as i32 + local_x,
        origin.y * REGION_SIZE as i32 + local_y,
    )
}

/// Карта опасности: базовая опасность биома плюс высотная надбавка,
/// поселения успокаивают окрестности
fn compute_danger(biomes: &BiomeMap, elevation: &ElevationMap, settlements: &[usize]) -> Vec<u8> {
    let width = biomes.width as usize;
    biomes
        .data
        .iter()
        .enumerate()
        .map(|(idx, biome)| {
            let mut danger = u32::from(biome.base_danger());
            danger += (elevation.data[idx] * 2.0).round() as u32;

            let x = (idx % width) as i32;
            let y = (idx / width) as i32;
            let near_settlement = settlements.iter().any(|&cell| {
                let sx = (cell % width) as i32;
                let sy = (cell / width) as i32;
                (x.abs_diff(sx) + y.abs_diff(sy)) <= SETTLEMENT_CALM_RADIUS
            });
            if near_settlement {
                danger = danger.saturating_sub(2);
            }
            danger.min(10) as u8
        })
        .collect()
}

fn mean_danger(danger: &[u8]) -> u8 {
    if danger.is_empty() {
        return 0;
    }
    let sum: u32 = danger.iter().map(|&d| u32::from(d)).sum();
    (sum as f32 / danger.len() as f32).round() as u8
}

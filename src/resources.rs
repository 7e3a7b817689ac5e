// src/resources.rs
//! Распределение ресурсов по тайлам.
//!
//! Каждый биом имеет таблицу заготовок (тип, вероятность, количество,
//! редкость). Вероятность подправляется условиями клетки: высокогорье
//! богаче рудой и камнем, вода — рыбой, влажные земли — травами и посевами.
//! Второй проход изредка штампует особые кластеры с общим идентификатором.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeMap};
use crate::config::ResourceSettings;
use crate::elevation::ElevationMap;
use crate::rng::RandomStream;

/// Категория ресурса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Stone,
    Ore,
    Gem,
    PreciousMetal,
    Herb,
    Crop,
    Animal,
    Fish,
    Water,
    Magical,
}

/// Экземпляр ресурса на тайле
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub resource_type: ResourceType,
    /// Редкость 1..=10
    pub rarity: u8,
    /// Количество 1..=10
    pub quantity: u8,
    /// Ценность 1..=10, выводится из редкости и количества
    pub value: u8,
    /// Идентификатор особого кластера, если ресурс входит в него
    pub cluster_id: Option<u32>,
}

/// Заготовка ресурса в таблице биома
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpawn {
    pub name: String,
    pub resource_type: ResourceType,
    /// Базовая вероятность появления на тайле (0.0..1.0)
    pub probability: f32,
    pub quantity: u8,
    pub rarity: u8,
}

/// Таблицы ресурсов по биомам
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTables {
    pub by_biome: HashMap<Biome, Vec<ResourceSpawn>>,
}

fn spawn(
    name: &str,
    resource_type: ResourceType,
    probability: f32,
    quantity: u8,
    rarity: u8,
) -> ResourceSpawn {
    ResourceSpawn {
        name: name.to_string(),
        resource_type,
        probability,
        quantity,
        rarity,
    }
}

impl ResourceTables {
    /// Встроенные таблицы по умолчанию
    #[must_use]
    pub fn builtin_default() -> Self {
        use ResourceType::{
            Animal, Crop, Fish, Gem, Herb, Magical, Ore, PreciousMetal, Stone, Water,
        };

        let mut by_biome = HashMap::new();
        by_biome.insert(
            Biome::Ocean,
            vec![
                spawn("Coastal Fish", Fish, 0.55, 5, 2),
                spawn("Deep Catch", Fish, 0.2, 3, 4),
            ],
        );
        by_biome.insert(
            Biome::Beach,
            vec![
                spawn("Shore Fish", Fish, 0.3, 3, 2),
                spawn("Smooth Stones", Stone, 0.15, 2, 1),
            ],
        );
        by_biome.insert(
            Biome::River,
            vec![
                spawn("Fresh Water", Water, 0.7, 6, 1),
                spawn("River Fish", Fish, 0.45, 4, 2),
            ],
        );
        by_biome.insert(
            Biome::Plains,
            vec![
                spawn("Golden Wheat", Crop, 0.5, 5, 2),
                spawn("Grazing Cattle", Animal, 0.3, 4, 2),
                spawn("Field Stones", Stone, 0.12, 2, 1),
            ],
        );
        by_biome.insert(
            Biome::Savanna,
            vec![
                spawn("Savanna Game", Animal, 0.4, 4, 3),
                spawn("Dry Grain", Crop, 0.2, 3, 2),
            ],
        );
        by_biome.insert(
            Biome::Forest,
            vec![
                spawn("Healing Herbs", Herb, 0.35, 3, 3),
                spawn("Forest Game", Animal, 0.35, 4, 2),
                spawn("Wild Berries", Crop, 0.2, 3, 1),
            ],
        );
        by_biome.insert(
            Biome::Jungle,
            vec![
                spawn("Rare Orchids", Herb, 0.45, 3, 5),
                spawn("Exotic Beasts", Animal, 0.3, 3, 4),
                spawn("Verdant Essence", Magical, 0.08, 2, 8),
            ],
        );
        by_biome.insert(
            Biome::Swamp,
            vec![
                spawn("Bog Herbs", Herb, 0.4, 3, 4),
                spawn("Marsh Fish", Fish, 0.25, 3, 2),
                spawn("Witchlight Moss", Magical, 0.1, 2, 7),
            ],
        );
        by_biome.insert(
            Biome::Desert,
            vec![
                spawn("Desert Gems", Gem, 0.12, 2, 6),
                spawn("Sandstone", Stone, 0.25, 3, 2),
                spawn("Sunstone Shard", Magical, 0.05, 1, 9),
            ],
        );
        by_biome.insert(
            Biome::Tundra,
            vec![
                spawn("Arctic Pelts", Animal, 0.3, 3, 4),
                spawn("Frozen Stone", Stone, 0.2, 3, 2),
            ],
        );
        by_biome.insert(
            Biome::Taiga,
            vec![
                spawn("Winter Game", Animal, 0.4, 4, 3),
                spawn("Hardy Herbs", Herb, 0.2, 2, 3),
            ],
        );
        by_biome.insert(
            Biome::Hills,
            vec![
                spawn("Hill Stone", Stone, 0.4, 4, 2),
                spawn("Copper Ore", Ore, 0.25, 3, 3),
            ],
        );
        by_biome.insert(
            Biome::Mountain,
            vec![
                spawn("Granite", Stone, 0.55, 5, 2),
                spawn("Iron Ore", Ore, 0.4, 4, 4),
                spawn("Rough Gems", Gem, 0.12, 2, 7),
                spawn("Silver Vein", PreciousMetal, 0.08, 2, 8),
            ],
        );

        Self { by_biome }
    }

    /// Загружает таблицы из JSON-файла; при ошибке — встроенные таблицы
    /// с предупреждением в лог
    #[must_use]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Self>(&text).map_err(|e| e.to_string()))
        {
            Ok(tables) => tables,
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "resource tables unavailable, falling back to builtin tables"
                );
                Self::builtin_default()
            }
        }
    }
}

impl Default for ResourceTables {
    fn default() -> Self {
        Self::builtin_default()
    }
}

/// Ценность ресурса: среднее редкости и количества со случайным множителем
fn roll_value(rng: &mut RandomStream, rarity: u8, quantity: u8) -> u8 {
    let base = f32::from(rarity + quantity) / 2.0;
    (base * rng.gen_range(0.6..1.4)).round().clamp(1.0, 10.0) as u8
}

/// Вероятность с поправкой на условия клетки
fn adjusted_probability(spawn: &ResourceSpawn, biome: Biome, elevation: f32, humidity: f32) -> f32 {
    use ResourceType::{Crop, Fish, Gem, Herb, Ore, PreciousMetal, Stone, Water};

    let mut p = spawn.probability;
    match spawn.resource_type {
        Stone | Ore | Gem | PreciousMetal if elevation > 0.7 => p *= 1.5,
        Fish | Water if biome.is_water() => p *= 1.3,
        Herb | Crop if humidity > 0.7 => p *= 1.3,
        _ => {}
    }
    p.min(0.95)
}

/// Раздаёт ресурсы всем тайлам региона по таблицам биомов
pub fn distribute_resources(
    biomes: &BiomeMap,
    elevation: &ElevationMap,
    humidity: &[f32],
    rng: &mut RandomStream,
    tables: &ResourceTables,
) -> Vec<Vec<Resource>> {
    let total = (biomes.width * biomes.height) as usize;
    let mut per_tile: Vec<Vec<Resource>> = vec![Vec::new(); total];

    for idx in 0..total {
        let biome = biomes.data[idx];
        let Some(spawns) = tables.by_biome.get(&biome) else {
            continue;
        };
        for s in spawns {
            let p = adjusted_probability(s, biome, elevation.data[idx], humidity[idx]);
            if rng.chance(p) {
                let value = roll_value(rng, s.rarity, s.quantity);
                per_tile[idx].push(Resource {
                    name: s.name.clone(),
                    resource_type: s.resource_type,
                    rarity: s.rarity,
                    quantity: s.quantity,
                    value,
                    cluster_id: None,
                });
            }
        }
    }
    per_tile
}

const CLUSTERABLE: [ResourceType; 5] = [
    ResourceType::Ore,
    ResourceType::PreciousMetal,
    ResourceType::Gem,
    ResourceType::Herb,
    ResourceType::Stone,
];

const QUALITIES: [&str; 6] = ["Rich", "Pure", "Ancient", "Deep", "Pale", "Gleaming"];
const METALS: [&str; 5] = ["Iron", "Copper", "Silver", "Mithril", "Cobalt"];
const GEMS: [&str; 4] = ["Amethyst", "Emerald", "Ruby", "Sapphire"];

fn cluster_name(rng: &mut RandomStream, kind: ResourceType) -> String {
    let quality = QUALITIES[rng.gen_range(0..QUALITIES.len())];
    match kind {
        ResourceType::Ore => {
            format!("{quality} {} Ore", METALS[rng.gen_range(0..METALS.len())])
        }
        ResourceType::PreciousMetal => {
            format!("{quality} {} Deposit", METALS[rng.gen_range(0..METALS.len())])
        }
        ResourceType::Gem => {
            format!("{quality} {} Cluster", GEMS[rng.gen_range(0..GEMS.len())])
        }
        ResourceType::Herb => format!("{quality} Grove"),
        _ => format!("{quality} Quarry"),
    }
}

/// Штампует особые ресурсные кластеры: случайный центр, тип и радиус;
/// все клетки в радиусе получают ресурс с общим идентификатором кластера
pub fn stamp_clusters(
    biomes: &BiomeMap,
    rng: &mut RandomStream,
    settings: &ResourceSettings,
    per_tile: &mut [Vec<Resource>],
) {
    let width = biomes.width as usize;
    let height = biomes.height as usize;
    let mut next_id: u32 = 1;

    for _ in 0..settings.max_clusters {
        if !rng.chance(settings.cluster_chance) {
            continue;
        }

        // Центр — сухопутная клетка, ограниченный перебор
        let mut center = None;
        for _ in 0..16 {
            let cell = rng.gen_range(0..width * height);
            if !biomes.data[cell].is_water() {
                center = Some(cell);
                break;
            }
        }
        let Some(center) = center else { continue };

        let kind = CLUSTERABLE[rng.gen_range(0..CLUSTERABLE.len())];
        let radius = rng.gen_range(settings.cluster_radius_min..=settings.cluster_radius_max);
        let rarity = rng.gen_range(4..=9u8);
        let quantity = rng.gen_range(3..=8u8);
        let name = cluster_name(rng, kind);

        let cx = (center % width) as i32;
        let cy = (center / width) as i32;
        let r = radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                let x = cx + dx;
                let y = cy + dy;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    continue;
                }
                if ((dx * dx + dy * dy) as f32).sqrt() > radius as f32 {
                    continue;
                }
                let idx = (y as usize) * width + x as usize;
                if biomes.data[idx].is_water() {
                    continue;
                }
                let value = roll_value(rng, rarity, quantity);
                per_tile[idx].push(Resource {
                    name: name.clone(),
                    resource_type: kind,
                    rarity,
                    quantity,
                    value,
                    cluster_id: Some(next_id),
                });
            }
        }
        next_id += 1;
    }
}

// src/continent.rs
//! Сборка континента: контур из регионов, их генерация и метаданные.
//!
//! Регионы независимы по случайности (свой `RandomStream` на каждую
//! координату), поэтому при включённой функции `parallel` генерируются
//! через rayon. Порядок результатов совпадает с порядком роста контура —
//! вывод побайтово одинаков в обоих режимах.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use petgraph::graph::UnGraph;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::biome::adjacency::AdjacencyRuleSet;
use crate::config::GenerationParams;
use crate::coords::{
    Coordinate, MAX_CONTINENT_REGIONS, MIN_CONTINENT_REGIONS, generate_continent_coordinates,
};
use crate::error::GenerationError;
use crate::region::{Region, generate_region, region_id};
use crate::resources::ResourceTables;
use crate::rng::RandomStream;

/// Габариты континента на сетке регионов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// Континент: упорядоченный набор координат регионов и производные метаданные
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Continent {
    pub id: String,
    /// Канонический сид, из которого выведена вся случайность
    pub seed: u64,
    /// Координаты регионов в порядке роста контура
    pub region_coordinates: Vec<Coordinate>,
    pub region_ids: Vec<String>,
    pub origin_coordinate: Coordinate,
    /// Отсутствует у пустого континента
    pub boundary: Option<Boundary>,
    /// Ядро оставляет None — штамп ставит вызывающая сторона,
    /// чтобы не ломать детерминизм вывода
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Упорядоченные метаданные: граф смежности регионов и прочее
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Результат полного запуска генерации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedWorld {
    pub continent: Continent,
    pub regions: Vec<Region>,
}

/// Генерирует континент и все его регионы
pub fn generate_continent(
    params: &GenerationParams,
    rules: &AdjacencyRuleSet,
    tables: &ResourceTables,
) -> Result<GeneratedWorld, GenerationError> {
    let seed = params.seed.canonical();
    let mut rng = RandomStream::for_continent(seed);

    let coordinates = generate_continent_coordinates(
        &mut rng,
        params.region_count,
        MIN_CONTINENT_REGIONS,
        MAX_CONTINENT_REGIONS,
    );
    tracing::debug!(seed, regions = coordinates.len(), "continent footprint grown");

    // Каждый регион сидируется независимо — порядок не влияет на результат
    #[cfg(feature = "parallel")]
    let regions: Result<Vec<Region>, GenerationError> = coordinates
        .par_iter()
        .map(|&origin| generate_region(seed, origin, params, rules, tables))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let regions: Result<Vec<Region>, GenerationError> = coordinates
        .iter()
        .map(|&origin| generate_region(seed, origin, params, rules, tables))
        .collect();
    let regions = regions?;

    let boundary = compute_boundary(&coordinates);
    let graph = build_region_graph(&coordinates);

    let mut edges: Vec<(u32, u32)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| {
            let (a, b) = (graph[a], graph[b]);
            if a < b { (a, b) } else { (b, a) }
        })
        .collect();
    edges.sort_unstable();

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "region_adjacency".to_string(),
        serde_json::json!(edges),
    );
    metadata.insert(
        "region_count".to_string(),
        serde_json::json!(coordinates.len()),
    );

    let continent = Continent {
        id: format!("continent_{seed}"),
        seed,
        region_ids: coordinates.iter().map(|&c| region_id(c)).collect(),
        origin_coordinate: coordinates[0],
        boundary,
        creation_timestamp: None,
        metadata,
        region_coordinates: coordinates,
    };

    Ok(GeneratedWorld { continent, regions })
}

fn compute_boundary(coordinates: &[Coordinate]) -> Option<Boundary> {
    let first = coordinates.first()?;
    let mut boundary = Boundary {
        min_x: first.x,
        max_x: first.x,
        min_y: first.y,
        max_y: first.y,
    };
    for c in coordinates {
        boundary.min_x = boundary.min_x.min(c.x);
        boundary.max_x = boundary.max_x.max(c.x);
        boundary.min_y = boundary.min_y.min(c.y);
        boundary.max_y = boundary.max_y.max(c.y);
    }
    Some(boundary)
}

/// Граф смежности регионов: узлы — порядковые номера регионов,
/// рёбра — ортогональное соседство координат
fn build_region_graph(coordinates: &[Coordinate]) -> UnGraph<u32, ()> {
    let mut graph = UnGraph::new_undirected();
    let mut id_to_node = HashMap::new();
    let coord_to_id: HashMap<Coordinate, u32> = coordinates
        .iter()
        .enumerate()
        .map(|(i, &c)| (c, i as u32))
        .collect();

    for i in 0..coordinates.len() as u32 {
        let node = graph.add_node(i);
        id_to_node.insert(i, node);
    }

    let mut edges = HashSet::new();
    for (i, coordinate) in coordinates.iter().enumerate() {
        for neighbor in coordinate.neighbors() {
            if let Some(&n_id) = coord_to_id.get(&neighbor) {
                let a = i as u32;
                let (a, b) = if a < n_id { (a, n_id) } else { (n_id, a) };
                if edges.insert((a, b)) {
                    graph.add_edge(id_to_node[&a], id_to_node[&b], ());
                }
            }
        }
    }
    graph
}

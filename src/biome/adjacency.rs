// src/biome/adjacency.rs
//! Правила смежности биомов и разрешение конфликтов.
//!
//! Таблица правил — три отношения над парами биомов: совместимы,
//! несовместимы, требуется переходный биом. Отношение симметрично,
//! неизвестные пары считаются совместимыми. Таблица загружается из
//! JSON-файла; при любой ошибке загрузки используется встроенная таблица
//! с предупреждением в лог — генерация никогда не падает из-за таблицы.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biome::{Biome, BiomeMap};

/// Предел проходов разрешения: на практике сходится за 2-3
const MAX_RESOLVE_PASSES: usize = 16;

/// Кандидаты замены несовместимой клетки, в порядке предпочтения
const REPLACEMENT_CANDIDATES: [Biome; 6] = [
    Biome::Plains,
    Biome::Forest,
    Biome::Savanna,
    Biome::Taiga,
    Biome::Hills,
    Biome::Beach,
];

static DEFAULT_RULE: AdjacencyRule = AdjacencyRule::Compatible;

/// Правило для пары биомов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjacencyRule {
    Compatible,
    Incompatible,
    /// Паре нужен переходный биом из `via` в пределах `min_width` клеток
    Transition {
        via: Vec<Biome>,
        #[serde(default = "default_min_width")]
        min_width: u32,
    },
}

fn default_min_width() -> u32 {
    1
}

/// Одна запись внешней таблицы правил
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyRuleEntry {
    pub a: Biome,
    pub b: Biome,
    pub rule: AdjacencyRule,
}

/// Симметричная таблица правил смежности
#[derive(Debug, Clone)]
pub struct AdjacencyRuleSet {
    rules: HashMap<(Biome, Biome), AdjacencyRule>,
}

impl AdjacencyRuleSet {
    fn key(a: Biome, b: Biome) -> (Biome, Biome) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Собирает таблицу из списка записей
    #[must_use]
    pub fn from_entries(entries: Vec<AdjacencyRuleEntry>) -> Self {
        let rules = entries
            .into_iter()
            .map(|e| (Self::key(e.a, e.b), e.rule))
            .collect();
        Self { rules }
    }

    /// Встроенная таблица по умолчанию
    #[must_use]
    pub fn builtin_default() -> Self {
        use AdjacencyRule::{Incompatible, Transition};
        use Biome::{Desert, Forest, Hills, Jungle, Mountain, Plains, Savanna, Swamp, Taiga, Tundra};

        let transition = |via: Biome| Transition {
            via: vec![via],
            min_width: 1,
        };

        Self::from_entries(vec![
            AdjacencyRuleEntry { a: Desert, b: Swamp, rule: Incompatible },
            AdjacencyRuleEntry { a: Desert, b: Taiga, rule: Incompatible },
            AdjacencyRuleEntry { a: Desert, b: Tundra, rule: Incompatible },
            AdjacencyRuleEntry { a: Tundra, b: Jungle, rule: Incompatible },
            AdjacencyRuleEntry { a: Tundra, b: Swamp, rule: Incompatible },
            AdjacencyRuleEntry { a: Jungle, b: Taiga, rule: Incompatible },
            AdjacencyRuleEntry { a: Desert, b: Forest, rule: transition(Savanna) },
            AdjacencyRuleEntry { a: Desert, b: Jungle, rule: transition(Savanna) },
            AdjacencyRuleEntry { a: Tundra, b: Forest, rule: transition(Taiga) },
            AdjacencyRuleEntry { a: Tundra, b: Plains, rule: transition(Taiga) },
            AdjacencyRuleEntry { a: Mountain, b: Plains, rule: transition(Hills) },
        ])
    }

    /// Загружает таблицу из JSON-файла.
    ///
    /// Ошибка чтения или разбора — не повод останавливать генерацию:
    /// логируется предупреждение и возвращается встроенная таблица.
    #[must_use]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<Vec<AdjacencyRuleEntry>>(&text).map_err(|e| e.to_string())
            }) {
            Ok(entries) => Self::from_entries(entries),
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "adjacency rules unavailable, falling back to builtin table"
                );
                Self::builtin_default()
            }
        }
    }

    /// Правило для пары; неизвестные пары совместимы
    #[must_use]
    pub fn lookup(&self, a: Biome, b: Biome) -> &AdjacencyRule {
        self.rules.get(&Self::key(a, b)).unwrap_or(&DEFAULT_RULE)
    }
}

impl Default for AdjacencyRuleSet {
    fn default() -> Self {
        Self::builtin_default()
    }
}

/// Разрешает конфликты смежности на карте биомов. Возвращает число
/// изменённых клеток. На уже корректной карте ничего не меняет
/// (идемпотентность).
pub fn resolve_adjacency(map: &mut BiomeMap, rules: &AdjacencyRuleSet) -> usize {
    let mut total = 0;
    for _ in 0..MAX_RESOLVE_PASSES {
        let changed = resolve_pass(map, rules);
        total += changed;
        if changed == 0 {
            break;
        }
    }
    total
}

fn resolve_pass(map: &mut BiomeMap, rules: &AdjacencyRuleSet) -> usize {
    let mut changed = 0;

    for y in 0..map.height {
        for x in 0..map.width {
            // Каждая пара рассматривается один раз: сосед справа и снизу
            for (dx, dy) in [(1u32, 0u32), (0, 1)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx >= map.width || ny >= map.height {
                    continue;
                }

                let a = map.get(x, y);
                let b = map.get(nx, ny);

                match rules.lookup(a, b) {
                    AdjacencyRule::Compatible => {}
                    AdjacencyRule::Incompatible => {
                        let (tx, ty) = replace_target((x, y), (nx, ny), a, b);
                        let other = if (tx, ty) == (x, y) { b } else { a };
                        let replacement = pick_replacement(map, rules, tx, ty, other);
                        if replacement != map.get(tx, ty) {
                            map.set(tx, ty, replacement);
                            changed += 1;
                        }
                    }
                    AdjacencyRule::Transition { via, min_width } => {
                        if via.is_empty() {
                            continue;
                        }
                        if transition_within(map, x, y, dx as i32, dy as i32, via, *min_width) {
                            continue;
                        }
                        let (tx, ty) = replace_target((x, y), (nx, ny), a, b);
                        map.set(tx, ty, via[0]);
                        changed += 1;
                    }
                }
            }
        }
    }

    changed
}

/// Выбирает, какую клетку пары переписывать: горы и воду не трогаем,
/// пока есть мягкая альтернатива
fn replace_target(
    a_pos: (u32, u32),
    b_pos: (u32, u32),
    a: Biome,
    b: Biome,
) -> (u32, u32) {
    let hard = |biome: Biome| matches!(biome, Biome::Mountain | Biome::Ocean | Biome::River);
    if hard(b) && !hard(a) { a_pos } else { b_pos }
}

/// Есть ли переходный биом в пределах `min_width` шагов по направлению пары
fn transition_within(
    map: &BiomeMap,
    x: u32,
    y: u32,
    dx: i32,
    dy: i32,
    via: &[Biome],
    min_width: u32,
) -> bool {
    for step in 1..=min_width as i32 {
        let nx = x as i32 + dx * step;
        let ny = y as i32 + dy * step;
        if nx < 0 || ny < 0 || nx >= map.width as i32 || ny >= map.height as i32 {
            return false;
        }
        if via.contains(&map.get(nx as u32, ny as u32)) {
            return true;
        }
    }
    false
}

/// Подбирает замену клетке: первый кандидат, совместимый со всеми её
/// соседями и со второй стороной конфликта
fn pick_replacement(
    map: &BiomeMap,
    rules: &AdjacencyRuleSet,
    x: u32,
    y: u32,
    other: Biome,
) -> Biome {
    'candidates: for candidate in REPLACEMENT_CANDIDATES {
        if !matches!(rules.lookup(candidate, other), AdjacencyRule::Compatible) {
            continue;
        }
        for (dx, dy) in crate::coords::DIRECTIONS {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= map.width as i32 || ny >= map.height as i32 {
                continue;
            }
            let neighbor = map.get(nx as u32, ny as u32);
            if !matches!(rules.lookup(candidate, neighbor), AdjacencyRule::Compatible) {
                continue 'candidates;
            }
        }
        return candidate;
    }
    // Запасной вариант: равнины нейтральны почти ко всему
    Biome::Plains
}

/// Число оставшихся нарушений (для тестов и диагностики)
#[must_use]
pub fn count_violations(map: &BiomeMap, rules: &AdjacencyRuleSet) -> usize {
    let mut violations = 0;
    for y in 0..map.height {
        for x in 0..map.width {
            for (dx, dy) in [(1u32, 0u32), (0, 1)] {
                let nx = x + dx;
                let ny = y + dy;
                if nx >= map.width || ny >= map.height {
                    continue;
                }
                match rules.lookup(map.get(x, y), map.get(nx, ny)) {
                    AdjacencyRule::Compatible => {}
                    AdjacencyRule::Incompatible => violations += 1,
                    AdjacencyRule::Transition { via, min_width } => {
                        if !transition_within(map, x, y, dx as i32, dy as i32, via, *min_width) {
                            violations += 1;
                        }
                    }
                }
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped_map(left: Biome, right: Biome) -> BiomeMap {
        let width = 8;
        let height = 8;
        let data = (0..width * height)
            .map(|i| if i % width < width / 2 { left } else { right })
            .collect();
        BiomeMap {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    #[test]
    fn test_unknown_pairs_are_compatible() {
        let rules = AdjacencyRuleSet::builtin_default();
        assert_eq!(
            rules.lookup(Biome::Ocean, Biome::Beach),
            &AdjacencyRule::Compatible
        );
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let rules = AdjacencyRuleSet::builtin_default();
        assert_eq!(
            rules.lookup(Biome::Desert, Biome::Swamp),
            rules.lookup(Biome::Swamp, Biome::Desert)
        );
        assert!(matches!(
            rules.lookup(Biome::Swamp, Biome::Desert),
            AdjacencyRule::Incompatible
        ));
    }

    #[test]
    fn test_resolve_clears_incompatible_stripe() {
        let rules = AdjacencyRuleSet::builtin_default();
        let mut map = striped_map(Biome::Desert, Biome::Swamp);
        assert!(count_violations(&map, &rules) > 0);

        resolve_adjacency(&mut map, &rules);
        assert_eq!(count_violations(&map, &rules), 0);
    }

    #[test]
    fn test_resolve_inserts_transition() {
        let rules = AdjacencyRuleSet::builtin_default();
        let mut map = striped_map(Biome::Tundra, Biome::Forest);
        resolve_adjacency(&mut map, &rules);

        assert_eq!(count_violations(&map, &rules), 0);
        assert!(map.data.contains(&Biome::Taiga));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let rules = AdjacencyRuleSet::builtin_default();
        let mut map = striped_map(Biome::Desert, Biome::Jungle);
        resolve_adjacency(&mut map, &rules);
        let settled = map.data.clone();

        let changed = resolve_adjacency(&mut map, &rules);
        assert_eq!(changed, 0);
        assert_eq!(map.data, settled);
    }

    #[test]
    fn test_valid_map_untouched() {
        let rules = AdjacencyRuleSet::builtin_default();
        let mut map = striped_map(Biome::Plains, Biome::Forest);
        let original = map.data.clone();
        assert_eq!(resolve_adjacency(&mut map, &rules), 0);
        assert_eq!(map.data, original);
    }

    #[test]
    fn test_missing_rules_file_falls_back() {
        let rules = AdjacencyRuleSet::from_json_file("/nonexistent/rules.json");
        assert!(matches!(
            rules.lookup(Biome::Desert, Biome::Swamp),
            AdjacencyRule::Incompatible
        ));
    }

    #[test]
    fn test_entries_roundtrip_json() {
        let entries = vec![AdjacencyRuleEntry {
            a: Biome::Desert,
            b: Biome::Forest,
            rule: AdjacencyRule::Transition {
                via: vec![Biome::Savanna],
                min_width: 2,
            },
        }];
        let json = serde_json::to_string(&entries).unwrap();
        let parsed: Vec<AdjacencyRuleEntry> = serde_json::from_str(&json).unwrap();
        let rules = AdjacencyRuleSet::from_entries(parsed);
        assert!(matches!(
            rules.lookup(Biome::Forest, Biome::Desert),
            AdjacencyRule::Transition { .. }
        ));
    }
}

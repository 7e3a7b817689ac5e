// src/config.rs
//! Конфигурация генерации мира
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Сид (целое число или строка) и количество регионов континента
//! - Настройки рельефа, климата и гидрологии
//! - Пороги классификации биомов
//! - Параметры размещения поселений, POI и ресурсов
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки
//! через конфигурационные файлы. Одинаковый канонический сид и одинаковые
//! параметры дают побайтово идентичный результат генерации.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Сид генерации: целое число или произвольная строка
///
/// Строковый сид канонизируется суммой кодов символов, поэтому `"abc"`
/// эквивалентен `294`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SeedValue {
    Int(u64),
    Text(String),
}

impl SeedValue {
    /// Канонический целочисленный сид
    ///
    /// # Примеры
    /// ```
    /// use realmgen::config::SeedValue;
    /// assert_eq!(SeedValue::Int(42).canonical(), 42);
    /// assert_eq!(SeedValue::Text("abc".into()).canonical(), 97 + 98 + 99);
    /// ```
    #[must_use]
    pub fn canonical(&self) -> u64 {
        match self {
            SeedValue::Int(value) => *value,
            SeedValue::Text(text) => text.chars().map(|c| c as u64).sum(),
        }
    }
}

impl Default for SeedValue {
    fn default() -> Self {
        SeedValue::Int(0)
    }
}

/// Сезон генерации: сдвигает среднюю температуру региона
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum Season {
    Winter,
    #[default]
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Сдвиг температуры сезона. Порядок средних значений:
    /// зима < {весна, осень} < лето.
    #[must_use]
    pub fn temperature_offset(self) -> f32 {
        match self {
            Season::Winter => -0.20,
            Season::Spring | Season::Fall => 0.0,
            Season::Summer => 0.20,
        }
    }
}

/// Настройки синтеза высот
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElevationSettings {
    /// Количество октав фрактального шума (1..=8)
    #[serde(default = "default_octaves")]
    pub octaves: i32,

    /// Базовая частота шума (для сетки региона 15×15 подходит 0.05..0.2)
    #[serde(default = "default_frequency")]
    pub frequency: f32,

    /// Затухание амплитуды между октавами (persistence, 0.0..1.0)
    #[serde(default = "default_persistence")]
    pub persistence: f32,

    /// Рост частоты между октавами (lacunarity, обычно ~2.0)
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,

    /// Количество штампуемых горных пиков
    #[serde(default = "default_num_peaks")]
    pub num_peaks: u32,

    /// Количество штампуемых долин
    #[serde(default = "default_num_valleys")]
    pub num_valleys: u32,

    /// Минимальная высота штампа пика (0.0..1.0)
    #[serde(default = "default_feature_height_min")]
    pub feature_height_min: f32,

    /// Максимальная высота штампа пика (0.0..1.0)
    #[serde(default = "default_feature_height_max")]
    pub feature_height_max: f32,

    /// Минимальный радиус штампа в клетках
    #[serde(default = "default_feature_radius_min")]
    pub feature_radius_min: u32,

    /// Максимальный радиус штампа в клетках
    #[serde(default = "default_feature_radius_max")]
    pub feature_radius_max: u32,

    /// Прижимать ли края региона к воде (островной спад)
    #[serde(default)]
    pub island_falloff: bool,

    /// Сила островного спада: больше — резче обрыв к краям (> 0.0)
    #[serde(default = "default_falloff_strength")]
    pub falloff_strength: f32,

    /// Количество итераций сглаживания соседним усреднением
    #[serde(default = "default_smooth_iterations")]
    pub smooth_iterations: usize,
}

fn default_octaves() -> i32 {
    4
}
fn default_frequency() -> f32 {
    0.09
}
fn default_persistence() -> f32 {
    0.5
}
fn default_lacunarity() -> f32 {
    2.0
}
fn default_num_peaks() -> u32 {
    2
}
fn default_num_valleys() -> u32 {
    1
}
fn default_feature_height_min() -> f32 {
    0.25
}
fn default_feature_height_max() -> f32 {
    0.55
}
fn default_feature_radius_min() -> u32 {
    2
}
fn default_feature_radius_max() -> u32 {
    4
}
fn default_falloff_strength() -> f32 {
    1.4
}
fn default_smooth_iterations() -> usize {
    1
}

impl Default for ElevationSettings {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 0.09,
            persistence: 0.5,
            lacunarity: 2.0,
            num_peaks: 2,
            num_valleys: 1,
            feature_height_min: 0.25,
            feature_height_max: 0.55,
            feature_radius_min: 2,
            feature_radius_max: 4,
            island_falloff: false,
            falloff_strength: 1.4,
            smooth_iterations: 1,
        }
    }
}

/// Настройки климата
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClimateSettings {
    /// Влажность океанских клеток (0.0..1.0)
    #[serde(default = "default_ocean_humidity")]
    pub ocean_humidity: f32,

    /// Коэффициент засушливости суши: 1.0 — нейтрально, больше — суше
    #[serde(default = "default_desert_factor")]
    pub desert_factor: f32,

    /// Влияние широты на температуру: 0.0 отключает широтный градиент
    #[serde(default = "default_latitude_factor")]
    pub latitude_factor: f32,

    /// Охлаждение с высотой: 0.0 отключает высотный градиент
    #[serde(default = "default_elevation_factor")]
    pub elevation_factor: f32,

    /// Сезон генерации
    #[serde(default)]
    pub season: Season,
}

fn default_ocean_humidity() -> f32 {
    0.85
}
fn default_desert_factor() -> f32 {
    1.0
}
fn default_latitude_factor() -> f32 {
    0.6
}
fn default_elevation_factor() -> f32 {
    0.4
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self {
            ocean_humidity: 0.85,
            desert_factor: 1.0,
            latitude_factor: 0.6,
            elevation_factor: 0.4,
            season: Season::default(),
        }
    }
}

/// Пороги классификации биомов по высоте
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeThresholds {
    /// Уровень моря: ниже — вода
    #[serde(default = "default_sea_level")]
    pub sea_level: f32,

    /// Порог холмов
    #[serde(default = "default_hills_level")]
    pub hills_level: f32,

    /// Порог гор: выше — горный биом безусловно
    #[serde(default = "default_mountain_level")]
    pub mountain_level: f32,
}

fn default_sea_level() -> f32 {
    0.30
}
fn default_hills_level() -> f32 {
    0.62
}
fn default_mountain_level() -> f32 {
    0.80
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            sea_level: 0.30,
            hills_level: 0.62,
            mountain_level: 0.80,
        }
    }
}

/// Настройки гидрологии: береговая линия, пляжи, реки
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydrologySettings {
    /// Итерации сглаживания береговой линии
    #[serde(default = "default_coast_smooth_iterations")]
    pub coast_smooth_iterations: usize,

    /// Вероятность переворота клетки при большинстве соседей другого класса
    #[serde(default = "default_coast_flip_chance")]
    pub coast_flip_chance: f32,

    /// Ширина пляжной полосы в клетках от воды (0 отключает пляжи)
    #[serde(default = "default_beach_width")]
    pub beach_width: u32,

    /// Максимум рек на регион
    #[serde(default = "default_max_rivers_per_region")]
    pub max_rivers_per_region: usize,

    /// Минимальная длина реки: более короткие пути отбрасываются
    #[serde(default = "default_min_river_length")]
    pub min_river_length: usize,

    /// Максимальная длина пути реки
    #[serde(default = "default_max_river_length")]
    pub max_river_length: usize,

    /// Минимальная высота истока
    #[serde(default = "default_source_min_elevation")]
    pub source_min_elevation: f32,

    /// Фактор меандра: вероятность шага не строго вниз по склону
    #[serde(default = "default_meander")]
    pub meander: f32,
}

fn default_coast_smooth_iterations() -> usize {
    2
}
fn default_coast_flip_chance() -> f32 {
    0.5
}
fn default_beach_width() -> u32 {
    1
}
fn default_max_rivers_per_region() -> usize {
    3
}
fn default_min_river_length() -> usize {
    4
}
fn default_max_river_length() -> usize {
    40
}
fn default_source_min_elevation() -> f32 {
    0.65
}
fn default_meander() -> f32 {
    0.15
}

impl Default for HydrologySettings {
    fn default() -> Self {
        Self {
            coast_smooth_iterations: 2,
            coast_flip_chance: 0.5,
            beach_width: 1,
            max_rivers_per_region: 3,
            min_river_length: 4,
            max_river_length: 40,
            source_min_elevation: 0.65,
            meander: 0.15,
        }
    }
}

/// Настройки размещения поселений и POI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementSettings {
    /// Общий бюджет населения региона
    #[serde(default = "default_population_budget")]
    pub population_budget: u32,

    /// Минимальное население одного поселения
    #[serde(default = "default_min_settlement_pop")]
    pub min_settlement_pop: u32,

    /// Максимальное население одного поселения
    #[serde(default = "default_max_settlement_pop")]
    pub max_settlement_pop: u32,

    /// Максимум поселений на регион
    #[serde(default = "default_max_settlements")]
    pub max_settlements: usize,

    /// Минимальное манхэттенское расстояние между поселениями
    #[serde(default = "default_min_settlement_spacing")]
    pub min_settlement_spacing: u32,

    /// Минимальное расстояние между POI (и от POI до поселений)
    #[serde(default = "default_poi_spacing")]
    pub poi_spacing: u32,

    /// Максимум непоселенческих POI на регион
    #[serde(default = "default_max_pois")]
    pub max_pois: usize,

    /// Вероятность принять клетку «нежелательного» биома
    #[serde(default = "default_less_likely_chance")]
    pub less_likely_chance: f32,

    /// Бюджет попыток на одно размещение: исчерпание — не ошибка
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_population_budget() -> u32 {
    2500
}
fn default_min_settlement_pop() -> u32 {
    150
}
fn default_max_settlement_pop() -> u32 {
    900
}
fn default_max_settlements() -> usize {
    5
}
fn default_min_settlement_spacing() -> u32 {
    4
}
fn default_poi_spacing() -> u32 {
    2
}
fn default_max_pois() -> usize {
    4
}
fn default_less_likely_chance() -> f32 {
    0.3
}
fn default_max_attempts() -> usize {
    40
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            population_budget: 2500,
            min_settlement_pop: 150,
            max_settlement_pop: 900,
            max_settlements: 5,
            min_settlement_spacing: 4,
            poi_spacing: 2,
            max_pois: 4,
            less_likely_chance: 0.3,
            max_attempts: 40,
        }
    }
}

/// Настройки распределения ресурсов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSettings {
    /// Максимум особых ресурсных кластеров на регион
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,

    /// Вероятность появления каждого кластера
    #[serde(default = "default_cluster_chance")]
    pub cluster_chance: f32,

    /// Минимальный радиус кластера в клетках
    #[serde(default = "default_cluster_radius_min")]
    pub cluster_radius_min: u32,

    /// Максимальный радиус кластера в клетках
    #[serde(default = "default_cluster_radius_max")]
    pub cluster_radius_max: u32,
}

fn default_max_clusters() -> usize {
    2
}
fn default_cluster_chance() -> f32 {
    0.6
}
fn default_cluster_radius_min() -> u32 {
    1
}
fn default_cluster_radius_max() -> u32 {
    3
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            max_clusters: 2,
            cluster_chance: 0.6,
            cluster_radius_min: 1,
            cluster_radius_max: 3,
        }
    }
}

/// Основные параметры генерации мира
///
/// Полная конфигурация одного запуска генерации. Поддерживает загрузку из
/// TOML-файлов; все поля кроме сида имеют значения по умолчанию.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    #[serde(default)]
    pub seed: SeedValue,

    /// Целевое количество регионов континента.
    /// Значение вне допустимого диапазона заменяется случайным из него.
    #[serde(default = "default_region_count")]
    pub region_count: usize,

    /// Настройки синтеза высот
    #[serde(default)]
    pub elevation: ElevationSettings,

    /// Настройки климата
    #[serde(default)]
    pub climate: ClimateSettings,

    /// Пороги классификации биомов
    #[serde(default)]
    pub thresholds: BiomeThresholds,

    /// Настройки гидрологии
    #[serde(default)]
    pub hydrology: HydrologySettings,

    /// Настройки поселений и POI
    #[serde(default)]
    pub settlements: SettlementSettings,

    /// Настройки ресурсов
    #[serde(default)]
    pub resources: ResourceSettings,
}

fn default_region_count() -> usize {
    30
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: SeedValue::default(),
            region_count: 30,
            elevation: ElevationSettings::default(),
            climate: ClimateSettings::default(),
            thresholds: BiomeThresholds::default(),
            hydrology: HydrologySettings::default(),
            settlements: SettlementSettings::default(),
            resources: ResourceSettings::default(),
        }
    }
}

impl GenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// seed = "abc"
    /// region_count = 60
    ///
    /// [elevation]
    /// num_peaks = 3
    /// island_falloff = true
    /// ```
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_canonicalization() {
        assert_eq!(SeedValue::Int(17).canonical(), 17);
        assert_eq!(SeedValue::Text("abc".into()).canonical(), 294);
        assert_eq!(SeedValue::Text(String::new()).canonical(), 0);
    }

    #[test]
    fn test_season_ordering_by_offset() {
        assert!(Season::Winter.temperature_offset() < Season::Spring.temperature_offset());
        assert_eq!(
            Season::Spring.temperature_offset(),
            Season::Fall.temperature_offset()
        );
        assert!(Season::Fall.temperature_offset() < Season::Summer.temperature_offset());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let params: GenerationParams = toml::from_str("seed = 42").unwrap();
        assert_eq!(params.seed, SeedValue::Int(42));
        assert_eq!(params.region_count, 30);
        assert_eq!(params.thresholds, BiomeThresholds::default());
        assert_eq!(params.hydrology.max_rivers_per_region, 3);
    }

    #[test]
    fn test_text_seed_from_toml() {
        let params: GenerationParams = toml::from_str("seed = \"frostfall\"").unwrap();
        assert!(matches!(params.seed, SeedValue::Text(ref s) if s == "frostfall"));
    }

    #[test]
    fn test_nested_section_overrides() {
        let toml_src = r"
            seed = 1

            [hydrology]
            max_rivers_per_region = 7

            [climate]
            season = 'Winter'
        ";
        let params: GenerationParams = toml::from_str(toml_src).unwrap();
        assert_eq!(params.hydrology.max_rivers_per_region, 7);
        assert_eq!(params.climate.season, Season::Winter);
        assert_eq!(params.hydrology.min_river_length, 4);
    }
}

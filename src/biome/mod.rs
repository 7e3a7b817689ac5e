// src/biome/mod.rs
pub mod adjacency;

use serde::{Deserialize, Serialize};

use crate::climate::ClimateMaps;
use crate::config::BiomeThresholds;
use crate::elevation::{ElevationMap, validate_elevation};
use crate::error::{GenerationError, validate_grid_size, validate_unit_interval};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Biome {
    Ocean,
    Beach,
    River,
    Plains,
    Savanna,
    Forest,
    Jungle,
    Swamp,
    Desert,
    Tundra,
    Taiga,
    Hills,
    Mountain,
}

impl Biome {
    /// Водные биомы
    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, Biome::Ocean | Biome::River)
    }

    /// Возвышенные биомы — кандидаты в истоки рек
    #[must_use]
    pub fn is_high_elevation(self) -> bool {
        matches!(self, Biome::Hills | Biome::Mountain)
    }

    /// Базовый уровень опасности биома (0 — безопасно, 10 — смертельно)
    #[must_use]
    pub fn base_danger(self) -> u8 {
        match self {
            Biome::Plains | Biome::Beach => 1,
            Biome::River => 2,
            Biome::Ocean | Biome::Savanna | Biome::Forest => 3,
            Biome::Taiga | Biome::Hills => 4,
            Biome::Desert | Biome::Tundra => 5,
            Biome::Jungle => 6,
            Biome::Swamp => 7,
            Biome::Mountain => 8,
        }
    }
}

/// Карта биомов региона
#[derive(Debug, Clone)]
pub struct BiomeMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<Biome>,
}

impl BiomeMap {
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Biome {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, biome: Biome) {
        self.data[(y * self.width + x) as usize] = biome;
    }
}

/// Классифицирует одну клетку по высоте, температуре и влажности
#[must_use]
pub fn classify(
    elevation: f32,
    temperature: f32,
    humidity: f32,
    thresholds: &BiomeThresholds,
) -> Biome {
    if elevation < thresholds.sea_level {
        return Biome::Ocean;
    }
    if elevation > thresholds.mountain_level {
        return Biome::Mountain;
    }

    // Холод побеждает всё, кроме воды и гор
    if temperature < 0.22 {
        return if humidity < 0.45 {
            Biome::Tundra
        } else {
            Biome::Taiga
        };
    }

    // Низины у самой воды при высокой влажности заболачиваются
    if elevation < thresholds.sea_level + 0.08 && humidity > 0.75 {
        return Biome::Swamp;
    }

    if elevation > thresholds.hills_level {
        return Biome::Hills;
    }

    if temperature > 0.68 {
        return if humidity < 0.25 {
            Biome::Desert
        } else if humidity > 0.6 {
            Biome::Jungle
        } else {
            Biome::Savanna
        };
    }

    // Умеренная зона
    if humidity < 0.4 {
        Biome::Plains
    } else {
        Biome::Forest
    }
}

/// Назначает биомы всем клеткам региона
pub fn assign_biomes(
    elevation: &ElevationMap,
    climate: &ClimateMaps,
    thresholds: &BiomeThresholds,
) -> Result<BiomeMap, GenerationError> {
    validate_elevation(elevation)?;
    let expected = (elevation.width * elevation.height) as usize;
    validate_grid_size(&climate.temperature, expected)?;
    validate_grid_size(&climate.humidity, expected)?;
    validate_unit_interval(&climate.temperature)?;
    validate_unit_interval(&climate.humidity)?;

    let data = elevation
        .data
        .iter()
        .enumerate()
        .map(|(i, &h)| classify(h, climate.temperature[i], climate.humidity[i], thresholds))
        .collect();

    Ok(BiomeMap {
        width: elevation.width,
        height: elevation.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> BiomeThresholds {
        BiomeThresholds::default()
    }

    #[test]
    fn test_water_and_mountain_by_elevation() {
        assert_eq!(classify(0.1, 0.5, 0.5, &t()), Biome::Ocean);
        assert_eq!(classify(0.9, 0.5, 0.5, &t()), Biome::Mountain);
    }

    #[test]
    fn test_cold_zones() {
        assert_eq!(classify(0.5, 0.1, 0.2, &t()), Biome::Tundra);
        assert_eq!(classify(0.5, 0.1, 0.6, &t()), Biome::Taiga);
    }

    #[test]
    fn test_hot_zones() {
        assert_eq!(classify(0.5, 0.8, 0.1, &t()), Biome::Desert);
        assert_eq!(classify(0.5, 0.8, 0.8, &t()), Biome::Jungle);
        assert_eq!(classify(0.5, 0.8, 0.4, &t()), Biome::Savanna);
    }

    #[test]
    fn test_lowland_swamp() {
        assert_eq!(classify(0.33, 0.5, 0.9, &t()), Biome::Swamp);
    }

    #[test]
    fn test_temperate_zones() {
        assert_eq!(classify(0.5, 0.5, 0.2, &t()), Biome::Plains);
        assert_eq!(classify(0.5, 0.5, 0.6, &t()), Biome::Forest);
        assert_eq!(classify(0.7, 0.5, 0.5, &t()), Biome::Hills);
    }

    #[test]
    fn test_danger_scale() {
        assert!(Biome::Plains.base_danger() < Biome::Swamp.base_danger());
        assert!(Biome::Swamp.base_danger() < Biome::Mountain.base_danger());
        assert!(Biome::Mountain.base_danger() <= 10);
    }
}

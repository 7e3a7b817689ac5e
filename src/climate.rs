// src/climate.rs
//! Климат региона: температура и влажность из высоты, широты и шума.

use fastnoise_lite::FastNoiseLite;

use crate::config::ClimateSettings;
use crate::elevation::{ElevationMap, smooth_grid, validate_elevation};
use crate::error::GenerationError;
use crate::rng::RandomStream;

/// Частота климатического шума для сетки региона
const CLIMATE_NOISE_FREQUENCY: f32 = 0.08;

#[derive(Debug, Clone)]
pub struct ClimateMaps {
    pub temperature: Vec<f32>,
    pub humidity: Vec<f32>,
}

/// Генерирует обе климатические карты. Порядок фиксирован:
/// сначала температура, затем влажность — каждая снимает свой шумовой сид.
pub fn generate_climate(
    rng: &mut RandomStream,
    elevation: &ElevationMap,
    settings: &ClimateSettings,
    sea_level: f32,
) -> Result<ClimateMaps, GenerationError> {
    let temperature = generate_temperature(rng, elevation, settings)?;
    let humidity = generate_humidity(rng, elevation, settings, sea_level)?;
    Ok(ClimateMaps {
        temperature,
        humidity,
    })
}

fn seeded_noise(rng: &mut RandomStream) -> FastNoiseLite {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(rng.noise_seed()));
    noise.set_frequency(Some(CLIMATE_NOISE_FREQUENCY));
    noise
}

/// Карта температур.
///
/// Температура падает с удалением от вертикального центра карты (широтный
/// градиент, сила — `latitude_factor`) и с высотой (`elevation_factor`);
/// сезон сдвигает всю карту целиком.
pub fn generate_temperature(
    rng: &mut RandomStream,
    elevation: &ElevationMap,
    settings: &ClimateSettings,
) -> Result<Vec<f32>, GenerationError> {
    validate_elevation(elevation)?;

    let noise = seeded_noise(rng);
    let width = elevation.width;
    let height = elevation.height;
    let height_f = height as f32;
    let season_offset = settings.season.temperature_offset();

    let mut temperatures = vec![0.0; (width * height) as usize];
    for y in 0..height {
        let lat = ((y as f32 + 0.5) / height_f - 0.5).abs() * 2.0;
        let lat_chill = lat.powf(2.0) * settings.latitude_factor;

        for x in 0..width {
            let idx = (y * width + x) as usize;
            let n = (noise.get_noise_2d(x as f32, y as f32) + 1.0) * 0.5;

            // Температура падает с высотой
            let elevation_loss = elevation.data[idx] * settings.elevation_factor;
            temperatures[idx] = ((1.0 - lat_chill) * 0.8 + n * 0.2 - elevation_loss
                + season_offset)
                .clamp(0.0, 1.0);
        }
    }
    Ok(temperatures)
}

/// Карта влажности.
///
/// Океанские клетки насыщены (`ocean_humidity`); на суше влажность падает с
/// высотой, `desert_factor > 1.0` дополнительно сушит регион. Результат
/// слегка размывается, чтобы не было резкой ступени на береговой линии.
pub fn generate_humidity(
    rng: &mut RandomStream,
    elevation: &ElevationMap,
    settings: &ClimateSettings,
    sea_level: f32,
) -> Result<Vec<f32>, GenerationError> {
    validate_elevation(elevation)?;
    if !(0.0..=1.0).contains(&sea_level) {
        return Err(GenerationError::InvalidParameter {
            name: "sea_level",
            reason: format!("{sea_level} is outside [0, 1]"),
        });
    }

    let noise = seeded_noise(rng);
    let width = elevation.width;
    let height = elevation.height;

    let mut humidity = vec![0.0; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let h = elevation.data[idx];
            let n = (noise.get_noise_2d(x as f32, y as f32) + 1.0) * 0.5;

            humidity[idx] = if h < sea_level {
                settings.ocean_humidity * 0.85 + n * 0.15
            } else {
                ((1.0 - h) * 0.6 + n * 0.4) / settings.desert_factor.max(0.1)
            }
            .clamp(0.0, 1.0);
        }
    }

    smooth_grid(&mut humidity, width as usize, height as usize, 1);
    Ok(humidity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Season;
    use crate::coords::Coordinate;

    const W: u32 = 32;
    const H: u32 = 32;

    fn flat(value: f32) -> ElevationMap {
        ElevationMap {
            width: W,
            height: H,
            data: vec![value; (W * H) as usize],
        }
    }

    fn stream() -> RandomStream {
        RandomStream::for_unit(404, Coordinate::new(1, 2))
    }

    fn row_mean(map: &[f32], y: u32) -> f32 {
        let start = (y * W) as usize;
        map[start..start + W as usize].iter().sum::<f32>() / W as f32
    }

    #[test]
    fn test_maps_are_bounded() {
        let mut rng = stream();
        let elevation = flat(0.5);
        let maps =
            generate_climate(&mut rng, &elevation, &ClimateSettings::default(), 0.3).unwrap();
        for v in maps.temperature.iter().chain(maps.humidity.iter()) {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn test_same_seed_same_maps() {
        let elevation = flat(0.4);
        let settings = ClimateSettings::default();
        let a = generate_climate(&mut stream(), &elevation, &settings, 0.3).unwrap();
        let b = generate_climate(&mut stream(), &elevation, &settings, 0.3).unwrap();
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.humidity, b.humidity);
    }

    #[test]
    fn test_center_rows_warmer_than_edges() {
        let settings = ClimateSettings {
            latitude_factor: 1.0,
            elevation_factor: 0.0,
            ..ClimateSettings::default()
        };
        let temps = generate_temperature(&mut stream(), &flat(0.5), &settings).unwrap();
        assert!(row_mean(&temps, H / 2) > row_mean(&temps, 0));
        assert!(row_mean(&temps, H / 2) > row_mean(&temps, H - 1));
    }

    #[test]
    fn test_elevation_cools() {
        let settings = ClimateSettings {
            latitude_factor: 0.0,
            elevation_factor: 0.4,
            ..ClimateSettings::default()
        };
        // Одинаковые потоки → одинаковый шум, отличается только высота
        let lowland = generate_temperature(&mut stream(), &flat(0.2), &settings).unwrap();
        let highland = generate_temperature(&mut stream(), &flat(0.8), &settings).unwrap();
        for (low, high) in lowland.iter().zip(highland.iter()) {
            assert!(low > high);
        }
    }

    #[test]
    fn test_season_mean_ordering() {
        let elevation = flat(0.5);
        let mut means = Vec::new();
        for season in [Season::Winter, Season::Spring, Season::Fall, Season::Summer] {
            let settings = ClimateSettings {
                season,
                ..ClimateSettings::default()
            };
            let temps = generate_temperature(&mut stream(), &elevation, &settings).unwrap();
            means.push(temps.iter().sum::<f32>() / temps.len() as f32);
        }
        let (winter, spring, fall, summer) = (means[0], means[1], means[2], means[3]);
        assert!(winter < spring);
        assert!((spring - fall).abs() < 1e-6);
        assert!(fall < summer);
    }

    #[test]
    fn test_ocean_more_humid_than_highland() {
        // Левая половина — океан, правая — нагорье
        let mut elevation = flat(0.7);
        for y in 0..H {
            for x in 0..W / 2 {
                elevation.set(x, y, 0.1);
            }
        }
        let humidity = generate_humidity(
            &mut stream(),
            &elevation,
            &ClimateSettings::default(),
            0.3,
        )
        .unwrap();

        let mut ocean_sum = 0.0;
        let mut land_sum = 0.0;
        let mut ocean_n = 0.0;
        let mut land_n = 0.0;
        for (idx, h) in humidity.iter().enumerate() {
            if elevation.data[idx] < 0.3 {
                ocean_sum += h;
                ocean_n += 1.0;
            } else {
                land_sum += h;
                land_n += 1.0;
            }
        }
        assert!(ocean_sum / ocean_n > land_sum / land_n);
    }

    #[test]
    fn test_out_of_bounds_elevation_rejected() {
        let mut elevation = flat(0.5);
        elevation.set(3, 3, 1.7);
        let err = generate_temperature(&mut stream(), &elevation, &ClimateSettings::default());
        assert!(matches!(
            err,
            Err(GenerationError::ValueOutOfBounds { .. })
        ));
    }
}

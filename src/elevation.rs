// src/elevation.rs
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

use crate::config::ElevationSettings;
use crate::error::{GenerationError, validate_unit_interval};
use crate::rng::RandomStream;
use rand::Rng;

/// Двумерная карта высот: значения от 0.0 (глубокий океан) до 1.0 (высокие горы)
#[derive(Debug, Clone)]
pub struct ElevationMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ElevationMap {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
        }
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        self.data[(y * self.width + x) as usize] = value;
    }
}

/// Генерирует карту высот региона: шумовая основа, штамповка пиков и долин,
/// опциональный островной спад и сглаживание
pub fn generate_elevation(
    rng: &mut RandomStream,
    width: u32,
    height: u32,
    settings: &ElevationSettings,
) -> Result<ElevationMap, GenerationError> {
    if width == 0 || height == 0 {
        return Err(GenerationError::InvalidParameter {
            name: "width/height",
            reason: format!("grid {width}x{height} is empty"),
        });
    }
    if settings.octaves < 1 {
        return Err(GenerationError::InvalidParameter {
            name: "octaves",
            reason: format!("{} < 1", settings.octaves),
        });
    }
    if settings.feature_height_min > settings.feature_height_max
        || settings.feature_radius_min > settings.feature_radius_max
    {
        return Err(GenerationError::InvalidParameter {
            name: "feature ranges",
            reason: "min exceeds max".to_string(),
        });
    }

    // === 1. Базовый шум ===
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(rng.noise_seed()));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(settings.octaves));
    noise.set_fractal_gain(Some(settings.persistence));
    noise.set_fractal_lacunarity(Some(settings.lacunarity));
    noise.set_frequency(Some(settings.frequency));

    let data: Vec<f32> = (0..(width * height))
        .map(|i| {
            let x = (i % width) as f32;
            let y = (i / width) as f32;
            (noise.get_noise_2d(x, y) + 1.0) * 0.5
        })
        .collect();

    let mut map = ElevationMap {
        width,
        height,
        data,
    };

    // === 2. Штамповка пиков и долин ===
    // Порядок вызовов ГСЧ фиксирован: сначала все пики, затем все долины
    for _ in 0..settings.num_peaks {
        let cx = rng.gen_range(0..width) as i32;
        let cy = rng.gen_range(0..height) as i32;
        let peak = rng.gen_range(settings.feature_height_min..=settings.feature_height_max);
        let radius = rng.gen_range(settings.feature_radius_min..=settings.feature_radius_max);
        stamp_feature(&mut map, (cx, cy), peak, radius as f32)?;
    }
    for _ in 0..settings.num_valleys {
        let cx = rng.gen_range(0..width) as i32;
        let cy = rng.gen_range(0..height) as i32;
        let depth = rng.gen_range(settings.feature_height_min..=settings.feature_height_max);
        let radius = rng.gen_range(settings.feature_radius_min..=settings.feature_radius_max);
        stamp_feature(&mut map, (cx, cy), -depth, radius as f32)?;
    }

    // === 3. Островной спад ===
    if settings.island_falloff {
        apply_island_falloff(&mut map, settings.falloff_strength)?;
    }

    // === 4. Ренормализация после штамповки (только при выходе за границы) ===
    renormalize_if_needed(&mut map);

    // === 5. Сглаживание ===
    smooth_grid(
        &mut map.data,
        width as usize,
        height as usize,
        settings.smooth_iterations,
    );

    Ok(map)
}

/// Штампует радиальный элемент рельефа: пик (`height > 0`) или долину
/// (`height < 0`). Вклад линейно затухает от центра до нуля на границе
/// радиуса. Значения могут временно выйти за [0, 1] — финальную
/// ренормализацию выполняет вызывающая сторона.
pub fn stamp_feature(
    map: &mut ElevationMap,
    center: (i32, i32),
    height: f32,
    radius: f32,
) -> Result<(), GenerationError> {
    if !height.is_finite() {
        return Err(GenerationError::InvalidParameter {
            name: "height",
            reason: format!("{height} is not finite"),
        });
    }
    if !(radius > 0.0) || !radius.is_finite() {
        return Err(GenerationError::InvalidParameter {
            name: "radius",
            reason: format!("{radius} must be positive"),
        });
    }

    let (cx, cy) = center;
    let r = radius.ceil() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            let x = cx + dx;
            let y = cy + dy;
            if x < 0 || y < 0 || x >= map.width as i32 || y >= map.height as i32 {
                continue;
            }
            let distance = ((dx * dx + dy * dy) as f32).sqrt();
            if distance < radius {
                let idx = (y as u32 * map.width + x as u32) as usize;
                map.data[idx] += height * (1.0 - distance / radius);
            }
        }
    }
    Ok(())
}

/// Умножает карту на радиальную маску: центр нетронут, края прижаты к нулю.
/// Для любой положительной силы значение в центре не меньше значения на краю.
pub fn apply_island_falloff(
    map: &mut ElevationMap,
    strength: f32,
) -> Result<(), GenerationError> {
    if !(strength > 0.0) || !strength.is_finite() {
        return Err(GenerationError::InvalidParameter {
            name: "falloff_strength",
            reason: format!("{strength} must be positive"),
        });
    }

    let width_f = map.width as f32;
    let height_f = map.height as f32;
    for y in 0..map.height {
        for x in 0..map.width {
            let nx = (x as f32 / (width_f - 1.0).max(1.0) - 0.5) * 2.0;
            let ny = (y as f32 / (height_f - 1.0).max(1.0) - 0.5) * 2.0;
            let distance = (nx * nx + ny * ny).sqrt().min(1.0);
            let mask = (1.0 - distance).powf(strength);
            let idx = (y * map.width + x) as usize;
            map.data[idx] *= mask;
        }
    }
    Ok(())
}

/// Приводит карту к [0, 1], только если штамповка вывела значения за границы
fn renormalize_if_needed(map: &mut ElevationMap) {
    let min_h = map.data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_h = map.data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

    if min_h >= 0.0 && max_h <= 1.0 {
        return;
    }
    if max_h > min_h {
        for h in &mut map.data {
            *h = (*h - min_h) / (max_h - min_h);
        }
    } else {
        map.data.fill(0.5);
    }
}

/// Сглаживание соседним усреднением (окно 3×3 с зажимом на границах).
/// Каждая итерация — выпуклая комбинация соседей, поэтому дисперсия
/// карты не растёт.
pub fn smooth_grid(data: &mut [f32], width: usize, height: usize, iterations: usize) {
    if width == 0 || height == 0 || iterations == 0 {
        return;
    }

    let mut temp = vec![0.0f32; data.len()];
    for _ in 0..iterations {
        for y in 0..height {
            for x in 0..width {
                let mut sum = 0.0;
                let mut count = 0.0;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let nx = (x as i32 + dx).clamp(0, width as i32 - 1) as usize;
                        let ny = (y as i32 + dy).clamp(0, height as i32 - 1) as usize;
                        sum += data[ny * width + nx];
                        count += 1.0;
                    }
                }
                temp[y * width + x] = sum / count;
            }
        }
        data.copy_from_slice(&temp);
    }
}

/// Проверка границ значений карты — применяется на входе компонентов,
/// потребляющих высоты
pub fn validate_elevation(map: &ElevationMap) -> Result<(), GenerationError> {
    validate_unit_interval(&map.data)
}

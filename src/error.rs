// src/error.rs
//! Ошибки генерации и загрузки конфигурации.
//!
//! Восстановимые ситуации (исчерпание попыток размещения, отсутствующие
//! таблицы правил) не являются ошибками — они гасятся на месте и
//! логируются. Наружу отдаются только два класса проблем:
//! - некорректный ввод вызывающей стороны (`GenerationError`),
//! - невозможность прочитать конфигурационный файл (`ConfigError`).

use thiserror::Error;

/// Ошибка генерации: некорректный ввод либо сломанный внутренний инвариант
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Значение карты вышло за пределы [0, 1]
    #[error("value {value} at cell {index} is outside [0, 1]")]
    ValueOutOfBounds { index: usize, value: f32 },

    /// Размеры входных карт не совпадают
    #[error("grid size mismatch: expected {expected} cells, got {actual}")]
    GridSizeMismatch { expected: usize, actual: usize },

    /// Недопустимое значение параметра
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Нарушен внутренний инвариант конвейера — это баг генератора, а не вызывающего
    #[error("internal invariant broken: {0}")]
    InvariantBroken(String),
}

/// Ошибка загрузки конфигурационного файла
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Проверяет, что все значения карты лежат в [0, 1]
pub fn validate_unit_interval(data: &[f32]) -> Result<(), GenerationError> {
    for (index, &value) in data.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(GenerationError::ValueOutOfBounds { index, value });
        }
    }
    Ok(())
}

/// Проверяет, что размер карты совпадает с ожидаемым
pub fn validate_grid_size(data: &[f32], expected: usize) -> Result<(), GenerationError> {
    if data.len() != expected {
        return Err(GenerationError::GridSizeMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

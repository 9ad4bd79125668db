//! Конфигурация генерации
//!
//! [`GeneratorConfig`] описывает одну сцену, а [`BatchConfig`] описывает серию сцен и
//! куда их писать. Обе структуры (де)сериализуются через serde, поэтому
//! конфигурацию можно хранить в JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bounds::boundary_radius;
use crate::overlap::OverlapIndex;
use crate::ScatterError;

/// Настройки генерации одной сцены
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Сторона квадрата объекта, px
    pub object_size: u32,
    /// Сторона квадратного холста, px
    pub image_size: u32,
    /// Отступ внутрь от края, вычитается из радиуса круга обрезки
    pub image_padding: u32,
    /// Минимум объектов на изображении
    pub min_objects: usize,
    /// Максимум объектов на изображении
    pub max_objects: usize,
    /// 0..1, где 1 означает максимальную кластеризацию
    pub cluster_idx: f64,
    /// Веса категорий; `None` означает равные
    pub scatter_ratios: Option<Vec<f64>>,
    /// Сохранять покадровую анимацию размещения
    pub animate: bool,
    /// Способ вычисления сумм для проверки перекрытия
    pub overlap_index: OverlapIndex,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            object_size: 18,
            image_size: 500,
            image_padding: 10,
            min_objects: 50,
            max_objects: 100,
            cluster_idx: 1.0,
            scatter_ratios: None,
            animate: false,
            overlap_index: OverlapIndex::Scan,
        }
    }
}

impl GeneratorConfig {
    /// Загрузка из JSON-файла; отсутствующие поля берутся по умолчанию
    pub fn from_json_file(path: &Path) -> Result<Self, ScatterError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ScatterError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Вероятность "телепорта" вместо шага
    pub fn separation_chance(&self) -> f64 {
        1.0 - self.cluster_idx
    }

    pub fn boundary_radius(&self) -> i64 {
        boundary_radius(self.image_size, self.image_padding)
    }

    /// Проверка до начала генерации
    pub fn validate(&self) -> Result<(), ScatterError> {
        if self.object_size == 0 {
            return Err(ScatterError::Config("object size must be positive".into()));
        }
        if self.image_size == 0 {
            return Err(ScatterError::Config("image size must be positive".into()));
        }
        if self.min_objects > self.max_objects {
            return Err(ScatterError::Config(format!(
                "min objects ({}) exceeds max objects ({})",
                self.min_objects, self.max_objects
            )));
        }
        if !(0.0..=1.0).contains(&self.cluster_idx) {
            return Err(ScatterError::Config(format!(
                "cluster index {} is outside [0, 1]",
                self.cluster_idx
            )));
        }
        if self.boundary_radius() <= 0 {
            return Err(ScatterError::Config(format!(
                "padding {} leaves no room on a {}px canvas",
                self.image_padding, self.image_size
            )));
        }
        Ok(())
    }
}

/// Настройки серии изображений
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Сколько изображений сгенерировать
    pub image_count: usize,
    /// Каталог для результатов
    pub output_dir: PathBuf,
    /// Базовое зерно; `None` означает случайное (пишется в лог)
    pub seed: Option<u64>,
    /// Префикс имён файлов, чтобы параллельные процессы не пересекались
    pub file_prefix: String,
    /// Сохранять превью с нарисованными боксами
    pub preview: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            image_count: 1,
            output_dir: PathBuf::from("scatter_yolo_images"),
            seed: None,
            file_prefix: String::new(),
            preview: false,
        }
    }
}

//! Scatter Core - генератор синтетических датасетов для детекции объектов
//!
//! Библиотека раскладывает небольшие вырезанные объекты по холсту (при
//! желании поверх фоновой фотографии) и пишет рядом аннотации YOLO:
//! - Поиск позиции: "телепорт" в случайную точку или шаг от предыдущего объекта
//! - Проверка границ: прямоугольник холста и круг обрезки
//! - Проверка перекрытия по сумме каналов пикселей
//! - Взвешенный выбор категорий объектов
//! - Сборка сцены, анимация размещения и запись результатов

pub mod assets;
pub mod batch;
pub mod bounds;
pub mod canvas;
pub mod config;
pub mod geometry;
pub mod output;
pub mod overlap;
pub mod placement;
pub mod sampler;
pub mod scene;

pub use assets::{AssetSource, DirectoryAssets, MemoryAssets};
pub use batch::{BatchReport, FailedImage, GeneratedImage};
pub use bounds::BoundaryValidator;
pub use canvas::Canvas;
pub use config::{BatchConfig, GeneratorConfig};
pub use geometry::BoundingBox;
pub use output::{SceneWriter, WrittenScene};
pub use overlap::{OverlapDetector, OverlapIndex, RegionSum};
pub use placement::PlacementSearch;
pub use sampler::{CategoryRatios, ObjectSampler, ScatterObject};
pub use scene::{Annotation, PlacementOutcome, Scene, SceneComposer};

use rand::RngCore;
use std::path::PathBuf;
use thiserror::Error;

/// Основные ошибки модуля
#[derive(Error, Debug)]
pub enum ScatterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Object category {0} has no images")]
    EmptyCategory(usize),

    #[error("Unknown object category {0}")]
    UnknownCategory(usize),

    #[error("Backgrounds directory has no images")]
    NoBackgrounds,

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScatterError {
    /// Ошибка относится ко всему запуску, а не к одному изображению
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScatterError::Config(_)
                | ScatterError::EmptyCategory(_)
                | ScatterError::UnknownCategory(_)
                | ScatterError::NoBackgrounds
        )
    }
}

/// Главный генератор: конфигурация, веса категорий и источник изображений
pub struct SyntheticGenerator<A: AssetSource> {
    assets: A,
    composer: SceneComposer,
}

impl<A: AssetSource> SyntheticGenerator<A> {
    /// Проверяет конфигурацию и веса категорий до любой генерации
    pub fn new(config: GeneratorConfig, assets: A) -> Result<Self, ScatterError> {
        config.validate()?;
        let ratios = CategoryRatios::resolve(config.scatter_ratios.clone(), assets.category_count())?;
        let composer = SceneComposer::new(config, ratios)?;
        Ok(Self { assets, composer })
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.composer.config()
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    /// Одна сцена с заданным источником случайности. Ничего не пишет на диск.
    pub fn generate_scene(&self, rng: &mut dyn RngCore) -> Result<Scene, ScatterError> {
        let scene = self.composer.compose(&self.assets, rng)?;
        if let PlacementOutcome::Exhausted { placed, target } = scene.outcome {
            log::debug!("Scene under-filled: {} of {} objects", placed, target);
        }
        Ok(scene)
    }
}

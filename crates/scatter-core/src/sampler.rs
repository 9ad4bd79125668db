//! Модуль выбора объектов
//!
//! Категория выбирается по накопленным весам, изображение внутри категории
//! равновероятно через [`AssetSource`].

use image::RgbaImage;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::assets::AssetSource;
use crate::ScatterError;

/// Декодированный объект с индексом категории
#[derive(Debug, Clone)]
pub struct ScatterObject {
    pub image: RgbaImage,
    pub category: usize,
}

/// Веса категорий, по одному на категорию
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRatios(Vec<f64>);

impl CategoryRatios {
    /// Равные веса `1/n`
    pub fn uniform(category_count: usize) -> Result<Self, ScatterError> {
        if category_count == 0 {
            return Err(ScatterError::Config("no object categories".into()));
        }
        Ok(Self(vec![1.0 / category_count as f64; category_count]))
    }

    /// Проверка пользовательских весов против числа категорий
    pub fn new(weights: Vec<f64>, category_count: usize) -> Result<Self, ScatterError> {
        if category_count == 0 {
            return Err(ScatterError::Config("no object categories".into()));
        }
        if weights.len() != category_count {
            return Err(ScatterError::Config(format!(
                "{} scatter ratios given for {} object categories",
                weights.len(),
                category_count
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ScatterError::Config(format!("invalid scatter ratio {bad}")));
        }

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            log::warn!(
                "Scatter ratios sum to {:.4}; the remainder is assigned to the last category",
                total
            );
        }
        Ok(Self(weights))
    }

    /// Веса по умолчанию или проверенные пользовательские
    pub fn resolve(weights: Option<Vec<f64>>, category_count: usize) -> Result<Self, ScatterError> {
        match weights {
            Some(w) => Self::new(w, category_count),
            None => Self::uniform(category_count),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Выбор следующего объекта
#[derive(Debug, Clone)]
pub struct ObjectSampler {
    ratios: CategoryRatios,
    object_size: u32,
}

impl ObjectSampler {
    pub fn new(ratios: CategoryRatios, object_size: u32) -> Self {
        Self { ratios, object_size }
    }

    pub fn ratios(&self) -> &CategoryRatios {
        &self.ratios
    }

    /// Индекс категории: первая, у которой накопленная сумма `>= r`.
    /// Последняя категория принимается всегда.
    pub fn pick_category<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.gen();
        let last = self.ratios.len().saturating_sub(1);
        let mut cumulative = 0.0;
        for (i, ratio) in self.ratios.as_slice().iter().enumerate() {
            cumulative += ratio;
            if r <= cumulative || i == last {
                return i;
            }
        }
        last
    }

    /// Категория и декодированное изображение
    pub fn sample<A: AssetSource + ?Sized>(
        &self,
        assets: &A,
        rng: &mut dyn RngCore,
    ) -> Result<ScatterObject, ScatterError> {
        let category = self.pick_category(rng);
        let image = assets.load_object(category, self.object_size, rng)?;
        Ok(ScatterObject { image, category })
    }
}

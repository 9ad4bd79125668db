//! Модуль сборки сцены
//!
//! Одна сцена соответствует одному изображению: выбор объектов, поиск позиций, вставка в
//! слой объектов, накопление аннотаций и финальное наложение на фон.

use image::RgbaImage;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assets::AssetSource;
use crate::canvas::{paste_masked, Canvas};
use crate::config::GeneratorConfig;
use crate::geometry::BoundingBox;
use crate::placement::PlacementSearch;
use crate::sampler::{CategoryRatios, ObjectSampler};
use crate::ScatterError;

/// Аннотация YOLO: категория, нормированные центр и размер
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub category: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl Annotation {
    /// Аннотация для бокса объекта размера `object_size` на холсте `width × height`
    pub fn from_box(category: usize, bbox: &BoundingBox, object_size: u32, width: u32, height: u32) -> Self {
        let (cx, cy) = bbox.center(object_size);
        Self {
            category,
            cx: cx as f64 / width as f64,
            cy: cy as f64 / height as f64,
            w: object_size as f64 / width as f64,
            h: object_size as f64 / height as f64,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.4} {:.4} {:.4} {:.4}", self.category, self.cx, self.cy, self.w, self.h)
    }
}

/// Чем закончилось размещение
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    /// Размещено ровно столько, сколько было запланировано
    Complete,
    /// Поиск позиции исчерпал лимит раньше цели
    Exhausted { placed: usize, target: usize },
}

/// Результат генерации одного изображения
#[derive(Debug, Clone)]
pub struct Scene {
    /// Итоговое изображение (с фоном, если он был)
    pub image: RgbaImage,
    pub annotations: Vec<Annotation>,
    /// Боксы в порядке размещения, параллельно `annotations`
    pub boxes: Vec<BoundingBox>,
    /// Число объектов по категориям
    pub counts: Vec<usize>,
    pub target_count: usize,
    /// Кадры анимации, по одному на размещение
    pub frames: Vec<RgbaImage>,
    pub outcome: PlacementOutcome,
}

impl Scene {
    pub fn placed(&self) -> usize {
        self.annotations.len()
    }

    /// Содержимое файла аннотаций: строка на объект
    pub fn annotation_text(&self) -> String {
        self.annotations.iter().map(|a| format!("{a}\n")).collect()
    }

    /// Имя файла без расширения: `<prefix><index>-<count0>-<count1>-...`
    pub fn file_stem(&self, index: usize, prefix: &str) -> String {
        let counts: Vec<String> = self.counts.iter().map(|c| c.to_string()).collect();
        format!("{}{}-{}", prefix, index, counts.join("-"))
    }
}

/// Наложение слоя объектов на фон
pub fn composite(background: Option<&RgbaImage>, layer: &RgbaImage) -> RgbaImage {
    match background {
        Some(bg) => {
            let mut out = bg.clone();
            paste_masked(&mut out, layer, 0, 0);
            out
        }
        None => layer.clone(),
    }
}

/// Сборщик сцен
#[derive(Debug, Clone)]
pub struct SceneComposer {
    config: GeneratorConfig,
    search: PlacementSearch,
    sampler: ObjectSampler,
}

impl SceneComposer {
    /// Сборщик с проверенной конфигурацией и весами категорий
    pub fn new(config: GeneratorConfig, ratios: CategoryRatios) -> Result<Self, ScatterError> {
        config.validate()?;
        let search = PlacementSearch::new(config.image_size, config.object_size, config.image_padding);
        let sampler = ObjectSampler::new(ratios, config.object_size);
        Ok(Self {
            config,
            search,
            sampler,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn search(&self) -> &PlacementSearch {
        &self.search
    }

    pub fn sampler(&self) -> &ObjectSampler {
        &self.sampler
    }

    /// Генерация одной сцены
    pub fn compose<A: AssetSource + ?Sized>(&self, assets: &A, rng: &mut dyn RngCore) -> Result<Scene, ScatterError> {
        let size = self.config.image_size;
        let object_size = self.config.object_size;
        let target_count = rng.gen_range(self.config.min_objects..=self.config.max_objects);
        let background = assets.load_background(size, size, rng)?;
        let separation_chance = self.config.separation_chance();

        let mut canvas = Canvas::new(size, size, self.config.overlap_index);
        let mut annotations = Vec::with_capacity(target_count);
        let mut boxes: Vec<BoundingBox> = Vec::with_capacity(target_count);
        let mut counts = vec![0usize; self.sampler.ratios().len()];
        let mut frames = Vec::new();
        let mut outcome = PlacementOutcome::Complete;

        log::debug!("Composing scene with {} target objects", target_count);

        while annotations.len() < target_count {
            let object = self.sampler.sample(assets, rng)?;
            let previous = boxes.last().copied();

            let Some(bbox) = self.search.find_location(previous, &canvas, separation_chance, rng) else {
                log::warn!(
                    "Scene stopped at {} of {} objects: no free location found",
                    annotations.len(),
                    target_count
                );
                outcome = PlacementOutcome::Exhausted {
                    placed: annotations.len(),
                    target: target_count,
                };
                break;
            };

            canvas.paste(&object.image, &bbox);
            if self.config.animate {
                frames.push(composite(background.as_ref(), canvas.layer()));
            }

            counts[object.category] += 1;
            annotations.push(Annotation::from_box(object.category, &bbox, object_size, size, size));
            boxes.push(bbox);
            log::debug!("Placed category {} at {:?}", object.category, bbox);
        }

        let image = match background {
            Some(bg) => composite(Some(&bg), canvas.layer()),
            None => canvas.into_layer(),
        };

        Ok(Scene {
            image,
            annotations,
            boxes,
            counts,
            target_count,
            frames,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use image::{DynamicImage, Rgba};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assets(categories: usize) -> MemoryAssets {
        let mut assets = MemoryAssets::new(categories);
        for c in 0..categories {
            let color = Rgba([255, (c * 80) as u8, 0, 255]);
            assets.add_object(c, DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, color)));
        }
        assets
    }

    fn composer(config: GeneratorConfig, categories: usize) -> SceneComposer {
        SceneComposer::new(config, CategoryRatios::uniform(categories).unwrap()).unwrap()
    }

    #[test]
    fn test_annotation_format() {
        let bbox = BoundingBox::new(240, 90, 260, 110);
        let ann = Annotation::from_box(2, &bbox, 20, 500, 500);
        assert_eq!(ann.to_string(), "2 0.5000 0.2000 0.0400 0.0400");
    }

    #[test]
    fn test_file_stem() {
        let scene = Scene {
            image: RgbaImage::new(1, 1),
            annotations: Vec::new(),
            boxes: Vec::new(),
            counts: vec![3, 0, 7],
            target_count: 10,
            frames: Vec::new(),
            outcome: PlacementOutcome::Complete,
        };
        assert_eq!(scene.file_stem(4, ""), "4-3-0-7");
        assert_eq!(scene.file_stem(4, "w1_"), "w1_4-3-0-7");
    }

    #[test]
    fn test_compose_counts_match_annotations() {
        let config = GeneratorConfig {
            object_size: 16,
            image_size: 300,
            min_objects: 10,
            max_objects: 30,
            ..Default::default()
        };
        let composer = composer(config, 3);
        let assets = assets(3);
        let mut rng = StdRng::seed_from_u64(21);
        let scene = composer.compose(&assets, &mut rng).unwrap();

        assert!((10..=30).contains(&scene.target_count));
        assert_eq!(scene.counts.iter().sum::<usize>(), scene.placed());
        assert_eq!(scene.boxes.len(), scene.placed());
        assert_eq!(scene.image.dimensions(), (300, 300));
        assert!(scene.frames.is_empty());
        for bbox in &scene.boxes {
            assert!(composer.search().validator().is_in_bounds(bbox));
        }
    }

    #[test]
    fn test_compose_with_background_and_frames() {
        let config = GeneratorConfig {
            object_size: 10,
            image_size: 120,
            min_objects: 4,
            max_objects: 4,
            animate: true,
            ..Default::default()
        };
        let composer = composer(config, 1);
        let mut assets = assets(1);
        assets.add_background(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            60,
            60,
            Rgba([0, 0, 255, 255]),
        )));
        let mut rng = StdRng::seed_from_u64(8);
        let scene = composer.compose(&assets, &mut rng).unwrap();

        assert_eq!(scene.frames.len(), scene.placed());
        // Фон непрозрачен, значит и итог непрозрачен везде
        assert!(scene.image.pixels().all(|p| p.0[3] == 255));
        let corner = scene.image.get_pixel(0, 0);
        assert_eq!(corner, &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_zero_target() {
        let config = GeneratorConfig {
            min_objects: 0,
            max_objects: 0,
            ..Default::default()
        };
        let composer = composer(config, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let scene = composer.compose(&assets(1), &mut rng).unwrap();
        assert_eq!(scene.placed(), 0);
        assert_eq!(scene.outcome, PlacementOutcome::Complete);
    }

    #[test]
    fn test_empty_category_is_fatal() {
        let mut assets = MemoryAssets::new(2);
        assets.add_object(0, DynamicImage::ImageRgba8(RgbaImage::new(4, 4)));
        let composer = SceneComposer::new(
            GeneratorConfig::default(),
            CategoryRatios::new(vec![0.0, 1.0], 2).unwrap(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = composer.compose(&assets, &mut rng).unwrap_err();
        assert!(matches!(err, ScatterError::EmptyCategory(1)));
        assert!(err.is_fatal());
    }
}
